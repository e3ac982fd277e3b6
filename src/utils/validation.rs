use std::borrow::Cow;
use validator::ValidationError;

pub const MAX_TAGS: usize = 50;
pub const MAX_TAG_LEN: usize = 80;

/// Skill, city and similar free-text lists.
pub fn validate_tags(values: &[String]) -> Result<(), ValidationError> {
    if values.len() > MAX_TAGS {
        let mut err = ValidationError::new("too_many_values");
        err.message = Some(Cow::from(format!("at most {} values allowed", MAX_TAGS)));
        return Err(err);
    }
    if values.iter().any(|v| v.trim().chars().count() > MAX_TAG_LEN) {
        let mut err = ValidationError::new("value_too_long");
        err.message = Some(Cow::from(format!(
            "values must be at most {} characters",
            MAX_TAG_LEN
        )));
        return Err(err);
    }
    Ok(())
}

/// Trims, drops blanks and removes case-insensitive duplicates, keeping the
/// first spelling.
pub fn clean_tags(values: Vec<String>) -> Vec<String> {
    let mut cleaned: Vec<String> = Vec::with_capacity(values.len());
    for value in values {
        let value = value.trim();
        if !value.is_empty() && !cleaned.iter().any(|v| v.eq_ignore_ascii_case(value)) {
            cleaned.push(value.to_string());
        }
    }
    cleaned
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_are_trimmed_and_deduplicated_ignoring_case() {
        let tags = clean_tags(vec![" Rust ".into(), "rust".into(), "".into(), "SQL".into()]);
        assert_eq!(tags, vec!["Rust".to_string(), "SQL".to_string()]);
    }

    #[test]
    fn rejects_oversized_lists() {
        let many: Vec<String> = (0..=MAX_TAGS).map(|i| format!("skill-{}", i)).collect();
        assert!(validate_tags(&many).is_err());
        assert!(validate_tags(&many[..3]).is_ok());
    }

    #[test]
    fn rejects_long_values() {
        assert!(validate_tags(&["x".repeat(MAX_TAG_LEN + 1)]).is_err());
    }
}
