//! Saved search constraints shared by job alerts and candidate alerts.
//!
//! Semantics: every populated field must hold (AND), any value of a list
//! field may match (OR), and unset fields add no constraint. Text
//! comparisons ignore case. The same rules are rendered to SQL in
//! `services::matching_service`.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::models::alert::AlertKind;
use crate::models::candidate::CandidateProfile;
use crate::models::job::Job;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterCriteria {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keywords: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub sectors: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub cities: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub contract_types: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub work_modes: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub skills: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub salary_min: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub salary_max: Option<Decimal>,
    /// Job alerts only.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub experience_levels: Vec<String>,
    /// Candidate alerts only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub experience_years_min: Option<i32>,
    /// Candidate alerts only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub experience_years_max: Option<i32>,
    /// Candidate alerts only.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub education_levels: Vec<String>,
}

impl FilterCriteria {
    /// Trimmed, lowercased and deduplicated copy. Blank entries are dropped.
    pub fn normalized(&self) -> FilterCriteria {
        FilterCriteria {
            keywords: self
                .keywords
                .as_deref()
                .map(str::trim)
                .filter(|k| !k.is_empty())
                .map(str::to_string),
            sectors: normalize_list(&self.sectors),
            cities: normalize_list(&self.cities),
            contract_types: normalize_list(&self.contract_types),
            work_modes: normalize_list(&self.work_modes),
            skills: normalize_list(&self.skills),
            salary_min: self.salary_min,
            salary_max: self.salary_max,
            experience_levels: normalize_list(&self.experience_levels),
            experience_years_min: self.experience_years_min,
            experience_years_max: self.experience_years_max,
            education_levels: normalize_list(&self.education_levels),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.normalized() == FilterCriteria::default()
    }

    pub fn validate_for(&self, kind: AlertKind) -> Result<()> {
        let negative_salary = [self.salary_min, self.salary_max]
            .iter()
            .flatten()
            .any(|v| v.is_sign_negative());
        if negative_salary {
            return Err(Error::BadRequest("Salary bounds must not be negative".into()));
        }
        let negative_years = [self.experience_years_min, self.experience_years_max]
            .iter()
            .flatten()
            .any(|v| *v < 0);
        if negative_years {
            return Err(Error::BadRequest(
                "Experience bounds must not be negative".into(),
            ));
        }

        let misplaced: Vec<(&str, bool)> = match kind {
            AlertKind::Job => vec![
                ("experience_years_min", self.experience_years_min.is_some()),
                ("experience_years_max", self.experience_years_max.is_some()),
                ("education_levels", !self.education_levels.is_empty()),
            ],
            AlertKind::Candidate => vec![("experience_levels", !self.experience_levels.is_empty())],
        };
        if let Some((field, _)) = misplaced.iter().find(|(_, set)| *set) {
            return Err(Error::BadRequest(format!(
                "Field '{}' does not apply to {} alerts",
                field,
                kind.as_str()
            )));
        }
        Ok(())
    }

    pub fn matches_job(&self, job: &Job) -> bool {
        if !job.is_published() {
            return false;
        }
        let c = self.normalized();

        if let Some(keywords) = &c.keywords {
            let needle = keywords.to_lowercase();
            let hit = contains_text(&job.title, &needle)
                || contains_text(&job.company, &needle)
                || job
                    .description
                    .as_deref()
                    .is_some_and(|d| contains_text(d, &needle));
            if !hit {
                return false;
            }
        }

        if !matches_value(&c.sectors, job.sector.as_deref())
            || !matches_value(&c.cities, job.city.as_deref())
            || !matches_value(&c.contract_types, job.contract_type.as_deref())
            || !matches_value(&c.work_modes, job.work_mode.as_deref())
            || !matches_value(&c.experience_levels, job.experience_level.as_deref())
            || !matches_any(&c.skills, &job.skills)
        {
            return false;
        }

        // A job advertises a range; it qualifies when the range reaches the
        // wanted minimum and starts at or below the wanted maximum.
        if let Some(min) = c.salary_min {
            match job.salary_max.or(job.salary_min) {
                Some(upper) if upper >= min => {}
                _ => return false,
            }
        }
        if let Some(max) = c.salary_max {
            match job.salary_min.or(job.salary_max) {
                Some(lower) if lower <= max => {}
                _ => return false,
            }
        }
        true
    }

    pub fn matches_candidate(&self, profile: &CandidateProfile) -> bool {
        if !profile.is_visible {
            return false;
        }
        let c = self.normalized();

        if let Some(keywords) = &c.keywords {
            let needle = keywords.to_lowercase();
            let hit = contains_text(&profile.headline, &needle)
                || profile
                    .summary
                    .as_deref()
                    .is_some_and(|s| contains_text(s, &needle));
            if !hit {
                return false;
            }
        }

        if !matches_value(&c.sectors, profile.sector.as_deref())
            || !matches_value(&c.cities, profile.city.as_deref())
            || !matches_value(&c.education_levels, profile.education_level.as_deref())
            || !matches_any(&c.contract_types, &profile.contract_types)
            || !matches_any(&c.work_modes, &profile.work_modes)
            || !matches_any(&c.skills, &profile.skills)
        {
            return false;
        }

        if let Some(min) = c.experience_years_min {
            if profile.experience_years < min {
                return false;
            }
        }
        if let Some(max) = c.experience_years_max {
            if profile.experience_years > max {
                return false;
            }
        }

        if c.salary_min.is_some() || c.salary_max.is_some() {
            let Some(expected) = profile.expected_salary else {
                return false;
            };
            if c.salary_min.is_some_and(|min| expected < min)
                || c.salary_max.is_some_and(|max| expected > max)
            {
                return false;
            }
        }
        true
    }
}

fn normalize_list(values: &[String]) -> Vec<String> {
    let mut out: Vec<String> = values
        .iter()
        .map(|v| v.trim().to_lowercase())
        .filter(|v| !v.is_empty())
        .collect();
    out.sort();
    out.dedup();
    out
}

fn contains_text(haystack: &str, needle_lower: &str) -> bool {
    haystack.to_lowercase().contains(needle_lower)
}

fn matches_value(wanted: &[String], value: Option<&str>) -> bool {
    wanted.is_empty() || value.is_some_and(|v| wanted.contains(&v.to_lowercase()))
}

fn matches_any(wanted: &[String], values: &[String]) -> bool {
    wanted.is_empty() || values.iter().any(|v| wanted.contains(&v.to_lowercase()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn job(title: &str, sector: &str, city: &str, salary: Option<i64>, skills: &[&str]) -> Job {
        let now = Utc::now();
        Job {
            id: Uuid::new_v4(),
            employer_id: Uuid::new_v4(),
            title: title.into(),
            company: "Acme".into(),
            description: Some(format!("{} role at Acme", title)),
            sector: Some(sector.into()),
            city: Some(city.into()),
            country: Some("FR".into()),
            contract_type: Some("CDI".into()),
            work_mode: Some("hybrid".into()),
            experience_level: Some("senior".into()),
            salary_min: salary.map(Decimal::from),
            salary_max: salary.map(Decimal::from),
            currency: Some("EUR".into()),
            skills: skills.iter().map(|s| s.to_string()).collect(),
            status: "published".into(),
            published_at: Some(now),
            created_at: now,
            updated_at: now,
        }
    }

    fn profile(headline: &str, years: i32, salary: Option<i64>, skills: &[&str]) -> CandidateProfile {
        let now = Utc::now();
        CandidateProfile {
            user_id: Uuid::new_v4(),
            headline: headline.into(),
            summary: None,
            sector: Some("Technology".into()),
            city: Some("Lyon".into()),
            country: Some("FR".into()),
            contract_types: vec!["CDI".into(), "Freelance".into()],
            work_modes: vec!["remote".into()],
            experience_years: years,
            education_level: Some("master".into()),
            expected_salary: salary.map(Decimal::from),
            skills: skills.iter().map(|s| s.to_string()).collect(),
            is_visible: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn sector_and_salary_range_example() {
        let criteria = FilterCriteria {
            sectors: vec!["Technology".into()],
            salary_min: Some(Decimal::from(50_000)),
            salary_max: Some(Decimal::from(100_000)),
            ..Default::default()
        };
        let inside = job("Backend engineer", "Technology", "Paris", Some(80_000), &["rust"]);
        let above = job("Staff engineer", "Technology", "Paris", Some(120_000), &["rust"]);
        assert!(criteria.matches_job(&inside));
        assert!(!criteria.matches_job(&above));
    }

    #[test]
    fn unset_criteria_match_every_published_job() {
        let criteria = FilterCriteria::default();
        let mut draft = job("Nurse", "Health", "Nantes", None, &[]);
        assert!(criteria.matches_job(&draft));
        draft.status = "draft".into();
        assert!(!criteria.matches_job(&draft));
        assert!(criteria.is_empty());
    }

    #[test]
    fn single_field_filters_select_exactly_the_satisfying_jobs() {
        let jobs = vec![
            job("Rust developer", "Technology", "Paris", Some(70_000), &["Rust", "SQL"]),
            job("Accountant", "Finance", "Lyon", Some(45_000), &["Excel"]),
            job("Data analyst", "Finance", "Paris", None, &["SQL", "Python"]),
            job("Site manager", "Construction", "Lille", Some(55_000), &[]),
        ];

        let by_city = FilterCriteria {
            cities: vec!["paris".into(), "LILLE".into()],
            ..Default::default()
        };
        let titles: Vec<&str> = jobs
            .iter()
            .filter(|j| by_city.matches_job(j))
            .map(|j| j.title.as_str())
            .collect();
        assert_eq!(titles, vec!["Rust developer", "Data analyst", "Site manager"]);

        let by_skill = FilterCriteria {
            skills: vec!["sql".into()],
            ..Default::default()
        };
        let titles: Vec<&str> = jobs
            .iter()
            .filter(|j| by_skill.matches_job(j))
            .map(|j| j.title.as_str())
            .collect();
        assert_eq!(titles, vec!["Rust developer", "Data analyst"]);

        let by_salary_floor = FilterCriteria {
            salary_min: Some(Decimal::from(50_000)),
            ..Default::default()
        };
        let titles: Vec<&str> = jobs
            .iter()
            .filter(|j| by_salary_floor.matches_job(j))
            .map(|j| j.title.as_str())
            .collect();
        assert_eq!(titles, vec!["Rust developer", "Site manager"]);

        let by_keyword = FilterCriteria {
            keywords: Some("  ANALYST ".into()),
            ..Default::default()
        };
        assert_eq!(jobs.iter().filter(|j| by_keyword.matches_job(j)).count(), 1);
    }

    #[test]
    fn salary_range_overlap_uses_both_job_bounds() {
        let mut ranged = job("Designer", "Media", "Paris", None, &[]);
        ranged.salary_min = Some(Decimal::from(40_000));
        ranged.salary_max = Some(Decimal::from(60_000));

        let wants_55k_plus = FilterCriteria {
            salary_min: Some(Decimal::from(55_000)),
            ..Default::default()
        };
        let wants_under_45k = FilterCriteria {
            salary_max: Some(Decimal::from(45_000)),
            ..Default::default()
        };
        let wants_70k_plus = FilterCriteria {
            salary_min: Some(Decimal::from(70_000)),
            ..Default::default()
        };
        assert!(wants_55k_plus.matches_job(&ranged));
        assert!(wants_under_45k.matches_job(&ranged));
        assert!(!wants_70k_plus.matches_job(&ranged));
    }

    #[test]
    fn candidate_experience_and_salary_bounds() {
        let junior = profile("Junior developer", 1, Some(35_000), &["JavaScript"]);
        let senior = profile("Senior developer", 9, Some(75_000), &["Rust", "Go"]);
        let no_salary = profile("Architect", 15, None, &["Rust"]);

        let criteria = FilterCriteria {
            experience_years_min: Some(5),
            salary_max: Some(Decimal::from(80_000)),
            skills: vec!["rust".into()],
            ..Default::default()
        };
        assert!(!criteria.matches_candidate(&junior));
        assert!(criteria.matches_candidate(&senior));
        assert!(!criteria.matches_candidate(&no_salary));
    }

    #[test]
    fn hidden_profiles_never_match() {
        let mut hidden = profile("Welder", 4, None, &[]);
        hidden.is_visible = false;
        assert!(!FilterCriteria::default().matches_candidate(&hidden));
    }

    #[test]
    fn candidate_list_fields_use_overlap() {
        let freelancer = profile("Consultant", 6, None, &[]);
        let criteria = FilterCriteria {
            contract_types: vec!["freelance".into(), "interim".into()],
            ..Default::default()
        };
        assert!(criteria.matches_candidate(&freelancer));

        let onsite_only = FilterCriteria {
            work_modes: vec!["onsite".into()],
            ..Default::default()
        };
        assert!(!onsite_only.matches_candidate(&freelancer));
    }

    #[test]
    fn fields_are_checked_against_the_alert_kind() {
        let candidate_only = FilterCriteria {
            experience_years_min: Some(3),
            ..Default::default()
        };
        assert!(candidate_only.validate_for(AlertKind::Candidate).is_ok());
        assert!(matches!(
            candidate_only.validate_for(AlertKind::Job),
            Err(Error::BadRequest(_))
        ));

        let job_only = FilterCriteria {
            experience_levels: vec!["senior".into()],
            ..Default::default()
        };
        assert!(job_only.validate_for(AlertKind::Job).is_ok());
        assert!(job_only.validate_for(AlertKind::Candidate).is_err());

        let negative = FilterCriteria {
            salary_min: Some(Decimal::from(-1)),
            ..Default::default()
        };
        assert!(negative.validate_for(AlertKind::Job).is_err());
    }

    #[test]
    fn normalization_dedupes_and_drops_blanks() {
        let criteria = FilterCriteria {
            keywords: Some("   ".into()),
            cities: vec![" Paris ".into(), "paris".into(), "".into()],
            ..Default::default()
        };
        let normalized = criteria.normalized();
        assert_eq!(normalized.keywords, None);
        assert_eq!(normalized.cities, vec!["paris".to_string()]);
    }
}
