pub mod alert_service;
pub mod application_service;
pub mod candidate_service;
pub mod invitation_service;
pub mod job_service;
pub mod matching_service;
pub mod message_service;
pub mod notification_service;
pub mod shortlist_service;
pub mod usage_service;
pub mod user_service;
