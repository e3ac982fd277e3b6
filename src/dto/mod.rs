pub mod alert_dto;
pub mod application_dto;
pub mod candidate_dto;
pub mod invitation_dto;
pub mod job_dto;
pub mod message_dto;
pub mod package_dto;
pub mod shortlist_dto;
pub mod user_dto;
