pub mod alert;
pub mod application;
pub mod candidate;
pub mod filter_criteria;
pub mod invitation;
pub mod job;
pub mod message;
pub mod notification;
pub mod package;
pub mod shortlist;
pub mod user;
