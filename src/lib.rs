pub mod config;
pub mod database;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod utils;

use crate::services::{
    alert_service::AlertService, application_service::ApplicationService,
    candidate_service::CandidateService, invitation_service::InvitationService,
    job_service::JobService, matching_service::MatchingService, message_service::MessageService,
    notification_service::NotificationService, shortlist_service::ShortlistService,
    usage_service::UsageService, user_service::UserService,
};
use sqlx::PgPool;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub user_service: UserService,
    pub usage_service: UsageService,
    pub matching_service: MatchingService,
    pub alert_service: AlertService,
    pub job_service: JobService,
    pub candidate_service: CandidateService,
    pub application_service: ApplicationService,
    pub invitation_service: InvitationService,
    pub message_service: MessageService,
    pub notification_service: NotificationService,
    pub shortlist_service: ShortlistService,
}

impl AppState {
    pub fn new(pool: PgPool) -> Self {
        Self {
            user_service: UserService::new(pool.clone()),
            usage_service: UsageService::new(pool.clone()),
            matching_service: MatchingService::new(pool.clone()),
            alert_service: AlertService::new(pool.clone()),
            job_service: JobService::new(pool.clone()),
            candidate_service: CandidateService::new(pool.clone()),
            application_service: ApplicationService::new(pool.clone()),
            invitation_service: InvitationService::new(pool.clone()),
            message_service: MessageService::new(pool.clone()),
            notification_service: NotificationService::new(pool.clone()),
            shortlist_service: ShortlistService::new(pool.clone()),
            pool,
        }
    }
}
