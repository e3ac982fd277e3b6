pub mod alerts;
pub mod applications;
pub mod candidates;
pub mod health;
pub mod invitations;
pub mod jobs;
pub mod messages;
pub mod notifications;
pub mod openapi;
pub mod packages;
pub mod shortlist;
pub mod users;

use axum::{
    middleware::{from_fn, from_fn_with_state},
    routing::{get, patch, post, put},
    Router,
};

use crate::config::get_config;
use crate::middleware::{
    auth::{require_admin, require_bearer_auth},
    rate_limit::{new_rps_state, rps_middleware},
};
use crate::AppState;

/// Every API route with auth and rate limiting applied. Tracing and CORS
/// are added by the binary.
pub fn app(state: AppState) -> Router {
    let config = get_config();

    let public_api = Router::new()
        .route("/health", get(health::health))
        .route("/api/openapi.json", get(openapi::openapi_json))
        .route("/api/packages", get(packages::list_packages));

    let user_api = Router::new()
        .route("/api/me", get(users::get_me).put(users::sync_me))
        .route(
            "/api/alerts",
            get(alerts::list_alerts).post(alerts::create_alert),
        )
        .route(
            "/api/alerts/:id",
            get(alerts::get_alert)
                .put(alerts::replace_alert)
                .delete(alerts::delete_alert),
        )
        .route("/api/alerts/:id/pause", post(alerts::pause_alert))
        .route("/api/alerts/:id/resume", post(alerts::resume_alert))
        .route("/api/alerts/:id/matches", get(alerts::alert_matches))
        .route("/api/jobs", get(jobs::list_own_jobs).post(jobs::create_job))
        .route("/api/jobs/search", post(jobs::search_jobs))
        .route("/api/jobs/:id", get(jobs::get_job).patch(jobs::update_job))
        .route("/api/jobs/:id/publish", post(jobs::publish_job))
        .route("/api/jobs/:id/close", post(jobs::close_job))
        .route(
            "/api/jobs/:id/applications",
            get(jobs::list_job_applications),
        )
        .route(
            "/api/candidates/me",
            get(candidates::get_my_profile).put(candidates::upsert_my_profile),
        )
        .route(
            "/api/candidates/search",
            post(candidates::search_candidates),
        )
        .route("/api/candidates/:id", get(candidates::get_candidate))
        .route(
            "/api/applications",
            get(applications::list_applications).post(applications::apply),
        )
        .route(
            "/api/applications/:id",
            get(applications::get_application),
        )
        .route(
            "/api/applications/:id/status",
            patch(applications::update_application_status),
        )
        .route(
            "/api/invitations",
            get(invitations::list_invitations).post(invitations::create_invitation),
        )
        .route(
            "/api/invitations/:id/respond",
            post(invitations::respond_invitation),
        )
        .route(
            "/api/conversations",
            get(messages::list_conversations).post(messages::start_conversation),
        )
        .route(
            "/api/conversations/:id/messages",
            get(messages::list_messages).post(messages::send_message),
        )
        .route(
            "/api/conversations/:id/read",
            post(messages::mark_conversation_read),
        )
        .route(
            "/api/notifications",
            get(notifications::list_notifications),
        )
        .route(
            "/api/notifications/read-all",
            post(notifications::mark_all_notifications_read),
        )
        .route(
            "/api/notifications/:id/read",
            post(notifications::mark_notification_read),
        )
        .route("/api/inbox/poll", get(notifications::poll_inbox))
        .route("/api/usage", get(packages::my_usage))
        .route("/api/usage/check", get(packages::check_usage))
        .route("/api/shortlist", get(shortlist::list_shortlist))
        .route(
            "/api/shortlist/:candidate_id",
            put(shortlist::save_to_shortlist).delete(shortlist::remove_from_shortlist),
        )
        .layer(from_fn(require_bearer_auth));

    let admin_api = Router::new()
        .route(
            "/api/admin/subscriptions",
            post(packages::assign_package),
        )
        .layer(from_fn(require_admin));

    public_api
        .merge(user_api)
        .merge(admin_api)
        .layer(from_fn_with_state(
            new_rps_state(config.api_rps),
            rps_middleware,
        ))
        .with_state(state)
}
