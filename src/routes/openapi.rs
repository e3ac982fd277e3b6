use axum::{response::IntoResponse, Json};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(paths(
    crate::routes::alerts::create_alert,
    crate::routes::alerts::list_alerts,
    crate::routes::alerts::replace_alert,
    crate::routes::alerts::alert_matches,
    crate::routes::jobs::create_job,
    crate::routes::jobs::search_jobs,
    crate::routes::jobs::publish_job,
    crate::routes::candidates::upsert_my_profile,
    crate::routes::candidates::search_candidates,
    crate::routes::applications::apply,
    crate::routes::applications::update_application_status,
    crate::routes::invitations::create_invitation,
    crate::routes::invitations::respond_invitation,
    crate::routes::messages::start_conversation,
    crate::routes::messages::list_messages,
    crate::routes::messages::send_message,
    crate::routes::notifications::poll_inbox,
    crate::routes::packages::my_usage,
    crate::routes::packages::check_usage,
))]
pub struct ApiDoc;

pub async fn openapi_json() -> impl IntoResponse {
    Json(ApiDoc::openapi())
}
