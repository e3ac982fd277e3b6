use std::net::SocketAddr;
use std::time::Duration;

use talent_marketplace::{
    config::{get_config, init_config},
    database::pool::{create_pool, run_migrations},
    middleware::cors::api_cors,
    routes, AppState,
};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn,tower_http=info"));
    if std::env::var("LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json")) {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
    init_config()?;
    let config = get_config();

    let pool = create_pool().await?;
    run_migrations(&pool).await?;

    let app_state = AppState::new(pool);

    {
        let usage = app_state.usage_service.clone();
        let interval = Duration::from_secs(config.subscription_sweep_interval_secs.max(1));
        tokio::spawn(async move {
            loop {
                match usage.expire_overdue().await {
                    Ok(0) => {}
                    Ok(expired) => info!(expired, "expired overdue subscriptions"),
                    Err(e) => tracing::error!(error = ?e, "subscription sweep failed"),
                }
                tokio::time::sleep(interval).await;
            }
        });
    }

    let app = routes::app(app_state)
        .layer(api_cors())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = config.server_address.parse()?;
    info!("Server listening on {}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
