mod config;

use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use storefront_api::AppStateInner;
use storefront_api::notify::{MailTransport, RevalidateTransport};
use storefront_api::outbox::run_outbox_loop;
use storefront_api::routes::router;

use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "storefront=debug,storefront_api=debug,storefront_db=info,tower_http=debug".into()
            }),
        )
        .init();

    let config = Config::from_env()?;

    // Init database
    let db = storefront_db::Database::open(&config.db_path)?;
    let state = AppStateInner::new(db);

    // Side-effect delivery
    let mailer = MailTransport::from_webhook(config.mail_webhook.clone());
    let revalidator = RevalidateTransport::from_webhook(config.revalidate_url.clone());
    tokio::spawn(run_outbox_loop(state.clone(), mailer, revalidator, config.outbox));

    let app = router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    info!("Storefront server listening on {}", config.addr);

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
