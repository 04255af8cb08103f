use anyhow::Context;
use paperchat::{api, config, logging, processing::RagService};
use std::net::Ipv4Addr;
use std::sync::Arc;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    logging::init_tracing();
    let config = config::load().context("Failed to load configuration")?;

    let port = config.server_port;
    let service = RagService::new(Arc::new(config)).context("Failed to build HTTP client")?;
    let app = api::create_router(Arc::new(service));

    let listener = TcpListener::bind((Ipv4Addr::UNSPECIFIED, port))
        .await
        .with_context(|| format!("Failed to bind port {port}"))?;
    tracing::info!("Listening on http://0.0.0.0:{}", port);
    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}
