use anyhow::Context;
use devcamper::logging::init_tracing;
use devcamper::metrics::{init_metrics, metrics_app};
use devcamper::router::init_router;
use devcamper::state::init_app_state;
use devcamper_config::ServerConfig;
use dotenvy::dotenv;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    init_tracing();

    let metrics_handle = init_metrics().context("Failed to install metrics recorder")?;

    let server_config = ServerConfig::from_env().map_err(anyhow::Error::msg)?;
    let state = init_app_state(&server_config).await?;

    let mut app = init_router(state);
    if let Some(handle) = metrics_handle {
        app = app.merge(metrics_app(handle));
    }

    let addr = server_config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    info!(%addr, "Server running");
    info!("Swagger UI available at http://{addr}/swagger-ui");
    info!("Scalar UI available at http://{addr}/scalar");
    axum::serve(listener, app).await?;
    Ok(())
}
