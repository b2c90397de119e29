use anyhow::Context;

use budgetwatch_api::config::ApiConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    budgetwatch_observability::init();

    let config = ApiConfig::from_env();
    let addr = config.socket_addr();
    let app = budgetwatch_api::app::build_app(config);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await.context("server exited with error")?;
    Ok(())
}
