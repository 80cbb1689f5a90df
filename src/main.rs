use anyhow::Context;
use spellbook::{api, Config, Protocol, TracingAuditSink};
use std::net::SocketAddr;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing_subscriber::filter::LevelFilter::INFO.into()),
        )
        .init();

    let config = Config::from_env().context("loading configuration")?;
    let port = config.port;

    let protocol = Protocol::from_config(&config, Arc::new(TracingAuditSink));
    tracing::info!(
        price = %config.collateral_price,
        reserve = %config.params.reserve_minimum,
        min_net_debt = %config.params.min_net_debt,
        operations = protocol.operations().len(),
        "ledger initialised"
    );

    let app = api::create_router(api::AppState::new(protocol));

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding to {}", addr))?;

    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
