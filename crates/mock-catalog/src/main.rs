use mock_catalog::{router, MockData};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

const DEFAULT_ADDR: &str = "0.0.0.0:3000";

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let addr = std::env::var("MOCK_CATALOG_ADDR").unwrap_or_else(|_| DEFAULT_ADDR.to_string());
    let data = MockData::generate();
    tracing::info!(addr = %addr, products = data.len(), "mock catalog starting");

    // Simulate upstream latency (5-20ms)
    let app = router(data, Some(5..=20));

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(addr = %addr, error = %e, "failed to bind");
            return ExitCode::FAILURE;
        }
    };
    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!(error = %e, "server error");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
