mod config;
mod error;
mod routes;
mod stats;

use axum::routing::get;
use axum::Router;
use catalog::{CachedCatalog, CatalogCache, HttpCatalog};
use config::Config;
use routes::AppState;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    let config = if Path::new("config.toml").exists() {
        match Config::load(Path::new("config.toml")) {
            Ok(c) => {
                tracing::info!("loaded config from config.toml");
                c
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to load config.toml, using defaults");
                Config::default_config()
            }
        }
    } else {
        tracing::info!("no config.toml found, using defaults");
        Config::default_config()
    };

    let defaults = match config.listing.defaults() {
        Ok(d) => d,
        Err(e) => {
            tracing::error!(error = %e, "invalid [listing] defaults");
            return ExitCode::FAILURE;
        }
    };

    let prom_handle = match metrics_exporter_prometheus::PrometheusBuilder::new().install_recorder() {
        Ok(h) => h,
        Err(e) => {
            tracing::error!(error = %e, "failed to install prometheus recorder");
            return ExitCode::FAILURE;
        }
    };

    // One cache for the whole process, shared by every handler.
    let cache = Arc::new(CatalogCache::new(config.ttls()));
    let mut catalog = CachedCatalog::new(HttpCatalog::new(&config.upstream.url), Arc::clone(&cache));
    if config.cache.dedupe_in_flight {
        catalog = catalog.with_single_flight();
    }

    let state = Arc::new(AppState { catalog, defaults });

    let metrics_router = Router::new()
        .route("/api/stats", get(stats::stats_handler))
        .route(
            "/metrics",
            get(move || {
                let h = prom_handle.clone();
                async move { h.render() }
            }),
        )
        .with_state(Arc::clone(&cache));

    let api_router = routes::router(state).layer(TraceLayer::new_for_http());

    let listen_addr = config.server.listen_addr.clone();
    let metrics_addr = config.server.metrics_addr.clone();
    let ttls = config.ttls();

    tracing::info!(
        listen = %listen_addr,
        metrics = %metrics_addr,
        upstream = %config.upstream.url,
        page_ttl_s = ttls.page.as_secs(),
        category_ttl_s = ttls.categories.as_secs(),
        item_ttl_s = ttls.item.as_secs(),
        dedupe_in_flight = config.cache.dedupe_in_flight,
        "storefront server starting"
    );

    let api_listener = match tokio::net::TcpListener::bind(&listen_addr).await {
        Ok(l) => l,
        Err(e) => {
            tracing::error!(addr = %listen_addr, error = %e, "failed to bind api listener");
            return ExitCode::FAILURE;
        }
    };
    let metrics_listener = match tokio::net::TcpListener::bind(&metrics_addr).await {
        Ok(l) => l,
        Err(e) => {
            tracing::error!(addr = %metrics_addr, error = %e, "failed to bind metrics listener");
            return ExitCode::FAILURE;
        }
    };

    let shutdown = CancellationToken::new();
    tokio::spawn(shutdown_signal(shutdown.clone()));

    let api_future = axum::serve(api_listener, api_router)
        .with_graceful_shutdown(shutdown.clone().cancelled_owned());
    let metrics_future = axum::serve(metrics_listener, metrics_router)
        .with_graceful_shutdown(shutdown.clone().cancelled_owned());

    let mut code = ExitCode::SUCCESS;
    tokio::select! {
        result = api_future => {
            if let Err(e) = result {
                tracing::error!(error = %e, "api server error");
                code = ExitCode::FAILURE;
            }
        }
        result = metrics_future => {
            if let Err(e) = result {
                tracing::error!(error = %e, "metrics server error");
                code = ExitCode::FAILURE;
            }
        }
    }

    let totals = cache.stats();
    tracing::info!(
        hits = totals.hits,
        misses = totals.misses,
        hit_rate = totals.hit_rate(),
        "storefront server shut down"
    );
    code
}

/// Listen for SIGINT (Ctrl+C) or SIGTERM and cancel the shutdown token.
async fn shutdown_signal(token: CancellationToken) {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => {},
                    _ = sigterm.recv() => {},
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to install SIGTERM handler");
                ctrl_c.await.ok();
            }
        }
    }

    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
    }

    tracing::info!("shutdown signal received, draining connections...");
    token.cancel();
}

