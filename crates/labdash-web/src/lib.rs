use anyhow::{Context, Result};
use axum::{
    Router, middleware,
    routing::get,
};
use tracing::info;

use labdash_core::Dashboard;

mod dto;
mod error;
mod handlers;
mod security;


#[derive(Clone)]
pub(crate) struct WebState {
    pub(crate) dashboard: Dashboard,
}

impl WebState {
    fn new(dashboard: Dashboard) -> Self {
        Self { dashboard }
    }
}

/// Start the dashboard API server and block until shutdown.
///
/// # Errors
/// Returns an error when the runtime cannot be created, the socket cannot be
/// bound, or the server exits with a runtime failure.
pub fn serve_web(dashboard: Dashboard, host: &str, port: u16) -> Result<()> {
    let state = WebState::new(dashboard);
    let bind_addr = format!("{host}:{port}");
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to build web runtime")?;

    runtime.block_on(async move {
        let listener = tokio::net::TcpListener::bind(&bind_addr)
            .await
            .with_context(|| format!("failed to bind web server at {bind_addr}"))?;
        info!(
            addr = %listener.local_addr()?,
            report_base = %state.dashboard.config().report_base.display(),
            "dashboard api listening"
        );

        axum::serve(listener, app_router(state))
            .with_graceful_shutdown(async {
                let _ = tokio::signal::ctrl_c().await;
            })
            .await
            .context("web server failed")
    })
}

pub(crate) fn app_router(state: WebState) -> Router {
    Router::new()
        .route("/api/dashboard/dates/{platform}", get(handlers::list_dates))
        .route(
            "/api/dashboard/current_platform",
            get(handlers::current_platform),
        )
        .route(
            "/api/dashboard/summary/{platform}/{date}",
            get(handlers::summary),
        )
        .route("/api/dashboard/trend/{platform}", get(handlers::trend))
        .route(
            "/api/dashboard/trend/{platform}/{end_date}",
            get(handlers::trend),
        )
        .route(
            "/api/dashboard/trend/{platform}/{end_date}/{category}/{level}",
            get(handlers::trend),
        )
        .route(
            "/api/dashboard/diff/{platform}/{date_curr}/{date_prev}",
            get(handlers::diff),
        )
        .route(
            "/api/dashboard/notes/{platform}/{date}",
            get(handlers::load_notes).post(handlers::save_note),
        )
        .route(
            "/api/dashboard/test_log_detail/{platform}/{date}/{category}/{level}/{*test_name}",
            get(handlers::test_log_detail),
        )
        .layer(middleware::from_fn(security::security_headers_middleware))
        .with_state(state)
}
