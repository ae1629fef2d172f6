use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    Router, middleware,
    routing::{get, post},
};
use tracing::info;

use orgid_core::OrgId;

mod cors;
mod dto;
mod error;
mod handlers;

#[cfg(test)]
mod tests;

#[derive(Clone)]
pub(crate) struct WebState {
    pub(crate) orgid: Arc<OrgId>,
}

impl WebState {
    fn new(orgid: OrgId) -> Self {
        Self {
            orgid: Arc::new(orgid),
        }
    }
}

/// Serve the matching API on `host:port` and block until ctrl-c.
///
/// # Errors
/// Returns an error when the runtime cannot be created, the socket cannot be
/// bound, or the server exits with a runtime failure.
pub fn serve_web(orgid: OrgId, host: &str, port: u16) -> Result<()> {
    let institutions = orgid.institution_count();
    let state = WebState::new(orgid);
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
            institutions,
            "orgid api listening"
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
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .route(
            "/entities/institutions",
            get(handlers::match_institution).post(handlers::match_institutions),
        )
        .route("/tests/{dataset}", post(handlers::run_tests))
        .layer(middleware::from_fn(cors::cors_middleware))
        .with_state(state)
}
