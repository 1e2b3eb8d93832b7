//! Axum server assembly: state, routes, layers.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::error_handling::HandleErrorLayer;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use tower::{BoxError, ServiceBuilder};
use tower_http::cors::{Any, CorsLayer};

use ballot_engine::{CastingEngine, IdentityGate, ReceiptService, Registry, ResultsAggregator};
use ballot_store::BallotStore;

use crate::handlers;

/// Per-request budget; a handler exceeding it surfaces as 504.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Shared handler state: one engine handle per concern, all over the
/// same store.
pub struct AppState<S> {
    pub gate: IdentityGate<S>,
    pub registry: Registry<S>,
    pub casting: CastingEngine<S>,
    pub receipts: ReceiptService<S>,
    pub tally: ResultsAggregator<S>,
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            gate: self.gate.clone(),
            registry: self.registry.clone(),
            casting: self.casting.clone(),
            receipts: self.receipts.clone(),
            tally: self.tally.clone(),
        }
    }
}

impl<S: BallotStore> AppState<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            gate: IdentityGate::new(Arc::clone(&store)),
            registry: Registry::new(Arc::clone(&store)),
            casting: CastingEngine::new(Arc::clone(&store)),
            receipts: ReceiptService::new(Arc::clone(&store)),
            tally: ResultsAggregator::new(store),
        }
    }
}

/// Build the full API router over the given store.
pub fn router<S: BallotStore + 'static>(store: Arc<S>) -> Router {
    let state = AppState::new(store);

    let api = Router::new()
        // auth
        .route("/auth/register", post(handlers::register::<S>))
        // elections (public)
        .route("/elections", get(handlers::list_elections::<S>))
        .route("/elections/active", get(handlers::active_elections::<S>))
        .route("/elections/:id", get(handlers::election_detail::<S>))
        // votes
        .route("/votes", post(handlers::cast_vote::<S>))
        .route("/votes/status/:election_id", get(handlers::vote_status::<S>))
        .route("/votes/history", get(handlers::vote_history::<S>))
        .route("/votes/verify/:vote_hash", get(handlers::verify_vote::<S>))
        // admin
        .route("/admin/dashboard", get(handlers::admin_dashboard::<S>))
        .route("/admin/users", get(handlers::admin_list_users::<S>))
        .route(
            "/admin/users/:id/verify",
            put(handlers::admin_verify_user::<S>),
        )
        .route(
            "/admin/elections",
            post(handlers::admin_create_election::<S>),
        )
        .route(
            "/admin/elections/:id/status",
            put(handlers::admin_set_election_status::<S>),
        )
        .route(
            "/admin/elections/:id/results",
            get(handlers::admin_election_results::<S>),
        )
        .route(
            "/admin/candidates",
            post(handlers::admin_add_candidate::<S>),
        )
        .route(
            "/admin/candidates/:id",
            put(handlers::admin_update_candidate::<S>),
        )
        .route(
            "/admin/candidates/:id",
            delete(handlers::admin_deactivate_candidate::<S>),
        )
        .with_state(state);

    Router::new()
        .nest("/api", api)
        .layer(
            ServiceBuilder::new()
                .layer(HandleErrorLayer::new(handle_middleware_error))
                .timeout(REQUEST_TIMEOUT),
        )
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
}

async fn handle_middleware_error(err: BoxError) -> Response {
    if err.is::<tower::timeout::error::Elapsed>() {
        (
            StatusCode::GATEWAY_TIMEOUT,
            Json(serde_json::json!({
                "success": false,
                "error": "timeout",
                "message": "request timed out",
            })),
        )
            .into_response()
    } else {
        tracing::error!(error = %err, "middleware failure");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({
                "success": false,
                "error": "internal",
                "message": "internal server error",
            })),
        )
            .into_response()
    }
}

/// Bind and serve until ctrl-c.
pub async fn serve<S: BallotStore + 'static>(
    store: Arc<S>,
    addr: SocketAddr,
) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "api server listening");
    axum::serve(listener, router(store))
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to install ctrl-c handler");
    }
}
