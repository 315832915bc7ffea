//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET    /                          - Redirect to the client table
//! GET    /health                    - Liveness
//! GET    /health/ready              - Readiness (checks the store)
//!
//! # JSON API
//! GET    /clients?page=&search=     - One page of clients (20 per page)
//! POST   /clients                   - Create (201 + Location)
//! GET    /clients/{id}              - Fetch one
//! PUT    /clients/{id}              - Update (204)
//! DELETE /clients/{id}              - Delete (204)
//!
//! # UI
//! GET    /ui/clients                - Table with search and pagination
//! GET    /ui/clients/new            - Create form
//! POST   /ui/clients                - Create from form
//! GET    /ui/clients/{id}/edit      - Edit form
//! POST   /ui/clients/{id}           - Update from form
//! POST   /ui/clients/{id}/delete    - Delete
//! ```

pub mod api;
pub mod health;
pub mod pages;

use axum::{
    Router,
    http::{
        HeaderName, Method,
        header::{CONTENT_TYPE, LOCATION},
    },
    middleware,
    routing::{get, post},
};
use tower_http::{
    cors::CorsLayer,
    services::ServeDir,
    trace::{DefaultOnResponse, OnResponse, TraceLayer},
};
use tracing::Span;

use crate::middleware::{REQUEST_ID_HEADER, request_id_middleware, security_headers_middleware};
use crate::state::AppState;

/// Directory served under `/static`, relative to the workspace root.
const STATIC_DIR: &str = "crates/server/static";

/// Create the JSON API routes router.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(api::list).post(api::create))
        .route(
            "/{id}",
            get(api::show).put(api::update).delete(api::delete),
        )
}

/// Create the UI routes router.
pub fn ui_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(pages::index).post(pages::create))
        .route("/new", get(pages::new_form))
        .route("/{id}", post(pages::update))
        .route("/{id}/edit", get(pages::edit_form))
        .route("/{id}/delete", post(pages::delete))
}

/// Create all routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(pages::root))
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .nest("/clients", api_routes())
        .nest("/ui/clients", ui_routes())
}

/// Build the application: routes, static files and the middleware stack.
///
/// Sentry layers are added by the binary on top of this.
pub fn app(state: AppState) -> Router {
    let mut router = routes()
        .nest_service("/static", ServeDir::new(STATIC_DIR))
        .layer(middleware::from_fn(security_headers_middleware));

    if let Some(origin) = state.config().cors_origin.clone() {
        router = router.layer(
            CorsLayer::new()
                .allow_origin(origin)
                .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
                .allow_headers([CONTENT_TYPE])
                .expose_headers([LOCATION, HeaderName::from_static(REQUEST_ID_HEADER)]),
        );
    }

    router
        .layer(middleware::from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = tracing::field::Empty,
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &Span| {
                        span.record("status", response.status().as_u16());
                        span.record(
                            "latency_ms",
                            u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                        );
                        DefaultOnResponse::default().on_response(response, latency, span);
                    },
                ),
        )
        .with_state(state)
}
