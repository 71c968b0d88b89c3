//! UrbanCart storefront library.
//!
//! Session authentication, CSRF-protected carts and an in-memory product
//! catalog behind an axum router. The binary only loads configuration,
//! initializes tracing and serves [`app`].

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod error;
pub mod middleware;
pub mod response;
pub mod routes;
pub mod services;
pub mod state;

use axum::{Router, middleware as axum_middleware, routing::get};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tower_cookies::CookieManagerLayer;
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tracing::Span;

use crate::state::AppState;

/// Build the complete router, middleware included.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .merge(routes::routes())
        .layer(axum_middleware::from_fn(
            middleware::security_headers_middleware,
        ))
        .layer(CookieManagerLayer::new())
        .layer(axum_middleware::from_fn(middleware::request_id_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri().path(),
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
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction())
}

/// Periodically clear expired sessions and their carts.
///
/// The first sweep runs one interval after startup.
pub fn spawn_session_sweeper(state: AppState) -> JoinHandle<()> {
    let period = state.config().sweep_interval;

    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately
        interval.tick().await;

        loop {
            interval.tick().await;
            let swept = state.sessions().sweep_expired().await;
            tracing::debug!(swept, "session sweep finished");
        }
    })
}

/// Liveness health check endpoint.
async fn health() -> &'static str {
    "ok"
}
