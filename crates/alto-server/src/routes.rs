//! HTTP routing
//!
//! Every ALTO resource goes through a single fallback handler so that 404s,
//! wrong methods and validation failures share one error path.

use std::time::Instant;

use axum::body::{Body, Bytes};
use axum::extract::{Request, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use tower::limit::ConcurrencyLimitLayer;

use crate::catalog::{resolve, ResourceDescriptor};
use crate::error::{Result, ServerError};
use crate::handlers;
use crate::metrics::record_request;
use crate::request::{decode_and_validate, ValidationError};
use crate::response::{encode, Encoded};
use crate::state::{ServerState, SharedState};

/// Create the router serving every ALTO resource
pub fn create_router(state: SharedState) -> Router {
    let limit = state.max_concurrent_requests;
    Router::new()
        .fallback(dispatch)
        .with_state(state)
        .layer(ConcurrencyLimitLayer::new(limit))
}

/// Create the router with `GET /metrics` in Prometheus text format.
/// Other methods on `/metrics` get the same ALTO 404 as any unknown path.
pub fn create_router_with_metrics(state: SharedState, handle: PrometheusHandle) -> Router {
    let limit = state.max_concurrent_requests;
    Router::new()
        .route(
            "/metrics",
            get(move || std::future::ready(handle.render())).fallback(dispatch),
        )
        .fallback(dispatch)
        .with_state(state)
        .layer(ConcurrencyLimitLayer::new(limit))
}

async fn dispatch(State(state): State<SharedState>, request: Request) -> Response {
    let start = Instant::now();
    let (parts, body) = request.into_parts();
    let path = parts.uri.path();

    let Some(descriptor) = resolve(&parts.method, path) else {
        let response = ServerError::NotFound {
            method: parts.method.to_string(),
            path: path.to_string(),
        }
        .into_response();
        record_request("unknown", response.status().as_u16(), start.elapsed());
        return response;
    };

    // Non-UTF-8 bytes become U+FFFD, which no media range matches
    let accept = parts
        .headers
        .get(header::ACCEPT)
        .map(|value| String::from_utf8_lossy(value.as_bytes()).into_owned());

    let response = match respond(&state, &descriptor, body, accept.as_deref()).await {
        Ok(encoded) => encoded.into_response(),
        Err(err) => err.into_response(),
    };

    let resource = descriptor.resource.name();
    let status = response.status().as_u16();
    let elapsed = start.elapsed();
    tracing::debug!(
        resource,
        status,
        elapsed_us = elapsed.as_micros() as u64,
        "Handled request"
    );
    record_request(resource, status, elapsed);
    response
}

/// decode -> validate -> handle -> encode
async fn respond(
    state: &ServerState,
    descriptor: &ResourceDescriptor,
    body: Body,
    accept: Option<&str>,
) -> Result<Encoded> {
    let body = if descriptor.takes_body() {
        read_body(body, state.max_body_bytes).await?
    } else {
        Bytes::new()
    };
    let envelope = decode_and_validate(descriptor, &body, &state.store)?;
    let payload = handlers::handle(&envelope, &state.store);
    encode(&payload, descriptor, accept)
}

async fn read_body(body: Body, limit: usize) -> std::result::Result<Bytes, ValidationError> {
    axum::body::to_bytes(body, limit).await.map_err(|e| {
        ValidationError::MalformedJson(format!("unreadable request body (limit {limit} bytes): {e}"))
    })
}
