//! Stand-in for the gateway that invokes a handler and interprets the
//! envelope it returns.
//!
//! `POST /invoke` takes a loose handler result (`{"body", "statusCode",
//! "headers", "isBase64Encoded"}`), builds the envelope with
//! `envelope-core`, and answers with the HTTP response a gateway would
//! produce from it. `POST /envelope` answers with the envelope itself.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use envelope_core::{ResponseBuilder, ResponseEnvelope};
use serde_json::Value;
use tokio::net::TcpListener;

pub type Shared = Arc<ResponseBuilder>;

pub fn app() -> Router {
    app_with(ResponseBuilder::new())
}

pub fn app_with(builder: ResponseBuilder) -> Router {
    Router::new()
        .route("/invoke", post(invoke))
        .route("/envelope", post(envelope))
        .with_state(Arc::new(builder))
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn invoke(State(builder): State<Shared>, Json(event): Json<Value>) -> Response {
    let envelope = builder.build_json(&event);
    tracing::info!(
        status_code = envelope.status_code,
        is_base64_encoded = envelope.is_base64_encoded,
        "rendering handler envelope"
    );
    render(envelope)
}

async fn envelope(State(builder): State<Shared>, Json(event): Json<Value>) -> Json<ResponseEnvelope> {
    Json(builder.build_json(&event))
}

/// Turn an envelope into the HTTP response a gateway would send. An
/// envelope the gateway cannot express (bad status or header) is a 502.
pub fn render(envelope: ResponseEnvelope) -> Response {
    let Ok(status) = StatusCode::from_u16(envelope.status_code) else {
        tracing::warn!(status_code = envelope.status_code, "handler returned an invalid status code");
        return StatusCode::BAD_GATEWAY.into_response();
    };

    let mut headers = HeaderMap::new();
    for (name, value) in envelope.header_lines() {
        match (HeaderName::from_bytes(name.as_bytes()), HeaderValue::from_str(value)) {
            (Ok(name), Ok(value)) => {
                headers.append(name, value);
            }
            _ => {
                tracing::warn!(header = name, "handler returned an invalid header");
                return StatusCode::BAD_GATEWAY.into_response();
            }
        }
    }

    let mut response = Response::new(Body::from(envelope.body));
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    response
}
