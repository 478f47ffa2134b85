use std::collections::BTreeMap;
use std::sync::Arc;

use axum::extract::{FromRequest, Request, State};
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Form, Json, Router, middleware};
use serde_json::{Value, json};
use tokio::net::TcpListener;

use super::config::PORT_ATTEMPTS;
use super::{ContactUpserter, Relay, RelayError, TicketCreator};
use crate::types::FormData;

/// Flat submission body, accepted either form-encoded or as a JSON object.
pub struct SubmissionBody(pub FormData);

impl<S: Send + Sync> FromRequest<S> for SubmissionBody {
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_ascii_lowercase();

        if content_type.starts_with("application/json") {
            let Json(object) = Json::<BTreeMap<String, Value>>::from_request(req, state)
                .await
                .map_err(IntoResponse::into_response)?;
            Ok(Self(flatten_json(object)))
        } else if content_type.starts_with("application/x-www-form-urlencoded") {
            let Form(fields) = Form::<FormData>::from_request(req, state)
                .await
                .map_err(IntoResponse::into_response)?;
            Ok(Self(fields))
        } else {
            Err(error_response(
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
                "Expected a form-encoded or JSON body",
            ))
        }
    }
}

/// Strings pass through, numbers and booleans are stringified, anything
/// nested or null is dropped.
fn flatten_json(object: BTreeMap<String, Value>) -> FormData {
    object
        .into_iter()
        .filter_map(|(key, value)| match value {
            Value::String(s) => Some((key, s)),
            Value::Number(n) => Some((key, n.to_string())),
            Value::Bool(b) => Some((key, b.to_string())),
            Value::Null | Value::Array(_) | Value::Object(_) => None,
        })
        .collect()
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        error_response(StatusCode::BAD_REQUEST, &self.to_string())
    }
}

pub fn router<C, T>(relay: Arc<Relay<C, T>>) -> Router
where
    C: ContactUpserter + 'static,
    T: TicketCreator + 'static,
{
    Router::new()
        .route("/", post(submit_handler::<C, T>))
        .route("/health", get(|| async { "ok" }))
        .route(
            "/favicon.ico",
            get(|| async { StatusCode::NO_CONTENT }),
        )
        .layer(middleware::map_response(allow_any_origin))
        .with_state(relay)
}

// The widget posts cross-origin from marketing pages.
async fn allow_any_origin(mut response: Response) -> Response {
    response.headers_mut().insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    response
}

async fn submit_handler<C, T>(
    State(relay): State<Arc<Relay<C, T>>>,
    SubmissionBody(body): SubmissionBody,
) -> Result<Json<super::Receipt>, RelayError>
where
    C: ContactUpserter,
    T: TicketCreator,
{
    tracing::info!(subject = body.get("subject").map(String::as_str), "POST /");
    match relay.handle(&body).await {
        Ok(receipt) => Ok(Json(receipt)),
        Err(e) => {
            tracing::warn!("Rejected submission: {}", e);
            Err(e)
        }
    }
}

/// Bind `host:port`, falling back to the next ports when it is taken.
pub async fn bind(host: &str, port: u16) -> anyhow::Result<(TcpListener, u16)> {
    let mut last_error = None;
    for p in port..port.saturating_add(PORT_ATTEMPTS) {
        match TcpListener::bind((host, p)).await {
            Ok(listener) => {
                let bound = listener.local_addr()?.port();
                return Ok((listener, bound));
            }
            Err(e) => {
                tracing::debug!(port = p, "Port unavailable: {}", e);
                last_error = Some(e);
            }
        }
    }

    let reason = last_error.map(|e| e.to_string()).unwrap_or_default();
    anyhow::bail!(
        "Could not bind to any port {}-{} on {}: {}",
        port,
        port.saturating_add(PORT_ATTEMPTS - 1),
        host,
        reason
    )
}

pub async fn serve<C, T>(listener: TcpListener, relay: Arc<Relay<C, T>>) -> std::io::Result<()>
where
    C: ContactUpserter + 'static,
    T: TicketCreator + 'static,
{
    axum::serve(listener, router(relay)).await
}
