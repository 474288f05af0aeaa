//! HTTP surface: liveness probes and the LINE webhook endpoint.

use axum::{
    Router,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use base64::{Engine, prelude::BASE64_STANDARD};
use hmac::{Hmac, Mac};
use serde::Deserialize;
use serde_json::Value;
use sha2::Sha256;
use tracing::{info, instrument, warn};

use crate::{base::types::Res, interaction::message_event, runtime::Runtime};

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the base64 HMAC-SHA256 of the request body.
pub const SIGNATURE_HEADER: &str = "x-line-signature";

/// Body returned by `GET /`.
pub const HOME_TEXT: &str = "LINE Bot with ChatGPT is running!";

/// Top-level webhook payload.
#[derive(Debug, Deserialize)]
struct WebhookEnvelope {
    #[serde(default)]
    events: Vec<Value>,
}

/// Build the application router.
pub fn router(runtime: Runtime) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/healthcheck", get(healthcheck))
        .route("/webhook", post(webhook))
        .with_state(runtime)
}

async fn home() -> &'static str {
    HOME_TEXT
}

async fn healthcheck() -> &'static str {
    "OK"
}

/// Handles one webhook delivery.
///
/// Once the payload is accepted the acknowledgment is always `200 OK`,
/// whatever happened to the individual events.
#[instrument(skip_all)]
async fn webhook(State(runtime): State<Runtime>, headers: HeaderMap, body: Bytes) -> Response {
    if let Some(secret) = runtime.config.line_channel_secret.as_deref().filter(|s| !s.is_empty()) {
        let signature = headers.get(SIGNATURE_HEADER).and_then(|v| v.to_str().ok()).unwrap_or_default();

        if !verify_signature(secret, &body, signature) {
            warn!("Rejecting webhook with an invalid signature.");
            return (StatusCode::UNAUTHORIZED, "Invalid signature").into_response();
        }
    }

    let envelope: WebhookEnvelope = match serde_json::from_slice(&body) {
        Ok(envelope) => envelope,
        Err(err) => {
            warn!("Rejecting malformed webhook payload: {err}");
            return (StatusCode::BAD_REQUEST, "Invalid payload").into_response();
        }
    };

    let replies = message_event::handle_events(&runtime, &envelope.events).await;

    info!(events = envelope.events.len(), replies, "Webhook batch handled.");

    (StatusCode::OK, "OK").into_response()
}

/// Check a LINE signature: base64(HMAC-SHA256(channel secret, body)).
///
/// The comparison is constant time.
pub fn verify_signature(secret: &str, body: &[u8], signature: &str) -> bool {
    let Ok(provided) = BASE64_STANDARD.decode(signature) else {
        return false;
    };

    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return false;
    };

    mac.update(body);
    mac.verify_slice(&provided).is_ok()
}

/// Compute the signature LINE would send for `body`.
pub fn sign(secret: &str, body: &[u8]) -> Res<String> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).map_err(|err| anyhow::anyhow!("Invalid channel secret: {err}"))?;
    mac.update(body);
    Ok(BASE64_STANDARD.encode(mac.finalize().into_bytes()))
}

// Tests.
