//! HTTP gateway.
//!
//! Receives 8x8 webhooks, runs the lifecycle hooks and the executor, and
//! exposes a callback route for hosts that push AI outputs one at a time.
//!
//! Routes:
//! - `POST {server.path}`: 8x8 inbound webhook
//! - `POST /output`: `{userId, sessionId, output}` from the host (webhook
//!   mode only; rest mode delivers from the webhook route and answers 409)
//! - `GET /health`: liveness

use std::sync::Arc;

use anyhow::Result;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use subtle::ConstantTimeEq;
use tower_http::trace::TraceLayer;
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::config::{ServerConfig, TransformerMode};
use crate::error::BridgeError;
use crate::executor::Executor;
use crate::inbound::InboundOutcome;
use crate::transformer::Transformer;

/// Path of the host output callback.
pub const OUTPUT_PATH: &str = "/output";

/// Path of the health check.
pub const HEALTH_PATH: &str = "/health";

/// Shared state for all handlers.
#[derive(Clone)]
pub struct GatewayState {
    transformer: Arc<Transformer>,
    executor: Arc<dyn Executor>,
    auth_token: Option<Arc<str>>,
}

impl GatewayState {
    pub fn new(
        transformer: Arc<Transformer>,
        executor: Arc<dyn Executor>,
        auth_token: Option<String>,
    ) -> Self {
        Self {
            transformer,
            executor,
            auth_token: auth_token.filter(|t| !t.is_empty()).map(Arc::from),
        }
    }

    fn authorized(&self, headers: &HeaderMap) -> bool {
        let Some(expected) = &self.auth_token else {
            return true;
        };
        headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().strip_prefix("Bearer "))
            .map(|token| bool::from(token.as_bytes().ct_eq(expected.as_bytes())))
            .unwrap_or(false)
    }
}

/// Host callback body for `POST /output`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputCallback {
    pub user_id: String,
    pub session_id: String,
    pub output: Value,
}

/// Build the gateway router with the webhook mounted at `webhook_path`.
pub fn build_router(state: GatewayState, webhook_path: &str) -> Router {
    Router::new()
        .route(webhook_path, post(webhook_handler))
        .route(OUTPUT_PATH, post(output_handler))
        .route(HEALTH_PATH, get(health_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn ok() -> Response {
    (StatusCode::OK, Json(json!({"status": "ok"}))).into_response()
}

fn error_response(err: &BridgeError) -> Response {
    let status = StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(json!({"error": err.to_string()}))).into_response()
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({"error": "unauthorized"})),
    )
        .into_response()
}

/// GET /health
async fn health_handler() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "version": crate::VERSION,
    }))
}

/// POST {server.path}
async fn webhook_handler(
    State(state): State<GatewayState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    if !state.authorized(&headers) {
        warn!("rejected webhook with bad or missing bearer token");
        return unauthorized();
    }
    let span = info_span!("webhook", request_id = %Uuid::new_v4());
    process_webhook(&state, &body).instrument(span).await
}

async fn process_webhook(state: &GatewayState, body: &[u8]) -> Response {
    let transformer = &state.transformer;
    let input = match transformer.handle_input(body).await {
        Ok(InboundOutcome::Accepted(input)) => input,
        Ok(InboundOutcome::Ignored { event_type }) => {
            info!(%event_type, "event acknowledged without processing");
            return ok();
        }
        Err(BridgeError::MalformedEvent(reason)) => {
            warn!(%reason, "malformed webhook body ignored");
            return ok();
        }
        Err(BridgeError::MissingIdentifier) => {
            return match transformer.mode() {
                TransformerMode::Rest => (
                    StatusCode::BAD_REQUEST,
                    Json(json!({"error": "Missing userId or sessionId"})),
                )
                    .into_response(),
                TransformerMode::Webhook => ok(),
            };
        }
        Err(e) => {
            error!(error = %e, "inbound processing failed");
            return error_response(&e);
        }
    };

    let processed = match state.executor.execute(&input).await {
        Ok(p) => p,
        Err(e) => {
            error!(error = %e, "execution failed");
            return error_response(&e);
        }
    };

    for output in &processed.output_stack {
        match transformer
            .handle_output(output, &input.user_id, &input.session_id)
            .await
        {
            Ok(_) => {}
            Err(BridgeError::MissingChannelOutput(reason)) => {
                warn!(%reason, "output skipped");
            }
            Err(e) => {
                error!(error = %e, "output delivery failed");
                return error_response(&e);
            }
        }
    }

    match transformer
        .handle_execution_finished(&processed, &input.user_id, &input.session_id)
        .await
    {
        Ok(_) => ok(),
        Err(BridgeError::MissingChannelOutput(reason)) => {
            warn!(%reason, "nothing delivered");
            ok()
        }
        Err(e) => {
            error!(error = %e, "delivery failed");
            error_response(&e)
        }
    }
}

/// POST /output
async fn output_handler(
    State(state): State<GatewayState>,
    headers: HeaderMap,
    Json(callback): Json<OutputCallback>,
) -> Response {
    if !state.authorized(&headers) {
        return unauthorized();
    }
    if state.transformer.mode() == TransformerMode::Rest {
        crate::log_component!(
            warn,
            "gateway",
            "output callback rejected in rest mode",
            session = callback.session_id.as_str()
        );
        return (
            StatusCode::CONFLICT,
            Json(json!({"error": "output callbacks require webhook mode"})),
        )
            .into_response();
    }
    match state
        .transformer
        .send_output(&callback.output, &callback.user_id, &callback.session_id)
        .await
    {
        Ok(response) => (
            StatusCode::OK,
            Json(json!({"status": "ok", "delivered": true, "providerStatus": response.status})),
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "output callback failed");
            error_response(&e)
        }
    }
}

/// Bind and serve the gateway in a background task.
pub async fn start(
    config: &ServerConfig,
    state: GatewayState,
) -> Result<tokio::task::JoinHandle<()>> {
    let app = build_router(state, &config.path);
    let addr = format!("{}:{}", config.bind_address, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    let mode = format!("{:?}", config.mode);
    crate::log_component!(
        info,
        "gateway",
        "listening",
        addr = addr.as_str(),
        path = config.path.as_str(),
        mode = mode.as_str()
    );

    let handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            error!("gateway server error: {}", e);
        }
    });

    Ok(handle)
}
