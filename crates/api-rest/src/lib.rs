//! # API REST
//!
//! REST API for the intake relay.
//!
//! Handles:
//! - `POST /api/patient-update`: republishes the body on the `hospital-system` channel
//! - health check and OpenAPI document
//! - a Pusher-protocol websocket for dashboards when running on the local transport
//!
//! The relay holds no patient state. Every request is independent.

#![warn(rust_2018_idioms)]

mod local_socket;

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use chrono::{SecondsFormat, Utc};
use intake_core::{CHANNEL_NAME, PATIENT_INPUT_EVENT, RELAY_PATH};
use intake_transport::{LocalChannel, Publisher};
use intake_types::{
    HealthRes, PatientRecord, RelayRequest, RelayResponse, RelayedEvent, StatusTag,
};
use serde_json::Value;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;

/// Application state for the relay
///
/// `local` is set only when the relay also serves dashboards from the in-process channel.
#[derive(Clone)]
pub struct AppState {
    publisher: Arc<dyn Publisher>,
    local: Option<LocalChannel>,
}

impl AppState {
    /// Relay backed by a hosted channel service.
    pub fn hosted(publisher: Arc<dyn Publisher>) -> Self {
        Self {
            publisher,
            local: None,
        }
    }

    /// Relay that publishes to, and serves subscribers from, an in-process channel.
    pub fn local(channel: LocalChannel) -> Self {
        Self {
            publisher: Arc::new(channel.clone()),
            local: Some(channel),
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(health, patient_update),
    components(schemas(HealthRes, RelayRequest, RelayResponse, PatientRecord, StatusTag))
)]
pub struct ApiDoc;

/// Builds the relay router.
pub fn build_router(state: AppState) -> Router {
    let mut router = Router::new()
        .route("/health", get(health))
        .route(RELAY_PATH, post(patient_update))
        .route("/api-docs/openapi.json", get(openapi_json));

    if state.local.is_some() {
        router = router.route("/app/:key", get(local_socket::ws_handler));
    }

    router.layer(CorsLayer::permissive()).with_state(state)
}

/// Server receive time, ISO-8601 UTC with millisecond precision.
pub fn relay_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint for the relay
#[axum::debug_handler]
async fn health(State(_state): State<AppState>) -> Json<HealthRes> {
    Json(HealthRes {
        ok: true,
        message: "Intake relay is alive".into(),
    })
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

#[utoipa::path(
    post,
    path = "/api/patient-update",
    request_body = RelayRequest,
    responses(
        (status = 200, description = "Patient data relayed", body = RelayResponse),
        (status = 500, description = "Publish failed", body = RelayResponse)
    )
)]
/// Relay a patient record to every dashboard
///
/// Stamps the body with the server time and publishes `{patientData, status, timestamp}` as
/// `patient-input` on `hospital-system`. The body is not validated: members are forwarded as
/// received, and a non-object body publishes the timestamp alone.
///
/// # Errors
/// Returns `500 Internal Server Error` if:
/// - the body is not JSON or is `null`, or
/// - the channel service rejects or cannot be reached for the publish.
#[axum::debug_handler]
async fn patient_update(
    State(state): State<AppState>,
    body: Bytes,
) -> (StatusCode, Json<RelayResponse>) {
    let body: Value = match serde_json::from_slice(&body) {
        Ok(body) => body,
        Err(e) => {
            tracing::error!("Relay body error: {:?}", e);
            return failed();
        }
    };

    let Some(event) = RelayedEvent::from_body(body, relay_timestamp()) else {
        tracing::error!("Relay body error: body is null");
        return failed();
    };
    let payload = match serde_json::to_value(&event) {
        Ok(payload) => payload,
        Err(e) => {
            tracing::error!("Relay encode error: {:?}", e);
            return failed();
        }
    };

    match state
        .publisher
        .trigger(CHANNEL_NAME, PATIENT_INPUT_EVENT, &payload)
        .await
    {
        Ok(()) => {
            tracing::info!("relayed {} event", PATIENT_INPUT_EVENT);
            (StatusCode::OK, Json(RelayResponse::sent()))
        }
        Err(e) => {
            tracing::error!("Publish error: {:?}", e);
            failed()
        }
    }
}

fn failed() -> (StatusCode, Json<RelayResponse>) {
    (StatusCode::INTERNAL_SERVER_ERROR, Json(RelayResponse::failed()))
}
