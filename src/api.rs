//! HTTP routes.
//!
//! - `POST /control_lights` `{"action": "on"|"off"|"toggle", "lights"?: [..]}`
//! - `POST /set_properties` `{"brightness"?: 0-100, "color"?: .., "lights"?: [..]}`
//! - `GET /get_info?lights=a&lights=b`
//! - `GET /health`
//!
//! Every control route answers 200 with one entry per requested device,
//! whatever happened to the individual devices. Only malformed requests
//! get a 400.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{RawQuery, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_http::trace::TraceLayer;

use crate::device::DeviceName;
use crate::errors::Error;
use crate::orchestrator::{ControlRequest, Orchestrator};
use crate::response::Outcomes;
use crate::types::{ColorInput, PowerAction};

/// Shared state for handlers
pub type ApiState = Arc<Orchestrator>;

/// Request rejected before any device was touched.
#[derive(Debug)]
pub struct ApiError(String);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (StatusCode::BAD_REQUEST, Json(json!({"error": self.0}))).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError(rejection.body_text())
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        ApiError(err.to_string())
    }
}

#[derive(Debug, Deserialize)]
struct ControlLightsBody {
    action: PowerAction,
    lights: Option<Vec<DeviceName>>,
}

#[derive(Debug, Deserialize)]
struct SetPropertiesBody {
    brightness: Option<i64>,
    color: Option<ColorInput>,
    lights: Option<Vec<DeviceName>>,
}

/// Liveness response
#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    devices: usize,
    connected: usize,
}

/// Build the router over an orchestrator.
pub fn router(orchestrator: Orchestrator) -> Router {
    Router::new()
        .route("/control_lights", post(control_lights))
        .route("/set_properties", post(set_properties))
        .route("/get_info", get(get_info))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(orchestrator))
}

async fn control_lights(
    State(orchestrator): State<ApiState>,
    body: Result<Json<ControlLightsBody>, JsonRejection>,
) -> Result<Json<Outcomes>, ApiError> {
    let Json(body) = body?;
    let request = ControlRequest::set_state(body.action, body.lights);
    Ok(Json(orchestrator.dispatch(request).await))
}

async fn set_properties(
    State(orchestrator): State<ApiState>,
    body: Result<Json<SetPropertiesBody>, JsonRejection>,
) -> Result<Json<Outcomes>, ApiError> {
    let Json(body) = body?;
    let request =
        ControlRequest::set_properties(body.brightness, body.color.as_ref(), body.lights)?;
    Ok(Json(orchestrator.dispatch(request).await))
}

async fn get_info(
    State(orchestrator): State<ApiState>,
    RawQuery(query): RawQuery,
) -> Json<Outcomes> {
    let lights = query.as_deref().map(lights_from_query).unwrap_or_default();
    let targets = (!lights.is_empty()).then_some(lights);
    Json(orchestrator.dispatch(ControlRequest::query_info(targets)).await)
}

async fn health(State(orchestrator): State<ApiState>) -> Json<HealthResponse> {
    let registry = orchestrator.registry();
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        devices: registry.len(),
        connected: registry.connected(),
    })
}

/// Collect every `lights` parameter, in order.
fn lights_from_query(query: &str) -> Vec<DeviceName> {
    url::form_urlencoded::parse(query.as_bytes())
        .filter(|(key, _)| key == "lights")
        .map(|(_, value)| value.into_owned())
        .collect()
}
