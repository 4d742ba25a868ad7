//! HTTP surface of the demo module, reached through the gateway proxy.

use axum::extract::{Path, Query};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;

const SENSORS: [(&str, &str); 3] = [("1", "Living Room"), ("2", "Bedroom"), ("3", "Kitchen")];

fn location_of(sensor_id: &str) -> &'static str {
    SENSORS
        .iter()
        .find(|(id, _)| *id == sensor_id)
        .map_or("Unknown", |(_, location)| location)
}

fn sensor_of(location: &str) -> &'static str {
    SENSORS
        .iter()
        .find(|(_, name)| name.eq_ignore_ascii_case(location))
        .map_or("0", |(id, _)| id)
}

#[derive(Debug, Deserialize)]
pub struct TemperatureQuery {
    pub location: Option<String>,
    #[serde(rename = "sensorId")]
    pub sensor_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Reading {
    pub location: String,
    pub sensor_id: String,
    pub value: f64,
    pub unit: &'static str,
}

impl Reading {
    fn new(location: String, sensor_id: String) -> Self {
        Self {
            location,
            sensor_id,
            value: 21.5,
            unit: "celsius",
        }
    }
}

pub enum TemperatureResponse {
    Ok(Reading),
    MissingSelector,
}

impl IntoResponse for TemperatureResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(reading) => (StatusCode::OK, Json(reading)).into_response(),
            Self::MissingSelector => (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({
                    "error": "either location or sensorId is required"
                })),
            )
                .into_response(),
        }
    }
}

/// `GET /temperature?location=…` or `?sensorId=…`
pub async fn temperature(Query(query): Query<TemperatureQuery>) -> TemperatureResponse {
    let reading = match (query.location, query.sensor_id) {
        (Some(location), Some(sensor_id)) => Reading::new(location, sensor_id),
        (Some(location), None) => {
            let sensor_id = sensor_of(&location).to_string();
            Reading::new(location, sensor_id)
        }
        (None, Some(sensor_id)) => Reading::new(location_of(&sensor_id).to_string(), sensor_id),
        (None, None) => return TemperatureResponse::MissingSelector,
    };
    tracing::debug!(location = %reading.location, "temperature read");
    TemperatureResponse::Ok(reading)
}

/// `GET /temperature/{sensor_id}`
pub async fn temperature_by_sensor(Path(sensor_id): Path<String>) -> Json<Reading> {
    Json(Reading::new(location_of(&sensor_id).to_string(), sensor_id))
}

/// `POST /commands`
pub async fn command(Json(command): Json<serde_json::Value>) -> Json<serde_json::Value> {
    tracing::info!(%command, "command received");
    Json(serde_json::json!({ "accepted": true, "command": command }))
}

pub fn router() -> Router {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/temperature", get(temperature))
        .route("/temperature/{sensor_id}", get(temperature_by_sensor))
        .route("/commands", post(command))
        .layer(TraceLayer::new_for_http())
}
