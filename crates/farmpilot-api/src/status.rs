use axum::{Json, extract::State};
use chrono::Utc;
use tokio::sync::RwLock;

use farmpilot_types::telemetry::{StatusPush, StatusSnapshot};

use crate::auth::AppState;
use crate::error::ApiError;

/// Latest device push. Explicit process-scoped state owned by
/// `AppStateInner`, written by the controller and read by the app.
pub type StatusCell = RwLock<Option<StatusSnapshot>>;

pub async fn get_status(State(state): State<AppState>) -> Result<Json<StatusSnapshot>, ApiError> {
    state
        .status
        .read()
        .await
        .clone()
        .map(Json)
        .ok_or(ApiError::NotFound("No sensor data available"))
}

/// Device push: replaces the previous snapshot wholesale and stamps the
/// server-side receive time.
pub async fn push_status(
    State(state): State<AppState>,
    Json(push): Json<StatusPush>,
) -> Json<StatusSnapshot> {
    let snapshot = StatusSnapshot {
        timestamp: Utc::now().to_rfc3339(),
        sensors: push.sensors,
        controls: push.controls,
    };

    *state.status.write().await = Some(snapshot.clone());
    Json(snapshot)
}
