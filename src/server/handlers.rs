use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use crate::claims::{BatchStatus, ClaimBatch, ReconcileReport};
use crate::server::AppState;
use crate::storage::ClaimMap;

pub const MSG_CLAIMED: &str = "Items claimed successfully!";
pub const MSG_NOTHING_CLAIMED: &str = "No available item was claimed (all already taken).";
pub const MSG_SAVE_FAILED: &str = "Failed to save data on server";

#[derive(Debug, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResponse {
    pub claimed_items: Vec<String>,
    pub already_claimed: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failed_items: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Claims were only recorded in the in-memory fallback
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub volatile: bool,
}

impl SubmitResponse {
    fn error(message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
            ..Self::default()
        }
    }

    fn from_report(report: ReconcileReport) -> (StatusCode, Self) {
        let status = report.status();
        let mut body = Self {
            claimed_items: report.accepted_lines(),
            already_claimed: report.rejected,
            failed_items: report.failed,
            volatile: report.volatile && status == BatchStatus::Claimed,
            ..Self::default()
        };

        let code = match status {
            BatchStatus::Claimed => {
                body.message = Some(MSG_CLAIMED.to_string());
                StatusCode::OK
            }
            BatchStatus::NothingClaimed => {
                body.message = Some(MSG_NOTHING_CLAIMED.to_string());
                StatusCode::OK
            }
            BatchStatus::StorageFailure => {
                body.error = Some(MSG_SAVE_FAILED.to_string());
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        (code, body)
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub uptime: u64,
    pub storage: &'static str,
    pub durable: bool,
}

/// GET /api/names
pub async fn names(State(state): State<AppState>) -> Json<ClaimMap> {
    Json(state.registry.snapshot().await)
}

/// POST /api/submit
pub async fn submit(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Response {
    let Json(body) = match payload {
        Ok(body) => body,
        Err(rejection) => {
            warn!("Rejected malformed submission: {}", rejection.body_text());
            return (
                StatusCode::BAD_REQUEST,
                Json(SubmitResponse::error(rejection.body_text())),
            )
                .into_response();
        }
    };

    let batch = match ClaimBatch::from_json(body) {
        Ok(batch) => batch,
        Err(e) => {
            warn!("Rejected submission: {}", e);
            return (StatusCode::BAD_REQUEST, Json(SubmitResponse::error(e.to_string())))
                .into_response();
        }
    };

    match state.registry.submit(batch).await {
        Ok(report) => {
            let (code, body) = SubmitResponse::from_report(report);
            (code, Json(body)).into_response()
        }
        Err(e) => {
            tracing::error!("Claim submission failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(SubmitResponse::error(MSG_SAVE_FAILED)),
            )
                .into_response()
        }
    }
}

/// GET /api/health
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let store = state.registry.store();
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        uptime: state.started.elapsed().as_secs(),
        storage: store.backend(),
        durable: store.is_durable(),
    })
}
