use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::catalog::CatalogError;
use crate::predict::PredictError;
use crate::track::TrackError;
use crate::web::config::Permission;

pub enum ApiError {
    Permission(Permission),
    Validation(String),
    SatelliteNotFound(String),
    JobRunning,
    Predict(PredictError),
    Track(TrackError),
    Catalog(CatalogError),
}

impl From<PredictError> for ApiError {
    fn from(e: PredictError) -> Self {
        ApiError::Predict(e)
    }
}

impl From<TrackError> for ApiError {
    fn from(e: TrackError) -> Self {
        match e {
            TrackError::Predict(inner) => ApiError::Predict(inner),
            other => ApiError::Track(other),
        }
    }
}

impl From<CatalogError> for ApiError {
    fn from(e: CatalogError) -> Self {
        ApiError::Catalog(e)
    }
}

impl ApiError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::Permission(_) => (StatusCode::FORBIDDEN, "insufficient_permissions"),
            ApiError::Validation(_) => (StatusCode::BAD_REQUEST, "validation_failed"),
            ApiError::SatelliteNotFound(_) => (StatusCode::NOT_FOUND, "satellite_not_found"),
            ApiError::JobRunning => (StatusCode::CONFLICT, "job_running"),
            ApiError::Predict(e) => match e {
                PredictError::InvalidWindow(_) => (StatusCode::BAD_REQUEST, "invalid_window"),
                PredictError::InvalidResolution(_) => {
                    (StatusCode::BAD_REQUEST, "invalid_resolution")
                }
                PredictError::MalformedEventSequence(_) => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "malformed_event_sequence",
                ),
                PredictError::TimezoneLookupFailed(_) => {
                    (StatusCode::BAD_GATEWAY, "timezone_lookup_failed")
                }
                PredictError::EphemerisUnavailable(_) => {
                    (StatusCode::SERVICE_UNAVAILABLE, "ephemeris_unavailable")
                }
            },
            ApiError::Track(e) => match e {
                TrackError::InsufficientPoints(_) => {
                    (StatusCode::UNPROCESSABLE_ENTITY, "insufficient_points")
                }
                TrackError::DegenerateHull => (StatusCode::UNPROCESSABLE_ENTITY, "degenerate_hull"),
                TrackError::InvalidGridResolution(_) => {
                    (StatusCode::BAD_REQUEST, "invalid_resolution")
                }
                TrackError::Predict(_) => (StatusCode::INTERNAL_SERVER_ERROR, "predict_error"),
                TrackError::Render(_) => (StatusCode::INTERNAL_SERVER_ERROR, "render_failed"),
            },
            ApiError::Catalog(e) => match e {
                CatalogError::InvalidObserver { .. } => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "invalid_observer")
                }
                CatalogError::CorruptCatalog { .. } => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "corrupt_catalog")
                }
                CatalogError::InvalidElements { .. } => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "invalid_elements")
                }
                CatalogError::Io { .. } => (StatusCode::SERVICE_UNAVAILABLE, "data_file_unreadable"),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        let message = match self {
            ApiError::Permission(p) => Some(format!("requires the '{p}' permission")),
            ApiError::JobRunning => None,
            ApiError::Validation(msg) => Some(msg),
            ApiError::SatelliteNotFound(name) => Some(format!("no satellite named '{name}'")),
            ApiError::Predict(e) => Some(e.to_string()),
            ApiError::Track(e) => Some(e.to_string()),
            ApiError::Catalog(e) => Some(e.to_string()),
        };
        if status.is_server_error() {
            log::error!("{}: {}", code, message.as_deref().unwrap_or_default());
        }
        let body = match message {
            Some(msg) => ErrorResponse::with_message(code, &msg),
            None => ErrorResponse::new(code),
        };
        (status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: &str) -> Self {
        ErrorResponse {
            error: error.to_string(),
            message: None,
        }
    }

    pub fn with_message(error: &str, message: &str) -> Self {
        ErrorResponse {
            error: error.to_string(),
            message: Some(message.to_string()),
        }
    }
}
