use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use ride_tracker_lib::error::RideError;
use serde_json::json;

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    NotFound(String),
}

impl From<RideError> for ApiError {
    fn from(error: RideError) -> Self {
        match error {
            RideError::InvalidRequest(_) => ApiError::BadRequest(error.to_string()),
            RideError::VehicleNotFound(_) | RideError::RideNotFound(_) => ApiError::NotFound(error.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            ApiError::NotFound(message) => (StatusCode::NOT_FOUND, message),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
