use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RideError {
    /// A required field is missing or carries a value outside its domain.
    #[error("{0}")]
    InvalidRequest(String),
    #[error("Vehicle not found: {0}")]
    VehicleNotFound(String),
    #[error("Ride {0} not found")]
    RideNotFound(i64),
}

impl RideError {
    pub fn invalid(message: impl Into<String>) -> Self {
        RideError::InvalidRequest(message.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, RideError::VehicleNotFound(_) | RideError::RideNotFound(_))
    }
}
