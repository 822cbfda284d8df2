//! Error types for Fareline
//!
//! Every failure the pricing core can report is a variant of [`FareError`].
//! Each variant carries a stable machine code so that whatever layer wraps
//! the core can map it to a structured failure response.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias using FareError
pub type Result<T> = std::result::Result<T, FareError>;

/// Unified error type for fare operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FareError {
    /// Malformed request: negative distance, empty identifiers
    #[error("Invalid ride request: {reason}")]
    InvalidRequest { reason: String },

    /// No registry entry for the requested ride class
    #[error("Unknown ride class: {ride_class}")]
    UnknownRideClass { ride_class: String },

    /// Policy rejected at registration (or a custom surge rule misbehaved)
    #[error("Invalid rate policy: {reason}")]
    InvalidPolicy { reason: String },

    /// Ledger already holds a fare for this ride
    #[error("Fare already recorded for ride: {ride_id}")]
    DuplicateRide { ride_id: String },

    /// Ledger lookup miss
    #[error("No fare recorded for ride: {ride_id}")]
    NotFound { ride_id: String },

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    // Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl FareError {
    pub fn invalid_request(reason: impl Into<String>) -> Self {
        FareError::InvalidRequest {
            reason: reason.into(),
        }
    }

    pub fn invalid_policy(reason: impl Into<String>) -> Self {
        FareError::InvalidPolicy {
            reason: reason.into(),
        }
    }

    /// Stable machine-readable code for this error kind
    pub fn code(&self) -> &'static str {
        match self {
            FareError::InvalidRequest { .. } => "invalid_request",
            FareError::UnknownRideClass { .. } => "unknown_ride_class",
            FareError::InvalidPolicy { .. } => "invalid_policy",
            FareError::DuplicateRide { .. } => "duplicate_ride",
            FareError::NotFound { .. } => "not_found",
            FareError::Config(_) => "config_error",
            FareError::Serialization(_) => "serialization_error",
        }
    }

    /// Whether the caller can fix this by correcting its input.
    ///
    /// Fare computation is pure, so a client error is permanent for the
    /// exact input that produced it.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, FareError::Config(_) | FareError::Serialization(_))
    }
}

/// Structured failure body for an outer API layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureResponse {
    pub code: String,
    pub message: String,
}

impl From<&FareError> for FailureResponse {
    fn from(err: &FareError) -> Self {
        Self {
            code: err.code().to_string(),
            message: err.to_string(),
        }
    }
}

impl From<FareError> for FailureResponse {
    fn from(err: FareError) -> Self {
        FailureResponse::from(&err)
    }
}

// Implement From for common external error types
impl From<serde_json::Error> for FareError {
    fn from(err: serde_json::Error) -> Self {
        FareError::Serialization(err.to_string())
    }
}

impl From<std::io::Error> for FareError {
    fn from(err: std::io::Error) -> Self {
        FareError::Config(err.to_string())
    }
}
