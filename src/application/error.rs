use serde::Serialize;
use thiserror::Error;

use crate::domain::{AppointmentStatus, RangeError};

/// Why a single raw record was rejected during normalization.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ValidationError {
    #[error("missing required field `{field}`")]
    MissingField { field: &'static str },

    #[error("invalid {field}: {value:?}")]
    InvalidValue { field: &'static str, value: String },

    #[error("invalid date: {0:?}")]
    InvalidDate(String),

    #[error("time {time:?} does not match the time of {date:?}")]
    TimeMismatch { date: String, time: String },

    #[error("{field} must be positive, got {value}")]
    NotPositive { field: &'static str, value: String },

    #[error("{field} exceeds the largest accepted amount, got {value}")]
    TooLarge { field: &'static str, value: String },

    #[error("payment method set on a {status} appointment")]
    UnexpectedPaymentMethod { status: AppointmentStatus },
}

impl ValidationError {
    /// Name of the offending field, when the error is about a single one.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            ValidationError::MissingField { field }
            | ValidationError::InvalidValue { field, .. }
            | ValidationError::NotPositive { field, .. }
            | ValidationError::TooLarge { field, .. } => Some(*field),
            ValidationError::InvalidDate(_) => Some("date"),
            ValidationError::TimeMismatch { .. } => Some("time"),
            ValidationError::UnexpectedPaymentMethod { .. } => Some("paymentMethod"),
        }
    }
}

/// Errors that abort an analytics call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnalyticsError {
    #[error(transparent)]
    Range(#[from] RangeError),
}
