//! Failure taxonomy for the contract layer.
//!
//! Transport, schema and validation failures are distinct types so a caller
//! can tell "the service is unreachable" apart from "the service answered
//! something we do not understand" apart from "the user typed a bad value".
//! Integrity violations inside a loaded collection are not raised at all:
//! they are counted and listed (see [`IntegrityViolation`]).

use thiserror::Error;

/// The service could not be reached, or answered with a non-success status.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("transport failure{}: {message}", .status.map(|s| format!(" (HTTP {s})")).unwrap_or_default())]
pub struct TransportError {
    pub message: String,
    pub status: Option<u16>,
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into(), status: None }
    }

    pub fn with_status(message: impl Into<String>, status: u16) -> Self {
        Self { message: message.into(), status: Some(status) }
    }
}

/// A string that does not name one of the three risk levels.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unrecognized risk level {0:?} (expected Low, Medium or High)")]
pub struct UnknownRiskLevel(pub String);

/// A response did not match the schema the client expects (contract drift).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SchemaError {
    #[error("response is not valid JSON for this endpoint: {0}")]
    Malformed(String),

    #[error("response is missing required field `{0}`")]
    MissingField(&'static str),

    #[error("field `{field}` has the wrong type (expected {expected})")]
    WrongType { field: &'static str, expected: &'static str },

    #[error("unrecognized risk level {0:?} (expected Low, Medium or High)")]
    UnknownRiskLevel(String),

    #[error("field `{field}` = {value} is outside [0, 1]")]
    OutOfRange { field: &'static str, value: f64 },

    #[error("model info drift: {0}")]
    ModelInfo(String),
}

impl From<UnknownRiskLevel> for SchemaError {
    fn from(e: UnknownRiskLevel) -> Self {
        Self::UnknownRiskLevel(e.0)
    }
}

/// User-edited simulation input failed a request-field constraint.
/// Raised before any network call; always names the offending field.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("{field}: must be a finite number, got {value}")]
    NotFinite { field: &'static str, value: f64 },

    #[error("{field}: must not be negative, got {value}")]
    Negative { field: &'static str, value: f64 },

    #[error("{field}: must be greater than zero, got {value}")]
    NotPositive { field: &'static str, value: f64 },

    #[error("road_access: unrecognized value {0:?} (expected Good, Moderate or Poor)")]
    UnknownRoadAccess(String),
}

impl ValidationError {
    /// Name of the request field that failed.
    pub fn field(&self) -> &'static str {
        match self {
            Self::NotFinite { field, .. }
            | Self::Negative { field, .. }
            | Self::NotPositive { field, .. } => *field,
            Self::UnknownRoadAccess(_) => "road_access",
        }
    }
}

/// Anything that can go wrong between "submit" and "decoded result".
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ContractError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Why a feature in a loaded collection could not be binned.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ViolationKind {
    #[error("risk_level is missing")]
    MissingRiskLevel,

    #[error("risk_level {0:?} is not Low, Medium or High")]
    UnknownRiskLevel(String),

    #[error("risk_score is missing")]
    MissingRiskScore,

    #[error("risk_score {0} is not a finite non-negative number")]
    InvalidRiskScore(f64),

    #[error("{0} is missing")]
    MissingAttribute(&'static str),

    #[error("{field} {value} is not a finite non-negative number")]
    InvalidAttribute { field: &'static str, value: f64 },

    #[error("{0} has the wrong type")]
    WrongType(&'static str),
}

/// A data-integrity problem at a given position of a loaded collection.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("feature #{index}: {kind}")]
pub struct IntegrityViolation {
    /// Position of the feature in the source document.
    pub index: usize,
    pub kind: ViolationKind,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_errors_name_their_field() {
        let e = ValidationError::Negative { field: "pop_density", value: -1.0 };
        assert_eq!(e.field(), "pop_density");
        assert!(e.to_string().starts_with("pop_density"));

        let e = ValidationError::UnknownRoadAccess("Excellent".into());
        assert_eq!(e.field(), "road_access");
    }

    #[test]
    fn transport_error_mentions_status_only_when_known() {
        assert_eq!(
            TransportError::with_status("service unavailable", 503).to_string(),
            "transport failure (HTTP 503): service unavailable"
        );
        assert_eq!(
            TransportError::new("connection refused").to_string(),
            "transport failure: connection refused"
        );
    }

    #[test]
    fn contract_error_keeps_the_kind_apart() {
        let schema: ContractError = SchemaError::MissingField("risk_score").into();
        let transport: ContractError = TransportError::new("timeout").into();
        assert!(matches!(schema, ContractError::Schema(_)));
        assert!(matches!(transport, ContractError::Transport(_)));
    }
}
