//! Gateway error types

use catalog_model::{EffortUuid, EnvelopeError, ProgramId};

/// Convenience alias for gateway call results
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Failures crossing the gateway boundary
///
/// Backend-reported failures (`success: false` envelopes) arrive as
/// [`GatewayError::Envelope`]; transport problems as
/// [`GatewayError::Http`]. The store converts all of these to its own
/// error strings, so this type deliberately does not implement `Clone`.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Transport-level failure (connect, timeout, decode)
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The response envelope reported or implied failure
    #[error(transparent)]
    Envelope(#[from] EnvelopeError),

    /// No program with the given id
    #[error("program not found: {0}")]
    ProgramNotFound(ProgramId),

    /// No effort with the given uuid
    #[error("software effort not found: {0}")]
    EffortNotFound(EffortUuid),

    /// Backend unreachable or failure injected by a test double
    #[error("gateway unavailable: {0}")]
    Unavailable(String),

    /// Gateway misconfiguration (bad header value, unbuildable client)
    #[error("invalid gateway configuration: {0}")]
    Config(String),
}

impl GatewayError {
    /// Whether the failure is a not-found rather than a fault
    #[inline]
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::ProgramNotFound(_) | Self::EffortNotFound(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_failures_convert() {
        let err: GatewayError = EnvelopeError::Failure("broken".to_string()).into();
        assert!(err.to_string().contains("broken"));
        assert!(!err.is_not_found());
    }

    #[test]
    fn not_found_classification() {
        let err = GatewayError::ProgramNotFound(ProgramId::new("9"));
        assert!(err.is_not_found());
        let err = GatewayError::EffortNotFound(EffortUuid::new());
        assert!(err.is_not_found());
    }
}
