//! Store error types

use catalog_gateway::GatewayError;
use catalog_model::{EffortUuid, ProgramId};

/// Failures surfaced by the hierarchy store
///
/// `Clone` is required: the de-duplicated fetch hands one shared future to
/// every concurrent caller, and each of them receives its own copy of the
/// settled result. Gateway failures are therefore carried as message
/// strings, which is also how the store records its load error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// The gateway reported or implied failure
    #[error("gateway failure: {0}")]
    Gateway(String),

    /// No program with the given id in the loaded tree
    #[error("program not found: {0}")]
    ProgramNotFound(ProgramId),

    /// No effort with the given uuid
    #[error("software effort not found: {0}")]
    EffortNotFound(EffortUuid),

    /// The effort record violates a local invariant
    #[error("invalid effort: {0}")]
    Validation(String),

    /// The requested parent assignment would close a cycle
    #[error("saving effort {uuid} would create a parent cycle")]
    CyclicParent { uuid: EffortUuid },
}

impl From<GatewayError> for StoreError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::ProgramNotFound(id) => Self::ProgramNotFound(id),
            GatewayError::EffortNotFound(uuid) => Self::EffortNotFound(uuid),
            other => Self::Gateway(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gateway_not_found_keeps_identity() {
        let err: StoreError = GatewayError::EffortNotFound(EffortUuid::new()).into();
        assert!(matches!(err, StoreError::EffortNotFound(_)));

        let err: StoreError = GatewayError::ProgramNotFound(ProgramId::new("9")).into();
        assert_eq!(err, StoreError::ProgramNotFound(ProgramId::new("9")));
    }

    #[test]
    fn gateway_faults_flatten_to_strings() {
        let err: StoreError = GatewayError::Unavailable("backend down".to_string()).into();
        assert_eq!(
            err,
            StoreError::Gateway("gateway unavailable: backend down".to_string())
        );
    }
}
