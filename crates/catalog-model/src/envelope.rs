//! Uniform backend response envelope
//!
//! Every endpoint answers `{success, data, message}`. An envelope with no
//! `success` flag is treated as a failure, never as an implicit success.

use serde::{Deserialize, Serialize};

/// Decoding failures for a response envelope
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EnvelopeError {
    /// Backend answered `success: false`
    #[error("backend reported failure: {0}")]
    Failure(String),

    /// No `success` flag at all
    #[error("response envelope missing success flag")]
    MissingSuccess,

    /// `success: true` but no payload on a data-bearing call
    #[error("successful response envelope missing data")]
    MissingData,
}

/// The `{success, data, message}` wire shape
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct Envelope<T> {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> Envelope<T> {
    /// Successful envelope carrying data
    #[inline]
    #[must_use]
    pub fn success(data: T) -> Self {
        Self {
            success: Some(true),
            data: Some(data),
            message: None,
        }
    }

    /// Failed envelope with a message
    #[inline]
    #[must_use]
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: Some(false),
            data: None,
            message: Some(message.into()),
        }
    }

    /// Collapse the envelope into a `Result`
    ///
    /// # Errors
    /// - [`EnvelopeError::MissingSuccess`] when the flag is absent
    /// - [`EnvelopeError::Failure`] when the backend reports failure
    /// - [`EnvelopeError::MissingData`] when a success carries no payload
    pub fn into_result(self) -> Result<T, EnvelopeError> {
        match self.success {
            Some(true) => self.data.ok_or(EnvelopeError::MissingData),
            Some(false) => Err(EnvelopeError::Failure(
                self.message.unwrap_or_else(|| "no message provided".to_string()),
            )),
            None => Err(EnvelopeError::MissingSuccess),
        }
    }

    /// Collapse an envelope whose payload is irrelevant (delete-style calls)
    ///
    /// # Errors
    /// Same as [`Envelope::into_result`], minus the missing-data case.
    pub fn into_unit_result(self) -> Result<(), EnvelopeError> {
        match self.success {
            Some(true) => Ok(()),
            Some(false) => Err(EnvelopeError::Failure(
                self.message.unwrap_or_else(|| "no message provided".to_string()),
            )),
            None => Err(EnvelopeError::MissingSuccess),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn success_envelope_yields_data() {
        let envelope: Envelope<Vec<u32>> =
            serde_json::from_str(r#"{"success": true, "data": [1, 2, 3]}"#).unwrap();
        assert_eq!(envelope.into_result(), Ok(vec![1, 2, 3]));
    }

    #[test]
    fn failure_envelope_carries_message() {
        let envelope: Envelope<u32> =
            serde_json::from_str(r#"{"success": false, "message": "program not found"}"#).unwrap();
        assert_eq!(
            envelope.into_result(),
            Err(EnvelopeError::Failure("program not found".to_string()))
        );
    }

    #[test]
    fn absent_success_flag_is_failure() {
        let envelope: Envelope<u32> = serde_json::from_str(r#"{"data": 5}"#).unwrap();
        assert_eq!(envelope.into_result(), Err(EnvelopeError::MissingSuccess));
    }

    #[test]
    fn success_without_data_is_malformed() {
        let envelope: Envelope<u32> = serde_json::from_str(r#"{"success": true}"#).unwrap();
        assert_eq!(envelope.into_result(), Err(EnvelopeError::MissingData));
    }

    #[test]
    fn unit_result_tolerates_missing_data() {
        let envelope: Envelope<u32> = Envelope::success(1);
        assert_eq!(envelope.into_unit_result(), Ok(()));

        let bare: Envelope<u32> = serde_json::from_str(r#"{"success": true}"#).unwrap();
        assert_eq!(bare.into_unit_result(), Ok(()));

        let failed: Envelope<u32> = Envelope::failure("nope");
        assert_eq!(
            failed.into_unit_result(),
            Err(EnvelopeError::Failure("nope".to_string()))
        );
    }
}
