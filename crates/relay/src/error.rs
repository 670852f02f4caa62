//! Relay errors.

/// Errors returned by the relay validator registry and endpoint helpers.
///
/// Cloneable so that callers waiting on an in-flight synchronisation observe the same
/// outcome.
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum RelayError {
    /// No registration is known for the requested slot.
    #[error("validator not found")]
    ValidatorNotFound,
    /// The registration request could not be completed.
    #[error("failed to fetch validator registrations: {0}")]
    Fetch(String),
    /// The relay answered with a status code above 299.
    #[error("non-ok response code {code} from relay {endpoint}")]
    NonOkResponse {
        /// HTTP status code.
        code: u16,
        /// Requested endpoint.
        endpoint: String,
    },
    /// The relay answered with a body that could not be parsed.
    #[error("invalid relay response: {0}")]
    InvalidResponse(String),
}

/// Maps an HTTP status code of a relay response to a result.
pub fn check_status(code: u16, endpoint: &str) -> Result<(), RelayError> {
    if code > 299 {
        return Err(RelayError::NonOkResponse { code, endpoint: endpoint.to_string() });
    }
    Ok(())
}
