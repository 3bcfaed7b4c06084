//! Error taxonomy for external capability calls
//!
//! Every failure of the generation or embedding capability is classified as
//! either transient (worth retrying) or permanent (retrying will not change
//! the outcome). The retry layer consults [`CallError::is_transient`] and
//! knows nothing else about the call it wraps.

use thiserror::Error;

/// Errors surfaced by the generation and embedding capabilities.
#[derive(Error, Debug)]
pub enum CallError {
    /// The service rejected the call due to rate limiting (transient)
    #[error("rate limited by provider")]
    RateLimited,

    /// The call did not complete within the request timeout (transient)
    #[error("request timed out")]
    Timeout,

    /// The service reported an internal error, 5xx-equivalent (transient)
    #[error("server error: {0}")]
    ServerError(String),

    /// The request was malformed and will never be accepted (permanent)
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Authentication or authorization failure (permanent)
    #[error("authentication failed: {0}")]
    Auth(String),

    /// The response could not be parsed or failed shape validation (permanent)
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// The retry budget was exhausted on transient errors (permanent);
    /// carries the last transient error observed
    #[error("retries exhausted after {attempts} attempts")]
    Exhausted {
        /// Number of invocations consumed
        attempts: u32,
        /// The last transient error
        #[source]
        source: Box<CallError>,
    },

    /// The call was aborted by a deadline or shutdown (permanent)
    #[error("cancelled")]
    Cancelled,
}

impl CallError {
    /// Whether a retry is expected to change the outcome
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            CallError::RateLimited | CallError::Timeout | CallError::ServerError(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(CallError::RateLimited.is_transient());
        assert!(CallError::Timeout.is_transient());
        assert!(CallError::ServerError("503".to_string()).is_transient());

        assert!(!CallError::InvalidRequest("bad schema".to_string()).is_transient());
        assert!(!CallError::Auth("missing key".to_string()).is_transient());
        assert!(!CallError::InvalidResponse("empty".to_string()).is_transient());
        assert!(!CallError::Cancelled.is_transient());
    }

    #[test]
    fn test_exhaustion_is_permanent_and_keeps_cause() {
        let err = CallError::Exhausted {
            attempts: 3,
            source: Box::new(CallError::RateLimited),
        };
        assert!(!err.is_transient());
        assert!(err.to_string().contains("3 attempts"));
    }
}
