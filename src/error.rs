//! Engine error taxonomy.
//!
//! Three families: caller mistakes (`InvalidPeriod`), persistence collaborator
//! failures (`DependencyTimeout` / `DependencyUnavailable`), and request
//! cancellation. An empty scope is never an error — rollups omit the node and
//! detail reports emit zero-filled rows instead.

use std::time::Duration;
use thiserror::Error;

use crate::store::StoreError;

/// Errors surfaced by report computation.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Month/year outside the accepted range. Not retryable.
    #[error("invalid reporting period: {0}")]
    InvalidPeriod(String),

    /// A store query exceeded the configured deadline. Retryable.
    #[error("persistence query timed out after {0:?}")]
    DependencyTimeout(Duration),

    /// The store reported a failure. Retryable.
    #[error("persistence unavailable: {0}")]
    DependencyUnavailable(String),

    /// The invoking request was cancelled; partial results are discarded.
    #[error("report computation cancelled")]
    Cancelled,
}

impl From<StoreError> for EngineError {
    fn from(err: StoreError) -> Self {
        EngineError::DependencyUnavailable(err.to_string())
    }
}
