//! Parameter sampling seam.

use std::time::Duration;

use async_trait::async_trait;
use liverule_rules::model::Snapshot;

/// Errors from a [`ParameterSource`]. Any of them ends the run.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SamplerError {
    #[error("device unavailable: {0}")]
    Unavailable(String),

    #[error("poll timed out after {0:?}")]
    Timeout(Duration),
}

/// Produces one [`Snapshot`] of the monitored parameters per call.
#[async_trait]
pub trait ParameterSource: Send + Sync {
    async fn poll(&self) -> Result<Snapshot, SamplerError>;
}
