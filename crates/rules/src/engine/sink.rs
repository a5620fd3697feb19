//! Action sink seam between the engine and the controlled device.

use async_trait::async_trait;

use crate::schema::Action;

/// Errors an [`ActionSink`] can report for a single action.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DispatchError {
    /// The device understood the action but refused it (bad index, out of range).
    #[error("action rejected: {0}")]
    Rejected(String),

    /// The sink has no handler for this action type.
    #[error("unsupported action type '{0}'")]
    Unsupported(String),

    /// The action could not be delivered.
    #[error("transport error: {0}")]
    Transport(String),
}

/// Applies actions to the controlled device.
///
/// Called once per action of every triggered rule, in declaration order.
/// A failure is recorded by the engine and never stops the cycle.
#[async_trait]
pub trait ActionSink: Send + Sync {
    async fn dispatch(&self, action: &Action) -> Result<(), DispatchError>;
}
