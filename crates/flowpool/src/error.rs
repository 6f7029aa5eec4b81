//! Error types for pool operations

use thiserror::Error;

use crate::workflow::WorkflowFailure;

/// Result type alias for pool operations
pub type Result<T> = std::result::Result<T, PoolError>;

/// Errors surfaced by pool operations
#[derive(Debug, Error)]
pub enum PoolError {
    /// No launcher registered for the requested workflow type
    ///
    /// A programmer error: launchers must be registered before any instance
    /// of their type is resolved. The pool's own state is unaffected.
    #[error("no launcher registered for workflow type {workflow_type}. Make sure the launcher is registered before resolving instances.")]
    NoLauncher {
        /// The (State, Event, Output) shape of the unregistered type
        workflow_type: &'static str,
    },

    /// A workflow's terminal failure, propagated unchanged
    #[error("workflow failed: {0}")]
    Workflow(#[from] WorkflowFailure),
}
