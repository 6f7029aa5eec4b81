//! Workflow capability contract

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Terminal failure of a workflow instance
///
/// Carried by the result accessor when an instance ends abnormally. Cloneable
/// so repeated result reads stay idempotent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WorkflowFailure {
    /// Failure message
    pub message: String,

    /// Whether the instance ended because cancellation was requested
    pub cancelled: bool,
}

impl WorkflowFailure {
    /// Create a new failure
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            cancelled: false,
        }
    }

    /// Create the failure reported by a cancelled instance
    pub fn cancelled() -> Self {
        Self {
            message: "workflow cancelled".to_string(),
            cancelled: true,
        }
    }
}

impl std::fmt::Display for WorkflowFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for WorkflowFailure {}

/// A single running instance of a stateful process
///
/// The pool consumes instances exclusively through this contract. An instance
/// exposes a lazy sequence of state snapshots, a terminal result, a
/// non-suspending completion flag, event delivery, and cooperative
/// cancellation.
///
/// # Snapshot sequence
///
/// `next_state` yields the latest snapshot the caller has not yet observed;
/// intermediate snapshots may be conflated away, but never reordered. The
/// sequence ends (`None`) exactly when the instance reaches a terminal state.
///
/// # Completion
///
/// Once `is_finished` reports `true` it never reverts. `result` may be called
/// any number of times after completion and returns the same outcome each
/// time; calling it earlier suspends until the instance terminates.
#[async_trait]
pub trait Workflow: Send + Sync + 'static {
    /// State snapshot type observed by callers
    type State: Clone + PartialEq + Send + Sync + 'static;

    /// Event type accepted by the instance
    type Event: Send + 'static;

    /// Terminal output type
    type Output: Clone + Send + Sync + 'static;

    /// Receive the next unobserved state snapshot, or `None` at stream end
    async fn next_state(&self) -> Option<Self::State>;

    /// Await the terminal outcome of the instance
    async fn result(&self) -> Result<Self::Output, WorkflowFailure>;

    /// Whether the instance has reached a terminal state
    fn is_finished(&self) -> bool;

    /// Deliver an event to the instance
    ///
    /// Events sent after completion are dropped.
    fn send_event(&self, event: Self::Event);

    /// Request cooperative termination
    ///
    /// Does not suspend. The instance may take further scheduling to actually
    /// reach completion, at which point it reports a cancellation failure (or
    /// whatever terminal outcome its own semantics define).
    fn cancel(&self);
}
