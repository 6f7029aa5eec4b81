//! Launcher contract: pure factories that create workflow instances

use std::sync::Arc;

use super::definition::Workflow;
use crate::pool::WorkflowPool;

/// Shared reference to a live workflow instance
pub type WorkflowRef<S, E, O> = Arc<dyn Workflow<State = S, Event = E, Output = O>>;

/// A pure factory that creates a new workflow instance from an initial state
///
/// Launchers are immutable and may be reused across any number of launches.
/// The pool hands each launch a clone of itself so the produced instance can
/// launch nested instances; the clone stays valid for the instance's full
/// lifetime. A launcher must not call back into the pool synchronously from
/// `launch` - the reference is for the produced workflow's use.
pub trait Launcher: Send + Sync + 'static {
    /// State snapshot type of produced instances
    type State: Clone + PartialEq + Send + Sync + 'static;

    /// Event type of produced instances
    type Event: Send + 'static;

    /// Terminal output type of produced instances
    type Output: Clone + Send + Sync + 'static;

    /// Create a new instance starting from `initial`
    fn launch(
        &self,
        initial: Self::State,
        pool: WorkflowPool,
    ) -> WorkflowRef<Self::State, Self::Event, Self::Output>;
}
