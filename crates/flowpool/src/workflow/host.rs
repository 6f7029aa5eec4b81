//! Channel-backed workflow instances hosted on tokio tasks
//!
//! [`HostedWorkflow`] is the stock [`Workflow`] implementation used by the
//! reactor and worker adapters. State snapshots travel over a `watch` channel,
//! so they are conflated: a consumer always observes the latest snapshot and
//! never a stale intermediate one. Events travel over an unbounded `mpsc`
//! channel, and cancellation is signalled the same way the rest of the stack
//! signals shutdown: a `watch<bool>` flipped to `true`.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{mpsc, watch, Mutex};
use tracing::trace;

use super::definition::{Workflow, WorkflowFailure};

/// Capabilities handed to a hosted workflow body
///
/// Publishing a state makes it the latest snapshot observable through the
/// owning [`HostedWorkflow`]. Dropping the context ends the snapshot stream,
/// which is how the body's completion becomes observable; the host does this
/// automatically when the body future resolves or is cancelled.
pub struct HostContext<S, E> {
    states: watch::Sender<S>,
    events: mpsc::UnboundedReceiver<E>,
}

impl<S, E> HostContext<S, E> {
    /// Publish a new state snapshot
    pub fn set_state(&self, state: S) {
        self.states.send_replace(state);
    }

    /// Receive the next delivered event
    ///
    /// Returns `None` if the owning instance has been dropped.
    pub async fn next_event(&mut self) -> Option<E> {
        self.events.recv().await
    }
}

/// A workflow instance backed by a spawned task
pub struct HostedWorkflow<S, E, O> {
    states: Mutex<watch::Receiver<S>>,
    result: watch::Receiver<Option<Result<O, WorkflowFailure>>>,
    events: mpsc::UnboundedSender<E>,
    cancel: watch::Sender<bool>,
}

impl<S, E, O> HostedWorkflow<S, E, O>
where
    S: Clone + PartialEq + Send + Sync + 'static,
    E: Send + 'static,
    O: Clone + Send + Sync + 'static,
{
    /// Spawn a workflow body and return the instance wrapping it
    ///
    /// The body runs on its own tokio task, raced against the cancellation
    /// signal; a cancelled instance terminates with
    /// [`WorkflowFailure::cancelled`]. The `initial` state is immediately
    /// observable as an unconsumed snapshot.
    pub fn spawn<F, Fut>(initial: S, body: F) -> Arc<Self>
    where
        F: FnOnce(HostContext<S, E>) -> Fut,
        Fut: Future<Output = Result<O, WorkflowFailure>> + Send + 'static,
    {
        let (state_tx, mut state_rx) = watch::channel(initial);
        // The launch state counts as an unobserved snapshot.
        state_rx.mark_changed();

        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (result_tx, result_rx) = watch::channel(None);
        let (cancel_tx, mut cancel_rx) = watch::channel(false);

        let fut = body(HostContext {
            states: state_tx,
            events: event_rx,
        });

        tokio::spawn(async move {
            let outcome = tokio::select! {
                // changed() also resolves with Err when the instance itself
                // is dropped, which tears the orphaned body down with it.
                _ = cancel_rx.changed() => Err(WorkflowFailure::cancelled()),
                outcome = fut => outcome,
            };
            // The body future (and with it the state sender) is gone by now,
            // so the snapshot stream has ended; publish the result last.
            let _ = result_tx.send(Some(outcome));
        });

        Arc::new(Self {
            states: Mutex::new(state_rx),
            result: result_rx,
            events: event_tx,
            cancel: cancel_tx,
        })
    }
}

#[async_trait]
impl<S, E, O> Workflow for HostedWorkflow<S, E, O>
where
    S: Clone + PartialEq + Send + Sync + 'static,
    E: Send + 'static,
    O: Clone + Send + Sync + 'static,
{
    type State = S;
    type Event = E;
    type Output = O;

    async fn next_state(&self) -> Option<S> {
        let mut states = self.states.lock().await;
        if !states.has_changed().ok()? {
            states.changed().await.ok()?;
        }
        // Bound first: the watch ref must not outlive the mutex guard.
        let state = states.borrow_and_update().clone();
        Some(state)
    }

    async fn result(&self) -> Result<O, WorkflowFailure> {
        let mut result = self.result.clone();
        loop {
            if let Some(outcome) = result.borrow_and_update().clone() {
                return outcome;
            }
            if result.changed().await.is_err() {
                return Err(WorkflowFailure::new(
                    "workflow host task ended without producing a result",
                ));
            }
        }
    }

    fn is_finished(&self) -> bool {
        self.result.borrow().is_some()
    }

    fn send_event(&self, event: E) {
        if self.events.send(event).is_err() {
            trace!("event dropped: workflow body no longer receiving");
        }
    }

    fn cancel(&self) {
        let _ = self.cancel.send(true);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_initial_state_is_observable() {
        let workflow = HostedWorkflow::<i32, (), i32>::spawn(7, |ctx| async move {
            let _ctx = ctx;
            std::future::pending::<()>().await;
            unreachable!()
        });

        assert_eq!(workflow.next_state().await, Some(7));
        assert!(!workflow.is_finished());
    }

    #[tokio::test]
    async fn test_states_are_conflated_to_latest() {
        let workflow = HostedWorkflow::<i32, (), i32>::spawn(0, |ctx| async move {
            ctx.set_state(1);
            ctx.set_state(2);
            ctx.set_state(3);
            std::future::pending::<()>().await;
            unreachable!()
        });

        // Give the body a chance to publish all three snapshots.
        tokio::task::yield_now().await;
        assert_eq!(workflow.next_state().await, Some(3));
    }

    #[tokio::test]
    async fn test_stream_ends_at_completion_and_result_is_idempotent() {
        let workflow = HostedWorkflow::<i32, (), i32>::spawn(0, |_ctx| async { Ok(42) });

        assert_eq!(workflow.result().await, Ok(42));
        assert_eq!(workflow.result().await, Ok(42));
        assert!(workflow.is_finished());

        // The body dropped its context, so the stream has ended.
        assert_eq!(workflow.next_state().await, None);
    }

    #[tokio::test]
    async fn test_cancel_terminates_with_cancelled_failure() {
        let workflow = HostedWorkflow::<i32, (), i32>::spawn(0, |ctx| async move {
            let _ctx = ctx;
            std::future::pending::<()>().await;
            unreachable!()
        });

        workflow.cancel();
        assert_eq!(workflow.result().await, Err(WorkflowFailure::cancelled()));
        assert!(workflow.is_finished());
    }

    #[tokio::test]
    async fn test_events_reach_the_body() {
        let workflow = HostedWorkflow::<i32, i32, i32>::spawn(0, |mut ctx| async move {
            let mut total = 0;
            while let Some(event) = ctx.next_event().await {
                total += event;
                if total >= 6 {
                    return Ok(total);
                }
            }
            Err(WorkflowFailure::new("event channel closed"))
        });

        workflow.send_event(1);
        workflow.send_event(2);
        workflow.send_event(3);
        assert_eq!(workflow.result().await, Ok(6));
    }
}
