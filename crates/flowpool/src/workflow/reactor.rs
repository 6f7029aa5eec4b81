//! Event-loop state machines hosted as workflow instances
//!
//! A [`Reactor`] describes one state transition at a time: given the current
//! state and access to the instance's event queue, it either enters a new
//! state or finishes with a terminal output. [`ReactorLauncher`] hosts a
//! reactor on a [`HostedWorkflow`](super::host::HostedWorkflow) task,
//! publishing every entered state as a snapshot.

use std::sync::Arc;

use async_trait::async_trait;

use super::definition::WorkflowFailure;
use super::host::{HostContext, HostedWorkflow};
use super::launcher::{Launcher, WorkflowRef};
use crate::pool::WorkflowPool;

/// Result of one reactor step
#[derive(Debug, Clone, PartialEq)]
pub enum Reaction<S, O> {
    /// Continue running in a new state
    EnterState(S),

    /// Terminate with this output
    FinishWith(O),
}

/// A state machine driven by external events
///
/// `react` receives the current state and may suspend on the event queue via
/// the context. The pool reference allows a reactor to launch and await
/// nested instances.
#[async_trait]
pub trait Reactor: Send + Sync + 'static {
    /// State snapshot type
    type State: Clone + PartialEq + Send + Sync + 'static;

    /// Event type consumed from the queue
    type Event: Send + 'static;

    /// Terminal output type
    type Output: Clone + Send + Sync + 'static;

    /// Perform one transition from `state`
    async fn react(
        &self,
        state: Self::State,
        ctx: &mut HostContext<Self::State, Self::Event>,
        pool: &WorkflowPool,
    ) -> Result<Reaction<Self::State, Self::Output>, WorkflowFailure>;
}

/// Hosts a [`Reactor`] as a [`Launcher`]
pub struct ReactorLauncher<R> {
    reactor: Arc<R>,
}

impl<R> ReactorLauncher<R> {
    /// Wrap a reactor for registration with a pool
    pub fn new(reactor: R) -> Self {
        Self {
            reactor: Arc::new(reactor),
        }
    }
}

impl<R: Reactor> Launcher for ReactorLauncher<R> {
    type State = R::State;
    type Event = R::Event;
    type Output = R::Output;

    fn launch(
        &self,
        initial: R::State,
        pool: WorkflowPool,
    ) -> WorkflowRef<R::State, R::Event, R::Output> {
        let reactor = Arc::clone(&self.reactor);
        HostedWorkflow::spawn(initial.clone(), move |mut ctx| async move {
            let mut state = initial;
            loop {
                match reactor.react(state.clone(), &mut ctx, &pool).await? {
                    Reaction::EnterState(next) => {
                        ctx.set_state(next.clone());
                        state = next;
                    }
                    Reaction::FinishWith(output) => return Ok(output),
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Doubles its state on every event until it exceeds a threshold.
    struct Doubler;

    #[async_trait]
    impl Reactor for Doubler {
        type State = u32;
        type Event = ();
        type Output = u32;

        async fn react(
            &self,
            state: u32,
            ctx: &mut HostContext<u32, ()>,
            _pool: &WorkflowPool,
        ) -> Result<Reaction<u32, u32>, WorkflowFailure> {
            if state >= 8 {
                return Ok(Reaction::FinishWith(state));
            }
            match ctx.next_event().await {
                Some(()) => Ok(Reaction::EnterState(state * 2)),
                None => Err(WorkflowFailure::new("event queue closed")),
            }
        }
    }

    #[tokio::test]
    async fn test_reactor_runs_to_completion() {
        let pool = WorkflowPool::new();
        let launcher = ReactorLauncher::new(Doubler);
        let workflow = launcher.launch(1, pool);

        workflow.send_event(());
        workflow.send_event(());
        workflow.send_event(());
        assert_eq!(workflow.result().await, Ok(8));
    }

    #[tokio::test]
    async fn test_reactor_publishes_entered_states() {
        let pool = WorkflowPool::new();
        let launcher = ReactorLauncher::new(Doubler);
        let workflow = launcher.launch(1, pool);

        assert_eq!(workflow.next_state().await, Some(1));
        workflow.send_event(());
        assert_eq!(workflow.next_state().await, Some(2));
    }
}
