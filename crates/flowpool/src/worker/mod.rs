//! Single-shot workers adapted into launchers
//!
//! A [`Worker`] is a fire-once async computation with no incremental state
//! and no deliverable events. [`WorkerLauncher`] adapts one into a
//! [`Launcher`] whose instances publish zero intermediate snapshots (their
//! event type is uninhabited) and resolve their result exactly when the
//! computation completes.

use std::convert::Infallible;
use std::sync::Arc;

use async_trait::async_trait;

use crate::pool::WorkflowPool;
use crate::workflow::{HostedWorkflow, Launcher, WorkflowFailure, WorkflowRef};

/// A single asynchronous input -> output computation
#[async_trait]
pub trait Worker: Send + Sync + 'static {
    /// Input type, doubling as the launch state of the adapted instance
    type Input: Clone + PartialEq + Send + Sync + 'static;

    /// Output type
    type Output: Clone + Send + Sync + 'static;

    /// Run the computation
    async fn run(&self, input: Self::Input) -> Result<Self::Output, WorkflowFailure>;
}

/// Adapts a [`Worker`] into a [`Launcher`]
///
/// The produced instances ignore the pool reference entirely; no event can
/// legally be delivered to them ([`Infallible`] is uninhabited).
pub struct WorkerLauncher<W> {
    worker: Arc<W>,
}

impl<W> WorkerLauncher<W> {
    /// Wrap a worker for registration with a pool
    pub fn new(worker: W) -> Self {
        Self {
            worker: Arc::new(worker),
        }
    }
}

impl<W: Worker> Launcher for WorkerLauncher<W> {
    type State = W::Input;
    type Event = Infallible;
    type Output = W::Output;

    fn launch(
        &self,
        input: W::Input,
        _pool: WorkflowPool,
    ) -> WorkflowRef<W::Input, Infallible, W::Output> {
        let worker = Arc::clone(&self.worker);
        HostedWorkflow::spawn(input.clone(), move |ctx| async move {
            // Hold the context so the snapshot stream ends only at completion.
            let _ctx = ctx;
            worker.run(input).await
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Shout;

    #[async_trait]
    impl Worker for Shout {
        type Input = String;
        type Output = String;

        async fn run(&self, input: String) -> Result<String, WorkflowFailure> {
            Ok(input.to_uppercase())
        }
    }

    #[tokio::test]
    async fn test_worker_instance_resolves_to_the_computation_result() {
        let launcher = WorkerLauncher::new(Shout);
        let workflow = launcher.launch("hey".to_string(), WorkflowPool::new());

        assert_eq!(workflow.result().await, Ok("HEY".to_string()));
        assert!(workflow.is_finished());
    }

    #[tokio::test]
    async fn test_worker_instance_emits_no_intermediate_snapshots() {
        let launcher = WorkerLauncher::new(Shout);
        let workflow = launcher.launch("hey".to_string(), WorkflowPool::new());

        workflow.result().await.expect("worker result");
        // At most the launch snapshot, then stream end.
        if let Some(state) = workflow.next_state().await {
            assert_eq!(state, "hey");
        }
        assert_eq!(workflow.next_state().await, None);
    }
}
