//! The workflow pool coordinator
//!
//! [`WorkflowPool`] owns two registries: launchers keyed by workflow type,
//! and live instances keyed by instance id. Every public operation funnels
//! through it. Instances are launched lazily on first resolve and pruned the
//! first time a completion check finds them finished.
//!
//! # Concurrency envelope
//!
//! The pool is cheaply cloneable (shared inner state) and its registry locks
//! are never held across an await, but coordination is intentionally thin:
//! callers are expected to serialize operations per instance id. Two tasks
//! racing the first resolve of the same id, or awaiting updates on the same
//! id concurrently, are outside the guaranteed-safe envelope.

mod registry;

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::error::{PoolError, Result};
use crate::worker::{Worker, WorkerLauncher};
use crate::workflow::handle::InstanceKey;
use crate::workflow::{Handle, Launcher, Update, WorkflowId, WorkflowRef, WorkflowType};
use registry::{LauncherRegistry, SharedLauncher};

/// One tracked live instance
///
/// The typed reference is stored behind `Any` for the heterogeneous map;
/// completion probing and cancellation are erased into closures so untyped
/// operations (`abandon_all`, pruning) need no downcast.
struct LiveEntry {
    /// `WorkflowRef<S, E, O>` behind `Any`
    typed: Box<dyn Any + Send + Sync>,
    finished: Box<dyn Fn() -> bool + Send + Sync>,
    cancel: Box<dyn Fn() + Send + Sync>,
}

impl LiveEntry {
    fn new<S, E, O>(workflow: WorkflowRef<S, E, O>) -> Self
    where
        S: Clone + PartialEq + Send + Sync + 'static,
        E: Send + 'static,
        O: Clone + Send + Sync + 'static,
    {
        let finished = {
            let workflow = Arc::clone(&workflow);
            Box::new(move || workflow.is_finished()) as Box<dyn Fn() -> bool + Send + Sync>
        };
        let cancel = {
            let workflow = Arc::clone(&workflow);
            Box::new(move || workflow.cancel()) as Box<dyn Fn() + Send + Sync>
        };
        Self {
            typed: Box::new(workflow),
            finished,
            cancel,
        }
    }
}

struct PoolInner {
    launchers: Mutex<LauncherRegistry>,
    workflows: Mutex<HashMap<InstanceKey, LiveEntry>>,
}

/// Coordinator for a set of independently running workflow instances
///
/// # Example
///
/// ```ignore
/// let pool = WorkflowPool::new();
/// pool.register(ReactorLauncher::new(Counter), COUNTER);
///
/// let handle = Handle::new(COUNTER.make_id("a"), 0);
/// match pool.await_update(handle).await? {
///     Update::Running(handle) => { /* fresh state in handle.state */ }
///     Update::Finished(output) => { /* instance terminated */ }
/// }
/// ```
#[derive(Clone)]
pub struct WorkflowPool {
    inner: Arc<PoolInner>,
}

impl Default for WorkflowPool {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkflowPool {
    /// Create an empty pool
    pub fn new() -> Self {
        Self {
            inner: Arc::new(PoolInner {
                launchers: Mutex::new(LauncherRegistry::new()),
                workflows: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Register a launcher for a workflow type
    ///
    /// The newest registration for a type wins; earlier ones are replaced
    /// silently. Already-running instances of the type are unaffected.
    pub fn register<L: Launcher>(
        &self,
        launcher: L,
        wtype: WorkflowType<L::State, L::Event, L::Output>,
    ) {
        // The token only pins the type parameters; identity lives in them.
        let _ = wtype;
        self.inner.launchers.lock().register(launcher);
    }

    /// Await the next update for a handle
    ///
    /// Lazily launches the instance if absent, then drains its snapshot
    /// stream, skipping anything equal to `handle.state`, until a differing
    /// snapshot arrives ([`Update::Running`] with a derived handle) or the
    /// stream ends ([`Update::Finished`] with the terminal output). A
    /// workflow failure propagates unchanged. On every exit path, including
    /// the caller dropping the in-flight future against a deadline, a
    /// completion check runs exactly once for `handle.id` and prunes the
    /// instance if it has finished.
    pub async fn await_update<S, E, O>(&self, handle: Handle<S, E, O>) -> Result<Update<S, E, O>>
    where
        S: Clone + PartialEq + Send + Sync + 'static,
        E: Send + 'static,
        O: Clone + Send + Sync + 'static,
    {
        let _check = CompletionCheck {
            pool: self,
            key: handle.id.instance_key(),
        };
        self.next_update(&handle).await
    }

    async fn next_update<S, E, O>(&self, handle: &Handle<S, E, O>) -> Result<Update<S, E, O>>
    where
        S: Clone + PartialEq + Send + Sync + 'static,
        E: Send + 'static,
        O: Clone + Send + Sync + 'static,
    {
        let workflow = self.resolve(handle)?;
        loop {
            match workflow.next_state().await {
                // Already known to the caller - never surface a no-op.
                Some(state) if state == handle.state => continue,
                Some(state) => return Ok(Update::Running(handle.with_state(state))),
                None => {
                    return workflow
                        .result()
                        .await
                        .map(Update::Finished)
                        .map_err(PoolError::Workflow)
                }
            }
        }
    }

    /// Run a single-shot worker through the pool and await its output
    ///
    /// Wraps `worker` as a launcher, registers it under `wtype`, resolves the
    /// instance named `name` through the same lazy-launch path as
    /// [`await_update`](Self::await_update) (with `input` as the launch
    /// state), and awaits only the terminal result - worker instances have no
    /// intermediate states by construction. The same unconditional completion
    /// check covers every exit path of this call.
    pub async fn await_worker_result<W: Worker>(
        &self,
        worker: W,
        input: W::Input,
        name: &str,
        wtype: WorkflowType<W::Input, std::convert::Infallible, W::Output>,
    ) -> Result<W::Output> {
        self.register(WorkerLauncher::new(worker), wtype);
        let handle = Handle::new(wtype.make_id(name), input);

        let _check = CompletionCheck {
            pool: self,
            key: handle.id.instance_key(),
        };
        let workflow = self.resolve(&handle)?;
        workflow.result().await.map_err(PoolError::Workflow)
    }

    /// Capability for delivering events to a handle's instance
    pub fn input<S, E, O>(&self, handle: &Handle<S, E, O>) -> EventSink<S, E, O>
    where
        S: Clone + PartialEq + Send + Sync + 'static,
        E: Send + 'static,
        O: Clone + Send + Sync + 'static,
    {
        EventSink {
            pool: self.clone(),
            id: handle.id.clone(),
        }
    }

    /// Cancel the live instance for `id`, if any
    ///
    /// Cooperative and fire-and-forget: the instance is asked to stop and may
    /// take further scheduling to reach completion. No-op for unknown or
    /// already-pruned ids.
    pub fn abandon<S: 'static, E: 'static, O: 'static>(&self, id: &WorkflowId<S, E, O>) {
        let key = id.instance_key();
        let workflows = self.inner.workflows.lock();
        if let Some(entry) = workflows.get(&key) {
            debug!(instance = %key, "abandoning workflow");
            (entry.cancel)();
        }
    }

    /// Cancel every tracked instance
    pub fn abandon_all(&self) {
        let workflows = self.inner.workflows.lock();
        debug!(count = workflows.len(), "abandoning all workflows");
        for entry in workflows.values() {
            (entry.cancel)();
        }
    }

    /// Number of tracked live instances (diagnostic only)
    pub fn count(&self) -> usize {
        self.inner.workflows.lock().len()
    }

    /// Resolve the live instance for a handle, launching it if absent
    fn resolve<S, E, O>(&self, handle: &Handle<S, E, O>) -> Result<WorkflowRef<S, E, O>>
    where
        S: Clone + PartialEq + Send + Sync + 'static,
        E: Send + 'static,
        O: Clone + Send + Sync + 'static,
    {
        if let Some(existing) = self.live(&handle.id) {
            return Ok(existing);
        }

        let launcher: SharedLauncher<S, E, O> =
            self.inner
                .launchers
                .lock()
                .get()
                .ok_or_else(|| PoolError::NoLauncher {
                    workflow_type: WorkflowType::<S, E, O>::shape_name(),
                })?;

        // No locks held while the launcher runs.
        let workflow = launcher.launch(handle.state.clone(), self.clone());

        let key = handle.id.instance_key();
        debug!(instance = %key, "launched workflow");
        self.inner
            .workflows
            .lock()
            .insert(key, LiveEntry::new(Arc::clone(&workflow)));
        Ok(workflow)
    }

    /// Look up the live instance for an id, if present
    fn live<S, E, O>(&self, id: &WorkflowId<S, E, O>) -> Option<WorkflowRef<S, E, O>>
    where
        S: Clone + PartialEq + Send + Sync + 'static,
        E: Send + 'static,
        O: Clone + Send + Sync + 'static,
    {
        let workflows = self.inner.workflows.lock();
        workflows
            .get(&id.instance_key())?
            .typed
            .downcast_ref::<WorkflowRef<S, E, O>>()
            .cloned()
    }

    /// Completion check: remove the instance iff it reports finished
    fn prune(&self, key: &InstanceKey) {
        let mut workflows = self.inner.workflows.lock();
        let finished = workflows
            .get(key)
            .map(|entry| (entry.finished)())
            .unwrap_or(false);
        if finished {
            workflows.remove(key);
            debug!(instance = %key, "pruned completed workflow");
        }
    }
}

/// Runs the completion check for one instance when dropped
///
/// Armed at the top of an awaiting pool operation, so the check also runs
/// when the caller drops the in-flight future, e.g. racing it against a
/// deadline. An instance that completes while such an await is parked on it
/// is pruned at the drop instead of lingering until the next await.
struct CompletionCheck<'a> {
    pool: &'a WorkflowPool,
    key: InstanceKey,
}

impl Drop for CompletionCheck<'_> {
    fn drop(&mut self) {
        self.pool.prune(&self.key);
    }
}

/// Best-effort event delivery capability for one instance id
///
/// Obtained from [`WorkflowPool::input`]. Sending resolves the live instance
/// at call time; if none exists (never launched, or completed and pruned) the
/// event is silently dropped - that is the intended policy, not an error.
pub struct EventSink<S, E, O> {
    pool: WorkflowPool,
    id: WorkflowId<S, E, O>,
}

impl<S, E, O> EventSink<S, E, O>
where
    S: Clone + PartialEq + Send + Sync + 'static,
    E: Send + 'static,
    O: Clone + Send + Sync + 'static,
{
    /// Deliver an event to the live instance, dropping it if there is none
    pub fn send_event(&self, event: E) {
        match self.pool.live(&self.id) {
            Some(workflow) => workflow.send_event(event),
            None => trace!(instance = %self.id.instance_key(), "event dropped: no live workflow"),
        }
    }
}

impl<S, E, O> Clone for EventSink<S, E, O> {
    fn clone(&self) -> Self {
        Self {
            pool: self.pool.clone(),
            id: self.id.clone(),
        }
    }
}
