//! # Flowpool
//!
//! An in-memory pool of independently running, stateful workflow instances.
//!
//! ## Features
//!
//! - **Lazy launch**: instances are created the first time any caller
//!   resolves their id, via a registered launcher
//! - **Incremental observation**: callers hold a [`Handle`] carrying the last
//!   state they saw; the pool only ever surfaces *differing* states
//! - **Event delivery**: best-effort, typed event sinks per instance id
//! - **Single-shot workers**: fire-once async computations adapted into the
//!   same lifecycle
//! - **Cooperative cancellation**: abandoned instances are asked to stop and
//!   report a cancelled terminal outcome
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       WorkflowPool                          │
//! │   (launcher registry, live-instance registry, pruning)      │
//! └─────────────────────────────────────────────────────────────┘
//!                │ launch                        │ observe
//!                ▼                               ▼
//! ┌──────────────────────────┐   ┌─────────────────────────────┐
//! │         Launcher         │   │          Workflow           │
//! │ (ReactorLauncher,        │──▶│ (state stream, result,      │
//! │  WorkerLauncher, custom) │   │  events, cancellation)      │
//! └──────────────────────────┘   └─────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```ignore
//! use flowpool::prelude::*;
//!
//! const COUNTER: WorkflowType<i32, Tick, i32> = WorkflowType::new();
//!
//! let pool = WorkflowPool::new();
//! pool.register(ReactorLauncher::new(Counter), COUNTER);
//!
//! let mut handle = Handle::new(COUNTER.make_id("a"), 0);
//! loop {
//!     match pool.await_update(handle).await? {
//!         Update::Running(next) => handle = next,
//!         Update::Finished(total) => break,
//!     }
//! }
//! ```
//!
//! The pool is a single logical coordination domain: it never blocks a host
//! thread and never holds a lock across an await, but it also applies no
//! per-id serialization of its own. Callers keep at most one outstanding
//! update-await per instance id.

pub mod error;
pub mod pool;
pub mod worker;
pub mod workflow;

/// Prelude for common imports
///
/// Deliberately excludes the crate's `Result` alias so glob imports never
/// shadow `std::result::Result` in user signatures.
pub mod prelude {
    pub use crate::error::PoolError;
    pub use crate::pool::{EventSink, WorkflowPool};
    pub use crate::worker::{Worker, WorkerLauncher};
    pub use crate::workflow::{
        Handle, HostContext, HostedWorkflow, Launcher, Reaction, Reactor, ReactorLauncher, Update,
        Workflow, WorkflowFailure, WorkflowId, WorkflowRef, WorkflowType,
    };
}

// Re-export key types at crate root
pub use error::{PoolError, Result};
pub use pool::{EventSink, WorkflowPool};
pub use worker::{Worker, WorkerLauncher};
pub use workflow::{
    Handle, HostContext, HostedWorkflow, Launcher, Reaction, Reactor, ReactorLauncher, Update,
    Workflow, WorkflowFailure, WorkflowId, WorkflowRef, WorkflowType,
};
