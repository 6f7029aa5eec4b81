//! Workflow contracts and the stock hosted implementation

pub mod definition;
pub mod handle;
pub mod host;
pub mod launcher;
pub mod reactor;

pub use definition::{Workflow, WorkflowFailure};
pub use handle::{Handle, Update, WorkflowId, WorkflowType};
pub use host::{HostContext, HostedWorkflow};
pub use launcher::{Launcher, WorkflowRef};
pub use reactor::{Reaction, Reactor, ReactorLauncher};
