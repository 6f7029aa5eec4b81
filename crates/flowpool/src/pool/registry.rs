//! Launcher registry keyed by opaque workflow-type tokens
//!
//! Launchers are stored type-erased behind `Box<dyn Any>`, keyed by the
//! `TypeId` of their (State, Event, Output) shape triple. Because the key and
//! the stored type are derived from the same shapes, the downcast on lookup
//! is checked but can only miss for an unregistered type.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::workflow::{Launcher, WorkflowType};

/// Shared reference to a registered launcher
pub(crate) type SharedLauncher<S, E, O> = Arc<dyn Launcher<State = S, Event = E, Output = O>>;

struct RegisteredLauncher {
    /// `SharedLauncher<S, E, O>` behind `Any`
    launcher: Box<dyn Any + Send + Sync>,
    type_name: &'static str,
}

/// Registry mapping workflow types to launchers
///
/// At most one launcher per type; the newest registration wins.
pub(crate) struct LauncherRegistry {
    factories: HashMap<TypeId, RegisteredLauncher>,
}

impl LauncherRegistry {
    pub(crate) fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Register a launcher for its type, replacing any earlier registration
    pub(crate) fn register<L: Launcher>(&mut self, launcher: L) {
        let key = WorkflowType::<L::State, L::Event, L::Output>::shape_key();
        let type_name = WorkflowType::<L::State, L::Event, L::Output>::shape_name();
        let shared: SharedLauncher<L::State, L::Event, L::Output> = Arc::new(launcher);

        let replaced = self
            .factories
            .insert(
                key,
                RegisteredLauncher {
                    launcher: Box::new(shared),
                    type_name,
                },
            )
            .is_some();
        if replaced {
            debug!(workflow_type = type_name, "replaced registered launcher");
        }
    }

    /// Look up the launcher registered for a shape triple
    pub(crate) fn get<S, E, O>(&self) -> Option<SharedLauncher<S, E, O>>
    where
        S: Clone + PartialEq + Send + Sync + 'static,
        E: Send + 'static,
        O: Clone + Send + Sync + 'static,
    {
        self.factories
            .get(&WorkflowType::<S, E, O>::shape_key())
            .and_then(|entry| entry.launcher.downcast_ref::<SharedLauncher<S, E, O>>())
            .cloned()
    }
}

impl fmt::Debug for LauncherRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LauncherRegistry")
            .field(
                "workflow_types",
                &self
                    .factories
                    .values()
                    .map(|entry| entry.type_name)
                    .collect::<Vec<_>>(),
            )
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::WorkflowPool;
    use crate::workflow::{HostedWorkflow, WorkflowRef};

    /// Multiplies its launch state by a fixed factor and finishes.
    struct Scale(i32);

    impl Launcher for Scale {
        type State = i32;
        type Event = ();
        type Output = i32;

        fn launch(&self, initial: i32, _pool: WorkflowPool) -> WorkflowRef<i32, (), i32> {
            let factor = self.0;
            HostedWorkflow::spawn(initial, move |_ctx| async move { Ok(initial * factor) })
        }
    }

    #[test]
    fn test_register_and_get() {
        let mut registry = LauncherRegistry::new();
        registry.register(Scale(1));

        assert!(registry.get::<i32, (), i32>().is_some());
        assert!(registry.get::<String, (), i32>().is_none());
    }

    #[tokio::test]
    async fn test_newest_registration_wins() {
        let mut registry = LauncherRegistry::new();
        registry.register(Scale(1));
        registry.register(Scale(10));

        let launcher = registry.get::<i32, (), i32>().expect("registered");
        let workflow = launcher.launch(3, WorkflowPool::new());
        assert_eq!(workflow.result().await, Ok(30));
    }

    #[test]
    fn test_registry_debug_lists_types() {
        let mut registry = LauncherRegistry::new();
        registry.register(Scale(1));

        let debug = format!("{registry:?}");
        assert!(debug.contains("i32"));
    }
}
