//! Typed identity tokens and versioned state cursors
//!
//! A [`WorkflowType`] identifies a *kind* of workflow by its
//! (State, Event, Output) shapes. A [`WorkflowId`] adds an instance name, and
//! a [`Handle`] pairs an id with the last state its holder observed. Handles
//! are immutable cursors: the pool derives fresh handles, it never mutates
//! one in place.

use std::any::TypeId;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

/// Identity token for a kind of workflow
///
/// Zero-sized. Two tokens are equal exactly when their shape parameters
/// match; the token lowers to `TypeId::of::<(S, E, O)>()` for registry
/// keying, so no unchecked casts are needed anywhere downstream.
pub struct WorkflowType<S, E, O> {
    _shapes: PhantomData<fn(E) -> (S, O)>,
}

impl<S, E, O> WorkflowType<S, E, O> {
    /// Create the token for this (State, Event, Output) shape
    pub const fn new() -> Self {
        Self {
            _shapes: PhantomData,
        }
    }

    /// Build the id of a named instance of this type
    pub fn make_id(&self, name: impl Into<String>) -> WorkflowId<S, E, O> {
        WorkflowId {
            name: name.into(),
            _shapes: PhantomData,
        }
    }
}

impl<S: 'static, E: 'static, O: 'static> WorkflowType<S, E, O> {
    /// Opaque equality-comparable key for this type
    pub(crate) fn shape_key() -> TypeId {
        TypeId::of::<(S, E, O)>()
    }

    /// Human-readable name of the shape triple, for diagnostics
    pub(crate) fn shape_name() -> &'static str {
        std::any::type_name::<(S, E, O)>()
    }
}

impl<S, E, O> Clone for WorkflowType<S, E, O> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S, E, O> Copy for WorkflowType<S, E, O> {}

impl<S, E, O> Default for WorkflowType<S, E, O> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S, E, O> PartialEq for WorkflowType<S, E, O> {
    fn eq(&self, _other: &Self) -> bool {
        // Same shape parameters, therefore equal.
        true
    }
}

impl<S, E, O> Eq for WorkflowType<S, E, O> {}

impl<S: 'static, E: 'static, O: 'static> fmt::Debug for WorkflowType<S, E, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "WorkflowType<{}>", Self::shape_name())
    }
}

/// Unique identity of one logical running instance
///
/// A type token plus an instance name. Two ids are equal iff their shape
/// parameters and names match.
pub struct WorkflowId<S, E, O> {
    name: String,
    _shapes: PhantomData<fn(E) -> (S, O)>,
}

impl<S, E, O> WorkflowId<S, E, O> {
    /// The instance name within this type
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl<S: 'static, E: 'static, O: 'static> WorkflowId<S, E, O> {
    /// Lower to the untyped key used by the live-instance registry
    pub(crate) fn instance_key(&self) -> InstanceKey {
        InstanceKey {
            shapes: WorkflowType::<S, E, O>::shape_key(),
            type_name: WorkflowType::<S, E, O>::shape_name(),
            name: self.name.clone(),
        }
    }
}

impl<S, E, O> Clone for WorkflowId<S, E, O> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            _shapes: PhantomData,
        }
    }
}

impl<S, E, O> PartialEq for WorkflowId<S, E, O> {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl<S, E, O> Eq for WorkflowId<S, E, O> {}

impl<S, E, O> Hash for WorkflowId<S, E, O> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl<S: 'static, E: 'static, O: 'static> fmt::Debug for WorkflowId<S, E, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}::{}",
            WorkflowType::<S, E, O>::shape_name(),
            self.name
        )
    }
}

/// Untyped registry key: shape identity plus instance name
#[derive(Clone, PartialEq, Eq, Hash)]
pub(crate) struct InstanceKey {
    pub(crate) shapes: TypeId,
    pub(crate) type_name: &'static str,
    pub(crate) name: String,
}

impl fmt::Debug for InstanceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.type_name, self.name)
    }
}

impl fmt::Display for InstanceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Versioned cursor: an instance id plus the last state its holder observed
///
/// Immutable. "Updating" a handle always means constructing a new one, via
/// [`Handle::with_state`] or the pool's update operation.
pub struct Handle<S, E, O> {
    /// Identity of the instance this cursor points at
    pub id: WorkflowId<S, E, O>,

    /// Last state the holder observed (the launch state if never observed)
    pub state: S,
}

impl<S, E, O> Handle<S, E, O> {
    /// Create a handle from an id and a last-known state
    pub fn new(id: WorkflowId<S, E, O>, state: S) -> Self {
        Self { id, state }
    }

    /// Derive a handle for the same instance carrying a newer state
    pub fn with_state(&self, state: S) -> Self {
        Self {
            id: self.id.clone(),
            state,
        }
    }
}

impl<S: Clone, E, O> Clone for Handle<S, E, O> {
    fn clone(&self) -> Self {
        Self {
            id: self.id.clone(),
            state: self.state.clone(),
        }
    }
}

impl<S: PartialEq, E, O> PartialEq for Handle<S, E, O> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.state == other.state
    }
}

impl<S: fmt::Debug + 'static, E: 'static, O: 'static> fmt::Debug for Handle<S, E, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handle")
            .field("id", &self.id)
            .field("state", &self.state)
            .finish()
    }
}

/// Outcome of one update-await on a handle
pub enum Update<S, E, O> {
    /// The instance is still running; the new handle carries the fresh state
    Running(Handle<S, E, O>),

    /// The instance terminated with this output
    Finished(O),
}

impl<S: Clone, E, O: Clone> Clone for Update<S, E, O> {
    fn clone(&self) -> Self {
        match self {
            Update::Running(handle) => Update::Running(handle.clone()),
            Update::Finished(output) => Update::Finished(output.clone()),
        }
    }
}

impl<S: PartialEq, E, O: PartialEq> PartialEq for Update<S, E, O> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Update::Running(a), Update::Running(b)) => a == b,
            (Update::Finished(a), Update::Finished(b)) => a == b,
            _ => false,
        }
    }
}

impl<S, E, O> fmt::Debug for Update<S, E, O>
where
    S: fmt::Debug + 'static,
    E: 'static,
    O: fmt::Debug + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Update::Running(handle) => f.debug_tuple("Running").field(handle).finish(),
            Update::Finished(output) => f.debug_tuple("Finished").field(output).finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type Counter = WorkflowType<i32, (), i32>;
    type Other = WorkflowType<String, (), i32>;

    #[test]
    fn test_type_equality_by_shapes() {
        assert_eq!(Counter::new(), Counter::new());
        assert_eq!(Counter::shape_key(), Counter::shape_key());
        assert_ne!(Counter::shape_key(), Other::shape_key());
    }

    #[test]
    fn test_id_equality() {
        let t = Counter::new();
        assert_eq!(t.make_id("a"), t.make_id("a"));
        assert_ne!(t.make_id("a"), t.make_id("b"));
    }

    #[test]
    fn test_instance_key_separates_types() {
        let a = Counter::new().make_id("a").instance_key();
        let b = Other::new().make_id("a").instance_key();
        assert_ne!(a, b);
    }

    #[test]
    fn test_handle_with_state_derives_new_handle() {
        let handle = Handle::new(Counter::new().make_id("a"), 0);
        let next = handle.with_state(2);
        assert_eq!(handle.state, 0);
        assert_eq!(next.state, 2);
        assert_eq!(handle.id, next.id);
    }
}
