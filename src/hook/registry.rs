//! The hook registry.
//!
//! Hooks live in one shared, insertion-ordered list. Dispatch never iterates
//! the live list: it takes a [`Snapshot`], which is just another reference to
//! the current `Arc<Vec<_>>`. Mutations go through [`Arc::make_mut`], so a
//! list that some dispatch pass still holds is copied, never changed in
//! place. Registering or removing hooks from inside a handler therefore only
//! affects the next message.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use super::Hook;

/// Identifier assigned at registration. Ids increase monotonically, so they
/// also record registration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HookId(u64);

impl HookId {
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for HookId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

type Entry = (HookId, Arc<Hook>);

#[derive(Default)]
struct Inner {
    next_id: u64,
    hooks: Arc<Vec<Entry>>,
}

/// Shared, thread-safe set of hooks. Cloning shares the same registry.
#[derive(Clone, Default)]
pub struct HookRegistry {
    inner: Arc<RwLock<Inner>>,
}

impl HookRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a hook at the end of the dispatch order.
    pub fn register(&self, hook: Hook) -> HookId {
        let mut inner = self.inner.write();
        inner.next_id += 1;
        let id = HookId(inner.next_id);
        debug!(hook = %hook.name(), id = %id, "Registered hook");
        Arc::make_mut(&mut inner.hooks).push((id, Arc::new(hook)));
        id
    }

    /// Remove a hook. Returns false if it was not registered.
    pub fn unregister(&self, id: HookId) -> bool {
        let mut inner = self.inner.write();
        let Some(pos) = inner.hooks.iter().position(|(hid, _)| *hid == id) else {
            return false;
        };
        let (_, hook) = Arc::make_mut(&mut inner.hooks).remove(pos);
        debug!(hook = %hook.name(), id = %id, "Unregistered hook");
        true
    }

    /// Remove every hook with this name, returning how many were removed.
    pub fn unregister_named(&self, name: &str) -> usize {
        let mut inner = self.inner.write();
        let before = inner.hooks.len();
        if inner.hooks.iter().any(|(_, hook)| hook.name() == name) {
            Arc::make_mut(&mut inner.hooks).retain(|(_, hook)| hook.name() != name);
        }
        let removed = before - inner.hooks.len();
        if removed > 0 {
            debug!(hook = %name, removed, "Unregistered hooks by name");
        }
        removed
    }

    /// Point-in-time copy of the hook list, in registration order.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot(Arc::clone(&self.inner.read().hooks))
    }

    pub fn len(&self) -> usize {
        self.inner.read().hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for HookRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookRegistry").field("len", &self.len()).finish()
    }
}

/// Immutable view of the registry taken before a dispatch pass.
#[derive(Clone)]
pub struct Snapshot(Arc<Vec<Entry>>);

impl Snapshot {
    pub fn iter(&self) -> impl Iterator<Item = (HookId, &Hook)> {
        self.0.iter().map(|(id, hook)| (*id, hook.as_ref()))
    }

    pub fn ids(&self) -> Vec<HookId> {
        self.0.iter().map(|(id, _)| *id).collect()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
