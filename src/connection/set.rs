//! The set of live connections, shared with every hook for cross-network
//! sends.

use std::sync::Arc;

use dashmap::DashMap;

use super::Connection;

/// Live connections keyed by id. Cloning shares the same set.
#[derive(Clone, Default)]
pub struct ConnectionSet {
    inner: Arc<DashMap<String, Connection>>,
}

impl ConnectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a connection. Returns false (and keeps the existing entry) if the
    /// id is taken.
    pub(crate) fn insert(&self, conn: Connection) -> bool {
        match self.inner.entry(conn.id().to_owned()) {
            dashmap::mapref::entry::Entry::Occupied(_) => false,
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(conn);
                true
            }
        }
    }

    pub(crate) fn remove(&self, id: &str) -> Option<Connection> {
        self.inner.remove(id).map(|(_, conn)| conn)
    }

    pub fn get(&self, id: &str) -> Option<Connection> {
        self.inner.get(id).map(|entry| entry.value().clone())
    }

    /// Every live connection, ordered by id.
    pub fn all(&self) -> Vec<Connection> {
        let mut conns: Vec<Connection> = self.inner.iter().map(|e| e.value().clone()).collect();
        conns.sort_by(|a, b| a.id().cmp(b.id()));
        conns
    }

    /// Connections whose authority (`nick@host:port`) matches a glob.
    pub fn find(&self, pattern: &str) -> Result<Vec<Connection>, glob::PatternError> {
        let pattern = glob::Pattern::new(pattern)?;
        Ok(self
            .all()
            .into_iter()
            .filter(|conn| pattern.matches(conn.authority()))
            .collect())
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl std::fmt::Debug for ConnectionSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.all().iter().map(|c| c.id().to_owned())).finish()
    }
}
