//! The shared in-process deployment.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use docstore_driver::{Client, Connector, Document, Error, Namespace, Result};

use crate::client::MemoryClient;
use crate::index::IndexSpec;

/// Client options the driver no longer understands.
pub const DEPRECATED_OPTIONS: &[&str] = &["useUnifiedTopology", "useNewUrlParser"];

#[derive(Debug, Default)]
pub(crate) struct CollectionState {
    pub documents: Vec<Document>,
    pub indexes: Vec<IndexSpec>,
}

impl CollectionState {
    fn new() -> Self {
        Self {
            documents: Vec::new(),
            indexes: vec![IndexSpec::id_index()],
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct DatabaseState {
    pub collections: BTreeMap<String, CollectionState>,
}

#[derive(Debug, Default)]
pub(crate) struct ServerState {
    pub databases: BTreeMap<String, DatabaseState>,
    pub warnings: Vec<String>,
}

impl ServerState {
    pub(crate) fn collection(&self, ns: &Namespace) -> Option<&CollectionState> {
        self.databases.get(&ns.db)?.collections.get(&ns.collection)
    }

    pub(crate) fn collection_mut(&mut self, ns: &Namespace) -> Option<&mut CollectionState> {
        self.databases
            .get_mut(&ns.db)?
            .collections
            .get_mut(&ns.collection)
    }

    /// Get a collection, creating it (and its database) on first write.
    pub(crate) fn collection_or_create(&mut self, ns: &Namespace) -> &mut CollectionState {
        self.databases
            .entry(ns.db.clone())
            .or_default()
            .collections
            .entry(ns.collection.clone())
            .or_insert_with(CollectionState::new)
    }

    pub(crate) fn create_collection(&mut self, ns: &Namespace) -> Result<()> {
        validate_name(&ns.collection)?;
        let db = self.databases.entry(ns.db.clone()).or_default();
        if db.collections.contains_key(&ns.collection) {
            return Err(Error::NamespaceExists {
                namespace: ns.clone(),
            });
        }
        db.collections
            .insert(ns.collection.clone(), CollectionState::new());
        Ok(())
    }

    pub(crate) fn drop_collection(&mut self, ns: &Namespace) -> bool {
        self.databases
            .get_mut(&ns.db)
            .and_then(|db| db.collections.remove(&ns.collection))
            .is_some()
    }

    pub(crate) fn rename(&mut self, from: &Namespace, to: &Namespace, drop_target: bool) -> Result<()> {
        validate_name(&to.collection)?;
        if self.collection(from).is_none() {
            return Err(Error::NamespaceNotFound {
                namespace: from.clone(),
            });
        }
        if self.collection(to).is_some() {
            if !drop_target {
                return Err(Error::NamespaceExists {
                    namespace: to.clone(),
                });
            }
            self.drop_collection(to);
        }
        let state = self
            .databases
            .get_mut(&from.db)
            .and_then(|db| db.collections.remove(&from.collection))
            .ok_or_else(|| Error::NamespaceNotFound {
                namespace: from.clone(),
            })?;
        self.databases
            .entry(to.db.clone())
            .or_default()
            .collections
            .insert(to.collection.clone(), state);
        Ok(())
    }
}

pub(crate) fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() || name.contains('$') || name.contains('\0') {
        return Err(Error::InvalidCollectionName {
            name: name.to_string(),
        });
    }
    Ok(())
}

/// An in-process deployment shared by every client created from it.
///
/// # Example
///
/// ```rust
/// use docstore_driver::{Client, Connector, Database, Document};
/// use docstore_memory::MemoryServer;
///
/// let server = MemoryServer::new();
/// let client = server
///     .client("docstore://localhost:27017/testdb", Document::new())
///     .unwrap();
/// let db = client.db(None, None);
/// assert_eq!(db.name(), "testdb");
/// ```
#[derive(Clone, Debug, Default)]
pub struct MemoryServer {
    state: Arc<Mutex<ServerState>>,
}

impl MemoryServer {
    /// Create an empty deployment.
    pub fn new() -> Self {
        Self::default()
    }

    /// Deprecation warnings emitted by clients of this deployment.
    pub fn warnings(&self) -> Vec<String> {
        self.with_state(|state| Ok(state.warnings.clone()))
            .unwrap_or_default()
    }

    /// Run `f` with exclusive access to the deployment state.
    pub(crate) fn with_state<R>(&self, f: impl FnOnce(&mut ServerState) -> Result<R>) -> Result<R> {
        let mut guard = self
            .state
            .lock()
            .map_err(|_| Error::internal("lock poisoned"))?;
        f(&mut guard)
    }

    pub(crate) fn warn(&self, message: String) {
        tracing::warn!("{}", message);
        // A poisoned lock only loses the recorded copy of the warning.
        let _ = self.with_state(|state| {
            state.warnings.push(message);
            Ok(())
        });
    }
}

impl Connector for MemoryServer {
    fn client(&self, uri: &str, options: Document) -> Result<Arc<dyn Client>> {
        Ok(Arc::new(MemoryClient::new(self.clone(), uri, options)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rename_moves_documents() {
        let mut state = ServerState::default();
        let from = Namespace::new("testdb", "leaves");
        let to = Namespace::new("testdb", "branches");
        state.collection_or_create(&from).documents.push(Document::new());

        state.rename(&from, &to, false).unwrap();
        assert!(state.collection(&from).is_none());
        assert_eq!(state.collection(&to).unwrap().documents.len(), 1);
    }

    #[test]
    fn rename_onto_existing_needs_drop_target() {
        let mut state = ServerState::default();
        let from = Namespace::new("testdb", "leaves");
        let to = Namespace::new("testdb", "branches");
        state.create_collection(&from).unwrap();
        state.create_collection(&to).unwrap();

        assert!(matches!(
            state.rename(&from, &to, false),
            Err(Error::NamespaceExists { .. })
        ));
        state.rename(&from, &to, true).unwrap();
    }

    #[test]
    fn rename_missing_source() {
        let mut state = ServerState::default();
        let err = state
            .rename(
                &Namespace::new("testdb", "nothing"),
                &Namespace::new("testdb", "else"),
                false,
            )
            .unwrap_err();
        assert!(matches!(err, Error::NamespaceNotFound { .. }));
    }

    #[test]
    fn create_twice_fails() {
        let mut state = ServerState::default();
        let ns = Namespace::new("testdb", "trees");
        state.create_collection(&ns).unwrap();
        assert!(state.create_collection(&ns).is_err());
        assert!(matches!(
            state.create_collection(&Namespace::new("testdb", "")),
            Err(Error::InvalidCollectionName { .. })
        ));
    }
}
