//! Adapted database.

use std::sync::Arc;

use docstore_driver::{document_from_value, Client as _, Collection, Database};
use serde_json::Value;

use crate::args::{normalize, Args, Signature};
use crate::collection::LegacyCollection;
use crate::emulate::Emulate;
use crate::invoke::{invoke, invoke_identity, Reply};

/// A database with the legacy surface.
#[derive(Clone)]
pub struct LegacyDb {
    inner: Arc<dyn Database>,
}

impl LegacyDb {
    pub(crate) fn from_inner(inner: Arc<dyn Database>) -> Self {
        Self { inner }
    }

    /// The wrapped driver database.
    pub fn inner(&self) -> &Arc<dyn Database> {
        &self.inner
    }

    pub fn name(&self) -> &str {
        self.inner.name()
    }

    /// Get a collection handle.
    ///
    /// A callback, if given, is called right away with the handle, which is
    /// also returned.
    pub fn collection(&self, name: &str, args: impl Into<Args<LegacyCollection>>) -> LegacyCollection {
        let Signature { options, callback } = normalize(args);
        let collection = self.inner.collection(name, options).emulate();
        if let Some(callback) = callback {
            callback(Ok(collection.clone()));
        }
        collection
    }

    pub fn create_collection(
        &self,
        name: &str,
        args: impl Into<Args<LegacyCollection>>,
    ) -> Reply<LegacyCollection> {
        let Signature { options, callback } = normalize(args);
        let inner = self.inner.clone();
        let name = name.to_string();
        invoke(
            async move { inner.create_collection(&name, options).await },
            callback,
            |created: Arc<dyn Collection>| created.emulate(),
        )
    }

    /// Every collection of the database.
    pub fn collections(&self, args: impl Into<Args<Vec<LegacyCollection>>>) -> Reply<Vec<LegacyCollection>> {
        let Signature { callback, .. } = normalize(args);
        let inner = self.inner.clone();
        invoke(
            async move { inner.collections().await },
            callback,
            |collections: Vec<Arc<dyn Collection>>| {
                collections.into_iter().map(Emulate::emulate).collect::<Vec<_>>()
            },
        )
    }

    pub fn rename_collection(
        &self,
        from: &str,
        to: &str,
        args: impl Into<Args<LegacyCollection>>,
    ) -> Reply<LegacyCollection> {
        let Signature { options, callback } = normalize(args);
        let inner = self.inner.clone();
        let (from, to) = (from.to_string(), to.to_string());
        invoke(
            async move { inner.rename_collection(&from, &to, options).await },
            callback,
            |renamed: Arc<dyn Collection>| renamed.emulate(),
        )
    }

    /// Create an index on `collection`, resolving to its name.
    pub fn ensure_index(
        &self,
        collection: &str,
        keys: impl Into<Value>,
        args: impl Into<Args<String>>,
    ) -> Reply<String> {
        let Signature { options, callback } = normalize(args);
        let inner = self.inner.clone();
        let collection = collection.to_string();
        let keys = keys.into();
        invoke_identity(
            async move {
                inner
                    .create_index(&collection, document_from_value(keys)?, options)
                    .await
            },
            callback,
        )
    }

    pub fn drop_collection(&self, name: &str, args: impl Into<Args<bool>>) -> Reply<bool> {
        let Signature { callback, .. } = normalize(args);
        let inner = self.inner.clone();
        let name = name.to_string();
        invoke_identity(async move { inner.drop_collection(&name).await }, callback)
    }

    /// Another database on the same connection.
    pub fn db(&self, name: &str) -> LegacyDb {
        self.inner.client().db(Some(name), None).emulate()
    }

    /// Close the client this database belongs to.
    pub fn close(&self, args: impl Into<Args<()>>) -> Reply<()> {
        let Signature { callback, .. } = normalize(args);
        let client = self.inner.client();
        invoke_identity(async move { client.close().await }, callback)
    }
}

impl std::fmt::Debug for LegacyDb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LegacyDb")
            .field("name", &self.inner.name())
            .finish_non_exhaustive()
    }
}
