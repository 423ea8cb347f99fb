//! In-memory database handle.

use std::any::Any;
use std::sync::Arc;

use async_trait::async_trait;
use docstore_driver::{is_truthy, Client, Collection, Database, Document, Namespace, Result};

use crate::client::MemoryClient;
use crate::collection::MemoryCollection;

#[derive(Clone, Debug)]
pub struct MemoryDatabase {
    client: MemoryClient,
    name: String,
}

impl MemoryDatabase {
    pub(crate) fn new(client: MemoryClient, name: String) -> Self {
        Self { client, name }
    }

    fn namespace(&self, collection: &str) -> Namespace {
        Namespace::new(self.name.clone(), collection)
    }

    fn handle(&self, collection: &str) -> Arc<dyn Collection> {
        Arc::new(MemoryCollection::new(
            self.client.clone(),
            self.namespace(collection),
        ))
    }
}

#[async_trait]
impl Database for MemoryDatabase {
    fn name(&self) -> &str {
        &self.name
    }

    fn client(&self) -> Arc<dyn Client> {
        Arc::new(self.client.clone())
    }

    fn collection(&self, name: &str, _options: Option<Document>) -> Arc<dyn Collection> {
        self.handle(name)
    }

    async fn create_collection(
        &self,
        name: &str,
        _options: Option<Document>,
    ) -> Result<Arc<dyn Collection>> {
        self.client.ensure_open()?;
        let ns = self.namespace(name);
        self.client
            .server()
            .with_state(|state| state.create_collection(&ns))?;
        Ok(self.handle(name))
    }

    async fn collections(&self) -> Result<Vec<Arc<dyn Collection>>> {
        let names = self.list_collection_names().await?;
        Ok(names.iter().map(|name| self.handle(name)).collect())
    }

    async fn list_collection_names(&self) -> Result<Vec<String>> {
        self.client.ensure_open()?;
        self.client.server().with_state(|state| {
            Ok(state
                .databases
                .get(&self.name)
                .map(|db| db.collections.keys().cloned().collect())
                .unwrap_or_default())
        })
    }

    async fn drop_collection(&self, name: &str) -> Result<bool> {
        self.client.ensure_open()?;
        let ns = self.namespace(name);
        self.client
            .server()
            .with_state(|state| Ok(state.drop_collection(&ns)))
    }

    async fn rename_collection(
        &self,
        from: &str,
        to: &str,
        options: Option<Document>,
    ) -> Result<Arc<dyn Collection>> {
        self.handle(from).rename(to, options).await
    }

    async fn create_index(
        &self,
        collection: &str,
        keys: Document,
        options: Option<Document>,
    ) -> Result<String> {
        self.handle(collection).create_index(keys, options).await
    }

    async fn drop_database(&self) -> Result<bool> {
        self.client.ensure_open()?;
        self.client
            .server()
            .with_state(|state| Ok(state.databases.remove(&self.name).is_some()))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Whether the `dropTarget` option asks to overwrite an existing collection.
pub(crate) fn drop_target(options: Option<&Document>) -> bool {
    options
        .and_then(|o| o.get("dropTarget"))
        .map(is_truthy)
        .unwrap_or(false)
}
