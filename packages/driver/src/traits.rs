//! Handle traits: `Connector`, `Client`, `Database`, `Collection`, `Cursor`.
//!
//! Every operation that reaches the store is async and returns a `Result`.
//! Handles are shared (`Arc`) except cursors, which carry iteration state and
//! are owned (`Box`). Fluent cursor methods consume the box and return the
//! configured cursor.

use std::any::Any;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::{
    BulkWriteResult, DeleteResult, Document, InsertManyResult, InsertOneResult, Namespace,
    Result, UpdateResult, WriteModel,
};

/// Builds clients from a connection string.
///
/// This is the only way to obtain a [`Client`].
pub trait Connector: Send + Sync {
    /// Create a client for `uri` with the given client options.
    fn client(&self, uri: &str, options: Document) -> Result<Arc<dyn Client>>;
}

/// A connection to a deployment.
#[async_trait]
pub trait Client: Send + Sync {
    /// Establish the connection.
    async fn connect(&self) -> Result<()>;

    /// Close the connection. Later operations fail with `ClientClosed`.
    async fn close(&self) -> Result<()>;

    /// The connection string the client was created from.
    fn uri(&self) -> &str;

    /// Get a database handle. `None` selects the connection string's default.
    fn db(&self, name: Option<&str>, options: Option<Document>) -> Arc<dyn Database>;

    /// The client options the client was created with.
    fn options(&self) -> Document;

    fn as_any(&self) -> &dyn Any;
}

/// A database handle.
#[async_trait]
pub trait Database: Send + Sync {
    fn name(&self) -> &str;

    /// The client that owns this database.
    fn client(&self) -> Arc<dyn Client>;

    /// Get a collection handle. Does not create the collection.
    fn collection(&self, name: &str, options: Option<Document>) -> Arc<dyn Collection>;

    /// Create a collection, failing if it already exists.
    async fn create_collection(
        &self,
        name: &str,
        options: Option<Document>,
    ) -> Result<Arc<dyn Collection>>;

    /// Handles for every existing collection.
    async fn collections(&self) -> Result<Vec<Arc<dyn Collection>>>;

    async fn list_collection_names(&self) -> Result<Vec<String>>;

    /// Drop a collection. Returns whether it existed.
    async fn drop_collection(&self, name: &str) -> Result<bool>;

    async fn rename_collection(
        &self,
        from: &str,
        to: &str,
        options: Option<Document>,
    ) -> Result<Arc<dyn Collection>>;

    /// Create an index on a collection of this database. Returns its name.
    async fn create_index(
        &self,
        collection: &str,
        keys: Document,
        options: Option<Document>,
    ) -> Result<String>;

    async fn drop_database(&self) -> Result<bool>;

    fn as_any(&self) -> &dyn Any;
}

/// A collection handle.
#[async_trait]
pub trait Collection: Send + Sync {
    fn name(&self) -> &str;

    fn namespace(&self) -> Namespace;

    /// The client that owns this collection.
    fn client(&self) -> Arc<dyn Client>;

    async fn insert_one(
        &self,
        document: Document,
        options: Option<Document>,
    ) -> Result<InsertOneResult>;

    async fn insert_many(
        &self,
        documents: Vec<Document>,
        options: Option<Document>,
    ) -> Result<InsertManyResult>;

    async fn update_one(
        &self,
        filter: Document,
        update: Document,
        options: Option<Document>,
    ) -> Result<UpdateResult>;

    async fn update_many(
        &self,
        filter: Document,
        update: Document,
        options: Option<Document>,
    ) -> Result<UpdateResult>;

    async fn replace_one(
        &self,
        filter: Document,
        replacement: Document,
        options: Option<Document>,
    ) -> Result<UpdateResult>;

    async fn delete_one(&self, filter: Document, options: Option<Document>)
        -> Result<DeleteResult>;

    async fn delete_many(
        &self,
        filter: Document,
        options: Option<Document>,
    ) -> Result<DeleteResult>;

    async fn bulk_write(
        &self,
        operations: Vec<WriteModel>,
        options: Option<Document>,
    ) -> Result<BulkWriteResult>;

    /// Create an index. Returns its name.
    async fn create_index(&self, keys: Document, options: Option<Document>) -> Result<String>;

    async fn index_names(&self) -> Result<Vec<String>>;

    async fn drop_index(&self, name: &str) -> Result<()>;

    /// Rename this collection. Returns a handle to the renamed collection.
    async fn rename(&self, new_name: &str, options: Option<Document>)
        -> Result<Arc<dyn Collection>>;

    /// Count documents matching `filter`. Honors `limit` and `skip`.
    async fn count_documents(&self, filter: Document, options: Option<Document>) -> Result<u64>;

    async fn find_one(
        &self,
        filter: Document,
        options: Option<Document>,
    ) -> Result<Option<Document>>;

    /// Start a query. Nothing runs until the cursor is iterated.
    fn find(&self, filter: Document, options: Option<Document>) -> Box<dyn Cursor>;

    /// Start an aggregation pipeline.
    fn aggregate(&self, pipeline: Vec<Document>, options: Option<Document>) -> Box<dyn Cursor>;

    async fn distinct(&self, field: &str, filter: Document) -> Result<Vec<Value>>;

    /// Drop this collection. Returns whether it existed.
    async fn drop_collection(&self) -> Result<bool>;

    fn as_any(&self) -> &dyn Any;
}

/// A query cursor.
#[async_trait]
pub trait Cursor: Send {
    /// The namespace the cursor reads from, fixed at creation.
    fn namespace(&self) -> &Namespace;

    /// The client that owns this cursor.
    fn client(&self) -> Arc<dyn Client>;

    /// The query filter.
    fn filter(&self) -> &Document;

    /// Options built up by fluent calls (`limit`, `skip`, `sort`, `projection`).
    fn built_options(&self) -> Document;

    /// Options the cursor was created with.
    fn cursor_options(&self) -> &Document;

    fn project(self: Box<Self>, projection: Document) -> Box<dyn Cursor>;

    fn sort(self: Box<Self>, sort: Document) -> Box<dyn Cursor>;

    fn limit(self: Box<Self>, limit: u64) -> Box<dyn Cursor>;

    fn skip(self: Box<Self>, skip: u64) -> Box<dyn Cursor>;

    async fn next(&mut self) -> Result<Option<Document>>;

    /// Collect every remaining document.
    async fn to_array(&mut self) -> Result<Vec<Document>>;

    async fn close(&mut self) -> Result<()>;

    fn as_any(&self) -> &dyn Any;

    /// Recover the concrete cursor from the box.
    fn into_any(self: Box<Self>) -> Box<dyn Any + Send>;
}
