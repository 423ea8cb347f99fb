//! docstore driver contract
//!
//! The future-only client API that document store backends implement:
//! - `Connector`: builds clients from a connection string
//! - `Client`, `Database`, `Collection`: shared handles (`Arc<dyn ...>`)
//! - `Cursor`: an owned, stateful query cursor (`Box<dyn Cursor>`)
//!
//! Write operations return typed results (`InsertOneResult`, `UpdateResult`,
//! ...) with the modern field names. Failures are reported with [`Error`].
//!
//! # Example
//!
//! ```rust,ignore
//! use docstore_driver::{Connector, Document};
//! use serde_json::json;
//!
//! async fn plant(connector: &dyn Connector) -> docstore_driver::Result<()> {
//!     let client = connector.client("docstore://localhost:27017/garden", Document::new())?;
//!     let trees = client.db(None, None).collection("trees", None);
//!     let doc = docstore_driver::document_from_value(json!({"title": "birch"}))?;
//!     trees.insert_one(doc, None).await?;
//!     Ok(())
//! }
//! ```

mod error;
mod traits;
mod types;

pub use error::{Error, Result};
pub use traits::{Client, Collection, Connector, Cursor, Database};
pub use types::{
    document_from_value, filter_from_value, is_truthy, BulkWriteResult, DeleteResult, Document,
    IdMap, InsertManyResult, InsertOneResult, Namespace, UpdateResult, WriteModel,
};
