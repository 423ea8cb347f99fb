//! Legacy calling conventions over the future-only docstore driver.
//!
//! Code written against the older client API passes an optional options bag
//! and an optional completion callback after its required arguments, and
//! reads write counts from a `result` sub-object with `n*` names. This crate
//! wraps driver handles so that code keeps working:
//!
//! - every operation accepts an [`Args`] tail and either calls the callback
//!   or returns a [`Reply`] to await;
//! - write operations resolve to an [`Envelope`] carrying both the modern
//!   fields and their legacy aliases;
//! - handles obtained through an adapted handle are adapted too.
//!
//! # Usage
//!
//! ```rust,no_run
//! use docstore_legacy::{callback, connect_db, Envelope, Result};
//! use docstore_memory::MemoryServer;
//! use serde_json::json;
//!
//! # async fn run() -> Result<()> {
//! let server = MemoryServer::new();
//! let db = connect_db(&server, "docstore://localhost:27017/testdb", ()).await?;
//! let trees = db.collection("trees", ());
//!
//! // Awaited.
//! let reply = trees.insert(json!([{"title": "birch"}, {"title": "oak"}]), ()).await?;
//! assert_eq!(reply.result.n_inserted, Some(2));
//!
//! // With a callback.
//! let _ = trees.remove(
//!     json!({"title": "birch"}),
//!     (json!({"single": true}), callback(|r: Result<Envelope>| {
//!         assert_eq!(r.unwrap().result.n_removed, Some(1));
//!     })),
//! );
//! # Ok(())
//! # }
//! ```

mod args;
mod client;
mod collection;
mod cursor;
mod db;
mod emulate;
mod envelope;
mod error;
mod invoke;
mod mirror;
pub mod options;

pub use args::{callback, normalize, take_flag, Arg, Args, Callback, Signature};
pub use client::{connect, connect_db, LegacyClient};
pub use collection::LegacyCollection;
pub use cursor::LegacyCursor;
pub use db::LegacyDb;
pub use emulate::{
    is_emulated_client, is_emulated_collection, is_emulated_cursor, is_emulated_db, Emulate,
    Emulated,
};
pub use envelope::{Envelope, LegacyResult, WriteResult};
pub use error::{Error, Result};
pub use invoke::{invoke, invoke_identity, Reply};
