//! An in-process implementation of the docstore driver contract.
//!
//! Every client created from a [`MemoryServer`] shares the same databases,
//! so a test can write through one handle and read through another. Each
//! operation runs under a single lock and is atomic with respect to others.
//!
//! Supported filter operators: `$eq`, `$ne`, `$gt`, `$gte`, `$lt`, `$lte`,
//! `$in`, `$nin`, `$exists`, `$and`, `$or`, `$nor`. Update operators: `$set`,
//! `$unset`, `$inc`. Aggregation stages: `$match`, `$sort`, `$skip`,
//! `$limit`, `$project`, `$count`.

mod client;
mod collection;
mod cursor;
mod database;
mod index;
mod query;
mod server;
mod update;

pub use client::{MemoryClient, DEFAULT_DATABASE};
pub use collection::MemoryCollection;
pub use cursor::MemoryCursor;
pub use database::MemoryDatabase;
pub use server::{MemoryServer, DEPRECATED_OPTIONS};
