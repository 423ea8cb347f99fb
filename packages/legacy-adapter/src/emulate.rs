//! Re-typing driver handles as adapted handles.
//!
//! Adapting a handle that is already adapted (behind a driver trait object)
//! hands back the adapted handle instead of wrapping it again.

use std::sync::Arc;

use docstore_driver::{Client, Collection, Cursor, Database};

use crate::client::LegacyClient;
use crate::collection::LegacyCollection;
use crate::cursor::LegacyCursor;
use crate::db::LegacyDb;

/// Conversion of a handle into its adapted variant.
pub trait Emulate {
    type Emulated;

    fn emulate(self) -> Self::Emulated;
}

impl Emulate for Arc<dyn Client> {
    type Emulated = LegacyClient;

    fn emulate(self) -> LegacyClient {
        if let Some(client) = self.as_any().downcast_ref::<LegacyClient>() {
            return client.clone();
        }
        tracing::trace!(uri = self.uri(), "re-typing client");
        LegacyClient::from_inner(self)
    }
}

impl Emulate for Arc<dyn Database> {
    type Emulated = LegacyDb;

    fn emulate(self) -> LegacyDb {
        if let Some(db) = self.as_any().downcast_ref::<LegacyDb>() {
            return db.clone();
        }
        tracing::trace!(db = self.name(), "re-typing database");
        LegacyDb::from_inner(self)
    }
}

impl Emulate for Arc<dyn Collection> {
    type Emulated = LegacyCollection;

    fn emulate(self) -> LegacyCollection {
        if let Some(collection) = self.as_any().downcast_ref::<LegacyCollection>() {
            return collection.clone();
        }
        tracing::trace!(collection = %self.namespace(), "re-typing collection");
        LegacyCollection::from_inner(self)
    }
}

impl Emulate for Box<dyn Cursor> {
    type Emulated = LegacyCursor;

    fn emulate(self) -> LegacyCursor {
        if self.as_any().is::<LegacyCursor>() {
            match self.into_any().downcast::<LegacyCursor>() {
                Ok(cursor) => return *cursor,
                Err(_) => unreachable!("checked by `is` above"),
            }
        }
        tracing::trace!(namespace = %self.namespace(), "re-typing cursor");
        LegacyCursor::from_inner(self)
    }
}

macro_rules! emulate_identity {
    ($($ty:ty),*) => {
        $(
            impl Emulate for $ty {
                type Emulated = $ty;

                fn emulate(self) -> $ty {
                    self
                }
            }
        )*
    };
}

emulate_identity!(LegacyClient, LegacyDb, LegacyCollection, LegacyCursor);

/// Marker for adapted handles.
pub trait Emulated {
    fn is_emulated(&self) -> bool {
        true
    }
}

impl Emulated for LegacyClient {}
impl Emulated for LegacyDb {}
impl Emulated for LegacyCollection {}
impl Emulated for LegacyCursor {}

/// Whether a driver client is an adapted one.
pub fn is_emulated_client(client: &dyn Client) -> bool {
    client.as_any().is::<LegacyClient>()
}

pub fn is_emulated_db(db: &dyn Database) -> bool {
    db.as_any().is::<LegacyDb>()
}

pub fn is_emulated_collection(collection: &dyn Collection) -> bool {
    collection.as_any().is::<LegacyCollection>()
}

pub fn is_emulated_cursor(cursor: &dyn Cursor) -> bool {
    cursor.as_any().is::<LegacyCursor>()
}
