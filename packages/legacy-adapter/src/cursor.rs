//! Adapted cursor.

use docstore_driver::{Client as _, Collection as _, Cursor, Database as _, Document, Namespace};

use crate::args::{normalize, Args};
use crate::emulate::Emulate;
use crate::invoke::{invoke_identity, Reply};
use crate::Result;

/// A cursor with the legacy surface.
///
/// The namespace is captured when the cursor is created, so `count` always
/// targets the collection the query was started on.
pub struct LegacyCursor {
    inner: Box<dyn Cursor>,
    namespace: Namespace,
}

impl LegacyCursor {
    pub(crate) fn from_inner(inner: Box<dyn Cursor>) -> Self {
        let namespace = inner.namespace().clone();
        Self { inner, namespace }
    }

    /// The wrapped driver cursor.
    pub fn inner(&self) -> &dyn Cursor {
        self.inner.as_ref()
    }

    pub(crate) fn inner_mut(&mut self) -> &mut dyn Cursor {
        self.inner.as_mut()
    }

    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    pub fn filter(&self) -> &Document {
        self.inner.filter()
    }

    /// Count the documents the query matches.
    ///
    /// Options merge in increasing precedence: options the cursor was created
    /// with, options built by fluent calls, then options given here. The first
    /// two layers match what the cursor itself iterates.
    pub fn count(&self, args: impl Into<Args<u64>>) -> Reply<u64> {
        let sig = normalize(args);
        let mut options = self.inner.cursor_options().clone();
        for (key, value) in self.inner.built_options() {
            options.insert(key, value);
        }
        for (key, value) in sig.options.unwrap_or_default() {
            options.insert(key, value);
        }

        let collection = self
            .inner
            .client()
            .db(Some(&self.namespace.db), None)
            .collection(&self.namespace.collection, None);
        let filter = self.inner.filter().clone();
        invoke_identity(
            async move { collection.count_documents(filter, Some(options)).await },
            sig.callback,
        )
    }

    /// The next document, or `None` once exhausted.
    pub async fn next_object(&mut self) -> Result<Option<Document>> {
        Ok(self.inner.next().await?)
    }

    /// Collect every remaining document.
    pub fn to_array(self, args: impl Into<Args<Vec<Document>>>) -> Reply<Vec<Document>> {
        let sig = normalize(args);
        let mut inner = self.inner;
        invoke_identity(async move { inner.to_array().await }, sig.callback)
    }

    pub fn project(self, projection: Document) -> LegacyCursor {
        self.inner.project(projection).emulate()
    }

    pub fn sort(self, sort: Document) -> LegacyCursor {
        self.inner.sort(sort).emulate()
    }

    pub fn limit(self, limit: u64) -> LegacyCursor {
        self.inner.limit(limit).emulate()
    }

    pub fn skip(self, skip: u64) -> LegacyCursor {
        self.inner.skip(skip).emulate()
    }
}

impl std::fmt::Debug for LegacyCursor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LegacyCursor")
            .field("namespace", &self.namespace)
            .finish_non_exhaustive()
    }
}
