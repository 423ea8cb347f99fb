//! Adapted collection.

use std::sync::Arc;

use docstore_driver::{
    document_from_value, filter_from_value, Collection, Document, Namespace, WriteModel,
};
use serde_json::Value;

use crate::args::{normalize, take_flag, Args, Callback, Signature};
use crate::cursor::LegacyCursor;
use crate::emulate::Emulate;
use crate::envelope::{enrich, Envelope};
use crate::invoke::{invoke, invoke_identity, Reply};
use crate::Result;

/// A collection with the legacy surface.
///
/// Write operations resolve to an [`Envelope`]; everything else resolves to
/// what the driver returns, with handles re-typed.
#[derive(Clone)]
pub struct LegacyCollection {
    inner: Arc<dyn Collection>,
}

fn documents_from_value(value: Value) -> docstore_driver::Result<Vec<Document>> {
    match value {
        Value::Array(items) => items.into_iter().map(document_from_value).collect(),
        other => Ok(vec![document_from_value(other)?]),
    }
}

impl LegacyCollection {
    pub(crate) fn from_inner(inner: Arc<dyn Collection>) -> Self {
        Self { inner }
    }

    /// The wrapped driver collection.
    pub fn inner(&self) -> &Arc<dyn Collection> {
        &self.inner
    }

    pub fn name(&self) -> &str {
        self.inner.name()
    }

    pub fn namespace(&self) -> Namespace {
        self.inner.namespace()
    }

    /// Insert one document, or every document of an array.
    pub fn insert(&self, docs: impl Into<Value>, args: impl Into<Args<Envelope>>) -> Reply<Envelope> {
        let docs = docs.into();
        if docs.is_array() {
            tracing::trace!(collection = %self.inner.namespace(), "insert dispatched to insert_many");
            self.insert_many(docs, args)
        } else {
            tracing::trace!(collection = %self.inner.namespace(), "insert dispatched to insert_one");
            self.insert_one(docs, args)
        }
    }

    pub fn insert_one(&self, doc: impl Into<Value>, args: impl Into<Args<Envelope>>) -> Reply<Envelope> {
        let Signature { options, callback } = normalize(args);
        let inner = self.inner.clone();
        let doc = doc.into();
        invoke(
            async move { inner.insert_one(document_from_value(doc)?, options).await },
            callback,
            enrich,
        )
    }

    pub fn insert_many(&self, docs: impl Into<Value>, args: impl Into<Args<Envelope>>) -> Reply<Envelope> {
        let Signature { options, callback } = normalize(args);
        let inner = self.inner.clone();
        let docs = docs.into();
        invoke(
            async move { inner.insert_many(documents_from_value(docs)?, options).await },
            callback,
            enrich,
        )
    }

    /// Delete matching documents. The `single` option limits it to one.
    pub fn remove(&self, filter: impl Into<Value>, args: impl Into<Args<Envelope>>) -> Reply<Envelope> {
        let Signature { mut options, callback } = normalize(args);
        let single = take_flag(&mut options, "single");
        tracing::trace!(collection = %self.inner.namespace(), single, "remove");
        self.delete(filter.into(), !single, options, callback)
    }

    pub fn remove_many(&self, filter: impl Into<Value>, args: impl Into<Args<Envelope>>) -> Reply<Envelope> {
        self.delete_many(filter, args)
    }

    pub fn delete_one(&self, filter: impl Into<Value>, args: impl Into<Args<Envelope>>) -> Reply<Envelope> {
        let Signature { options, callback } = normalize(args);
        self.delete(filter.into(), false, options, callback)
    }

    pub fn delete_many(&self, filter: impl Into<Value>, args: impl Into<Args<Envelope>>) -> Reply<Envelope> {
        let Signature { options, callback } = normalize(args);
        self.delete(filter.into(), true, options, callback)
    }

    fn delete(
        &self,
        filter: Value,
        multi: bool,
        options: Option<Document>,
        callback: Option<Callback<Envelope>>,
    ) -> Reply<Envelope> {
        let inner = self.inner.clone();
        invoke(
            async move {
                let filter = filter_from_value(filter)?;
                if multi {
                    inner.delete_many(filter, options).await
                } else {
                    inner.delete_one(filter, options).await
                }
            },
            callback,
            enrich,
        )
    }

    /// Update matching documents. The `multi` option updates all of them
    /// instead of the first.
    pub fn update(
        &self,
        filter: impl Into<Value>,
        update: impl Into<Value>,
        args: impl Into<Args<Envelope>>,
    ) -> Reply<Envelope> {
        let Signature { mut options, callback } = normalize(args);
        let multi = take_flag(&mut options, "multi");
        tracing::trace!(collection = %self.inner.namespace(), multi, "update");
        self.write(filter.into(), update.into(), Write::Update { multi }, options, callback)
    }

    pub fn update_one(
        &self,
        filter: impl Into<Value>,
        update: impl Into<Value>,
        args: impl Into<Args<Envelope>>,
    ) -> Reply<Envelope> {
        let Signature { options, callback } = normalize(args);
        self.write(filter.into(), update.into(), Write::Update { multi: false }, options, callback)
    }

    pub fn update_many(
        &self,
        filter: impl Into<Value>,
        update: impl Into<Value>,
        args: impl Into<Args<Envelope>>,
    ) -> Reply<Envelope> {
        let Signature { options, callback } = normalize(args);
        self.write(filter.into(), update.into(), Write::Update { multi: true }, options, callback)
    }

    pub fn replace_one(
        &self,
        filter: impl Into<Value>,
        replacement: impl Into<Value>,
        args: impl Into<Args<Envelope>>,
    ) -> Reply<Envelope> {
        let Signature { options, callback } = normalize(args);
        self.write(filter.into(), replacement.into(), Write::Replace, options, callback)
    }

    fn write(
        &self,
        filter: Value,
        update: Value,
        kind: Write,
        options: Option<Document>,
        callback: Option<Callback<Envelope>>,
    ) -> Reply<Envelope> {
        let inner = self.inner.clone();
        invoke(
            async move {
                let filter = filter_from_value(filter)?;
                let update = document_from_value(update)?;
                match kind {
                    Write::Update { multi: true } => inner.update_many(filter, update, options).await,
                    Write::Update { multi: false } => inner.update_one(filter, update, options).await,
                    Write::Replace => inner.replace_one(filter, update, options).await,
                }
            },
            callback,
            enrich,
        )
    }

    /// Run legacy-shaped operations such as `{ "insertOne": { "document": ... } }`.
    pub fn bulk_write(&self, operations: Vec<Value>, args: impl Into<Args<Envelope>>) -> Reply<Envelope> {
        let Signature { options, callback } = normalize(args);
        let inner = self.inner.clone();
        invoke(
            async move {
                let models = operations
                    .into_iter()
                    .map(WriteModel::from_value)
                    .collect::<docstore_driver::Result<Vec<_>>>()?;
                inner.bulk_write(models, options).await
            },
            callback,
            enrich,
        )
    }

    /// Create an index, resolving to its name.
    pub fn ensure_index(&self, keys: impl Into<Value>, args: impl Into<Args<String>>) -> Reply<String> {
        let Signature { options, callback } = normalize(args);
        let inner = self.inner.clone();
        let keys = keys.into();
        invoke_identity(
            async move { inner.create_index(document_from_value(keys)?, options).await },
            callback,
        )
    }

    /// Rename the collection, resolving to the adapted renamed handle.
    pub fn rename(&self, new_name: &str, args: impl Into<Args<LegacyCollection>>) -> Reply<LegacyCollection> {
        let Signature { options, callback } = normalize(args);
        let inner = self.inner.clone();
        let new_name = new_name.to_string();
        invoke(
            async move { inner.rename(&new_name, options).await },
            callback,
            |renamed: Arc<dyn Collection>| renamed.emulate(),
        )
    }

    pub fn count(&self, filter: impl Into<Value>, args: impl Into<Args<u64>>) -> Reply<u64> {
        let Signature { options, callback } = normalize(args);
        let inner = self.inner.clone();
        let filter = filter.into();
        invoke_identity(
            async move { inner.count_documents(filter_from_value(filter)?, options).await },
            callback,
        )
    }

    /// Start a query, optionally with a projection.
    ///
    /// A `null` filter matches everything. A filter that is not a document
    /// fails here, before any cursor exists.
    pub fn find(
        &self,
        filter: impl Into<Value>,
        projection: Option<Document>,
    ) -> Result<LegacyCursor> {
        let cursor = self
            .inner
            .find(filter_from_value(filter.into())?, None)
            .emulate();
        Ok(match projection {
            Some(projection) => cursor.project(projection),
            None => cursor,
        })
    }

    pub fn find_with_projection(
        &self,
        filter: impl Into<Value>,
        projection: Document,
    ) -> Result<LegacyCursor> {
        self.find(filter, Some(projection))
    }

    /// Find one document. An options bag in the trailing arguments is the
    /// projection.
    pub fn find_one(
        &self,
        filter: impl Into<Value>,
        args: impl Into<Args<Option<Document>>>,
    ) -> Reply<Option<Document>> {
        let Signature { options, callback } = normalize(args);
        let options = options.map(|projection| {
            let mut options = Document::new();
            options.insert("projection".to_string(), Value::Object(projection));
            options
        });
        let inner = self.inner.clone();
        let filter = filter.into();
        invoke_identity(
            async move { inner.find_one(filter_from_value(filter)?, options).await },
            callback,
        )
    }

    /// Start an aggregation.
    pub fn aggregate(&self, stages: Vec<Document>, options: Option<Document>) -> LegacyCursor {
        self.inner.aggregate(stages, options).emulate()
    }

    /// Run an aggregation and collect its output.
    pub fn aggregate_to_array(
        &self,
        stages: Vec<Value>,
        args: impl Into<Args<Vec<Document>>>,
    ) -> Reply<Vec<Document>> {
        let Signature { options, callback } = normalize(args);
        let inner = self.inner.clone();
        invoke_identity(
            async move {
                let stages = stages
                    .into_iter()
                    .map(document_from_value)
                    .collect::<docstore_driver::Result<Vec<_>>>()?;
                let mut cursor = inner.aggregate(stages, options);
                cursor.to_array().await
            },
            callback,
        )
    }
}

#[derive(Clone, Copy)]
enum Write {
    Update { multi: bool },
    Replace,
}

impl std::fmt::Debug for LegacyCollection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LegacyCollection")
            .field("namespace", &self.inner.namespace())
            .finish_non_exhaustive()
    }
}
