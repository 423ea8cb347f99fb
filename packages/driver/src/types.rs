//! Documents, namespaces and the result shapes of write operations.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{Error, Result};

/// A document: an ordered map of field names to JSON values.
pub type Document = serde_json::Map<String, Value>;

/// Generated identifiers keyed by the position of the operation that
/// produced them.
pub type IdMap = BTreeMap<usize, Value>;

/// Convert a value into a document, rejecting anything that is not an object.
pub fn document_from_value(value: Value) -> Result<Document> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(Error::invalid_document(format!(
            "expected an object, got {}",
            kind_of(&other)
        ))),
    }
}

/// Like [`document_from_value`] but `null` becomes an empty document.
///
/// Filters are commonly omitted; an omitted filter matches everything.
pub fn filter_from_value(value: Value) -> Result<Document> {
    match value {
        Value::Null => Ok(Document::new()),
        other => document_from_value(other),
    }
}

/// Loose truthiness of an option value.
///
/// `false`, `null`, `0` and `""` are false, everything else is true.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

pub(crate) fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// A database name plus a collection name.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Namespace {
    pub db: String,
    pub collection: String,
}

impl Namespace {
    pub fn new(db: impl Into<String>, collection: impl Into<String>) -> Self {
        Self {
            db: db.into(),
            collection: collection.into(),
        }
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.db, self.collection)
    }
}

/// Result of inserting a single document.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertOneResult {
    pub acknowledged: bool,
    pub inserted_id: Value,
}

/// Result of inserting several documents.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertManyResult {
    pub acknowledged: bool,
    pub inserted_count: u64,
    pub inserted_ids: IdMap,
}

/// Result of an update or replace.
///
/// `upserted_id` is always present; it is `None` when nothing was upserted.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateResult {
    pub acknowledged: bool,
    pub matched_count: u64,
    pub modified_count: u64,
    pub upserted_count: u64,
    pub upserted_id: Option<Value>,
}

/// Result of a delete.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteResult {
    pub acknowledged: bool,
    pub deleted_count: u64,
}

/// Result of a bulk write.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkWriteResult {
    pub acknowledged: bool,
    pub inserted_count: u64,
    pub matched_count: u64,
    pub modified_count: u64,
    pub deleted_count: u64,
    pub upserted_count: u64,
    pub inserted_ids: IdMap,
    pub upserted_ids: IdMap,
}

/// One operation of a bulk write.
///
/// Deserializes from the `{ "insertOne": { "document": ... } }` shape.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WriteModel {
    InsertOne {
        document: Document,
    },
    UpdateOne {
        filter: Document,
        update: Document,
        #[serde(default)]
        upsert: bool,
    },
    UpdateMany {
        filter: Document,
        update: Document,
        #[serde(default)]
        upsert: bool,
    },
    ReplaceOne {
        filter: Document,
        replacement: Document,
        #[serde(default)]
        upsert: bool,
    },
    DeleteOne {
        filter: Document,
    },
    DeleteMany {
        filter: Document,
    },
}

impl WriteModel {
    /// Parse a write model from its JSON shape.
    pub fn from_value(value: Value) -> Result<Self> {
        serde_json::from_value(value).map_err(|e| Error::InvalidWriteModel {
            message: e.to_string(),
        })
    }
}
