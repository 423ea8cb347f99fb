//! Write results in the legacy shape.
//!
//! Legacy callers read counts from a `result` sub-object with `n*` field
//! names. [`Envelope`] keeps the modern result at the top level and adds
//! that sub-object, derived from the modern fields.

use docstore_driver::{
    BulkWriteResult, DeleteResult, IdMap, InsertManyResult, InsertOneResult, UpdateResult,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The modern result of one write.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum WriteResult {
    InsertOne(InsertOneResult),
    InsertMany(InsertManyResult),
    /// Updates and replacements.
    Update(UpdateResult),
    Delete(DeleteResult),
    BulkWrite(BulkWriteResult),
}

impl WriteResult {
    pub fn acknowledged(&self) -> bool {
        match self {
            WriteResult::InsertOne(r) => r.acknowledged,
            WriteResult::InsertMany(r) => r.acknowledged,
            WriteResult::Update(r) => r.acknowledged,
            WriteResult::Delete(r) => r.acknowledged,
            WriteResult::BulkWrite(r) => r.acknowledged,
        }
    }
}

macro_rules! write_result_from {
    ($($variant:ident($ty:ty)),* $(,)?) => {
        $(
            impl From<$ty> for WriteResult {
                fn from(result: $ty) -> Self {
                    WriteResult::$variant(result)
                }
            }
        )*
    };
}

write_result_from!(
    InsertOne(InsertOneResult),
    InsertMany(InsertManyResult),
    Update(UpdateResult),
    Delete(DeleteResult),
    BulkWrite(BulkWriteResult),
);

/// Legacy aliases of the modern counts.
///
/// A field the operation does not produce is `None` and serializes as `null`.
/// The id fields carry the id maps as plain values.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LegacyResult {
    #[serde(rename = "nInserted")]
    pub n_inserted: Option<u64>,
    #[serde(rename = "nUpserted")]
    pub n_upserted: Option<u64>,
    #[serde(rename = "nMatched")]
    pub n_matched: Option<u64>,
    #[serde(rename = "nModified")]
    pub n_modified: Option<u64>,
    #[serde(rename = "nRemoved")]
    pub n_removed: Option<u64>,
    #[serde(rename = "getUpsertedIds")]
    pub get_upserted_ids: Option<Value>,
    #[serde(rename = "getInsertedIds")]
    pub get_inserted_ids: Option<Value>,
}

fn ids_value(ids: &IdMap) -> Value {
    Value::Object(
        ids.iter()
            .map(|(position, id)| (position.to_string(), id.clone()))
            .collect(),
    )
}

impl From<&WriteResult> for LegacyResult {
    fn from(response: &WriteResult) -> Self {
        match response {
            WriteResult::InsertOne(_) => LegacyResult::default(),
            WriteResult::InsertMany(r) => LegacyResult {
                n_inserted: Some(r.inserted_count),
                get_inserted_ids: Some(ids_value(&r.inserted_ids)),
                ..Default::default()
            },
            WriteResult::Update(r) => LegacyResult {
                n_upserted: Some(r.upserted_count),
                n_matched: Some(r.matched_count),
                n_modified: Some(r.modified_count),
                ..Default::default()
            },
            WriteResult::Delete(r) => LegacyResult {
                n_removed: Some(r.deleted_count),
                ..Default::default()
            },
            WriteResult::BulkWrite(r) => LegacyResult {
                n_inserted: Some(r.inserted_count),
                n_upserted: Some(r.upserted_count),
                n_matched: Some(r.matched_count),
                n_modified: Some(r.modified_count),
                n_removed: Some(r.deleted_count),
                get_upserted_ids: Some(ids_value(&r.upserted_ids)),
                get_inserted_ids: Some(ids_value(&r.inserted_ids)),
            },
        }
    }
}

/// A modern write result enriched with its legacy aliases.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Envelope {
    #[serde(flatten)]
    pub response: WriteResult,
    pub result: LegacyResult,
}

impl Envelope {
    pub fn new(response: impl Into<WriteResult>) -> Self {
        let response = response.into();
        let result = LegacyResult::from(&response);
        Self { response, result }
    }
}

impl From<WriteResult> for Envelope {
    fn from(response: WriteResult) -> Self {
        Self::new(response)
    }
}

/// Wrap a modern result, for use as a translation function.
pub(crate) fn enrich<R: Into<WriteResult>>(response: R) -> Envelope {
    Envelope::new(response)
}
