//! Index key validation and naming.

use docstore_driver::{Document, Error, Result};
use serde_json::Value;

/// Index types accepted as string key values.
const INDEX_TYPES: &[&str] = &["2d", "2dsphere", "text", "hashed"];

/// The name of the implicit `_id` index.
pub(crate) const ID_INDEX: &str = "_id_";

/// An index defined on a collection.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct IndexSpec {
    pub name: String,
    pub keys: Document,
}

impl IndexSpec {
    pub(crate) fn id_index() -> Self {
        let mut keys = Document::new();
        keys.insert("_id".to_string(), Value::from(1));
        Self {
            name: ID_INDEX.to_string(),
            keys,
        }
    }
}

/// Validate key specifications.
pub(crate) fn validate_keys(keys: &Document) -> Result<()> {
    if keys.is_empty() {
        return Err(Error::InvalidIndexSpec {
            message: "index keys cannot be empty".to_string(),
        });
    }
    for (field, kind) in keys {
        let valid = match kind {
            Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
            Value::String(s) => INDEX_TYPES.contains(&s.as_str()),
            _ => false,
        };
        if !valid {
            return Err(Error::InvalidIndexSpec {
                message: format!("bad index key pattern for field {:?}: {}", field, kind),
            });
        }
    }
    Ok(())
}

/// Generate an index name: `{a: 1, b: -1}` becomes `a_1_b_-1`.
pub(crate) fn index_name(keys: &Document) -> String {
    keys.iter()
        .map(|(field, kind)| match kind {
            Value::String(s) => format!("{}_{}", field, s),
            other => format!("{}_{}", field, other),
        })
        .collect::<Vec<_>>()
        .join("_")
}
