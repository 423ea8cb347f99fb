//! Update operators and replacement semantics.

use docstore_driver::{Document, Error, Result};
use serde_json::Value;

/// Whether an update document is made of `$` operators.
pub(crate) fn is_operator_update(update: &Document) -> bool {
    update.keys().next().map(|k| k.starts_with('$')).unwrap_or(false)
}

/// Apply `$set`, `$unset` and `$inc` to a document in place.
pub(crate) fn apply_update(doc: &mut Document, update: &Document) -> Result<()> {
    if !is_operator_update(update) {
        return Err(Error::invalid_document(
            "update document requires atomic operators",
        ));
    }

    for (operator, fields) in update {
        let fields = match fields {
            Value::Object(map) => map,
            _ => {
                return Err(Error::invalid_document(format!(
                    "{} needs an object",
                    operator
                )))
            }
        };
        match operator.as_str() {
            "$set" => {
                for (path, value) in fields {
                    set_path(doc, path, value.clone())?;
                }
            }
            "$unset" => {
                for path in fields.keys() {
                    unset_path(doc, path);
                }
            }
            "$inc" => {
                for (path, delta) in fields {
                    let current = crate::query::lookup(doc, path).cloned();
                    let next = add(current.as_ref(), delta)?;
                    set_path(doc, path, next)?;
                }
            }
            other => {
                return Err(Error::UnknownOperator {
                    operator: other.to_string(),
                })
            }
        }
    }
    Ok(())
}

/// Replace every field except `_id`.
pub(crate) fn replace(doc: &mut Document, replacement: &Document) -> Result<()> {
    if is_operator_update(replacement) {
        return Err(Error::invalid_document(
            "replacement document must not contain atomic operators",
        ));
    }
    let id = doc.remove("_id");
    doc.clear();
    if let Some(id) = id {
        doc.insert("_id".to_string(), id);
    }
    for (key, value) in replacement {
        if key != "_id" {
            doc.insert(key.clone(), value.clone());
        }
    }
    Ok(())
}

/// The document an upsert starts from: the plain equality fields of the filter.
pub(crate) fn upsert_seed(filter: &Document) -> Document {
    filter
        .iter()
        .filter(|(key, value)| {
            !key.starts_with('$')
                && !key.contains('.')
                && match value {
                    Value::Object(map) => !map.keys().any(|k| k.starts_with('$')),
                    _ => true,
                }
        })
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}

fn set_path(doc: &mut Document, path: &str, value: Value) -> Result<()> {
    let mut parts: Vec<&str> = path.split('.').collect();
    let last = parts.pop().unwrap_or(path);
    let mut current = doc;
    for part in parts {
        let entry = current
            .entry(part.to_string())
            .or_insert_with(|| Value::Object(Document::new()));
        current = match entry {
            Value::Object(map) => map,
            _ => {
                return Err(Error::invalid_document(format!(
                    "cannot create field {:?} in a non-object",
                    path
                )))
            }
        };
    }
    current.insert(last.to_string(), value);
    Ok(())
}

fn unset_path(doc: &mut Document, path: &str) {
    let mut parts: Vec<&str> = path.split('.').collect();
    let last = parts.pop().unwrap_or(path);
    let mut current = doc;
    for part in parts {
        current = match current.get_mut(part) {
            Some(Value::Object(map)) => map,
            _ => return,
        };
    }
    current.remove(last);
}

fn add(current: Option<&Value>, delta: &Value) -> Result<Value> {
    let non_numeric = || Error::invalid_document("cannot apply $inc to a non-numeric value");
    let current = match current {
        None | Some(Value::Null) => return Ok(delta.clone()),
        Some(Value::Number(n)) => n,
        Some(_) => return Err(non_numeric()),
    };
    let delta = match delta {
        Value::Number(n) => n,
        _ => return Err(non_numeric()),
    };
    if let (Some(a), Some(b)) = (current.as_i64(), delta.as_i64()) {
        return Ok(Value::from(a + b));
    }
    let sum = current.as_f64().unwrap_or(0.0) + delta.as_f64().unwrap_or(0.0);
    Ok(Value::from(sum))
}
