//! Filter matching, sorting and projection over JSON documents.

use std::cmp::Ordering;

use docstore_driver::{Document, Error, Result};
use serde_json::Value;

/// Look up a possibly dotted field path.
pub(crate) fn lookup<'a>(doc: &'a Document, path: &str) -> Option<&'a Value> {
    let mut parts = path.split('.');
    let mut current = doc.get(parts.next()?)?;
    for part in parts {
        current = match current {
            Value::Object(map) => map.get(part)?,
            Value::Array(items) => items.get(part.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}

/// Check whether `doc` matches `filter`.
pub(crate) fn matches(doc: &Document, filter: &Document) -> Result<bool> {
    for (key, condition) in filter {
        let ok = match key.as_str() {
            "$and" => clauses(condition, key)?
                .iter()
                .map(|c| matches(doc, c))
                .collect::<Result<Vec<_>>>()?
                .into_iter()
                .all(|b| b),
            "$or" => clauses(condition, key)?
                .iter()
                .map(|c| matches(doc, c))
                .collect::<Result<Vec<_>>>()?
                .into_iter()
                .any(|b| b),
            "$nor" => !clauses(condition, key)?
                .iter()
                .map(|c| matches(doc, c))
                .collect::<Result<Vec<_>>>()?
                .into_iter()
                .any(|b| b),
            op if op.starts_with('$') => {
                return Err(Error::UnknownOperator {
                    operator: op.to_string(),
                })
            }
            field => matches_condition(lookup(doc, field), condition)?,
        };
        if !ok {
            return Ok(false);
        }
    }
    Ok(true)
}

fn clauses<'a>(condition: &'a Value, operator: &str) -> Result<Vec<&'a Document>> {
    match condition {
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::Object(map) => Ok(map),
                _ => Err(Error::invalid_document(format!(
                    "{} entries must be objects",
                    operator
                ))),
            })
            .collect(),
        _ => Err(Error::invalid_document(format!(
            "{} must be an array",
            operator
        ))),
    }
}

fn is_operator_object(value: &Value) -> bool {
    match value {
        Value::Object(map) => !map.is_empty() && map.keys().all(|k| k.starts_with('$')),
        _ => false,
    }
}

fn matches_condition(value: Option<&Value>, condition: &Value) -> Result<bool> {
    let operators = match condition {
        Value::Object(map) if is_operator_object(condition) => map,
        _ => return Ok(equals(value, condition)),
    };

    for (operator, operand) in operators {
        let ok = match operator.as_str() {
            "$eq" => equals(value, operand),
            "$ne" => !equals(value, operand),
            "$gt" => compare(value, operand) == Some(Ordering::Greater),
            "$gte" => matches!(
                compare(value, operand),
                Some(Ordering::Greater | Ordering::Equal)
            ),
            "$lt" => compare(value, operand) == Some(Ordering::Less),
            "$lte" => matches!(
                compare(value, operand),
                Some(Ordering::Less | Ordering::Equal)
            ),
            "$in" => in_list(value, operand, operator)?,
            "$nin" => !in_list(value, operand, operator)?,
            "$exists" => value.is_some() == docstore_driver::is_truthy(operand),
            other => {
                return Err(Error::UnknownOperator {
                    operator: other.to_string(),
                })
            }
        };
        if !ok {
            return Ok(false);
        }
    }
    Ok(true)
}

fn in_list(value: Option<&Value>, operand: &Value, operator: &str) -> Result<bool> {
    match operand {
        Value::Array(candidates) => Ok(candidates.iter().any(|c| equals(value, c))),
        _ => Err(Error::invalid_document(format!(
            "{} needs an array",
            operator
        ))),
    }
}

/// Equality with array containment: `{tags: "a"}` matches `tags: ["a", "b"]`.
fn equals(value: Option<&Value>, expected: &Value) -> bool {
    match value {
        None => expected.is_null(),
        Some(Value::Array(items)) if !expected.is_array() => {
            items.iter().any(|item| values_equal(item, expected))
        }
        Some(actual) => values_equal(actual, expected),
    }
}

fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        _ => a == b,
    }
}

fn compare(value: Option<&Value>, operand: &Value) -> Option<Ordering> {
    compare_values(value?, operand)
}

pub(crate) fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        (Value::Null, Value::Null) => Some(Ordering::Equal),
        _ => None,
    }
}

/// Sort documents by a `{field: 1 | -1, ...}` specification.
///
/// Missing fields sort first in ascending order.
pub(crate) fn sort_documents(docs: &mut [Document], sort: &Document) {
    docs.sort_by(|a, b| {
        for (field, direction) in sort {
            let descending = direction.as_f64().map(|d| d < 0.0).unwrap_or(false);
            let ordering = match (lookup(a, field), lookup(b, field)) {
                (None, None) => Ordering::Equal,
                (None, Some(_)) => Ordering::Less,
                (Some(_), None) => Ordering::Greater,
                (Some(x), Some(y)) => compare_values(x, y).unwrap_or(Ordering::Equal),
            };
            let ordering = if descending {
                ordering.reverse()
            } else {
                ordering
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    });
}

/// Apply an inclusion or exclusion projection.
///
/// `_id` is kept unless explicitly excluded.
pub(crate) fn project(doc: Document, projection: &Document) -> Document {
    if projection.is_empty() {
        return doc;
    }

    let include_id = projection
        .get("_id")
        .map(docstore_driver::is_truthy)
        .unwrap_or(true);
    let inclusive = projection
        .iter()
        .filter(|(k, _)| k.as_str() != "_id")
        .any(|(_, v)| docstore_driver::is_truthy(v));

    if inclusive {
        doc.into_iter()
            .filter(|(k, _)| {
                if k == "_id" {
                    include_id
                } else {
                    projection.get(k).map(docstore_driver::is_truthy).unwrap_or(false)
                }
            })
            .collect()
    } else {
        doc.into_iter()
            .filter(|(k, _)| {
                if k == "_id" {
                    include_id
                } else {
                    projection.get(k).map(docstore_driver::is_truthy).unwrap_or(true)
                }
            })
            .collect()
    }
}
