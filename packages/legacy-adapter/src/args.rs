//! Trailing argument normalization.
//!
//! Legacy operations accept their required arguments followed by an optional
//! options bag and an optional callback, in whatever shape the caller wrote
//! them. [`normalize`] turns that trailing list into a [`Signature`].

use docstore_driver::{is_truthy, Document};
use serde_json::Value;

use crate::error::Result;

/// A completion callback receiving the outcome of an operation.
pub type Callback<T> = Box<dyn FnOnce(Result<T>) + Send + 'static>;

/// Box a closure as a [`Callback`].
pub fn callback<T>(f: impl FnOnce(Result<T>) + Send + 'static) -> Callback<T> {
    Box::new(f)
}

/// One trailing argument slot.
pub enum Arg<T> {
    Absent,
    Value(Value),
    Callback(Callback<T>),
}

impl<T> Arg<T> {
    fn is_callback(&self) -> bool {
        matches!(self, Arg::Callback(_))
    }
}

impl<T> std::fmt::Debug for Arg<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Arg::Absent => f.write_str("Absent"),
            Arg::Value(v) => f.debug_tuple("Value").field(v).finish(),
            Arg::Callback(_) => f.write_str("Callback"),
        }
    }
}

/// The trailing arguments of a legacy call, in positional order.
#[derive(Debug)]
pub struct Args<T>(Vec<Arg<T>>);

impl<T> Args<T> {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn push(mut self, arg: Arg<T>) -> Self {
        self.0.push(arg);
        self
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<T> Default for Args<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> From<()> for Args<T> {
    fn from(_: ()) -> Self {
        Self::new()
    }
}

impl<T> From<Document> for Args<T> {
    fn from(options: Document) -> Self {
        Self(vec![Arg::Value(Value::Object(options))])
    }
}

impl<T> From<Value> for Args<T> {
    fn from(options: Value) -> Self {
        Self(vec![Arg::Value(options)])
    }
}

impl<T> From<Option<Document>> for Args<T> {
    fn from(options: Option<Document>) -> Self {
        match options {
            Some(options) => options.into(),
            None => Self(vec![Arg::Absent]),
        }
    }
}

impl<T> From<Callback<T>> for Args<T> {
    fn from(callback: Callback<T>) -> Self {
        Self(vec![Arg::Callback(callback)])
    }
}

impl<T> From<(Document, Callback<T>)> for Args<T> {
    fn from((options, callback): (Document, Callback<T>)) -> Self {
        Self(vec![
            Arg::Value(Value::Object(options)),
            Arg::Callback(callback),
        ])
    }
}

impl<T> From<(Value, Callback<T>)> for Args<T> {
    fn from((options, callback): (Value, Callback<T>)) -> Self {
        Self(vec![Arg::Value(options), Arg::Callback(callback)])
    }
}

impl<T> From<(Callback<T>, Document)> for Args<T> {
    fn from((callback, extra): (Callback<T>, Document)) -> Self {
        Self(vec![Arg::Callback(callback), Arg::Value(Value::Object(extra))])
    }
}

impl<T> From<(Callback<T>, Value)> for Args<T> {
    fn from((callback, extra): (Callback<T>, Value)) -> Self {
        Self(vec![Arg::Callback(callback), Arg::Value(extra)])
    }
}

impl<T> From<Vec<Arg<T>>> for Args<T> {
    fn from(slots: Vec<Arg<T>>) -> Self {
        Self(slots)
    }
}

/// The canonical form of a call's trailing arguments.
pub struct Signature<T> {
    pub options: Option<Document>,
    pub callback: Option<Callback<T>>,
}

/// Resolve trailing arguments into options and callback.
///
/// The right-most callback slot is the callback. The first slot is the
/// options bag when it holds an object; anything else there means no
/// options. Remaining slots are ignored.
pub fn normalize<T>(args: impl Into<Args<T>>) -> Signature<T> {
    let mut slots = args.into().0;

    let callback = match slots.iter().rposition(Arg::is_callback) {
        Some(position) => match std::mem::replace(&mut slots[position], Arg::Absent) {
            Arg::Callback(callback) => Some(callback),
            _ => None,
        },
        None => None,
    };

    let options = match slots.into_iter().next() {
        Some(Arg::Value(Value::Object(options))) => Some(options),
        _ => None,
    };

    Signature { options, callback }
}

/// Remove a legacy flag such as `single` or `multi` from the options bag,
/// reporting whether it was set.
pub fn take_flag(options: &mut Option<Document>, key: &str) -> bool {
    options
        .as_mut()
        .and_then(|o| o.remove(key))
        .map(|v| is_truthy(&v))
        .unwrap_or(false)
}
