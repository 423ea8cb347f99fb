//! Error types for the driver contract.

use crate::Namespace;

/// Errors raised by a driver implementation.
///
/// These are the native errors of the client library. Layers built on top
/// of the driver hand them to their callers as they are.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The client was closed before or during the operation.
    #[error("client is closed")]
    ClientClosed,

    /// The connection string could not be parsed.
    #[error("invalid connection string: {0}")]
    InvalidUri(#[from] url::ParseError),

    /// A value that must be a document was something else.
    #[error("invalid document: {message}")]
    InvalidDocument { message: String },

    /// A document with the same `_id` already exists.
    #[error("duplicate key error collection: {namespace} dup key: {{ _id: {key} }}")]
    DuplicateKey { namespace: Namespace, key: String },

    /// The namespace does not exist.
    #[error("ns not found: {namespace}")]
    NamespaceNotFound { namespace: Namespace },

    /// The namespace already exists.
    #[error("namespace exists: {namespace}")]
    NamespaceExists { namespace: Namespace },

    /// Database or collection name is not acceptable.
    #[error("invalid collection name: {name:?}")]
    InvalidCollectionName { name: String },

    /// A query or update operator is not supported.
    #[error("unknown operator: {operator}")]
    UnknownOperator { operator: String },

    /// An index key specification is malformed.
    #[error("invalid index specification: {message}")]
    InvalidIndexSpec { message: String },

    /// A bulk write operation could not be parsed.
    #[error("invalid write model: {message}")]
    InvalidWriteModel { message: String },

    /// Anything else going wrong inside the driver.
    #[error("{message}")]
    Internal { message: String },
}

impl Error {
    /// Shorthand for [`Error::InvalidDocument`].
    pub fn invalid_document(message: impl Into<String>) -> Self {
        Error::InvalidDocument {
            message: message.into(),
        }
    }

    /// Shorthand for [`Error::Internal`].
    pub fn internal(message: impl Into<String>) -> Self {
        Error::Internal {
            message: message.into(),
        }
    }
}

/// Result type alias for driver operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_key_display() {
        let e = Error::DuplicateKey {
            namespace: Namespace::new("testdb", "trees"),
            key: "\"birch\"".to_string(),
        };
        let display = e.to_string();
        assert!(display.contains("testdb.trees"));
        assert!(display.contains("_id: \"birch\""));
    }

    #[test]
    fn uri_error_converts() {
        let parse_err = url::Url::parse("not a uri").unwrap_err();
        let e: Error = parse_err.into();
        assert!(matches!(e, Error::InvalidUri(_)));
        assert!(e.to_string().starts_with("invalid connection string"));
    }

    #[test]
    fn internal_display_is_bare_message() {
        assert_eq!(Error::internal("lock poisoned").to_string(), "lock poisoned");
    }
}
