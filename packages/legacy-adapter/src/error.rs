//! Error types for the adapter layer.

/// Errors delivered by adapted operations.
///
/// The adapter does not introduce failure kinds of its own: everything that
/// goes wrong inside an operation is the driver's error, passed through
/// untouched.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An error from the underlying driver.
    #[error(transparent)]
    Driver(#[from] docstore_driver::Error),

    /// The reply was awaited although a callback received the result.
    #[error("result was delivered to the callback")]
    Detached,
}

impl Error {
    /// The driver error, if this is one.
    pub fn driver(&self) -> Option<&docstore_driver::Error> {
        match self {
            Error::Driver(e) => Some(e),
            Error::Detached => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn driver_errors_are_transparent() {
        let original = docstore_driver::Error::ClientClosed;
        let message = original.to_string();
        let err = Error::from(original);
        assert_eq!(err.to_string(), message);
        assert!(matches!(
            err.driver(),
            Some(docstore_driver::Error::ClientClosed)
        ));
        assert!(err.source().is_none());
    }

    #[test]
    fn detached_has_no_driver_error() {
        assert!(Error::Detached.driver().is_none());
    }
}
