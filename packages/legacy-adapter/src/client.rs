//! Adapted client and the connect entry points.

use std::sync::Arc;

use docstore_driver::{Client, Connector, Document};

use crate::args::{normalize, Args, Signature};
use crate::db::LegacyDb;
use crate::emulate::Emulate;
use crate::invoke::{invoke_identity, Reply};
use crate::options::{default_database, strip_deprecated};
use crate::Result;

/// A client with the legacy surface.
#[derive(Clone)]
pub struct LegacyClient {
    inner: Arc<dyn Client>,
    uri: String,
}

impl LegacyClient {
    /// Create a client. Deprecated options are dropped before the driver
    /// sees them.
    pub fn new(connector: &dyn Connector, uri: &str, options: Document) -> Result<Self> {
        Ok(Self::build(connector, uri, options)?)
    }

    fn build(connector: &dyn Connector, uri: &str, options: Document) -> docstore_driver::Result<Self> {
        let inner = connector.client(uri, strip_deprecated(options))?;
        Ok(Self::from_inner(inner))
    }

    pub(crate) fn from_inner(inner: Arc<dyn Client>) -> Self {
        let uri = inner.uri().to_string();
        Self { inner, uri }
    }

    /// The wrapped driver client.
    pub fn inner(&self) -> &Arc<dyn Client> {
        &self.inner
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Connect, resolving to this client.
    pub fn connect(&self, args: impl Into<Args<LegacyClient>>) -> Reply<LegacyClient> {
        let Signature { callback, .. } = normalize(args);
        let client = self.clone();
        invoke_identity(
            async move {
                client.inner.connect().await?;
                Ok(client)
            },
            callback,
        )
    }

    /// A database handle. `None` selects the connection string's database.
    pub fn db(&self, name: Option<&str>, options: Option<Document>) -> LegacyDb {
        self.inner.db(name, options).emulate()
    }

    pub fn close(&self, args: impl Into<Args<()>>) -> Reply<()> {
        let Signature { callback, .. } = normalize(args);
        let inner = self.inner.clone();
        invoke_identity(async move { inner.close().await }, callback)
    }
}

impl std::fmt::Debug for LegacyClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LegacyClient")
            .field("uri", &self.uri)
            .finish_non_exhaustive()
    }
}

/// Create a client and connect it, resolving to the connected client.
///
/// The options in the trailing arguments are client options.
pub fn connect(
    connector: &dyn Connector,
    uri: &str,
    args: impl Into<Args<LegacyClient>>,
) -> Reply<LegacyClient> {
    let Signature { options, callback } = normalize(args);
    let built = LegacyClient::build(connector, uri, options.unwrap_or_default());
    invoke_identity(
        async move {
            let client = built?;
            client.inner.connect().await?;
            Ok(client)
        },
        callback,
    )
}

/// Create a client, connect it and resolve to the database named by the
/// connection string.
pub fn connect_db(
    connector: &dyn Connector,
    uri: &str,
    args: impl Into<Args<LegacyDb>>,
) -> Reply<LegacyDb> {
    let Signature { options, callback } = normalize(args);
    let built = LegacyClient::build(connector, uri, options.unwrap_or_default());
    let name = default_database(uri);
    invoke_identity(
        async move {
            let client = built?;
            client.inner.connect().await?;
            Ok(client.db(name.as_deref(), None))
        },
        callback,
    )
}
