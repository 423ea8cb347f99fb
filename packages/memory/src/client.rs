//! In-memory client.

use std::any::Any;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use docstore_driver::{Client, Database, Document, Error, Result};
use url::Url;

use crate::database::MemoryDatabase;
use crate::server::{MemoryServer, DEPRECATED_OPTIONS};

/// Database used when neither the caller nor the connection string names one.
pub const DEFAULT_DATABASE: &str = "test";

/// A client of a [`MemoryServer`].
///
/// Clones share the open/closed state.
#[derive(Clone, Debug)]
pub struct MemoryClient {
    server: MemoryServer,
    uri: String,
    default_db: Option<String>,
    options: Document,
    closed: Arc<AtomicBool>,
}

impl MemoryClient {
    /// Create a client. Deprecated options are reported as warnings.
    pub fn new(server: MemoryServer, uri: &str, options: Document) -> Result<Self> {
        let parsed = Url::parse(uri)?;
        let default_db = parsed
            .path()
            .trim_start_matches('/')
            .split('/')
            .next()
            .filter(|name| !name.is_empty())
            .map(str::to_string);

        for key in DEPRECATED_OPTIONS {
            if options.contains_key(*key) {
                server.warn(format!(
                    "[DOCSTORE DRIVER] Warning: {} is a deprecated option and has no effect",
                    key
                ));
            }
        }

        Ok(Self {
            server,
            uri: uri.to_string(),
            default_db,
            options,
            closed: Arc::new(AtomicBool::new(false)),
        })
    }

    pub fn server(&self) -> &MemoryServer {
        &self.server
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    pub(crate) fn ensure_open(&self) -> Result<()> {
        if self.is_closed() {
            Err(Error::ClientClosed)
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl Client for MemoryClient {
    async fn connect(&self) -> Result<()> {
        self.closed.store(false, Ordering::SeqCst);
        tracing::debug!(uri = %self.uri, "connected");
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.closed.store(true, Ordering::SeqCst);
        tracing::debug!(uri = %self.uri, "closed");
        Ok(())
    }

    fn uri(&self) -> &str {
        &self.uri
    }

    fn db(&self, name: Option<&str>, _options: Option<Document>) -> Arc<dyn Database> {
        let name = name
            .map(str::to_string)
            .or_else(|| self.default_db.clone())
            .unwrap_or_else(|| DEFAULT_DATABASE.to_string());
        Arc::new(MemoryDatabase::new(self.clone(), name))
    }

    fn options(&self) -> Document {
        self.options.clone()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
