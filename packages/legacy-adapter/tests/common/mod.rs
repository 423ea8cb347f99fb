#![allow(dead_code)]

use docstore_driver::{document_from_value, Document};
use docstore_legacy::{callback, Callback, LegacyClient, LegacyDb, Result};
use docstore_memory::MemoryServer;
use serde_json::Value;
use tokio::sync::oneshot;

pub const URI: &str = "docstore://localhost:27017/testdb";

pub struct Fixture {
    pub server: MemoryServer,
    pub client: LegacyClient,
    pub db: LegacyDb,
}

pub async fn fixture() -> Fixture {
    let server = MemoryServer::new();
    let client = LegacyClient::new(&server, URI, Document::new()).unwrap();
    client.connect(()).await.unwrap();
    let db = client.db(None, None);
    Fixture { server, client, db }
}

/// A callback paired with the receiver its result arrives on.
pub fn channel<T: Send + 'static>() -> (Callback<T>, oneshot::Receiver<Result<T>>) {
    let (tx, rx) = oneshot::channel();
    let cb = callback(move |result: Result<T>| {
        let _ = tx.send(result);
    });
    (cb, rx)
}

pub fn doc(value: Value) -> Document {
    document_from_value(value).unwrap()
}
