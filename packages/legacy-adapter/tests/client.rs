mod common;

use common::{channel, doc, fixture, URI};
use docstore_driver::{Client, Database, Document};
use docstore_legacy::{
    connect, connect_db, is_emulated_collection, is_emulated_db, Emulate, Emulated, LegacyClient,
};
use docstore_memory::MemoryServer;
use serde_json::json;

#[tokio::test]
async fn deprecated_options_produce_no_warning() {
    let server = MemoryServer::new();
    let options = doc(json!({"useUnifiedTopology": true, "useNewUrlParser": true}));
    let client = connect(&server, URI, options).await.unwrap();

    assert!(server.warnings().is_empty());
    assert!(client.inner().options().is_empty());

    // The connection works.
    let trees = client.db(None, None).collection("trees", ());
    trees.insert(json!({"title": "birch"}), ()).await.unwrap();
    assert_eq!(trees.count(json!({}), ()).await.unwrap(), 1);
}

#[tokio::test]
async fn deprecated_options_reaching_the_driver_warn() {
    // Without the adapter, the driver reports them.
    let server = MemoryServer::new();
    let options = doc(json!({"useUnifiedTopology": true}));
    docstore_driver::Connector::client(&server, URI, options).unwrap();
    assert_eq!(server.warnings().len(), 1);
}

#[tokio::test]
async fn static_connect_with_callback() {
    let server = MemoryServer::new();
    let (cb, rx) = channel();
    let reply = connect(&server, URI, (json!({"appName": "trees"}), cb));
    assert!(reply.is_detached());
    let client = rx.await.unwrap().unwrap();
    assert_eq!(client.uri(), URI);
    assert_eq!(client.inner().options().get("appName"), Some(&json!("trees")));
}

#[tokio::test]
async fn connect_db_uses_the_uri_path() {
    let server = MemoryServer::new();
    let db = connect_db(&server, URI, ()).await.unwrap();
    assert_eq!(db.name(), "testdb");

    let (cb, rx) = channel();
    let _ = connect_db(&server, "docstore://localhost:27017/forest", cb);
    assert_eq!(rx.await.unwrap().unwrap().name(), "forest");
}

#[tokio::test]
async fn bad_uri_reaches_both_conventions() {
    let server = MemoryServer::new();
    let err = connect(&server, "::nope", ()).await.unwrap_err();
    assert!(matches!(
        err.driver(),
        Some(docstore_driver::Error::InvalidUri(_))
    ));

    let (cb, rx) = channel();
    let _ = connect_db(&server, "::nope", cb);
    assert!(rx.await.unwrap().is_err());

    assert!(LegacyClient::new(&server, "::nope", Document::new()).is_err());
}

#[tokio::test]
async fn instance_connect_and_close() {
    let f = fixture().await;
    let (cb, rx) = channel();
    let _ = f.client.connect(cb);
    let again = rx.await.unwrap().unwrap();
    assert_eq!(again.uri(), f.client.uri());

    let (cb, rx) = channel();
    let _ = f.client.close(cb);
    rx.await.unwrap().unwrap();

    let err = f.db.collection("trees", ()).count(json!({}), ()).await.unwrap_err();
    assert!(matches!(
        err.driver(),
        Some(docstore_driver::Error::ClientClosed)
    ));
}

#[tokio::test]
async fn handles_are_adapted_transitively() {
    let f = fixture().await;
    assert!(f.client.is_emulated());

    let db = f.client.db(Some("forest"), None);
    assert!(db.is_emulated());
    let trees = db.collection("trees", ());
    assert!(trees.is_emulated());
    let cursor = trees.find(Document::new(), None).unwrap();
    assert!(cursor.sort(doc(json!({"title": 1}))).limit(1).is_emulated());

    // Through the driver traits as well.
    let db = Client::db(&f.client, None, None);
    assert!(is_emulated_db(db.as_ref()));
    assert!(is_emulated_collection(db.collection("trees", None).as_ref()));
}

#[tokio::test]
async fn re_typing_is_idempotent() {
    let f = fixture().await;
    let trees = f.db.collection("trees", ());
    trees.insert(json!({"title": "birch"}), ()).await.unwrap();

    let as_driver: std::sync::Arc<dyn docstore_driver::Collection> = std::sync::Arc::new(trees.clone());
    let again = as_driver.emulate();
    assert!(!is_emulated_collection(again.inner().as_ref()));
    assert_eq!(again.count(json!({}), ()).await.unwrap(), 1);
    assert_eq!(again.clone().emulate().name(), trees.name());
}

#[tokio::test]
async fn collection_callback_is_synchronous() {
    let f = fixture().await;
    let (cb, mut rx) = channel();
    let trees = f.db.collection("trees", (json!({}), cb));
    let delivered = rx.try_recv().unwrap().unwrap();
    assert_eq!(delivered.name(), trees.name());
}

#[tokio::test]
async fn database_operations() {
    let f = fixture().await;
    let created = f.db.create_collection("leaves", ()).await.unwrap();
    assert!(created.is_emulated());
    f.db.create_collection("trees", ()).await.unwrap();

    let (cb, rx) = channel();
    let _ = f.db.collections(cb);
    let names: Vec<String> = rx
        .await
        .unwrap()
        .unwrap()
        .iter()
        .map(|c| c.name().to_string())
        .collect();
    assert_eq!(names, vec!["leaves".to_string(), "trees".to_string()]);

    let renamed = f
        .db
        .rename_collection("leaves", "branches", ())
        .await
        .unwrap();
    assert_eq!(renamed.name(), "branches");
    assert!(f
        .db
        .rename_collection("trees", "branches", ())
        .await
        .is_err());
    f.db
        .rename_collection("trees", "branches", json!({"dropTarget": true}))
        .await
        .unwrap();

    let name = f
        .db
        .ensure_index("branches", json!({"location": "2dsphere"}), ())
        .await
        .unwrap();
    assert_eq!(name, "location_2dsphere");

    assert!(f.db.drop_collection("branches", ()).await.unwrap());
    assert!(Database::list_collection_names(&f.db).await.unwrap().is_empty());

    let other = f.db.db("forest");
    assert_eq!(other.name(), "forest");

    f.db.close(()).await.unwrap();
    assert!(f.db.create_collection("late", ()).await.is_err());
}
