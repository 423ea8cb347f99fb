mod common;

use common::{channel, doc, fixture};
use docstore_legacy::{Envelope, Error, LegacyCollection, WriteResult};
use serde_json::{json, Value};

/// The serialized envelope with generated ids blanked out.
fn shape(envelope: &Envelope) -> Value {
    let mut value = serde_json::to_value(envelope).unwrap();
    for key in ["insertedId", "insertedIds"] {
        if let Some(ids) = value.get_mut(key) {
            *ids = json!("<ids>");
        }
    }
    if let Some(ids) = value["result"].get_mut("getInsertedIds") {
        if !ids.is_null() {
            *ids = json!("<ids>");
        }
    }
    value
}

async fn seed(trees: &LegacyCollection) {
    trees
        .insert(json!([{"title": "birch"}, {"title": "oak"}]), ())
        .await
        .unwrap();
}

#[tokio::test]
async fn insert_many_resolves_envelope() {
    let f = fixture().await;
    let trees = f.db.collection("trees", ());
    let envelope = trees
        .insert_many(json!([{"title": "birch"}, {"title": "oak"}]), ())
        .await
        .unwrap();

    match &envelope.response {
        WriteResult::InsertMany(r) => {
            assert!(r.acknowledged);
            assert_eq!(r.inserted_count, 2);
            assert_eq!(r.inserted_ids.len(), 2);
        }
        other => panic!("unexpected response: {:?}", other),
    }
    assert_eq!(envelope.result.n_inserted, Some(2));
    assert_eq!(envelope.result.n_matched, None);
    assert_eq!(envelope.result.n_modified, None);
    assert_eq!(envelope.result.n_removed, None);
    assert_eq!(envelope.result.n_upserted, None);

    let value = serde_json::to_value(&envelope).unwrap();
    assert_eq!(value["result"]["getInsertedIds"], value["insertedIds"]);
    assert_eq!(value["result"]["nMatched"], Value::Null);
}

#[tokio::test]
async fn insert_dispatches_on_shape() {
    let f = fixture().await;
    let trees = f.db.collection("trees", ());

    let single = trees.insert(json!({"title": "birch"}), ()).await.unwrap();
    assert!(matches!(single.response, WriteResult::InsertOne(_)));
    assert_eq!(
        shape(&single),
        json!({
            "acknowledged": true,
            "insertedId": "<ids>",
            "result": {
                "nInserted": null,
                "nUpserted": null,
                "nMatched": null,
                "nModified": null,
                "nRemoved": null,
                "getUpsertedIds": null,
                "getInsertedIds": null
            }
        })
    );

    let many = trees.insert(json!([{"title": "oak"}]), ()).await.unwrap();
    assert!(matches!(many.response, WriteResult::InsertMany(_)));
}

#[tokio::test]
async fn conventions_agree() {
    let f = fixture().await;
    let deferred = f.db.collection("deferred", ());
    let called = f.db.collection("called", ());

    let awaited = deferred
        .insert(json!([{"title": "birch"}, {"title": "oak"}]), json!({}))
        .await
        .unwrap();
    let (cb, rx) = channel();
    let reply = called.insert(json!([{"title": "birch"}, {"title": "oak"}]), (json!({}), cb));
    assert!(reply.is_detached());
    let delivered = rx.await.unwrap().unwrap();
    assert_eq!(shape(&awaited), shape(&delivered));

    let awaited = deferred
        .update(json!({}), json!({"$set": {"age": 1}}), json!({"multi": true}))
        .await
        .unwrap();
    let (cb, rx) = channel();
    let _ = called.update(json!({}), json!({"$set": {"age": 1}}), (json!({"multi": true}), cb));
    assert_eq!(awaited, rx.await.unwrap().unwrap());

    let awaited = deferred.count(json!({}), ()).await.unwrap();
    let (cb, rx) = channel();
    let _ = called.count(json!({}), cb);
    assert_eq!(awaited, rx.await.unwrap().unwrap());
}

#[tokio::test]
async fn remove_single_with_callback() {
    let f = fixture().await;
    let trees = f.db.collection("trees", ());
    seed(&trees).await;

    let (cb, rx) = channel();
    let _ = trees.remove(json!({}), (json!({"single": true}), cb));
    let envelope = rx.await.unwrap().unwrap();
    match &envelope.response {
        WriteResult::Delete(r) => assert_eq!(r.deleted_count, 1),
        other => panic!("unexpected response: {:?}", other),
    }
    assert_eq!(envelope.result.n_removed, Some(1));
    assert_eq!(trees.count(json!({}), ()).await.unwrap(), 1);
}

#[tokio::test]
async fn remove_without_single_deletes_all() {
    let f = fixture().await;
    let trees = f.db.collection("trees", ());
    seed(&trees).await;

    let envelope = trees.remove(json!({}), ()).await.unwrap();
    assert_eq!(envelope.result.n_removed, Some(2));
    seed(&trees).await;
    let envelope = trees.remove_many(json!({"title": "oak"}), ()).await.unwrap();
    assert_eq!(envelope.result.n_removed, Some(1));
    let envelope = trees.delete_one(json!({}), ()).await.unwrap();
    assert_eq!(envelope.result.n_removed, Some(1));
    let envelope = trees.delete_many(json!({}), ()).await.unwrap();
    assert_eq!(envelope.result.n_removed, Some(0));
}

#[tokio::test]
async fn update_multi() {
    let f = fixture().await;
    let trees = f.db.collection("trees", ());
    seed(&trees).await;

    let envelope = trees
        .update(json!({}), json!({"$set": {"age": 37}}), json!({"multi": true}))
        .await
        .unwrap();
    let value = serde_json::to_value(&envelope).unwrap();
    assert_eq!(value["matchedCount"], json!(2));
    assert_eq!(value["modifiedCount"], json!(2));
    assert_eq!(value["upsertedId"], Value::Null);
    assert_eq!(envelope.result.n_matched, Some(2));
    assert_eq!(envelope.result.n_modified, Some(2));
    assert_eq!(envelope.result.n_upserted, Some(0));
}

#[tokio::test]
async fn update_without_multi_touches_one() {
    let f = fixture().await;
    let trees = f.db.collection("trees", ());
    seed(&trees).await;

    let envelope = trees
        .update(json!({}), json!({"$set": {"age": 37}}), ())
        .await
        .unwrap();
    assert_eq!(envelope.result.n_matched, Some(1));

    let envelope = trees
        .update_many(json!({}), json!({"$set": {"age": 37}}), ())
        .await
        .unwrap();
    assert_eq!(envelope.result.n_matched, Some(2));
    assert_eq!(envelope.result.n_modified, Some(1));

    let envelope = trees
        .update_one(json!({"title": "elm"}), json!({"$set": {"age": 1}}), json!({"upsert": true}))
        .await
        .unwrap();
    assert_eq!(envelope.result.n_upserted, Some(1));
}

#[tokio::test]
async fn replace_one() {
    let f = fixture().await;
    let trees = f.db.collection("trees", ());
    seed(&trees).await;

    let envelope = trees
        .replace_one(json!({"title": "birch"}), json!({"title": "silver birch"}), ())
        .await
        .unwrap();
    assert_eq!(envelope.result.n_modified, Some(1));
    let found = trees
        .find_one(json!({"title": "silver birch"}), ())
        .await
        .unwrap();
    assert!(found.is_some());
}

#[tokio::test]
async fn ensure_index_both_conventions() {
    let f = fixture().await;
    let trees = f.db.collection("trees", ());

    let (cb, rx) = channel();
    let _ = trees.ensure_index(json!({"location": "2dsphere"}), (json!({}), cb));
    assert_eq!(rx.await.unwrap().unwrap(), "location_2dsphere");

    let name = trees
        .ensure_index(json!({"location": "2dsphere"}), ())
        .await
        .unwrap();
    assert_eq!(name, "location_2dsphere");
}

#[tokio::test]
async fn bulk_write_legacy_operations() {
    let f = fixture().await;
    let trees = f.db.collection("trees", ());

    let envelope = trees
        .bulk_write(
            vec![
                json!({"insertOne": {"document": {"title": "birch"}}}),
                json!({"insertOne": {"document": {"title": "oak"}}}),
                json!({"updateMany": {"filter": {}, "update": {"$set": {"age": 3}}}}),
                json!({"deleteOne": {"filter": {"title": "oak"}}}),
            ],
            (),
        )
        .await
        .unwrap();
    assert_eq!(envelope.result.n_inserted, Some(2));
    assert_eq!(envelope.result.n_matched, Some(2));
    assert_eq!(envelope.result.n_removed, Some(1));
    assert_eq!(envelope.result.get_upserted_ids, Some(json!({})));

    let err = trees
        .bulk_write(vec![json!({"explode": {}})], ())
        .await
        .unwrap_err();
    assert!(matches!(
        err.driver(),
        Some(docstore_driver::Error::InvalidWriteModel { .. })
    ));
}

#[tokio::test]
async fn rename_returns_adapted_handle() {
    let f = fixture().await;
    let leaves = f.db.collection("leaves", ());
    leaves.insert(json!({"title": "birch"}), ()).await.unwrap();

    let branches = leaves.rename("branches", ()).await.unwrap();
    assert_eq!(branches.name(), "branches");
    // The renamed handle has the legacy surface.
    let envelope = branches.insert(json!({"title": "oak"}), ()).await.unwrap();
    assert!(envelope.response.acknowledged());
    assert_eq!(branches.count(json!({}), ()).await.unwrap(), 2);

    let (cb, rx) = channel();
    let _ = branches.rename("twigs", cb);
    assert_eq!(rx.await.unwrap().unwrap().name(), "twigs");
}

#[tokio::test]
async fn driver_errors_pass_through() {
    let f = fixture().await;
    let trees = f.db.collection("trees", ());
    trees.insert(json!({"_id": "birch"}), ()).await.unwrap();

    let awaited = trees.insert(json!({"_id": "birch"}), ()).await.unwrap_err();
    let (cb, rx) = channel();
    let _ = trees.insert(json!({"_id": "birch"}), cb);
    let delivered = rx.await.unwrap().unwrap_err();

    assert!(matches!(
        awaited.driver(),
        Some(docstore_driver::Error::DuplicateKey { .. })
    ));
    assert_eq!(awaited.to_string(), delivered.to_string());

    let err = trees.insert_one(json!("not a document"), ()).await.unwrap_err();
    assert!(matches!(
        err.driver(),
        Some(docstore_driver::Error::InvalidDocument { .. })
    ));
}

#[tokio::test]
async fn closed_client_errors_reach_callback() {
    let f = fixture().await;
    let trees = f.db.collection("trees", ());
    f.client.close(()).await.unwrap();

    let (cb, rx) = channel();
    let _ = trees.insert(json!({"title": "birch"}), cb);
    let err = rx.await.unwrap().unwrap_err();
    assert!(matches!(err, Error::Driver(docstore_driver::Error::ClientClosed)));
}

#[tokio::test]
async fn awaiting_a_detached_reply() {
    let f = fixture().await;
    let trees = f.db.collection("trees", ());
    let (cb, rx) = channel();
    let reply = trees.insert(json!({"title": "birch"}), cb);
    assert!(matches!(reply.await, Err(Error::Detached)));
    assert!(rx.await.unwrap().is_ok());
}

#[tokio::test]
async fn find_one_projection() {
    let f = fixture().await;
    let trees = f.db.collection("trees", ());
    trees
        .insert(json!({"title": "birch", "age": 37}), ())
        .await
        .unwrap();

    let found = trees
        .find_one(json!({"title": "birch"}), json!({"title": 1, "_id": 0}))
        .await
        .unwrap();
    assert_eq!(found, Some(doc(json!({"title": "birch"}))));

    let (cb, rx) = channel();
    let _ = trees.find_one(json!({"title": "oak"}), cb);
    assert_eq!(rx.await.unwrap().unwrap(), None);
}

#[tokio::test]
async fn aggregate_to_array_with_callback() {
    let f = fixture().await;
    let trees = f.db.collection("trees", ());
    seed(&trees).await;

    let (cb, rx) = channel();
    let _ = trees.aggregate_to_array(
        vec![json!({"$match": {"title": "oak"}}), json!({"$project": {"_id": 0}})],
        cb,
    );
    assert_eq!(rx.await.unwrap().unwrap(), vec![doc(json!({"title": "oak"}))]);

    let counted = trees
        .aggregate_to_array(vec![json!({"$count": "trees"})], ())
        .await
        .unwrap();
    assert_eq!(counted, vec![doc(json!({"trees": 2}))]);
}

#[tokio::test]
async fn callback_calls_start_in_call_order_on_a_current_thread_runtime() {
    let f = fixture().await;
    let trees = f.db.collection("trees", ());

    let (first, first_rx) = channel();
    let (second, second_rx) = channel();
    let _ = trees.insert_one(json!({"_id": "birch"}), first);
    let _ = trees.insert_one(json!({"_id": "birch", "late": true}), second);

    assert!(first_rx.await.unwrap().is_ok());
    let err = second_rx.await.unwrap().unwrap_err();
    assert!(matches!(
        err,
        Error::Driver(docstore_driver::Error::DuplicateKey { .. })
    ));
}
