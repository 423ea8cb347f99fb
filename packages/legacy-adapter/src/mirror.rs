//! Driver trait implementations for the adapted handles.
//!
//! Each adapted handle forwards the driver capabilities to the handle it
//! wraps, so it can stand in wherever a driver handle is expected. Methods
//! that produce a handle of the same family produce the adapted one.
//! `as_any` answers for the adapted type.

use std::any::Any;
use std::sync::Arc;

use async_trait::async_trait;
use docstore_driver::{
    BulkWriteResult, Client, Collection, Cursor, Database, DeleteResult, Document,
    InsertManyResult, InsertOneResult, Namespace, Result, UpdateResult, WriteModel,
};
use serde_json::Value;

use crate::client::LegacyClient;
use crate::collection::LegacyCollection;
use crate::cursor::LegacyCursor;
use crate::db::LegacyDb;
use crate::emulate::Emulate;

#[async_trait]
impl Client for LegacyClient {
    async fn connect(&self) -> Result<()> {
        self.inner().connect().await
    }

    async fn close(&self) -> Result<()> {
        self.inner().close().await
    }

    fn uri(&self) -> &str {
        LegacyClient::uri(self)
    }

    fn db(&self, name: Option<&str>, options: Option<Document>) -> Arc<dyn Database> {
        Arc::new(LegacyClient::db(self, name, options))
    }

    fn options(&self) -> Document {
        self.inner().options()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[async_trait]
impl Database for LegacyDb {
    fn name(&self) -> &str {
        self.inner().name()
    }

    fn client(&self) -> Arc<dyn Client> {
        Arc::new(self.inner().client().emulate())
    }

    fn collection(&self, name: &str, options: Option<Document>) -> Arc<dyn Collection> {
        Arc::new(self.inner().collection(name, options).emulate())
    }

    async fn create_collection(
        &self,
        name: &str,
        options: Option<Document>,
    ) -> Result<Arc<dyn Collection>> {
        let created = self.inner().create_collection(name, options).await?;
        Ok(Arc::new(created.emulate()))
    }

    async fn collections(&self) -> Result<Vec<Arc<dyn Collection>>> {
        Ok(self
            .inner()
            .collections()
            .await?
            .into_iter()
            .map(|c| Arc::new(c.emulate()) as Arc<dyn Collection>)
            .collect())
    }

    async fn list_collection_names(&self) -> Result<Vec<String>> {
        self.inner().list_collection_names().await
    }

    async fn drop_collection(&self, name: &str) -> Result<bool> {
        self.inner().drop_collection(name).await
    }

    async fn rename_collection(
        &self,
        from: &str,
        to: &str,
        options: Option<Document>,
    ) -> Result<Arc<dyn Collection>> {
        let renamed = self.inner().rename_collection(from, to, options).await?;
        Ok(Arc::new(renamed.emulate()))
    }

    async fn create_index(
        &self,
        collection: &str,
        keys: Document,
        options: Option<Document>,
    ) -> Result<String> {
        self.inner().create_index(collection, keys, options).await
    }

    async fn drop_database(&self) -> Result<bool> {
        self.inner().drop_database().await
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[async_trait]
impl Collection for LegacyCollection {
    fn name(&self) -> &str {
        self.inner().name()
    }

    fn namespace(&self) -> Namespace {
        self.inner().namespace()
    }

    fn client(&self) -> Arc<dyn Client> {
        Arc::new(self.inner().client().emulate())
    }

    async fn insert_one(
        &self,
        document: Document,
        options: Option<Document>,
    ) -> Result<InsertOneResult> {
        self.inner().insert_one(document, options).await
    }

    async fn insert_many(
        &self,
        documents: Vec<Document>,
        options: Option<Document>,
    ) -> Result<InsertManyResult> {
        self.inner().insert_many(documents, options).await
    }

    async fn update_one(
        &self,
        filter: Document,
        update: Document,
        options: Option<Document>,
    ) -> Result<UpdateResult> {
        self.inner().update_one(filter, update, options).await
    }

    async fn update_many(
        &self,
        filter: Document,
        update: Document,
        options: Option<Document>,
    ) -> Result<UpdateResult> {
        self.inner().update_many(filter, update, options).await
    }

    async fn replace_one(
        &self,
        filter: Document,
        replacement: Document,
        options: Option<Document>,
    ) -> Result<UpdateResult> {
        self.inner().replace_one(filter, replacement, options).await
    }

    async fn delete_one(
        &self,
        filter: Document,
        options: Option<Document>,
    ) -> Result<DeleteResult> {
        self.inner().delete_one(filter, options).await
    }

    async fn delete_many(
        &self,
        filter: Document,
        options: Option<Document>,
    ) -> Result<DeleteResult> {
        self.inner().delete_many(filter, options).await
    }

    async fn bulk_write(
        &self,
        operations: Vec<WriteModel>,
        options: Option<Document>,
    ) -> Result<BulkWriteResult> {
        self.inner().bulk_write(operations, options).await
    }

    async fn create_index(&self, keys: Document, options: Option<Document>) -> Result<String> {
        self.inner().create_index(keys, options).await
    }

    async fn index_names(&self) -> Result<Vec<String>> {
        self.inner().index_names().await
    }

    async fn drop_index(&self, name: &str) -> Result<()> {
        self.inner().drop_index(name).await
    }

    async fn rename(
        &self,
        new_name: &str,
        options: Option<Document>,
    ) -> Result<Arc<dyn Collection>> {
        let renamed = self.inner().rename(new_name, options).await?;
        Ok(Arc::new(renamed.emulate()))
    }

    async fn count_documents(&self, filter: Document, options: Option<Document>) -> Result<u64> {
        self.inner().count_documents(filter, options).await
    }

    async fn find_one(
        &self,
        filter: Document,
        options: Option<Document>,
    ) -> Result<Option<Document>> {
        self.inner().find_one(filter, options).await
    }

    fn find(&self, filter: Document, options: Option<Document>) -> Box<dyn Cursor> {
        Box::new(self.inner().find(filter, options).emulate())
    }

    fn aggregate(&self, pipeline: Vec<Document>, options: Option<Document>) -> Box<dyn Cursor> {
        Box::new(self.inner().aggregate(pipeline, options).emulate())
    }

    async fn distinct(&self, field: &str, filter: Document) -> Result<Vec<Value>> {
        self.inner().distinct(field, filter).await
    }

    async fn drop_collection(&self) -> Result<bool> {
        self.inner().drop_collection().await
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[async_trait]
impl Cursor for LegacyCursor {
    fn namespace(&self) -> &Namespace {
        LegacyCursor::namespace(self)
    }

    fn client(&self) -> Arc<dyn Client> {
        Arc::new(self.inner().client().emulate())
    }

    fn filter(&self) -> &Document {
        self.inner().filter()
    }

    fn built_options(&self) -> Document {
        self.inner().built_options()
    }

    fn cursor_options(&self) -> &Document {
        self.inner().cursor_options()
    }

    fn project(self: Box<Self>, projection: Document) -> Box<dyn Cursor> {
        Box::new(LegacyCursor::project(*self, projection))
    }

    fn sort(self: Box<Self>, sort: Document) -> Box<dyn Cursor> {
        Box::new(LegacyCursor::sort(*self, sort))
    }

    fn limit(self: Box<Self>, limit: u64) -> Box<dyn Cursor> {
        Box::new(LegacyCursor::limit(*self, limit))
    }

    fn skip(self: Box<Self>, skip: u64) -> Box<dyn Cursor> {
        Box::new(LegacyCursor::skip(*self, skip))
    }

    async fn next(&mut self) -> Result<Option<Document>> {
        self.inner_mut().next().await
    }

    async fn to_array(&mut self) -> Result<Vec<Document>> {
        self.inner_mut().to_array().await
    }

    async fn close(&mut self) -> Result<()> {
        self.inner_mut().close().await
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any + Send> {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emulate::{
        is_emulated_client, is_emulated_collection, is_emulated_cursor, is_emulated_db,
    };
    use docstore_driver::Connector;
    use docstore_memory::MemoryServer;
    use serde_json::json;

    fn client() -> LegacyClient {
        LegacyClient::new(&MemoryServer::new(), "docstore://localhost/testdb", Document::new())
            .unwrap()
    }

    #[test]
    fn forwarded_handles_stay_adapted() {
        let client = client();
        let db = Client::db(&client, None, None);
        assert!(is_emulated_db(db.as_ref()));

        let collection = db.collection("trees", None);
        assert!(is_emulated_collection(collection.as_ref()));

        let cursor = collection.find(Document::new(), None).limit(2).skip(1);
        assert!(is_emulated_cursor(cursor.as_ref()));
    }

    #[test]
    fn owning_clients_stay_adapted() {
        let db = client().db(None, None);
        let owner = Database::client(&db);
        assert!(is_emulated_client(owner.as_ref()));
        assert_eq!(owner.uri(), "docstore://localhost/testdb");

        let trees = owner.db(None, None).collection("trees", None);
        assert!(is_emulated_collection(trees.as_ref()));
        assert!(is_emulated_client(trees.client().as_ref()));

        let cursor = trees.find(Document::new(), None);
        assert!(is_emulated_client(cursor.client().as_ref()));
    }

    #[test]
    fn owning_client_of_a_re_typed_handle_is_adapted() {
        let db = MemoryServer::new()
            .client("docstore://localhost/testdb", Document::new())
            .unwrap()
            .db(None, None)
            .emulate();
        let owner = Database::client(&db);
        assert!(is_emulated_client(owner.as_ref()));
        let again = owner.emulate();
        assert!(!is_emulated_client(again.inner().as_ref()));
    }

    #[tokio::test]
    async fn forwarded_writes_return_driver_results() {
        let db = client().db(None, None);
        let trees = db.collection("trees", ());
        let result = Collection::insert_one(
            &trees,
            docstore_driver::document_from_value(json!({"title": "birch"})).unwrap(),
            None,
        )
        .await
        .unwrap();
        assert!(result.acknowledged);
        assert_eq!(
            Collection::count_documents(&trees, Document::new(), None)
                .await
                .unwrap(),
            1
        );
    }

    #[tokio::test]
    async fn forwarded_rename_is_adapted() {
        let server = MemoryServer::new();
        let db = server
            .client("docstore://localhost/testdb", Document::new())
            .unwrap()
            .db(None, None)
            .emulate();
        Database::create_collection(&db, "leaves", None).await.unwrap();
        let renamed = Database::rename_collection(&db, "leaves", "branches", None)
            .await
            .unwrap();
        assert!(is_emulated_collection(renamed.as_ref()));
        assert_eq!(renamed.name(), "branches");
    }

    #[tokio::test]
    async fn cursors_iterate_through_the_mirror() {
        let trees = client().db(None, None).collection("trees", ());
        trees
            .insert_many(json!([{"n": 1}, {"n": 2}]), ())
            .await
            .unwrap();
        let mut cursor: Box<dyn Cursor> = Box::new(trees.find(Document::new(), None).unwrap());
        assert!(cursor.next().await.unwrap().is_some());
        assert_eq!(cursor.to_array().await.unwrap().len(), 1);
    }
}
