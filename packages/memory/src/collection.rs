//! In-memory collection handle.

use std::any::Any;
use std::sync::Arc;

use async_trait::async_trait;
use docstore_driver::{
    is_truthy, BulkWriteResult, Client, Collection, Cursor, DeleteResult, Document, Error,
    InsertManyResult, InsertOneResult, Namespace, Result, UpdateResult, WriteModel,
};
use serde_json::Value;

use crate::client::MemoryClient;
use crate::cursor::{MemoryCursor, Source};
use crate::database::drop_target;
use crate::index::{self, IndexSpec, ID_INDEX};
use crate::query;
use crate::server::CollectionState;
use crate::update;

#[derive(Clone, Debug)]
pub struct MemoryCollection {
    client: MemoryClient,
    namespace: Namespace,
}

/// Unacknowledged writes are requested with `writeConcern: { w: 0 }`.
fn acknowledged(options: Option<&Document>) -> bool {
    let w = options
        .and_then(|o| o.get("writeConcern"))
        .and_then(|wc| wc.get("w"));
    !matches!(w.and_then(Value::as_i64), Some(0))
}

fn option_u64(options: Option<&Document>, key: &str) -> Option<u64> {
    options.and_then(|o| o.get(key)).and_then(Value::as_u64)
}

fn option_doc<'a>(options: Option<&'a Document>, key: &str) -> Option<&'a Document> {
    options.and_then(|o| o.get(key)).and_then(Value::as_object)
}

fn upsert_requested(options: Option<&Document>) -> bool {
    options
        .and_then(|o| o.get("upsert"))
        .map(is_truthy)
        .unwrap_or(false)
}

fn generate_id() -> Value {
    Value::String(uuid::Uuid::new_v4().simple().to_string())
}

/// Counts produced by one update or replace against collection state.
#[derive(Default)]
struct UpdateCounts {
    matched: u64,
    modified: u64,
    upserted_id: Option<Value>,
}

#[derive(Clone, Copy)]
enum Write<'a> {
    Update(&'a Document),
    Replace(&'a Document),
}

impl Write<'_> {
    fn apply(&self, doc: &mut Document) -> Result<()> {
        match self {
            Write::Update(update) => update::apply_update(doc, update),
            Write::Replace(replacement) => update::replace(doc, replacement),
        }
    }

    fn validate(&self) -> Result<()> {
        match self {
            Write::Update(update) if !update::is_operator_update(update) => Err(
                Error::invalid_document("update document requires atomic operators"),
            ),
            Write::Replace(replacement) if update::is_operator_update(replacement) => {
                Err(Error::invalid_document(
                    "replacement document must not contain atomic operators",
                ))
            }
            _ => Ok(()),
        }
    }
}

fn insert_document(
    state: &mut CollectionState,
    namespace: &Namespace,
    mut document: Document,
) -> Result<Value> {
    let id = match document.get("_id") {
        Some(id) => id.clone(),
        None => {
            let id = generate_id();
            document.insert("_id".to_string(), id.clone());
            id
        }
    };
    if state.documents.iter().any(|d| d.get("_id") == Some(&id)) {
        return Err(Error::DuplicateKey {
            namespace: namespace.clone(),
            key: id.to_string(),
        });
    }
    state.documents.push(document);
    Ok(id)
}

fn write_matching(
    state: &mut CollectionState,
    namespace: &Namespace,
    filter: &Document,
    write: Write<'_>,
    multi: bool,
    upsert: bool,
) -> Result<UpdateCounts> {
    write.validate()?;
    let mut counts = UpdateCounts::default();
    for doc in state.documents.iter_mut() {
        if !query::matches(doc, filter)? {
            continue;
        }
        counts.matched += 1;
        let mut updated = doc.clone();
        write.apply(&mut updated)?;
        if updated != *doc {
            *doc = updated;
            counts.modified += 1;
        }
        if !multi {
            break;
        }
    }

    if counts.matched == 0 && upsert {
        let mut seed = update::upsert_seed(filter);
        write.apply(&mut seed)?;
        counts.upserted_id = Some(insert_document(state, namespace, seed)?);
    }
    Ok(counts)
}

fn delete_matching(state: &mut CollectionState, filter: &Document, multi: bool) -> Result<u64> {
    let mut deleted = 0;
    let mut index = 0;
    while index < state.documents.len() {
        if query::matches(&state.documents[index], filter)? {
            state.documents.remove(index);
            deleted += 1;
            if !multi {
                break;
            }
        } else {
            index += 1;
        }
    }
    Ok(deleted)
}

impl MemoryCollection {
    pub(crate) fn new(client: MemoryClient, namespace: Namespace) -> Self {
        Self { client, namespace }
    }

    async fn write(
        &self,
        filter: Document,
        write: Write<'_>,
        multi: bool,
        options: Option<&Document>,
    ) -> Result<UpdateResult> {
        self.client.ensure_open()?;
        let upsert = upsert_requested(options);
        let counts = self.client.server().with_state(|state| {
            let coll = state.collection_or_create(&self.namespace);
            write_matching(coll, &self.namespace, &filter, write, multi, upsert)
        })?;
        Ok(UpdateResult {
            acknowledged: acknowledged(options),
            matched_count: counts.matched,
            modified_count: counts.modified,
            upserted_count: u64::from(counts.upserted_id.is_some()),
            upserted_id: counts.upserted_id,
        })
    }

    async fn delete(
        &self,
        filter: Document,
        multi: bool,
        options: Option<&Document>,
    ) -> Result<DeleteResult> {
        self.client.ensure_open()?;
        let deleted = self.client.server().with_state(|state| {
            match state.collection_mut(&self.namespace) {
                Some(coll) => delete_matching(coll, &filter, multi),
                None => Ok(0),
            }
        })?;
        Ok(DeleteResult {
            acknowledged: acknowledged(options),
            deleted_count: deleted,
        })
    }

    fn matching(&self, filter: &Document) -> Result<Vec<Document>> {
        self.client.ensure_open()?;
        self.client.server().with_state(|state| {
            let docs = match state.collection(&self.namespace) {
                Some(coll) => coll.documents.as_slice(),
                None => &[],
            };
            let mut matched = Vec::new();
            for doc in docs {
                if query::matches(doc, filter)? {
                    matched.push(doc.clone());
                }
            }
            Ok(matched)
        })
    }
}

#[async_trait]
impl Collection for MemoryCollection {
    fn name(&self) -> &str {
        &self.namespace.collection
    }

    fn namespace(&self) -> Namespace {
        self.namespace.clone()
    }

    fn client(&self) -> Arc<dyn Client> {
        Arc::new(self.client.clone())
    }

    async fn insert_one(
        &self,
        document: Document,
        options: Option<Document>,
    ) -> Result<InsertOneResult> {
        self.client.ensure_open()?;
        let inserted_id = self.client.server().with_state(|state| {
            let coll = state.collection_or_create(&self.namespace);
            insert_document(coll, &self.namespace, document)
        })?;
        Ok(InsertOneResult {
            acknowledged: acknowledged(options.as_ref()),
            inserted_id,
        })
    }

    async fn insert_many(
        &self,
        documents: Vec<Document>,
        options: Option<Document>,
    ) -> Result<InsertManyResult> {
        self.client.ensure_open()?;
        let inserted_ids = self.client.server().with_state(|state| {
            let coll = state.collection_or_create(&self.namespace);
            documents
                .into_iter()
                .enumerate()
                .map(|(i, doc)| Ok((i, insert_document(coll, &self.namespace, doc)?)))
                .collect::<Result<docstore_driver::IdMap>>()
        })?;
        Ok(InsertManyResult {
            acknowledged: acknowledged(options.as_ref()),
            inserted_count: inserted_ids.len() as u64,
            inserted_ids,
        })
    }

    async fn update_one(
        &self,
        filter: Document,
        update: Document,
        options: Option<Document>,
    ) -> Result<UpdateResult> {
        self.write(filter, Write::Update(&update), false, options.as_ref())
            .await
    }

    async fn update_many(
        &self,
        filter: Document,
        update: Document,
        options: Option<Document>,
    ) -> Result<UpdateResult> {
        self.write(filter, Write::Update(&update), true, options.as_ref())
            .await
    }

    async fn replace_one(
        &self,
        filter: Document,
        replacement: Document,
        options: Option<Document>,
    ) -> Result<UpdateResult> {
        self.write(filter, Write::Replace(&replacement), false, options.as_ref())
            .await
    }

    async fn delete_one(
        &self,
        filter: Document,
        options: Option<Document>,
    ) -> Result<DeleteResult> {
        self.delete(filter, false, options.as_ref()).await
    }

    async fn delete_many(
        &self,
        filter: Document,
        options: Option<Document>,
    ) -> Result<DeleteResult> {
        self.delete(filter, true, options.as_ref()).await
    }

    async fn bulk_write(
        &self,
        operations: Vec<WriteModel>,
        options: Option<Document>,
    ) -> Result<BulkWriteResult> {
        self.client.ensure_open()?;
        let mut result = self.client.server().with_state(|state| {
            let coll = state.collection_or_create(&self.namespace);
            let mut result = BulkWriteResult::default();
            for (position, operation) in operations.into_iter().enumerate() {
                let (counts, multi_delete) = match operation {
                    WriteModel::InsertOne { document } => {
                        let id = insert_document(coll, &self.namespace, document)?;
                        result.inserted_ids.insert(position, id);
                        result.inserted_count += 1;
                        continue;
                    }
                    WriteModel::UpdateOne {
                        filter,
                        update,
                        upsert,
                    } => (
                        write_matching(coll, &self.namespace, &filter, Write::Update(&update), false, upsert)?,
                        None,
                    ),
                    WriteModel::UpdateMany {
                        filter,
                        update,
                        upsert,
                    } => (
                        write_matching(coll, &self.namespace, &filter, Write::Update(&update), true, upsert)?,
                        None,
                    ),
                    WriteModel::ReplaceOne {
                        filter,
                        replacement,
                        upsert,
                    } => (
                        write_matching(
                            coll,
                            &self.namespace,
                            &filter,
                            Write::Replace(&replacement),
                            false,
                            upsert,
                        )?,
                        None,
                    ),
                    WriteModel::DeleteOne { filter } => (UpdateCounts::default(), Some((filter, false))),
                    WriteModel::DeleteMany { filter } => (UpdateCounts::default(), Some((filter, true))),
                };
                if let Some((filter, multi)) = multi_delete {
                    result.deleted_count += delete_matching(coll, &filter, multi)?;
                    continue;
                }
                result.matched_count += counts.matched;
                result.modified_count += counts.modified;
                if let Some(id) = counts.upserted_id {
                    result.upserted_count += 1;
                    result.upserted_ids.insert(position, id);
                }
            }
            Ok(result)
        })?;
        result.acknowledged = acknowledged(options.as_ref());
        Ok(result)
    }

    async fn create_index(&self, keys: Document, options: Option<Document>) -> Result<String> {
        self.client.ensure_open()?;
        index::validate_keys(&keys)?;
        let name = options
            .as_ref()
            .and_then(|o| o.get("name"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| index::index_name(&keys));
        self.client.server().with_state(|state| {
            let coll = state.collection_or_create(&self.namespace);
            if let Some(existing) = coll.indexes.iter().find(|i| i.name == name) {
                if existing.keys != keys {
                    return Err(Error::InvalidIndexSpec {
                        message: format!("index {:?} already exists with different keys", name),
                    });
                }
            } else {
                coll.indexes.push(IndexSpec {
                    name: name.clone(),
                    keys,
                });
            }
            Ok(())
        })?;
        Ok(name)
    }

    async fn index_names(&self) -> Result<Vec<String>> {
        self.client.ensure_open()?;
        self.client.server().with_state(|state| {
            state
                .collection(&self.namespace)
                .map(|coll| coll.indexes.iter().map(|i| i.name.clone()).collect())
                .ok_or_else(|| Error::NamespaceNotFound {
                    namespace: self.namespace.clone(),
                })
        })
    }

    async fn drop_index(&self, name: &str) -> Result<()> {
        self.client.ensure_open()?;
        if name == ID_INDEX {
            return Err(Error::InvalidIndexSpec {
                message: "cannot drop _id index".to_string(),
            });
        }
        self.client.server().with_state(|state| {
            let coll = state
                .collection_mut(&self.namespace)
                .ok_or_else(|| Error::NamespaceNotFound {
                    namespace: self.namespace.clone(),
                })?;
            let before = coll.indexes.len();
            coll.indexes.retain(|i| i.name != name);
            if coll.indexes.len() == before {
                return Err(Error::InvalidIndexSpec {
                    message: format!("index not found with name [{}]", name),
                });
            }
            Ok(())
        })
    }

    async fn rename(
        &self,
        new_name: &str,
        options: Option<Document>,
    ) -> Result<Arc<dyn Collection>> {
        self.client.ensure_open()?;
        let target = Namespace::new(self.namespace.db.clone(), new_name);
        let overwrite = drop_target(options.as_ref());
        self.client
            .server()
            .with_state(|state| state.rename(&self.namespace, &target, overwrite))?;
        Ok(Arc::new(MemoryCollection::new(self.client.clone(), target)))
    }

    async fn count_documents(&self, filter: Document, options: Option<Document>) -> Result<u64> {
        let matched = self.matching(&filter)?.len() as u64;
        let skip = option_u64(options.as_ref(), "skip").unwrap_or(0);
        let remaining = matched.saturating_sub(skip);
        Ok(match option_u64(options.as_ref(), "limit") {
            Some(limit) if limit > 0 => remaining.min(limit),
            _ => remaining,
        })
    }

    async fn find_one(
        &self,
        filter: Document,
        options: Option<Document>,
    ) -> Result<Option<Document>> {
        let mut docs = self.matching(&filter)?;
        if let Some(sort) = option_doc(options.as_ref(), "sort") {
            query::sort_documents(&mut docs, sort);
        }
        let skip = option_u64(options.as_ref(), "skip").unwrap_or(0) as usize;
        let projection = option_doc(options.as_ref(), "projection");
        Ok(docs.into_iter().nth(skip).map(|doc| match projection {
            Some(p) => query::project(doc, p),
            None => doc,
        }))
    }

    fn find(&self, filter: Document, options: Option<Document>) -> Box<dyn Cursor> {
        Box::new(MemoryCursor::new(
            self.client.clone(),
            self.namespace.clone(),
            Source::Find { filter },
            options.unwrap_or_default(),
        ))
    }

    fn aggregate(&self, pipeline: Vec<Document>, options: Option<Document>) -> Box<dyn Cursor> {
        Box::new(MemoryCursor::new(
            self.client.clone(),
            self.namespace.clone(),
            Source::Aggregate { pipeline },
            options.unwrap_or_default(),
        ))
    }

    async fn distinct(&self, field: &str, filter: Document) -> Result<Vec<Value>> {
        let mut values: Vec<Value> = Vec::new();
        for doc in self.matching(&filter)? {
            if let Some(value) = query::lookup(&doc, field) {
                if !values.contains(value) {
                    values.push(value.clone());
                }
            }
        }
        Ok(values)
    }

    async fn drop_collection(&self) -> Result<bool> {
        self.client.ensure_open()?;
        self.client
            .server()
            .with_state(|state| Ok(state.drop_collection(&self.namespace)))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
