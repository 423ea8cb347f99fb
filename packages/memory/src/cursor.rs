//! Lazily evaluated query and aggregation cursors.

use std::any::Any;
use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use docstore_driver::{Client, Cursor, Document, Error, Namespace, Result};
use serde_json::Value;

use crate::client::MemoryClient;
use crate::query;

/// What a cursor reads.
#[derive(Clone, Debug)]
pub(crate) enum Source {
    Find { filter: Document },
    Aggregate { pipeline: Vec<Document> },
}

/// A cursor over a snapshot of a collection.
///
/// The snapshot is taken on the first call to `next`, so fluent options set
/// before iterating take effect.
#[derive(Debug)]
pub struct MemoryCursor {
    client: MemoryClient,
    namespace: Namespace,
    source: Source,
    cursor_options: Document,
    built: Document,
    buffer: Option<VecDeque<Document>>,
    closed: bool,
}

static EMPTY: std::sync::OnceLock<Document> = std::sync::OnceLock::new();

impl MemoryCursor {
    pub(crate) fn new(
        client: MemoryClient,
        namespace: Namespace,
        source: Source,
        cursor_options: Document,
    ) -> Self {
        Self {
            client,
            namespace,
            source,
            cursor_options,
            built: Document::new(),
            buffer: None,
            closed: false,
        }
    }

    fn with_option(mut self: Box<Self>, key: &str, value: Value) -> Box<dyn Cursor> {
        self.built.insert(key.to_string(), value);
        self
    }

    /// Effective options: fluent calls override creation options.
    fn effective_options(&self) -> Document {
        let mut options = self.cursor_options.clone();
        for (key, value) in &self.built {
            options.insert(key.clone(), value.clone());
        }
        options
    }

    fn snapshot(&self) -> Result<Vec<Document>> {
        self.client.ensure_open()?;
        self.client.server().with_state(|state| {
            Ok(state
                .collection(&self.namespace)
                .map(|coll| coll.documents.clone())
                .unwrap_or_default())
        })
    }

    fn execute(&self) -> Result<Vec<Document>> {
        let docs = self.snapshot()?;
        let docs = match &self.source {
            Source::Find { filter } => {
                let mut matched = Vec::new();
                for doc in docs {
                    if query::matches(&doc, filter)? {
                        matched.push(doc);
                    }
                }
                matched
            }
            Source::Aggregate { pipeline } => run_pipeline(docs, pipeline)?,
        };
        Ok(shape(docs, &self.effective_options()))
    }

    async fn fill(&mut self) -> Result<&mut VecDeque<Document>> {
        if self.closed {
            return Err(Error::internal("cursor is closed"));
        }
        if self.buffer.is_none() {
            tracing::trace!(namespace = %self.namespace, "executing cursor");
            self.buffer = Some(self.execute()?.into());
        }
        self.buffer
            .as_mut()
            .ok_or_else(|| Error::internal("cursor buffer missing"))
    }
}

fn option_u64(options: &Document, key: &str) -> Option<usize> {
    options
        .get(key)
        .and_then(Value::as_u64)
        .map(|n| n as usize)
}

/// Apply sort, skip, limit and projection options.
fn shape(mut docs: Vec<Document>, options: &Document) -> Vec<Document> {
    if let Some(sort) = options.get("sort").and_then(Value::as_object) {
        query::sort_documents(&mut docs, sort);
    }
    let skip = option_u64(options, "skip").unwrap_or(0);
    let limit = option_u64(options, "limit").filter(|n| *n > 0);
    let projection = options.get("projection").and_then(Value::as_object);
    docs.into_iter()
        .skip(skip)
        .take(limit.unwrap_or(usize::MAX))
        .map(|doc| match projection {
            Some(p) => query::project(doc, p),
            None => doc,
        })
        .collect()
}

fn stage_document<'a>(stage: &'a Value, name: &str) -> Result<&'a Document> {
    stage
        .as_object()
        .ok_or_else(|| Error::invalid_document(format!("{} stage needs an object", name)))
}

fn stage_u64(stage: &Value, name: &str) -> Result<usize> {
    stage
        .as_u64()
        .map(|n| n as usize)
        .ok_or_else(|| Error::invalid_document(format!("{} stage needs a non-negative integer", name)))
}

fn run_pipeline(mut docs: Vec<Document>, pipeline: &[Document]) -> Result<Vec<Document>> {
    for stage in pipeline {
        let (name, body) = match (stage.len(), stage.iter().next()) {
            (1, Some(entry)) => entry,
            _ => {
                return Err(Error::invalid_document(
                    "a pipeline stage must have exactly one field",
                ))
            }
        };
        docs = match name.as_str() {
            "$match" => {
                let filter = stage_document(body, name)?;
                let mut matched = Vec::new();
                for doc in docs {
                    if query::matches(&doc, filter)? {
                        matched.push(doc);
                    }
                }
                matched
            }
            "$sort" => {
                query::sort_documents(&mut docs, stage_document(body, name)?);
                docs
            }
            "$skip" => docs.into_iter().skip(stage_u64(body, name)?).collect(),
            "$limit" => docs.into_iter().take(stage_u64(body, name)?).collect(),
            "$project" => {
                let projection = stage_document(body, name)?;
                docs.into_iter()
                    .map(|doc| query::project(doc, projection))
                    .collect()
            }
            "$count" => {
                let field = body
                    .as_str()
                    .filter(|f| !f.is_empty())
                    .ok_or_else(|| Error::invalid_document("$count needs a field name"))?;
                let mut counted = Document::new();
                counted.insert(field.to_string(), Value::from(docs.len() as u64));
                vec![counted]
            }
            other => {
                return Err(Error::UnknownOperator {
                    operator: other.to_string(),
                })
            }
        };
    }
    Ok(docs)
}

#[async_trait]
impl Cursor for MemoryCursor {
    fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    fn client(&self) -> Arc<dyn Client> {
        Arc::new(self.client.clone())
    }

    fn filter(&self) -> &Document {
        match &self.source {
            Source::Find { filter } => filter,
            Source::Aggregate { .. } => EMPTY.get_or_init(Document::new),
        }
    }

    fn built_options(&self) -> Document {
        self.built.clone()
    }

    fn cursor_options(&self) -> &Document {
        &self.cursor_options
    }

    fn project(self: Box<Self>, projection: Document) -> Box<dyn Cursor> {
        self.with_option("projection", Value::Object(projection))
    }

    fn sort(self: Box<Self>, sort: Document) -> Box<dyn Cursor> {
        self.with_option("sort", Value::Object(sort))
    }

    fn limit(self: Box<Self>, limit: u64) -> Box<dyn Cursor> {
        self.with_option("limit", Value::from(limit))
    }

    fn skip(self: Box<Self>, skip: u64) -> Box<dyn Cursor> {
        self.with_option("skip", Value::from(skip))
    }

    async fn next(&mut self) -> Result<Option<Document>> {
        Ok(self.fill().await?.pop_front())
    }

    async fn to_array(&mut self) -> Result<Vec<Document>> {
        Ok(self.fill().await?.drain(..).collect())
    }

    async fn close(&mut self) -> Result<()> {
        self.closed = true;
        self.buffer = None;
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any + Send> {
        self
    }
}
