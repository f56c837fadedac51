//! Test support: an in-memory search store and canned chain rows.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use serde_json::{json, Map, Value};
use tokio::sync::Mutex;

use doc_indexer_repository::{SearchStore, SearchStoreError};

use crate::config::IndexerConfig;
use crate::domain::{ChainContent, ChainDocument, ContentType};

/// In-memory stand-in for the search store.
///
/// Mirrors the store behaviors the projection path relies on: documents
/// index into auto-created indices, partial updates merge objects
/// recursively and replace scalars/arrays, and gets support dotted-path
/// field projection.
pub(crate) struct InMemoryStore {
    indices: Mutex<HashMap<String, HashMap<String, Value>>>,
    upsert_calls: AtomicUsize,
    update_calls: AtomicUsize,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            indices: Mutex::new(HashMap::new()),
            upsert_calls: AtomicUsize::new(0),
            update_calls: AtomicUsize::new(0),
        }
    }

    /// Fetch a stored document for assertions.
    pub async fn document(&self, index: &str, id: &str) -> Option<Value> {
        self.indices
            .lock()
            .await
            .get(index)
            .and_then(|docs| docs.get(id))
            .cloned()
    }

    pub async fn has_index(&self, index: &str) -> bool {
        self.indices.lock().await.contains_key(index)
    }

    pub fn upsert_count(&self) -> usize {
        self.upsert_calls.load(Ordering::SeqCst)
    }

    pub fn update_count(&self) -> usize {
        self.update_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SearchStore for InMemoryStore {
    async fn index_exists(&self, index: &str) -> Result<bool, SearchStoreError> {
        Ok(self.indices.lock().await.contains_key(index))
    }

    async fn upsert_index(&self, index: &str) -> Result<(), SearchStoreError> {
        let mut indices = self.indices.lock().await;
        if indices.contains_key(index) {
            return Err(SearchStoreError::transport(
                400,
                format!("index {} already exists", index),
            ));
        }
        indices.insert(index.to_string(), HashMap::new());
        Ok(())
    }

    async fn delete_index(&self, index: &str) -> Result<(), SearchStoreError> {
        match self.indices.lock().await.remove(index) {
            Some(_) => Ok(()),
            None => Err(SearchStoreError::not_found(index, "")),
        }
    }

    async fn upsert(&self, index: &str, id: &str, doc: &Value) -> Result<(), SearchStoreError> {
        self.upsert_calls.fetch_add(1, Ordering::SeqCst);
        self.indices
            .lock()
            .await
            .entry(index.to_string())
            .or_default()
            .insert(id.to_string(), doc.clone());
        Ok(())
    }

    async fn update(&self, index: &str, id: &str, patch: &Value) -> Result<(), SearchStoreError> {
        let mut indices = self.indices.lock().await;
        let doc = indices
            .get_mut(index)
            .and_then(|docs| docs.get_mut(id))
            .ok_or_else(|| SearchStoreError::not_found(index, id))?;
        merge_value(doc, patch);
        self.update_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn get(
        &self,
        index: &str,
        id: &str,
        fields: Option<&[&str]>,
    ) -> Result<Map<String, Value>, SearchStoreError> {
        let indices = self.indices.lock().await;
        let doc = indices
            .get(index)
            .and_then(|docs| docs.get(id))
            .ok_or_else(|| SearchStoreError::not_found(index, id))?;
        let source = doc
            .as_object()
            .ok_or_else(|| SearchStoreError::serialization("stored document is not an object"))?;

        match fields {
            None => Ok(source.clone()),
            Some(fields) => {
                let mut projected = Map::new();
                for field in fields {
                    let path: Vec<&str> = field.split('.').collect();
                    copy_path(source, &path, &mut projected);
                }
                Ok(projected)
            }
        }
    }

    async fn document_exists(&self, index: &str, id: &str) -> Result<bool, SearchStoreError> {
        Ok(self
            .indices
            .lock()
            .await
            .get(index)
            .map(|docs| docs.contains_key(id))
            .unwrap_or(false))
    }

    async fn delete(
        &self,
        index: &str,
        id: &str,
        fail_if_absent: bool,
    ) -> Result<(), SearchStoreError> {
        let removed = self
            .indices
            .lock()
            .await
            .get_mut(index)
            .and_then(|docs| docs.remove(id));
        if removed.is_none() && fail_if_absent {
            return Err(SearchStoreError::not_found(index, id));
        }
        Ok(())
    }
}

/// Doc-merge: objects merge recursively, scalars and arrays replace.
fn merge_value(target: &mut Value, patch: &Value) {
    match (target, patch) {
        (Value::Object(target), Value::Object(patch)) => {
            for (key, value) in patch {
                match target.get_mut(key) {
                    Some(existing) if existing.is_object() && value.is_object() => {
                        merge_value(existing, value);
                    }
                    _ => {
                        target.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        (target, patch) => *target = patch.clone(),
    }
}

/// Copy one dotted-path field from `source` into `out`, preserving nesting.
fn copy_path(source: &Map<String, Value>, path: &[&str], out: &mut Map<String, Value>) {
    match path {
        [] => {}
        [leaf] => {
            if let Some(value) = source.get(*leaf) {
                out.insert((*leaf).to_string(), value.clone());
            }
        }
        [head, rest @ ..] => {
            if let Some(Value::Object(inner)) = source.get(*head) {
                let mut nested = match out.get(*head) {
                    Some(Value::Object(existing)) => existing.clone(),
                    _ => Map::new(),
                };
                copy_path(inner, rest, &mut nested);
                if !nested.is_empty() {
                    out.insert((*head).to_string(), Value::Object(nested));
                }
            }
        }
    }
}

/// The configuration the operational tests run against.
pub(crate) fn test_config() -> IndexerConfig {
    IndexerConfig::from_yaml(
        r#"
contracts:
  - name: contract1
    doc-table-name: documents
    edge-table-name: edges
    index-prefix: test1
    edge-black-list:
      - { from: "*", to: Vote, name: "*" }
      - { from: Role, to: Dao, name: "*" }
      - { from: Dho, to: DaoUser, name: memberOf }
  - name: contract2
    doc-table-name: documents
    edge-table-name: edges
    index-prefix: test2
cursor-index-prefix: test
opensearch-endpoint: "https://localhost:9200"
add-ints-as-strings: true
"#,
    )
    .expect("test configuration must parse")
}

fn group_label(label_type: ContentType, label: &str) -> ChainContent {
    ChainContent::new("content_group_label", label_type, json!(label))
}

/// The document used by the parsing tests: three groups, duplicate labels
/// across groups, and a numeric string content.
pub(crate) fn dho_doc() -> ChainDocument {
    ChainDocument {
        id: 2,
        creator: "dao.hypha".to_string(),
        contract: "contract1".to_string(),
        created_date: "2020-11-12T18:27:47.000".to_string(),
        updated_date: "2020-11-12T19:27:47.000".to_string(),
        content_groups: vec![
            vec![
                ChainContent::new("root_node", ContentType::Name, json!("dao.hypha")),
                group_label(ContentType::String, "delete"),
                ChainContent::new("hvoice_salary_per_phase", ContentType::Asset, json!("4133.04 HVOICE")),
                ChainContent::new("time_share_x100", ContentType::Int64, json!("90")),
                ChainContent::new("title", ContentType::String, json!("This is a title")),
            ],
            vec![
                ChainContent::new("root_node", ContentType::Name, json!("dao.hypha")),
                group_label(ContentType::String, "details"),
                ChainContent::new("hvoice_salary_per_phase", ContentType::Asset, json!("4133.04 HVOICE")),
                ChainContent::new("time_share_x100", ContentType::Int64, json!("60")),
                ChainContent::new("str_to_int", ContentType::String, json!("60")),
            ],
            vec![
                group_label(ContentType::Name, "system"),
                ChainContent::new("type", ContentType::Name, json!("dho")),
                ChainContent::new("original_approved_date", ContentType::TimePoint, json!("2021-04-12T05:09:36.5")),
            ],
        ],
    }
}

/// A rewritten version of [`dho_doc`]: new creator, new group values,
/// used to check that upserts preserve stored edges.
pub(crate) fn dho_doc_v2() -> ChainDocument {
    ChainDocument {
        id: 2,
        creator: "dao.hypha1".to_string(),
        contract: "contract2".to_string(),
        created_date: "2020-11-12T18:37:47.000".to_string(),
        updated_date: "2020-11-12T19:47:47.000".to_string(),
        content_groups: vec![
            vec![
                ChainContent::new("root_node", ContentType::Name, json!("dao.hypha1")),
                group_label(ContentType::String, "details"),
                ChainContent::new("time_share_x100", ContentType::Int64, json!("80")),
                ChainContent::new("str_to_int", ContentType::String, json!("70")),
            ],
            vec![
                group_label(ContentType::Name, "system"),
                ChainContent::new("type", ContentType::Name, json!("dho")),
                ChainContent::new("original_approved_date", ContentType::TimePoint, json!("2021-04-12T05:09:36.5")),
            ],
        ],
    }
}

pub(crate) fn period_doc(id: u64, number: i64) -> ChainDocument {
    ChainDocument {
        id,
        creator: "dao.hypha".to_string(),
        contract: "contract1".to_string(),
        created_date: "2020-11-12T18:27:47.000".to_string(),
        updated_date: "2020-11-12T19:27:47.000".to_string(),
        content_groups: vec![
            vec![
                group_label(ContentType::String, "details"),
                ChainContent::new("number", ContentType::Int64, json!(number)),
            ],
            vec![
                group_label(ContentType::Name, "system"),
                ChainContent::new("type", ContentType::Name, json!("period")),
            ],
        ],
    }
}

fn account_doc(id: u64, account: &str, type_name: Option<&str>) -> ChainDocument {
    let mut content_groups = vec![vec![
        group_label(ContentType::String, "details"),
        ChainContent::new("account", ContentType::Name, json!(account)),
    ]];
    if let Some(type_name) = type_name {
        content_groups.push(vec![
            group_label(ContentType::Name, "system"),
            ChainContent::new("type", ContentType::Name, json!(type_name)),
        ]);
    }
    ChainDocument {
        id,
        creator: account.to_string(),
        contract: "contract1".to_string(),
        created_date: "2020-11-12T19:27:47.000".to_string(),
        updated_date: "2020-11-12T19:27:47.000".to_string(),
        content_groups,
    }
}

pub(crate) fn member_doc(id: u64, account: &str) -> ChainDocument {
    account_doc(id, account, Some("member"))
}

pub(crate) fn vote_doc(id: u64, account: &str) -> ChainDocument {
    account_doc(id, account, Some("vote"))
}

pub(crate) fn dao_user_doc(id: u64, account: &str) -> ChainDocument {
    account_doc(id, account, Some("dao.user"))
}

pub(crate) fn untyped_doc(id: u64, account: &str) -> ChainDocument {
    account_doc(id, account, None)
}
