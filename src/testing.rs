//! Testing utilities for inventag
//!
//! Provides an in-memory [`MockStore`] with canned query answers and helpers
//! for building records and module contexts.
//!
//! Only available when compiled with `cfg(test)`.

use crate::context::{DataSource, DataSourceError, ModuleContext};
use crate::model::{Record, ResourceRef, Tag};
use crate::store::{Binding, Store, StoreError, TAG_PROPERTY};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, PoisonError};

#[derive(Debug, Default, Clone)]
struct MockResource {
    type_uri: String,
    name: String,
    attributes: Vec<(String, String)>,
    tags: Vec<Tag>,
}

#[derive(Debug, Default)]
struct MockState {
    resources: BTreeMap<String, MockResource>,
    selects: HashMap<String, Vec<Binding>>,
    asks: HashMap<String, bool>,
    batch: bool,
    batch_sessions: usize,
}

/// In-memory store with programmable query answers
///
/// Select and ask queries are matched by their exact text; unknown selects
/// answer with no solutions and unknown asks with `false`.
#[derive(Debug, Default)]
pub struct MockStore {
    state: Mutex<MockState>,
}

impl MockStore {
    #[must_use]
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn with<R>(&self, f: impl FnOnce(&mut MockState) -> R) -> R {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut state)
    }

    pub fn add_resource(&self, uri: &str, name: &str) {
        self.with(|s| {
            s.resources.entry(uri.to_string()).or_default().name = name.to_string();
        });
    }

    pub fn tag(&self, uri: &str, name: &str) {
        self.tag_with_detail(uri, name, "");
    }

    pub fn tag_with_detail(&self, uri: &str, name: &str, detail: &str) {
        self.with(|s| {
            s.resources
                .entry(uri.to_string())
                .or_default()
                .tags
                .push(Tag::new(name, detail));
        });
    }

    pub fn on_select(&self, query: &str, rows: &[&[(&str, &str)]]) {
        let solutions = rows.iter().map(|row| binding(row)).collect();
        self.with(|s| {
            s.selects.insert(query.to_string(), solutions);
        });
    }

    pub fn on_ask(&self, query: &str, answer: bool) {
        self.with(|s| {
            s.asks.insert(query.to_string(), answer);
        });
    }

    #[must_use]
    pub fn in_batch(&self) -> bool {
        self.with(|s| s.batch)
    }

    #[must_use]
    pub fn batch_sessions(&self) -> usize {
        self.with(|s| s.batch_sessions)
    }

    #[must_use]
    pub fn resource_type(&self, uri: &str) -> Option<String> {
        self.with(|s| s.resources.get(uri).map(|r| r.type_uri.clone()))
    }

    #[must_use]
    pub fn resource_name(&self, uri: &str) -> Option<String> {
        self.with(|s| s.resources.get(uri).map(|r| r.name.clone()))
    }

    #[must_use]
    pub fn resource_count(&self) -> usize {
        self.with(|s| s.resources.len())
    }

    #[must_use]
    pub fn tag_names(&self, uri: &str) -> Vec<String> {
        self.with(|s| {
            s.resources
                .get(uri)
                .map(|r| r.tags.iter().map(|t| t.name.clone()).collect())
                .unwrap_or_default()
        })
    }
}

impl Store for MockStore {
    fn execute_select(&self, query: &str) -> Result<Vec<Binding>, StoreError> {
        Ok(self.with(|s| s.selects.get(query).cloned().unwrap_or_default()))
    }

    fn execute_ask(&self, query: &str) -> Result<bool, StoreError> {
        Ok(self.with(|s| s.asks.get(query).copied().unwrap_or(false)))
    }

    fn contains(&self, uri: &str) -> bool {
        self.with(|s| s.resources.contains_key(uri))
    }

    fn tags(&self, uri: &str) -> Result<Vec<Tag>, StoreError> {
        self.with(|s| {
            s.resources
                .get(uri)
                .map(|r| r.tags.clone())
                .ok_or_else(|| StoreError::NotFound(uri.to_string()))
        })
    }

    fn add_tag(&self, uri: &str, tag: &Tag) -> Result<(), StoreError> {
        self.with(|s| {
            let resource = s
                .resources
                .get_mut(uri)
                .ok_or_else(|| StoreError::NotFound(uri.to_string()))?;
            resource.tags.push(tag.clone());
            Ok(())
        })
    }

    fn remove_statements(&self, uri: &str, property: &str) -> Result<(), StoreError> {
        self.with(|s| {
            if let Some(resource) = s.resources.get_mut(uri) {
                if property == TAG_PROPERTY {
                    resource.tags.clear();
                }
                resource.attributes.retain(|(p, _)| p != property);
            }
            Ok(())
        })
    }

    fn attribute_values(&self, uri: &str, property: &str) -> Result<Vec<String>, StoreError> {
        self.with(|s| {
            let resource = s
                .resources
                .get(uri)
                .ok_or_else(|| StoreError::NotFound(uri.to_string()))?;
            Ok(resource
                .attributes
                .iter()
                .filter(|(p, _)| p == property)
                .map(|(_, v)| v.clone())
                .collect())
        })
    }

    fn create_resource(&self, uri: &str, type_uri: &str, name: &str) -> Result<(), StoreError> {
        self.with(|s| {
            s.resources.insert(
                uri.to_string(),
                MockResource {
                    type_uri: type_uri.to_string(),
                    name: name.to_string(),
                    ..MockResource::default()
                },
            );
        });
        Ok(())
    }

    fn add_attribute(&self, uri: &str, property: &str, value: &str) -> Result<(), StoreError> {
        self.with(|s| {
            let resource = s
                .resources
                .get_mut(uri)
                .ok_or_else(|| StoreError::NotFound(uri.to_string()))?;
            resource
                .attributes
                .push((property.to_string(), value.to_string()));
            Ok(())
        })
    }

    fn add_resource_attribute(
        &self,
        uri: &str,
        property: &str,
        value_uri: &str,
    ) -> Result<(), StoreError> {
        if !self.contains(value_uri) {
            return Err(StoreError::NotFound(value_uri.to_string()));
        }
        self.add_attribute(uri, property, value_uri)
    }

    fn set_batch_mode(&self, enabled: bool) {
        self.with(|s| {
            if enabled && !s.batch {
                s.batch_sessions += 1;
            }
            s.batch = enabled;
        });
    }
}

/// Data source answering commands from a fixed table
#[derive(Debug, Default)]
pub struct ScriptedSource {
    outputs: HashMap<String, String>,
}

impl ScriptedSource {
    #[must_use]
    pub fn new(outputs: &[(&str, &str)]) -> Self {
        Self {
            outputs: outputs
                .iter()
                .map(|(c, o)| ((*c).to_string(), (*o).to_string()))
                .collect(),
        }
    }
}

impl DataSource for ScriptedSource {
    fn execute(&self, command: &str) -> Result<String, DataSourceError> {
        self.outputs
            .get(command)
            .cloned()
            .ok_or_else(|| DataSourceError::CommandFailed {
                command: command.to_string(),
                status: Some(127),
                stderr: "unknown command".to_string(),
            })
    }
}

/// Build a select solution from name/value pairs
#[must_use]
pub fn binding(pairs: &[(&str, &str)]) -> Binding {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect()
}

/// Module context over a fresh mock store
#[must_use]
pub fn mock_context() -> (ModuleContext, Arc<MockStore>) {
    let store = MockStore::shared();
    let handle: Arc<dyn Store> = store.clone();
    (ModuleContext::new(handle), store)
}

/// A record pointing at `uri` in `store`
#[must_use]
pub fn store_record(display: &str, uri: &str, store: &Arc<MockStore>) -> Arc<Record> {
    let handle: Arc<dyn Store> = store.clone();
    Arc::new(Record::new(display).with_resource(ResourceRef::new(uri, &handle)))
}

/// Plain records with the given display strings
#[must_use]
pub fn records(displays: &[&str]) -> Vec<Arc<Record>> {
    displays.iter().map(|d| Arc::new(Record::new(*d))).collect()
}

/// A plain record carrying the given tag names
#[must_use]
pub fn tagged(display: &str, tags: &[&str]) -> Arc<Record> {
    Arc::new(Record::new(display).with_tags(tags.iter().map(|t| Tag::new(*t, "")).collect()))
}
