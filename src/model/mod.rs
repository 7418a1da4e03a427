//! Core record types shared by containers, filters and actions
//!
//! A [`Record`] is the display unit produced by interactive submodules. It may
//! point at a subject in the external store through a [`ResourceRef`], which
//! holds only a weak handle: the record never keeps the store alive.

use crate::store::{Store, StoreError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, Weak};
use tracing::debug;

/// A free-form label with a rationale, attached to a store subject
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tag {
    pub name: String,
    #[serde(default)]
    pub detail: String,
}

impl Tag {
    #[must_use]
    pub fn new(name: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            detail: detail.into(),
        }
    }
}

/// Weak reference to a subject in the store
#[derive(Clone)]
pub struct ResourceRef {
    uri: String,
    store: Weak<dyn Store>,
}

impl ResourceRef {
    #[must_use]
    pub fn new(uri: impl Into<String>, store: &Arc<dyn Store>) -> Self {
        Self {
            uri: uri.into(),
            store: Arc::downgrade(store),
        }
    }

    /// The subject's full URI
    #[must_use]
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Upgrade to the owning store, if it is still alive
    #[must_use]
    pub fn store(&self) -> Option<Arc<dyn Store>> {
        self.store.upgrade()
    }

    fn live_store(&self) -> Result<Arc<dyn Store>, StoreError> {
        self.store().ok_or(StoreError::Detached)
    }

    /// Current tags of the subject
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the store is gone or the subject no longer exists.
    pub fn tags(&self) -> Result<Vec<Tag>, StoreError> {
        self.live_store()?.tags(&self.uri)
    }

    /// Attach a tag to the subject
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the store is gone or rejects the write.
    pub fn add_tag(&self, tag: &Tag) -> Result<(), StoreError> {
        self.live_store()?.add_tag(&self.uri, tag)
    }

    /// Literal or resource values of one property of the subject
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the store is gone or the subject no longer exists.
    pub fn attribute_values(&self, property: &str) -> Result<Vec<String>, StoreError> {
        self.live_store()?.attribute_values(&self.uri, property)
    }
}

impl PartialEq for ResourceRef {
    fn eq(&self, other: &Self) -> bool {
        self.uri == other.uri
    }
}

impl Eq for ResourceRef {}

impl fmt::Debug for ResourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceRef")
            .field("uri", &self.uri)
            .field("attached", &(self.store.strong_count() > 0))
            .finish()
    }
}

/// A display unit produced by an interactive submodule
///
/// Tags are refreshed from the store every time the owning container hands the
/// record out, so they sit behind a lock while the rest of the record is
/// immutable once built.
pub struct Record {
    display: String,
    resource: Option<ResourceRef>,
    fields: HashMap<String, String>,
    tags: RwLock<Vec<Tag>>,
}

impl Record {
    #[must_use]
    pub fn new(display: impl Into<String>) -> Self {
        Self {
            display: display.into(),
            resource: None,
            fields: HashMap::new(),
            tags: RwLock::new(Vec::new()),
        }
    }

    #[must_use]
    pub fn with_resource(mut self, resource: ResourceRef) -> Self {
        self.resource = Some(resource);
        self
    }

    #[must_use]
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_tags(self, tags: Vec<Tag>) -> Self {
        self.set_tags(tags);
        self
    }

    /// The display string
    #[must_use]
    pub fn display(&self) -> &str {
        &self.display
    }

    #[must_use]
    pub const fn resource(&self) -> Option<&ResourceRef> {
        self.resource.as_ref()
    }

    /// The subject URI, when the record is store-backed
    #[must_use]
    pub fn uri(&self) -> Option<&str> {
        self.resource.as_ref().map(ResourceRef::uri)
    }

    #[must_use]
    pub const fn fields(&self) -> &HashMap<String, String> {
        &self.fields
    }

    #[must_use]
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    pub fn insert_field(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(name.into(), value.into());
    }

    /// Append a value to a field, joining with `", "` when one is already set
    pub fn append_field(&mut self, name: &str, value: &str) {
        match self.fields.get_mut(name) {
            Some(existing) if !existing.is_empty() => {
                existing.push_str(", ");
                existing.push_str(value);
            }
            Some(existing) => existing.push_str(value),
            None => {
                self.fields.insert(name.to_string(), value.to_string());
            }
        }
    }

    /// Snapshot of the record's tags
    #[must_use]
    pub fn tags(&self) -> Vec<Tag> {
        self.tags.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    #[must_use]
    pub fn has_tag(&self, name: &str) -> bool {
        self.tags
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .any(|tag| tag.name == name)
    }

    pub fn set_tags(&self, tags: Vec<Tag>) {
        *self.tags.write().unwrap_or_else(PoisonError::into_inner) = tags;
    }

    /// Reload tags from the backing store subject
    ///
    /// Records without a store reference keep their tags. A subject that has
    /// vanished from the store leaves the previous tags in place.
    pub fn refresh_tags(&self) {
        let Some(resource) = &self.resource else {
            return;
        };
        match resource.tags() {
            Ok(tags) => self.set_tags(tags),
            Err(e) => debug!(uri = resource.uri(), error = %e, "keeping stale tags"),
        }
    }
}

impl PartialEq for Record {
    fn eq(&self, other: &Self) -> bool {
        if std::ptr::eq(self, other) {
            return true;
        }
        self.display == other.display
            && self.resource == other.resource
            && self.fields == other.fields
            && self.tags() == other.tags()
    }
}

impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Record")
            .field("display", &self.display)
            .field("resource", &self.resource)
            .field("fields", &self.fields)
            .field("tags", &self.tags())
            .finish()
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tags = self.tags();
        if tags.is_empty() {
            write!(f, "{}", self.display)
        } else {
            let names: Vec<&str> = tags.iter().map(|t| t.name.as_str()).collect();
            write!(f, "{} ({})", self.display, names.join(", "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockStore;

    #[test]
    fn test_display_without_tags() {
        let record = Record::new("/etc/hosts");
        assert_eq!(record.to_string(), "/etc/hosts");
    }

    #[test]
    fn test_display_lists_tag_names() {
        let record = Record::new("bash").with_tags(vec![
            Tag::new("shell", "login shell"),
            Tag::new("starred", ""),
        ]);
        assert_eq!(record.to_string(), "bash (shell, starred)");
    }

    #[test]
    fn test_append_field_joins_values() {
        let mut record = Record::new("x");
        record.append_field("type", "file");
        record.append_field("type", "config");
        assert_eq!(record.field("type"), Some("file, config"));
    }

    #[test]
    fn test_refresh_tags_reads_store() {
        let store = MockStore::shared();
        store.add_resource("urn:a", "a");
        store.tag("urn:a", "reviewed");
        let handle: Arc<dyn Store> = store.clone();

        let record = Record::new("a").with_resource(ResourceRef::new("urn:a", &handle));
        assert!(record.tags().is_empty());
        record.refresh_tags();
        assert!(record.has_tag("reviewed"));
    }

    #[test]
    fn test_refresh_tags_keeps_tags_of_missing_subject() {
        let store = MockStore::shared();
        let handle: Arc<dyn Store> = store.clone();
        let record = Record::new("gone")
            .with_resource(ResourceRef::new("urn:gone", &handle))
            .with_tags(vec![Tag::new("old", "")]);

        record.refresh_tags();
        assert!(record.has_tag("old"));
    }

    #[test]
    fn test_resource_ref_is_weak() {
        let store = MockStore::shared();
        let handle: Arc<dyn Store> = store;
        let resource = ResourceRef::new("urn:a", &handle);
        drop(handle);

        assert!(resource.store().is_none());
        assert!(matches!(resource.tags(), Err(StoreError::Detached)));
    }

    #[test]
    fn test_record_equality_is_by_value() {
        let a = Record::new("x").with_field("k", "v");
        let b = Record::new("x").with_field("k", "v");
        let c = Record::new("x").with_field("k", "w");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
