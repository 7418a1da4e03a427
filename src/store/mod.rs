//! Contract for the external knowledge store
//!
//! The store itself (a graph/triple store with its own query engine) lives
//! outside this crate. Modules only talk to it through [`Store`]: select and
//! ask queries, plus the handful of resource operations that importers and
//! tagging actions need.

pub mod error;

pub use error::StoreError;

use crate::model::Tag;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fmt::Write;

/// Namespace of every resource, property and type this crate creates
pub const NAMESPACE: &str = "http://inventag.local/";

/// Property under which tags are stored
pub const TAG_PROPERTY: &str = "http://inventag.local/tag";

/// Property holding a subject's human readable name
pub const NAME_PROPERTY: &str = "http://inventag.local/name";

/// Property holding the name of a tag node
pub const TAG_NAME_PROPERTY: &str = "http://inventag.local/tagName";

/// Placeholder replaced by a record's subject in store-backed filter patterns
pub const URI_PLACEHOLDER: &str = "?uri";

/// Placeholder replaced by the user's pattern in templated ask filters
pub const PATTERN_PLACEHOLDER: &str = "?pattern";

/// One solution of a select query: variable name to value
pub type Binding = HashMap<String, String>;

/// Access to the external knowledge store
pub trait Store: Send + Sync {
    /// Run a select query, returning solutions in store order
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Query` if the query cannot be run.
    fn execute_select(&self, query: &str) -> Result<Vec<Binding>, StoreError>;

    /// Run an ask query
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Query` if the query cannot be run.
    fn execute_ask(&self, query: &str) -> Result<bool, StoreError>;

    /// Whether a subject with this URI exists
    fn contains(&self, uri: &str) -> bool;

    /// Tags attached to a subject
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the subject does not exist.
    fn tags(&self, uri: &str) -> Result<Vec<Tag>, StoreError>;

    /// Attach a tag to a subject
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the subject does not exist.
    fn add_tag(&self, uri: &str, tag: &Tag) -> Result<(), StoreError>;

    /// Remove every statement of `property` from a subject
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the write fails.
    fn remove_statements(&self, uri: &str, property: &str) -> Result<(), StoreError>;

    /// Values of one property of a subject
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the subject does not exist.
    fn attribute_values(&self, uri: &str, property: &str) -> Result<Vec<String>, StoreError>;

    /// Create (or replace) a subject with a type and a human readable name
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the write fails.
    fn create_resource(&self, uri: &str, type_uri: &str, name: &str) -> Result<(), StoreError>;

    /// Add a literal attribute
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the subject does not exist.
    fn add_attribute(&self, uri: &str, property: &str, value: &str) -> Result<(), StoreError>;

    /// Add an attribute pointing at another subject
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if either subject does not exist.
    fn add_resource_attribute(
        &self,
        uri: &str,
        property: &str,
        value_uri: &str,
    ) -> Result<(), StoreError>;

    /// Suspend (or resume) change notifications while many writes happen
    fn set_batch_mode(&self, enabled: bool);
}

/// RAII guard keeping a store in batch mode
pub struct Batch<'a> {
    store: &'a dyn Store,
}

impl<'a> Batch<'a> {
    #[must_use]
    pub fn begin(store: &'a dyn Store) -> Self {
        store.set_batch_mode(true);
        Self { store }
    }
}

impl Drop for Batch<'_> {
    fn drop(&mut self) {
        self.store.set_batch_mode(false);
    }
}

/// Build a full URI under [`NAMESPACE`]
#[must_use]
pub fn uri(local: &str) -> String {
    format!("{NAMESPACE}{local}")
}

/// Stable subject URI for a natural key such as a path or package name
///
/// The key is hashed so that URIs stay valid whatever characters it holds.
#[must_use]
pub fn resource_uri(kind: &str, key: &str) -> String {
    let digest = Sha256::digest(key.as_bytes());
    let mut hex = String::with_capacity(digest.len() * 2);
    for byte in digest {
        let _ = write!(hex, "{byte:02x}");
    }
    format!("{NAMESPACE}{kind}/{hex}")
}

/// Quote a value as a query string literal
#[must_use]
pub fn literal(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}

/// A store that holds nothing
///
/// Used when no knowledge store is attached, e.g. when filtering records
/// loaded from a file. Queries answer empty, writes are rejected.
#[derive(Debug, Default, Clone, Copy)]
pub struct OfflineStore;

impl Store for OfflineStore {
    fn execute_select(&self, _query: &str) -> Result<Vec<Binding>, StoreError> {
        Ok(Vec::new())
    }

    fn execute_ask(&self, _query: &str) -> Result<bool, StoreError> {
        Ok(false)
    }

    fn contains(&self, _uri: &str) -> bool {
        false
    }

    fn tags(&self, uri: &str) -> Result<Vec<Tag>, StoreError> {
        Err(StoreError::NotFound(uri.to_string()))
    }

    fn add_tag(&self, uri: &str, _tag: &Tag) -> Result<(), StoreError> {
        Err(StoreError::NotFound(uri.to_string()))
    }

    fn remove_statements(&self, _uri: &str, _property: &str) -> Result<(), StoreError> {
        Err(StoreError::Unsupported("remove_statements"))
    }

    fn attribute_values(&self, uri: &str, _property: &str) -> Result<Vec<String>, StoreError> {
        Err(StoreError::NotFound(uri.to_string()))
    }

    fn create_resource(&self, _uri: &str, _type_uri: &str, _name: &str) -> Result<(), StoreError> {
        Err(StoreError::Unsupported("create_resource"))
    }

    fn add_attribute(&self, uri: &str, _property: &str, _value: &str) -> Result<(), StoreError> {
        Err(StoreError::NotFound(uri.to_string()))
    }

    fn add_resource_attribute(
        &self,
        uri: &str,
        _property: &str,
        _value_uri: &str,
    ) -> Result<(), StoreError> {
        Err(StoreError::NotFound(uri.to_string()))
    }

    fn set_batch_mode(&self, _enabled: bool) {}
}
