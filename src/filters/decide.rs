//! Decide filters: predicates built from a single pattern string

use super::Filter;
use crate::model::Record;
use crate::store::{Store, URI_PLACEHOLDER};
use regex::Regex;
use std::fmt;
use std::sync::Arc;
use tracing::warn;

/// Accepts every record; the fallback for unrecognized query shapes
#[derive(Debug, Default, Clone, Copy)]
pub struct MatchAll;

impl Filter for MatchAll {
    fn matches(&self, _record: &Record) -> bool {
        true
    }

    fn describe(&self) -> String {
        "all".to_string()
    }
}

/// Case-insensitive substring match on the display string or any field value
#[derive(Debug, Clone)]
pub struct TextFilter {
    pattern: String,
    needle: String,
}

impl TextFilter {
    #[must_use]
    pub fn new(pattern: &str) -> Self {
        Self {
            pattern: pattern.to_string(),
            needle: pattern.to_lowercase(),
        }
    }
}

impl Filter for TextFilter {
    fn matches(&self, record: &Record) -> bool {
        record.display().to_lowercase().contains(&self.needle)
            || record
                .fields()
                .values()
                .any(|value| value.to_lowercase().contains(&self.needle))
    }

    fn describe(&self) -> String {
        format!("text({:?})", self.pattern)
    }
}

/// Case-insensitive substring match on the display string only
#[derive(Debug, Clone)]
pub struct NameFilter {
    pattern: String,
    needle: String,
}

impl NameFilter {
    #[must_use]
    pub fn new(pattern: &str) -> Self {
        Self {
            pattern: pattern.to_string(),
            needle: pattern.to_lowercase(),
        }
    }
}

impl Filter for NameFilter {
    fn matches(&self, record: &Record) -> bool {
        record.display().to_lowercase().contains(&self.needle)
    }

    fn describe(&self) -> String {
        format!("name({:?})", self.pattern)
    }
}

/// Exact tag-name match; an empty pattern accepts every record
#[derive(Debug, Clone)]
pub struct TagFilter {
    pattern: String,
}

impl TagFilter {
    #[must_use]
    pub fn new(pattern: &str) -> Self {
        Self {
            pattern: pattern.to_string(),
        }
    }
}

impl Filter for TagFilter {
    fn matches(&self, record: &Record) -> bool {
        self.pattern.is_empty() || record.has_tag(&self.pattern)
    }

    fn describe(&self) -> String {
        format!("tag({:?})", self.pattern)
    }
}

/// Regular-expression search on the display string
#[derive(Debug, Clone)]
pub struct RegexFilter {
    regex: Regex,
}

impl RegexFilter {
    /// # Errors
    ///
    /// Returns `regex::Error` if the pattern does not compile.
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            regex: Regex::new(pattern)?,
        })
    }
}

impl Filter for RegexFilter {
    fn matches(&self, record: &Record) -> bool {
        self.regex.is_match(record.display())
    }

    fn describe(&self) -> String {
        format!("regex({:?})", self.regex.as_str())
    }
}

/// Matches the record whose store subject has exactly this URI
#[derive(Debug, Clone)]
pub struct UriFilter {
    pattern: String,
}

impl UriFilter {
    #[must_use]
    pub fn new(pattern: &str) -> Self {
        Self {
            pattern: pattern.to_string(),
        }
    }
}

impl Filter for UriFilter {
    fn matches(&self, record: &Record) -> bool {
        record.uri() == Some(self.pattern.as_str())
    }

    fn describe(&self) -> String {
        format!("uri({:?})", self.pattern)
    }
}

/// Asks the store whether a query holds for the record's subject
///
/// Every `?uri` in the pattern is replaced by `<subject-uri>` at evaluation
/// time. Records without a subject, and queries the store rejects, do not
/// match.
pub struct AskFilter {
    label: String,
    pattern: String,
    store: Arc<dyn Store>,
}

impl AskFilter {
    #[must_use]
    pub fn new(label: impl Into<String>, pattern: &str, store: Arc<dyn Store>) -> Self {
        Self {
            label: label.into(),
            pattern: pattern.to_string(),
            store,
        }
    }

    /// The query that would be asked for `uri`
    #[must_use]
    pub fn query_for(&self, uri: &str) -> String {
        self.pattern.replace(URI_PLACEHOLDER, &format!("<{uri}>"))
    }
}

impl Filter for AskFilter {
    fn matches(&self, record: &Record) -> bool {
        let Some(uri) = record.uri() else {
            return false;
        };
        match self.store.execute_ask(&self.query_for(uri)) {
            Ok(answer) => answer,
            Err(e) => {
                warn!(filter = %self.label, uri, error = %e, "ask query failed");
                false
            }
        }
    }

    fn describe(&self) -> String {
        format!("{}({:?})", self.label, self.pattern)
    }
}

impl fmt::Debug for AskFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AskFilter")
            .field("label", &self.label)
            .field("pattern", &self.pattern)
            .finish_non_exhaustive()
    }
}
