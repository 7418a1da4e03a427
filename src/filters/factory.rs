//! Filter factories and the registries the interpreter resolves names against

use super::combine::{AndFilter, NotFilter, OrFilter};
use super::decide::{AskFilter, NameFilter, RegexFilter, TagFilter, TextFilter, UriFilter};
use super::{BoxedFilter, FilterBuildError};
use crate::modules::Describable;
use crate::store::{PATTERN_PLACEHOLDER, Store, literal};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

type DecideCtor = dyn Fn(&str) -> Result<BoxedFilter, FilterBuildError> + Send + Sync;
type CombineCtor = dyn Fn(Vec<BoxedFilter>) -> BoxedFilter + Send + Sync;

/// Builds a decide filter from a pattern string
pub struct DecideFilterFactory {
    key: String,
    name: String,
    description: String,
    ctor: Box<DecideCtor>,
}

impl DecideFilterFactory {
    pub fn new(
        key: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        ctor: impl Fn(&str) -> Result<BoxedFilter, FilterBuildError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            key: key.into(),
            name: name.into(),
            description: description.into(),
            ctor: Box::new(ctor),
        }
    }

    /// Name the factory is registered and referenced under in queries
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// # Errors
    ///
    /// Returns `FilterBuildError::InvalidPattern` if the pattern is rejected.
    pub fn build(&self, pattern: &str) -> Result<BoxedFilter, FilterBuildError> {
        (self.ctor)(pattern)
    }

    #[must_use]
    pub fn text() -> Self {
        Self::new(
            "text",
            "Text",
            "Display string or any field contains the pattern (case-insensitive)",
            |pattern| Ok(Box::new(TextFilter::new(pattern))),
        )
    }

    #[must_use]
    pub fn display_name() -> Self {
        Self::new(
            "name",
            "Name",
            "Display string contains the pattern (case-insensitive)",
            |pattern| Ok(Box::new(NameFilter::new(pattern))),
        )
    }

    #[must_use]
    pub fn tag() -> Self {
        Self::new(
            "tag",
            "Tag",
            "Carries a tag with exactly this name; an empty name matches everything",
            |pattern| Ok(Box::new(TagFilter::new(pattern))),
        )
    }

    #[must_use]
    pub fn regex() -> Self {
        Self::new(
            "regex",
            "Regular expression",
            "Display string matches the regular expression",
            |pattern| {
                RegexFilter::new(pattern)
                    .map(|f| Box::new(f) as BoxedFilter)
                    .map_err(|e| FilterBuildError::InvalidPattern {
                        filter: "regex".to_string(),
                        reason: e.to_string(),
                    })
            },
        )
    }

    #[must_use]
    pub fn uri() -> Self {
        Self::new(
            "uri",
            "URI",
            "Backed by the store subject with exactly this URI",
            |pattern| Ok(Box::new(UriFilter::new(pattern))),
        )
    }

    /// Store-backed filter asking `pattern` with `?uri` bound to the record
    pub fn ask(
        key: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        store: Arc<dyn Store>,
    ) -> Self {
        let key = key.into();
        let label = key.clone();
        Self::new(key, name, description, move |pattern| {
            Ok(Box::new(AskFilter::new(label.clone(), pattern, Arc::clone(&store))))
        })
    }

    /// Store-backed filter asking a fixed `template`
    ///
    /// `?pattern` in the template is replaced by the pattern as a quoted
    /// literal when the filter is built; `?uri` is bound per record.
    pub fn ask_template(
        key: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        template: impl Into<String>,
        store: Arc<dyn Store>,
    ) -> Self {
        let key = key.into();
        let label = key.clone();
        let template = template.into();
        Self::new(key, name, description, move |pattern| {
            let query = template.replace(PATTERN_PLACEHOLDER, &literal(pattern));
            Ok(Box::new(AskFilter::new(label.clone(), &query, Arc::clone(&store))))
        })
    }
}

impl Describable for DecideFilterFactory {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }
}

impl fmt::Debug for DecideFilterFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecideFilterFactory")
            .field("key", &self.key)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Builds a combine filter from an ordered list of children
pub struct CombineFilterFactory {
    key: String,
    name: String,
    description: String,
    ctor: Box<CombineCtor>,
}

impl CombineFilterFactory {
    pub fn new(
        key: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        ctor: impl Fn(Vec<BoxedFilter>) -> BoxedFilter + Send + Sync + 'static,
    ) -> Self {
        Self {
            key: key.into(),
            name: name.into(),
            description: description.into(),
            ctor: Box::new(ctor),
        }
    }

    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    #[must_use]
    pub fn build(&self, children: Vec<BoxedFilter>) -> BoxedFilter {
        (self.ctor)(children)
    }

    /// The `and`, `or` and `not` combinators
    #[must_use]
    pub fn builtins() -> Vec<Self> {
        vec![
            Self::new("and", "And", "Every child filter matches", |children| {
                Box::new(AndFilter::new(children))
            }),
            Self::new("or", "Or", "At least one child filter matches", |children| {
                Box::new(OrFilter::new(children))
            }),
            Self::new("not", "Not", "The first child filter does not match", |children| {
                Box::new(NotFilter::new(children))
            }),
        ]
    }
}

impl Describable for CombineFilterFactory {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }
}

impl fmt::Debug for CombineFilterFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CombineFilterFactory")
            .field("key", &self.key)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Decide and combine factories keyed by name
///
/// Registering a decide factory under a taken name replaces the earlier one:
/// the last writer wins.
#[derive(Debug, Default, Clone)]
pub struct FilterRegistry {
    decide: HashMap<String, Arc<DecideFilterFactory>>,
    combine: HashMap<String, Arc<CombineFilterFactory>>,
}

impl FilterRegistry {
    /// An empty registry, without even the combinators
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_builtin_combinators() -> Self {
        let mut registry = Self::new();
        for factory in CombineFilterFactory::builtins() {
            registry.register_combine(factory);
        }
        registry
    }

    /// Register a decide factory, returning the one it replaced
    pub fn register_decide(
        &mut self,
        factory: impl Into<Arc<DecideFilterFactory>>,
    ) -> Option<Arc<DecideFilterFactory>> {
        let factory = factory.into();
        let previous = self.decide.insert(factory.key().to_string(), factory);
        if let Some(old) = &previous {
            debug!(filter = old.key(), "decide filter factory replaced");
        }
        previous
    }

    pub fn register_combine(
        &mut self,
        factory: impl Into<Arc<CombineFilterFactory>>,
    ) -> Option<Arc<CombineFilterFactory>> {
        let factory = factory.into();
        self.combine.insert(factory.key().to_string(), factory)
    }

    #[must_use]
    pub fn decide(&self, key: &str) -> Option<&Arc<DecideFilterFactory>> {
        self.decide.get(key)
    }

    #[must_use]
    pub fn combine(&self, key: &str) -> Option<&Arc<CombineFilterFactory>> {
        self.combine.get(key)
    }

    /// Decide factories sorted by key
    #[must_use]
    pub fn decide_factories(&self) -> Vec<&Arc<DecideFilterFactory>> {
        let mut factories: Vec<_> = self.decide.values().collect();
        factories.sort_by(|a, b| a.key().cmp(b.key()));
        factories
    }

    /// Combine factories sorted by key
    #[must_use]
    pub fn combine_factories(&self) -> Vec<&Arc<CombineFilterFactory>> {
        let mut factories: Vec<_> = self.combine.values().collect();
        factories.sort_by(|a, b| a.key().cmp(b.key()));
        factories
    }
}
