//! Declarative record filters
//!
//! A query is YAML text compiled into a tree of [`Filter`]s:
//!
//! - a bare string applies the default decide filter (`text`)
//! - `{name: pattern}` applies the decide filter `name` to `pattern`
//! - `{name: [child, ...]}` applies the combine filter `name` to the children
//!
//! Patterns are YAML scalars, so `2024` or `2.6` parse as numbers and a
//! number where a pattern is expected matches every record. Quote numeric
//! patterns: `"2024"` or `{name: "2.6"}`.
//!
//! # Features
//!
//! - **Decide filters**: `text`, `name`, `tag`, `regex`, `uri` and store-backed
//!   ask filters, contributed by modules through [`DecideFilterFactory`]
//! - **Combine filters**: `and`, `or` and `not`
//! - **Wrapper**: every query implicitly excludes records tagged as hidden
//!   unless the wrapper is disabled
//!
//! # Examples
//!
//! ```no_run
//! use inventag::filters::{FilterBuilder, FilterRegistry, DecideFilterFactory, TagFilter};
//! use inventag::model::Record;
//!
//! let mut registry = FilterRegistry::with_builtin_combinators();
//! registry.register_decide(DecideFilterFactory::text());
//! registry.register_decide(DecideFilterFactory::new("tag", "Tag", "Has the tag", |p| {
//!     Ok(Box::new(TagFilter::new(p)))
//! }));
//!
//! let builder = FilterBuilder::default();
//! let filter = builder.build_filter("{and: [foo, {tag: starred}]}", &registry).unwrap();
//! assert!(!filter.matches(&Record::new("foobar")));
//! ```

pub mod builder;
pub mod combine;
pub mod decide;
pub mod error;
pub mod factory;

pub use builder::{DEFAULT_FILTER, FilterBuilder, HIDDEN_TAG};
pub use combine::{AndFilter, NotFilter, OrFilter};
pub use decide::{AskFilter, MatchAll, NameFilter, RegexFilter, TagFilter, TextFilter, UriFilter};
pub use error::FilterBuildError;
pub use factory::{CombineFilterFactory, DecideFilterFactory, FilterRegistry};

use crate::model::Record;
use std::fmt;

/// A side-effect-free predicate over one record
///
/// Filters may read the external store while evaluating but never mutate
/// the container they are applied to, so they can be evaluated concurrently.
pub trait Filter: Send + Sync + fmt::Debug {
    fn matches(&self, record: &Record) -> bool;

    /// Compact rendering of the filter tree, e.g. `and(text("foo"), tag("x"))`
    fn describe(&self) -> String;
}

pub type BoxedFilter = Box<dyn Filter>;
