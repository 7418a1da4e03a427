//! Query interpreter: compiles YAML query text into a filter tree

use super::decide::MatchAll;
use super::{BoxedFilter, FilterBuildError, FilterRegistry};
use crate::config::InventagConfig;
use serde_yaml::{Mapping, Value};
use tracing::debug;

/// Decide filter applied to bare strings
pub const DEFAULT_FILTER: &str = "text";

/// Tag whose records the wrapper excludes
pub const HIDDEN_TAG: &str = "hidden";

/// Compiles queries against a [`FilterRegistry`]
///
/// With the wrapper enabled every query `q` is compiled as
/// `{and: [{not: [{tag: <hidden>}]}, q]}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterBuilder {
    use_wrapper: bool,
    hidden_tag: String,
    default_filter: String,
}

impl Default for FilterBuilder {
    fn default() -> Self {
        Self {
            use_wrapper: true,
            hidden_tag: HIDDEN_TAG.to_string(),
            default_filter: DEFAULT_FILTER.to_string(),
        }
    }
}

impl FilterBuilder {
    #[must_use]
    pub fn from_config(config: &InventagConfig) -> Self {
        Self {
            use_wrapper: config.use_wrapper,
            hidden_tag: config.hidden_tag.clone(),
            default_filter: config.default_filter.clone(),
        }
    }

    #[must_use]
    pub const fn use_wrapper(&self) -> bool {
        self.use_wrapper
    }

    pub const fn set_use_wrapper(&mut self, enabled: bool) {
        self.use_wrapper = enabled;
    }

    #[must_use]
    pub const fn with_wrapper(mut self, enabled: bool) -> Self {
        self.use_wrapper = enabled;
        self
    }

    #[must_use]
    pub fn hidden_tag(&self) -> &str {
        &self.hidden_tag
    }

    /// Compile `query` into a filter
    ///
    /// # Errors
    ///
    /// Returns `FilterBuildError` if the text is not valid YAML, names an
    /// unregistered filter, or contains a malformed node.
    pub fn build_filter(
        &self,
        query: &str,
        registry: &FilterRegistry,
    ) -> Result<BoxedFilter, FilterBuildError> {
        let raw: Value = if query.trim().is_empty() {
            Value::Null
        } else {
            serde_yaml::from_str(query).map_err(|e| FilterBuildError::Syntax(e.to_string()))?
        };
        let node = if self.use_wrapper { self.wrap(raw) } else { raw };
        self.compile_root(&node, registry)
    }

    fn wrap(&self, raw: Value) -> Value {
        let hidden = single("tag", Value::String(self.hidden_tag.clone()));
        let exclude = single("not", Value::Sequence(vec![hidden]));
        single("and", Value::Sequence(vec![exclude, raw]))
    }

    fn compile_root(
        &self,
        node: &Value,
        registry: &FilterRegistry,
    ) -> Result<BoxedFilter, FilterBuildError> {
        match node {
            Value::String(pattern) => self.compile_default(pattern, registry),
            Value::Mapping(map) => self.compile_map(map, registry),
            other => {
                debug!(node = kind(other), "unrecognized query root, matching everything");
                Ok(Box::new(MatchAll))
            }
        }
    }

    fn compile_default(
        &self,
        pattern: &str,
        registry: &FilterRegistry,
    ) -> Result<BoxedFilter, FilterBuildError> {
        registry
            .decide(&self.default_filter)
            .ok_or_else(|| FilterBuildError::UnknownDefaultFilter(self.default_filter.clone()))?
            .build(pattern)
    }

    fn compile_map(
        &self,
        map: &Mapping,
        registry: &FilterRegistry,
    ) -> Result<BoxedFilter, FilterBuildError> {
        let mut entries = map.iter();
        let (key, value) = match (entries.next(), map.len()) {
            (Some(entry), 1) => entry,
            (None, _) => return Err(FilterBuildError::MalformedNode("empty filter map".to_string())),
            (Some(_), n) => {
                return Err(FilterBuildError::MalformedNode(format!(
                    "expected exactly one filter name per map, got {n}"
                )));
            }
        };

        let Value::String(name) = key else {
            return Err(FilterBuildError::InvalidFilterName(kind(key).to_string()));
        };

        match value {
            Value::String(pattern) => registry
                .decide(name)
                .ok_or_else(|| FilterBuildError::UnknownFilter(name.clone()))?
                .build(pattern),
            Value::Sequence(items) => {
                let mut children = Vec::with_capacity(items.len());
                for item in items {
                    match item {
                        Value::String(pattern) => children.push(self.compile_default(pattern, registry)?),
                        Value::Mapping(child) => children.push(self.compile_map(child, registry)?),
                        other => debug!(filter = %name, node = kind(other), "skipping child"),
                    }
                }
                let factory = registry
                    .combine(name)
                    .ok_or_else(|| FilterBuildError::UnknownCombineFilter(name.clone()))?;
                Ok(factory.build(children))
            }
            other => {
                debug!(filter = %name, node = kind(other), "unrecognized filter value, matching everything");
                Ok(Box::new(MatchAll))
            }
        }
    }
}

fn single(key: &str, value: Value) -> Value {
    let mut map = Mapping::new();
    map.insert(Value::String(key.to_string()), value);
    Value::Mapping(map)
}

const fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Sequence(_) => "list",
        Value::Mapping(_) => "map",
        Value::Tagged(_) => "tagged value",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::DecideFilterFactory;
    use crate::model::Record;
    use crate::testing::{records, tagged};

    fn registry() -> FilterRegistry {
        let mut registry = FilterRegistry::with_builtin_combinators();
        registry.register_decide(DecideFilterFactory::text());
        registry.register_decide(DecideFilterFactory::display_name());
        registry.register_decide(DecideFilterFactory::tag());
        registry.register_decide(DecideFilterFactory::regex());
        registry
    }

    fn unwrapped() -> FilterBuilder {
        FilterBuilder::default().with_wrapper(false)
    }

    #[test]
    fn test_bare_string_uses_default_filter() {
        let registry = registry();
        let bare = unwrapped().build_filter("needle", &registry).unwrap();
        let explicit = unwrapped().build_filter("{text: needle}", &registry).unwrap();
        assert_eq!(bare.describe(), explicit.describe());
        assert_eq!(bare.describe(), r#"text("needle")"#);
    }

    #[test]
    fn test_end_to_end_example() {
        let registry = registry();
        let filter = unwrapped()
            .build_filter(r#"{"and": ["foo", {"tag": "starred"}]}"#, &registry)
            .unwrap();
        assert_eq!(filter.describe(), r#"and(text("foo"), tag("starred"))"#);

        let candidates = [Record::new("foobar"), Record::new("foobaz")];
        candidates[1].set_tags(vec![crate::model::Tag::new("starred", "")]);
        let matched: Vec<&str> = candidates
            .iter()
            .filter(|r| filter.matches(r))
            .map(Record::display)
            .collect();
        assert_eq!(matched, vec!["foobaz"]);
    }

    #[test]
    fn test_block_yaml_query() {
        let registry = registry();
        let query = "or:\n  - name: bash\n  - regex: '^/usr'\n";
        let filter = unwrapped().build_filter(query, &registry).unwrap();
        assert!(filter.matches(&Record::new("/bin/bash")));
        assert!(filter.matches(&Record::new("/usr/lib")));
        assert!(!filter.matches(&Record::new("/etc")));
    }

    #[test]
    fn test_wrapper_excludes_hidden_records() {
        let registry = registry();
        let hidden = tagged("anything", &[HIDDEN_TAG]);

        let wrapped = FilterBuilder::default().build_filter("anything", &registry).unwrap();
        assert!(!wrapped.matches(&hidden));
        assert!(wrapped.matches(&Record::new("anything")));

        let plain = unwrapped().build_filter("anything", &registry).unwrap();
        assert!(plain.matches(&hidden));
    }

    #[test]
    fn test_wrapper_shape() {
        let filter = FilterBuilder::default().build_filter("x", &registry()).unwrap();
        assert_eq!(filter.describe(), r#"and(not(tag("hidden")), text("x"))"#);
    }

    #[test]
    fn test_empty_query_with_wrapper_shows_visible_records() {
        let filter = FilterBuilder::default().build_filter("", &registry()).unwrap();
        assert!(filter.matches(&Record::new("plain")));
        assert!(!filter.matches(&tagged("secret", &["hidden"])));
    }

    #[test]
    fn test_unknown_decide_filter() {
        let err = unwrapped().build_filter("{colour: red}", &registry()).unwrap_err();
        assert_eq!(err, FilterBuildError::UnknownFilter("colour".to_string()));
    }

    #[test]
    fn test_unknown_combine_filter() {
        let err = unwrapped().build_filter("{xor: [a, b]}", &registry()).unwrap_err();
        assert_eq!(err, FilterBuildError::UnknownCombineFilter("xor".to_string()));
    }

    #[test]
    fn test_unknown_nested_filter_fails_whole_query() {
        let err = unwrapped()
            .build_filter("{and: [ok, {or: [{nope: x}]}]}", &registry())
            .unwrap_err();
        assert_eq!(err, FilterBuildError::UnknownFilter("nope".to_string()));
    }

    #[test]
    fn test_non_string_key_is_rejected() {
        let err = unwrapped().build_filter("{42: foo}", &registry()).unwrap_err();
        assert_eq!(err, FilterBuildError::InvalidFilterName("number".to_string()));
    }

    #[test]
    fn test_multi_key_map_is_rejected() {
        let err = unwrapped().build_filter("{name: a, tag: b}", &registry()).unwrap_err();
        assert!(matches!(err, FilterBuildError::MalformedNode(_)));
    }

    #[test]
    fn test_empty_map_is_rejected() {
        let err = unwrapped().build_filter("{}", &registry()).unwrap_err();
        assert!(matches!(err, FilterBuildError::MalformedNode(_)));
    }

    #[test]
    fn test_invalid_yaml_is_syntax_error() {
        let err = unwrapped().build_filter("{and: [", &registry()).unwrap_err();
        assert!(matches!(err, FilterBuildError::Syntax(_)));
    }

    #[test]
    fn test_bad_regex_surfaces() {
        let err = unwrapped().build_filter("{regex: '('}", &registry()).unwrap_err();
        assert!(matches!(err, FilterBuildError::InvalidPattern { .. }));
    }

    #[test]
    fn test_unrecognized_shapes_match_everything() {
        let registry = registry();
        for query in ["42", "[a, b]", "{name: 7}", "{tag: }"] {
            let filter = unwrapped().build_filter(query, &registry).unwrap();
            assert_eq!(filter.describe(), "all", "query {query:?}");
        }
    }

    #[test]
    fn test_numeric_patterns_need_quotes() {
        let registry = registry();
        let bare = unwrapped().build_filter("2024", &registry).unwrap();
        assert_eq!(bare.describe(), "all");

        let quoted = unwrapped().build_filter("'2024'", &registry).unwrap();
        assert_eq!(quoted.describe(), r#"text("2024")"#);
        assert!(quoted.matches(&Record::new("report-2024")));
        assert!(!quoted.matches(&Record::new("report-2023")));

        let named = unwrapped().build_filter(r#"{name: "2.6"}"#, &registry).unwrap();
        assert_eq!(named.describe(), r#"name("2.6")"#);
    }

    #[test]
    fn test_non_string_list_items_are_skipped() {
        let filter = unwrapped().build_filter("{or: [7, true, foo]}", &registry()).unwrap();
        assert_eq!(filter.describe(), r#"or(text("foo"))"#);
    }

    #[test]
    fn test_missing_default_filter() {
        let registry = FilterRegistry::with_builtin_combinators();
        let err = unwrapped().build_filter("x", &registry).unwrap_err();
        assert_eq!(err, FilterBuildError::UnknownDefaultFilter("text".to_string()));
    }

    #[test]
    fn test_from_config() {
        let config = InventagConfig {
            use_wrapper: false,
            hidden_tag: "secret".to_string(),
            default_filter: "name".to_string(),
            ..InventagConfig::default()
        };
        let builder = FilterBuilder::from_config(&config);
        assert!(!builder.use_wrapper());
        assert_eq!(builder.hidden_tag(), "secret");

        let filter = builder.build_filter("x", &registry()).unwrap();
        assert_eq!(filter.describe(), r#"name("x")"#);
    }

    #[test]
    fn test_filter_list_preserves_order() {
        let filter = unwrapped().build_filter("o", &registry()).unwrap();
        let kept: Vec<String> = records(&["one", "two", "three", "four"])
            .iter()
            .filter(|r| filter.matches(r))
            .map(|r| r.display().to_string())
            .collect();
        assert_eq!(kept, vec!["one", "two", "four"]);
    }
}
