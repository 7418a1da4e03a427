//! Combine filters: AND, OR and NOT over child filters

use super::{BoxedFilter, Filter};
use crate::model::Record;

fn describe_children(name: &str, children: &[BoxedFilter]) -> String {
    let inner: Vec<String> = children.iter().map(|c| c.describe()).collect();
    format!("{name}({})", inner.join(", "))
}

/// True iff no child returns false (vacuously true without children)
#[derive(Debug)]
pub struct AndFilter {
    children: Vec<BoxedFilter>,
}

impl AndFilter {
    #[must_use]
    pub const fn new(children: Vec<BoxedFilter>) -> Self {
        Self { children }
    }
}

impl Filter for AndFilter {
    fn matches(&self, record: &Record) -> bool {
        self.children.iter().all(|child| child.matches(record))
    }

    fn describe(&self) -> String {
        describe_children("and", &self.children)
    }
}

/// True iff at least one child returns true (false without children)
#[derive(Debug)]
pub struct OrFilter {
    children: Vec<BoxedFilter>,
}

impl OrFilter {
    #[must_use]
    pub const fn new(children: Vec<BoxedFilter>) -> Self {
        Self { children }
    }
}

impl Filter for OrFilter {
    fn matches(&self, record: &Record) -> bool {
        self.children.iter().any(|child| child.matches(record))
    }

    fn describe(&self) -> String {
        describe_children("or", &self.children)
    }
}

/// Negates its first child only
///
/// Children after the first are kept but never evaluated. Without children
/// the filter accepts every record.
#[derive(Debug)]
pub struct NotFilter {
    children: Vec<BoxedFilter>,
}

impl NotFilter {
    #[must_use]
    pub const fn new(children: Vec<BoxedFilter>) -> Self {
        Self { children }
    }
}

impl Filter for NotFilter {
    fn matches(&self, record: &Record) -> bool {
        self.children.first().is_none_or(|first| !first.matches(record))
    }

    fn describe(&self) -> String {
        describe_children("not", &self.children)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::decide::{MatchAll, NameFilter};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[derive(Debug)]
    struct Fixed(bool);

    impl Filter for Fixed {
        fn matches(&self, _record: &Record) -> bool {
            self.0
        }

        fn describe(&self) -> String {
            self.0.to_string()
        }
    }

    #[derive(Debug)]
    struct Counting(Arc<AtomicUsize>);

    impl Filter for Counting {
        fn matches(&self, _record: &Record) -> bool {
            self.0.fetch_add(1, Ordering::SeqCst);
            true
        }

        fn describe(&self) -> String {
            "counting".to_string()
        }
    }

    fn boxed(values: &[bool]) -> Vec<BoxedFilter> {
        values.iter().map(|v| Box::new(Fixed(*v)) as BoxedFilter).collect()
    }

    #[test]
    fn test_and_without_children_is_true() {
        assert!(AndFilter::new(Vec::new()).matches(&Record::new("x")));
    }

    #[test]
    fn test_or_without_children_is_false() {
        assert!(!OrFilter::new(Vec::new()).matches(&Record::new("x")));
    }

    #[test]
    fn test_not_without_children_is_true() {
        assert!(NotFilter::new(Vec::new()).matches(&Record::new("x")));
    }

    #[test]
    fn test_and_truth_table() {
        let record = Record::new("x");
        assert!(AndFilter::new(boxed(&[true, true])).matches(&record));
        assert!(!AndFilter::new(boxed(&[true, false])).matches(&record));
        assert!(!AndFilter::new(boxed(&[false, true])).matches(&record));
    }

    #[test]
    fn test_or_truth_table() {
        let record = Record::new("x");
        assert!(OrFilter::new(boxed(&[false, true])).matches(&record));
        assert!(!OrFilter::new(boxed(&[false, false])).matches(&record));
    }

    /// Only the first child counts: `not[f1, f2, ...]` is `not f1`, never an
    /// AND of negations.
    #[test]
    fn test_not_negates_first_child_only() {
        let record = Record::new("x");
        assert!(!NotFilter::new(boxed(&[true, false])).matches(&record));
        assert!(NotFilter::new(boxed(&[false, true])).matches(&record));
        assert!(NotFilter::new(boxed(&[false, false, true])).matches(&record));
    }

    #[test]
    fn test_not_ignores_trailing_children() {
        let calls = Arc::new(AtomicUsize::new(0));
        let filter = NotFilter::new(vec![
            Box::new(MatchAll),
            Box::new(Counting(Arc::clone(&calls))),
        ]);
        assert!(!filter.matches(&Record::new("x")));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_describe_nests() {
        let filter = AndFilter::new(vec![
            Box::new(NameFilter::new("foo")),
            Box::new(NotFilter::new(vec![Box::new(MatchAll)])),
        ]);
        assert_eq!(filter.describe(), r#"and(name("foo"), not(all))"#);
    }
}
