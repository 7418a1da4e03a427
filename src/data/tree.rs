//! Record trees with expansion state
//!
//! Filtering a tree keeps every node that matches or has a matching
//! descendant, so a matching leaf always comes with its whole ancestor
//! chain. The root is always kept. Each node carries an `expanded` flag
//! that belongs to the view, not to the record; re-filtering copies it over
//! from the previous view for every node whose record is still present.

use crate::filters::Filter;
use crate::model::Record;
use rayon::prelude::*;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct TreeNode {
    record: Arc<Record>,
    expanded: bool,
    children: Vec<TreeNode>,
}

impl TreeNode {
    /// A collapsed node without children
    #[must_use]
    pub const fn new(record: Arc<Record>) -> Self {
        Self {
            record,
            expanded: false,
            children: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_children(mut self, children: Vec<Self>) -> Self {
        self.children = children;
        self
    }

    #[must_use]
    pub const fn with_expanded(mut self, expanded: bool) -> Self {
        self.expanded = expanded;
        self
    }

    /// Append a child and return it for further building
    pub fn push(&mut self, child: Self) -> &mut Self {
        self.children.push(child);
        let last = self.children.len() - 1;
        &mut self.children[last]
    }

    #[must_use]
    pub const fn record(&self) -> &Arc<Record> {
        &self.record
    }

    #[must_use]
    pub fn children(&self) -> &[Self] {
        &self.children
    }

    pub fn children_mut(&mut self) -> &mut Vec<Self> {
        &mut self.children
    }

    #[must_use]
    pub const fn is_expanded(&self) -> bool {
        self.expanded
    }

    pub const fn set_expanded(&mut self, expanded: bool) {
        self.expanded = expanded;
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(Self::node_count).sum::<usize>()
    }

    /// Whether this node or any descendant matches
    #[must_use]
    pub fn matches_subtree(&self, filter: &dyn Filter) -> bool {
        filter.matches(&self.record) || self.children.iter().any(|c| c.matches_subtree(filter))
    }

    /// Depth-first walk over every node, root first
    pub fn walk(&self, visit: &mut impl FnMut(&Self, usize)) {
        self.walk_at(0, visit);
    }

    fn walk_at(&self, depth: usize, visit: &mut impl FnMut(&Self, usize)) {
        visit(self, depth);
        for child in &self.children {
            child.walk_at(depth + 1, visit);
        }
    }

    fn refresh_tags(&self) {
        self.record.refresh_tags();
        self.children.par_iter().for_each(Self::refresh_tags);
    }

    /// Copy of this node holding only children that survive `filter`
    ///
    /// Sibling subtrees are pruned in parallel; child order is kept.
    fn prune_children(&self, filter: &dyn Filter) -> Self {
        let children = self
            .children
            .par_iter()
            .filter_map(|child| child.prune(filter))
            .collect();
        Self::new(Arc::clone(&self.record)).with_children(children)
    }

    fn prune(&self, filter: &dyn Filter) -> Option<Self> {
        let node = self.prune_children(filter);
        (!node.children.is_empty() || filter.matches(&self.record)).then_some(node)
    }

    /// Copy expansion flags from `previous`, pairing children by record equality
    ///
    /// `previous` must hold a record equal to this node's.
    fn restore_expansion(&mut self, previous: &Self) {
        self.expanded = previous.expanded;
        for child in &mut self.children {
            if let Some(old) = previous
                .children
                .iter()
                .find(|old| *old.record == *child.record)
            {
                child.restore_expansion(old);
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct TreeData {
    root: TreeNode,
}

impl TreeData {
    #[must_use]
    pub const fn new(root: TreeNode) -> Self {
        Self { root }
    }

    /// The tree, with tags reloaded from the store
    #[must_use]
    pub fn root(&self) -> &TreeNode {
        self.root.refresh_tags();
        &self.root
    }

    /// Filtered copy of the tree
    ///
    /// Kept nodes share their records with the source tree. When `previous`
    /// is an earlier filtered view, its expansion flags are carried over.
    #[must_use]
    pub fn filtered(&self, filter: &dyn Filter, previous: Option<&TreeNode>) -> TreeNode {
        let mut view = self.root().prune_children(filter);
        if let Some(previous) = previous
            && *previous.record == *view.record
        {
            view.restore_expansion(previous);
        }
        view
    }
}
