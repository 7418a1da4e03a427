//! Record containers produced by interactive submodules
//!
//! Containers are immutable once produced. Filtering never touches the
//! source container; it yields a new view that shares the record `Arc`s.

pub mod list;
pub mod table;
pub mod tree;

pub use list::ListData;
pub use table::TableData;
pub use tree::{TreeData, TreeNode};

use crate::filters::Filter;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Shape of the data an interactive submodule can produce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DataShape {
    List,
    Table,
    Tree,
}

impl fmt::Display for DataShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::List => write!(f, "list"),
            Self::Table => write!(f, "table"),
            Self::Tree => write!(f, "tree"),
        }
    }
}

#[derive(Debug, Clone)]
pub enum DataContainer {
    List(ListData),
    Table(TableData),
    Tree(TreeData),
}

impl DataContainer {
    #[must_use]
    pub const fn shape(&self) -> DataShape {
        match self {
            Self::List(_) => DataShape::List,
            Self::Table(_) => DataShape::Table,
            Self::Tree(_) => DataShape::Tree,
        }
    }

    /// Number of records, counting every tree node including the root
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::List(list) => list.len(),
            Self::Table(table) => table.len(),
            Self::Tree(tree) => tree.root().node_count(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Filtered view of the same shape
    ///
    /// Trees are filtered without a previous view, so every node starts
    /// collapsed; use [`TreeData::filtered`] to carry expansion state over.
    #[must_use]
    pub fn filtered(&self, filter: &dyn Filter) -> Self {
        match self {
            Self::List(list) => Self::List(list.filtered(filter)),
            Self::Table(table) => Self::Table(table.filtered(filter)),
            Self::Tree(tree) => Self::Tree(TreeData::new(tree.filtered(filter, None))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::{NameFilter, TextFilter};
    use crate::testing::records;
    use std::sync::Arc;

    #[test]
    fn test_shape_and_len() {
        let list = DataContainer::List(ListData::new(records(&["a", "b"])));
        assert_eq!(list.shape(), DataShape::List);
        assert_eq!(list.len(), 2);

        let tree = DataContainer::Tree(TreeData::new(TreeNode::new(Arc::new(
            crate::model::Record::new("root"),
        ))));
        assert_eq!(tree.shape(), DataShape::Tree);
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn test_filtered_keeps_shape() {
        let table = DataContainer::Table(
            TableData::new(records(&["alpha", "beta"])).with_columns(vec!["Name".to_string()]),
        );
        let view = table.filtered(&NameFilter::new("alp"));
        assert_eq!(view.shape(), DataShape::Table);
        assert_eq!(view.len(), 1);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_filtered_tree_keeps_root() {
        let tree = DataContainer::Tree(TreeData::new(TreeNode::new(Arc::new(
            crate::model::Record::new("root"),
        ))));
        let view = tree.filtered(&TextFilter::new("nothing matches"));
        assert_eq!(view.len(), 1);
    }

    #[test]
    fn test_shape_display() {
        assert_eq!(DataShape::Tree.to_string(), "tree");
        assert_eq!(serde_json::to_string(&DataShape::Table).unwrap(), "\"table\"");
    }
}
