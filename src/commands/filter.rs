//! Filter command - apply a query to records read from a JSON file
//!
//! The input is either an array of records or a single root record. Each
//! record looks like:
//!
//! ```json
//! {"display": "sshd_config", "uri": "http://inventag.local/x",
//!  "fields": {"path": "/etc/ssh/sshd_config"}, "tags": ["starred"],
//!  "children": []}
//! ```
//!
//! Only `display` is required. Lists and tables take the records in order
//! (a single root is flattened depth-first); trees take the root as is, or
//! hang an array under a synthetic root.

use crate::{
    InventagError,
    data::{DataContainer, DataShape, ListData, TableData, TreeData, TreeNode},
    filters::{FilterBuilder, FilterRegistry},
    model::{Record, ResourceRef, Tag},
    output,
    store::Store,
};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

type Result<T> = std::result::Result<T, InventagError>;

/// Display string of the root added above a top-level array in tree shape
pub const SYNTHETIC_ROOT: &str = "records";

#[derive(Debug, Deserialize)]
struct RecordInput {
    display: String,
    #[serde(default)]
    uri: Option<String>,
    #[serde(default)]
    fields: BTreeMap<String, String>,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    children: Vec<RecordInput>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Input {
    Many(Vec<RecordInput>),
    One(RecordInput),
}

impl RecordInput {
    fn to_record(&self, store: &Arc<dyn Store>) -> Record {
        let mut record = Record::new(self.display.clone());
        if let Some(uri) = &self.uri {
            record = record.with_resource(ResourceRef::new(uri.clone(), store));
        }
        for (name, value) in &self.fields {
            record.insert_field(name.clone(), value.clone());
        }
        record.with_tags(self.tags.iter().map(|name| Tag::new(name.clone(), "")).collect())
    }

    fn to_node(&self, store: &Arc<dyn Store>) -> TreeNode {
        let children = self.children.iter().map(|c| c.to_node(store)).collect();
        TreeNode::new(Arc::new(self.to_record(store))).with_children(children)
    }

    fn flatten_into(&self, store: &Arc<dyn Store>, out: &mut Vec<Arc<Record>>) {
        out.push(Arc::new(self.to_record(store)));
        for child in &self.children {
            child.flatten_into(store, out);
        }
    }
}

/// Parse JSON record text into a container of the requested shape
///
/// # Errors
///
/// Returns `InventagError::Json` if the text is not a record or record array.
pub fn parse_container(text: &str, shape: DataShape, store: &Arc<dyn Store>) -> Result<DataContainer> {
    let input: Input = serde_json::from_str(text)?;
    let container = match shape {
        DataShape::Tree => {
            let root = match input {
                Input::One(root) => root.to_node(store),
                Input::Many(items) => TreeNode::new(Arc::new(Record::new(SYNTHETIC_ROOT)))
                    .with_children(items.iter().map(|item| item.to_node(store)).collect()),
            };
            DataContainer::Tree(TreeData::new(root))
        }
        DataShape::List | DataShape::Table => {
            let mut records = Vec::new();
            match input {
                Input::One(root) => root.flatten_into(store, &mut records),
                Input::Many(items) => {
                    for item in &items {
                        item.flatten_into(store, &mut records);
                    }
                }
            }
            if shape == DataShape::List {
                DataContainer::List(ListData::new(records))
            } else {
                DataContainer::Table(TableData::new(records))
            }
        }
    };
    Ok(container)
}

/// Execute the filter command
pub fn execute(
    query: &str,
    input: &Path,
    shape: DataShape,
    builder: &FilterBuilder,
    registry: &FilterRegistry,
    store: &Arc<dyn Store>,
    quiet: bool,
) -> Result<()> {
    let filter = builder.build_filter(query, registry)?;
    let text = fs::read_to_string(input)?;
    let container = parse_container(&text, shape, store)?;
    debug!(shape = %shape, records = container.len(), filter = %filter.describe(), "applying filter");

    let filtered = container.filtered(filter.as_ref());
    if filtered.is_empty() {
        if !quiet {
            println!("No records match.");
        }
        return Ok(());
    }

    for line in output::container_lines(&filtered, quiet) {
        println!("{line}");
    }
    if !quiet {
        println!("\n{} of {} record(s) shown", filtered.len(), container.len());
    }
    Ok(())
}
