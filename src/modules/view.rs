//! Interactive submodules backed by a data-producing closure

use super::{Describable, InteractiveSubmodule, ModuleError};
use crate::actions::{Action, ActionList, default_actions};
use crate::context::ModuleContext;
use crate::data::{DataContainer, DataShape, TreeNode};
use crate::model::{Record, ResourceRef};
use crate::store::Binding;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

type Producer = dyn Fn(&ModuleContext, DataShape) -> Result<DataContainer, ModuleError> + Send + Sync;

/// An interactive submodule whose data comes from a closure
///
/// The view starts out with the default actions; modules may append more.
pub struct View {
    name: String,
    description: String,
    shapes: Vec<DataShape>,
    ctx: ModuleContext,
    producer: Box<Producer>,
    actions: ActionList,
}

impl View {
    pub fn new(
        ctx: &ModuleContext,
        name: impl Into<String>,
        description: impl Into<String>,
        shapes: &[DataShape],
        producer: impl Fn(&ModuleContext, DataShape) -> Result<DataContainer, ModuleError>
        + Send
        + Sync
        + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            shapes: shapes.to_vec(),
            ctx: ctx.clone(),
            producer: Box::new(producer),
            actions: ActionList::new(default_actions(ctx)),
        }
    }

    pub fn push_action(&self, action: Action) {
        self.actions.push(action);
    }
}

impl Describable for View {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }
}

impl InteractiveSubmodule for View {
    fn supported_shapes(&self) -> &[DataShape] {
        &self.shapes
    }

    fn data(&self, shape: DataShape) -> Result<DataContainer, ModuleError> {
        if !self.shapes.contains(&shape) {
            return Err(ModuleError::UnsupportedShape {
                submodule: self.name.clone(),
                shape,
            });
        }
        (self.producer)(&self.ctx, shape)
    }

    fn actions(&self) -> Vec<Arc<Action>> {
        self.actions.snapshot()
    }
}

impl fmt::Debug for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("View")
            .field("name", &self.name)
            .field("shapes", &self.shapes)
            .finish_non_exhaustive()
    }
}

/// Turn select solutions into records
///
/// `label` names the variable used as display string; rows without it are
/// skipped. `resource` names the variable holding the subject URI. Every
/// other bound variable becomes a field.
#[must_use]
pub fn rows_to_records(
    ctx: &ModuleContext,
    rows: Vec<Binding>,
    label: &str,
    resource: Option<&str>,
) -> Vec<Arc<Record>> {
    rows.into_iter()
        .filter_map(|mut row| {
            let Some(display) = row.remove(label) else {
                debug!(label, "row without label, skipping");
                return None;
            };
            let mut record = Record::new(display);
            if let Some(uri) = resource.and_then(|var| row.remove(var)) {
                record = record.with_resource(ResourceRef::new(uri, ctx.store()));
            }
            for (name, value) in row {
                record.insert_field(name, value);
            }
            Some(Arc::new(record))
        })
        .collect()
}

/// Last segment of a property URI
#[must_use]
pub fn local_name(property: &str) -> &str {
    property
        .rsplit(['/', '#'])
        .next()
        .filter(|name| !name.is_empty())
        .unwrap_or(property)
}

/// Merge rows of `(resource, display, field, value)` into one record per
/// resource, in order of first appearance
///
/// Repeated values of one field are joined with `", "`.
#[must_use]
pub fn group_rows(
    ctx: &ModuleContext,
    rows: impl IntoIterator<Item = (String, String, String, String)>,
) -> Vec<Arc<Record>> {
    let mut order: Vec<String> = Vec::new();
    let mut records: HashMap<String, Record> = HashMap::new();
    for (uri, display, field, value) in rows {
        let record = records.entry(uri.clone()).or_insert_with(|| {
            order.push(uri.clone());
            Record::new(display).with_resource(ResourceRef::new(uri, ctx.store()))
        });
        record.append_field(&field, &value);
    }
    order
        .into_iter()
        .filter_map(|uri| records.remove(&uri))
        .map(Arc::new)
        .collect()
}

#[derive(Default)]
struct PathNode {
    record: Option<Arc<Record>>,
    children: BTreeMap<String, PathNode>,
}

impl PathNode {
    fn into_tree(self, segment: &str) -> TreeNode {
        let record = self
            .record
            .unwrap_or_else(|| Arc::new(Record::new(segment)));
        let children = self
            .children
            .into_iter()
            .map(|(name, child)| child.into_tree(&name))
            .collect();
        TreeNode::new(record).with_children(children)
    }
}

/// Arrange records by `/`-separated paths, children sorted by name
///
/// Intermediate directories without a record of their own get a plain
/// record named after the segment. A root with exactly one child is
/// replaced by that child.
#[must_use]
pub fn path_tree(root: &str, entries: impl IntoIterator<Item = (String, Arc<Record>)>) -> TreeNode {
    let mut top = PathNode::default();
    for (path, record) in entries {
        let mut node = &mut top;
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            node = node.children.entry(segment.to_string()).or_default();
        }
        node.record = Some(record);
    }
    if top.record.is_none()
        && top.children.len() == 1
        && let Some((name, only)) = top.children.pop_first()
    {
        return only.into_tree(&name);
    }
    top.into_tree(root)
}
