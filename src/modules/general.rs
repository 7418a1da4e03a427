//! General module: the standard decide filters and store-wide views

use super::view::{View, group_rows, local_name, rows_to_records};
use super::Module;
use crate::context::ModuleContext;
use crate::data::{DataContainer, DataShape, ListData, TableData, TreeData, TreeNode};
use crate::filters::DecideFilterFactory;
use crate::model::{Record, ResourceRef};
use crate::store::NAME_PROPERTY;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

pub const RESOURCES_QUERY: &str = "SELECT ?resource ?name WHERE { ?resource <http://inventag.local/name> ?name } ORDER BY ?name";

pub const PROPERTIES_QUERY: &str = "SELECT ?resource ?name ?property ?value WHERE { ?resource <http://inventag.local/name> ?name . ?resource ?property ?value . FILTER(isLiteral(?value)) } ORDER BY ?name";

pub const TAGGED_QUERY: &str = "SELECT ?resource ?name ?tag WHERE { ?resource <http://inventag.local/name> ?name . ?resource <http://inventag.local/tag> ?t . ?t <http://inventag.local/tagName> ?tag } ORDER BY ?tag ?name";

/// Display of the tree root grouping tagged resources
pub const TAGS_ROOT: &str = "Tags";

#[must_use]
pub fn module(ctx: &ModuleContext) -> Module {
    let store = Arc::clone(ctx.store());
    Module::new("General", "Standard filters and views over every resource")
        .with_filter(DecideFilterFactory::display_name())
        .with_filter(DecideFilterFactory::text())
        .with_filter(DecideFilterFactory::tag())
        .with_filter(DecideFilterFactory::ask(
            "sparql",
            "SPARQL",
            "The ask query holds with ?uri bound to the resource",
            store,
        ))
        .with_filter(DecideFilterFactory::regex())
        .with_filter(DecideFilterFactory::uri())
        .with_interactive(Arc::new(resources_view(ctx)))
        .with_interactive(Arc::new(tagged_view(ctx)))
}

fn resources_view(ctx: &ModuleContext) -> View {
    View::new(
        ctx,
        "Resources",
        "Every named resource in the store",
        &[DataShape::List, DataShape::Table],
        |ctx, shape| match shape {
            DataShape::Table => {
                let rows = ctx.store().execute_select(PROPERTIES_QUERY)?;
                let cells = rows.into_iter().filter_map(|mut row| {
                    let property = row.remove("property")?;
                    if property == NAME_PROPERTY {
                        return None;
                    }
                    Some((
                        row.remove("resource")?,
                        row.remove("name")?,
                        local_name(&property).to_string(),
                        row.remove("value")?,
                    ))
                });
                Ok(DataContainer::Table(TableData::new(group_rows(ctx, cells))))
            }
            _ => {
                let rows = ctx.store().execute_select(RESOURCES_QUERY)?;
                Ok(DataContainer::List(ListData::new(rows_to_records(
                    ctx,
                    rows,
                    "name",
                    Some("resource"),
                ))))
            }
        },
    )
}

fn tagged_view(ctx: &ModuleContext) -> View {
    View::new(
        ctx,
        "Tagged resources",
        "Resources carrying at least one tag, grouped by tag",
        &[DataShape::List, DataShape::Tree],
        |ctx, shape| {
            let rows = ctx.store().execute_select(TAGGED_QUERY)?;
            let mut order = Vec::new();
            let mut records: HashMap<String, Arc<Record>> = HashMap::new();
            let mut groups: BTreeMap<String, Vec<Arc<Record>>> = BTreeMap::new();

            for mut row in rows {
                let (Some(uri), Some(name), Some(tag)) =
                    (row.remove("resource"), row.remove("name"), row.remove("tag"))
                else {
                    continue;
                };
                let record = records
                    .entry(uri.clone())
                    .or_insert_with(|| {
                        order.push(uri.clone());
                        Arc::new(Record::new(name).with_resource(ResourceRef::new(uri, ctx.store())))
                    })
                    .clone();
                groups.entry(tag).or_default().push(record);
            }

            Ok(match shape {
                DataShape::Tree => {
                    let children = groups
                        .into_iter()
                        .map(|(tag, members)| {
                            TreeNode::new(Arc::new(Record::new(tag)))
                                .with_children(members.into_iter().map(TreeNode::new).collect())
                        })
                        .collect();
                    let root = TreeNode::new(Arc::new(Record::new(TAGS_ROOT))).with_children(children);
                    DataContainer::Tree(TreeData::new(root))
                }
                _ => DataContainer::List(ListData::new(
                    order.iter().filter_map(|uri| records.get(uri).cloned()).collect(),
                )),
            })
        },
    )
}
