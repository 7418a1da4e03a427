//! Filesystem module: files, directories and symlinks of the inspected system

use super::view::{View, path_tree, rows_to_records};
use super::{Describable, ImportSubmodule, Module, ModuleError, Progress, active_source};
use crate::context::{ModelEvent, ModuleContext};
use crate::data::{DataContainer, DataShape, ListData, TreeData};
use crate::model::Record;
use crate::store::{Batch, resource_uri, uri};
use std::sync::{Arc, LazyLock};
use tracing::info;

pub static FILE_TYPE: LazyLock<String> = LazyLock::new(|| uri("File"));
pub static DIRECTORY_TYPE: LazyLock<String> = LazyLock::new(|| uri("Directory"));
pub static SYMLINK_TYPE: LazyLock<String> = LazyLock::new(|| uri("Symlink"));

/// Absolute path of a filesystem resource
pub const PATH_PROPERTY: &str = "http://inventag.local/path";

/// Link target of a symlink resource
pub const TARGET_PROPERTY: &str = "http://inventag.local/target";

pub const FILES_QUERY: &str = "SELECT DISTINCT ?resource ?path WHERE { ?resource <http://inventag.local/path> ?path . { ?resource a <http://inventag.local/File> } UNION { ?resource a <http://inventag.local/Directory> } }";

pub const SYMLINKS_QUERY: &str = "SELECT ?resource ?path ?target WHERE { ?resource a <http://inventag.local/Symlink> . ?resource <http://inventag.local/path> ?path . OPTIONAL { ?resource <http://inventag.local/target> ?target } }";

pub const FILES_COMMAND: &str = "find / -xdev -type f 2>/dev/null || true";
pub const DIRECTORIES_COMMAND: &str = "find / -xdev -type d 2>/dev/null || true";
pub const SYMLINKS_COMMAND: &str = "find / -xdev -type l -printf '%p\\t%l\\n' 2>/dev/null || true";

#[must_use]
pub fn module(ctx: &ModuleContext) -> Module {
    Module::new("Filesystem", "Files and directories of the inspected system")
        .with_interactive(Arc::new(path_view(
            ctx,
            "Files and directories",
            "Every imported file and directory",
            FILES_QUERY,
        )))
        .with_interactive(Arc::new(path_view(
            ctx,
            "Symlinks",
            "Every imported symbolic link",
            SYMLINKS_QUERY,
        )))
        .with_import(FileSystemImport { ctx: ctx.clone() })
}

fn path_view(ctx: &ModuleContext, name: &str, description: &str, query: &'static str) -> View {
    View::new(
        ctx,
        name,
        description,
        &[DataShape::List, DataShape::Tree],
        move |ctx, shape| {
            let rows = ctx.store().execute_select(query)?;
            let mut records = rows_to_records(ctx, rows, "path", Some("resource"));
            records.sort_by_cached_key(|r| r.display().to_lowercase());

            Ok(match shape {
                DataShape::Tree => {
                    let entries = records.iter().map(|r| (r.display().to_string(), segment_record(r)));
                    DataContainer::Tree(TreeData::new(path_tree("/", entries)))
                }
                _ => DataContainer::List(ListData::new(records)),
            })
        },
    )
}

/// Copy of a path record displayed by its final segment
fn segment_record(record: &Record) -> Arc<Record> {
    let mut node = Record::new(base_name(record.display()));
    if let Some(resource) = record.resource() {
        node = node.with_resource(resource.clone());
    }
    for (name, value) in record.fields() {
        node.insert_field(name.clone(), value.clone());
    }
    Arc::new(node)
}

/// Final path segment, or the path itself for `/`
fn base_name(path: &str) -> &str {
    path.rsplit('/').find(|s| !s.is_empty()).unwrap_or(path)
}

struct Entry<'a> {
    type_uri: &'a str,
    path: &'a str,
    target: Option<&'a str>,
}

struct FileSystemImport {
    ctx: ModuleContext,
}

impl Describable for FileSystemImport {
    fn name(&self) -> &str {
        "Files and directories"
    }

    fn description(&self) -> &str {
        "Import files, directories and symlinks found on the data source"
    }
}

impl ImportSubmodule for FileSystemImport {
    #[allow(clippy::cast_precision_loss)]
    fn do_import(&self, progress: &Progress) -> Result<(), ModuleError> {
        let source = active_source(&self.ctx)?;
        progress.report(0.0, "Loading file system listings from the data source");

        let (files, (directories, symlinks)) = rayon::join(
            || source.execute(FILES_COMMAND),
            || {
                rayon::join(
                    || source.execute(DIRECTORIES_COMMAND),
                    || source.execute(SYMLINKS_COMMAND),
                )
            },
        );
        let (files, directories, symlinks) = (files?, directories?, symlinks?);

        let mut entries: Vec<Entry<'_>> = Vec::new();
        for (type_uri, output) in [(FILE_TYPE.as_str(), &files), (DIRECTORY_TYPE.as_str(), &directories)] {
            entries.extend(
                output
                    .lines()
                    .filter(|line| !line.is_empty())
                    .map(|path| Entry { type_uri, path, target: None }),
            );
        }
        entries.extend(symlinks.lines().filter(|line| !line.is_empty()).map(|line| {
            let (path, target) = line.split_once('\t').unwrap_or((line, ""));
            Entry {
                type_uri: SYMLINK_TYPE.as_str(),
                path,
                target: Some(target).filter(|t| !t.is_empty()),
            }
        }));

        progress.report(0.0, "Importing file system entries");
        let store = self.ctx.store();
        let total = entries.len().max(1) as f64;
        {
            let _batch = Batch::begin(store.as_ref());
            for (done, entry) in entries.iter().enumerate() {
                let subject = resource_uri("file", entry.path);
                store.create_resource(&subject, entry.type_uri, base_name(entry.path))?;
                store.add_attribute(&subject, PATH_PROPERTY, entry.path)?;
                if let Some(target) = entry.target {
                    store.add_attribute(&subject, TARGET_PROPERTY, target)?;
                }
                progress.report((done + 1) as f64 / total, "Importing file system entries");
            }
        }

        info!(entries = entries.len(), "imported file system entries");
        self.ctx.events().post(&ModelEvent::Imported {
            submodule: self.name().to_string(),
        });
        Ok(())
    }
}
