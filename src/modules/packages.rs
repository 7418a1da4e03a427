//! Packages module: installed Debian packages and the files they own

use super::view::View;
use super::{
    Describable, ExportSubmodule, ImportSubmodule, Module, ModuleError, Progress, active_source,
};
use crate::actions::builtin::known_tag_names;
use crate::actions::{
    Action, ActionOutcome, FileParameter, Parameter, SelectionAction, StringParameter,
};
use crate::context::{ModelEvent, ModuleContext};
use crate::data::{DataContainer, DataShape, ListData, TableData};
use crate::filters::DecideFilterFactory;
use crate::model::{Record, ResourceRef, Tag};
use crate::store::{Batch, StoreError, literal, resource_uri, uri};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::sync::{Arc, LazyLock};
use tracing::{debug, info};

pub static PACKAGE_TYPE: LazyLock<String> = LazyLock::new(|| uri("Package"));

pub const PACKAGE_NAME_PROPERTY: &str = "http://inventag.local/packageName";
pub const VERSION_PROPERTY: &str = "http://inventag.local/packageVersion";
pub const SECTION_PROPERTY: &str = "http://inventag.local/packageSection";
pub const ESSENTIAL_PROPERTY: &str = "http://inventag.local/packageEssential";
pub const PRIORITY_PROPERTY: &str = "http://inventag.local/packagePriority";
pub const DEPENDENCIES_PROPERTY: &str = "http://inventag.local/packageDependencies";

/// Links a package to a file resource it installed
pub const PACKAGE_FILE_PROPERTY: &str = "http://inventag.local/packageFile";

pub const PACKAGES_QUERY: &str = "SELECT DISTINCT ?resource ?name ?version WHERE { ?resource a <http://inventag.local/Package> . ?resource <http://inventag.local/packageName> ?name . ?resource <http://inventag.local/packageVersion> ?version }";

pub const PACKAGE_DETAILS_QUERY: &str = "SELECT DISTINCT ?resource ?name ?version ?section ?essential ?priority ?dependencies WHERE { ?resource a <http://inventag.local/Package> . ?resource <http://inventag.local/packageName> ?name . ?resource <http://inventag.local/packageVersion> ?version . ?resource <http://inventag.local/packageSection> ?section . ?resource <http://inventag.local/packageEssential> ?essential . ?resource <http://inventag.local/packagePriority> ?priority . ?resource <http://inventag.local/packageDependencies> ?dependencies }";

/// Matches files of the package named by `?pattern`, or packages owning the
/// file at path `?pattern`
pub const DPKG_FILTER_TEMPLATE: &str = "ASK { { ?package <http://inventag.local/packageName> ?pattern . ?package <http://inventag.local/packageFile> ?uri } UNION { ?uri <http://inventag.local/packageFile> ?file . ?file <http://inventag.local/path> ?pattern } }";

pub const PACKAGES_COMMAND: &str = "dpkg-query -W -f='${Package}\\t${Version}\\t${Section}\\t${Essential}\\t${Priority}\\t${Depends}\\n'";

pub const PACKAGE_FILES_COMMAND: &str = "grep -H '' /var/lib/dpkg/info/*.list 2>/dev/null || true";

/// Column order of the package table
pub const TABLE_COLUMNS: [&str; 6] = ["Name", "Version", "Section", "Essential", "Priority", "Dependencies"];

#[must_use]
pub fn module(ctx: &ModuleContext) -> Module {
    let packages = packages_view(ctx);
    packages.push_action(Action::ResourceSelection(Box::new(TagPackageFiles {
        ctx: ctx.clone(),
    })));

    Module::new("Packages", "Installed software packages and the files they own")
        .with_interactive(Arc::new(packages))
        .with_import(PackagesImport { ctx: ctx.clone() })
        .with_import(PackageFilesImport { ctx: ctx.clone() })
        .with_export(SelectionListExport::new(ctx.clone()))
        .with_filter(DecideFilterFactory::ask_template(
            "dpkg",
            "Package files",
            "Files belonging to the named package, or packages containing the file at this path",
            DPKG_FILTER_TEMPLATE,
            Arc::clone(ctx.store()),
        ))
}

fn packages_view(ctx: &ModuleContext) -> View {
    View::new(
        ctx,
        "Packages",
        "Every imported package",
        &[DataShape::List, DataShape::Table],
        |ctx, shape| {
            let store = ctx.store();
            if shape == DataShape::Table {
                let mut records: Vec<Arc<Record>> = store
                    .execute_select(PACKAGE_DETAILS_QUERY)?
                    .into_iter()
                    .filter_map(|mut row| {
                        let uri = row.remove("resource")?;
                        let name = row.remove("name")?;
                        let mut record = Record::new(name.clone())
                            .with_resource(ResourceRef::new(uri, store))
                            .with_field("Name", name);
                        for (column, var) in TABLE_COLUMNS[1..].iter().zip([
                            "version",
                            "section",
                            "essential",
                            "priority",
                            "dependencies",
                        ]) {
                            record.insert_field(*column, row.remove(var).unwrap_or_default());
                        }
                        Some(Arc::new(record))
                    })
                    .collect();
                records.sort_by_cached_key(|r| r.display().to_lowercase());
                let columns = TABLE_COLUMNS.iter().map(|c| (*c).to_string()).collect();
                return Ok(DataContainer::Table(TableData::new(records).with_columns(columns)));
            }

            let mut records: Vec<Arc<Record>> = store
                .execute_select(PACKAGES_QUERY)?
                .into_iter()
                .filter_map(|mut row| {
                    let uri = row.remove("resource")?;
                    let name = row.remove("name")?;
                    let version = row.remove("version").unwrap_or_default();
                    Some(Arc::new(
                        Record::new(format!("{name} ({version})"))
                            .with_resource(ResourceRef::new(uri, store)),
                    ))
                })
                .collect();
            records.sort_by_cached_key(|r| r.display().to_lowercase());
            Ok(DataContainer::List(ListData::new(records)))
        },
    )
}

/// Name and file URIs of a package resource, `None` if it has no name
fn package_files(resource: &ResourceRef) -> Result<Option<(String, Vec<String>)>, StoreError> {
    let Some(name) = resource.attribute_values(PACKAGE_NAME_PROPERTY)?.into_iter().next() else {
        return Ok(None);
    };
    Ok(Some((name, resource.attribute_values(PACKAGE_FILE_PROPERTY)?)))
}

/// Tags every file of the selected packages with the package name
struct TagPackageFiles {
    ctx: ModuleContext,
}

impl Describable for TagPackageFiles {
    fn name(&self) -> &str {
        "Tag package files"
    }

    fn description(&self) -> &str {
        "Tag the files of the selected packages with the package name"
    }
}

impl SelectionAction for TagPackageFiles {
    fn execute(&self, records: &[Arc<Record>]) -> Result<ActionOutcome, ModuleError> {
        let store = self.ctx.store();
        let batch = Batch::begin(store.as_ref());
        let mut affected = 0;
        let mut errors = Vec::new();

        for record in records {
            let Some(resource) = record.resource() else {
                continue;
            };
            let (name, files) = match package_files(resource) {
                Ok(Some(found)) => found,
                Ok(None) => continue,
                Err(e) => {
                    errors.push(format!("{}: {e}", record.display()));
                    continue;
                }
            };

            let tag = Tag::new(name.clone(), format!("Belongs to package {name}"));
            for file in files {
                match store.add_tag(&file, &tag) {
                    Ok(()) => affected += 1,
                    Err(StoreError::NotFound(uri)) => debug!(%uri, "package file vanished, not tagging"),
                    Err(e) => errors.push(format!("{file}: {e}")),
                }
            }
        }
        drop(batch);

        if affected > 0 {
            self.ctx.events().post(&ModelEvent::TagsChanged { count: affected });
        }
        Ok(ActionOutcome::from_results(
            affected,
            errors,
            format!("Tagged {affected} package files"),
        ))
    }
}

/// One line of `dpkg-query` output; missing columns are empty
#[derive(Debug, Default, PartialEq, Eq)]
struct PackageLine<'a> {
    name: &'a str,
    version: &'a str,
    section: &'a str,
    essential: &'a str,
    priority: &'a str,
    dependencies: &'a str,
}

impl<'a> PackageLine<'a> {
    fn parse(line: &'a str) -> Option<Self> {
        let mut columns = line.split('\t');
        let mut next = || columns.next().unwrap_or_default();
        let package = Self {
            name: next(),
            version: next(),
            section: next(),
            essential: next(),
            priority: next(),
            dependencies: next(),
        };
        (!package.name.is_empty()).then_some(package)
    }
}

struct PackagesImport {
    ctx: ModuleContext,
}

impl Describable for PackagesImport {
    fn name(&self) -> &str {
        "Packages (dpkg)"
    }

    fn description(&self) -> &str {
        "Import installed packages through dpkg"
    }
}

impl ImportSubmodule for PackagesImport {
    #[allow(clippy::cast_precision_loss)]
    fn do_import(&self, progress: &Progress) -> Result<(), ModuleError> {
        let source = active_source(&self.ctx)?;
        progress.report(0.0, "Loading package information from the data source");
        let output = source.execute(PACKAGES_COMMAND)?;
        let packages: Vec<PackageLine<'_>> = output.lines().filter_map(PackageLine::parse).collect();

        progress.report(0.0, "Importing packages");
        let store = self.ctx.store();
        let total = packages.len().max(1) as f64;
        {
            let _batch = Batch::begin(store.as_ref());
            for (done, package) in packages.iter().enumerate() {
                let subject = resource_uri("package", package.name);
                store.create_resource(&subject, &PACKAGE_TYPE, package.name)?;
                for (property, value) in [
                    (PACKAGE_NAME_PROPERTY, package.name),
                    (VERSION_PROPERTY, package.version),
                    (SECTION_PROPERTY, package.section),
                    (ESSENTIAL_PROPERTY, package.essential),
                    (PRIORITY_PROPERTY, package.priority),
                    (DEPENDENCIES_PROPERTY, package.dependencies),
                ] {
                    store.add_attribute(&subject, property, value)?;
                }
                progress.report((done + 1) as f64 / total, "Importing packages");
            }
        }

        info!(packages = packages.len(), "imported packages");
        self.ctx.events().post(&ModelEvent::Imported {
            submodule: self.name().to_string(),
        });
        Ok(())
    }
}

/// Split a `grep -H` line of a dpkg file list into package name and path
///
/// Architecture qualifiers such as `libc6:amd64` are dropped.
fn parse_file_line(line: &str) -> Option<(&str, &str)> {
    let (list, path) = line.split_once(".list:")?;
    let package = list.rsplit('/').next()?.split(':').next()?;
    (!package.is_empty() && path.starts_with('/') && path != "/.").then_some((package, path))
}

struct PackageFilesImport {
    ctx: ModuleContext,
}

impl Describable for PackageFilesImport {
    fn name(&self) -> &str {
        "Package files (dpkg)"
    }

    fn description(&self) -> &str {
        "Link imported packages to the imported files they installed"
    }
}

impl ImportSubmodule for PackageFilesImport {
    #[allow(clippy::cast_precision_loss)]
    fn do_import(&self, progress: &Progress) -> Result<(), ModuleError> {
        let source = active_source(&self.ctx)?;
        progress.report(0.0, "Loading package file lists from the data source");
        let output = source.execute(PACKAGE_FILES_COMMAND)?;
        let lines: Vec<(&str, &str)> = output.lines().filter_map(parse_file_line).collect();

        progress.report(0.0, "Linking packages to their files");
        let store = self.ctx.store();
        let total = lines.len().max(1) as f64;
        let mut linked = 0usize;
        {
            let _batch = Batch::begin(store.as_ref());
            for (done, (package, path)) in lines.iter().enumerate() {
                let package_uri = resource_uri("package", package);
                let file_uri = resource_uri("file", path);
                if store.contains(&package_uri) && store.contains(&file_uri) {
                    match store.add_resource_attribute(&package_uri, PACKAGE_FILE_PROPERTY, &file_uri) {
                        Ok(()) => linked += 1,
                        Err(StoreError::NotFound(uri)) => debug!(%uri, "not linking missing resource"),
                        Err(e) => return Err(e.into()),
                    }
                }
                progress.report((done + 1) as f64 / total, "Linking packages to their files");
            }
        }

        info!(linked, "linked package files");
        self.ctx.events().post(&ModelEvent::Imported {
            submodule: self.name().to_string(),
        });
        Ok(())
    }
}

/// Select query for package names, optionally limited to packages carrying
/// at least one of `tags`
#[must_use]
pub fn selection_query(tags: &[String]) -> String {
    let filter = if tags.is_empty() {
        String::new()
    } else {
        let alternatives: Vec<String> = tags
            .iter()
            .map(|tag| format!("?tagName = {}", literal(tag)))
            .collect();
        format!(
            "?resource <http://inventag.local/tag> ?t . ?t <http://inventag.local/tagName> ?tagName . FILTER ({}) ",
            alternatives.join(" || ")
        )
    };
    format!(
        "SELECT DISTINCT ?name WHERE {{ ?resource a <http://inventag.local/Package> . ?resource <http://inventag.local/packageName> ?name . {filter}}}"
    )
}

/// Writes a package list usable with `dpkg --set-selections`
struct SelectionListExport {
    ctx: ModuleContext,
    file: Arc<FileParameter>,
    tags: Arc<StringParameter>,
}

impl SelectionListExport {
    fn new(ctx: ModuleContext) -> Self {
        let store = Arc::clone(ctx.store());
        let tags = StringParameter::new(
            "Only these tags",
            "When set, only packages carrying at least one of these tags are exported",
        )
        .list(",")
        .choices(move || known_tag_names(store.as_ref()));
        Self {
            ctx,
            file: Arc::new(FileParameter::save("File", "The package list is written to this file")),
            tags: Arc::new(tags),
        }
    }
}

impl Describable for SelectionListExport {
    fn name(&self) -> &str {
        "dpkg selection list"
    }

    fn description(&self) -> &str {
        "Export packages as a list for 'dpkg --set-selections'"
    }
}

impl ExportSubmodule for SelectionListExport {
    fn parameters(&self) -> Vec<Parameter> {
        vec![
            Parameter::File(Arc::clone(&self.file)),
            Parameter::Text(Arc::clone(&self.tags)),
        ]
    }

    fn export(&self, progress: &Progress) -> Result<(), ModuleError> {
        let path = self
            .file
            .path()
            .ok_or_else(|| ModuleError::MissingParameter(self.file.name().to_string()))?;

        progress.report(0.0, "Querying packages");
        let mut names: Vec<String> = self
            .ctx
            .store()
            .execute_select(&selection_query(&self.tags.values()))?
            .into_iter()
            .filter_map(|mut row| row.remove("name"))
            .collect();
        names.sort_by_cached_key(|name| name.to_lowercase());

        let mut writer = BufWriter::new(File::create(&path)?);
        writeln!(writer, "# Packages: {}", names.len())?;
        for name in &names {
            writeln!(writer, "{name} install")?;
        }
        writer.flush()?;

        progress.report(1.0, "Package list written");
        info!(path = %path.display(), packages = names.len(), "exported selection list");
        self.ctx.events().post(&ModelEvent::Exported {
            submodule: self.name().to_string(),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::{FilterBuilder, FilterRegistry};
    use crate::modules::InteractiveSubmodule;
    use crate::store::Store;
    use crate::testing::{ScriptedSource, mock_context, store_record};
    use tempfile::TempDir;

    #[test]
    fn test_package_line_pads_missing_columns() {
        let line = PackageLine::parse("bash\t5.2-1\tshells").unwrap();
        assert_eq!(line.name, "bash");
        assert_eq!(line.section, "shells");
        assert_eq!(line.dependencies, "");
        assert!(PackageLine::parse("").is_none());
    }

    #[test]
    fn test_parse_file_line() {
        assert_eq!(
            parse_file_line("/var/lib/dpkg/info/bash.list:/bin/bash"),
            Some(("bash", "/bin/bash"))
        );
        assert_eq!(
            parse_file_line("/var/lib/dpkg/info/libc6:amd64.list:/lib/x86_64-linux-gnu/libc.so.6"),
            Some(("libc6", "/lib/x86_64-linux-gnu/libc.so.6"))
        );
        assert_eq!(parse_file_line("/var/lib/dpkg/info/bash.list:/."), None);
        assert_eq!(parse_file_line("garbage"), None);
    }

    #[test]
    fn test_list_and_table() {
        let (ctx, store) = mock_context();
        store.on_select(
            PACKAGES_QUERY,
            &[
                &[("resource", "urn:z"), ("name", "zsh"), ("version", "5.9")],
                &[("resource", "urn:b"), ("name", "Bash"), ("version", "5.2")],
            ],
        );
        store.on_select(
            PACKAGE_DETAILS_QUERY,
            &[&[
                ("resource", "urn:b"),
                ("name", "bash"),
                ("version", "5.2"),
                ("section", "shells"),
                ("essential", "yes"),
                ("priority", "required"),
                ("dependencies", "base-files"),
            ]],
        );
        let view = packages_view(&ctx);

        let DataContainer::List(list) = view.data(DataShape::List).unwrap() else {
            panic!("expected a list");
        };
        let names: Vec<&str> = list.records().iter().map(|r| r.display()).collect();
        assert_eq!(names, vec!["Bash (5.2)", "zsh (5.9)"]);

        let DataContainer::Table(table) = view.data(DataShape::Table).unwrap() else {
            panic!("expected a table");
        };
        assert_eq!(table.columns(), TABLE_COLUMNS.to_vec());
        let record = &table.records()[0];
        assert_eq!(
            table.row(record),
            vec!["bash", "5.2", "shells", "yes", "required", "base-files"]
        );
    }

    #[test]
    fn test_packages_view_has_extra_action() {
        let (ctx, _) = mock_context();
        let module = module(&ctx);
        let actions = module.interactive()[0].actions();
        assert_eq!(actions.len(), 6);
        assert_eq!(actions[5].name(), "Tag package files");
        assert_eq!(actions[5].kind(), "resources");
    }

    #[test]
    fn test_imports_link_packages_to_files() {
        let (ctx, store) = mock_context();
        ctx.data_sources().set(Arc::new(ScriptedSource::new(&[
            (PACKAGES_COMMAND, "bash\t5.2\tshells\tyes\trequired\tbase-files\n"),
            (
                PACKAGE_FILES_COMMAND,
                "/var/lib/dpkg/info/bash.list:/bin/bash\n/var/lib/dpkg/info/bash.list:/usr/share/doc/bash\n",
            ),
        ])));
        let bin = resource_uri("file", "/bin/bash");
        store.create_resource(&bin, "urn:type", "bash").unwrap();

        PackagesImport { ctx: ctx.clone() }.do_import(&Progress::silent()).unwrap();
        PackageFilesImport { ctx: ctx.clone() }.do_import(&Progress::silent()).unwrap();

        let package = resource_uri("package", "bash");
        assert_eq!(store.resource_type(&package).as_deref(), Some(PACKAGE_TYPE.as_str()));
        assert_eq!(store.attribute_values(&package, VERSION_PROPERTY).unwrap(), vec!["5.2"]);
        assert_eq!(
            store.attribute_values(&package, PACKAGE_FILE_PROPERTY).unwrap(),
            vec![bin]
        );
    }

    #[test]
    fn test_tag_package_files() {
        let (ctx, store) = mock_context();
        store.add_resource("urn:pkg", "bash");
        store.add_resource("urn:file", "bash");
        store.add_attribute("urn:pkg", PACKAGE_NAME_PROPERTY, "bash").unwrap();
        store.add_attribute("urn:pkg", PACKAGE_FILE_PROPERTY, "urn:file").unwrap();
        store.add_attribute("urn:pkg", PACKAGE_FILE_PROPERTY, "urn:gone").unwrap();

        let action = TagPackageFiles { ctx };
        let outcome = action.execute(&[store_record("bash (5.2)", "urn:pkg", &store)]).unwrap();

        assert_eq!(outcome.affected_count(), Some(1));
        assert_eq!(store.tag_names("urn:file"), vec!["bash"]);
        assert!(!store.in_batch());
    }

    #[test]
    fn test_selection_query_filters_by_tags() {
        assert!(!selection_query(&[]).contains("FILTER"));
        let query = selection_query(&["keep".to_string(), "base".to_string()]);
        assert!(query.contains(r#"FILTER (?tagName = "keep" || ?tagName = "base")"#));
    }

    #[test]
    fn test_export_writes_selection_list() {
        let (ctx, store) = mock_context();
        store.on_select(
            &selection_query(&["keep".to_string()]),
            &[&[("name", "zsh")], &[("name", "bash")]],
        );
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("selections.txt");

        let export = SelectionListExport::new(ctx);
        let parameters = export.parameters();
        parameters[0].set_from_str(path.to_str().unwrap()).unwrap();
        parameters[1].set_from_str("keep").unwrap();
        export.export(&Progress::silent()).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written, "# Packages: 2\nbash install\nzsh install\n");
    }

    #[test]
    fn test_export_requires_file() {
        let (ctx, _) = mock_context();
        let result = SelectionListExport::new(ctx).export(&Progress::silent());
        assert!(matches!(result, Err(ModuleError::MissingParameter(name)) if name == "File"));
    }

    #[test]
    fn test_dpkg_filter_substitutes_pattern_and_uri() {
        let (ctx, store) = mock_context();
        store.on_ask(
            "ASK { { ?package <http://inventag.local/packageName> \"bash\" . ?package <http://inventag.local/packageFile> <urn:file> } UNION { <urn:file> <http://inventag.local/packageFile> ?file . ?file <http://inventag.local/path> \"bash\" } }",
            true,
        );
        let mut registry = FilterRegistry::with_builtin_combinators();
        for factory in module(&ctx).filters() {
            registry.register_decide(Arc::clone(factory));
        }
        let filter = FilterBuilder::default()
            .with_wrapper(false)
            .build_filter("{dpkg: bash}", &registry)
            .unwrap();
        assert!(filter.matches(&store_record("bash", "urn:file", &store)));
        assert!(!filter.matches(&store_record("zsh", "urn:other", &store)));
    }
}
