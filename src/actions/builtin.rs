//! Default actions attached to every interactive submodule

use super::{Action, ActionOutcome, Parameter, SelectionAction, StringParameter};
use crate::context::{ModelEvent, ModuleContext};
use crate::filters::HIDDEN_TAG;
use crate::model::{Record, Tag};
use crate::modules::{Describable, ModuleError};
use crate::store::{Batch, Store, StoreError, TAG_PROPERTY};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// Select query listing every tag name in the store, bound to `?name`
pub const TAG_NAMES_QUERY: &str = "SELECT DISTINCT ?name WHERE { ?s <http://inventag.local/tag> ?t . ?t <http://inventag.local/tagName> ?name } ORDER BY ?name";

/// Where copy actions put their text
pub trait ClipboardSink: Send + Sync {
    /// # Errors
    ///
    /// Returns `ModuleError::Clipboard` if the clipboard is unavailable.
    fn set_text(&self, text: &str) -> Result<(), ModuleError>;
}

/// The desktop clipboard
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClipboard;

impl ClipboardSink for SystemClipboard {
    #[cfg(feature = "clipboard")]
    fn set_text(&self, text: &str) -> Result<(), ModuleError> {
        let mut clipboard = arboard::Clipboard::new()
            .map_err(|e| ModuleError::Clipboard(format!("Clipboard unavailable: {e}")))?;
        clipboard
            .set_text(text)
            .map_err(|e| ModuleError::Clipboard(format!("Clipboard error: {e}")))
    }

    #[cfg(not(feature = "clipboard"))]
    fn set_text(&self, _text: &str) -> Result<(), ModuleError> {
        Err(ModuleError::Clipboard(
            "built without clipboard support".to_string(),
        ))
    }
}

/// Settings shared by the default actions of every module
#[derive(Clone)]
pub struct ActionSettings {
    pub hidden_tag: String,
    pub clipboard: Arc<dyn ClipboardSink>,
}

impl Default for ActionSettings {
    fn default() -> Self {
        Self {
            hidden_tag: HIDDEN_TAG.to_string(),
            clipboard: Arc::new(SystemClipboard),
        }
    }
}

impl fmt::Debug for ActionSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionSettings")
            .field("hidden_tag", &self.hidden_tag)
            .finish_non_exhaustive()
    }
}

/// Hide, Tag, Copy text, Copy URI and Remove all tags, in that order
#[must_use]
pub fn default_actions(ctx: &ModuleContext) -> Vec<Action> {
    let settings = ctx.action_settings();
    vec![
        Action::ResourceSelection(Box::new(HideAction::new(ctx.clone(), &settings.hidden_tag))),
        Action::ResourceSelection(Box::new(TagAction::new(ctx.clone()))),
        Action::Selection(Box::new(CopyTextAction::new(Arc::clone(&settings.clipboard)))),
        Action::ResourceSelection(Box::new(CopyUriAction::new(Arc::clone(&settings.clipboard)))),
        Action::ResourceSelection(Box::new(RemoveTagsAction::new(ctx.clone()))),
    ]
}

/// Tag names already present in the store
#[must_use]
pub fn known_tag_names(store: &dyn Store) -> Vec<String> {
    match store.execute_select(TAG_NAMES_QUERY) {
        Ok(rows) => rows.into_iter().filter_map(|mut row| row.remove("name")).collect(),
        Err(e) => {
            warn!(error = %e, "could not list tag names");
            Vec::new()
        }
    }
}

/// Attach `tags` to every store-backed record
///
/// Subjects that vanished from the store are skipped silently.
pub fn tag_records(
    ctx: &ModuleContext,
    records: &[Arc<Record>],
    tags: &[Tag],
    details: String,
) -> ActionOutcome {
    let batch = Batch::begin(ctx.store().as_ref());
    let mut affected = 0;
    let mut errors = Vec::new();

    for record in records {
        let Some(resource) = record.resource() else {
            continue;
        };
        match tags.iter().try_for_each(|tag| resource.add_tag(tag)) {
            Ok(()) => {
                affected += 1;
                record.refresh_tags();
            }
            Err(StoreError::NotFound(uri)) => debug!(%uri, "subject vanished, not tagging"),
            Err(e) => errors.push(format!("{}: {e}", record.display())),
        }
    }
    drop(batch);

    if affected > 0 {
        ctx.events().post(&ModelEvent::TagsChanged { count: affected });
    }
    ActionOutcome::from_results(affected, errors, details)
}

pub struct HideAction {
    ctx: ModuleContext,
    hidden_tag: String,
}

impl HideAction {
    #[must_use]
    pub fn new(ctx: ModuleContext, hidden_tag: &str) -> Self {
        Self {
            ctx,
            hidden_tag: hidden_tag.to_string(),
        }
    }
}

impl Describable for HideAction {
    fn name(&self) -> &str {
        "Hide"
    }

    fn description(&self) -> &str {
        "Hide the selected resources from default views"
    }
}

impl SelectionAction for HideAction {
    fn execute(&self, records: &[Arc<Record>]) -> Result<ActionOutcome, ModuleError> {
        let tag = Tag::new(self.hidden_tag.clone(), "");
        Ok(tag_records(
            &self.ctx,
            records,
            &[tag],
            format!("Tagged as {}", self.hidden_tag),
        ))
    }
}

pub struct TagAction {
    ctx: ModuleContext,
    names: Arc<StringParameter>,
    detail: Arc<StringParameter>,
}

impl TagAction {
    #[must_use]
    pub fn new(ctx: ModuleContext) -> Self {
        let store = Arc::clone(ctx.store());
        let names = StringParameter::new("Tags", "Comma-separated tag names")
            .list(",")
            .choices(move || known_tag_names(store.as_ref()));
        let detail = StringParameter::new("Detail", "Why the tags apply").multiline();
        Self {
            ctx,
            names: Arc::new(names),
            detail: Arc::new(detail),
        }
    }
}

impl Describable for TagAction {
    fn name(&self) -> &str {
        "Tag"
    }

    fn description(&self) -> &str {
        "Attach tags to the selected resources"
    }
}

impl SelectionAction for TagAction {
    fn parameters(&self) -> Vec<Parameter> {
        vec![
            Parameter::Text(Arc::clone(&self.names)),
            Parameter::Text(Arc::clone(&self.detail)),
        ]
    }

    fn execute(&self, records: &[Arc<Record>]) -> Result<ActionOutcome, ModuleError> {
        let names = self.names.values();
        if names.is_empty() {
            return Ok(ActionOutcome::Failed("No tags specified".to_string()));
        }
        let detail = self.detail.value();
        let tags: Vec<Tag> = names.iter().map(|name| Tag::new(name.clone(), detail.clone())).collect();
        Ok(tag_records(
            &self.ctx,
            records,
            &tags,
            format!("Added tags: {}", names.join(", ")),
        ))
    }
}

/// Display string followed by field values in field-name order, tab separated
#[must_use]
pub fn record_line(record: &Record) -> String {
    let mut names: Vec<&String> = record.fields().keys().collect();
    names.sort();
    std::iter::once(record.display())
        .chain(names.into_iter().filter_map(|name| record.field(name)))
        .collect::<Vec<_>>()
        .join("\t")
}

pub struct CopyTextAction {
    clipboard: Arc<dyn ClipboardSink>,
}

impl CopyTextAction {
    #[must_use]
    pub fn new(clipboard: Arc<dyn ClipboardSink>) -> Self {
        Self { clipboard }
    }
}

impl Describable for CopyTextAction {
    fn name(&self) -> &str {
        "Copy text"
    }

    fn description(&self) -> &str {
        "Copy the selected rows to the clipboard, one per line"
    }
}

impl SelectionAction for CopyTextAction {
    fn execute(&self, records: &[Arc<Record>]) -> Result<ActionOutcome, ModuleError> {
        let text = records
            .iter()
            .map(|record| record_line(record))
            .collect::<Vec<_>>()
            .join("\n");
        self.clipboard.set_text(&text)?;
        Ok(ActionOutcome::Success {
            affected_count: records.len(),
            details: "Copied text to clipboard".to_string(),
        })
    }
}

pub struct CopyUriAction {
    clipboard: Arc<dyn ClipboardSink>,
}

impl CopyUriAction {
    #[must_use]
    pub fn new(clipboard: Arc<dyn ClipboardSink>) -> Self {
        Self { clipboard }
    }
}

impl Describable for CopyUriAction {
    fn name(&self) -> &str {
        "Copy URI"
    }

    fn description(&self) -> &str {
        "Copy the store URIs of the selected resources"
    }
}

impl SelectionAction for CopyUriAction {
    fn execute(&self, records: &[Arc<Record>]) -> Result<ActionOutcome, ModuleError> {
        let uris: Vec<&str> = records.iter().filter_map(|r| r.uri()).collect();
        self.clipboard.set_text(&uris.join("\n"))?;
        Ok(ActionOutcome::Success {
            affected_count: uris.len(),
            details: "Copied URIs to clipboard".to_string(),
        })
    }
}

pub struct RemoveTagsAction {
    ctx: ModuleContext,
}

impl RemoveTagsAction {
    #[must_use]
    pub const fn new(ctx: ModuleContext) -> Self {
        Self { ctx }
    }
}

impl Describable for RemoveTagsAction {
    fn name(&self) -> &str {
        "Remove all tags"
    }

    fn description(&self) -> &str {
        "Remove every tag from the selected resources"
    }
}

impl SelectionAction for RemoveTagsAction {
    fn execute(&self, records: &[Arc<Record>]) -> Result<ActionOutcome, ModuleError> {
        let batch = Batch::begin(self.ctx.store().as_ref());
        let mut affected = 0;
        let mut errors = Vec::new();

        for record in records {
            let Some(resource) = record.resource() else {
                continue;
            };
            let removed = resource
                .store()
                .ok_or(StoreError::Detached)
                .and_then(|store| store.remove_statements(resource.uri(), TAG_PROPERTY));
            match removed {
                Ok(()) => {
                    affected += 1;
                    record.set_tags(Vec::new());
                }
                Err(e) => errors.push(format!("{}: {e}", record.display())),
            }
        }
        drop(batch);

        if affected > 0 {
            self.ctx.events().post(&ModelEvent::TagsChanged { count: affected });
        }
        Ok(ActionOutcome::from_results(affected, errors, "Removed all tags"))
    }
}
