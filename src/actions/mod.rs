//! Actions offered by interactive submodules
//!
//! An [`Action`] is one of three kinds, distinguished by what it needs from
//! the current selection:
//!
//! - **Resource selection**: at least one selected record backed by a store
//!   subject; only those records are passed on
//! - **Selection**: at least one selected record of any kind
//! - **No selection**: always enabled; the selection is ignored
//!
//! Callers match on the enum (or use [`Action::is_enabled`] and
//! [`Action::invoke`]) instead of downcasting.

pub mod builtin;
pub mod parameters;

pub use builtin::{
    ActionSettings, ClipboardSink, CopyTextAction, CopyUriAction, HideAction, RemoveTagsAction,
    SystemClipboard, TagAction, default_actions, tag_records,
};
pub use parameters::{FileParameter, Parameter, ParameterInput, StringParameter};

use crate::model::Record;
use crate::modules::{Describable, ModuleError};
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

/// Result of running an action
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    /// Action succeeded on all records
    Success { affected_count: usize, details: String },

    /// Action succeeded on some records, failed on others
    Partial {
        succeeded: usize,
        failed: usize,
        errors: Vec<String>,
    },

    /// Action did nothing
    Failed(String),
}

impl ActionOutcome {
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. } | Self::Partial { .. })
    }

    #[must_use]
    pub const fn affected_count(&self) -> Option<usize> {
        match self {
            Self::Success { affected_count, .. }
            | Self::Partial {
                succeeded: affected_count,
                ..
            } => Some(*affected_count),
            Self::Failed(_) => None,
        }
    }

    /// Fold per-record results into an outcome
    #[must_use]
    pub fn from_results(affected: usize, errors: Vec<String>, details: impl Into<String>) -> Self {
        if errors.is_empty() {
            Self::Success {
                affected_count: affected,
                details: details.into(),
            }
        } else if affected > 0 {
            Self::Partial {
                succeeded: affected,
                failed: errors.len(),
                errors,
            }
        } else {
            Self::Failed(errors.join("; "))
        }
    }
}

/// An action that operates on selected records
pub trait SelectionAction: Describable + Send + Sync {
    /// Declared parameters, in the order they should be asked for
    fn parameters(&self) -> Vec<Parameter> {
        Vec::new()
    }

    /// # Errors
    ///
    /// Returns `ModuleError` if the action cannot run at all.
    fn execute(&self, records: &[Arc<Record>]) -> Result<ActionOutcome, ModuleError>;
}

/// An action that needs no selection
pub trait StandaloneAction: Describable + Send + Sync {
    fn parameters(&self) -> Vec<Parameter> {
        Vec::new()
    }

    /// # Errors
    ///
    /// Returns `ModuleError` if the action cannot run at all.
    fn execute(&self) -> Result<ActionOutcome, ModuleError>;
}

pub enum Action {
    ResourceSelection(Box<dyn SelectionAction>),
    Selection(Box<dyn SelectionAction>),
    NoSelection(Box<dyn StandaloneAction>),
}

impl Action {
    #[must_use]
    pub fn parameters(&self) -> Vec<Parameter> {
        match self {
            Self::ResourceSelection(a) | Self::Selection(a) => a.parameters(),
            Self::NoSelection(a) => a.parameters(),
        }
    }

    /// Short label for the kind of selection the action needs
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::ResourceSelection(_) => "resources",
            Self::Selection(_) => "selection",
            Self::NoSelection(_) => "none",
        }
    }

    #[must_use]
    pub fn is_enabled(&self, selection: &[Arc<Record>]) -> bool {
        match self {
            Self::ResourceSelection(_) => selection.iter().any(|r| r.resource().is_some()),
            Self::Selection(_) => !selection.is_empty(),
            Self::NoSelection(_) => true,
        }
    }

    /// Run the action against `selection`
    ///
    /// # Errors
    ///
    /// Returns `ModuleError::ActionDisabled` if the selection does not satisfy
    /// the action, or whatever the action itself reports.
    pub fn invoke(&self, selection: &[Arc<Record>]) -> Result<ActionOutcome, ModuleError> {
        if !self.is_enabled(selection) {
            return Err(ModuleError::ActionDisabled(self.name().to_string()));
        }
        match self {
            Self::ResourceSelection(action) => {
                let backed: Vec<Arc<Record>> = selection
                    .iter()
                    .filter(|r| r.resource().is_some())
                    .cloned()
                    .collect();
                action.execute(&backed)
            }
            Self::Selection(action) => action.execute(selection),
            Self::NoSelection(action) => action.execute(),
        }
    }
}

impl Describable for Action {
    fn name(&self) -> &str {
        match self {
            Self::ResourceSelection(a) | Self::Selection(a) => a.name(),
            Self::NoSelection(a) => a.name(),
        }
    }

    fn description(&self) -> &str {
        match self {
            Self::ResourceSelection(a) | Self::Selection(a) => a.description(),
            Self::NoSelection(a) => a.description(),
        }
    }
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Action")
            .field("kind", &self.kind())
            .field("name", &self.name())
            .finish()
    }
}

/// Action list of an interactive submodule
///
/// Modules may append actions after the submodule is built.
#[derive(Debug, Default)]
pub struct ActionList {
    actions: RwLock<Vec<Arc<Action>>>,
}

impl ActionList {
    #[must_use]
    pub fn new(actions: Vec<Action>) -> Self {
        Self {
            actions: RwLock::new(actions.into_iter().map(Arc::new).collect()),
        }
    }

    pub fn push(&self, action: Action) {
        self.actions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Arc::new(action));
    }

    #[must_use]
    pub fn snapshot(&self) -> Vec<Arc<Action>> {
        self.actions.read().unwrap_or_else(PoisonError::into_inner).clone()
    }
}
