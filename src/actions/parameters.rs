//! Declared inputs of actions and export submodules
//!
//! Every action or export builds its parameter list once, at construction.
//! Callers walk that list in declaration order: [`Parameter::input`] tells
//! them what kind of input to offer, and the typed accessors read back what
//! was set.

use crate::modules::{Describable, ModuleError};
use glob::Pattern;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

type StringSupplier = Arc<dyn Fn() -> String + Send + Sync>;
type ChoicesSupplier = Arc<dyn Fn() -> Vec<String> + Send + Sync>;

/// A free-text (or choice) parameter
pub struct StringParameter {
    name: String,
    description: String,
    value: RwLock<Option<String>>,
    default: Option<StringSupplier>,
    choices: Option<ChoicesSupplier>,
    multiline: bool,
    separator: Option<String>,
    only_choices: bool,
}

impl StringParameter {
    #[must_use]
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            value: RwLock::new(None),
            default: None,
            choices: None,
            multiline: false,
            separator: None,
            only_choices: false,
        }
    }

    #[must_use]
    pub fn multiline(mut self) -> Self {
        self.multiline = true;
        self
    }

    /// Treat the value as a list split on `separator`
    #[must_use]
    pub fn list(mut self, separator: impl Into<String>) -> Self {
        self.separator = Some(separator.into());
        self
    }

    /// Value reported while nothing has been set
    #[must_use]
    pub fn default_value(mut self, supplier: impl Fn() -> String + Send + Sync + 'static) -> Self {
        self.default = Some(Arc::new(supplier));
        self
    }

    /// Suggested values, computed each time input is offered
    #[must_use]
    pub fn choices(mut self, supplier: impl Fn() -> Vec<String> + Send + Sync + 'static) -> Self {
        self.choices = Some(Arc::new(supplier));
        self
    }

    /// Restrict input to the suggested values
    #[must_use]
    pub fn only_choices(mut self) -> Self {
        self.only_choices = true;
        self
    }

    #[must_use]
    pub const fn is_multiline(&self) -> bool {
        self.multiline
    }

    #[must_use]
    pub const fn is_list(&self) -> bool {
        self.separator.is_some()
    }

    pub fn set(&self, value: impl Into<String>) {
        *self.value.write().unwrap_or_else(PoisonError::into_inner) = Some(value.into());
    }

    pub fn clear(&self) {
        *self.value.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// The set value, else the default, else the empty string
    #[must_use]
    pub fn value(&self) -> String {
        let current = self.value.read().unwrap_or_else(PoisonError::into_inner).clone();
        current
            .or_else(|| self.default.as_ref().map(|supplier| supplier()))
            .unwrap_or_default()
    }

    /// The value split on the list separator, trimmed, empty items dropped
    ///
    /// Non-list parameters yield their whole value (if not blank).
    #[must_use]
    pub fn values(&self) -> Vec<String> {
        let value = self.value();
        let items: Vec<&str> = match &self.separator {
            Some(separator) => value.split(separator.as_str()).collect(),
            None => vec![value.as_str()],
        };
        items
            .into_iter()
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(str::to_string)
            .collect()
    }

    #[must_use]
    pub fn suggestions(&self) -> Vec<String> {
        self.choices.as_ref().map(|supplier| supplier()).unwrap_or_default()
    }
}

impl Describable for StringParameter {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }
}

impl fmt::Debug for StringParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StringParameter")
            .field("name", &self.name)
            .field("multiline", &self.multiline)
            .field("separator", &self.separator)
            .field("only_choices", &self.only_choices)
            .finish_non_exhaustive()
    }
}

/// A path to read from or write to
#[derive(Debug)]
pub struct FileParameter {
    name: String,
    description: String,
    path: RwLock<Option<PathBuf>>,
    save: bool,
    extensions: Vec<String>,
}

impl FileParameter {
    /// A file to read
    #[must_use]
    pub fn open(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            path: RwLock::new(None),
            save: false,
            extensions: Vec::new(),
        }
    }

    /// A file to write
    #[must_use]
    pub fn save(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            save: true,
            ..Self::open(name, description)
        }
    }

    /// Accepted file-name globs such as `*.txt`
    #[must_use]
    pub fn extensions(mut self, globs: &[&str]) -> Self {
        self.extensions = globs.iter().map(|g| (*g).to_string()).collect();
        self
    }

    #[must_use]
    pub const fn is_save(&self) -> bool {
        self.save
    }

    #[must_use]
    pub fn allowed_extensions(&self) -> &[String] {
        &self.extensions
    }

    /// Whether the file name matches one of the allowed globs (or no globs are set)
    #[must_use]
    pub fn accepts(&self, path: &Path) -> bool {
        if self.extensions.is_empty() {
            return true;
        }
        let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
            return false;
        };
        self.extensions
            .iter()
            .filter_map(|glob| Pattern::new(glob).ok())
            .any(|pattern| pattern.matches(file_name))
    }

    /// Set the path
    ///
    /// # Errors
    ///
    /// Returns `ModuleError::InvalidParameter` if the file name does not match
    /// the allowed globs.
    pub fn set(&self, path: impl Into<PathBuf>) -> Result<(), ModuleError> {
        let path = path.into();
        if !self.accepts(&path) {
            return Err(ModuleError::InvalidParameter {
                name: self.name.clone(),
                reason: format!(
                    "{} does not match {}",
                    path.display(),
                    self.extensions.join(", ")
                ),
            });
        }
        *self.path.write().unwrap_or_else(PoisonError::into_inner) = Some(path);
        Ok(())
    }

    #[must_use]
    pub fn path(&self) -> Option<PathBuf> {
        self.path.read().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl Describable for FileParameter {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }
}

/// How a caller should ask for a parameter's value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParameterInput {
    Plain { multiline: bool },
    WithSuggestions { suggestions: Vec<String>, list: bool },
    OnlyChoices { choices: Vec<String> },
    File { save: bool, extensions: Vec<String> },
}

#[derive(Debug, Clone)]
pub enum Parameter {
    Text(Arc<StringParameter>),
    File(Arc<FileParameter>),
}

impl Parameter {
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Text(p) => p.name(),
            Self::File(p) => p.name(),
        }
    }

    #[must_use]
    pub fn description(&self) -> &str {
        match self {
            Self::Text(p) => p.description(),
            Self::File(p) => p.description(),
        }
    }

    #[must_use]
    pub fn input(&self) -> ParameterInput {
        match self {
            Self::Text(p) if p.only_choices => ParameterInput::OnlyChoices {
                choices: p.suggestions(),
            },
            Self::Text(p) if p.choices.is_some() => ParameterInput::WithSuggestions {
                suggestions: p.suggestions(),
                list: p.is_list(),
            },
            Self::Text(p) => ParameterInput::Plain {
                multiline: p.multiline,
            },
            Self::File(p) => ParameterInput::File {
                save: p.save,
                extensions: p.extensions.clone(),
            },
        }
    }

    /// Set the value from text input
    ///
    /// # Errors
    ///
    /// Returns `ModuleError::InvalidParameter` if the value is not acceptable.
    pub fn set_from_str(&self, value: &str) -> Result<(), ModuleError> {
        match self {
            Self::Text(p) => {
                if p.only_choices && !p.suggestions().iter().any(|c| c == value) {
                    return Err(ModuleError::InvalidParameter {
                        name: p.name.clone(),
                        reason: format!("'{value}' is not one of the allowed choices"),
                    });
                }
                p.set(value);
                Ok(())
            }
            Self::File(p) => p.set(value),
        }
    }

    /// The current value rendered as text
    #[must_use]
    pub fn display_value(&self) -> String {
        match self {
            Self::Text(p) => p.value(),
            Self::File(p) => p
                .path()
                .map(|path| path.display().to_string())
                .unwrap_or_default(),
        }
    }
}

impl From<Arc<StringParameter>> for Parameter {
    fn from(parameter: Arc<StringParameter>) -> Self {
        Self::Text(parameter)
    }
}

impl From<Arc<FileParameter>> for Parameter {
    fn from(parameter: Arc<FileParameter>) -> Self {
        Self::File(parameter)
    }
}
