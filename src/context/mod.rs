//! Shared context injected into every loader and module
//!
//! A [`ModuleContext`] bundles the store handle, the change-notification
//! [`EventBus`] and the [`DataSourceManager`] that import and export submodules
//! use to run commands on the inspected system. It is cheap to clone.

pub mod error;

pub use error::DataSourceError;

use crate::actions::ActionSettings;
use crate::store::Store;
use std::process::Command;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::debug;

/// Change notifications posted by submodules and actions
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelEvent {
    /// Tags were added or removed on `count` subjects
    TagsChanged { count: usize },
    /// An import submodule finished successfully
    Imported { submodule: String },
    /// An export submodule wrote its output
    Exported { submodule: String },
}

type Handler = Arc<dyn Fn(&ModelEvent) + Send + Sync>;

/// Synchronous publish/subscribe bus for [`ModelEvent`]s
#[derive(Default)]
pub struct EventBus {
    handlers: RwLock<Vec<Handler>>,
}

impl EventBus {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler; handlers run in subscription order
    pub fn subscribe(&self, handler: impl Fn(&ModelEvent) + Send + Sync + 'static) {
        self.handlers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Arc::new(handler));
    }

    /// Deliver `event` to the handlers subscribed when posting starts
    ///
    /// Handlers run without the lock held, so they may subscribe or post.
    pub fn post(&self, event: &ModelEvent) {
        debug!(?event, "posting model event");
        let handlers: Vec<Handler> = self
            .handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        for handler in &handlers {
            handler(event);
        }
    }
}

/// Something that can run commands on the inspected system
pub trait DataSource: Send + Sync {
    /// Run a command and return its standard output
    ///
    /// # Errors
    ///
    /// Returns `DataSourceError` if the command cannot be run or fails.
    fn execute(&self, command: &str) -> Result<String, DataSourceError>;
}

/// Runs commands on the local machine through `sh -c`
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalShell;

impl DataSource for LocalShell {
    fn execute(&self, command: &str) -> Result<String, DataSourceError> {
        let output = Command::new("sh")
            .arg("-c")
            .arg(command)
            .output()
            .map_err(|source| DataSourceError::Spawn {
                command: command.to_string(),
                source,
            })?;

        if !output.status.success() {
            return Err(DataSourceError::CommandFailed {
                command: command.to_string(),
                status: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        String::from_utf8(output.stdout).map_err(|_| DataSourceError::InvalidOutput(command.to_string()))
    }
}

/// Holds the currently active data source
#[derive(Default)]
pub struct DataSourceManager {
    active: RwLock<Option<Arc<dyn DataSource>>>,
}

impl DataSourceManager {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, source: Arc<dyn DataSource>) {
        *self.active.write().unwrap_or_else(PoisonError::into_inner) = Some(source);
    }

    pub fn clear(&self) {
        *self.active.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    #[must_use]
    pub fn active(&self) -> Option<Arc<dyn DataSource>> {
        self.active.read().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

/// Everything a module needs from its host
#[derive(Clone)]
pub struct ModuleContext {
    store: Arc<dyn Store>,
    events: Arc<EventBus>,
    data_sources: Arc<DataSourceManager>,
    actions: Arc<ActionSettings>,
}

impl ModuleContext {
    /// Context with a fresh event bus and no active data source
    #[must_use]
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self::with_parts(store, Arc::new(EventBus::new()), Arc::new(DataSourceManager::new()))
    }

    #[must_use]
    pub fn with_parts(
        store: Arc<dyn Store>,
        events: Arc<EventBus>,
        data_sources: Arc<DataSourceManager>,
    ) -> Self {
        Self {
            store,
            events,
            data_sources,
            actions: Arc::new(ActionSettings::default()),
        }
    }

    /// Replace the settings modules build their default actions from
    #[must_use]
    pub fn with_action_settings(mut self, settings: ActionSettings) -> Self {
        self.actions = Arc::new(settings);
        self
    }

    #[must_use]
    pub const fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }

    #[must_use]
    pub fn events(&self) -> &EventBus {
        &self.events
    }

    #[must_use]
    pub fn data_sources(&self) -> &DataSourceManager {
        &self.data_sources
    }

    #[must_use]
    pub fn action_settings(&self) -> &ActionSettings {
        &self.actions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ScriptedSource, mock_context};
    use std::sync::{Mutex, mpsc};
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_event_bus_delivers_in_order() {
        let bus = EventBus::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let first = Arc::clone(&seen);
        bus.subscribe(move |_| first.lock().unwrap().push("first"));
        let second = Arc::clone(&seen);
        bus.subscribe(move |_| second.lock().unwrap().push("second"));

        bus.post(&ModelEvent::TagsChanged { count: 1 });
        assert_eq!(*seen.lock().unwrap(), vec!["first", "second"]);
    }

    #[test]
    fn test_handler_may_subscribe_and_post() {
        let bus = Arc::new(EventBus::new());
        let late_hits = Arc::new(Mutex::new(0));

        let inner = Arc::clone(&bus);
        let counter = Arc::clone(&late_hits);
        bus.subscribe(move |event| {
            if let ModelEvent::TagsChanged { .. } = event {
                let counter = Arc::clone(&counter);
                inner.subscribe(move |_| *counter.lock().unwrap() += 1);
                inner.post(&ModelEvent::Exported {
                    submodule: "nested".to_string(),
                });
            }
        });

        let (done, finished) = mpsc::channel();
        let worker = Arc::clone(&bus);
        thread::spawn(move || {
            worker.post(&ModelEvent::TagsChanged { count: 1 });
            done.send(()).unwrap();
        });
        assert!(finished.recv_timeout(Duration::from_secs(5)).is_ok());

        // The late handler saw the nested post but not the outer one
        assert_eq!(*late_hits.lock().unwrap(), 1);
    }

    #[test]
    fn test_data_source_manager_set_and_clear() {
        let (ctx, _) = mock_context();
        assert!(ctx.data_sources().active().is_none());

        ctx.data_sources().set(Arc::new(ScriptedSource::new(&[("echo", "hi")])));
        let source = ctx.data_sources().active().unwrap();
        assert_eq!(source.execute("echo").unwrap(), "hi");

        ctx.data_sources().clear();
        assert!(ctx.data_sources().active().is_none());
    }

    #[cfg(unix)]
    #[test]
    fn test_local_shell_runs_command() {
        let out = LocalShell.execute("printf 'a\\nb'").unwrap();
        assert_eq!(out, "a\nb");
    }

    #[cfg(unix)]
    #[test]
    fn test_local_shell_reports_failure() {
        let result = LocalShell.execute("exit 3");
        assert!(matches!(
            result,
            Err(DataSourceError::CommandFailed { status: Some(3), .. })
        ));
    }

    #[test]
    fn test_context_clones_share_bus() {
        let (ctx, _) = mock_context();
        let clone = ctx.clone();
        let hits = Arc::new(Mutex::new(0));
        let counter = Arc::clone(&hits);
        ctx.events().subscribe(move |_| *counter.lock().unwrap() += 1);

        clone.events().post(&ModelEvent::Imported {
            submodule: "x".to_string(),
        });
        assert_eq!(*hits.lock().unwrap(), 1);
    }
}
