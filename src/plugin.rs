//! The process-wide plugin registry (§4.10, §7).
//!
//! Grounded on the same name-keyed, lock-guarded singleton shape as
//! [`crate::reflect::type_info::Registry`]; a plugin's lifecycle
//! (`load` → `enable`/`disable` → `unload`) is tracked per entry rather than
//! encoded in the map's shape, since unlike reflected types a plugin is
//! mutable state a caller can legitimately flip back and forth.

use std::collections::HashMap;

use parking_lot::Mutex;

use crate::error::{Error, Result};

/// A unit of externally-supplied behavior hooked into the plugin
/// lifecycle. Implementors typically subscribe to [`crate::dispatch`]
/// events or a [`crate::dispatch::MessageQueue`] in `on_load`.
pub trait Plugin: Send + 'static {
    /// The plugin's registered name. Must be stable for the plugin's
    /// lifetime.
    fn name(&self) -> &str;

    /// Called once, when the plugin transitions from unloaded to loaded.
    /// An `Err` aborts the load and the plugin is not registered.
    fn on_load(&mut self) -> Result<()> {
        Ok(())
    }

    /// Called once, when the plugin is unloaded. Infallible: unloading
    /// always succeeds once a plugin is found.
    fn on_unload(&mut self) {}

    /// Called when the plugin transitions from disabled (or just-loaded)
    /// to enabled. An `Err` aborts the transition.
    fn on_enable(&mut self) -> Result<()> {
        Ok(())
    }

    /// Called when the plugin transitions from enabled to disabled.
    fn on_disable(&mut self) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Loaded,
    Enabled,
    Disabled,
}

struct Entry {
    plugin: Box<dyn Plugin>,
    state: State,
}

struct Registry {
    plugins: Mutex<HashMap<String, Entry>>,
}

static REGISTRY: once_cell::sync::Lazy<Registry> = once_cell::sync::Lazy::new(|| Registry {
    plugins: Mutex::new(HashMap::new()),
});

/// Loads `plugin`, running its `on_load` hook. Logs and returns
/// [`Error::PluginTransition`] if a plugin with the same name is already
/// loaded; logs and returns [`Error::PluginUserError`] if `on_load` fails.
pub fn load(mut plugin: Box<dyn Plugin>) -> Result<()> {
    let name = plugin.name().to_string();
    let mut plugins = REGISTRY.plugins.lock();
    if plugins.contains_key(&name) {
        log::warn!("plugin `{name}` is already loaded");
        return Err(Error::PluginTransition {
            name,
            state: "loaded",
        });
    }
    if let Err(err) = plugin.on_load() {
        log::error!("plugin `{name}` failed to load: {err}");
        return Err(Error::PluginUserError {
            name,
            message: err.to_string(),
        });
    }
    log::debug!("plugin `{name}` loaded");
    plugins.insert(
        name,
        Entry {
            plugin,
            state: State::Loaded,
        },
    );
    Ok(())
}

/// Unloads the plugin named `name`, running `on_unload`. Logs and returns
/// [`Error::PluginTransition`] if no such plugin is loaded.
pub fn unload(name: &str) -> Result<()> {
    let mut plugins = REGISTRY.plugins.lock();
    match plugins.remove(name) {
        Some(mut entry) => {
            entry.plugin.on_unload();
            log::debug!("plugin `{name}` unloaded");
            Ok(())
        }
        None => {
            log::warn!("unload: no plugin named `{name}` is loaded");
            Err(Error::PluginTransition {
                name: name.to_string(),
                state: "unloaded",
            })
        }
    }
}

/// Enables the plugin named `name`. Idempotent-as-error: returns
/// [`Error::PluginTransition`] if it is already enabled.
pub fn enable(name: &str) -> Result<()> {
    let mut plugins = REGISTRY.plugins.lock();
    let entry = plugins.get_mut(name).ok_or_else(|| {
        log::warn!("enable: no plugin named `{name}` is loaded");
        Error::PluginTransition {
            name: name.to_string(),
            state: "unloaded",
        }
    })?;
    if entry.state == State::Enabled {
        log::warn!("plugin `{name}` is already enabled");
        return Err(Error::PluginTransition {
            name: name.to_string(),
            state: "enabled",
        });
    }
    if let Err(err) = entry.plugin.on_enable() {
        log::error!("plugin `{name}` failed to enable: {err}");
        return Err(Error::PluginUserError {
            name: name.to_string(),
            message: err.to_string(),
        });
    }
    entry.state = State::Enabled;
    Ok(())
}

/// Disables the plugin named `name`. Idempotent-as-error: returns
/// [`Error::PluginTransition`] if it is already disabled (or was never
/// enabled).
pub fn disable(name: &str) -> Result<()> {
    let mut plugins = REGISTRY.plugins.lock();
    let entry = plugins.get_mut(name).ok_or_else(|| {
        log::warn!("disable: no plugin named `{name}` is loaded");
        Error::PluginTransition {
            name: name.to_string(),
            state: "unloaded",
        }
    })?;
    if entry.state != State::Enabled {
        log::warn!("plugin `{name}` is already disabled");
        return Err(Error::PluginTransition {
            name: name.to_string(),
            state: "disabled",
        });
    }
    entry.plugin.on_disable();
    entry.state = State::Disabled;
    Ok(())
}

pub fn is_loaded(name: &str) -> bool {
    REGISTRY.plugins.lock().contains_key(name)
}

pub fn is_enabled(name: &str) -> bool {
    REGISTRY
        .plugins
        .lock()
        .get(name)
        .is_some_and(|e| e.state == State::Enabled)
}

/// Names of every currently-loaded plugin, in no particular order.
pub fn loaded_plugins() -> Vec<String> {
    REGISTRY.plugins.lock().keys().cloned().collect()
}

/// Unloads every plugin, running each `on_unload`. Intended for test
/// isolation, mirroring [`crate::reflect::type_info::Registry::reset`].
pub fn reset() {
    let mut plugins = REGISTRY.plugins.lock();
    for (_, mut entry) in plugins.drain() {
        entry.plugin.on_unload();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    struct Tracker {
        name: &'static str,
        enabled: Arc<AtomicBool>,
    }

    impl Plugin for Tracker {
        fn name(&self) -> &str {
            self.name
        }
        fn on_enable(&mut self) -> Result<()> {
            self.enabled.store(true, Ordering::SeqCst);
            Ok(())
        }
        fn on_disable(&mut self) {
            self.enabled.store(false, Ordering::SeqCst);
        }
    }

    #[test]
    fn load_enable_disable_unload_cycle() {
        reset();
        let flag = Arc::new(AtomicBool::new(false));
        load(Box::new(Tracker {
            name: "tracker-a",
            enabled: flag.clone(),
        }))
        .unwrap();
        assert!(is_loaded("tracker-a"));
        enable("tracker-a").unwrap();
        assert!(flag.load(Ordering::SeqCst));
        assert!(is_enabled("tracker-a"));
        disable("tracker-a").unwrap();
        assert!(!flag.load(Ordering::SeqCst));
        unload("tracker-a").unwrap();
        assert!(!is_loaded("tracker-a"));
    }

    #[test]
    fn duplicate_enable_is_an_error() {
        reset();
        load(Box::new(Tracker {
            name: "tracker-b",
            enabled: Arc::new(AtomicBool::new(false)),
        }))
        .unwrap();
        enable("tracker-b").unwrap();
        assert!(matches!(
            enable("tracker-b"),
            Err(Error::PluginTransition { .. })
        ));
    }

    #[test]
    fn unknown_plugin_operations_error() {
        reset();
        assert!(matches!(
            enable("does-not-exist"),
            Err(Error::PluginTransition { .. })
        ));
        assert!(matches!(
            unload("does-not-exist"),
            Err(Error::PluginTransition { .. })
        ));
    }
}
