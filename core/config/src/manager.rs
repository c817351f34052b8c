// Copyright AGNTCY Contributors (https://github.com/agntcy)
// SPDX-License-Identifier: Apache-2.0

//! Process-wide configuration store.
//!
//! Values are plain strings and are read through typed accessors that fall
//! back to a default when the key is missing or unparseable. Every write is
//! published before the registered listeners are notified, so a listener that
//! reads the store back always observes the new value.

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::{Arc, Weak};

use parking_lot::{ReentrantMutex, RwLock};
use tracing::{debug, warn};

use crate::errors::ConfigError;
use crate::provider::ConfigProvider;

/// Receives notifications about configuration changes.
///
/// Implementations usually match keys by suffix so that environment prefixed
/// keys (`dev.pigeon.x`) reach the same handler as the bare key.
pub trait ConfigChangeListener: Send + Sync {
    fn on_key_updated(&self, key: &str, value: &str);

    fn on_key_added(&self, key: &str, value: &str) {
        let _ = (key, value);
    }

    fn on_key_removed(&self, key: &str) {
        let _ = key;
    }
}

enum Change<'a> {
    Added(&'a str, &'a str),
    Updated(&'a str, &'a str),
    Removed(&'a str),
}

pub struct ConfigManager {
    app_name: String,
    local_ip: String,
    values: RwLock<HashMap<String, String>>,
    local_values: RwLock<HashMap<String, String>>,
    listeners: RwLock<Vec<Weak<dyn ConfigChangeListener>>>,
    // held from the write until the last listener returns
    writer: ReentrantMutex<()>,
}

impl std::fmt::Debug for ConfigManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigManager")
            .field("app_name", &self.app_name)
            .field("local_ip", &self.local_ip)
            .field("values", &self.values.read().len())
            .field("local_values", &self.local_values.read().len())
            .field("listeners", &self.listeners.read().len())
            .finish()
    }
}

impl ConfigManager {
    pub fn new(app_name: impl Into<String>, local_ip: impl Into<String>) -> Self {
        ConfigManager {
            app_name: app_name.into(),
            local_ip: local_ip.into(),
            values: RwLock::new(HashMap::new()),
            local_values: RwLock::new(HashMap::new()),
            listeners: RwLock::new(Vec::new()),
            writer: ReentrantMutex::new(()),
        }
    }

    pub fn with_values<K, V>(self, values: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        {
            let mut map = self.values.write();
            for (k, v) in values {
                map.insert(k.into(), v.into());
            }
        }
        self
    }

    /// Name of the application running this process.
    pub fn app_name(&self) -> &str {
        &self.app_name
    }

    /// IP address other processes use to reach this one.
    pub fn local_ip(&self) -> &str {
        &self.local_ip
    }

    pub fn get_string_value(&self, key: &str) -> Option<String> {
        self.values.read().get(key).cloned()
    }

    pub fn get_string_value_or(&self, key: &str, default: &str) -> String {
        self.get_string_value(key)
            .unwrap_or_else(|| default.to_string())
    }

    pub fn get_bool_value(&self, key: &str, default: bool) -> bool {
        match self.values.read().get(key) {
            None => default,
            Some(v) => match v.trim().to_ascii_lowercase().as_str() {
                "true" => true,
                "false" => false,
                _ => {
                    warn!(%key, value = %v, "invalid boolean value, using default");
                    default
                }
            },
        }
    }

    pub fn get_int_value(&self, key: &str, default: i32) -> i32 {
        self.get_parsed(key, default)
    }

    pub fn get_long_value(&self, key: &str, default: i64) -> i64 {
        self.get_parsed(key, default)
    }

    fn get_parsed<T: FromStr + Copy>(&self, key: &str, default: T) -> T {
        match self.values.read().get(key) {
            None => default,
            Some(v) => v.trim().parse().unwrap_or_else(|_| {
                warn!(%key, value = %v, "invalid numeric value, using default");
                default
            }),
        }
    }

    /// Values that only exist on this host, never pushed by a remote source.
    pub fn get_local_string_value(&self, key: &str) -> Option<String> {
        self.local_values.read().get(key).cloned()
    }

    pub fn set_local_value(&self, key: impl Into<String>, value: impl Into<String>) {
        self.local_values.write().insert(key.into(), value.into());
    }

    /// Store a value and notify the listeners.
    pub fn set_value(&self, key: &str, value: &str) {
        let _writer = self.writer.lock();
        let previous = self
            .values
            .write()
            .insert(key.to_string(), value.to_string());

        match previous {
            None => self.notify(Change::Added(key, value)),
            Some(old) if old != value => self.notify(Change::Updated(key, value)),
            Some(_) => {}
        }
    }

    pub fn remove_value(&self, key: &str) {
        let _writer = self.writer.lock();
        if self.values.write().remove(key).is_some() {
            self.notify(Change::Removed(key));
        }
    }

    pub fn register_config_change_listener(&self, listener: &Arc<dyn ConfigChangeListener>) {
        self.listeners.write().push(Arc::downgrade(listener));
    }

    /// Load every entry exposed by `provider` for `path` into the store.
    ///
    /// Nested mappings are flattened with `.`, so `pigeon: {timeout: 10}`
    /// becomes `pigeon.timeout`. Returns the number of applied entries.
    pub fn load_from(&self, provider: &dyn ConfigProvider, path: &str) -> Result<usize, ConfigError> {
        let content = provider.load(path)?;
        let root: serde_yaml::Value = serde_yaml::from_str(&content)?;
        let mapping = root.as_mapping().ok_or(ConfigError::InvalidYaml)?;

        let mut entries = Vec::new();
        flatten("", mapping, &mut entries)?;

        let count = entries.len();
        for (key, value) in entries {
            self.set_value(&key, &value);
        }
        debug!(%path, %count, "configuration loaded");

        Ok(count)
    }

    fn notify(&self, change: Change<'_>) {
        // upgrade under the lock, call without it
        let listeners: Vec<Arc<dyn ConfigChangeListener>> = {
            let mut guard = self.listeners.write();
            guard.retain(|l| l.strong_count() > 0);
            guard.iter().filter_map(Weak::upgrade).collect()
        };

        for listener in listeners {
            match change {
                Change::Added(k, v) => listener.on_key_added(k, v),
                Change::Updated(k, v) => listener.on_key_updated(k, v),
                Change::Removed(k) => listener.on_key_removed(k),
            }
        }
    }
}

fn flatten(
    prefix: &str,
    mapping: &serde_yaml::Mapping,
    out: &mut Vec<(String, String)>,
) -> Result<(), ConfigError> {
    for (k, v) in mapping {
        let key = match k {
            serde_yaml::Value::String(s) => s.clone(),
            serde_yaml::Value::Number(n) => n.to_string(),
            serde_yaml::Value::Bool(b) => b.to_string(),
            other => return Err(ConfigError::InvalidKey(format!("{:?}", other))),
        };
        let full_key = if prefix.is_empty() {
            key
        } else {
            format!("{}.{}", prefix, key)
        };

        match v {
            serde_yaml::Value::Mapping(m) => flatten(&full_key, m, out)?,
            serde_yaml::Value::String(s) => out.push((full_key, s.clone())),
            serde_yaml::Value::Number(n) => out.push((full_key, n.to_string())),
            serde_yaml::Value::Bool(b) => out.push((full_key, b.to_string())),
            serde_yaml::Value::Null => out.push((full_key, String::new())),
            other => {
                return Err(ConfigError::InvalidValue {
                    key: full_key,
                    value: format!("{:?}", other),
                });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use tracing_test::traced_test;

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<String>>,
    }

    impl ConfigChangeListener for Recorder {
        fn on_key_updated(&self, key: &str, value: &str) {
            self.events.lock().push(format!("updated {}={}", key, value));
        }

        fn on_key_added(&self, key: &str, value: &str) {
            self.events.lock().push(format!("added {}={}", key, value));
        }

        fn on_key_removed(&self, key: &str) {
            self.events.lock().push(format!("removed {}", key));
        }
    }

    struct StaticProvider(&'static str);

    impl ConfigProvider for StaticProvider {
        fn load(&self, _path: &str) -> Result<String, crate::provider::ProviderError> {
            Ok(self.0.to_string())
        }
    }

    #[test]
    #[traced_test]
    fn test_typed_getters() {
        let config = ConfigManager::new("app", "10.0.0.1").with_values([
            ("b", "TRUE"),
            ("bad_bool", "yes"),
            ("i", " 42 "),
            ("bad_int", "forty"),
            ("l", "9000000000"),
        ]);

        assert!(config.get_bool_value("b", false));
        assert!(config.get_bool_value("bad_bool", true));
        assert!(!config.get_bool_value("missing", false));
        assert_eq!(config.get_int_value("i", 0), 42);
        assert_eq!(config.get_int_value("bad_int", 7), 7);
        assert_eq!(config.get_long_value("l", 0), 9_000_000_000);
        assert_eq!(config.get_string_value_or("missing", "x"), "x");
        assert_eq!(config.app_name(), "app");
        assert_eq!(config.local_ip(), "10.0.0.1");
        assert!(logs_contain("invalid boolean value"));
    }

    #[test]
    fn test_listener_notifications() {
        let config = ConfigManager::new("app", "127.0.0.1");
        let recorder = Arc::new(Recorder::default());
        let listener: Arc<dyn ConfigChangeListener> = recorder.clone();
        config.register_config_change_listener(&listener);

        config.set_value("k", "1");
        config.set_value("k", "1");
        config.set_value("k", "2");
        config.remove_value("k");
        config.remove_value("k");

        assert_eq!(
            *recorder.events.lock(),
            vec!["added k=1", "updated k=2", "removed k"]
        );
    }

    struct SlowApplier {
        entered: std::sync::atomic::AtomicBool,
        applied: Mutex<Vec<String>>,
    }

    impl ConfigChangeListener for SlowApplier {
        fn on_key_updated(&self, _key: &str, value: &str) {
            if value == "old" {
                self.entered
                    .store(true, std::sync::atomic::Ordering::SeqCst);
                std::thread::sleep(std::time::Duration::from_millis(200));
            }
            self.applied.lock().push(value.to_string());
        }

        fn on_key_added(&self, key: &str, value: &str) {
            self.on_key_updated(key, value);
        }
    }

    #[test]
    fn test_concurrent_writers_notify_in_store_order() {
        let config = Arc::new(ConfigManager::new("app", "127.0.0.1"));
        let applier = Arc::new(SlowApplier {
            entered: std::sync::atomic::AtomicBool::new(false),
            applied: Mutex::new(Vec::new()),
        });
        let listener: Arc<dyn ConfigChangeListener> = applier.clone();
        config.register_config_change_listener(&listener);

        let first = {
            let config = config.clone();
            std::thread::spawn(move || config.set_value("k", "old"))
        };
        while !applier.entered.load(std::sync::atomic::Ordering::SeqCst) {
            std::thread::yield_now();
        }
        let second = {
            let config = config.clone();
            std::thread::spawn(move || config.set_value("k", "new"))
        };
        first.join().unwrap();
        second.join().unwrap();

        assert_eq!(config.get_string_value("k").as_deref(), Some("new"));
        assert_eq!(*applier.applied.lock(), vec!["old", "new"]);
    }

    struct Mirror {
        config: Weak<ConfigManager>,
    }

    impl ConfigChangeListener for Mirror {
        fn on_key_updated(&self, key: &str, value: &str) {
            if key != "k" {
                return;
            }
            if let Some(config) = self.config.upgrade() {
                config.set_value("k.mirror", value);
            }
        }

        fn on_key_added(&self, key: &str, value: &str) {
            self.on_key_updated(key, value);
        }
    }

    #[test]
    fn test_listener_may_write_back() {
        let config = Arc::new(ConfigManager::new("app", "127.0.0.1"));
        let mirror: Arc<dyn ConfigChangeListener> = Arc::new(Mirror {
            config: Arc::downgrade(&config),
        });
        config.register_config_change_listener(&mirror);

        config.set_value("k", "v");
        assert_eq!(config.get_string_value("k.mirror").as_deref(), Some("v"));
    }

    #[test]
    fn test_dropped_listener_is_pruned() {
        let config = ConfigManager::new("app", "127.0.0.1");
        {
            let listener: Arc<dyn ConfigChangeListener> = Arc::new(Recorder::default());
            config.register_config_change_listener(&listener);
        }
        config.set_value("k", "v");
        assert!(config.listeners.read().is_empty());
    }

    #[test]
    fn test_local_values_are_separate() {
        let config = ConfigManager::new("app", "127.0.0.1");
        config.set_local_value("svc", "1.1.1.1:4040");
        assert_eq!(
            config.get_local_string_value("svc").as_deref(),
            Some("1.1.1.1:4040")
        );
        assert!(config.get_string_value("svc").is_none());
    }

    #[test]
    fn test_load_from_flattens_yaml() {
        let provider = StaticProvider(
            "pigeon:\n  registry:\n    customized: mock\n  timeout: 100\n  enable: true\nplain: x\n",
        );
        let config = ConfigManager::new("app", "127.0.0.1");
        let count = config.load_from(&provider, "ignored").unwrap();

        assert_eq!(count, 4);
        assert_eq!(
            config.get_string_value("pigeon.registry.customized").as_deref(),
            Some("mock")
        );
        assert_eq!(config.get_int_value("pigeon.timeout", 0), 100);
        assert!(config.get_bool_value("pigeon.enable", false));
        assert_eq!(config.get_string_value("plain").as_deref(), Some("x"));
    }

    #[test]
    fn test_load_from_rejects_sequences() {
        let provider = StaticProvider("list:\n  - a\n  - b\n");
        let config = ConfigManager::new("app", "127.0.0.1");
        let err = config.load_from(&provider, "ignored").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));

        let provider = StaticProvider("- a\n");
        let err = config.load_from(&provider, "ignored").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidYaml));
    }
}
