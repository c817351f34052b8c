// Copyright AGNTCY Contributors (https://github.com/agntcy)
// SPDX-License-Identifier: Apache-2.0

use std::collections::HashMap;
use std::sync::atomic::{AtomicU8, Ordering};

use serde::{Deserialize, Serialize};
use tracing::info;

use pigeon_config::configuration::Configuration;

use crate::domain::{CallMethod, SerializerType};
use crate::errors::RpcError;

pub const DEFAULT_TIMEOUT_MS: i32 = 5000;

fn default_timeout() -> i32 {
    DEFAULT_TIMEOUT_MS
}

/// Static description of a remote service as seen by the invoker.
///
/// Shared by every call to the service. The serializer is the only field that
/// changes at runtime, and only towards [`SerializerType::Hessian`].
#[derive(Debug, Deserialize, Serialize)]
pub struct InvokerConfig {
    url: String,

    #[serde(default = "default_timeout")]
    timeout_ms: i32,

    #[serde(default)]
    method_timeouts: HashMap<String, i32>,

    #[serde(default)]
    call_method: CallMethod,

    #[serde(default)]
    serializer: SerializerCell,
}

impl InvokerConfig {
    pub fn new(url: impl Into<String>) -> Self {
        InvokerConfig {
            url: url.into(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            method_timeouts: HashMap::new(),
            call_method: CallMethod::Sync,
            serializer: SerializerCell::default(),
        }
    }

    pub fn with_timeout(self, timeout_ms: i32) -> Self {
        InvokerConfig { timeout_ms, ..self }
    }

    pub fn with_method_timeout(mut self, method: impl Into<String>, timeout_ms: i32) -> Self {
        self.method_timeouts.insert(method.into(), timeout_ms);
        self
    }

    pub fn with_call_method(self, call_method: CallMethod) -> Self {
        InvokerConfig {
            call_method,
            ..self
        }
    }

    pub fn with_serializer(self, serializer: SerializerType) -> Self {
        InvokerConfig {
            serializer: SerializerCell::new(serializer),
            ..self
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn default_timeout(&self) -> i32 {
        self.timeout_ms
    }

    /// Configured timeout of `method`, the service default otherwise.
    pub fn timeout(&self, method: &str) -> i32 {
        self.method_timeouts
            .get(method)
            .copied()
            .unwrap_or(self.timeout_ms)
    }

    pub fn call_method(&self) -> CallMethod {
        self.call_method
    }

    pub fn serializer(&self) -> SerializerType {
        self.serializer.get()
    }

    /// Fall back to the legacy serializer for every later call.
    /// Returns true when the serializer actually changed.
    pub fn downgrade_serializer(&self) -> bool {
        let previous = self.serializer.replace(SerializerType::Hessian);
        if previous != SerializerType::Hessian {
            info!(url = %self.url, from = %previous, "serializer downgraded to hessian");
            return true;
        }
        false
    }
}

impl Configuration for InvokerConfig {
    type Error = RpcError;

    fn validate(&self) -> Result<(), Self::Error> {
        if self.url.trim().is_empty() {
            return Err(RpcError::Validation("service url is empty".to_string()));
        }
        if self.timeout_ms <= 0 {
            return Err(RpcError::Validation(format!(
                "invalid timeout {} for {}",
                self.timeout_ms, self.url
            )));
        }
        if let Some((method, timeout)) = self.method_timeouts.iter().find(|(_, t)| **t <= 0) {
            return Err(RpcError::Validation(format!(
                "invalid timeout {} for {}#{}",
                timeout, self.url, method
            )));
        }
        Ok(())
    }
}

/// Serializer slot readable and downgradable from any thread.
#[derive(Debug)]
struct SerializerCell(AtomicU8);

impl SerializerCell {
    fn new(serializer: SerializerType) -> Self {
        SerializerCell(AtomicU8::new(serializer.code()))
    }

    fn get(&self) -> SerializerType {
        SerializerType::from_code(self.0.load(Ordering::Acquire)).unwrap_or_default()
    }

    fn replace(&self, serializer: SerializerType) -> SerializerType {
        SerializerType::from_code(self.0.swap(serializer.code(), Ordering::AcqRel)).unwrap_or_default()
    }
}

impl Default for SerializerCell {
    fn default() -> Self {
        SerializerCell::new(SerializerType::default())
    }
}

impl Serialize for SerializerCell {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.get().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for SerializerCell {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        SerializerType::deserialize(deserializer).map(SerializerCell::new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_timeout() {
        let config = InvokerConfig::new("http://service.demo/echo")
            .with_timeout(1000)
            .with_method_timeout("slow", 3000);
        assert_eq!(config.timeout("slow"), 3000);
        assert_eq!(config.timeout("fast"), 1000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate() {
        assert!(InvokerConfig::new(" ").validate().is_err());
        assert!(InvokerConfig::new("svc").with_timeout(0).validate().is_err());
        let err = InvokerConfig::new("svc")
            .with_method_timeout("m", -1)
            .validate()
            .unwrap_err();
        assert!(err.to_string().contains("svc#m"));
    }

    #[test]
    fn test_downgrade_is_one_way() {
        let config = InvokerConfig::new("svc").with_serializer(SerializerType::Proto);
        assert_eq!(config.serializer(), SerializerType::Proto);
        assert!(config.downgrade_serializer());
        assert_eq!(config.serializer(), SerializerType::Hessian);
        assert!(!config.downgrade_serializer());
    }

    #[test]
    fn test_deserialize() {
        let config: InvokerConfig = serde_json::from_str(
            r#"{"url":"svc","serializer":"thrift","call_method":"oneway","method_timeouts":{"m":10}}"#,
        )
        .unwrap();
        assert_eq!(config.serializer(), SerializerType::Thrift);
        assert_eq!(config.call_method(), CallMethod::Oneway);
        assert_eq!(config.default_timeout(), DEFAULT_TIMEOUT_MS);
        assert_eq!(config.timeout("m"), 10);
    }
}
