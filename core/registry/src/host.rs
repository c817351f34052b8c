// Copyright AGNTCY Contributors (https://github.com/agntcy)
// SPDX-License-Identifier: Apache-2.0

use std::fmt::{Display, Formatter};
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicI32, AtomicU8, Ordering};

use parking_lot::RwLock;

use crate::DEFAULT_WEIGHT;

/// Heartbeat mechanisms a server answers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum HeartBeatSupport {
    NoSupport = 0,
    /// Legacy point-to-point heartbeat only.
    P2POnly = 1,
    /// Registry scanner heartbeat only.
    ScannerOnly = 2,
    #[default]
    Both = 3,
}

impl HeartBeatSupport {
    pub fn value(self) -> u8 {
        self as u8
    }

    pub fn from_value(value: u8) -> Option<Self> {
        match value {
            0 => Some(HeartBeatSupport::NoSupport),
            1 => Some(HeartBeatSupport::P2POnly),
            2 => Some(HeartBeatSupport::ScannerOnly),
            3 => Some(HeartBeatSupport::Both),
            _ => None,
        }
    }
}

/// One server endpoint. Identity is `(host, port)`; the descriptive fields
/// are updated in place while the instance is shared between services.
#[derive(Debug)]
pub struct HostInfo {
    host: String,
    port: u16,
    weight: AtomicI32,
    app: RwLock<String>,
    version: RwLock<Option<String>>,
    heartbeat_support: AtomicU8,
}

impl HostInfo {
    pub fn new(host: impl Into<String>, port: u16, weight: i32) -> Self {
        HostInfo {
            host: host.into(),
            port,
            weight: AtomicI32::new(weight),
            app: RwLock::new(String::new()),
            version: RwLock::new(None),
            heartbeat_support: AtomicU8::new(HeartBeatSupport::default().value()),
        }
    }

    pub fn with_default_weight(host: impl Into<String>, port: u16) -> Self {
        HostInfo::new(host, port, DEFAULT_WEIGHT)
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// `host:port`, the key used by every address-indexed table.
    pub fn connect(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn weight(&self) -> i32 {
        self.weight.load(Ordering::Acquire)
    }

    pub fn set_weight(&self, weight: i32) {
        self.weight.store(weight, Ordering::Release);
    }

    pub fn app(&self) -> String {
        self.app.read().clone()
    }

    pub fn set_app(&self, app: impl Into<String>) {
        *self.app.write() = app.into();
    }

    /// Declared framework version, `None` until learned from the registry.
    pub fn version(&self) -> Option<String> {
        self.version.read().clone()
    }

    pub fn set_version(&self, version: impl Into<String>) {
        *self.version.write() = Some(version.into());
    }

    pub fn heartbeat_support(&self) -> HeartBeatSupport {
        HeartBeatSupport::from_value(self.heartbeat_support.load(Ordering::Acquire))
            .unwrap_or_default()
    }

    pub fn set_heartbeat_support(&self, support: HeartBeatSupport) {
        self.heartbeat_support
            .store(support.value(), Ordering::Release);
    }
}

impl PartialEq for HostInfo {
    fn eq(&self, other: &Self) -> bool {
        self.host == other.host && self.port == other.port
    }
}

impl Eq for HostInfo {}

impl Hash for HostInfo {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.host.hash(state);
        self.port.hash(state);
    }
}

impl Display for HostInfo {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{} (weight={}, app={})",
            self.host,
            self.port,
            self.weight(),
            self.app()
        )
    }
}
