// Copyright AGNTCY Contributors (https://github.com/agntcy)
// SPDX-License-Identifier: Apache-2.0

pub mod directory;
pub mod errors;
pub mod host;
pub mod listener;
pub mod registry;
pub mod testutils;
pub mod utils;
pub mod version;

pub use directory::{ServiceDirectory, ServiceDirectoryBuilder};
pub use errors::RegistryError;
pub use host::{HeartBeatSupport, HostInfo};
pub use listener::ServerInfoListener;
pub use registry::Registry;

/// Configuration key selecting the active registry backend by name.
pub const KEY_REGISTRY_CUSTOMIZED: &str = "pigeon.registry.customized";
/// Enables local address overrides for referenced services.
pub const KEY_LOCAL_CONFIG: &str = "pigeon.registry.config.local";
/// Enables falling back to the default group when a group has no provider.
pub const KEY_GROUP_FALLBACK: &str = "pigeon.registry.group.fallback";

pub const REGISTRY_CURATOR_NAME: &str = "curator";
pub const DEFAULT_GROUP: &str = "";
pub const DEFAULT_WEIGHT: i32 = 1;
