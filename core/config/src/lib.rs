// Copyright AGNTCY Contributors (https://github.com/agntcy)
// SPDX-License-Identifier: Apache-2.0

pub mod configuration;
pub mod errors;
pub mod manager;
pub mod provider;

pub use errors::ConfigError;
pub use manager::{ConfigChangeListener, ConfigManager};
