// Copyright AGNTCY Contributors (https://github.com/agntcy)
// SPDX-License-Identifier: Apache-2.0

pub mod file;

use thiserror::Error;

pub use file::FileConfigProvider;

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("io error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Source of raw configuration content.
pub trait ConfigProvider {
    fn load(&self, path: &str) -> Result<String, ProviderError>;
}
