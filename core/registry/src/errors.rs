// Copyright AGNTCY Contributors (https://github.com/agntcy)
// SPDX-License-Identifier: Apache-2.0

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    // Input validation, never retried
    #[error("invalid weight {weight} for {address}")]
    InvalidWeight { address: String, weight: i32 },
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    // Backend selection
    #[error("failed to find registry extension type, please check dependencies")]
    NoBackend,
    #[error("registry not initialized")]
    NotInitialized,
    #[error("failed to initialize registry {name}: {reason}")]
    InitFailed { name: String, reason: String },

    // Backend operations
    #[error("registry backend error: {0}")]
    Backend(String),
    #[error("not found in registry: {0}")]
    NotFound(String),
}

impl RegistryError {
    /// Errors produced by rejecting caller input.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            RegistryError::InvalidWeight { .. } | RegistryError::InvalidAddress(_)
        )
    }
}
