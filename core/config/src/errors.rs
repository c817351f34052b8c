// Copyright AGNTCY Contributors (https://github.com/agntcy)
// SPDX-License-Identifier: Apache-2.0

use thiserror::Error;

use crate::provider::ProviderError;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("yaml parse error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("invalid configuration - expected a mapping at the top level")]
    InvalidYaml,

    #[error("invalid configuration - key {0} not valid")]
    InvalidKey(String),

    #[error("invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },
}
