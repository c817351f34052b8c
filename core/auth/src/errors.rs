// Copyright AGNTCY Contributors (https://github.com/agntcy)
// SPDX-License-Identifier: Apache-2.0

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SecurityError {
    // IP policy
    #[error("request ip {0} is not allowed")]
    IpDenied(String),

    // Token policy
    #[error("request app is required, from {from}")]
    AppRequired { from: String },
    #[error("secret not found for app {0}")]
    SecretNotFound(String),
    #[error("request token is required, from {from}@{app}")]
    TokenRequired { from: String, app: String },
    #[error("request timestamp is invalid: {timestamp}, from {from}@{app}")]
    InvalidTimestamp {
        timestamp: String,
        from: String,
        app: String,
    },
    #[error("the request has expired: {timestamp}, from {app}")]
    Expired { timestamp: String, app: String },
    #[error("invalid request token, from {from}@{app}")]
    InvalidToken { from: String, app: String },

    // Configuration
    #[error("invalid secret for app {app}: {reason}")]
    InvalidSecret { app: String, reason: String },
}
