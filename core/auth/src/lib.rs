// Copyright AGNTCY Contributors (https://github.com/agntcy)
// SPDX-License-Identifier: Apache-2.0

pub mod errors;
pub mod gate;
pub mod policy;
pub mod token;

pub use errors::SecurityError;
pub use gate::SecurityGate;

pub const KEY_APP_SECRETS: &str = "pigeon.provider.token.app.secrets";
pub const KEY_TOKEN_ENABLE: &str = "pigeon.provider.token.enable";
pub const KEY_TOKEN_SWITCHES: &str = "pigeon.provider.token.switches";
pub const KEY_TOKEN_PROTOCOL_DEFAULT_ENABLE: &str = "pigeon.provider.token.protocol.default.enable";
pub const KEY_TOKEN_TIMESTAMP_DIFF: &str = "pigeon.provider.token.timestamp.diff";
pub const KEY_ACCESS_IP_ENABLE: &str = "pigeon.provider.access.ip.enable";
pub const KEY_ACCESS_DEFAULT: &str = "pigeon.provider.access.ip.default";
pub const KEY_BLACKLIST: &str = "pigeon.provider.access.ip.blacklist";
pub const KEY_WHITELIST: &str = "pigeon.provider.access.ip.whitelist";

pub const DEFAULT_WHITELIST: &str = "127.0.0.1,";
pub const DEFAULT_TIMESTAMP_DIFF_SECS: i32 = 120;

/// Local context keys carrying the caller credentials.
pub const REQUEST_KEY_TOKEN: &str = "token";
pub const REQUEST_KEY_TIMESTAMP: &str = "timestamp";
pub const REQUEST_KEY_VERSION: &str = "version";
