// Copyright AGNTCY Contributors (https://github.com/agntcy)
// SPDX-License-Identifier: Apache-2.0

//! Parsing of the security tables from their configuration strings.

use std::collections::HashMap;

use crate::errors::SecurityError;
use crate::token::MIN_SECRET_LEN;

/// Comma separated ip prefixes, blank entries dropped.
pub fn parse_ip_list(config: &str) -> Vec<String> {
    config
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// `app:secret,app:secret`. Entries that are not exactly one pair are
/// skipped; a secret shorter than 16 characters rejects the whole table.
pub fn parse_app_secrets(config: &str) -> Result<HashMap<String, String>, SecurityError> {
    let mut secrets = HashMap::new();
    for entry in config.split(',').filter(|s| !s.trim().is_empty()) {
        let pair: Vec<&str> = entry.split(':').collect();
        let [app, secret] = pair.as_slice() else {
            continue;
        };
        let (app, secret) = (app.trim(), secret.trim());
        if secret.chars().count() < MIN_SECRET_LEN {
            return Err(SecurityError::InvalidSecret {
                app: app.to_string(),
                reason: format!("length must not be less than {}", MIN_SECRET_LEN),
            });
        }
        secrets.insert(app.to_string(), secret.to_string());
    }
    Ok(secrets)
}

/// `service[#method]=true|false`. Any value other than `true` (ignoring
/// case) disables the token check.
pub fn parse_token_switches(config: &str) -> HashMap<String, bool> {
    config
        .split(',')
        .filter_map(|entry| {
            let pair: Vec<&str> = entry.split('=').collect();
            let [key, value] = pair.as_slice() else {
                return None;
            };
            let (key, value) = (key.trim(), value.trim());
            if key.is_empty() || value.is_empty() {
                return None;
            }
            Some((key.to_string(), value.eq_ignore_ascii_case("true")))
        })
        .collect()
}

/// Evaluate the ip prefix lists. The whitelist is consulted first, so an
/// address matching both lists is allowed.
pub fn can_access(ip: &str, whitelist: &[String], blacklist: &[String], default_allow: bool) -> bool {
    if whitelist.iter().any(|prefix| ip.starts_with(prefix.as_str())) {
        return true;
    }
    if blacklist.iter().any(|prefix| ip.starts_with(prefix.as_str())) {
        return false;
    }
    default_allow
}
