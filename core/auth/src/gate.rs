// Copyright AGNTCY Contributors (https://github.com/agntcy)
// SPDX-License-Identifier: Apache-2.0

//! Provider-side authentication of callers.
//!
//! Two independent policies: an ip prefix policy and an HMAC token policy.
//! Their tables are immutable snapshots rebuilt from configuration and
//! published atomically, so a reader sees either the old or the new table.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use arc_swap::ArcSwap;
use tracing::{debug, error, info};

use pigeon_config::{ConfigChangeListener, ConfigManager};

use crate::errors::SecurityError;
use crate::policy::{can_access, parse_app_secrets, parse_ip_list, parse_token_switches};
use crate::{
    DEFAULT_TIMESTAMP_DIFF_SECS, DEFAULT_WHITELIST, KEY_ACCESS_DEFAULT, KEY_ACCESS_IP_ENABLE,
    KEY_APP_SECRETS, KEY_BLACKLIST, KEY_TOKEN_ENABLE, KEY_TOKEN_PROTOCOL_DEFAULT_ENABLE,
    KEY_TOKEN_SWITCHES, KEY_TOKEN_TIMESTAMP_DIFF, KEY_WHITELIST, token,
};

pub struct SecurityGate {
    config: Arc<ConfigManager>,
    app_secrets: ArcSwap<HashMap<String, String>>,
    token_switches: ArcSwap<HashMap<String, bool>>,
    ip_blacklist: ArcSwap<Vec<String>>,
    ip_whitelist: ArcSwap<Vec<String>>,
}

impl std::fmt::Debug for SecurityGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecurityGate")
            .field("apps", &self.app_secrets.load().len())
            .field("token_switches", &self.token_switches.load().len())
            .field("ip_blacklist", &self.ip_blacklist.load_full())
            .field("ip_whitelist", &self.ip_whitelist.load_full())
            .finish()
    }
}

fn current_time_secs() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or_default()
}

impl SecurityGate {
    /// Build the tables from the current configuration. Call
    /// [`SecurityGate::register`] to follow later changes.
    pub fn new(config: Arc<ConfigManager>) -> Self {
        let gate = SecurityGate {
            app_secrets: ArcSwap::from_pointee(HashMap::new()),
            token_switches: ArcSwap::from_pointee(HashMap::new()),
            ip_blacklist: ArcSwap::from_pointee(Vec::new()),
            ip_whitelist: ArcSwap::from_pointee(Vec::new()),
            config,
        };

        gate.reload_blacklist(&gate.config.get_string_value_or(KEY_BLACKLIST, ""));
        gate.reload_whitelist(&gate.config.get_string_value_or(KEY_WHITELIST, DEFAULT_WHITELIST));
        gate.reload_app_secrets(&gate.config.get_string_value_or(KEY_APP_SECRETS, ""));
        gate.reload_token_switches(&gate.config.get_string_value_or(KEY_TOKEN_SWITCHES, ""));

        gate
    }

    /// Subscribe the gate to configuration changes.
    pub fn register(self: &Arc<Self>) {
        let listener: Arc<dyn ConfigChangeListener> = self.clone();
        self.config.register_config_change_listener(&listener);
    }

    fn reload_blacklist(&self, config: &str) {
        self.ip_blacklist.store(Arc::new(parse_ip_list(config)));
    }

    fn reload_whitelist(&self, config: &str) {
        self.ip_whitelist.store(Arc::new(parse_ip_list(config)));
    }

    fn reload_app_secrets(&self, config: &str) {
        match parse_app_secrets(config) {
            Ok(secrets) => {
                debug!(apps = secrets.len(), "app secrets reloaded");
                self.app_secrets.store(Arc::new(secrets));
            }
            Err(e) => {
                error!(error = %e, "error while parsing app secret configuration, keeping previous secrets")
            }
        }
    }

    fn reload_token_switches(&self, config: &str) {
        self.token_switches
            .store(Arc::new(parse_token_switches(config)));
    }

    /// Whether the default (legacy) protocol channel is also subject to the
    /// token check.
    pub fn token_protocol_default_enabled(&self) -> bool {
        self.config
            .get_bool_value(KEY_TOKEN_PROTOCOL_DEFAULT_ENABLE, false)
    }

    pub fn authenticate_request_ip(&self, remote_address: &str) -> Result<(), SecurityError> {
        if !self.config.get_bool_value(KEY_ACCESS_IP_ENABLE, false) {
            return Ok(());
        }
        let allowed = can_access(
            remote_address,
            &self.ip_whitelist.load(),
            &self.ip_blacklist.load(),
            self.config.get_bool_value(KEY_ACCESS_DEFAULT, true),
        );
        if allowed {
            Ok(())
        } else {
            info!(%remote_address, "request ip denied");
            Err(SecurityError::IpDenied(remote_address.to_string()))
        }
    }

    /// The global token flag, overridden by `service#method` then `service`
    /// entries of the switch table.
    pub fn need_validate_token(&self, service_name: &str, method_name: &str) -> bool {
        if !self.config.get_bool_value(KEY_TOKEN_ENABLE, false) {
            return false;
        }
        let switches = self.token_switches.load();
        switches
            .get(&format!("{}#{}", service_name, method_name))
            .or_else(|| switches.get(service_name))
            .copied()
            .unwrap_or(true)
    }

    /// Check the caller credentials when the token policy applies to the
    /// service and method.
    #[allow(clippy::too_many_arguments)]
    pub fn authenticate_request_token(
        &self,
        app: &str,
        remote_address: &str,
        timestamp: Option<&str>,
        version: Option<&str>,
        token: Option<&str>,
        service_name: &str,
        method_name: &str,
    ) -> Result<(), SecurityError> {
        if !self.need_validate_token(service_name, method_name) {
            return Ok(());
        }
        self.check_token(
            app,
            remote_address,
            timestamp,
            version,
            token,
            service_name,
            method_name,
            current_time_secs(),
        )
    }

    #[allow(clippy::too_many_arguments)]
    fn check_token(
        &self,
        app: &str,
        remote_address: &str,
        timestamp: Option<&str>,
        version: Option<&str>,
        token: Option<&str>,
        service_name: &str,
        method_name: &str,
        now: i64,
    ) -> Result<(), SecurityError> {
        if app.trim().is_empty() {
            return Err(SecurityError::AppRequired {
                from: remote_address.to_string(),
            });
        }
        let secrets = self.app_secrets.load();
        let Some(secret) = secrets.get(app).filter(|s| !s.trim().is_empty()) else {
            return Err(SecurityError::SecretNotFound(app.to_string()));
        };

        let Some(token) = token.filter(|t| !t.trim().is_empty()) else {
            return Err(SecurityError::TokenRequired {
                from: remote_address.to_string(),
                app: app.to_string(),
            });
        };

        let time = timestamp
            .and_then(|t| t.parse::<i32>().ok())
            .unwrap_or(0);
        if time <= 0 {
            return Err(SecurityError::InvalidTimestamp {
                timestamp: timestamp.unwrap_or_default().to_string(),
                from: remote_address.to_string(),
                app: app.to_string(),
            });
        }

        let max_diff = self
            .config
            .get_int_value(KEY_TOKEN_TIMESTAMP_DIFF, DEFAULT_TIMESTAMP_DIFF_SECS);
        if (now - i64::from(time)).abs() > i64::from(max_diff) {
            return Err(SecurityError::Expired {
                timestamp: time.to_string(),
                app: app.to_string(),
            });
        }

        let data = token::token_data(service_name, method_name, i64::from(time));
        if !token::verify(&data, secret, token)? {
            return Err(SecurityError::InvalidToken {
                from: remote_address.to_string(),
                app: app.to_string(),
            });
        }

        debug!(%app, %remote_address, version = version.unwrap_or_default(), "request token accepted");
        Ok(())
    }
}

impl ConfigChangeListener for SecurityGate {
    fn on_key_updated(&self, key: &str, value: &str) {
        if key.ends_with(KEY_APP_SECRETS) {
            self.reload_app_secrets(value);
        } else if key.ends_with(KEY_BLACKLIST) {
            self.reload_blacklist(value);
        } else if key.ends_with(KEY_WHITELIST) {
            self.reload_whitelist(value);
        } else if key.ends_with(KEY_TOKEN_SWITCHES) {
            self.reload_token_switches(value);
        }
    }

    fn on_key_added(&self, key: &str, value: &str) {
        self.on_key_updated(key, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_test::traced_test;

    const SECRET: &str = "0123456789abcdef";
    const NOW: i64 = 1_700_000_000;

    fn gate(values: &[(&str, &str)]) -> (Arc<SecurityGate>, Arc<ConfigManager>) {
        let config = Arc::new(ConfigManager::new("provider", "10.1.1.1").with_values(values.iter().copied()));
        let gate = Arc::new(SecurityGate::new(config.clone()));
        gate.register();
        (gate, config)
    }

    fn token_gate() -> Arc<SecurityGate> {
        gate(&[
            (KEY_TOKEN_ENABLE, "true"),
            (KEY_APP_SECRETS, "shop:0123456789abcdef"),
        ])
        .0
    }

    fn check(gate: &SecurityGate, token: &str, service: &str, method: &str, ts: &str, now: i64) -> Result<(), SecurityError> {
        gate.check_token("shop", "10.0.0.9", Some(ts), Some("2.10.0"), Some(token), service, method, now)
    }

    #[test]
    fn test_ip_policy_disabled_allows_everything() {
        let (gate, _) = gate(&[(KEY_BLACKLIST, "10.")]);
        assert!(gate.authenticate_request_ip("10.0.0.1").is_ok());
    }

    #[test]
    fn test_ip_policy() {
        let (gate, config) = gate(&[
            (KEY_ACCESS_IP_ENABLE, "true"),
            (KEY_ACCESS_DEFAULT, "false"),
            (KEY_BLACKLIST, "192.168."),
        ]);
        // default whitelist
        assert!(gate.authenticate_request_ip("127.0.0.1").is_ok());
        assert_eq!(
            gate.authenticate_request_ip("192.168.0.3"),
            Err(SecurityError::IpDenied("192.168.0.3".to_string()))
        );
        assert!(gate.authenticate_request_ip("172.16.0.1").is_err());

        config.set_value(KEY_ACCESS_DEFAULT, "true");
        assert!(gate.authenticate_request_ip("172.16.0.1").is_ok());
    }

    #[test]
    fn test_ip_whitelist_checked_before_blacklist() {
        let (gate, _) = gate(&[
            (KEY_ACCESS_IP_ENABLE, "true"),
            (KEY_ACCESS_DEFAULT, "false"),
            (KEY_WHITELIST, "10.0."),
            (KEY_BLACKLIST, "10.0.5."),
        ]);
        // overlapping prefixes resolve to the whitelist
        assert!(gate.authenticate_request_ip("10.0.5.7").is_ok());
        assert!(gate.authenticate_request_ip("10.1.5.7").is_err());
    }

    #[test]
    fn test_ip_lists_hot_reload() {
        let (gate, config) = gate(&[(KEY_ACCESS_IP_ENABLE, "true")]);
        assert!(gate.authenticate_request_ip("10.0.0.1").is_ok());

        config.set_value(KEY_BLACKLIST, "10.0.");
        assert!(gate.authenticate_request_ip("10.0.0.1").is_err());
        config.set_value("dev.pigeon.provider.access.ip.whitelist", "10.0.0.");
        assert!(gate.authenticate_request_ip("10.0.0.1").is_ok());
    }

    #[test]
    fn test_need_validate_token() {
        let (gate, config) = gate(&[]);
        assert!(!gate.need_validate_token("svc", "echo"));

        config.set_value(KEY_TOKEN_ENABLE, "true");
        assert!(gate.need_validate_token("svc", "echo"));

        config.set_value(KEY_TOKEN_SWITCHES, "svc=false,svc#echo=true");
        assert!(gate.need_validate_token("svc", "echo"));
        assert!(!gate.need_validate_token("svc", "add"));
        assert!(gate.need_validate_token("other", "add"));

        config.set_value(KEY_TOKEN_ENABLE, "false");
        assert!(!gate.need_validate_token("svc", "echo"));
    }

    #[test]
    fn test_valid_token() {
        let gate = token_gate();
        let token = token::generate(SECRET, "svc", "echo", NOW).unwrap();
        assert!(check(&gate, &token, "svc", "echo", "1700000000", NOW).is_ok());
        assert!(check(&gate, &token, "svc", "echo", "1700000000", NOW + 120).is_ok());
        assert!(check(&gate, &token, "svc", "echo", "1700000000", NOW - 120).is_ok());
    }

    #[test]
    fn test_altered_token_fields_are_rejected() {
        let gate = token_gate();
        let token = token::generate(SECRET, "svc", "echo", NOW).unwrap();

        let mut altered = token.clone();
        let last = altered.pop().unwrap();
        altered.push(if last == 'A' { 'B' } else { 'A' });
        assert!(matches!(
            check(&gate, &altered, "svc", "echo", "1700000000", NOW),
            Err(SecurityError::InvalidToken { .. })
        ));
        assert!(matches!(
            check(&gate, &token, "svd", "echo", "1700000000", NOW),
            Err(SecurityError::InvalidToken { .. })
        ));
        assert!(matches!(
            check(&gate, &token, "svc", "echa", "1700000000", NOW),
            Err(SecurityError::InvalidToken { .. })
        ));
        assert!(matches!(
            check(&gate, &token, "svc", "echo", "1700000001", NOW),
            Err(SecurityError::InvalidToken { .. })
        ));
    }

    #[test]
    fn test_expired_timestamp_is_rejected() {
        let gate = token_gate();
        let token = token::generate(SECRET, "svc", "echo", NOW).unwrap();
        assert!(matches!(
            check(&gate, &token, "svc", "echo", "1700000000", NOW + 121),
            Err(SecurityError::Expired { .. })
        ));
        assert!(matches!(
            check(&gate, &token, "svc", "echo", "1700000000", NOW - 121),
            Err(SecurityError::Expired { .. })
        ));
    }

    #[test]
    fn test_missing_fields_are_rejected() {
        let gate = token_gate();
        let token = token::generate(SECRET, "svc", "echo", NOW).unwrap();

        assert!(matches!(
            gate.check_token("", "10.0.0.9", Some("1700000000"), None, Some(&token), "svc", "echo", NOW),
            Err(SecurityError::AppRequired { .. })
        ));
        assert_eq!(
            gate.check_token("cart", "10.0.0.9", Some("1700000000"), None, Some(&token), "svc", "echo", NOW),
            Err(SecurityError::SecretNotFound("cart".to_string()))
        );
        assert!(matches!(
            gate.check_token("shop", "10.0.0.9", Some("1700000000"), None, None, "svc", "echo", NOW),
            Err(SecurityError::TokenRequired { .. })
        ));
        for ts in [None, Some("abc"), Some("0"), Some("-5")] {
            assert!(matches!(
                gate.check_token("shop", "10.0.0.9", ts, None, Some(&token), "svc", "echo", NOW),
                Err(SecurityError::InvalidTimestamp { .. })
            ));
        }
    }

    #[test]
    fn test_token_skipped_when_disabled_for_method() {
        let (gate, _) = gate(&[
            (KEY_TOKEN_ENABLE, "true"),
            (KEY_TOKEN_SWITCHES, "svc#echo=false"),
        ]);
        assert!(
            gate.authenticate_request_token("", "10.0.0.9", None, None, None, "svc", "echo")
                .is_ok()
        );
        assert!(
            gate.authenticate_request_token("", "10.0.0.9", None, None, None, "svc", "add")
                .is_err()
        );
    }

    #[test]
    fn test_token_with_current_clock() {
        let gate = token_gate();
        let now = current_time_secs();
        let token = token::generate(SECRET, "svc", "echo", now).unwrap();
        assert!(
            gate.authenticate_request_token(
                "shop",
                "10.0.0.9",
                Some(&now.to_string()),
                None,
                Some(&token),
                "svc",
                "echo"
            )
            .is_ok()
        );
    }

    #[test]
    #[traced_test]
    fn test_secret_reload() {
        let (gate, config) = gate(&[(KEY_APP_SECRETS, "shop:0123456789abcdef,cart:fedcba9876543210")]);
        assert_eq!(gate.app_secrets.load().len(), 2);

        // one malformed pair, cart removed
        config.set_value(KEY_APP_SECRETS, "shop:0123456789abcdef,broken,web:aaaaaaaaaaaaaaaa");
        let secrets = gate.app_secrets.load_full();
        assert_eq!(secrets.len(), 2);
        assert!(secrets.contains_key("shop"));
        assert!(secrets.contains_key("web"));
        assert!(!secrets.contains_key("cart"));

        // short secret keeps the previous table
        config.set_value(KEY_APP_SECRETS, "shop:short");
        assert_eq!(gate.app_secrets.load().get("web").map(String::as_str), Some("aaaaaaaaaaaaaaaa"));
        assert!(logs_contain("error while parsing app secret configuration"));

        // blank clears
        config.set_value(KEY_APP_SECRETS, " ");
        assert!(gate.app_secrets.load().is_empty());
    }

    #[test]
    #[traced_test]
    fn test_invalid_initial_secrets() {
        let (gate, _) = gate(&[(KEY_APP_SECRETS, "shop:short")]);
        assert!(gate.app_secrets.load().is_empty());
        assert!(logs_contain("error while parsing app secret configuration"));
    }
}
