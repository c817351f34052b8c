// Copyright AGNTCY Contributors (https://github.com/agntcy)
// SPDX-License-Identifier: Apache-2.0

use std::sync::Arc;
use std::thread;
use std::time::{SystemTime, UNIX_EPOCH};

use pigeon_auth::{KEY_APP_SECRETS, KEY_TOKEN_ENABLE, SecurityError, SecurityGate, token};
use pigeon_config::ConfigManager;

fn now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs() as i64
}

#[test]
fn test_invoker_token_accepted_by_provider() {
    let config = Arc::new(ConfigManager::new("provider", "10.1.1.1").with_values([
        (KEY_TOKEN_ENABLE, "true"),
        (KEY_APP_SECRETS, "shop:0123456789abcdef"),
    ]));
    let gate = Arc::new(SecurityGate::new(config.clone()));
    gate.register();

    let ts = now();
    let token = token::generate("0123456789abcdef", "svc", "echo", ts).unwrap();
    let timestamp = ts.to_string();
    gate.authenticate_request_token(
        "shop",
        "10.0.0.9",
        Some(&timestamp),
        None,
        Some(&token),
        "svc",
        "echo",
    )
    .unwrap();

    // the app is dropped from the table on reload
    config.set_value(KEY_APP_SECRETS, "web:aaaaaaaaaaaaaaaa");
    let err = gate
        .authenticate_request_token(
            "shop",
            "10.0.0.9",
            Some(&timestamp),
            None,
            Some(&token),
            "svc",
            "echo",
        )
        .unwrap_err();
    assert_eq!(err, SecurityError::SecretNotFound("shop".to_string()));
}

#[test]
fn test_readers_see_whole_tables_during_reload() {
    let config = Arc::new(ConfigManager::new("provider", "10.1.1.1").with_values([
        (KEY_TOKEN_ENABLE, "true"),
        (KEY_APP_SECRETS, "a:0123456789abcdef,b:0123456789abcdef"),
    ]));
    let gate = Arc::new(SecurityGate::new(config.clone()));
    gate.register();

    let writer = {
        let config = config.clone();
        thread::spawn(move || {
            for i in 0..200 {
                if i % 2 == 0 {
                    config.set_value(KEY_APP_SECRETS, "c:0123456789abcdef,d:0123456789abcdef");
                } else {
                    config.set_value(KEY_APP_SECRETS, "a:0123456789abcdef,b:0123456789abcdef");
                }
            }
        })
    };

    let ts = now();
    let token = token::generate("0123456789abcdef", "svc", "echo", ts).unwrap();
    let timestamp = ts.to_string();
    for _ in 0..200 {
        let a = gate.authenticate_request_token("a", "1.1.1.1", Some(&timestamp), None, Some(&token), "svc", "echo");
        let c = gate.authenticate_request_token("c", "1.1.1.1", Some(&timestamp), None, Some(&token), "svc", "echo");
        // each lookup sees one complete table or the other
        assert!(a.is_ok() || a == Err(SecurityError::SecretNotFound("a".to_string())));
        assert!(c.is_ok() || c == Err(SecurityError::SecretNotFound("c".to_string())));
    }
    writer.join().unwrap();
}
