// Copyright AGNTCY Contributors (https://github.com/agntcy)
// SPDX-License-Identifier: Apache-2.0

use std::time::Instant;

use tracing::{debug, info, warn};

use crate::errors::MonitorError;
use crate::traits::{Monitor, MonitorTransaction};

/// Monitor that forwards everything to `tracing`.
#[derive(Debug, Default, Clone)]
pub struct TracingMonitor;

impl TracingMonitor {
    pub fn new() -> Self {
        TracingMonitor
    }
}

impl Monitor for TracingMonitor {
    fn log_event(&self, name: &str, key: &str, data: &str) {
        info!(target: "pigeon_monitor", event = %name, %key, %data, "monitor event");
    }

    fn create_transaction(&self, name: &str, uri: &str) -> Box<dyn MonitorTransaction> {
        Box::new(TracingTransaction::new(name, uri))
    }

    fn log_monitor_error(&self, error: &MonitorError) {
        warn!(target: "pigeon_monitor", %error, "monitor error");
    }
}

#[derive(Debug)]
struct TracingTransaction {
    name: String,
    uri: String,
    started: Instant,
    status: Option<String>,
    data: Vec<(String, String)>,
    completed: bool,
}

impl TracingTransaction {
    fn new(name: &str, uri: &str) -> Self {
        TracingTransaction {
            name: name.to_string(),
            uri: uri.to_string(),
            started: Instant::now(),
            status: None,
            data: Vec::new(),
            completed: false,
        }
    }
}

impl MonitorTransaction for TracingTransaction {
    fn name(&self) -> &str {
        &self.name
    }

    fn set_status_ok(&mut self) {
        self.status = Some("0".to_string());
    }

    fn set_status_error(&mut self, error: &str) {
        self.status = Some(error.to_string());
    }

    fn add_data(&mut self, key: &str, value: &str) {
        self.data.push((key.to_string(), value.to_string()));
    }

    fn log_event(&mut self, name: &str, key: &str, data: &str) {
        debug!(
            target: "pigeon_monitor",
            transaction = %self.name,
            event = %name,
            %key,
            %data,
            "transaction event"
        );
    }

    fn complete(&mut self) -> Result<(), MonitorError> {
        if self.completed {
            return Err(MonitorError::AlreadyCompleted(self.name.clone()));
        }
        self.completed = true;

        debug!(
            target: "pigeon_monitor",
            transaction = %self.name,
            uri = %self.uri,
            status = ?self.status,
            data = ?self.data,
            elapsed_ms = self.started.elapsed().as_millis() as u64,
            "transaction completed"
        );
        Ok(())
    }

    fn is_completed(&self) -> bool {
        self.completed
    }
}
