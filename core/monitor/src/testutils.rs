// Copyright AGNTCY Contributors (https://github.com/agntcy)
// SPDX-License-Identifier: Apache-2.0

//! In-memory monitor used by tests across the workspace.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;

use crate::errors::MonitorError;
use crate::traits::{Monitor, MonitorTransaction};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedEvent {
    pub name: String,
    pub key: String,
    pub data: String,
}

#[derive(Debug, Clone, Default)]
pub struct RecordedTransaction {
    pub name: String,
    pub uri: String,
    pub data: Vec<(String, String)>,
    pub completions: usize,
}

#[derive(Debug, Default)]
struct Records {
    events: Mutex<Vec<RecordedEvent>>,
    transactions: Mutex<Vec<RecordedTransaction>>,
    errors: Mutex<Vec<MonitorError>>,
    fail_on_complete: AtomicBool,
}

/// Records every event and transaction. Clones share the same records.
#[derive(Debug, Default, Clone)]
pub struct RecordingMonitor {
    records: Arc<Records>,
}

impl RecordingMonitor {
    pub fn new() -> Self {
        RecordingMonitor::default()
    }

    /// Make every transaction completion fail with a sink error.
    pub fn fail_on_complete(&self, fail: bool) {
        self.records.fail_on_complete.store(fail, Ordering::SeqCst);
    }

    pub fn events(&self) -> Vec<RecordedEvent> {
        self.records.events.lock().clone()
    }

    pub fn events_named(&self, name: &str) -> Vec<RecordedEvent> {
        self.events().into_iter().filter(|e| e.name == name).collect()
    }

    pub fn transactions(&self) -> Vec<RecordedTransaction> {
        self.records.transactions.lock().clone()
    }

    pub fn errors(&self) -> Vec<MonitorError> {
        self.records.errors.lock().clone()
    }
}

impl Monitor for RecordingMonitor {
    fn log_event(&self, name: &str, key: &str, data: &str) {
        self.records.events.lock().push(RecordedEvent {
            name: name.to_string(),
            key: key.to_string(),
            data: data.to_string(),
        });
    }

    fn create_transaction(&self, name: &str, uri: &str) -> Box<dyn MonitorTransaction> {
        let index = {
            let mut transactions = self.records.transactions.lock();
            transactions.push(RecordedTransaction {
                name: name.to_string(),
                uri: uri.to_string(),
                ..Default::default()
            });
            transactions.len() - 1
        };
        Box::new(RecordingTransaction {
            name: name.to_string(),
            index,
            completed: false,
            records: self.records.clone(),
        })
    }

    fn log_monitor_error(&self, error: &MonitorError) {
        self.records.errors.lock().push(error.clone());
    }
}

struct RecordingTransaction {
    name: String,
    index: usize,
    completed: bool,
    records: Arc<Records>,
}

impl RecordingTransaction {
    fn with_record(&self, f: impl FnOnce(&mut RecordedTransaction)) {
        if let Some(t) = self.records.transactions.lock().get_mut(self.index) {
            f(t);
        }
    }
}

impl MonitorTransaction for RecordingTransaction {
    fn name(&self) -> &str {
        &self.name
    }

    fn set_status_ok(&mut self) {
        self.with_record(|t| t.data.push(("status".to_string(), "0".to_string())));
    }

    fn set_status_error(&mut self, error: &str) {
        let error = error.to_string();
        self.with_record(|t| t.data.push(("status".to_string(), error)));
    }

    fn add_data(&mut self, key: &str, value: &str) {
        let entry = (key.to_string(), value.to_string());
        self.with_record(|t| t.data.push(entry));
    }

    fn log_event(&mut self, name: &str, key: &str, data: &str) {
        self.records.events.lock().push(RecordedEvent {
            name: name.to_string(),
            key: key.to_string(),
            data: data.to_string(),
        });
    }

    fn complete(&mut self) -> Result<(), MonitorError> {
        self.with_record(|t| t.completions += 1);
        if self.records.fail_on_complete.load(Ordering::SeqCst) {
            return Err(MonitorError::Sink("complete failed".to_string()));
        }
        if self.completed {
            return Err(MonitorError::AlreadyCompleted(self.name.clone()));
        }
        self.completed = true;
        Ok(())
    }

    fn is_completed(&self) -> bool {
        self.completed
    }
}
