// Copyright AGNTCY Contributors (https://github.com/agntcy)
// SPDX-License-Identifier: Apache-2.0

//! Contract of the monitoring sink.
//!
//! Callers must never let a monitoring failure change the outcome of the
//! operation being observed: errors returned here are logged and dropped.

use crate::errors::MonitorError;

pub trait Monitor: Send + Sync {
    /// Record a named point event.
    fn log_event(&self, name: &str, key: &str, data: &str);

    /// Open a transaction spanning an operation.
    fn create_transaction(&self, name: &str, uri: &str) -> Box<dyn MonitorTransaction>;

    /// Report a failure of the monitoring machinery itself.
    fn log_monitor_error(&self, error: &MonitorError);
}

pub trait MonitorTransaction: Send {
    fn name(&self) -> &str;

    fn set_status_ok(&mut self);

    fn set_status_error(&mut self, error: &str);

    fn add_data(&mut self, key: &str, value: &str);

    fn log_event(&mut self, name: &str, key: &str, data: &str);

    /// Close the transaction. A second call returns `AlreadyCompleted`.
    fn complete(&mut self) -> Result<(), MonitorError>;

    fn is_completed(&self) -> bool;
}
