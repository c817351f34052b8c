// Copyright AGNTCY Contributors (https://github.com/agntcy)
// SPDX-License-Identifier: Apache-2.0

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MonitorError {
    #[error("transaction {0} already completed")]
    AlreadyCompleted(String),
    #[error("monitor sink error: {0}")]
    Sink(String),
}
