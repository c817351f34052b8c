// Copyright AGNTCY Contributors (https://github.com/agntcy)
// SPDX-License-Identifier: Apache-2.0

pub mod errors;
pub mod testutils;
pub mod traits;
pub mod tracing_monitor;

pub use errors::MonitorError;
pub use traits::{Monitor, MonitorTransaction};
pub use tracing_monitor::TracingMonitor;

// Event names shared by the directory and the invoker
pub const EVENT_SERVICE_REGISTER: &str = "PigeonService.register";
pub const EVENT_SERVICE_UNREGISTER: &str = "PigeonService.unregister";
pub const EVENT_SERVICE_WEIGHT: &str = "PigeonService.weight";
pub const EVENT_SERVICE_PROTOCOL: &str = "PigeonService.protocol";
pub const EVENT_GOVERNOR_SET_HOSTS: &str = "PigeonGovernor.setHosts";
pub const EVENT_GOVERNOR_SET_WEIGHT: &str = "PigeonGovernor.setWeight";
pub const EVENT_GOVERNOR_DEL_SERVICE: &str = "PigeonGovernor.delService";
pub const TRANSACTION_FUTURE: &str = "PigeonFuture";
