// Copyright AGNTCY Contributors (https://github.com/agntcy)
// SPDX-License-Identifier: Apache-2.0

use std::collections::HashMap;

use crate::host::HeartBeatSupport;

/// Per-address change notifications pushed by the registry backend.
pub trait ServerInfoListener: Send + Sync {
    fn on_server_app_change(&self, server_address: &str, app: &str);

    fn on_server_version_change(&self, server_address: &str, version: &str);

    /// Full replacement of the service to protocol-support map of an address.
    fn on_server_protocol_change(&self, server_address: &str, protocols: HashMap<String, bool>);

    fn on_server_heartbeat_support_change(&self, server_address: &str, support: HeartBeatSupport);
}
