// Copyright AGNTCY Contributors (https://github.com/agntcy)
// SPDX-License-Identifier: Apache-2.0

//! Contract implemented by the pluggable registry backends.
//!
//! Calls may block on network I/O. The directory never holds one of its own
//! locks while calling into a backend.

use crate::errors::RegistryError;
use crate::host::HeartBeatSupport;

pub trait Registry: Send + Sync {
    /// Name matched against `pigeon.registry.customized`.
    fn name(&self) -> &str;

    fn init(&self) -> Result<(), RegistryError>;

    // invoker

    fn get_service_address(
        &self,
        service_name: &str,
        group: &str,
        fallback_default_group: bool,
    ) -> Result<String, RegistryError>;

    /// Lookup restricted to the providers visible to `remote_app`. Backends
    /// without app routing answer the plain lookup.
    fn get_service_address_for_app(
        &self,
        remote_app: &str,
        service_name: &str,
        group: &str,
        fallback_default_group: bool,
    ) -> Result<String, RegistryError> {
        let _ = remote_app;
        self.get_service_address(service_name, group, fallback_default_group)
    }

    fn get_server_weight(&self, server_address: &str) -> Result<i32, RegistryError>;

    fn get_server_app(&self, server_address: &str) -> Result<String, RegistryError>;

    fn get_server_version(&self, server_address: &str) -> Result<String, RegistryError>;

    fn get_server_heartbeat_support(
        &self,
        server_address: &str,
    ) -> Result<HeartBeatSupport, RegistryError>;

    fn is_support_new_protocol(&self, server_address: &str) -> Result<bool, RegistryError>;

    fn is_support_new_protocol_for_service(
        &self,
        server_address: &str,
        service_name: &str,
    ) -> Result<bool, RegistryError>;

    // provider

    fn register_service(
        &self,
        service_name: &str,
        group: &str,
        server_address: &str,
        weight: i32,
    ) -> Result<(), RegistryError>;

    fn unregister_service(
        &self,
        service_name: &str,
        group: &str,
        server_address: &str,
    ) -> Result<(), RegistryError>;

    fn set_server_weight(&self, server_address: &str, weight: i32) -> Result<(), RegistryError>;

    fn set_server_app(&self, server_address: &str, app: &str) -> Result<(), RegistryError>;

    fn unregister_server_app(&self, server_address: &str) -> Result<(), RegistryError>;

    fn set_server_version(&self, server_address: &str, version: &str)
    -> Result<(), RegistryError>;

    fn unregister_server_version(&self, server_address: &str) -> Result<(), RegistryError>;

    fn set_support_new_protocol(
        &self,
        server_address: &str,
        service_name: &str,
        support: bool,
    ) -> Result<(), RegistryError>;

    fn unregister_support_new_protocol(
        &self,
        server_address: &str,
        service_name: &str,
        support: bool,
    ) -> Result<(), RegistryError>;

    fn update_heartbeat(
        &self,
        server_address: &str,
        heartbeat_millis: i64,
    ) -> Result<(), RegistryError>;

    fn delete_heartbeat(&self, server_address: &str) -> Result<(), RegistryError>;

    // governor

    fn set_server_service(
        &self,
        service_name: &str,
        group: &str,
        hosts: &str,
    ) -> Result<(), RegistryError>;

    fn set_hosts_weight(
        &self,
        service_name: &str,
        group: &str,
        hosts: &str,
        weight: i32,
    ) -> Result<(), RegistryError>;

    fn del_server_service(&self, service_name: &str, group: &str) -> Result<(), RegistryError>;
}
