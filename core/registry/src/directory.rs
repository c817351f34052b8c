// Copyright AGNTCY Contributors (https://github.com/agntcy)
// SPDX-License-Identifier: Apache-2.0

//! Process-local directory of the servers this process talks to.
//!
//! The directory caches per-address metadata (weight, app, version, heartbeat
//! capability) and per-(address, service) protocol support learned from the
//! active registry backend. Cached values are best effort: a missing entry
//! means unknown, never unsupported.
//!
//! Backend calls may block. Map guards are always released before a backend
//! is called and results are written back afterwards.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use parking_lot::RwLock;
use tracing::{debug, error, info, warn};

use pigeon_config::{ConfigChangeListener, ConfigManager};
use pigeon_monitor::{
    EVENT_GOVERNOR_DEL_SERVICE, EVENT_GOVERNOR_SET_HOSTS, EVENT_GOVERNOR_SET_WEIGHT,
    EVENT_SERVICE_PROTOCOL, EVENT_SERVICE_REGISTER, EVENT_SERVICE_UNREGISTER,
    EVENT_SERVICE_WEIGHT, Monitor,
};

use crate::errors::RegistryError;
use crate::host::{HeartBeatSupport, HostInfo};
use crate::listener::ServerInfoListener;
use crate::registry::Registry;
use crate::utils::{escape_service_name, get_address_list, service_key, validate_weight};
use crate::{
    DEFAULT_GROUP, DEFAULT_WEIGHT, KEY_GROUP_FALLBACK, KEY_LOCAL_CONFIG, KEY_REGISTRY_CUSTOMIZED,
    REGISTRY_CURATOR_NAME, version,
};

pub struct ServiceDirectoryBuilder {
    config: Arc<ConfigManager>,
    monitor: Arc<dyn Monitor>,
    backends: Vec<Arc<dyn Registry>>,
}

impl ServiceDirectoryBuilder {
    /// Add a backend to the list the active one is selected from.
    pub fn with_backend(mut self, backend: Arc<dyn Registry>) -> Self {
        self.backends.push(backend);
        self
    }

    /// Select and initialize the backend named by `pigeon.registry.customized`
    /// and publish the directory.
    ///
    /// A name that matches no backend yields a directory without an active
    /// backend, where provider and metadata calls are no-ops.
    pub fn build(self) -> Result<Arc<ServiceDirectory>, RegistryError> {
        if self.backends.is_empty() {
            return Err(RegistryError::NoBackend);
        }

        let name = self
            .config
            .get_string_value_or(KEY_REGISTRY_CUSTOMIZED, REGISTRY_CURATOR_NAME);

        let mut active = None;
        if let Some(backend) = self.backends.iter().find(|b| b.name() == name) {
            backend.init().map_err(|e| RegistryError::InitFailed {
                name: name.clone(),
                reason: e.to_string(),
            })?;
            info!(registry = %name, "registry started");
            active = Some(backend.clone());
        } else {
            warn!(registry = %name, "no registry backend matches the configured name");
        }

        let directory = Arc::new(ServiceDirectory {
            config: self.config.clone(),
            monitor: self.monitor,
            backends: self.backends,
            registry: RwLock::new(active),
            referenced_service_addresses: DashMap::new(),
            referenced_addresses: DashMap::new(),
            referenced_service_protocols: DashMap::new(),
            registered_services: DashMap::new(),
        });

        let listener: Arc<dyn ConfigChangeListener> = directory.clone();
        self.config.register_config_change_listener(&listener);

        Ok(directory)
    }
}

pub struct ServiceDirectory {
    config: Arc<ConfigManager>,
    monitor: Arc<dyn Monitor>,
    backends: Vec<Arc<dyn Registry>>,
    registry: RwLock<Option<Arc<dyn Registry>>>,

    // service -> addresses the invoker depends on
    referenced_service_addresses: DashMap<String, HashSet<Arc<HostInfo>>>,
    // address -> canonical record
    referenced_addresses: DashMap<String, Arc<HostInfo>>,
    // address -> (service -> protocol support)
    referenced_service_protocols: DashMap<String, Arc<DashMap<String, bool>>>,
    // provided service -> address
    registered_services: DashMap<String, String>,
}

impl std::fmt::Debug for ServiceDirectory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceDirectory")
            .field("registry", &self.registry().map(|r| r.name().to_string()))
            .field("referenced_services", &self.referenced_service_addresses.len())
            .field("referenced_addresses", &self.referenced_addresses.len())
            .field("registered_services", &self.registered_services.len())
            .finish()
    }
}

impl ServiceDirectory {
    pub fn builder(config: Arc<ConfigManager>, monitor: Arc<dyn Monitor>) -> ServiceDirectoryBuilder {
        ServiceDirectoryBuilder {
            config,
            monitor,
            backends: Vec::new(),
        }
    }

    /// The active backend, if any. The returned handle stays valid for the
    /// whole call even if the backend is swapped concurrently.
    pub fn registry(&self) -> Option<Arc<dyn Registry>> {
        self.registry.read().clone()
    }

    fn require_registry(&self) -> Result<Arc<dyn Registry>, RegistryError> {
        self.registry().ok_or(RegistryError::NotInitialized)
    }

    fn switch_registry(&self, name: &str) {
        let Some(backend) = self.backends.iter().find(|b| b.name() == name) else {
            warn!(registry = %name, "unknown registry backend, keeping the current one");
            return;
        };
        match backend.init() {
            Ok(()) => {
                *self.registry.write() = Some(backend.clone());
                info!(registry = %name, "changed to registry");
            }
            Err(e) => error!(registry = %name, error = %e, "failed to initialize registry"),
        }
    }

    pub fn get_referenced_services(&self) -> Vec<String> {
        self.referenced_service_addresses
            .iter()
            .map(|e| e.key().clone())
            .collect()
    }

    pub fn get_registered_services(&self) -> Vec<String> {
        self.registered_services
            .iter()
            .map(|e| e.key().clone())
            .collect()
    }

    pub fn is_referenced_service(&self, service_name: &str) -> bool {
        self.referenced_service_addresses.contains_key(service_name)
    }

    // invoker

    /// Add or replace `host:port` in the address set of `service_name`.
    ///
    /// The canonical record of an address is shared by every service that
    /// references it; a second add only updates its weight. Metadata lookups
    /// against the backend are best effort.
    pub fn add_service_address(
        &self,
        service_name: &str,
        host: &str,
        port: u16,
        weight: i32,
    ) -> Result<(), RegistryError> {
        validate_weight(host, port, weight)?;

        let address = format!("{}:{}", host, port);
        let (host_info, is_new) = match self.referenced_addresses.entry(address.clone()) {
            Entry::Occupied(e) => {
                let host_info = e.get().clone();
                host_info.set_weight(weight);
                (host_info, false)
            }
            Entry::Vacant(e) => {
                let host_info = Arc::new(HostInfo::new(host, port, weight));
                e.insert(host_info.clone());
                (host_info, true)
            }
        };

        self.referenced_service_addresses
            .entry(service_name.to_string())
            .or_default()
            .replace(host_info.clone());

        self.referenced_service_protocols
            .entry(address.clone())
            .or_insert_with(|| Arc::new(DashMap::new()));

        if let Err(e) = self.is_support_new_protocol_with(&address, service_name, false) {
            info!(%address, service = %service_name, error = %e, "failed to get protocol support");
        }

        if !is_new {
            return Ok(());
        }
        let Some(registry) = self.registry() else {
            return Ok(());
        };

        match registry.get_server_app(&address) {
            Ok(app) => host_info.set_app(app),
            Err(e) => info!(%address, error = %e, "failed to update app in cache"),
        }
        match registry.get_server_version(&address) {
            Ok(version) => host_info.set_version(version),
            Err(e) => info!(%address, error = %e, "failed to update version in cache"),
        }
        match registry.get_server_heartbeat_support(&address) {
            Ok(support) => host_info.set_heartbeat_support(support),
            Err(e) => info!(%address, error = %e, "failed to update heartbeat support in cache"),
        }

        Ok(())
    }

    /// Remove an address from a service. The canonical record is evicted
    /// once no service references the address anymore.
    pub fn remove_service_address(&self, service_name: &str, host_info: &HostInfo) {
        let removed = match self.referenced_service_addresses.get_mut(service_name) {
            Some(mut hosts) => hosts.remove(host_info),
            None => false,
        };
        if !removed {
            info!(address = %host_info.connect(), service = %service_name, "address not in service address list");
            return;
        }
        info!(address = %host_info.connect(), service = %service_name, "removed address");

        if !self.is_address_referenced(host_info) {
            let address = host_info.connect();
            self.referenced_addresses.remove(&address);
            self.referenced_service_protocols.remove(&address);
            debug!(%address, "evicted unreferenced address");
        }
    }

    fn is_address_referenced(&self, host_info: &HostInfo) -> bool {
        match self
            .referenced_service_addresses
            .iter()
            .find(|e| e.value().contains(host_info))
        {
            Some(e) => {
                info!(address = %host_info.connect(), service = %e.key(), "address still referenced");
                true
            }
            None => false,
        }
    }

    pub fn get_referenced_service_addresses(&self, service_name: &str) -> Vec<Arc<HostInfo>> {
        let hosts: Vec<Arc<HostInfo>> = self
            .referenced_service_addresses
            .get(service_name)
            .map(|hosts| hosts.iter().cloned().collect())
            .unwrap_or_default();
        if hosts.is_empty() {
            info!(service = %service_name, "empty address list");
        }
        hosts
    }

    pub fn get_all_referenced_service_addresses(&self) -> HashMap<String, Vec<Arc<HostInfo>>> {
        self.referenced_service_addresses
            .iter()
            .map(|e| (e.key().clone(), e.value().iter().cloned().collect()))
            .collect()
    }

    /// Resolve the address list of a service.
    ///
    /// A local override (when `pigeon.registry.config.local` is set) wins over
    /// the backend. Returns an empty string when nothing resolves.
    pub fn get_service_address(&self, service_name: &str, group: &str) -> Result<String, RegistryError> {
        if let Some(address) = self.get_local_service_address(service_name, group) {
            return Ok(address);
        }
        match self.registry() {
            Some(registry) => registry.get_service_address(service_name, group, self.fallback_default_group()),
            None => Ok(String::new()),
        }
    }

    pub fn get_service_address_for_app(
        &self,
        remote_app: &str,
        service_name: &str,
        group: &str,
    ) -> Result<String, RegistryError> {
        if let Some(address) = self.get_local_service_address(service_name, group) {
            return Ok(address);
        }
        match self.registry() {
            Some(registry) => registry.get_service_address_for_app(
                remote_app,
                service_name,
                group,
                self.fallback_default_group(),
            ),
            None => Ok(String::new()),
        }
    }

    pub fn get_service_address_list(
        &self,
        service_name: &str,
        group: &str,
    ) -> Result<Vec<String>, RegistryError> {
        let address = self.get_service_address(service_name, group)?;
        Ok(get_address_list(&address))
    }

    fn get_local_service_address(&self, service_name: &str, group: &str) -> Option<String> {
        if !self.config.get_bool_value(KEY_LOCAL_CONFIG, false) {
            return None;
        }
        let key = service_key(service_name, group);
        let address = self
            .config
            .get_local_string_value(&escape_service_name(&key))
            .or_else(|| self.config.get_local_string_value(&key))?;
        if address.trim().is_empty() {
            return None;
        }
        debug!(service = %service_name, %address, "service address from local config");
        Some(address)
    }

    fn fallback_default_group(&self) -> bool {
        self.config.get_bool_value(KEY_GROUP_FALLBACK, true)
    }

    pub fn get_service_weight_from_cache(&self, server_address: &str) -> i32 {
        self.referenced_addresses
            .get(server_address)
            .map(|h| h.weight())
            .unwrap_or(DEFAULT_WEIGHT)
    }

    /// Weight of an address, read from the cache first when `read_cache` is
    /// set, otherwise refreshed from the backend.
    pub fn get_service_weight(&self, server_address: &str, read_cache: bool) -> i32 {
        if read_cache {
            if let Some(host_info) = self.lookup(server_address) {
                return host_info.weight();
            }
        }

        let Some(registry) = self.registry() else {
            return DEFAULT_WEIGHT;
        };
        match registry.get_server_weight(server_address) {
            Ok(weight) => {
                if let Some(host_info) = self.lookup(server_address) {
                    host_info.set_weight(weight);
                }
                weight
            }
            Err(e) => {
                error!(address = %server_address, error = %e, "failed to get weight");
                DEFAULT_WEIGHT
            }
        }
    }

    /// Update the cached weight only. Nothing is written to the backend.
    pub fn set_service_weight(&self, server_address: &str, weight: i32) {
        let Some(host_info) = self.lookup(server_address) else {
            if !server_address.starts_with(self.config.local_ip()) {
                warn!(address = %server_address, "weight not found for address");
            }
            return;
        };
        host_info.set_weight(weight);
        info!(address = %server_address, %weight, "set weight");
    }

    fn lookup(&self, server_address: &str) -> Option<Arc<HostInfo>> {
        self.referenced_addresses
            .get(server_address)
            .map(|h| h.value().clone())
    }

    pub fn get_referenced_app_from_cache(&self, server_address: &str) -> String {
        self.lookup(server_address)
            .map(|h| h.app())
            .unwrap_or_default()
    }

    /// Refresh the app of an address from the backend.
    pub fn get_referenced_app(&self, server_address: &str) -> String {
        let Some(registry) = self.registry() else {
            return String::new();
        };
        match registry.get_server_app(server_address) {
            Ok(app) => {
                self.set_referenced_app(server_address, &app);
                app
            }
            Err(e) => {
                info!(address = %server_address, error = %e, "failed to update app in cache");
                String::new()
            }
        }
    }

    pub fn set_referenced_app(&self, server_address: &str, app: &str) {
        if let Some(host_info) = self.lookup(server_address) {
            host_info.set_app(app);
        }
    }

    pub fn get_referenced_version_from_cache(&self, server_address: &str) -> Option<String> {
        self.lookup(server_address).and_then(|h| h.version())
    }

    /// Refresh the declared version of an address from the backend.
    pub fn get_referenced_version(&self, server_address: &str) -> String {
        let Some(registry) = self.registry() else {
            return String::new();
        };
        match registry.get_server_version(server_address) {
            Ok(version) => {
                self.set_referenced_version(server_address, &version);
                version
            }
            Err(e) => {
                info!(address = %server_address, error = %e, "failed to update version in cache");
                String::new()
            }
        }
    }

    pub fn set_referenced_version(&self, server_address: &str, version: &str) {
        if let Some(host_info) = self.lookup(server_address) {
            host_info.set_version(version);
        }
    }

    pub fn get_server_heartbeat_support_from_cache(&self, server_address: &str) -> HeartBeatSupport {
        self.lookup(server_address)
            .map(|h| h.heartbeat_support())
            .unwrap_or_default()
    }

    pub fn get_server_heartbeat_support(&self, server_address: &str) -> HeartBeatSupport {
        let Some(registry) = self.registry() else {
            return HeartBeatSupport::default();
        };
        match registry.get_server_heartbeat_support(server_address) {
            Ok(support) => {
                self.set_server_heartbeat_support(server_address, support);
                support
            }
            Err(e) => {
                info!(address = %server_address, error = %e, "failed to update heartbeat support in cache");
                HeartBeatSupport::default()
            }
        }
    }

    pub fn set_server_heartbeat_support(&self, server_address: &str, support: HeartBeatSupport) {
        if let Some(host_info) = self.lookup(server_address) {
            host_info.set_heartbeat_support(support);
        }
    }

    /// Whether an address speaks the new protocol at all, judged from its
    /// declared version when known. Backend errors count as unsupported.
    pub fn is_support_new_protocol_by_address(&self, server_address: &str) -> bool {
        if let Some(version) = self.get_referenced_version_from_cache(server_address) {
            return version::is_thrift_supported(&version);
        }
        let Some(registry) = self.registry() else {
            return false;
        };
        registry
            .is_support_new_protocol(server_address)
            .unwrap_or_else(|e| {
                info!(address = %server_address, error = %e, "failed to get protocol support");
                false
            })
    }

    /// Cache-preferring protocol check for a service on an address: the
    /// per-pair cache, then the declared version, then a live backend query
    /// written back into the cache. Backend errors count as unsupported.
    pub fn is_support_new_protocol(&self, server_address: &str, service_name: &str) -> bool {
        if let Some(support) = self.cached_protocol(server_address, service_name) {
            return support;
        }
        if let Some(version) = self.get_referenced_version_from_cache(server_address) {
            return version::is_thrift_supported(&version);
        }
        self.is_support_new_protocol_with(server_address, service_name, false)
            .unwrap_or(false)
    }

    /// Protocol check that surfaces backend errors. With `read_cache` unset
    /// the backend is always queried and the cache updated.
    pub fn is_support_new_protocol_with(
        &self,
        server_address: &str,
        service_name: &str,
        read_cache: bool,
    ) -> Result<bool, RegistryError> {
        if read_cache {
            if let Some(support) = self.cached_protocol(server_address, service_name) {
                return Ok(support);
            }
        }

        let support = self
            .require_registry()
            .and_then(|r| r.is_support_new_protocol_for_service(server_address, service_name))
            .inspect_err(|e| {
                info!(address = %server_address, service = %service_name, error = %e, "failed to get protocol support");
            })?;
        self.set_referenced_protocol(server_address, service_name, support);

        Ok(support)
    }

    fn cached_protocol(&self, server_address: &str, service_name: &str) -> Option<bool> {
        self.protocol_map(server_address)
            .and_then(|m| m.get(service_name).map(|s| *s))
    }

    fn protocol_map(&self, server_address: &str) -> Option<Arc<DashMap<String, bool>>> {
        self.referenced_service_protocols
            .get(server_address)
            .map(|m| m.value().clone())
    }

    fn set_referenced_protocol(&self, server_address: &str, service_name: &str, support: bool) {
        if let Some(protocols) = self.protocol_map(server_address) {
            protocols.insert(service_name.to_string(), support);
        }
    }

    pub fn get_protocol_info_from_cache(&self, server_address: &str) -> HashMap<String, bool> {
        self.protocol_map(server_address)
            .map(|m| m.iter().map(|e| (e.key().clone(), *e.value())).collect())
            .unwrap_or_default()
    }

    pub fn is_support_new_protocol_from_cache(&self, server_address: &str, service_name: &str) -> bool {
        self.cached_protocol(server_address, service_name)
            .unwrap_or(false)
    }

    /// Refresh the protocol support of a service on an address.
    pub fn get_referenced_protocol(&self, server_address: &str, service_name: &str) -> bool {
        self.is_support_new_protocol_with(server_address, service_name, false)
            .unwrap_or(false)
    }

    // provider

    pub fn register_service(
        &self,
        service_name: &str,
        group: &str,
        server_address: &str,
        weight: i32,
    ) -> Result<(), RegistryError> {
        let Some(registry) = self.registry() else {
            return Ok(());
        };
        registry.register_service(service_name, group, server_address, weight)?;
        self.registered_services
            .entry(service_name.to_string())
            .or_insert_with(|| server_address.to_string());
        self.monitor.log_event(
            EVENT_SERVICE_REGISTER,
            service_name,
            &format!("weight={}&group={}", weight, group),
        );
        Ok(())
    }

    pub fn unregister_service(
        &self,
        service_name: &str,
        group: &str,
        server_address: &str,
    ) -> Result<(), RegistryError> {
        let Some(registry) = self.registry() else {
            return Ok(());
        };
        registry.unregister_service(service_name, group, server_address)?;
        self.registered_services.remove(service_name);
        self.monitor.log_event(
            EVENT_SERVICE_UNREGISTER,
            service_name,
            &format!("group={}", group),
        );
        Ok(())
    }

    pub fn unregister_service_default_group(
        &self,
        service_name: &str,
        server_address: &str,
    ) -> Result<(), RegistryError> {
        self.unregister_service(service_name, DEFAULT_GROUP, server_address)
    }

    pub fn set_server_weight(&self, server_address: &str, weight: i32) -> Result<(), RegistryError> {
        let Some(registry) = self.registry() else {
            return Ok(());
        };
        registry.set_server_weight(server_address, weight)?;
        self.monitor
            .log_event(EVENT_SERVICE_WEIGHT, &weight.to_string(), "");
        Ok(())
    }

    pub fn set_server_app(&self, server_address: &str, app: &str) -> Result<(), RegistryError> {
        match self.registry() {
            Some(registry) => registry.set_server_app(server_address, app),
            None => Ok(()),
        }
    }

    pub fn unregister_server_app(&self, server_address: &str) -> Result<(), RegistryError> {
        match self.registry() {
            Some(registry) => registry.unregister_server_app(server_address),
            None => Ok(()),
        }
    }

    pub fn set_server_version(&self, server_address: &str, version: &str) -> Result<(), RegistryError> {
        match self.registry() {
            Some(registry) => registry.set_server_version(server_address, version),
            None => Ok(()),
        }
    }

    pub fn unregister_server_version(&self, server_address: &str) -> Result<(), RegistryError> {
        match self.registry() {
            Some(registry) => registry.unregister_server_version(server_address),
            None => Ok(()),
        }
    }

    pub fn update_heartbeat(&self, server_address: &str, heartbeat_millis: i64) -> Result<(), RegistryError> {
        match self.registry() {
            Some(registry) => registry.update_heartbeat(server_address, heartbeat_millis),
            None => Ok(()),
        }
    }

    pub fn delete_heartbeat(&self, server_address: &str) -> Result<(), RegistryError> {
        match self.registry() {
            Some(registry) => registry.delete_heartbeat(server_address),
            None => Ok(()),
        }
    }

    /// Publish the protocol support of a provided service.
    pub fn register_support_new_protocol(
        &self,
        server_address: &str,
        service_name: &str,
        support: bool,
    ) -> Result<(), RegistryError> {
        if let Some(registry) = self.registry() {
            registry.set_support_new_protocol(server_address, service_name, support)?;
        }
        self.monitor.log_event(
            EVENT_SERVICE_PROTOCOL,
            service_name,
            &format!("support={}", support),
        );
        Ok(())
    }

    pub fn unregister_support_new_protocol(
        &self,
        server_address: &str,
        service_name: &str,
        support: bool,
    ) -> Result<(), RegistryError> {
        if let Some(registry) = self.registry() {
            registry.unregister_support_new_protocol(server_address, service_name, support)?;
        }
        self.monitor
            .log_event(EVENT_SERVICE_PROTOCOL, service_name, "unregister");
        Ok(())
    }

    // governor

    /// Replace the hosts of a service, resetting their weight to the default.
    pub fn set_server_service(&self, service_name: &str, group: &str, hosts: &str) -> Result<(), RegistryError> {
        if let Some(registry) = self.registry() {
            registry.set_server_service(service_name, group, hosts)?;
        }
        self.monitor.log_event(
            EVENT_GOVERNOR_SET_HOSTS,
            service_name,
            &format!("swimlane={}&hosts={}", group, hosts),
        );
        Ok(())
    }

    pub fn set_hosts_weight(
        &self,
        service_name: &str,
        group: &str,
        hosts: &str,
        weight: i32,
    ) -> Result<(), RegistryError> {
        if let Some(registry) = self.registry() {
            registry.set_hosts_weight(service_name, group, hosts, weight)?;
        }
        self.monitor
            .log_event(EVENT_GOVERNOR_SET_WEIGHT, hosts, &weight.to_string());
        Ok(())
    }

    pub fn del_server_service(&self, service_name: &str, group: &str) -> Result<(), RegistryError> {
        if let Some(registry) = self.registry() {
            registry.del_server_service(service_name, group)?;
        }
        self.monitor.log_event(
            EVENT_GOVERNOR_DEL_SERVICE,
            service_name,
            &format!("swimlane={}", group),
        );
        Ok(())
    }

    /// Hosts registered for exactly `service_name` in `group`, without
    /// falling back to the default group.
    pub fn get_service_hosts(&self, service_name: &str, group: &str) -> Result<String, RegistryError> {
        self.require_registry()
            .and_then(|r| r.get_service_address(service_name, group, false))
            .inspect_err(|e| {
                info!(service = %service_name, %group, error = %e, "failed to get service hosts");
            })
    }
}

impl ConfigChangeListener for ServiceDirectory {
    fn on_key_updated(&self, key: &str, value: &str) {
        if key.ends_with(KEY_REGISTRY_CUSTOMIZED) {
            self.switch_registry(value);
        }
    }

    fn on_key_added(&self, key: &str, value: &str) {
        self.on_key_updated(key, value);
    }
}

impl ServerInfoListener for ServiceDirectory {
    fn on_server_app_change(&self, server_address: &str, app: &str) {
        self.set_referenced_app(server_address, app);
    }

    fn on_server_version_change(&self, server_address: &str, version: &str) {
        self.set_referenced_version(server_address, version);
    }

    fn on_server_protocol_change(&self, server_address: &str, protocols: HashMap<String, bool>) {
        if !self.referenced_addresses.contains_key(server_address) {
            debug!(address = %server_address, "protocol change for unknown address ignored");
            return;
        }
        let protocols: DashMap<String, bool> = protocols.into_iter().collect();
        self.referenced_service_protocols
            .insert(server_address.to_string(), Arc::new(protocols));
    }

    fn on_server_heartbeat_support_change(&self, server_address: &str, support: HeartBeatSupport) {
        self.set_server_heartbeat_support(server_address, support);
    }
}
