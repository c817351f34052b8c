// Copyright AGNTCY Contributors (https://github.com/agntcy)
// SPDX-License-Identifier: Apache-2.0

//! In-memory registry backend for tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use parking_lot::Mutex;

use crate::errors::RegistryError;
use crate::host::HeartBeatSupport;
use crate::registry::Registry;

#[derive(Debug, Default)]
struct State {
    // service?group -> address list
    services: HashMap<String, String>,
    weights: HashMap<String, i32>,
    apps: HashMap<String, String>,
    versions: HashMap<String, String>,
    heartbeat_support: HashMap<String, HeartBeatSupport>,
    heartbeats: HashMap<String, i64>,
    // address -> default protocol support
    protocols: HashMap<String, bool>,
    // address#service -> protocol support
    service_protocols: HashMap<String, bool>,
    calls: HashMap<&'static str, usize>,
}

/// Backend that keeps everything in memory and counts calls per operation.
#[derive(Debug)]
pub struct MockRegistry {
    name: String,
    state: Mutex<State>,
    failing: AtomicBool,
    fail_init: AtomicBool,
    inits: AtomicUsize,
}

impl MockRegistry {
    pub fn new(name: impl Into<String>) -> Self {
        MockRegistry {
            name: name.into(),
            state: Mutex::new(State::default()),
            failing: AtomicBool::new(false),
            fail_init: AtomicBool::new(false),
            inits: AtomicUsize::new(0),
        }
    }

    /// Every operation except `init` fails while set.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn set_fail_init(&self, fail: bool) {
        self.fail_init.store(fail, Ordering::SeqCst);
    }

    pub fn init_count(&self) -> usize {
        self.inits.load(Ordering::SeqCst)
    }

    /// Number of calls to the named trait method.
    pub fn calls(&self, operation: &str) -> usize {
        self.state.lock().calls.get(operation).copied().unwrap_or(0)
    }

    pub fn set_service_address(&self, service_key: &str, address: &str) {
        self.state
            .lock()
            .services
            .insert(service_key.to_string(), address.to_string());
    }

    pub fn set_protocol_support(&self, address: &str, service_name: &str, support: bool) {
        self.state
            .lock()
            .service_protocols
            .insert(format!("{}#{}", address, service_name), support);
    }

    pub fn set_address_protocol_support(&self, address: &str, support: bool) {
        self.state
            .lock()
            .protocols
            .insert(address.to_string(), support);
    }

    pub fn set_heartbeat_support(&self, address: &str, support: HeartBeatSupport) {
        self.state
            .lock()
            .heartbeat_support
            .insert(address.to_string(), support);
    }

    pub fn weight_of(&self, address: &str) -> Option<i32> {
        self.state.lock().weights.get(address).copied()
    }

    pub fn heartbeat_of(&self, address: &str) -> Option<i64> {
        self.state.lock().heartbeats.get(address).copied()
    }

    pub fn service_address(&self, service_key: &str) -> Option<String> {
        self.state.lock().services.get(service_key).cloned()
    }

    fn enter(&self, operation: &'static str) -> Result<parking_lot::MutexGuard<'_, State>, RegistryError> {
        let mut state = self.state.lock();
        *state.calls.entry(operation).or_default() += 1;
        if self.failing.load(Ordering::SeqCst) {
            return Err(RegistryError::Backend(format!("{} unavailable", operation)));
        }
        Ok(state)
    }
}

fn key(service_name: &str, group: &str) -> String {
    crate::utils::service_key(service_name, group)
}

impl Registry for MockRegistry {
    fn name(&self) -> &str {
        &self.name
    }

    fn init(&self) -> Result<(), RegistryError> {
        self.inits.fetch_add(1, Ordering::SeqCst);
        if self.fail_init.load(Ordering::SeqCst) {
            return Err(RegistryError::Backend(format!("{} cannot connect", self.name)));
        }
        Ok(())
    }

    fn get_service_address(
        &self,
        service_name: &str,
        group: &str,
        fallback_default_group: bool,
    ) -> Result<String, RegistryError> {
        let state = self.enter("get_service_address")?;
        if let Some(address) = state.services.get(&key(service_name, group)) {
            if !address.is_empty() {
                return Ok(address.clone());
            }
        }
        if fallback_default_group {
            return Ok(state.services.get(service_name).cloned().unwrap_or_default());
        }
        Ok(String::new())
    }

    fn get_server_weight(&self, server_address: &str) -> Result<i32, RegistryError> {
        let state = self.enter("get_server_weight")?;
        state
            .weights
            .get(server_address)
            .copied()
            .ok_or_else(|| RegistryError::NotFound(server_address.to_string()))
    }

    fn get_server_app(&self, server_address: &str) -> Result<String, RegistryError> {
        let state = self.enter("get_server_app")?;
        Ok(state.apps.get(server_address).cloned().unwrap_or_default())
    }

    fn get_server_version(&self, server_address: &str) -> Result<String, RegistryError> {
        let state = self.enter("get_server_version")?;
        state
            .versions
            .get(server_address)
            .cloned()
            .ok_or_else(|| RegistryError::NotFound(server_address.to_string()))
    }

    fn get_server_heartbeat_support(
        &self,
        server_address: &str,
    ) -> Result<HeartBeatSupport, RegistryError> {
        let state = self.enter("get_server_heartbeat_support")?;
        Ok(state
            .heartbeat_support
            .get(server_address)
            .copied()
            .unwrap_or_default())
    }

    fn is_support_new_protocol(&self, server_address: &str) -> Result<bool, RegistryError> {
        let state = self.enter("is_support_new_protocol")?;
        Ok(state.protocols.get(server_address).copied().unwrap_or(false))
    }

    fn is_support_new_protocol_for_service(
        &self,
        server_address: &str,
        service_name: &str,
    ) -> Result<bool, RegistryError> {
        let state = self.enter("is_support_new_protocol_for_service")?;
        Ok(state
            .service_protocols
            .get(&format!("{}#{}", server_address, service_name))
            .copied()
            .unwrap_or(false))
    }

    fn register_service(
        &self,
        service_name: &str,
        group: &str,
        server_address: &str,
        weight: i32,
    ) -> Result<(), RegistryError> {
        let mut state = self.enter("register_service")?;
        let entry = state.services.entry(key(service_name, group)).or_default();
        if !crate::utils::get_address_list(entry).iter().any(|a| a == server_address) {
            if entry.is_empty() {
                *entry = server_address.to_string();
            } else {
                entry.push(',');
                entry.push_str(server_address);
            }
        }
        state.weights.insert(server_address.to_string(), weight);
        Ok(())
    }

    fn unregister_service(
        &self,
        service_name: &str,
        group: &str,
        server_address: &str,
    ) -> Result<(), RegistryError> {
        let mut state = self.enter("unregister_service")?;
        if let Some(entry) = state.services.get_mut(&key(service_name, group)) {
            let remaining: Vec<String> = crate::utils::get_address_list(entry)
                .into_iter()
                .filter(|a| a != server_address)
                .collect();
            *entry = remaining.join(",");
        }
        Ok(())
    }

    fn set_server_weight(&self, server_address: &str, weight: i32) -> Result<(), RegistryError> {
        let mut state = self.enter("set_server_weight")?;
        state.weights.insert(server_address.to_string(), weight);
        Ok(())
    }

    fn set_server_app(&self, server_address: &str, app: &str) -> Result<(), RegistryError> {
        let mut state = self.enter("set_server_app")?;
        state
            .apps
            .insert(server_address.to_string(), app.to_string());
        Ok(())
    }

    fn unregister_server_app(&self, server_address: &str) -> Result<(), RegistryError> {
        let mut state = self.enter("unregister_server_app")?;
        state.apps.remove(server_address);
        Ok(())
    }

    fn set_server_version(
        &self,
        server_address: &str,
        version: &str,
    ) -> Result<(), RegistryError> {
        let mut state = self.enter("set_server_version")?;
        state
            .versions
            .insert(server_address.to_string(), version.to_string());
        Ok(())
    }

    fn unregister_server_version(&self, server_address: &str) -> Result<(), RegistryError> {
        let mut state = self.enter("unregister_server_version")?;
        state.versions.remove(server_address);
        Ok(())
    }

    fn set_support_new_protocol(
        &self,
        server_address: &str,
        service_name: &str,
        support: bool,
    ) -> Result<(), RegistryError> {
        let mut state = self.enter("set_support_new_protocol")?;
        state
            .service_protocols
            .insert(format!("{}#{}", server_address, service_name), support);
        Ok(())
    }

    fn unregister_support_new_protocol(
        &self,
        server_address: &str,
        service_name: &str,
        _support: bool,
    ) -> Result<(), RegistryError> {
        let mut state = self.enter("unregister_support_new_protocol")?;
        state
            .service_protocols
            .remove(&format!("{}#{}", server_address, service_name));
        Ok(())
    }

    fn update_heartbeat(
        &self,
        server_address: &str,
        heartbeat_millis: i64,
    ) -> Result<(), RegistryError> {
        let mut state = self.enter("update_heartbeat")?;
        state
            .heartbeats
            .insert(server_address.to_string(), heartbeat_millis);
        Ok(())
    }

    fn delete_heartbeat(&self, server_address: &str) -> Result<(), RegistryError> {
        let mut state = self.enter("delete_heartbeat")?;
        state.heartbeats.remove(server_address);
        Ok(())
    }

    fn set_server_service(
        &self,
        service_name: &str,
        group: &str,
        hosts: &str,
    ) -> Result<(), RegistryError> {
        let mut state = self.enter("set_server_service")?;
        let addresses = crate::utils::get_address_list(hosts);
        for address in &addresses {
            state.weights.insert(address.clone(), crate::DEFAULT_WEIGHT);
        }
        state
            .services
            .insert(key(service_name, group), addresses.join(","));
        Ok(())
    }

    fn set_hosts_weight(
        &self,
        _service_name: &str,
        _group: &str,
        hosts: &str,
        weight: i32,
    ) -> Result<(), RegistryError> {
        let mut state = self.enter("set_hosts_weight")?;
        for address in crate::utils::get_address_list(hosts) {
            state.weights.insert(address, weight);
        }
        Ok(())
    }

    fn del_server_service(&self, service_name: &str, group: &str) -> Result<(), RegistryError> {
        let mut state = self.enter("del_server_service")?;
        state.services.remove(&key(service_name, group));
        Ok(())
    }
}
