// Copyright AGNTCY Contributors (https://github.com/agntcy)
// SPDX-License-Identifier: Apache-2.0

use std::sync::Arc;
use std::thread;

use pigeon_config::ConfigManager;
use pigeon_monitor::testutils::RecordingMonitor;
use pigeon_registry::testutils::MockRegistry;
use pigeon_registry::{HostInfo, REGISTRY_CURATOR_NAME, ServiceDirectory};

const SERVICE: &str = "http://service.dianping.com/demo/EchoService_1.0.0";

fn directory() -> (Arc<ServiceDirectory>, Arc<MockRegistry>) {
    let config = Arc::new(ConfigManager::new("demo", "127.0.0.1"));
    let mock = Arc::new(MockRegistry::new(REGISTRY_CURATOR_NAME));
    let directory = ServiceDirectory::builder(config, Arc::new(RecordingMonitor::new()))
        .with_backend(mock.clone())
        .build()
        .unwrap();
    (directory, mock)
}

#[test]
fn test_concurrent_adds_keep_one_entry_per_address() {
    let (directory, _) = directory();

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let directory = directory.clone();
            thread::spawn(move || {
                for port in 4040..4050u16 {
                    directory
                        .add_service_address(SERVICE, "10.0.0.1", port, i + 1)
                        .unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let hosts = directory.get_referenced_service_addresses(SERVICE);
    assert_eq!(hosts.len(), 10);
    for host in hosts {
        assert!(host.weight() >= 1 && host.weight() <= 8);
    }
}

#[test]
fn test_address_lifecycle() {
    let (directory, mock) = directory();
    mock.set_service_address(SERVICE, "10.0.0.1:4040,10.0.0.2:4040");

    for address in directory.get_service_address_list(SERVICE, "").unwrap() {
        let (host, port) = address.rsplit_once(':').unwrap();
        let port: u16 = port.parse().unwrap();
        directory
            .add_service_address(SERVICE, host, port, 1)
            .unwrap();
    }
    assert!(directory.is_referenced_service(SERVICE));
    assert_eq!(directory.get_referenced_services(), vec![SERVICE.to_string()]);
    assert_eq!(directory.get_all_referenced_service_addresses()[SERVICE].len(), 2);

    directory.remove_service_address(SERVICE, &HostInfo::with_default_weight("10.0.0.1", 4040));
    directory.remove_service_address(SERVICE, &HostInfo::with_default_weight("10.0.0.2", 4040));

    assert!(directory.get_referenced_service_addresses(SERVICE).is_empty());
    assert_eq!(directory.get_referenced_app_from_cache("10.0.0.1:4040"), "");
    assert!(
        directory
            .get_protocol_info_from_cache("10.0.0.2:4040")
            .is_empty()
    );
}
