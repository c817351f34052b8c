// Copyright AGNTCY Contributors (https://github.com/agntcy)
// SPDX-License-Identifier: Apache-2.0

use crate::errors::RegistryError;

const PATH_SEPARATOR: char = '/';
const PLACEHOLDER: char = '^';

pub fn validate_weight(host: &str, port: u16, weight: i32) -> Result<(), RegistryError> {
    if host.trim().is_empty() || port == 0 {
        return Err(RegistryError::InvalidAddress(format!("{}:{}", host, port)));
    }
    if weight <= 0 {
        return Err(RegistryError::InvalidWeight {
            address: format!("{}:{}", host, port),
            weight,
        });
    }
    Ok(())
}

/// Key of a service inside a group. The default group uses the bare name.
pub fn service_key(service_name: &str, group: &str) -> String {
    if group.trim().is_empty() {
        service_name.to_string()
    } else {
        format!("{}?{}", service_name, group)
    }
}

/// Service names are urls; local config keys cannot contain `/`.
pub fn escape_service_name(service_name: &str) -> String {
    service_name.replace(PATH_SEPARATOR, &PLACEHOLDER.to_string())
}

/// Split a comma separated address list, dropping blank entries.
pub fn get_address_list(address: &str) -> Vec<String> {
    address
        .split(',')
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_weight() {
        assert!(validate_weight("10.0.0.1", 4040, 1).is_ok());
        assert!(matches!(
            validate_weight("10.0.0.1", 4040, 0),
            Err(RegistryError::InvalidWeight { weight: 0, .. })
        ));
        assert!(matches!(
            validate_weight("10.0.0.1", 4040, -3),
            Err(RegistryError::InvalidWeight { .. })
        ));
        assert!(matches!(
            validate_weight(" ", 4040, 1),
            Err(RegistryError::InvalidAddress(_))
        ));
        assert!(matches!(
            validate_weight("10.0.0.1", 0, 1),
            Err(RegistryError::InvalidAddress(_))
        ));
    }

    #[test]
    fn test_service_key() {
        assert_eq!(service_key("svc", ""), "svc");
        assert_eq!(service_key("svc", "  "), "svc");
        assert_eq!(service_key("svc", "swimlane"), "svc?swimlane");
    }

    #[test]
    fn test_escape_service_name() {
        let name = "http://service.dianping.com/demo/EchoService_1.0.0";
        let escaped = escape_service_name(name);
        assert_eq!(
            escaped,
            "http:^^service.dianping.com^demo^EchoService_1.0.0"
        );
    }

    #[test]
    fn test_get_address_list() {
        assert_eq!(
            get_address_list("1.1.1.1:80, ,2.2.2.2:81,"),
            vec!["1.1.1.1:80".to_string(), "2.2.2.2:81".to_string()]
        );
        assert!(get_address_list("").is_empty());
    }
}
