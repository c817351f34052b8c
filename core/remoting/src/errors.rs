// Copyright AGNTCY Contributors (https://github.com/agntcy)
// SPDX-License-Identifier: Apache-2.0

use thiserror::Error;

use pigeon_auth::SecurityError;
use pigeon_registry::RegistryError;

/// Outcome of a failed call, tagged by kind.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RpcError {
    // Rejected before anything is sent
    #[error("invalid invocation: {0}")]
    Validation(String),
    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),
    #[error("security error: {0}")]
    Security(#[from] SecurityError),

    // Infrastructure
    #[error("request timeout after {timeout_ms}ms: {detail}")]
    RequestTimeout { timeout_ms: u64, detail: String },
    #[error("bad response: {0}")]
    BadResponse(String),
    #[error("remote call error: {0}")]
    Remote(String),
    #[error("network error: {0}")]
    Network(String),

    // Business exception raised by the provider
    #[error("application exception: {0}")]
    Application(String),

    #[error("call cancelled")]
    Cancelled,
}

impl RpcError {
    /// Infrastructure failures a degraded response may stand in for.
    /// Business, security and validation errors never qualify.
    pub fn is_degradable(&self) -> bool {
        matches!(
            self,
            RpcError::RequestTimeout { .. }
                | RpcError::BadResponse(_)
                | RpcError::Remote(_)
                | RpcError::Network(_)
        )
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, RpcError::RequestTimeout { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_degradable_kinds() {
        assert!(
            RpcError::RequestTimeout {
                timeout_ms: 10,
                detail: String::new()
            }
            .is_degradable()
        );
        assert!(RpcError::Remote("x".into()).is_degradable());
        assert!(RpcError::Network("x".into()).is_degradable());
        assert!(!RpcError::Application("x".into()).is_degradable());
        assert!(!RpcError::Cancelled.is_degradable());
        assert!(!RpcError::from(SecurityError::IpDenied("1.1.1.1".into())).is_degradable());
        assert!(!RpcError::from(RegistryError::NotInitialized).is_degradable());
    }
}
