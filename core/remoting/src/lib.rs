// Copyright AGNTCY Contributors (https://github.com/agntcy)
// SPDX-License-Identifier: Apache-2.0

pub mod config;
pub mod context;
pub mod domain;
pub mod errors;
pub mod filter;
pub mod future;
pub mod invoker;
pub mod provider;

pub use config::InvokerConfig;
pub use context::{ChannelInfo, InvokerContext, ProviderContext};
pub use errors::RpcError;
pub use filter::{FilterChain, FilterChainBuilder, InvocationFilter, InvocationHandler, Next};

/// Global context keys filled in by the invoker.
pub const CONTEXT_KEY_SOURCE_APP: &str = "SOURCE_APP";
pub const CONTEXT_KEY_SOURCE_IP: &str = "SOURCE_IP";

/// Local context key tightening the timeout of a single call.
pub const REQUEST_KEY_TIMEOUT: &str = "timeout";
/// Local context key set by gateways forwarding a call on behalf of a client.
pub const CONTEXT_KEY_REQUEST_IP: &str = "RequestIp";

/// Name of the legacy protocol channel.
pub const PROTOCOL_DEFAULT: &str = "default";

pub(crate) fn current_time_millis() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or_default()
}
