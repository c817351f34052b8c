// Copyright AGNTCY Contributors (https://github.com/agntcy)
// SPDX-License-Identifier: Apache-2.0

//! First filter of the invoker chain.
//!
//! Stamps the request with its identity and timing, negotiates the
//! serialization the target address understands and moves the call context
//! into the request. The local context of the call is cleared once the rest
//! of the chain returns, whatever the outcome.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

use dashmap::DashMap;
use once_cell::sync::OnceCell;
use tracing::{debug, warn};

use pigeon_config::ConfigManager;
use pigeon_registry::{ServiceDirectory, version};

use crate::context::InvokerContext;
use crate::domain::{CallMethod, CallType, InvocationResponse, MessageType, RequestKind, SerializerType, TimePhase};
use crate::errors::RpcError;
use crate::filter::{InvocationFilter, Next};
use crate::invoker::InvokerContextProcessor;
use crate::{CONTEXT_KEY_SOURCE_APP, CONTEXT_KEY_SOURCE_IP, REQUEST_KEY_TIMEOUT, current_time_millis};

pub const KEY_COMPACT: &str = "pigeon.invoker.request.compact";
pub const KEY_TIMEOUT_RESET: &str = "pigeon.timeout.reset";

static REQUEST_SEQUENCE: AtomicI64 = AtomicI64::new(0);

/// Next invoker sequence number. Strictly negative and decreasing.
pub fn next_sequence() -> i64 {
    -(REQUEST_SEQUENCE.fetch_add(1, Ordering::Relaxed) + 1)
}

pub struct ContextPrepareInvokeFilter {
    config: Arc<ConfigManager>,
    directory: Arc<ServiceDirectory>,
    processor: Option<Arc<dyn InvokerContextProcessor>>,
    // declared version -> proto/fst support
    proto_versions: DashMap<String, bool>,
    // declared version -> compact support
    compact_versions: DashMap<String, bool>,
    global_context: OnceCell<HashMap<String, String>>,
}

impl std::fmt::Debug for ContextPrepareInvokeFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContextPrepareInvokeFilter")
            .field("processor", &self.processor.is_some())
            .field("proto_versions", &self.proto_versions.len())
            .field("compact_versions", &self.compact_versions.len())
            .finish()
    }
}

impl ContextPrepareInvokeFilter {
    pub fn new(config: Arc<ConfigManager>, directory: Arc<ServiceDirectory>) -> Self {
        ContextPrepareInvokeFilter {
            config,
            directory,
            processor: None,
            proto_versions: DashMap::new(),
            compact_versions: DashMap::new(),
            global_context: OnceCell::new(),
        }
    }

    pub fn with_processor(self, processor: Arc<dyn InvokerContextProcessor>) -> Self {
        ContextPrepareInvokeFilter {
            processor: Some(processor),
            ..self
        }
    }

    fn init_request(&self, ctx: &mut InvokerContext) {
        if ctx.request.kind != RequestKind::Unified {
            self.compact_request(ctx);
        } else {
            ctx.request.service_name = ctx.config().url().to_string();
            ctx.request.parameter_types = ctx.parameter_types.clone();
        }

        self.check_serialize(ctx);

        let timeout = self.resolve_timeout(ctx);
        let call_type = match ctx.config().call_method() {
            CallMethod::Oneway => CallType::NoReply,
            _ => CallType::Reply,
        };

        let request = &mut ctx.request;
        if request.app.is_empty() {
            request.app = self.config.app_name().to_string();
        }
        request.sequence = next_sequence();
        request.create_millis = current_time_millis();
        request.message_type = MessageType::Service;
        request.timeout_ms = timeout;
        request.call_type = call_type;
    }

    /// Configured timeout, tightened by the `timeout` value of the local
    /// context when enabled.
    fn resolve_timeout(&self, ctx: &InvokerContext) -> i32 {
        let configured = ctx.config().timeout(&ctx.method_name);
        if !self.config.get_bool_value(KEY_TIMEOUT_RESET, true) {
            return configured;
        }
        let Some(value) = ctx.local_context.get(REQUEST_KEY_TIMEOUT) else {
            return configured;
        };
        match value.trim().parse::<i32>() {
            Ok(timeout) if timeout > 0 && timeout < configured => timeout,
            Ok(_) => configured,
            Err(e) => {
                warn!(%value, error = %e, "invalid timeout in request context, ignored");
                configured
            }
        }
    }

    fn compact_request(&self, ctx: &mut InvokerContext) {
        if !self.config.get_bool_value(KEY_COMPACT, true) {
            return;
        }
        let supported = self.memoized(
            &self.compact_versions,
            &ctx.client_address,
            version::is_compact_supported,
        );
        if supported {
            ctx.request.kind = RequestKind::Compact;
        }
    }

    fn check_serialize(&self, ctx: &mut InvokerContext) {
        let serializer = ctx.request.serializer;
        if serializer.is_version_gated() {
            self.check_version(ctx);
        } else if serializer.is_thrift() {
            self.check_protocol(ctx);
        }
    }

    fn check_version(&self, ctx: &mut InvokerContext) {
        let supported = self.memoized(
            &self.proto_versions,
            &ctx.client_address,
            version::is_proto_fst_supported,
        );
        if !supported {
            debug!(address = %ctx.client_address, serializer = %ctx.request.serializer, "server too old, using hessian");
            ctx.request.serializer = SerializerType::Hessian;
            ctx.config().downgrade_serializer();
        }
    }

    fn check_protocol(&self, ctx: &mut InvokerContext) {
        let supported = self
            .directory
            .is_support_new_protocol(&ctx.client_address, &ctx.request.service_name);
        if !supported {
            debug!(address = %ctx.client_address, service = %ctx.request.service_name, "new protocol not supported, using hessian");
            ctx.request = ctx.new_request(SerializerType::Hessian);
        }
    }

    /// Capability of the version declared by `address`, computed once per
    /// version string. An unknown version is unsupported.
    fn memoized(&self, cache: &DashMap<String, bool>, address: &str, check: fn(&str) -> bool) -> bool {
        let Some(declared) = self.directory.get_referenced_version_from_cache(address) else {
            return false;
        };
        if declared.trim().is_empty() {
            return false;
        }
        if let Some(supported) = cache.get(&declared) {
            return *supported;
        }
        *cache
            .entry(declared.clone())
            .or_insert_with(|| check(&declared))
    }

    fn process_globals(&self) -> &HashMap<String, String> {
        self.global_context.get_or_init(|| {
            HashMap::from([
                (
                    CONTEXT_KEY_SOURCE_APP.to_string(),
                    self.config.app_name().to_string(),
                ),
                (
                    CONTEXT_KEY_SOURCE_IP.to_string(),
                    self.config.local_ip().to_string(),
                ),
            ])
        })
    }

    fn transfer_context(&self, ctx: &mut InvokerContext) {
        if ctx.request.kind == RequestKind::Unified {
            ctx.request.parameter_types = ctx.parameter_types.clone();
        } else if let Some(processor) = &self.processor {
            processor.pre_invoke(ctx);
        }

        for (key, value) in self.process_globals() {
            ctx.global_context
                .entry(key.clone())
                .or_insert_with(|| value.clone());
        }

        let request = &mut ctx.request;
        request.global_values.extend(
            ctx.global_context
                .iter()
                .map(|(k, v)| (k.clone(), v.clone())),
        );
        request.request_values.extend(
            ctx.local_context
                .iter()
                .map(|(k, v)| (k.clone(), v.clone())),
        );
    }
}

impl InvocationFilter<InvokerContext> for ContextPrepareInvokeFilter {
    fn invoke(
        &self,
        next: Next<'_, InvokerContext>,
        ctx: &mut InvokerContext,
    ) -> Result<InvocationResponse, RpcError> {
        ctx.add_time_point(TimePhase::Created);
        ctx.target_app = self
            .directory
            .get_referenced_app_from_cache(&ctx.client_address);

        self.init_request(ctx);
        self.transfer_context(ctx);

        let result = next.handle(ctx);
        ctx.local_context.clear();
        result
    }
}
