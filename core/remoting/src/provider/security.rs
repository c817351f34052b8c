// Copyright AGNTCY Contributors (https://github.com/agntcy)
// SPDX-License-Identifier: Apache-2.0

use std::sync::Arc;

use tracing::debug;

use pigeon_auth::{REQUEST_KEY_TIMESTAMP, REQUEST_KEY_TOKEN, REQUEST_KEY_VERSION, SecurityGate};

use crate::context::ProviderContext;
use crate::domain::{InvocationResponse, MessageType, TimePhase};
use crate::errors::RpcError;
use crate::filter::{InvocationFilter, Next};
use crate::{CONTEXT_KEY_REQUEST_IP, PROTOCOL_DEFAULT};

/// Provider filter rejecting callers the [`SecurityGate`] does not accept.
#[derive(Debug)]
pub struct SecurityFilter {
    gate: Arc<SecurityGate>,
}

impl SecurityFilter {
    pub fn new(gate: Arc<SecurityGate>) -> Self {
        SecurityFilter { gate }
    }

    fn authenticate(&self, ctx: &mut ProviderContext) -> Result<(), RpcError> {
        self.gate
            .authenticate_request_ip(&ctx.channel.remote_address)?;

        let request = &ctx.request;
        if !self
            .gate
            .need_validate_token(&request.service_name, &request.method_name)
        {
            return Ok(());
        }
        ctx.add_time_point(TimePhase::Authenticated);

        let request = &ctx.request;
        if request.message_type != MessageType::Service {
            return Ok(());
        }
        // forwarded by a gateway on behalf of its client
        if ctx.local_context.contains_key(CONTEXT_KEY_REQUEST_IP) {
            debug!(service = %request.service_name, "forwarded request, token check skipped");
            return Ok(());
        }
        if ctx.channel.protocol == PROTOCOL_DEFAULT && !self.gate.token_protocol_default_enabled() {
            return Ok(());
        }

        self.gate.authenticate_request_token(
            &request.app,
            &ctx.channel.remote_address,
            request.request_value(REQUEST_KEY_TIMESTAMP),
            request.request_value(REQUEST_KEY_VERSION),
            request.request_value(REQUEST_KEY_TOKEN),
            &request.service_name,
            &request.method_name,
        )?;
        Ok(())
    }
}

impl InvocationFilter<ProviderContext> for SecurityFilter {
    fn invoke(
        &self,
        next: Next<'_, ProviderContext>,
        ctx: &mut ProviderContext,
    ) -> Result<InvocationResponse, RpcError> {
        self.authenticate(ctx)?;
        next.handle(ctx)
    }
}
