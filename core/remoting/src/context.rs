// Copyright AGNTCY Contributors (https://github.com/agntcy)
// SPDX-License-Identifier: Apache-2.0

//! Per-call state passed explicitly through the filter chain.

use std::collections::HashMap;
use std::sync::Arc;

use crate::config::InvokerConfig;
use crate::domain::{InvocationRequest, RequestKind, SerializerType, TimePhase, TimePoint};

/// State of an outgoing call.
#[derive(Debug)]
pub struct InvokerContext {
    config: Arc<InvokerConfig>,
    /// Address the call was routed to, `host:port`.
    pub client_address: String,
    pub method_name: String,
    pub parameter_types: Vec<String>,
    pub arguments: Vec<serde_json::Value>,
    pub request: InvocationRequest,
    /// App serving the target address, empty when unknown.
    pub target_app: String,
    pub timeline: Vec<TimePoint>,
    pub global_context: HashMap<String, String>,
    /// Values of this call only, cleared once the call returns.
    pub local_context: HashMap<String, String>,
}

impl InvokerContext {
    pub fn new(
        config: Arc<InvokerConfig>,
        client_address: impl Into<String>,
        method_name: impl Into<String>,
    ) -> Self {
        let method_name = method_name.into();
        let request = InvocationRequest::new(config.url(), method_name.clone(), config.serializer());
        InvokerContext {
            config,
            client_address: client_address.into(),
            method_name,
            parameter_types: Vec::new(),
            arguments: Vec::new(),
            request,
            target_app: String::new(),
            timeline: Vec::new(),
            global_context: HashMap::new(),
            local_context: HashMap::new(),
        }
    }

    pub fn with_arguments(mut self, parameter_types: Vec<String>, arguments: Vec<serde_json::Value>) -> Self {
        self.request.parameter_types = parameter_types.clone();
        self.request.parameters = arguments.clone();
        self.parameter_types = parameter_types;
        self.arguments = arguments;
        self
    }

    pub fn with_request_kind(mut self, kind: RequestKind) -> Self {
        self.request.kind = kind;
        self
    }

    pub fn with_local_value(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.local_context.insert(key.into(), value.into());
        self
    }

    pub fn config(&self) -> &Arc<InvokerConfig> {
        &self.config
    }

    /// Build a request of the same kind carrying this call's method and
    /// arguments with `serializer`.
    pub fn new_request(&self, serializer: SerializerType) -> InvocationRequest {
        InvocationRequest::new(self.config.url(), self.method_name.clone(), serializer)
            .with_kind(self.request.kind)
            .with_parameters(self.parameter_types.clone(), self.arguments.clone())
    }

    pub fn add_time_point(&mut self, phase: TimePhase) {
        self.timeline.push(TimePoint::new(phase));
    }

    pub fn time_point(&self, phase: TimePhase) -> Option<&TimePoint> {
        self.timeline.iter().find(|p| p.phase == phase)
    }
}

/// Channel an inbound request arrived on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelInfo {
    pub remote_address: String,
    /// Name of the protocol the channel speaks, `default` for the legacy one.
    pub protocol: String,
}

impl ChannelInfo {
    pub fn new(remote_address: impl Into<String>, protocol: impl Into<String>) -> Self {
        ChannelInfo {
            remote_address: remote_address.into(),
            protocol: protocol.into(),
        }
    }
}

/// State of an inbound call on the provider.
#[derive(Debug)]
pub struct ProviderContext {
    pub request: InvocationRequest,
    pub channel: ChannelInfo,
    pub timeline: Vec<TimePoint>,
    pub local_context: HashMap<String, String>,
}

impl ProviderContext {
    /// The request values sent by the caller seed the local context.
    pub fn new(request: InvocationRequest, channel: ChannelInfo) -> Self {
        let local_context = request.request_values.clone();
        ProviderContext {
            request,
            channel,
            timeline: Vec::new(),
            local_context,
        }
    }

    pub fn with_local_value(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.local_context.insert(key.into(), value.into());
        self
    }

    pub fn add_time_point(&mut self, phase: TimePhase) {
        self.timeline.push(TimePoint::new(phase));
    }

    pub fn time_point(&self, phase: TimePhase) -> Option<&TimePoint> {
        self.timeline.iter().find(|p| p.phase == phase)
    }
}
