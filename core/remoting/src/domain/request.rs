// Copyright AGNTCY Contributors (https://github.com/agntcy)
// SPDX-License-Identifier: Apache-2.0

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::domain::types::{CallType, MessageType, SerializerType};

/// Shape of the request on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum RequestKind {
    #[default]
    Default,
    /// Smaller encoding understood by recent servers.
    Compact,
    /// Cross-language request carrying string contexts.
    Unified,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvocationRequest {
    pub kind: RequestKind,
    pub service_name: String,
    pub method_name: String,
    pub parameter_types: Vec<String>,
    pub parameters: Vec<serde_json::Value>,
    pub serializer: SerializerType,
    pub sequence: i64,
    pub create_millis: i64,
    pub timeout_ms: i32,
    pub call_type: CallType,
    pub message_type: MessageType,
    /// App of the caller.
    pub app: String,
    pub global_values: HashMap<String, String>,
    /// Per-call values, the local context of a unified request.
    pub request_values: HashMap<String, String>,
}

impl InvocationRequest {
    pub fn new(
        service_name: impl Into<String>,
        method_name: impl Into<String>,
        serializer: SerializerType,
    ) -> Self {
        InvocationRequest {
            kind: RequestKind::Default,
            service_name: service_name.into(),
            method_name: method_name.into(),
            parameter_types: Vec::new(),
            parameters: Vec::new(),
            serializer,
            sequence: 0,
            create_millis: 0,
            timeout_ms: 0,
            call_type: CallType::Reply,
            message_type: MessageType::Service,
            app: String::new(),
            global_values: HashMap::new(),
            request_values: HashMap::new(),
        }
    }

    pub fn with_kind(self, kind: RequestKind) -> Self {
        InvocationRequest { kind, ..self }
    }

    pub fn with_parameters(self, parameter_types: Vec<String>, parameters: Vec<serde_json::Value>) -> Self {
        InvocationRequest {
            parameter_types,
            parameters,
            ..self
        }
    }

    pub fn request_value(&self, key: &str) -> Option<&str> {
        self.request_values.get(key).map(String::as_str)
    }
}
