// Copyright AGNTCY Contributors (https://github.com/agntcy)
// SPDX-License-Identifier: Apache-2.0

use std::collections::HashMap;
use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::current_time_millis;
use crate::domain::types::MessageType;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvocationResponse {
    pub sequence: i64,
    pub message_type: MessageType,
    pub return_value: Option<serde_json::Value>,
    /// Rendered exception for `Exception` and `ServiceException` responses.
    pub exception: Option<String>,
    pub create_millis: i64,
    /// Encoded size in bytes, zero when unknown.
    pub size: usize,
    pub response_values: HashMap<String, String>,
}

impl InvocationResponse {
    fn new(sequence: i64, message_type: MessageType) -> Self {
        InvocationResponse {
            sequence,
            message_type,
            return_value: None,
            exception: None,
            create_millis: current_time_millis(),
            size: 0,
            response_values: HashMap::new(),
        }
    }

    pub fn service(sequence: i64, value: serde_json::Value) -> Self {
        InvocationResponse {
            return_value: Some(value),
            ..InvocationResponse::new(sequence, MessageType::Service)
        }
    }

    pub fn exception(sequence: i64, exception: impl Into<String>) -> Self {
        InvocationResponse {
            exception: Some(exception.into()),
            ..InvocationResponse::new(sequence, MessageType::Exception)
        }
    }

    pub fn service_exception(sequence: i64, exception: impl Into<String>) -> Self {
        InvocationResponse {
            exception: Some(exception.into()),
            ..InvocationResponse::new(sequence, MessageType::ServiceException)
        }
    }

    pub fn with_message_type(self, message_type: MessageType) -> Self {
        InvocationResponse {
            message_type,
            ..self
        }
    }

    pub fn with_response_value(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.response_values.insert(key.into(), value.into());
        self
    }
}

impl Display for InvocationResponse {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "InvocationResponse[seq={}, type={:?}, exception={}]",
            self.sequence,
            self.message_type,
            self.exception.as_deref().unwrap_or("")
        )
    }
}
