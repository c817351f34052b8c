// Copyright AGNTCY Contributors (https://github.com/agntcy)
// SPDX-License-Identifier: Apache-2.0

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::current_time_millis;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum MessageType {
    Heartbeat = 1,
    Service = 2,
    /// Infrastructure failure reported by the provider.
    Exception = 3,
    /// Business exception thrown by the provided method.
    ServiceException = 4,
    HealthCheck = 5,
    ScannerHeartbeat = 6,
}

impl MessageType {
    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(MessageType::Heartbeat),
            2 => Some(MessageType::Service),
            3 => Some(MessageType::Exception),
            4 => Some(MessageType::ServiceException),
            5 => Some(MessageType::HealthCheck),
            6 => Some(MessageType::ScannerHeartbeat),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum SerializerType {
    /// Legacy serializer every server understands.
    #[default]
    Hessian = 2,
    Java = 3,
    Proto = 5,
    Json = 7,
    Fst = 8,
    /// Cross-language protocol.
    Thrift = 9,
}

impl SerializerType {
    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            2 => Some(SerializerType::Hessian),
            3 => Some(SerializerType::Java),
            5 => Some(SerializerType::Proto),
            7 => Some(SerializerType::Json),
            8 => Some(SerializerType::Fst),
            9 => Some(SerializerType::Thrift),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            SerializerType::Hessian => "hessian",
            SerializerType::Java => "java",
            SerializerType::Proto => "proto",
            SerializerType::Json => "json",
            SerializerType::Fst => "fst",
            SerializerType::Thrift => "thrift",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "hessian" => Some(SerializerType::Hessian),
            "java" => Some(SerializerType::Java),
            "proto" | "protobuf" => Some(SerializerType::Proto),
            "json" => Some(SerializerType::Json),
            "fst" => Some(SerializerType::Fst),
            "thrift" => Some(SerializerType::Thrift),
            _ => None,
        }
    }

    /// Proto and fst are only understood by recent servers.
    pub fn is_version_gated(self) -> bool {
        matches!(self, SerializerType::Proto | SerializerType::Fst)
    }

    pub fn is_thrift(self) -> bool {
        self == SerializerType::Thrift
    }
}

impl Display for SerializerType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Whether the invoker waits for a reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CallType {
    #[default]
    Reply,
    NoReply,
}

/// How the caller consumes the result, as configured on the invoker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CallMethod {
    #[default]
    Sync,
    Future,
    Callback,
    Oneway,
}

impl CallMethod {
    pub fn name(self) -> &'static str {
        match self {
            CallMethod::Sync => "sync",
            CallMethod::Future => "future",
            CallMethod::Callback => "callback",
            CallMethod::Oneway => "oneway",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "sync" => Some(CallMethod::Sync),
            "future" => Some(CallMethod::Future),
            "callback" => Some(CallMethod::Callback),
            "oneway" => Some(CallMethod::Oneway),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimePhase {
    Created,
    Authenticated,
    FutureDispatched,
    Responded,
    Finished,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimePoint {
    pub phase: TimePhase,
    pub millis: i64,
}

impl TimePoint {
    pub fn new(phase: TimePhase) -> Self {
        TimePoint::at(phase, current_time_millis())
    }

    pub fn at(phase: TimePhase, millis: i64) -> Self {
        TimePoint { phase, millis }
    }
}
