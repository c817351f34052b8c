// Copyright AGNTCY Contributors (https://github.com/agntcy)
// SPDX-License-Identifier: Apache-2.0

pub mod request;
pub mod response;
pub mod types;

pub use request::{InvocationRequest, RequestKind};
pub use response::InvocationResponse;
pub use types::{CallMethod, CallType, MessageType, SerializerType, TimePhase, TimePoint};
