// Copyright AGNTCY Contributors (https://github.com/agntcy)
// SPDX-License-Identifier: Apache-2.0

use crate::context::InvokerContext;
use crate::errors::RpcError;
use crate::future::ServiceFuture;

/// Substitute produced for a failed call.
#[derive(Debug)]
pub enum DegradedResponse {
    Value(serde_json::Value),
    /// The substitute is itself computed asynchronously.
    Future(Box<ServiceFuture>),
}

/// Failure degradation, decided outside of the invocation core.
pub trait DegradationPolicy: Send + Sync {
    /// Whether a failed call may be answered with a substitute.
    fn need_failure_degrade(&self, ctx: &InvokerContext) -> bool;

    /// Produce the substitute, `None` when there is none for this call.
    fn degrade_call(&self, ctx: &InvokerContext) -> Result<Option<DegradedResponse>, RpcError>;

    /// Account a failure that was not degraded.
    fn add_failed_request(&self, ctx: &InvokerContext, error: &RpcError);
}

/// Never degrades.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoDegradation;

impl DegradationPolicy for NoDegradation {
    fn need_failure_degrade(&self, _ctx: &InvokerContext) -> bool {
        false
    }

    fn degrade_call(&self, _ctx: &InvokerContext) -> Result<Option<DegradedResponse>, RpcError> {
        Ok(None)
    }

    fn add_failed_request(&self, _ctx: &InvokerContext, _error: &RpcError) {}
}
