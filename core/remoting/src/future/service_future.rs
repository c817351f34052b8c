// Copyright AGNTCY Contributors (https://github.com/agntcy)
// SPDX-License-Identifier: Apache-2.0

use std::collections::HashMap;
use std::sync::Arc;
use std::thread::{self, ThreadId};

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use pigeon_monitor::{Monitor, MonitorTransaction, TRANSACTION_FUTURE};

use crate::context::InvokerContext;
use crate::domain::{InvocationResponse, MessageType, TimePhase, TimePoint};
use crate::errors::RpcError;
use crate::future::callback::CallbackFuture;
use crate::future::degradation::{DegradationPolicy, DegradedResponse, NoDegradation};
use crate::current_time_millis;

/// Either the final outcome or a degraded substitute still to be awaited.
enum Resolution {
    Done(Result<serde_json::Value, RpcError>),
    Nested(Box<ServiceFuture>),
}

/// Caller side of an outgoing call.
///
/// Each `get` is observed by a `PigeonFuture` monitoring transaction and
/// appends `FutureDispatched`, `Responded` and `Finished` points to the call
/// timeline. Infrastructure failures may be answered by the
/// [`DegradationPolicy`]; business exceptions are always returned as is.
pub struct ServiceFuture {
    result: CallbackFuture,
    context: Mutex<InvokerContext>,
    caller: ThreadId,
    timeout_ms: u64,
    monitor: Arc<dyn Monitor>,
    degradation: Arc<dyn DegradationPolicy>,
    transaction: Mutex<Option<Box<dyn MonitorTransaction>>>,
    response_context: Mutex<Option<HashMap<String, String>>>,
}

impl std::fmt::Debug for ServiceFuture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceFuture")
            .field("sequence", &self.result.sequence())
            .field("timeout_ms", &self.timeout_ms)
            .field("done", &self.result.is_done())
            .finish()
    }
}

impl ServiceFuture {
    /// Wrap the prepared call. The calling thread is recorded as the issuer
    /// and the request timeout becomes the default wait.
    pub fn new(ctx: InvokerContext, monitor: Arc<dyn Monitor>) -> Self {
        let timeout_ms = match ctx.request.timeout_ms {
            t if t > 0 => t as u64,
            _ => ctx.config().timeout(&ctx.method_name).max(0) as u64,
        };
        ServiceFuture {
            result: CallbackFuture::new(ctx.request.sequence),
            context: Mutex::new(ctx),
            caller: thread::current().id(),
            timeout_ms,
            monitor,
            degradation: Arc::new(NoDegradation),
            transaction: Mutex::new(None),
            response_context: Mutex::new(None),
        }
    }

    pub fn with_degradation(self, degradation: Arc<dyn DegradationPolicy>) -> Self {
        ServiceFuture {
            degradation,
            ..self
        }
    }

    pub fn with_timeout(self, timeout_ms: u64) -> Self {
        ServiceFuture { timeout_ms, ..self }
    }

    /// Handle given to the transport to deliver the response.
    pub fn resolver(&self) -> CallbackFuture {
        self.result.clone()
    }

    pub fn timeout_ms(&self) -> u64 {
        self.timeout_ms
    }

    pub fn timeline(&self) -> Vec<TimePoint> {
        self.context.lock().timeline.clone()
    }

    /// Wait for the result up to the call timeout.
    pub fn get(&self) -> Result<serde_json::Value, RpcError> {
        self.get_with_timeout(self.timeout_ms)
    }

    pub fn get_with_timeout(&self, timeout_ms: u64) -> Result<serde_json::Value, RpcError> {
        self.begin(timeout_ms);
        let waited = self.result.wait_response(timeout_ms);
        let resolution = self.resolve(waited);
        let result = match resolution {
            Resolution::Done(result) => result,
            Resolution::Nested(future) => future.get(),
        };
        self.finish(&result);
        result
    }

    pub async fn get_async(&self, timeout_ms: u64) -> Result<serde_json::Value, RpcError> {
        self.begin(timeout_ms);
        let waited = self.result.wait_response_async(timeout_ms).await;
        let resolution = self.resolve(waited);
        let result = match resolution {
            Resolution::Done(result) => result,
            Resolution::Nested(future) => {
                let timeout_ms = future.timeout_ms();
                Box::pin(future.get_async(timeout_ms)).await
            }
        };
        self.finish(&result);
        result
    }

    /// Release the call and close its transaction if still open.
    pub fn dispose(&self) {
        self.result.dispose();
        if let Some(transaction) = self.transaction.lock().as_mut() {
            if !transaction.is_completed() {
                if let Err(e) = transaction.complete() {
                    debug!(error = %e, "transaction completion failed on dispose");
                }
            }
        }
    }

    /// Stop waiting for the call. The request already sent is not aborted.
    pub fn cancel(&self) -> bool {
        self.result.cancel()
    }

    pub fn is_done(&self) -> bool {
        self.result.is_done()
    }

    pub fn is_cancelled(&self) -> bool {
        self.result.is_cancelled()
    }

    /// Response context of the call, available only when the result was
    /// read on the thread that issued the call.
    pub fn take_response_context(&self) -> Option<HashMap<String, String>> {
        self.response_context.lock().take()
    }

    fn begin(&self, timeout_ms: u64) {
        let mut ctx = self.context.lock();
        let uri = format!(
            "{}:{}({})",
            ctx.config().url(),
            ctx.method_name,
            ctx.parameter_types.join(",")
        );
        let mut transaction = self.monitor.create_transaction(TRANSACTION_FUTURE, &uri);
        transaction.set_status_ok();
        transaction.add_data("CallType", ctx.config().call_method().name());
        transaction.add_data("Timeout", &ctx.config().default_timeout().to_string());
        transaction.add_data("Serialize", ctx.request.serializer.name());
        transaction.add_data("FutureTimeout", &timeout_ms.to_string());
        ctx.add_time_point(TimePhase::FutureDispatched);

        if let Some(previous) = self.transaction.lock().replace(transaction) {
            if !previous.is_completed() {
                debug!(name = previous.name(), "replacing an open transaction");
            }
        }
    }

    fn resolve(&self, waited: Result<InvocationResponse, RpcError>) -> Resolution {
        let response = match waited {
            Ok(response) => response,
            Err(e) if e.is_degradable() => return self.degrade_or_raise(e),
            Err(e) => return Resolution::Done(Err(e)),
        };

        {
            let mut ctx = self.context.lock();
            ctx.timeline
                .push(TimePoint::at(TimePhase::Responded, response.create_millis));
            ctx.add_time_point(TimePhase::FutureDispatched);
        }
        if response.size > 0 {
            if let Some(transaction) = self.transaction.lock().as_mut() {
                transaction.log_event(
                    "PigeonCall.responseSize",
                    &response.size.to_string(),
                    &response.size.to_string(),
                );
            }
        }
        if thread::current().id() == self.caller {
            *self.response_context.lock() = Some(response.response_values.clone());
        }

        let exception = response.exception.clone().unwrap_or_default();
        match response.message_type {
            MessageType::Service => {
                Resolution::Done(Ok(response.return_value.unwrap_or(serde_json::Value::Null)))
            }
            MessageType::Exception => self.degrade_or_raise(RpcError::Remote(exception)),
            MessageType::ServiceException => {
                info!(sequence = response.sequence, %exception, "remote service exception");
                Resolution::Done(Err(RpcError::Application(exception)))
            }
            _ => Resolution::Done(Err(RpcError::BadResponse(response.to_string()))),
        }
    }

    fn degrade_or_raise(&self, error: RpcError) -> Resolution {
        let ctx = self.context.lock();
        if self.degradation.need_failure_degrade(&ctx) {
            match self.degradation.degrade_call(&ctx) {
                Ok(Some(DegradedResponse::Value(value))) => {
                    info!(url = %ctx.config().url(), method = %ctx.method_name, error = %error, "failure degraded");
                    return Resolution::Done(Ok(value));
                }
                Ok(Some(DegradedResponse::Future(future))) => {
                    info!(url = %ctx.config().url(), method = %ctx.method_name, error = %error, "failure degraded to future");
                    return Resolution::Nested(future);
                }
                Ok(None) => {}
                Err(e) => warn!(error = %e, "failure degrade in future call failed"),
            }
        }

        self.degradation.add_failed_request(&ctx, &error);
        warn!(
            address = %ctx.client_address,
            url = %ctx.config().url(),
            method = %ctx.method_name,
            error = %error,
            "error with future call"
        );
        Resolution::Done(Err(error))
    }

    fn finish(&self, result: &Result<serde_json::Value, RpcError>) {
        self.context
            .lock()
            .timeline
            .push(TimePoint::at(TimePhase::Finished, current_time_millis()));

        let mut guard = self.transaction.lock();
        let Some(transaction) = guard.as_mut() else {
            return;
        };
        if let Err(e) = result {
            transaction.set_status_error(&e.to_string());
        }
        if let Err(e) = transaction.complete() {
            self.monitor.log_monitor_error(&e);
            warn!(error = %e, "failed to complete future transaction");
        }
    }
}
