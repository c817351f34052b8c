// Copyright AGNTCY Contributors (https://github.com/agntcy)
// SPDX-License-Identifier: Apache-2.0

use std::pin::pin;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use tokio::sync::Notify;
use tracing::{debug, warn};

use crate::domain::InvocationResponse;
use crate::errors::RpcError;

#[derive(Debug, Clone)]
enum State {
    Pending,
    Completed(InvocationResponse),
    Failed(RpcError),
    TimedOut(u64),
    Cancelled,
}

impl State {
    /// Outcome of a terminal state, `None` while pending.
    fn outcome(&self, sequence: i64) -> Option<Result<InvocationResponse, RpcError>> {
        match self {
            State::Pending => None,
            State::Completed(response) => Some(Ok(response.clone())),
            State::Failed(error) => Some(Err(error.clone())),
            State::TimedOut(timeout_ms) => Some(Err(timeout_error(*timeout_ms, sequence))),
            State::Cancelled => Some(Err(RpcError::Cancelled)),
        }
    }
}

fn timeout_error(timeout_ms: u64, sequence: i64) -> RpcError {
    RpcError::RequestTimeout {
        timeout_ms,
        detail: format!("no response for request {}", sequence),
    }
}

#[derive(Debug)]
struct Inner {
    sequence: i64,
    state: Mutex<State>,
    cond: Condvar,
    notify: Notify,
}

/// One-shot slot for the response of a request.
///
/// Moves once from pending to completed, failed, timed out or cancelled.
/// Anything delivered after that is dropped. Clones share the same slot.
#[derive(Debug, Clone)]
pub struct CallbackFuture {
    inner: Arc<Inner>,
}

impl CallbackFuture {
    pub fn new(sequence: i64) -> Self {
        CallbackFuture {
            inner: Arc::new(Inner {
                sequence,
                state: Mutex::new(State::Pending),
                cond: Condvar::new(),
                notify: Notify::new(),
            }),
        }
    }

    pub fn sequence(&self) -> i64 {
        self.inner.sequence
    }

    fn resolve(&self, state: State) -> bool {
        {
            let mut current = self.inner.state.lock();
            if !matches!(*current, State::Pending) {
                return false;
            }
            *current = state;
        }
        self.inner.cond.notify_all();
        self.inner.notify.notify_waiters();
        true
    }

    /// Deliver the response. Returns false when the slot was already
    /// terminal or the response belongs to another request.
    pub fn callback(&self, response: InvocationResponse) -> bool {
        if response.sequence != self.inner.sequence {
            warn!(
                expected = self.inner.sequence,
                received = response.sequence,
                "response does not match the request"
            );
            return false;
        }
        let accepted = self.resolve(State::Completed(response));
        if !accepted {
            debug!(sequence = self.inner.sequence, "late response ignored");
        }
        accepted
    }

    /// Report a transport failure.
    pub fn fail(&self, error: RpcError) -> bool {
        self.resolve(State::Failed(error))
    }

    /// Mark the call cancelled. The request already on the wire is not
    /// aborted.
    pub fn cancel(&self) -> bool {
        self.resolve(State::Cancelled)
    }

    /// Release the slot, waking any waiter with `Cancelled`.
    pub fn dispose(&self) {
        if self.resolve(State::Cancelled) {
            debug!(sequence = self.inner.sequence, "pending call disposed");
        }
    }

    pub fn is_done(&self) -> bool {
        !matches!(*self.inner.state.lock(), State::Pending)
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(*self.inner.state.lock(), State::Cancelled)
    }

    fn expire(&self, timeout_ms: u64) {
        if self.resolve(State::TimedOut(timeout_ms)) {
            debug!(sequence = self.inner.sequence, timeout_ms, "request timed out");
        }
    }

    /// Block the calling thread until the slot is terminal or `timeout_ms`
    /// elapsed. Expiry is terminal too.
    pub fn wait_response(&self, timeout_ms: u64) -> Result<InvocationResponse, RpcError> {
        let deadline = Instant::now() + Duration::from_millis(timeout_ms);
        {
            let mut state = self.inner.state.lock();
            loop {
                if let Some(outcome) = state.outcome(self.inner.sequence) {
                    return outcome;
                }
                if self.inner.cond.wait_until(&mut state, deadline).timed_out() {
                    break;
                }
            }
        }
        self.expire(timeout_ms);
        self.outcome()
    }

    /// Async counterpart of [`CallbackFuture::wait_response`].
    pub async fn wait_response_async(&self, timeout_ms: u64) -> Result<InvocationResponse, RpcError> {
        let deadline = tokio::time::Instant::now() + Duration::from_millis(timeout_ms);
        loop {
            let mut notified = pin!(self.inner.notify.notified());
            notified.as_mut().enable();

            if let Some(outcome) = self.inner.state.lock().outcome(self.inner.sequence) {
                return outcome;
            }
            if tokio::time::timeout_at(deadline, notified).await.is_err() {
                self.expire(timeout_ms);
                return self.outcome();
            }
        }
    }

    fn outcome(&self) -> Result<InvocationResponse, RpcError> {
        self.inner
            .state
            .lock()
            .outcome(self.inner.sequence)
            .unwrap_or(Err(RpcError::Cancelled))
    }
}
