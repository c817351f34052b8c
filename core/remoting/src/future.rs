// Copyright AGNTCY Contributors (https://github.com/agntcy)
// SPDX-License-Identifier: Apache-2.0

//! Asynchronous results of outgoing calls.
//!
//! The transport resolves a [`CallbackFuture`] from its I/O thread while the
//! caller waits on the [`ServiceFuture`] wrapping it, blocking or async.

pub mod callback;
pub mod degradation;
pub mod service_future;

pub use callback::CallbackFuture;
pub use degradation::{DegradationPolicy, DegradedResponse, NoDegradation};
pub use service_future::ServiceFuture;
