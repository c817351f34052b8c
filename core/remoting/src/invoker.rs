// Copyright AGNTCY Contributors (https://github.com/agntcy)
// SPDX-License-Identifier: Apache-2.0

pub mod context_prepare;

pub use context_prepare::ContextPrepareInvokeFilter;

use crate::context::InvokerContext;

/// Hook run on every non-unified call right before the context is copied
/// into the request.
pub trait InvokerContextProcessor: Send + Sync {
    fn pre_invoke(&self, ctx: &mut InvokerContext);
}
