// Copyright AGNTCY Contributors (https://github.com/agntcy)
// SPDX-License-Identifier: Apache-2.0

//! Ordered interception of a call.
//!
//! A [`FilterChain`] is built once from an explicit list of filters and a
//! terminal handler. Each filter receives the rest of the chain as [`Next`]
//! and decides whether, and when, to continue.

use std::fmt;
use std::sync::Arc;

use crate::domain::InvocationResponse;
use crate::errors::RpcError;

/// Terminal stage of a chain, usually the network send.
pub trait InvocationHandler<C>: Send + Sync {
    fn handle(&self, ctx: &mut C) -> Result<InvocationResponse, RpcError>;
}

impl<C, F> InvocationHandler<C> for F
where
    F: Fn(&mut C) -> Result<InvocationResponse, RpcError> + Send + Sync,
{
    fn handle(&self, ctx: &mut C) -> Result<InvocationResponse, RpcError> {
        self(ctx)
    }
}

pub trait InvocationFilter<C>: Send + Sync {
    fn invoke(&self, next: Next<'_, C>, ctx: &mut C) -> Result<InvocationResponse, RpcError>;
}

/// Remaining stages of a chain.
pub struct Next<'a, C> {
    filters: &'a [Arc<dyn InvocationFilter<C>>],
    handler: &'a dyn InvocationHandler<C>,
}

impl<C> Next<'_, C> {
    pub fn handle(self, ctx: &mut C) -> Result<InvocationResponse, RpcError> {
        match self.filters.split_first() {
            Some((filter, rest)) => filter.invoke(
                Next {
                    filters: rest,
                    handler: self.handler,
                },
                ctx,
            ),
            None => self.handler.handle(ctx),
        }
    }
}

pub struct FilterChain<C> {
    filters: Vec<Arc<dyn InvocationFilter<C>>>,
    handler: Arc<dyn InvocationHandler<C>>,
}

impl<C> fmt::Debug for FilterChain<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterChain")
            .field("filters", &self.filters.len())
            .finish()
    }
}

impl<C> FilterChain<C> {
    pub fn builder() -> FilterChainBuilder<C> {
        FilterChainBuilder {
            filters: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    pub fn handle(&self, ctx: &mut C) -> Result<InvocationResponse, RpcError> {
        Next {
            filters: &self.filters,
            handler: self.handler.as_ref(),
        }
        .handle(ctx)
    }
}

pub struct FilterChainBuilder<C> {
    filters: Vec<Arc<dyn InvocationFilter<C>>>,
}

impl<C> FilterChainBuilder<C> {
    /// Append a filter. Filters run in insertion order.
    pub fn filter(mut self, filter: Arc<dyn InvocationFilter<C>>) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn build(self, handler: Arc<dyn InvocationHandler<C>>) -> FilterChain<C> {
        FilterChain {
            filters: self.filters,
            handler,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::MessageType;

    struct Trace(&'static str);

    impl InvocationFilter<Vec<String>> for Trace {
        fn invoke(
            &self,
            next: Next<'_, Vec<String>>,
            ctx: &mut Vec<String>,
        ) -> Result<InvocationResponse, RpcError> {
            ctx.push(format!("{} in", self.0));
            let result = next.handle(ctx);
            ctx.push(format!("{} out", self.0));
            result
        }
    }

    struct Reject;

    impl InvocationFilter<Vec<String>> for Reject {
        fn invoke(
            &self,
            _next: Next<'_, Vec<String>>,
            ctx: &mut Vec<String>,
        ) -> Result<InvocationResponse, RpcError> {
            ctx.push("reject".to_string());
            Err(RpcError::Validation("rejected".to_string()))
        }
    }

    fn handler() -> Arc<dyn InvocationHandler<Vec<String>>> {
        Arc::new(|ctx: &mut Vec<String>| -> Result<InvocationResponse, RpcError> {
            ctx.push("handler".to_string());
            Ok(InvocationResponse::service(1, serde_json::json!("ok")))
        })
    }

    #[test]
    fn test_filters_run_in_order() {
        let chain = FilterChain::<Vec<String>>::builder()
            .filter(Arc::new(Trace("a")))
            .filter(Arc::new(Trace("b")))
            .build(handler());
        assert_eq!(chain.len(), 2);

        let mut trace = Vec::new();
        let response = chain.handle(&mut trace).unwrap();
        assert_eq!(response.message_type, MessageType::Service);
        assert_eq!(trace, vec!["a in", "b in", "handler", "b out", "a out"]);
    }

    #[test]
    fn test_filter_short_circuits() {
        let chain = FilterChain::<Vec<String>>::builder()
            .filter(Arc::new(Trace("a")))
            .filter(Arc::new(Reject))
            .filter(Arc::new(Trace("b")))
            .build(handler());

        let mut trace = Vec::new();
        let err = chain.handle(&mut trace).unwrap_err();
        assert_eq!(err, RpcError::Validation("rejected".to_string()));
        assert_eq!(trace, vec!["a in", "reject", "a out"]);
    }

    #[test]
    fn test_empty_chain_calls_handler() {
        let chain = FilterChain::<Vec<String>>::builder().build(handler());
        assert!(chain.is_empty());
        let mut trace = Vec::new();
        chain.handle(&mut trace).unwrap();
        assert_eq!(trace, vec!["handler"]);
    }
}
