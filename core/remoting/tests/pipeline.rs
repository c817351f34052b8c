// Copyright AGNTCY Contributors (https://github.com/agntcy)
// SPDX-License-Identifier: Apache-2.0

use std::sync::Arc;
use std::thread;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use parking_lot::Mutex;

use pigeon_auth::{
    KEY_APP_SECRETS, KEY_TOKEN_ENABLE, REQUEST_KEY_TIMESTAMP, REQUEST_KEY_TOKEN, SecurityError,
    SecurityGate, token,
};
use pigeon_config::ConfigManager;
use pigeon_monitor::TRANSACTION_FUTURE;
use pigeon_monitor::testutils::RecordingMonitor;
use pigeon_registry::ServiceDirectory;
use pigeon_registry::testutils::MockRegistry;
use pigeon_remoting::domain::{CallMethod, InvocationRequest, InvocationResponse, SerializerType};
use pigeon_remoting::future::ServiceFuture;
use pigeon_remoting::invoker::{ContextPrepareInvokeFilter, InvokerContextProcessor};
use pigeon_remoting::provider::SecurityFilter;
use pigeon_remoting::{
    ChannelInfo, FilterChain, InvocationHandler, InvokerConfig, InvokerContext, ProviderContext, RpcError,
};

const URL: &str = "http://service.demo/echo";
const ADDRESS: &str = "10.0.0.1:4040";
const SECRET: &str = "0123456789abcdef";

/// Signs every call with the secret of the calling app.
struct TokenSigner {
    secret: String,
}

impl InvokerContextProcessor for TokenSigner {
    fn pre_invoke(&self, ctx: &mut InvokerContext) {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or_default();
        if let Ok(signed) = token::generate(&self.secret, &ctx.request.service_name, &ctx.method_name, now) {
            ctx.local_context
                .insert(REQUEST_KEY_TOKEN.to_string(), signed);
            ctx.local_context
                .insert(REQUEST_KEY_TIMESTAMP.to_string(), now.to_string());
        }
    }
}

struct Cluster {
    invoker: FilterChain<InvokerContext>,
    provider: Arc<FilterChain<ProviderContext>>,
    // requests handed to the transport
    wire: Arc<Mutex<Vec<InvocationRequest>>>,
}

fn cluster(invoker_secret: &str) -> Cluster {
    let config = Arc::new(
        ConfigManager::new("shop-web", "10.1.1.1")
            .with_values([(KEY_TOKEN_ENABLE, "true"), (KEY_APP_SECRETS, "shop-web:0123456789abcdef")]),
    );
    let registry = Arc::new(MockRegistry::new("curator"));
    let directory = ServiceDirectory::builder(config.clone(), Arc::new(RecordingMonitor::new()))
        .with_backend(registry)
        .build()
        .unwrap();
    directory
        .add_service_address(URL, "10.0.0.1", 4040, 1)
        .unwrap();
    directory.set_referenced_version(ADDRESS, "2.10.0");

    let gate = Arc::new(SecurityGate::new(config.clone()));
    gate.register();
    let echo: Arc<dyn InvocationHandler<ProviderContext>> =
        Arc::new(|ctx: &mut ProviderContext| -> Result<InvocationResponse, RpcError> {
            let value = ctx.request.parameters.first().cloned().unwrap_or_default();
            Ok(InvocationResponse::service(ctx.request.sequence, value))
        });
    let provider = Arc::new(
        FilterChain::<ProviderContext>::builder()
            .filter(Arc::new(SecurityFilter::new(gate)))
            .build(echo),
    );

    let wire = Arc::new(Mutex::new(Vec::new()));
    let sent = wire.clone();
    let transport: Arc<dyn InvocationHandler<InvokerContext>> =
        Arc::new(move |ctx: &mut InvokerContext| -> Result<InvocationResponse, RpcError> {
            sent.lock().push(ctx.request.clone());
            Ok(InvocationResponse::service(ctx.request.sequence, serde_json::Value::Null))
        });
    let prepare = ContextPrepareInvokeFilter::new(config, directory).with_processor(Arc::new(TokenSigner {
        secret: invoker_secret.to_string(),
    }));
    let invoker = FilterChain::<InvokerContext>::builder()
        .filter(Arc::new(prepare))
        .build(transport);

    Cluster {
        invoker,
        provider,
        wire,
    }
}

impl Cluster {
    /// Deliver the last request to the provider from another thread and
    /// resolve `future` with its answer.
    fn deliver(&self, future: &ServiceFuture) -> thread::JoinHandle<()> {
        let request = self.wire.lock().pop().unwrap();
        let provider = self.provider.clone();
        let resolver = future.resolver();
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(10));
            let mut ctx = ProviderContext::new(request, ChannelInfo::new("10.1.1.1", "http"));
            match provider.handle(&mut ctx) {
                Ok(response) => resolver.callback(response),
                Err(e) => resolver.fail(e),
            };
        })
    }
}

fn call(config: &Arc<InvokerConfig>, argument: &str) -> InvokerContext {
    InvokerContext::new(config.clone(), ADDRESS, "echo")
        .with_arguments(vec!["string".to_string()], vec![serde_json::json!(argument)])
}

#[test]
fn test_signed_future_call_round_trip() {
    let cluster = cluster(SECRET);
    let monitor = RecordingMonitor::new();
    let config = Arc::new(
        InvokerConfig::new(URL)
            .with_call_method(CallMethod::Future)
            .with_serializer(SerializerType::Proto),
    );

    let mut ctx = call(&config, "hello").with_local_value("trace", "t-1");
    cluster.invoker.handle(&mut ctx).unwrap();
    assert!(ctx.local_context.is_empty());

    let future = ServiceFuture::new(ctx, Arc::new(monitor.clone()));
    let delivery = cluster.deliver(&future);
    assert_eq!(future.get().unwrap(), serde_json::json!("hello"));
    delivery.join().unwrap();

    assert_eq!(config.serializer(), SerializerType::Proto);
    assert_eq!(monitor.transactions()[0].name, TRANSACTION_FUTURE);
}

#[test]
fn test_wrong_secret_rejected_by_provider() {
    let cluster = cluster("fedcba9876543210");
    let config = Arc::new(InvokerConfig::new(URL));

    let mut ctx = call(&config, "hello");
    cluster.invoker.handle(&mut ctx).unwrap();

    let future = ServiceFuture::new(ctx, Arc::new(RecordingMonitor::new()));
    let delivery = cluster.deliver(&future);
    let err = future.get().unwrap_err();
    delivery.join().unwrap();

    assert!(matches!(
        err,
        RpcError::Security(SecurityError::InvalidToken { .. })
    ));
    assert!(!err.is_degradable());
}

#[test]
fn test_sequences_unique_across_threads() {
    let cluster = Arc::new(cluster(SECRET));
    let config = Arc::new(InvokerConfig::new(URL));

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let cluster = cluster.clone();
            let config = config.clone();
            thread::spawn(move || {
                let mut sequences = Vec::new();
                for _ in 0..50 {
                    let mut ctx = call(&config, "x");
                    cluster.invoker.handle(&mut ctx).unwrap();
                    sequences.push(ctx.request.sequence);
                }
                sequences
            })
        })
        .collect();

    let mut all = Vec::new();
    for handle in handles {
        let sequences = handle.join().unwrap();
        assert!(sequences.windows(2).all(|w| w[1] < w[0]));
        all.extend(sequences);
    }
    assert!(all.iter().all(|s| *s < 0));
    all.sort_unstable();
    all.dedup();
    assert_eq!(all.len(), 200);
}
