//! Scripted transports and connection factories.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::error::{PoolError, TransportError};
use crate::port::{SoapRequest, SoapResponse, Transport, TransportFactory};

/// One scripted reply: an optional delay then a result.
#[derive(Debug, Clone)]
pub struct Reply {
    pub delay: Duration,
    pub result: Result<SoapResponse, TransportError>,
}

impl Reply {
    pub fn ok(body: impl Into<String>) -> Self {
        Self::status(200, body)
    }

    pub fn status(status: u16, body: impl Into<String>) -> Self {
        Self {
            delay: Duration::ZERO,
            result: Ok(SoapResponse {
                status,
                body: body.into(),
            }),
        }
    }

    pub fn err(err: TransportError) -> Self {
        Self {
            delay: Duration::ZERO,
            result: Err(err),
        }
    }

    pub fn after(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

type Responder = dyn Fn(&SoapRequest) -> Reply + Send + Sync;

/// Answers every request through a responder closure and records what it saw.
pub struct ScriptedTransport {
    responder: Arc<Responder>,
    seen: Mutex<Vec<SoapRequest>>,
}

impl ScriptedTransport {
    pub fn from_fn(f: impl Fn(&SoapRequest) -> Reply + Send + Sync + 'static) -> Self {
        Self::shared(Arc::new(f))
    }

    fn shared(responder: Arc<Responder>) -> Self {
        Self {
            responder,
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn always_ok(body: String) -> Self {
        Self::from_fn(move |_| Reply::ok(body.clone()))
    }

    pub fn always_err(err: TransportError) -> Self {
        Self::from_fn(move |_| Reply::err(err.clone()))
    }

    /// Succeeds with `body` after `delay`.
    pub fn ok_after(body: String, delay: Duration) -> Self {
        Self::from_fn(move |_| Reply::ok(body.clone()).after(delay))
    }

    pub fn requests(&self) -> Vec<SoapRequest> {
        self.seen.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }

    pub fn call_count(&self) -> usize {
        self.seen.lock().unwrap_or_else(|p| p.into_inner()).len()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: SoapRequest) -> Result<SoapResponse, TransportError> {
        let reply = (self.responder)(&request);
        self.seen
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .push(request);
        if !reply.delay.is_zero() {
            tokio::time::sleep(reply.delay).await;
        }
        reply.result
    }
}

/// Counters shared between a factory and the test observing it.
#[derive(Debug, Default)]
pub struct FactoryCounters {
    /// Connections opened.
    pub opened: AtomicU64,
    /// Requests sent across all connections.
    pub sent: AtomicUsize,
}

impl FactoryCounters {
    pub fn opened(&self) -> u64 {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn sent(&self) -> usize {
        self.sent.load(Ordering::SeqCst)
    }
}

struct CountedTransport {
    inner: ScriptedTransport,
    counters: Arc<FactoryCounters>,
}

#[async_trait]
impl Transport for CountedTransport {
    async fn send(&self, request: SoapRequest) -> Result<SoapResponse, TransportError> {
        self.counters.sent.fetch_add(1, Ordering::SeqCst);
        self.inner.send(request).await
    }
}

/// A factory whose connections all answer through `responder`.
pub fn counting_factory(
    responder: impl Fn(&SoapRequest) -> Reply + Send + Sync + 'static,
) -> (TransportFactory, Arc<FactoryCounters>) {
    let counters = Arc::new(FactoryCounters::default());
    let responder: Arc<Responder> = Arc::new(responder);
    let shared = Arc::clone(&counters);
    let factory: TransportFactory = Arc::new(move |_id: u64| -> Result<Box<dyn Transport>, PoolError> {
        shared.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(CountedTransport {
            inner: ScriptedTransport::shared(Arc::clone(&responder)),
            counters: Arc::clone(&shared),
        }) as Box<dyn Transport>)
    });
    (factory, counters)
}

/// A factory that can never open a connection.
pub fn failing_factory(reason: &str) -> TransportFactory {
    let reason = reason.to_string();
    Arc::new(move |_id: u64| -> Result<Box<dyn Transport>, PoolError> {
        Err(PoolError::Connect(reason.clone()))
    })
}
