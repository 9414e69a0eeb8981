//! Operation routing: dispatches `Operation` to registered handlers by name.

use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use arc_swap::ArcSwap;
use async_trait::async_trait;
use reef_core::{OperationName, OperationRegistry, OperationSet};
use serde_json::Value;
use tower::Service;
use tracing::debug;

use super::operation::{Operation, OperationContext, OperationError, OperationResponse};

// ---------------------------------------------------------------------------
// OperationHandler
// ---------------------------------------------------------------------------

/// Executes a single named operation.
#[async_trait]
pub trait OperationHandler: Send + Sync {
    /// Handle one call. The returned value becomes the HTTP response body.
    async fn handle(&self, ctx: OperationContext, payload: Value) -> Result<Value, OperationError>;
}

/// Adapter that lets a plain async closure act as an `OperationHandler`.
pub struct HandlerFn<F>(F);

/// Wrap an async closure as an `OperationHandler`.
pub fn handler_fn<F, Fut>(f: F) -> HandlerFn<F>
where
    F: Fn(OperationContext, Value) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Value, OperationError>> + Send + 'static,
{
    HandlerFn(f)
}

#[async_trait]
impl<F, Fut> OperationHandler for HandlerFn<F>
where
    F: Fn(OperationContext, Value) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Value, OperationError>> + Send + 'static,
{
    async fn handle(&self, ctx: OperationContext, payload: Value) -> Result<Value, OperationError> {
        (self.0)(ctx, payload).await
    }
}

type HandlerMap = BTreeMap<OperationName, Arc<dyn OperationHandler>>;

type BoxedFuture = Pin<Box<dyn Future<Output = Result<OperationResponse, OperationError>> + Send>>;

// ---------------------------------------------------------------------------
// OperationRouter
// ---------------------------------------------------------------------------

/// Routes `Operation` values to the handler registered under their name.
///
/// The handler table is copy-on-write behind an `ArcSwap`: registration swaps
/// in a new map, while readers (dispatch and `operation_names`) take a single
/// atomic load and never block. Clones share the same table.
#[derive(Clone)]
pub struct OperationRouter {
    handlers: Arc<ArcSwap<HandlerMap>>,
}

impl OperationRouter {
    /// Create a new empty router.
    #[must_use]
    pub fn new() -> Self {
        Self {
            handlers: Arc::new(ArcSwap::from_pointee(HandlerMap::new())),
        }
    }

    /// Register a handler under `name`, replacing any existing handler.
    pub fn register<H>(&self, name: impl Into<OperationName>, handler: H)
    where
        H: OperationHandler + 'static,
    {
        let name = name.into();
        let handler: Arc<dyn OperationHandler> = Arc::new(handler);
        self.handlers.rcu(|current| {
            let mut next = HandlerMap::clone(current);
            next.insert(name.clone(), Arc::clone(&handler));
            next
        });
        debug!(operation = %name, "operation registered");
    }

    /// Remove the handler registered under `name`.
    ///
    /// Returns `true` if a handler was removed.
    pub fn deregister(&self, name: &str) -> bool {
        let mut removed = false;
        self.handlers.rcu(|current| {
            let mut next = HandlerMap::clone(current);
            removed = next.remove(name).is_some();
            next
        });
        if removed {
            debug!(operation = name, "operation deregistered");
        }
        removed
    }

    /// Returns `true` if an operation with this name is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.handlers.load().contains_key(name)
    }

    /// Number of registered operations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.load().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.load().is_empty()
    }
}

impl Default for OperationRouter {
    fn default() -> Self {
        Self::new()
    }
}

impl OperationRegistry for OperationRouter {
    fn operation_names(&self) -> anyhow::Result<OperationSet> {
        Ok(self.handlers.load().keys().cloned().collect())
    }
}

impl Service<Operation> for OperationRouter {
    type Response = OperationResponse;
    type Error = OperationError;
    type Future = BoxedFuture;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, op: Operation) -> Self::Future {
        let handler = self.handlers.load().get(op.ctx.operation.as_str()).cloned();
        match handler {
            Some(handler) => Box::pin(async move {
                let call_id = op.ctx.call_id;
                let body = handler.handle(op.ctx, op.payload).await?;
                Ok(OperationResponse { call_id, body })
            }),
            None => Box::pin(async move {
                Err(OperationError::UnknownOperation {
                    name: op.ctx.operation.into_inner(),
                })
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
