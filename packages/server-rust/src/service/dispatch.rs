//! Operation dispatch: builds call contexts and runs them through the pipeline.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde_json::Value;
use tower::ServiceExt;

use super::config::ServerConfig;
use super::middleware::{build_operation_pipeline, LoadShedLayer};
use super::operation::{Operation, OperationContext, OperationError, OperationResponse};
use super::router::OperationRouter;

// ---------------------------------------------------------------------------
// OperationService
// ---------------------------------------------------------------------------

/// Entry point for invoking operations by name.
///
/// Each call gets a unique call ID and the configured default timeout, then
/// runs through load shedding, timeout and metrics layers before reaching the
/// router. All calls share one load-shed budget.
pub struct OperationService {
    router: OperationRouter,
    load_shed: LoadShedLayer,
    config: Arc<ServerConfig>,
    call_id_counter: AtomicU64,
}

impl OperationService {
    /// Create a new `OperationService` over the given router.
    #[must_use]
    pub fn new(router: OperationRouter, config: Arc<ServerConfig>) -> Self {
        Self {
            router,
            load_shed: LoadShedLayer::new(config.max_concurrent_operations),
            config,
            call_id_counter: AtomicU64::new(1),
        }
    }

    /// Returns the router backing this service.
    #[must_use]
    pub fn router(&self) -> &OperationRouter {
        &self.router
    }

    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Generate a unique call ID for each operation.
    fn next_call_id(&self) -> u64 {
        self.call_id_counter.fetch_add(1, Ordering::Relaxed)
    }

    /// Build an `OperationContext` for a call to `name`.
    #[must_use]
    pub fn make_ctx(&self, name: &str) -> OperationContext {
        OperationContext::new(
            self.next_call_id(),
            name,
            self.config.default_operation_timeout_ms,
        )
    }

    /// Invoke the operation `name` with `payload`.
    ///
    /// # Errors
    ///
    /// Returns `OperationError::UnknownOperation` if nothing is registered
    /// under `name`, `Overloaded` or `Timeout` from the middleware, or
    /// whatever the handler itself returns.
    pub async fn dispatch(
        &self,
        name: &str,
        payload: Value,
    ) -> Result<OperationResponse, OperationError> {
        let op = Operation::new(self.make_ctx(name), payload);
        build_operation_pipeline(self.router.clone(), self.load_shed.clone())
            .oneshot(op)
            .await
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
