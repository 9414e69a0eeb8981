//! Per-call deadlines for the operation pipeline.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use tokio::time::Instant;
use tower::{Layer, Service};
use tracing::warn;

use crate::service::operation::{Operation, OperationError, OperationResponse};

/// Applies `ctx.call_timeout_ms` as a deadline to each call.
///
/// The deadline is fixed when the call is made, so time spent waiting to be
/// polled counts against it. A timeout of `0` means no deadline.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeadlineLayer;

impl<S> Layer<S> for DeadlineLayer {
    type Service = DeadlineService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        DeadlineService { inner }
    }
}

#[derive(Debug, Clone)]
pub struct DeadlineService<S> {
    inner: S,
}

impl<S> Service<Operation> for DeadlineService<S>
where
    S: Service<Operation, Response = OperationResponse, Error = OperationError>,
    S::Future: Send + 'static,
{
    type Response = OperationResponse;
    type Error = OperationError;
    type Future = Pin<Box<dyn Future<Output = Result<OperationResponse, OperationError>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, op: Operation) -> Self::Future {
        let timeout_ms = op.ctx.call_timeout_ms;
        if timeout_ms == 0 {
            return Box::pin(self.inner.call(op));
        }

        let deadline = Instant::now() + Duration::from_millis(timeout_ms);
        let operation = op.ctx.operation.clone();
        let call_id = op.ctx.call_id;
        let fut = self.inner.call(op);
        Box::pin(async move {
            tokio::time::timeout_at(deadline, fut).await.unwrap_or_else(|_| {
                warn!(%operation, call_id, timeout_ms, "operation deadline exceeded");
                Err(OperationError::Timeout { timeout_ms })
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::service::operation::OperationContext;
    use crate::service::router::{handler_fn, OperationRouter};

    fn sleeper(delay_ms: u64) -> OperationRouter {
        let router = OperationRouter::new();
        router.register(
            "Sleep",
            handler_fn(move |_ctx, _payload| async move {
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                Ok(Value::Null)
            }),
        );
        router
    }

    fn sleep_op(timeout_ms: u64) -> Operation {
        Operation::new(OperationContext::new(7, "Sleep", timeout_ms), json!({}))
    }

    #[tokio::test(start_paused = true)]
    async fn finishes_inside_deadline() {
        let svc = DeadlineLayer.layer(sleeper(10));
        let resp = svc.oneshot(sleep_op(1_000)).await.unwrap();
        assert_eq!(resp.call_id, 7);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_call_times_out() {
        let svc = DeadlineLayer.layer(sleeper(200));
        let err = svc.oneshot(sleep_op(50)).await.unwrap_err();
        assert!(matches!(err, OperationError::Timeout { timeout_ms: 50 }));
    }

    #[tokio::test(start_paused = true)]
    async fn zero_timeout_disables_deadline() {
        let svc = DeadlineLayer.layer(sleeper(60_000));
        let resp = svc.oneshot(sleep_op(0)).await.unwrap();
        assert_eq!(resp.body, Value::Null);
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_starts_when_call_is_made() {
        let mut svc = DeadlineLayer.layer(sleeper(10));
        let fut = ServiceExt::<Operation>::ready(&mut svc)
            .await
            .unwrap()
            .call(sleep_op(50));

        // Sitting unpolled past the deadline uses up the budget.
        tokio::time::advance(Duration::from_millis(60)).await;

        let err = fut.await.unwrap_err();
        assert!(matches!(err, OperationError::Timeout { timeout_ms: 50 }));
    }
}
