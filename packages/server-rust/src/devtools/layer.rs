//! Tower layer that puts the explorer in front of the rest of the HTTP stack.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use axum::http::Request;
use axum::response::Response;
use tower::{Layer, Service, ServiceExt};

use super::explorer::ExplorerPage;

// ---------------------------------------------------------------------------
// ExplorerLayer
// ---------------------------------------------------------------------------

/// Intercepts requests for the explorer path and forwards everything else.
#[derive(Debug, Clone)]
pub struct ExplorerLayer {
    page: ExplorerPage,
}

impl ExplorerLayer {
    #[must_use]
    pub fn new(page: ExplorerPage) -> Self {
        Self { page }
    }
}

impl<S> Layer<S> for ExplorerLayer {
    type Service = ExplorerService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        ExplorerService {
            inner,
            page: self.page.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// ExplorerService
// ---------------------------------------------------------------------------

/// Service wrapper produced by [`ExplorerLayer`].
///
/// Requests the page declines are handed to `inner` as-is, so the next stage
/// receives the original request and its unread body. `inner` is only driven
/// to readiness for requests it will actually receive, so explorer hits never
/// hold a slot in a limiting inner service.
#[derive(Debug, Clone)]
pub struct ExplorerService<S> {
    inner: S,
    page: ExplorerPage,
}

impl<S, B> Service<Request<B>> for ExplorerService<S>
where
    S: Service<Request<B>, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
    S::Error: Send + 'static,
    B: Send + 'static,
{
    type Response = Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Response, S::Error>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<B>) -> Self::Future {
        if let Some(response) = self.page.try_handle(&req) {
            return Box::pin(async move { Ok(response) });
        }
        Box::pin(self.inner.clone().oneshot(req))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::convert::Infallible;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use axum::body::{to_bytes, Body};
    use axum::http::{Method, StatusCode};
    use axum::response::IntoResponse;
    use reef_core::OperationSet;

    use super::*;
    use crate::devtools::ExplorerConfig;
    use crate::service::Environment;

    fn layer() -> ExplorerLayer {
        let ops: OperationSet = ["CreateWidget", "DeleteWidget"].into_iter().collect();
        ExplorerLayer::new(ExplorerPage::new(
            &ExplorerConfig::default(),
            Environment::Development,
            Arc::new(ops),
        ))
    }

    /// Inner stage that counts readiness polls and calls, and echoes method,
    /// path and body.
    #[derive(Clone)]
    struct EchoService {
        calls: Arc<AtomicUsize>,
        readied: Arc<AtomicUsize>,
    }

    impl Service<Request<Body>> for EchoService {
        type Response = Response;
        type Error = Infallible;
        type Future = Pin<Box<dyn Future<Output = Result<Response, Infallible>> + Send>>;

        fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
            self.readied.fetch_add(1, Ordering::SeqCst);
            Poll::Ready(Ok(()))
        }

        fn call(&mut self, req: Request<Body>) -> Self::Future {
            let calls = Arc::clone(&self.calls);
            Box::pin(async move {
                calls.fetch_add(1, Ordering::SeqCst);
                let method = req.method().clone();
                let path = req.uri().path().to_string();
                let body = to_bytes(req.into_body(), usize::MAX)
                    .await
                    .unwrap_or_default();
                let text = format!("{method} {path} {}", String::from_utf8_lossy(&body));
                Ok((StatusCode::IM_A_TEAPOT, text).into_response())
            })
        }
    }

    fn echo_inner(calls: Arc<AtomicUsize>) -> EchoService {
        EchoService {
            calls,
            readied: Arc::new(AtomicUsize::new(0)),
        }
    }

    async fn body_string(resp: Response) -> String {
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn explorer_path_never_reaches_inner() {
        let calls = Arc::new(AtomicUsize::new(0));
        let svc = layer().layer(echo_inner(Arc::clone(&calls)));

        for path in ["/explorer", "/explorer/"] {
            let req = Request::builder().uri(path).body(Body::empty()).unwrap();
            let resp = svc.clone().oneshot(req).await.unwrap();
            assert_eq!(resp.status(), StatusCode::OK);
            assert!(body_string(resp).await.contains("<h3>CreateWidget</h3>"));
        }
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn other_requests_pass_through_with_body() {
        let calls = Arc::new(AtomicUsize::new(0));
        let svc = layer().layer(echo_inner(Arc::clone(&calls)));

        let req = Request::builder()
            .method(Method::POST)
            .uri("/CreateWidget")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"name":"x"}"#))
            .unwrap();
        let resp = svc.oneshot(req).await.unwrap();

        assert_eq!(resp.status(), StatusCode::IM_A_TEAPOT);
        assert_eq!(body_string(resp).await, r#"POST /CreateWidget {"name":"x"}"#);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn post_to_explorer_path_passes_through() {
        let calls = Arc::new(AtomicUsize::new(0));
        let svc = layer().layer(echo_inner(Arc::clone(&calls)));

        let req = Request::builder()
            .method(Method::POST)
            .uri("/explorer")
            .body(Body::from("{}"))
            .unwrap();
        let resp = svc.oneshot(req).await.unwrap();

        assert_eq!(body_string(resp).await, "POST /explorer {}");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn explorer_hits_leave_inner_unreadied() {
        let readied = Arc::new(AtomicUsize::new(0));
        let inner = EchoService {
            calls: Arc::new(AtomicUsize::new(0)),
            readied: Arc::clone(&readied),
        };
        let mut svc = layer().layer(inner);

        let req = Request::builder().uri("/explorer").body(Body::empty()).unwrap();
        let resp = ServiceExt::<Request<Body>>::ready(&mut svc)
            .await
            .unwrap()
            .call(req)
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(readied.load(Ordering::SeqCst), 0);

        let req = Request::builder()
            .method(Method::POST)
            .uri("/CreateWidget")
            .body(Body::empty())
            .unwrap();
        ServiceExt::<Request<Body>>::ready(&mut svc)
            .await
            .unwrap()
            .call(req)
            .await
            .unwrap();
        assert_eq!(readied.load(Ordering::SeqCst), 1);
    }
}
