//! Operations explorer: a development-only HTML console for the router.
//!
//! `GET /explorer` (or `/explorer/`) renders one test panel per registered
//! operation. Each panel posts its JSON input to `/{operation}` from the
//! browser and shows the raw response text.

use std::fmt;
use std::sync::Arc;

use axum::body::Body;
use axum::http::header::{CONTENT_LENGTH, CONTENT_TYPE};
use axum::http::{HeaderValue, Method, Request, StatusCode};
use axum::response::{IntoResponse, Response};
use reef_core::{OperationRegistry, OperationSet};
use tracing::{debug, error};

use super::html::Html;
use crate::service::Environment;

/// Path the explorer is served from unless configured otherwise.
pub const DEFAULT_EXPLORER_PATH: &str = "/explorer";

const HTML_CONTENT_TYPE: &str = "text/html; charset=UTF-8";

const DOCUMENT_HEAD: &str = r#"<!DOCTYPE html>
<html lang="en"><head>
<meta charset="utf-8">
<title>🪸 Reef Operations Explorer</title>
<style>
body { font-family: system-ui; margin: 40px; background: #f8f9fa; }
.container { max-width: 800px; margin: 0 auto; background: white; padding: 30px; border-radius: 8px; }
h1 { color: #2c3e50; }
.op { background: #f1f3f4; padding: 15px; margin: 10px 0; border-radius: 5px; }
textarea { width: 100%; height: 80px; font-family: monospace; }
button { background: #1976d2; color: white; padding: 8px 16px; border: none; border-radius: 4px; cursor: pointer; }
.resp { background: #263238; color: #eceff1; padding: 10px; margin-top: 10px; font-family: monospace; white-space: pre-wrap; }
</style></head><body>
<div class="container">
<h1>🪸 Reef Operations Explorer</h1>
"#;

// Operation names reach the script only through `data-op` attributes.
const CLIENT_SCRIPT: &str = r"<script>
async function testOperation(op) {
  const req = document.getElementById('req-' + op).value;
  const resp = document.getElementById('resp-' + op);
  resp.hidden = false;
  resp.textContent = 'Testing...';
  try {
    const r = await fetch('/' + encodeURIComponent(op), {
      method: 'POST',
      headers: {'Content-Type': 'application/json'},
      body: req
    });
    resp.textContent = await r.text();
  } catch (e) {
    resp.textContent = 'Error: ' + e.message;
  }
}
document.querySelectorAll('button.test').forEach(function (button) {
  button.addEventListener('click', function () { testOperation(button.dataset.op); });
});
</script>
";

const DOCUMENT_TAIL: &str = "</div></body></html>\n";

// ---------------------------------------------------------------------------
// ExplorerConfig
// ---------------------------------------------------------------------------

/// Settings for the operations explorer.
#[derive(Debug, Clone)]
pub struct ExplorerConfig {
    /// Whether the explorer may be installed at all. It is still only wired
    /// in when the server runs in development.
    pub enabled: bool,
    /// Introspection path. A trailing slash is accepted on requests either way.
    pub path: String,
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: DEFAULT_EXPLORER_PATH.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// ExplorerError
// ---------------------------------------------------------------------------

/// Failure while producing the explorer document.
#[derive(Debug, thiserror::Error)]
pub enum ExplorerError {
    #[error("failed to read operation registry: {0}")]
    Registry(#[source] anyhow::Error),
}

impl IntoResponse for ExplorerError {
    fn into_response(self) -> Response {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            [(CONTENT_TYPE, HeaderValue::from_static("text/plain; charset=UTF-8"))],
            format!("operations explorer unavailable: {self}"),
        )
            .into_response()
    }
}

// ---------------------------------------------------------------------------
// ExplorerPage
// ---------------------------------------------------------------------------

/// Serves the explorer document for requests to the introspection path.
///
/// Cloning is cheap; clones share the registry handle.
#[derive(Clone)]
pub struct ExplorerPage {
    path: Arc<str>,
    environment: Environment,
    registry: Arc<dyn OperationRegistry>,
}

impl ExplorerPage {
    /// Creates a page reading operation names from `registry`.
    #[must_use]
    pub fn new(
        config: &ExplorerConfig,
        environment: Environment,
        registry: Arc<dyn OperationRegistry>,
    ) -> Self {
        let trimmed = config.path.trim_end_matches('/');
        let path = if trimmed.is_empty() { "/" } else { trimmed };
        Self {
            path: Arc::from(path),
            environment,
            registry,
        }
    }

    /// The normalized introspection path (no trailing slash).
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns `true` if `path` is the introspection path, with or without a
    /// single trailing slash.
    #[must_use]
    pub fn matches(&self, path: &str) -> bool {
        let base: &str = &self.path;
        path == base || path.strip_suffix('/') == Some(base)
    }

    /// Serve the request if it targets the explorer, otherwise decline it.
    ///
    /// The request is only borrowed: on `None` the caller still owns it,
    /// body included, and forwards it to the next stage. Only `GET` and
    /// `HEAD` are served; the query string is ignored.
    pub fn try_handle<B>(&self, req: &Request<B>) -> Option<Response> {
        let is_read = matches!(*req.method(), Method::GET | Method::HEAD);
        if !is_read || !self.matches(req.uri().path()) {
            return None;
        }

        let response = match self.render() {
            Ok(document) => html_response(document),
            Err(e) => {
                error!(error = %e, path = %self.path, "failed to render operations explorer");
                e.into_response()
            }
        };
        Some(response)
    }

    /// Take one registry snapshot and render the full document from it.
    ///
    /// # Errors
    ///
    /// Returns `ExplorerError::Registry` if the registry cannot be read.
    pub fn render(&self) -> Result<String, ExplorerError> {
        let operations = self
            .registry
            .operation_names()
            .map_err(ExplorerError::Registry)?;
        debug!(operations = operations.len(), "rendering operations explorer");
        Ok(render_document(&operations, self.environment))
    }
}

impl fmt::Debug for ExplorerPage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExplorerPage")
            .field("path", &self.path)
            .field("environment", &self.environment)
            .finish_non_exhaustive()
    }
}

fn html_response(document: String) -> Response {
    let body = document.into_bytes();
    let len = body.len();
    (
        StatusCode::OK,
        [
            (CONTENT_TYPE, HeaderValue::from_static(HTML_CONTENT_TYPE)),
            (CONTENT_LENGTH, HeaderValue::from(len)),
        ],
        Body::from(body),
    )
        .into_response()
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

/// Render one test panel per operation, in snapshot order.
///
/// Each panel holds a heading, a JSON input pre-filled with `{}`, a Test
/// button and a hidden response region. An empty set renders nothing.
#[must_use]
pub fn render_operations_panel(operations: &OperationSet) -> Html {
    let mut html = Html::new();
    for op in operations {
        let name = op.as_str();
        html.raw("<div class=\"op\"")
            .attr("data-op", name)
            .raw(">\n<h3>")
            .text(name)
            .raw("</h3>\n<textarea")
            .attr("id", &format!("req-{name}"))
            .raw(" placeholder=\"JSON request\">{}</textarea><br>\n")
            .raw("<button type=\"button\" class=\"test\"")
            .attr("data-op", name)
            .raw(">Test</button>\n<div")
            .attr("id", &format!("resp-{name}"))
            .raw(" class=\"resp\" hidden></div>\n</div>\n");
    }
    html
}

/// Render the complete explorer document for a snapshot.
#[must_use]
pub fn render_document(operations: &OperationSet, environment: Environment) -> String {
    let panels = render_operations_panel(operations);

    let capacity = DOCUMENT_HEAD.len() + CLIENT_SCRIPT.len() + panels.as_str().len() + 256;
    let mut page = Html::with_capacity(capacity);
    page.raw(DOCUMENT_HEAD)
        .raw("<p class=\"summary\">Operations: <span id=\"operation-count\">")
        .text(&operations.len().to_string())
        .raw("</span> | Environment: ")
        .text(environment.label())
        .raw("</p>\n<div id=\"operations\">\n")
        .fragment(&panels)
        .raw("</div>\n")
        .raw(CLIENT_SCRIPT)
        .raw(DOCUMENT_TAIL);
    page.into_string()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
