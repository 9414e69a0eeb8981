//! Operation types carried through the dispatch pipeline.

use reef_core::OperationName;
use serde_json::Value;

/// Context carried with every operation through the pipeline.
#[derive(Debug, Clone)]
pub struct OperationContext {
    /// Unique, monotonically increasing identifier for this call.
    pub call_id: u64,
    /// Name of the operation being invoked.
    pub operation: OperationName,
    /// Deadline for the call, enforced by `DeadlineLayer`. `0` disables it.
    pub call_timeout_ms: u64,
}

impl OperationContext {
    /// Create a context for a call to `operation`.
    #[must_use]
    pub fn new(call_id: u64, operation: impl Into<OperationName>, call_timeout_ms: u64) -> Self {
        Self {
            call_id,
            operation: operation.into(),
            call_timeout_ms,
        }
    }
}

/// A single invocation of a named operation with its JSON payload.
#[derive(Debug)]
pub struct Operation {
    pub ctx: OperationContext,
    pub payload: Value,
}

impl Operation {
    #[must_use]
    pub fn new(ctx: OperationContext, payload: Value) -> Self {
        Self { ctx, payload }
    }

    /// Returns the operation context.
    #[must_use]
    pub fn ctx(&self) -> &OperationContext {
        &self.ctx
    }
}

/// Successful response from an operation handler.
#[derive(Debug, Clone, PartialEq)]
pub struct OperationResponse {
    pub call_id: u64,
    pub body: Value,
}

/// Errors returned by the operation pipeline.
#[derive(Debug, thiserror::Error)]
pub enum OperationError {
    #[error("unknown operation: {name}")]
    UnknownOperation { name: String },
    #[error("operation timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },
    #[error("server overloaded, try again later")]
    Overloaded,
    #[error("invalid payload: {0}")]
    InvalidPayload(String),
    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl OperationError {
    /// Short machine-readable tag, used in logs and error bodies.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::UnknownOperation { .. } => "unknown_operation",
            Self::Timeout { .. } => "timeout",
            Self::Overloaded => "overloaded",
            Self::InvalidPayload(_) => "invalid_payload",
            Self::Internal(_) => "internal",
        }
    }
}
