//! Operation routing and execution framework.
//!
//! This module implements the operation pipeline behind `POST /{operation}`:
//!
//! 1. **Dispatch** (`dispatch`): name + JSON payload -> `Operation` with a fresh context
//! 2. **Middleware** (`middleware`): Tower layers (load-shedding, timeout, metrics)
//! 3. **Routing** (`router`): Dispatch to the handler registered under the operation name

pub mod config;
pub mod dispatch;
pub mod middleware;
pub mod operation;
pub mod router;

// Re-export key types for convenient access.
pub use config::{Environment, ServerConfig};
pub use dispatch::OperationService;
pub use operation::{Operation, OperationContext, OperationError, OperationResponse};
pub use router::{handler_fn, HandlerFn, OperationHandler, OperationRouter};
