//! Tower middleware layers for the operation pipeline.
//!
//! - [`deadline`]: Per-call deadlines
//! - [`metrics`]: Operation timing and outcome via `tracing` spans
//! - [`load_shed`]: Semaphore-based concurrency limiting
//! - [`pipeline`]: Composes all layers into a single service stack

pub mod deadline;
pub mod load_shed;
pub mod metrics;
pub mod pipeline;

pub use deadline::DeadlineLayer;
pub use load_shed::LoadShedLayer;
pub use metrics::MetricsLayer;
pub use pipeline::{build_operation_pipeline, OperationPipeline};
