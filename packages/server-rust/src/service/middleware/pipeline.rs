//! Pipeline composition: combines all middleware layers into a single service stack.

use tower::ServiceBuilder;

use super::deadline::{DeadlineLayer, DeadlineService};
use super::load_shed::{LoadShedLayer, LoadShedService};
use super::metrics::{MetricsLayer, MetricsService};
use crate::service::router::OperationRouter;

/// The composed operation service returned by [`build_operation_pipeline`].
pub type OperationPipeline = LoadShedService<DeadlineService<MetricsService<OperationRouter>>>;

/// Build the operation pipeline by wrapping the `OperationRouter` with middleware layers.
///
/// Layer order (outermost to innermost):
/// 1. `LoadShedLayer` -- reject when overloaded (fail fast before doing any work)
/// 2. `DeadlineLayer` -- enforce per-call deadlines
/// 3. `MetricsLayer` -- record timing and outcome (closest to the actual handler)
///
/// The load-shed layer is passed in rather than built here so that every
/// pipeline built from it shares one concurrency budget.
#[must_use]
pub fn build_operation_pipeline(
    router: OperationRouter,
    load_shed: LoadShedLayer,
) -> OperationPipeline {
    ServiceBuilder::new()
        .layer(load_shed)
        .layer(DeadlineLayer)
        .layer(MetricsLayer)
        .service(router)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
