//! Reef Server — HTTP operation router with a development-only operations explorer.

pub mod devtools;
pub mod network;
pub mod service;
pub mod telemetry;

pub use devtools::{ExplorerConfig, ExplorerLayer, ExplorerPage};
pub use network::{NetworkConfig, NetworkModule};
pub use service::{
    handler_fn, Environment, OperationError, OperationHandler, OperationRouter, OperationService,
    ServerConfig,
};

#[cfg(test)]
mod tests {
    #[test]
    fn crate_loads() {
        // Empty body: if this test runs, the crate compiles and loads.
    }
}
