//! Reef Core — operation names, registry snapshots, and the registry contract.

pub mod traits;
pub mod types;

pub use traits::OperationRegistry;
pub use types::{OperationName, OperationSet};

#[cfg(test)]
mod tests {
    #[test]
    fn crate_loads() {
        // Empty body: if this test runs, the crate compiles and loads.
    }
}
