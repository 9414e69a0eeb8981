use crate::types::OperationSet;

/// Source of the operation names currently supported by a router.
///
/// Consumers call this once per request and work from the returned snapshot,
/// so implementations must be side-effect free and must not hand out a view
/// that changes underneath the caller.
pub trait OperationRegistry: Send + Sync {
    /// Snapshot the currently supported operation names.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing router cannot be read (e.g., a remote
    /// registry is unreachable).
    fn operation_names(&self) -> anyhow::Result<OperationSet>;
}

/// A fixed list of names. Used where no live router exists (tests, tooling).
impl OperationRegistry for OperationSet {
    fn operation_names(&self) -> anyhow::Result<OperationSet> {
        Ok(self.clone())
    }
}
