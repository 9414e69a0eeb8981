use std::borrow::Borrow;
use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of an operation exposed by the router.
///
/// No structure is assumed beyond being a string. Names are interpolated into
/// HTML and element ids by the explorer, so every consumer that renders them
/// must escape for its context.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OperationName(String);

impl OperationName {
    /// Wraps a string as an operation name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for OperationName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for OperationName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for OperationName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for OperationName {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl From<String> for OperationName {
    fn from(name: String) -> Self {
        Self(name)
    }
}

/// Immutable snapshot of the operations supported at one point in time.
///
/// Entries are deduplicated and kept in lexicographic order, so two renders of
/// the same snapshot produce identical output. Mutating the registry after the
/// snapshot was taken never affects it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OperationSet {
    names: Vec<OperationName>,
}

impl OperationSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct operations in the snapshot.
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Returns `true` if the snapshot contains `name`.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.names
            .binary_search_by(|probe| probe.as_str().cmp(name))
            .is_ok()
    }

    /// Iterates names in snapshot order.
    pub fn iter(&self) -> std::slice::Iter<'_, OperationName> {
        self.names.iter()
    }
}

impl<N: Into<OperationName>> FromIterator<N> for OperationSet {
    fn from_iter<I: IntoIterator<Item = N>>(iter: I) -> Self {
        let unique: BTreeSet<OperationName> = iter.into_iter().map(Into::into).collect();
        Self {
            names: unique.into_iter().collect(),
        }
    }
}

impl IntoIterator for OperationSet {
    type Item = OperationName;
    type IntoIter = std::vec::IntoIter<OperationName>;

    fn into_iter(self) -> Self::IntoIter {
        self.names.into_iter()
    }
}

impl<'a> IntoIterator for &'a OperationSet {
    type Item = &'a OperationName;
    type IntoIter = std::slice::Iter<'a, OperationName>;

    fn into_iter(self) -> Self::IntoIter {
        self.names.iter()
    }
}
