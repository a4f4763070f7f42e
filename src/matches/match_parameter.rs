// 3rd party imports
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Descriptor of a parameter kind. The key is the stable identity used
/// for table naming, so changing it orphans previously written tables.
///
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParameterKind {
    /// Stable identity of the kind
    key: &'static str,
}

impl ParameterKind {
    /// Creates a new parameter kind descriptor
    ///
    /// # Arguments
    /// * `key` - Stable identity of the kind
    ///
    pub const fn new(key: &'static str) -> Self {
        Self { key }
    }

    /// Returns the stable identity of the kind
    pub const fn key(&self) -> &'static str {
        self.key
    }
}

/// Annotation attachable to identification matches. Every implementing
/// kind gets its own tables, named from the kind's stable key combined
/// with the owning category (and, for spectrum parameters, the MS run
/// file), so instances of different kinds never share a table.
///
pub trait MatchParameter: Serialize + DeserializeOwned {
    /// Descriptor of this parameter kind
    const KIND: ParameterKind;
}
