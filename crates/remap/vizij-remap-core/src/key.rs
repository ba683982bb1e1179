//! Binding keys and the captured key set.
//!
//! A BindingKey names one animated property inside a clip:
//!   path     "Root/Arm/Hand"        '/'-separated node locator
//!   type     "Transform"            component kind on that node
//!   property "m_LocalPosition.x"    animated field on the component
//!
//! Only `path` is ever rewritten by the remapper; kind and property travel unchanged.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Component kind a binding targets (e.g. "Transform", "SkinnedMeshRenderer").
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TargetKind(pub String);

impl TargetKind {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Immutable (path, kind, property) triple. Equality is structural.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BindingKey {
    pub path: String,
    #[serde(rename = "type")]
    pub target_kind: TargetKind,
    pub property: String,
}

impl BindingKey {
    pub fn new(
        path: impl Into<String>,
        target_kind: impl Into<String>,
        property: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            target_kind: TargetKind(target_kind.into()),
            property: property.into(),
        }
    }

    /// Clone this key with a different path; kind and property are kept.
    pub fn with_path(&self, path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            target_kind: self.target_kind.clone(),
            property: self.property.clone(),
        }
    }

    /// Iterate over the '/'-separated path segments. The root binding ("") yields nothing.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.path.split('/').filter(|s| !s.is_empty())
    }
}

impl fmt::Display for BindingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}.{}", self.path, self.target_kind, self.property)
    }
}

/// Ordered snapshot of keys taken when a clip is loaded.
///
/// Indices are stable for the lifetime of the snapshot; previews and checkpoints
/// refer back to originals by index.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CapturedSet {
    keys: Vec<BindingKey>,
}

impl CapturedSet {
    pub fn new(keys: Vec<BindingKey>) -> Self {
        Self { keys }
    }

    pub fn get(&self, index: usize) -> Option<&BindingKey> {
        self.keys.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &BindingKey> {
        self.keys.iter()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn as_slice(&self) -> &[BindingKey] {
        &self.keys
    }
}

impl FromIterator<BindingKey> for CapturedSet {
    fn from_iter<I: IntoIterator<Item = BindingKey>>(iter: I) -> Self {
        Self {
            keys: iter.into_iter().collect(),
        }
    }
}
