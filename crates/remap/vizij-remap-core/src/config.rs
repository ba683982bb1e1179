//! Remap configuration.

use serde::{Deserialize, Serialize};

/// What `load` does when an applied rename has not been discarded.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReloadPolicy {
    /// Log a warning and abandon the checkpoint; the renamed keys stay in the store.
    #[default]
    Warn,
    /// Refuse the reload with `DirtyReload`.
    Reject,
}

/// What relocation does when a target key already holds unrelated data.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollisionPolicy {
    #[default]
    Reject,
    Overwrite,
}

/// Engine configuration. Missing fields take their defaults when deserialized.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub reload: ReloadPolicy,
    pub collisions: CollisionPolicy,
}
