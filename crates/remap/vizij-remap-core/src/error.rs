//! Error types for remap operations.

use crate::key::BindingKey;
use crate::rewrite::RewriteMode;
use serde::{Deserialize, Serialize};

/// A source key that was expected to hold a curve but did not.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissingSource {
    /// Position of the entry in the captured set.
    pub index: usize,
    pub key: BindingKey,
}

/// Errors reported by a curve store.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("store rejected write to {key}: {reason}")]
    Rejected { key: BindingKey, reason: String },
}

/// Errors surfaced by remap operations. Every variant is local to one call.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum RemapError {
    /// No clip/store is available from the session adapter.
    #[error("no active animation clip")]
    NoActiveSession,

    /// Nothing in the captured set matched the current preview.
    #[error("no bindings to update for search term '{search}'")]
    EmptyMatchSet { search: String },

    /// Input is empty where the rewrite mode needs it.
    #[error("invalid input for {mode} mode: {reason}")]
    InvalidInput { mode: RewriteMode, reason: String },

    /// Source keys were absent from the store. The store was not mutated.
    #[error("{} source binding(s) missing from the store (first: {})", .missing.len(), first_missing(.missing))]
    MissingSourceValue { missing: Vec<MissingSource> },

    /// Two entries, or an entry and unrelated data, would land on the same key.
    #[error("target binding {key} is already occupied")]
    TargetCollision { key: BindingKey },

    /// A reload was requested while an applied rename was still pending.
    #[error("{pending} applied rename(s) would be abandoned by reloading")]
    DirtyReload { pending: usize },

    /// The store failed mid-relocation.
    #[error("store error ({}): {source}", rollback_note(.rolled_back))]
    Store {
        #[source]
        source: StoreError,
        rolled_back: bool,
    },
}

fn first_missing(missing: &[MissingSource]) -> String {
    missing
        .first()
        .map(|m| m.key.to_string())
        .unwrap_or_default()
}

fn rollback_note(rolled_back: &bool) -> &'static str {
    if *rolled_back {
        "rolled back"
    } else {
        "rollback incomplete"
    }
}

impl RemapError {
    /// True when the prior store state is known to be intact.
    #[inline]
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Store { rolled_back, .. } => *rolled_back,
            _ => true,
        }
    }

    /// Error category for logging and status display.
    #[inline]
    pub fn category(&self) -> &'static str {
        match self {
            Self::NoActiveSession | Self::DirtyReload { .. } => "session",
            Self::EmptyMatchSet { .. } | Self::InvalidInput { .. } => "validation",
            Self::MissingSourceValue { .. } | Self::TargetCollision { .. } => "consistency",
            Self::Store { .. } => "store",
        }
    }
}
