//! Vizij Remap Core (engine-agnostic)
//!
//! Bulk-renames the binding paths of animation curves: preview the new keys for a
//! captured snapshot, commit them against a keyed curve store, re-commit with new
//! inputs, and discard back to the captured originals.

pub mod clip;
pub mod config;
pub mod engine;
pub mod error;
pub mod key;
pub mod rewrite;
pub mod session;
pub mod status;
pub mod store;

// Re-exports for consumers (adapters)
pub use clip::{parse_clip_json, Clip, ClipCurve, Curve, Keyframe};
pub use config::{CollisionPolicy, Config, ReloadPolicy};
pub use engine::{
    ApplyReport, Checkpoint, CheckpointEntry, DiscardReport, LoadReport, Preview, PreviewEntry,
    RemapEngine,
};
pub use error::{MissingSource, RemapError, StoreError};
pub use key::{BindingKey, CapturedSet, TargetKind};
pub use rewrite::{RemapRequest, RewriteMode};
pub use session::{ClipSession, RemapSession, SessionAdapter, StoreValue};
pub use status::{Status, StatusLevel};
pub use store::{CurveStore, MemoryStore};
