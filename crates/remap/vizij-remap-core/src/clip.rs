//! JSON animation clip: a list of curves, each addressed by a BindingKey.
//!
//! {
//!   "name": "wave",
//!   "duration": 2000,
//!   "curves": [
//!     { "path": "Root/Arm", "type": "Transform", "property": "m_LocalPosition.x",
//!       "keys": [ { "time": 0.0, "value": 0.0 }, { "time": 1.0, "value": 0.5 } ] }
//!   ]
//! }
//!
//! Clip is the concrete CurveStore used by the session adapters and the wasm binding.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::key::{BindingKey, CapturedSet};
use crate::store::CurveStore;

/// A single keyframe. Time is in seconds.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Keyframe {
    pub time: f32,
    pub value: f32,
    #[serde(default, rename = "inTangent")]
    pub in_tangent: f32,
    #[serde(default, rename = "outTangent")]
    pub out_tangent: f32,
}

impl Keyframe {
    pub fn new(time: f32, value: f32) -> Self {
        Self {
            time,
            value,
            in_tangent: 0.0,
            out_tangent: 0.0,
        }
    }
}

/// Animation data for one binding.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Curve {
    #[serde(default)]
    pub keys: Vec<Keyframe>,
}

impl Curve {
    pub fn new(keys: Vec<Keyframe>) -> Self {
        Self { keys }
    }
}

/// A curve together with the binding it animates.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClipCurve {
    #[serde(flatten)]
    pub binding: BindingKey,
    #[serde(flatten)]
    pub curve: Curve,
}

/// Serialized form of a clip: curves as a flat list.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
struct ClipFile {
    name: String,
    #[serde(default)]
    duration: u32,
    #[serde(default)]
    curves: Vec<ClipCurve>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ClipFile", into = "ClipFile")]
pub struct Clip {
    pub name: String,
    /// Duration in milliseconds.
    pub duration_ms: u32,
    curves: IndexMap<BindingKey, Curve>,
}

impl TryFrom<ClipFile> for Clip {
    type Error = String;

    fn try_from(file: ClipFile) -> Result<Self, String> {
        let mut curves = IndexMap::with_capacity(file.curves.len());
        for ClipCurve { binding, curve } in file.curves {
            if curves.contains_key(&binding) {
                return Err(format!("duplicate curve binding '{binding}'"));
            }
            curves.insert(binding, curve);
        }
        Ok(Self {
            name: file.name,
            duration_ms: file.duration,
            curves,
        })
    }
}

impl From<Clip> for ClipFile {
    fn from(clip: Clip) -> Self {
        Self {
            name: clip.name,
            duration: clip.duration_ms,
            curves: clip
                .curves
                .into_iter()
                .map(|(binding, curve)| ClipCurve { binding, curve })
                .collect(),
        }
    }
}

impl Clip {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Builder-style curve insertion, mostly for tests and tools.
    pub fn with_curve(mut self, binding: BindingKey, curve: Curve) -> Self {
        self.curves.insert(binding, curve);
        self
    }

    /// Keys of all curves in clip order.
    pub fn bindings(&self) -> CapturedSet {
        self.curves.keys().cloned().collect()
    }

    pub fn curve(&self, key: &BindingKey) -> Option<&Curve> {
        self.curves.get(key)
    }

    /// Curves in clip order.
    pub fn curves(&self) -> impl Iterator<Item = (&BindingKey, &Curve)> {
        self.curves.iter()
    }

    pub fn len(&self) -> usize {
        self.curves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.curves.is_empty()
    }

    /// Validate keyframes: finite values and non-decreasing times.
    pub fn validate_basic(&self) -> Result<(), String> {
        for (binding, curve) in &self.curves {
            let mut last = -f32::INFINITY;
            for k in &curve.keys {
                if !k.time.is_finite() || !k.value.is_finite() {
                    return Err(format!("keyframe must be finite for '{binding}'"));
                }
                if k.time < last {
                    return Err(format!(
                        "keyframe times must be non-decreasing for '{binding}'"
                    ));
                }
                last = k.time;
            }
        }
        Ok(())
    }
}

/// Parse clip JSON and validate it. Duplicate bindings are rejected while parsing.
pub fn parse_clip_json(s: &str) -> Result<Clip, String> {
    let clip: Clip = serde_json::from_str(s).map_err(|e| format!("parse error: {e}"))?;
    clip.validate_basic()?;
    Ok(clip)
}

impl CurveStore for Clip {
    type Value = Curve;

    fn get(&self, key: &BindingKey) -> Option<Curve> {
        self.curves.get(key).cloned()
    }

    fn set(&mut self, key: &BindingKey, value: Option<Curve>) -> Result<(), StoreError> {
        match value {
            Some(curve) => {
                self.curves.insert(key.clone(), curve);
            }
            None => {
                self.curves.shift_remove(key);
            }
        }
        Ok(())
    }

    fn contains(&self, key: &BindingKey) -> bool {
        self.curves.contains_key(key)
    }
}
