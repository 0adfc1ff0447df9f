//! Snapshot export/import
//!
//! The JSON layout is shared with the sandbox editor:
//!
//! ```json
//! {
//!   "stars": [
//!     { "position": { "x": 900, "y": 300, "z": 0 },
//!       "speed": { "x": 1.5, "y": 1.5, "z": 0 },
//!       "color": "blue", "size": 10 }
//!   ],
//!   "params": { "g": 100, "step": 1, "centerSize": 10,
//!               "disableCenter": false, "mergeMode": false }
//! }
//! ```
//!
//! `z` is optional; plane runs ignore it and space runs default it to zero.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::SimResult;
use crate::star::is_valid_size;

/// Vector in the snapshot format.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeedVector {
    pub x: f64,
    pub y: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub z: Option<f64>,
}

impl SeedVector {
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.map_or(true, f64::is_finite)
    }
}

/// One author-supplied body: `{position, speed, color, size}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SandboxSeed {
    pub position: SeedVector,
    pub speed: SeedVector,
    pub color: String,
    pub size: f64,
}

impl SandboxSeed {
    /// Why this seed cannot become a star, if it cannot.
    pub fn defect(&self) -> Option<String> {
        if !is_valid_size(self.size) {
            return Some(format!(
                "size {} must be positive with a finite mass",
                self.size
            ));
        }
        if !self.position.is_finite() {
            return Some("position has a non-finite component".to_string());
        }
        if !self.speed.is_finite() {
            return Some("speed has a non-finite component".to_string());
        }
        None
    }
}

/// Physics parameters carried alongside the bodies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotParams {
    pub g: f64,
    pub step: f64,
    pub center_size: f64,
    pub disable_center: bool,
    pub merge_mode: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub stars: Vec<SandboxSeed>,
    pub params: SnapshotParams,
}

impl Snapshot {
    pub fn from_json(json: &str) -> SimResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> SimResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn load(path: impl AsRef<Path>) -> SimResult<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> SimResult<()> {
        fs::write(path, self.to_json()?)?;
        Ok(())
    }
}
