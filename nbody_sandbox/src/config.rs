//! Simulation configuration and validation

use serde::{Deserialize, Serialize};

use crate::error::{SimError, SimResult};
use crate::snapshot::{SandboxSeed, Snapshot, SnapshotParams};
use crate::star::is_valid_size;

pub const MIN_PLAYBACK_SPEED: f64 = 0.01;
pub const MAX_PLAYBACK_SPEED: f64 = 100.0;
/// Longest preview the predictor will run.
pub const MAX_PREDICTION_HORIZON: usize = 100_000;

/// Every knob the simulation core consumes.
///
/// Field names serialize in camelCase so a config file reads like the
/// editor's own parameter names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SimulationConfig {
    /// Random non-anchor bodies generated at init.
    pub initial_body_count: usize,
    pub anchor_size: f64,
    /// `g`; the pairwise force is `(g / 100) * m1 * m2 / d^2`.
    pub gravity_scale: f64,
    /// Bounds for random sizes, either order.
    pub size_range: (f64, f64),
    /// Bounds for random per-axis speed magnitudes, either order.
    pub speed_range: (f64, f64),
    pub merge_mode: bool,
    /// Integration step; smaller is more precise.
    pub step: f64,
    /// Tick frequency multiplier.
    pub playback_speed: f64,
    pub trajectory_length: usize,
    pub disable_anchor: bool,
    pub sandbox_mode: bool,
    pub sandbox_data: Vec<SandboxSeed>,
    /// Half-width of the random spawn region.
    pub spawn_extent: f64,
    /// Ticks the predictor runs ahead.
    pub prediction_horizon: usize,
    pub seed: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self::plane()
    }
}

impl SimulationConfig {
    /// Defaults tuned for the 2D canvas view.
    pub fn plane() -> Self {
        Self {
            initial_body_count: 200,
            anchor_size: 10.0,
            gravity_scale: 100.0,
            size_range: (2.0, 5.0),
            speed_range: (0.0, 0.25),
            merge_mode: false,
            step: 1.0,
            playback_speed: 1.0,
            trajectory_length: 300,
            disable_anchor: false,
            sandbox_mode: false,
            sandbox_data: Vec::new(),
            spawn_extent: 800.0,
            prediction_horizon: 1000,
            seed: None,
        }
    }

    /// Defaults tuned for the 3D view: more, smaller, faster bodies and
    /// shorter trails.
    pub fn space() -> Self {
        Self {
            initial_body_count: 500,
            anchor_size: 15.0,
            gravity_scale: 30.0,
            size_range: (1.0, 2.0),
            speed_range: (0.0, 5.0),
            trajectory_length: 50,
            spawn_extent: 400.0,
            ..Self::plane()
        }
    }

    /// Seed a sandbox run from an exported snapshot.
    pub fn with_snapshot(mut self, snapshot: Snapshot) -> Self {
        let SnapshotParams {
            g,
            step,
            center_size,
            disable_center,
            merge_mode,
        } = snapshot.params;
        self.gravity_scale = g;
        self.step = step;
        self.anchor_size = center_size;
        self.disable_anchor = disable_center;
        self.merge_mode = merge_mode;
        self.sandbox_mode = true;
        self.sandbox_data = snapshot.stars;
        self
    }

    pub fn snapshot_params(&self) -> SnapshotParams {
        SnapshotParams {
            g: self.gravity_scale,
            step: self.step,
            center_size: self.anchor_size,
            disable_center: self.disable_anchor,
            merge_mode: self.merge_mode,
        }
    }

    /// `size_range` as `(low, high)`.
    pub fn size_bounds(&self) -> (f64, f64) {
        ordered(self.size_range)
    }

    /// `speed_range` as `(low, high)`.
    pub fn speed_bounds(&self) -> (f64, f64) {
        ordered(self.speed_range)
    }

    pub fn validate(&self) -> SimResult<()> {
        check_step(self.step)?;
        check_gravity(self.gravity_scale)?;
        check_playback_speed(self.playback_speed)?;

        let (size_low, size_high) = self.size_bounds();
        if !(is_valid_size(size_low) && is_valid_size(size_high)) {
            return Err(invalid(format!(
                "size range {:?} must be positive with finite masses",
                self.size_range
            )));
        }

        let (speed_low, speed_high) = self.speed_bounds();
        if !samplable(speed_low, speed_high) || speed_low < 0.0 {
            return Err(invalid(format!(
                "speed range {:?} must be finite and non-negative",
                self.speed_range
            )));
        }

        if !self.disable_anchor && !is_valid_size(self.anchor_size) {
            return Err(invalid(format!(
                "anchor size {} must be positive while the anchor is enabled",
                self.anchor_size
            )));
        }

        if !(self.spawn_extent >= 0.0 && samplable(-self.spawn_extent, self.spawn_extent)) {
            return Err(invalid(format!(
                "spawn extent {} must be non-negative and small enough to sample",
                self.spawn_extent
            )));
        }

        if !(1..=MAX_PREDICTION_HORIZON).contains(&self.prediction_horizon) {
            return Err(invalid(format!(
                "prediction horizon {} must lie in [1, {MAX_PREDICTION_HORIZON}]",
                self.prediction_horizon
            )));
        }

        for (index, seed) in self.sandbox_data.iter().enumerate() {
            if let Some(reason) = seed.defect() {
                return Err(SimError::InvalidSeed { index, reason });
            }
        }

        Ok(())
    }
}

fn ordered((a, b): (f64, f64)) -> (f64, f64) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

// Uniform sampling scales the width up slightly, so leave headroom.
fn samplable(low: f64, high: f64) -> bool {
    low.is_finite() && high.is_finite() && (2.0 * (high - low)).is_finite()
}

fn invalid(reason: impl Into<String>) -> SimError {
    SimError::InvalidConfig(reason.into())
}

pub(crate) fn check_step(step: f64) -> SimResult<()> {
    if step.is_finite() && step > 0.0 {
        Ok(())
    } else {
        Err(invalid(format!("step {step} must be finite and positive")))
    }
}

pub(crate) fn check_gravity(g: f64) -> SimResult<()> {
    if g.is_finite() && g >= 0.0 {
        Ok(())
    } else {
        Err(invalid(format!("gravity scale {g} must be finite and non-negative")))
    }
}

pub(crate) fn check_playback_speed(speed: f64) -> SimResult<()> {
    if (MIN_PLAYBACK_SPEED..=MAX_PLAYBACK_SPEED).contains(&speed) {
        Ok(())
    } else {
        Err(invalid(format!(
            "playback speed {speed} must lie in [{MIN_PLAYBACK_SPEED}, {MAX_PLAYBACK_SPEED}]"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::SeedVector;

    fn seed(size: f64) -> SandboxSeed {
        SandboxSeed {
            position: SeedVector { x: 0.0, y: 0.0, z: None },
            speed: SeedVector { x: 1.0, y: 0.0, z: None },
            color: "blue".into(),
            size,
        }
    }

    #[test]
    fn presets_are_valid() {
        SimulationConfig::plane().validate().unwrap();
        SimulationConfig::space().validate().unwrap();
        assert_eq!(SimulationConfig::default(), SimulationConfig::plane());
    }

    #[test]
    fn ranges_accept_either_order() {
        let config = SimulationConfig {
            size_range: (5.0, 2.0),
            speed_range: (0.25, 0.0),
            ..Default::default()
        };
        config.validate().unwrap();
        assert_eq!(config.size_bounds(), (2.0, 5.0));
        assert_eq!(config.speed_bounds(), (0.0, 0.25));
    }

    #[test]
    fn rejects_bad_numbers() {
        let bad = [
            SimulationConfig { step: 0.0, ..Default::default() },
            SimulationConfig { step: f64::NAN, ..Default::default() },
            SimulationConfig { gravity_scale: -1.0, ..Default::default() },
            SimulationConfig { size_range: (-1.0, 3.0), ..Default::default() },
            SimulationConfig { speed_range: (-0.5, 0.5), ..Default::default() },
            SimulationConfig { anchor_size: 0.0, ..Default::default() },
            SimulationConfig { playback_speed: 0.0, ..Default::default() },
            SimulationConfig { playback_speed: 1e6, ..Default::default() },
            SimulationConfig { prediction_horizon: 0, ..Default::default() },
            SimulationConfig { spawn_extent: f64::INFINITY, ..Default::default() },
        ];
        for config in bad {
            assert!(
                matches!(config.validate(), Err(SimError::InvalidConfig(_))),
                "accepted {config:?}"
            );
        }
    }

    #[test]
    fn rejects_ranges_too_wide_to_sample() {
        let bad = [
            SimulationConfig { spawn_extent: f64::MAX, ..Default::default() },
            SimulationConfig { spawn_extent: f64::MAX / 3.0, ..Default::default() },
            SimulationConfig { size_range: (1.0, f64::MAX), ..Default::default() },
            SimulationConfig { speed_range: (0.0, f64::MAX), ..Default::default() },
        ];
        for config in bad {
            assert!(
                matches!(config.validate(), Err(SimError::InvalidConfig(_))),
                "accepted {config:?}"
            );
        }
    }

    #[test]
    fn rejects_sizes_whose_mass_overflows() {
        let bad = [
            SimulationConfig { size_range: (1.0, 1e200), ..Default::default() },
            SimulationConfig { anchor_size: 1e200, ..Default::default() },
        ];
        for config in bad {
            assert!(
                matches!(config.validate(), Err(SimError::InvalidConfig(_))),
                "accepted {config:?}"
            );
        }

        let config = SimulationConfig {
            sandbox_mode: true,
            sandbox_data: vec![seed(1e200)],
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(SimError::InvalidSeed { index: 0, .. })));
    }

    #[test]
    fn prediction_horizon_is_bounded() {
        let config = SimulationConfig {
            prediction_horizon: usize::MAX,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(SimError::InvalidConfig(_))));

        SimulationConfig {
            prediction_horizon: MAX_PREDICTION_HORIZON,
            ..Default::default()
        }
        .validate()
        .unwrap();
    }

    #[test]
    fn anchor_size_is_irrelevant_without_anchor() {
        let config = SimulationConfig {
            anchor_size: 0.0,
            disable_anchor: true,
            ..Default::default()
        };
        config.validate().unwrap();
    }

    #[test]
    fn rejects_degenerate_sandbox_seeds() {
        let config = SimulationConfig {
            sandbox_mode: true,
            sandbox_data: vec![seed(3.0), seed(0.0)],
            ..Default::default()
        };
        match config.validate() {
            Err(SimError::InvalidSeed { index, .. }) => assert_eq!(index, 1),
            other => panic!("expected seed rejection, got {other:?}"),
        }
    }

    #[test]
    fn snapshot_params_round_trip() {
        let snapshot = Snapshot {
            stars: vec![seed(4.0)],
            params: SnapshotParams {
                g: 42.0,
                step: 0.5,
                center_size: 12.0,
                disable_center: true,
                merge_mode: true,
            },
        };
        let config = SimulationConfig::plane().with_snapshot(snapshot.clone());
        assert!(config.sandbox_mode);
        assert_eq!(config.sandbox_data, snapshot.stars);
        assert_eq!(config.snapshot_params(), snapshot.params);
    }

    #[test]
    fn deserializes_partial_camel_case() {
        let config: SimulationConfig =
            serde_json::from_str(r#"{"gravityScale": 5, "mergeMode": true, "sizeRange": [1, 3]}"#)
                .unwrap();
        assert_eq!(config.gravity_scale, 5.0);
        assert!(config.merge_mode);
        assert_eq!(config.size_range, (1.0, 3.0));
        assert_eq!(config.trajectory_length, 300);
    }
}
