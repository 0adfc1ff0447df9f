//! N-body gravity sandbox
//!
//! Bodies attract each other pairwise, merge when they overlap and are
//! advanced with semi-implicit Euler steps. The same core runs in the plane
//! (`glam::DVec2`) and in space (`glam::DVec3`).

pub mod color;
pub mod config;
pub mod engine;
pub mod error;
pub mod generation;
pub mod integrator;
pub mod predictor;
pub mod scheduler;
pub mod snapshot;
pub mod star;
pub mod tick;
pub mod vector;

pub use config::SimulationConfig;
pub use engine::{Engine, ForceMap};
pub use error::{SimError, SimResult};
pub use integrator::Integrator;
pub use predictor::{Fate, Prediction, Predictor};
pub use scheduler::{FrameReport, RunState, Scheduler, SimEvent, TickReport};
pub use snapshot::{SandboxSeed, SeedVector, Snapshot, SnapshotParams};
pub use star::{Star, Star2D, Star3D, StarId};
pub use vector::SimVector;
