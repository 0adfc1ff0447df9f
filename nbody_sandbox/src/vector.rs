//! Dimension abstraction shared by plane (2D) and space (3D) simulations

use std::fmt::Debug;
use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub, SubAssign};

use glam::{DVec2, DVec3};
use rand::Rng;

use crate::snapshot::SeedVector;

/// A position/velocity/force vector the engine can run on.
///
/// Implemented for `DVec2` (plane mode) and `DVec3` (space mode). Everything
/// dimension-specific lives here so the body model, engine, integrator and
/// scheduler are written once.
pub trait SimVector:
    Copy
    + Debug
    + PartialEq
    + Add<Output = Self>
    + Sub<Output = Self>
    + Neg<Output = Self>
    + Mul<f64, Output = Self>
    + Div<f64, Output = Self>
    + AddAssign
    + SubAssign
    + 'static
{
    const ZERO: Self;
    const DIMENSIONS: usize;

    fn length_squared(self) -> f64;

    fn is_finite(self) -> bool;

    /// Uniform sample inside the axis-aligned box `[-extent, extent]^n`.
    fn random_position<R: Rng + ?Sized>(rng: &mut R, extent: f64) -> Self;

    /// Per-axis magnitude in `[low, high]` with an independent random sign.
    fn random_velocity<R: Rng + ?Sized>(rng: &mut R, low: f64, high: f64) -> Self;

    fn from_seed(seed: &SeedVector) -> Self;

    fn to_seed(self) -> SeedVector;

    /// Single-precision xyz for GPU upload; plane vectors get `z = 0`.
    fn to_render(self) -> [f32; 3];

    fn length(self) -> f64 {
        self.length_squared().sqrt()
    }
}

fn signed<R: Rng + ?Sized>(rng: &mut R, low: f64, high: f64) -> f64 {
    let magnitude = rng.gen_range(low..=high);
    if rng.gen_bool(0.5) {
        magnitude
    } else {
        -magnitude
    }
}

impl SimVector for DVec2 {
    const ZERO: Self = DVec2::ZERO;
    const DIMENSIONS: usize = 2;

    fn length_squared(self) -> f64 {
        DVec2::length_squared(self)
    }

    fn is_finite(self) -> bool {
        DVec2::is_finite(self)
    }

    fn random_position<R: Rng + ?Sized>(rng: &mut R, extent: f64) -> Self {
        DVec2::new(
            rng.gen_range(-extent..=extent),
            rng.gen_range(-extent..=extent),
        )
    }

    fn random_velocity<R: Rng + ?Sized>(rng: &mut R, low: f64, high: f64) -> Self {
        DVec2::new(signed(rng, low, high), signed(rng, low, high))
    }

    fn from_seed(seed: &SeedVector) -> Self {
        DVec2::new(seed.x, seed.y)
    }

    fn to_seed(self) -> SeedVector {
        SeedVector {
            x: self.x,
            y: self.y,
            z: None,
        }
    }

    fn to_render(self) -> [f32; 3] {
        [self.x as f32, self.y as f32, 0.0]
    }
}

impl SimVector for DVec3 {
    const ZERO: Self = DVec3::ZERO;
    const DIMENSIONS: usize = 3;

    fn length_squared(self) -> f64 {
        DVec3::length_squared(self)
    }

    fn is_finite(self) -> bool {
        DVec3::is_finite(self)
    }

    fn random_position<R: Rng + ?Sized>(rng: &mut R, extent: f64) -> Self {
        DVec3::new(
            rng.gen_range(-extent..=extent),
            rng.gen_range(-extent..=extent),
            rng.gen_range(-extent..=extent),
        )
    }

    fn random_velocity<R: Rng + ?Sized>(rng: &mut R, low: f64, high: f64) -> Self {
        DVec3::new(
            signed(rng, low, high),
            signed(rng, low, high),
            signed(rng, low, high),
        )
    }

    fn from_seed(seed: &SeedVector) -> Self {
        // Plane snapshots imported into space mode land on z = 0
        DVec3::new(seed.x, seed.y, seed.z.unwrap_or(0.0))
    }

    fn to_seed(self) -> SeedVector {
        SeedVector {
            x: self.x,
            y: self.y,
            z: Some(self.z),
        }
    }

    fn to_render(self) -> [f32; 3] {
        [self.x as f32, self.y as f32, self.z as f32]
    }
}
