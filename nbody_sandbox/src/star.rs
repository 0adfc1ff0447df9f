//! The simulated body

use std::collections::VecDeque;
use std::fmt;

use glam::DVec2;

use crate::error::{SimError, SimResult};
use crate::snapshot::SandboxSeed;
use crate::vector::SimVector;

/// Stable identifier of a star within one run, displayed as `#n`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StarId(pub u64);

impl StarId {
    /// The optional immovable body at the origin.
    pub const ANCHOR: StarId = StarId(0);

    pub fn is_anchor(self) -> bool {
        self == Self::ANCHOR
    }
}

impl fmt::Display for StarId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A body in the simulation: a uniform-density sphere (or disk) whose mass is
/// always the cube of its size.
///
/// `size` and `mass` are private so the two can never drift apart; the only
/// way to change them is [`Star::set_size`]. Cloning is deep: glam vectors are
/// values and the trajectory is an owned buffer, so a clone can be stepped or
/// edited without touching the original.
#[derive(Debug, Clone, PartialEq)]
pub struct Star<V: SimVector> {
    pub id: StarId,
    pub color: String,
    pub position: V,
    pub velocity: V,
    size: f64,
    mass: f64,
    trajectory: VecDeque<V>,
}

pub type Star2D = Star<DVec2>;
pub type Star3D = Star<glam::DVec3>;

/// A size is usable when it is positive and its mass `size^3` stays finite.
pub(crate) fn is_valid_size(size: f64) -> bool {
    size > 0.0 && size.powi(3).is_finite()
}

fn check_size(id: StarId, size: f64) -> SimResult<()> {
    if is_valid_size(size) {
        Ok(())
    } else {
        Err(SimError::InvalidSize { id, size })
    }
}

impl<V: SimVector> Star<V> {
    pub fn new(
        id: StarId,
        color: impl Into<String>,
        size: f64,
        position: V,
        velocity: V,
    ) -> SimResult<Self> {
        check_size(id, size)?;
        Ok(Self {
            id,
            color: color.into(),
            position,
            velocity,
            size,
            mass: size.powi(3),
            trajectory: VecDeque::new(),
        })
    }

    /// Build a star from a sandbox seed tuple.
    pub fn from_seed(id: StarId, seed: &SandboxSeed) -> SimResult<Self> {
        Self::new(
            id,
            seed.color.clone(),
            seed.size,
            V::from_seed(&seed.position),
            V::from_seed(&seed.speed),
        )
    }

    pub fn to_seed(&self) -> SandboxSeed {
        SandboxSeed {
            position: self.position.to_seed(),
            speed: self.velocity.to_seed(),
            color: self.color.clone(),
            size: self.size,
        }
    }

    pub fn size(&self) -> f64 {
        self.size
    }

    pub fn mass(&self) -> f64 {
        self.mass
    }

    /// Change the size and recompute `mass = size^3`; nothing else moves.
    pub fn set_size(&mut self, size: f64) -> SimResult<()> {
        check_size(self.id, size)?;
        self.assign_size(size);
        Ok(())
    }

    // Callers guarantee a positive finite size (merge results of two valid masses).
    pub(crate) fn assign_size(&mut self, size: f64) {
        self.size = size;
        self.mass = size.powi(3);
    }

    pub fn momentum(&self) -> V {
        self.velocity * self.mass
    }

    /// Past positions, oldest first.
    pub fn trajectory(&self) -> &VecDeque<V> {
        &self.trajectory
    }

    /// Append the current position, then drop the oldest samples beyond `cap`.
    pub fn record_position(&mut self, cap: usize) {
        self.trajectory.push_back(self.position);
        self.trim_trajectory(cap);
    }

    pub fn trim_trajectory(&mut self, cap: usize) {
        if cap == 0 {
            self.trajectory.clear();
            return;
        }
        while self.trajectory.len() > cap {
            self.trajectory.pop_front();
        }
    }

    pub fn clear_trajectory(&mut self) {
        self.trajectory.clear();
    }

    /// Scalar speed.
    pub fn speed(&self) -> f64 {
        self.velocity.length()
    }

    /// Rescale the velocity to `speed`, keeping its direction.
    ///
    /// Returns `false` (and leaves the star alone) when the star is at rest,
    /// since a zero vector has no direction to keep.
    pub fn set_speed(&mut self, speed: f64) -> bool {
        let current = self.speed();
        if current == 0.0 || !speed.is_finite() {
            return false;
        }
        self.velocity = self.velocity * (speed / current);
        true
    }
}

impl Star<DVec2> {
    /// Direction of travel in degrees, `None` while at rest.
    pub fn heading_degrees(&self) -> Option<f64> {
        if self.velocity == DVec2::ZERO {
            None
        } else {
            Some(self.velocity.y.atan2(self.velocity.x).to_degrees())
        }
    }

    /// Point the velocity along `degrees`, keeping the current speed.
    pub fn set_heading_degrees(&mut self, degrees: f64) {
        let speed = self.speed();
        let radians = degrees.to_radians();
        self.velocity = DVec2::new(radians.cos(), radians.sin()) * speed;
    }
}
