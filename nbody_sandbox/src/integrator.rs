//! Semi-implicit (symplectic) Euler integration

use crate::star::Star;
use crate::vector::SimVector;

/// Velocity and position after one step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Kinematics<V> {
    pub velocity: V,
    pub position: V,
}

impl<V: SimVector> Kinematics<V> {
    pub fn is_finite(&self) -> bool {
        self.velocity.is_finite() && self.position.is_finite()
    }
}

/// Advances bodies by a fixed step and records their trajectories.
///
/// Has no notion of the anchor; callers that want a body frozen simply do
/// not hand it over.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Integrator {
    pub step: f64,
    pub trajectory_length: usize,
}

impl Integrator {
    pub fn new(step: f64, trajectory_length: usize) -> Self {
        Self {
            step,
            trajectory_length,
        }
    }

    /// `v += (F / m) * dt`, then `x += v * dt` using the updated velocity.
    pub fn integrate<V: SimVector>(&self, velocity: V, position: V, force: V, mass: f64) -> Kinematics<V> {
        let velocity = velocity + force / mass * self.step;
        let position = position + velocity * self.step;
        Kinematics { velocity, position }
    }

    /// Write a step result into `star` and append the new position to its
    /// trajectory.
    pub fn commit<V: SimVector>(&self, star: &mut Star<V>, next: Kinematics<V>) {
        star.velocity = next.velocity;
        star.position = next.position;
        star.record_position(self.trajectory_length);
    }

    /// Integrate and commit in one go.
    pub fn advance<V: SimVector>(&self, star: &mut Star<V>, force: V) {
        let next = self.integrate(star.velocity, star.position, force, star.mass());
        self.commit(star, next);
    }
}
