//! One discrete simulation step over a body collection
//!
//! A tick is all-or-nothing: collision resolution and every integration result
//! are staged first, and the collection is only rewritten once all of them are
//! known to be finite.

use crate::engine::{Engine, ForceMap};
use crate::error::{SimError, SimResult};
use crate::integrator::{Integrator, Kinematics};
use crate::star::{Star, StarId};
use crate::vector::SimVector;

/// A star that lost a collision during the tick.
#[derive(Debug, Clone)]
pub struct Absorbed<V: SimVector> {
    pub star: Star<V>,
    pub absorbed_by: StarId,
}

#[derive(Debug, Clone)]
pub struct TickOutcome<V: SimVector> {
    pub forces: ForceMap<V>,
    /// Removed stars in collection order.
    pub absorbed: Vec<Absorbed<V>>,
    /// Survivors whose size changed through a merge.
    pub resized: Vec<StarId>,
}

struct Staged<V> {
    size: f64,
    velocity: V,
    next: Option<Kinematics<V>>,
}

/// Run one tick on `stars`.
///
/// The anchor, when present, exerts and feels gravity but is never
/// integrated. On error `stars` is left exactly as it was.
pub fn run_tick<V: SimVector>(
    stars: &mut Vec<Star<V>>,
    engine: &Engine,
    integrator: &Integrator,
) -> SimResult<TickOutcome<V>> {
    let resolution = engine.resolve(stars)?;

    let mut staged = Vec::with_capacity(stars.len());
    for star in stars.iter().filter(|s| !resolution.is_removed(s.id)) {
        let (size, velocity) = match resolution.changes.get(&star.id) {
            Some(change) => (change.size, change.velocity),
            None => (star.size(), star.velocity),
        };

        let next = if star.id.is_anchor() {
            None
        } else {
            let force = resolution.forces.get(&star.id).copied().unwrap_or(V::ZERO);
            let next = integrator.integrate(velocity, star.position, force, size.powi(3));
            if !next.is_finite() {
                return Err(SimError::NonFinite { id: star.id });
            }
            Some(next)
        };

        staged.push(Staged { size, velocity, next });
    }

    let mut absorbed = Vec::with_capacity(resolution.absorbed.len());
    let mut survivors = Vec::with_capacity(staged.len());
    for star in stars.drain(..) {
        match resolution.absorbed.get(&star.id) {
            Some(&absorbed_by) => absorbed.push(Absorbed { star, absorbed_by }),
            None => survivors.push(star),
        }
    }

    let mut resized = Vec::new();
    for (star, staged) in survivors.iter_mut().zip(staged) {
        if staged.size != star.size() {
            star.assign_size(staged.size);
            resized.push(star.id);
        }
        star.velocity = staged.velocity;
        if let Some(next) = staged.next {
            integrator.commit(star, next);
        }
    }
    *stars = survivors;

    Ok(TickOutcome {
        forces: resolution.forces,
        absorbed,
        resized,
    })
}
