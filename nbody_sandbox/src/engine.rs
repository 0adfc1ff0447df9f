//! Pairwise gravity and collision resolution
//!
//! Brute force by construction: every unordered pair is visited once per tick.
//! Overlapping pairs merge inelastically; everything else attracts under
//! `(g / 100) * m1 * m2 / d^2`.

use std::collections::HashMap;

use crate::error::{SimError, SimResult};
use crate::star::{Star, StarId};
use crate::vector::SimVector;

/// Accumulated force per star id.
pub type ForceMap<V> = HashMap<StarId, V>;

/// Velocity and size a surviving star takes once the pair scan is done.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PendingChange<V> {
    pub velocity: V,
    pub size: f64,
}

/// Everything one scan decided, before any of it is applied.
#[derive(Debug, Clone)]
pub struct Resolution<V> {
    /// Force on every star that survives the tick.
    pub forces: ForceMap<V>,
    /// Removed star -> the star that absorbed it (first collision to flag it).
    pub absorbed: HashMap<StarId, StarId>,
    /// Post-collision state per survivor; a later pair overwrites an earlier one.
    pub changes: HashMap<StarId, PendingChange<V>>,
}

impl<V> Resolution<V> {
    pub fn is_removed(&self, id: StarId) -> bool {
        self.absorbed.contains_key(&id)
    }
}

/// Force and collision engine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Engine {
    pub gravity_scale: f64,
    pub merge_mode: bool,
}

/// Outcome of a single overlapping pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Collision<V> {
    pub survivor: StarId,
    pub removed: StarId,
    /// Momentum-conserving velocity of the combined body.
    pub velocity: V,
    /// Volume-conserving size of the combined body, `(m1 + m2)^(1/3)`.
    pub merged_size: f64,
}

impl Engine {
    pub fn new(gravity_scale: f64, merge_mode: bool) -> Self {
        Self {
            gravity_scale,
            merge_mode,
        }
    }

    /// Whether the extents of `a` and `b` overlap. The boundary (`d` exactly
    /// equal to the size sum) does not count as a collision.
    pub fn overlaps<V: SimVector>(a: &Star<V>, b: &Star<V>) -> bool {
        Self::overlaps_at((a.position - b.position).length(), a, b)
    }

    /// [`Engine::overlaps`] for a distance the caller already has.
    pub fn overlaps_at<V: SimVector>(distance: f64, a: &Star<V>, b: &Star<V>) -> bool {
        distance < a.size() + b.size()
    }

    /// Resolve an overlapping pair.
    ///
    /// The larger star survives and ties go to `a`. The anchor is the one
    /// exception: it survives any collision it takes part in, whatever its size.
    pub fn collide<V: SimVector>(a: &Star<V>, b: &Star<V>) -> Collision<V> {
        let (mass_a, mass_b) = (a.mass(), b.mass());
        let total = mass_a + mass_b;
        let velocity = (a.velocity * mass_a + b.velocity * mass_b) / total;
        let merged_size = total.cbrt();

        let a_survives = if b.id.is_anchor() {
            false
        } else {
            a.id.is_anchor() || a.size() >= b.size()
        };
        let (survivor, removed) = if a_survives { (a.id, b.id) } else { (b.id, a.id) };

        Collision {
            survivor,
            removed,
            velocity,
            merged_size,
        }
    }

    /// Gravitational pull of `b` on `a`; the pull of `a` on `b` is its negation.
    ///
    /// `distance_squared` is passed in so the caller's collision test and the
    /// inverse-square law share one computation.
    pub fn attraction<V: SimVector>(&self, a: &Star<V>, b: &Star<V>, distance_squared: f64) -> V {
        let distance = distance_squared.sqrt();
        let magnitude = (self.gravity_scale / 100.0) * a.mass() * b.mass() / distance_squared;
        (b.position - a.position) * (magnitude / distance)
    }

    /// Scan every pair of `stars` once and decide forces, removals and
    /// post-collision state. Nothing is mutated.
    ///
    /// Pairs are judged against the state the stars had when the tick began,
    /// so a star can be flagged by several pairs in one tick. A flagged star is
    /// removed however many pairs flagged it, and when one survivor wins
    /// several pairs, the last pair's velocity/size wins.
    pub fn resolve<V: SimVector>(&self, stars: &[Star<V>]) -> SimResult<Resolution<V>> {
        let mut forces: ForceMap<V> = stars.iter().map(|s| (s.id, V::ZERO)).collect();
        let mut absorbed = HashMap::new();
        let mut changes = HashMap::new();

        for (i, a) in stars.iter().enumerate() {
            for b in &stars[i + 1..] {
                let distance_squared = (a.position - b.position).length_squared();
                let distance = distance_squared.sqrt();

                if Self::overlaps_at(distance, a, b) {
                    let collision = Self::collide(a, b);
                    absorbed.entry(collision.removed).or_insert(collision.survivor);
                    // The anchor keeps its own velocity and size
                    if !collision.survivor.is_anchor() {
                        let survivor_size = if collision.survivor == a.id { a.size() } else { b.size() };
                        let size = if self.merge_mode {
                            collision.merged_size
                        } else {
                            survivor_size
                        };
                        changes.insert(
                            collision.survivor,
                            PendingChange {
                                velocity: collision.velocity,
                                size,
                            },
                        );
                    }
                    continue;
                }

                if distance_squared == 0.0 {
                    return Err(SimError::Degenerate { a: a.id, b: b.id });
                }

                let pull = self.attraction(a, b, distance_squared);
                if !pull.is_finite() {
                    return Err(SimError::NonFinite { id: a.id });
                }
                if let Some(f) = forces.get_mut(&a.id) {
                    *f += pull;
                }
                if let Some(f) = forces.get_mut(&b.id) {
                    *f -= pull;
                }
            }
        }

        forces.retain(|id, _| !absorbed.contains_key(id));

        Ok(Resolution {
            forces,
            absorbed,
            changes,
        })
    }
}
