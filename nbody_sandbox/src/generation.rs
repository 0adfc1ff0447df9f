//! Initial body sets: random fields, sandbox seeds and the anchor

use rand::Rng;

use crate::color::random_color;
use crate::config::SimulationConfig;
use crate::error::{SimError, SimResult};
use crate::star::{Star, StarId};
use crate::vector::SimVector;

pub const ANCHOR_COLOR: &str = "red";

/// The immovable body at the origin.
pub fn anchor<V: SimVector>(size: f64) -> SimResult<Star<V>> {
    Star::new(StarId::ANCHOR, ANCHOR_COLOR, size, V::ZERO, V::ZERO)
}

/// A random body drawn from the configured size/speed ranges.
pub fn random_star<V: SimVector, R: Rng + ?Sized>(
    rng: &mut R,
    id: StarId,
    config: &SimulationConfig,
) -> SimResult<Star<V>> {
    let (size_low, size_high) = config.size_bounds();
    let (speed_low, speed_high) = config.speed_bounds();
    let size = rng.gen_range(size_low..=size_high);
    Star::new(
        id,
        random_color(rng),
        size,
        V::random_position(rng, config.spawn_extent),
        V::random_velocity(rng, speed_low, speed_high),
    )
}

/// Build the initial collection for a new run.
///
/// Sandbox data is taken verbatim with ids `#1..#n`; otherwise the anchor
/// (unless disabled) is followed by `initial_body_count` random bodies.
/// Returns the stars and the next unused id.
pub fn initial_stars<V: SimVector, R: Rng + ?Sized>(
    rng: &mut R,
    config: &SimulationConfig,
) -> SimResult<(Vec<Star<V>>, u64)> {
    if config.sandbox_mode {
        let stars = config
            .sandbox_data
            .iter()
            .enumerate()
            .map(|(index, seed)| {
                Star::from_seed(StarId(index as u64 + 1), seed).map_err(|err| {
                    SimError::InvalidSeed {
                        index,
                        reason: err.to_string(),
                    }
                })
            })
            .collect::<SimResult<Vec<_>>>()?;
        let next = stars.len() as u64 + 1;
        return Ok((stars, next));
    }

    let mut stars = Vec::with_capacity(config.initial_body_count + 1);
    if !config.disable_anchor {
        stars.push(anchor(config.anchor_size)?);
    }
    for i in 1..=config.initial_body_count as u64 {
        stars.push(random_star(rng, StarId(i), config)?);
    }
    Ok((stars, config.initial_body_count as u64 + 1))
}
