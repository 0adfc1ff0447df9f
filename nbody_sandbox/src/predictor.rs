//! Off-screen trajectory preview
//!
//! Runs the same engine and integrator as the live loop, but on deep copies,
//! so the live bodies are never touched.

use crate::engine::Engine;
use crate::error::{SimError, SimResult};
use crate::integrator::Integrator;
use crate::star::{Star, StarId};
use crate::tick::run_tick;
use crate::vector::SimVector;

/// A body that the preview saw destroyed.
#[derive(Debug, Clone)]
pub struct Destroyed<V: SimVector> {
    /// Carries the preview path up to the collision.
    pub star: Star<V>,
    pub absorbed_by: StarId,
    /// Preview tick (1-based) in which the collision happened.
    pub tick: usize,
}

/// What happens to one body within the horizon.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fate {
    Survives,
    Destroyed { tick: usize, absorbed_by: StarId },
}

#[derive(Debug, Clone)]
pub struct Prediction<V: SimVector> {
    pub survivors: Vec<Star<V>>,
    pub destroyed: Vec<Destroyed<V>>,
    /// Ticks actually simulated; shorter than the horizon only when every
    /// body was gone.
    pub ticks: usize,
}

impl<V: SimVector> Prediction<V> {
    pub fn fate(&self, id: StarId) -> Option<Fate> {
        if self.survivors.iter().any(|s| s.id == id) {
            return Some(Fate::Survives);
        }
        self.destroyed
            .iter()
            .find(|d| d.star.id == id)
            .map(|d| Fate::Destroyed {
                tick: d.tick,
                absorbed_by: d.absorbed_by,
            })
    }

    /// Preview path of `id`, oldest first, starting at its current position.
    pub fn path(&self, id: StarId) -> Option<Vec<V>> {
        self.survivors
            .iter()
            .chain(self.destroyed.iter().map(|d| &d.star))
            .find(|s| s.id == id)
            .map(|s| s.trajectory().iter().copied().collect())
    }
}

/// Forward simulation over a fixed number of ticks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Predictor {
    pub engine: Engine,
    pub step: f64,
    pub horizon: usize,
}

impl Predictor {
    pub fn new(engine: Engine, step: f64, horizon: usize) -> Self {
        Self {
            engine,
            step,
            horizon,
        }
    }

    /// Preview `live`, optionally with one hypothetical body.
    ///
    /// A hypothetical body whose id matches a live one stands in for it (an
    /// edit being previewed); otherwise it is added. Paths start from each
    /// body's current position and hold up to `horizon + 1` samples.
    pub fn predict<V: SimVector>(
        &self,
        live: &[Star<V>],
        hypothetical: Option<&Star<V>>,
    ) -> SimResult<Prediction<V>> {
        let mut working: Vec<Star<V>> = live.iter().map(preview_copy).collect();
        if let Some(extra) = hypothetical {
            let extra = preview_copy(extra);
            match working.iter_mut().find(|s| s.id == extra.id) {
                Some(slot) => *slot = extra,
                None => working.push(extra),
            }
        }

        let integrator = Integrator::new(self.step, self.horizon.saturating_add(1));
        let mut destroyed = Vec::new();
        let mut ticks = 0;

        while ticks < self.horizon && !working.is_empty() {
            let outcome = run_tick(&mut working, &self.engine, &integrator)?;
            ticks += 1;
            destroyed.extend(outcome.absorbed.into_iter().map(|a| Destroyed {
                star: a.star,
                absorbed_by: a.absorbed_by,
                tick: ticks,
            }));
        }

        log::trace!(
            "prediction over {ticks} ticks: {} survive, {} destroyed",
            working.len(),
            destroyed.len()
        );

        Ok(Prediction {
            survivors: working,
            destroyed,
            ticks,
        })
    }

    /// Preview a single body and return its fate alongside its path.
    pub fn preview_one<V: SimVector>(
        &self,
        live: &[Star<V>],
        candidate: &Star<V>,
    ) -> SimResult<(Fate, Vec<V>)> {
        let prediction = self.predict(live, Some(candidate))?;
        let fate = prediction
            .fate(candidate.id)
            .ok_or(SimError::UnknownStar(candidate.id))?;
        let path = prediction.path(candidate.id).unwrap_or_default();
        Ok((fate, path))
    }
}

fn preview_copy<V: SimVector>(star: &Star<V>) -> Star<V> {
    let mut copy = star.clone();
    copy.clear_trajectory();
    if !copy.id.is_anchor() {
        copy.record_position(1);
    }
    copy
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::DVec2;

    fn star(id: u64, size: f64, x: f64, vx: f64) -> Star<DVec2> {
        Star::new(StarId(id), "white", size, DVec2::new(x, 0.0), DVec2::new(vx, 0.0)).unwrap()
    }

    #[test]
    fn live_bodies_are_untouched() {
        let mut live = vec![star(1, 2.0, 0.0, 0.0), star(2, 1.0, 40.0, -1.0)];
        live[1].record_position(5);
        let before = live.clone();

        let predictor = Predictor::new(Engine::new(100.0, true), 1.0, 200);
        for _ in 0..3 {
            predictor.predict(&live, None).unwrap();
        }
        assert_eq!(live, before);
    }

    #[test]
    fn paths_span_the_horizon() {
        let live = vec![star(1, 1.0, 0.0, 1.0)];
        let prediction = Predictor::new(Engine::new(100.0, false), 1.0, 10)
            .predict(&live, None)
            .unwrap();

        let path = prediction.path(StarId(1)).unwrap();
        assert_eq!(path.len(), 11);
        assert_eq!(path[0], DVec2::ZERO);
        assert_eq!(path[10], DVec2::new(10.0, 0.0));
        assert_eq!(prediction.ticks, 10);
        assert_eq!(prediction.fate(StarId(1)), Some(Fate::Survives));
    }

    #[test]
    fn destroyed_bodies_keep_their_shortened_path() {
        // 2 runs into 1 after a few ticks
        let live = vec![star(1, 5.0, 0.0, 0.0), star(2, 1.0, 20.0, -4.0)];
        let prediction = Predictor::new(Engine::new(0.0, false), 1.0, 50)
            .predict(&live, None)
            .unwrap();

        match prediction.fate(StarId(2)) {
            Some(Fate::Destroyed { tick, absorbed_by }) => {
                assert_eq!(absorbed_by, StarId(1));
                // Overlap first holds at x = 4 (after 4 moves), detected on tick 5
                assert_eq!(tick, 5);
                let path = prediction.path(StarId(2)).unwrap();
                assert_eq!(path.len(), 5);
                assert_eq!(*path.last().unwrap(), DVec2::new(4.0, 0.0));
            }
            other => panic!("expected destruction, got {other:?}"),
        }
        assert_eq!(prediction.survivors.len(), 1);
    }

    #[test]
    fn hypothetical_body_is_added_or_substituted() {
        let live = vec![star(1, 1.0, 0.0, 0.0)];
        let predictor = Predictor::new(Engine::new(0.0, false), 1.0, 3);

        let added = predictor.predict(&live, Some(&star(9, 1.0, 100.0, 1.0))).unwrap();
        assert_eq!(added.survivors.len(), 2);

        let edited = predictor.predict(&live, Some(&star(1, 1.0, 0.0, 2.0))).unwrap();
        assert_eq!(edited.survivors.len(), 1);
        assert_eq!(edited.path(StarId(1)).unwrap().last().copied(), Some(DVec2::new(6.0, 0.0)));
    }

    #[test]
    fn largest_horizon_does_not_overflow_the_trail_cap() {
        let predictor = Predictor::new(Engine::new(100.0, false), 1.0, usize::MAX);
        let prediction = predictor.predict::<DVec2>(&[], None).unwrap();
        assert_eq!(prediction.ticks, 0);
        assert!(prediction.survivors.is_empty());
    }

    #[test]
    fn preview_one_reports_fate_and_path() {
        let live = vec![star(1, 5.0, 0.0, 0.0)];
        let predictor = Predictor::new(Engine::new(0.0, false), 1.0, 20);
        let (fate, path) = predictor.preview_one(&live, &star(7, 1.0, 12.0, -1.0)).unwrap();
        assert!(matches!(fate, Fate::Destroyed { absorbed_by: StarId(1), .. }));
        assert!(!path.is_empty());
    }
}
