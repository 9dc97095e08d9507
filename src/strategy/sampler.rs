//! Weighted sampling under an injected random source
//!
//! Attack selection happens in two rolls. The category roll lays the settings'
//! percentages out as successive bands over [0, 1); a roll landing past the
//! last band means no attack this cycle. The candidate roll then samples within
//! the category by per-attack weight, first restricting to preferred-intention
//! candidates half of the time when any exist.

use rand::distributions::{Distribution, WeightedIndex};
use rand::seq::SliceRandom;
use rand::{Rng, RngCore};

use crate::attacks::AttackCategory;
use crate::combatant::settings::CategoryWeights;

/// Pick an item by weight; all-zero weights fall back to a uniform pick
pub fn weighted_pick<'a, T>(
    items: &[&'a T],
    weight: impl Fn(&T) -> f64,
    rng: &mut dyn RngCore,
) -> Option<&'a T> {
    let weights: Vec<f64> = items.iter().map(|i| weight(i).max(0.0)).collect();
    match WeightedIndex::new(&weights) {
        Ok(dist) => items.get(dist.sample(rng)).copied(),
        Err(_) => items.choose(rng).copied(),
    }
}

/// Filter-then-fallback sampler over preferred and ordinary candidates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TwoStageSampler {
    /// Chance of sampling only among preferred candidates when any exist
    pub prefer_chance: f64,
}

impl Default for TwoStageSampler {
    fn default() -> Self {
        Self { prefer_chance: 0.5 }
    }
}

impl TwoStageSampler {
    pub fn sample<'a, T>(
        &self,
        items: &'a [T],
        weight: impl Fn(&T) -> f64,
        preferred: impl Fn(&T) -> bool,
        rng: &mut dyn RngCore,
    ) -> Option<&'a T> {
        let preferred_items: Vec<&T> = items.iter().filter(|i| preferred(i)).collect();
        if !preferred_items.is_empty() && rng.gen_bool(self.prefer_chance.clamp(0.0, 1.0)) {
            if let Some(pick) = weighted_pick(&preferred_items, &weight, rng) {
                return Some(pick);
            }
        }
        let all: Vec<&T> = items.iter().collect();
        weighted_pick(&all, &weight, rng)
    }
}

/// Roll the category bands
///
/// A band whose category has nothing to offer falls back to the other
/// available categories with a positive weight, sampled by weight. `None`
/// means the roll landed in the unassigned remainder or nothing is available.
pub fn roll_category(
    order: &[AttackCategory],
    weights: &CategoryWeights,
    available: impl Fn(AttackCategory) -> bool,
    rng: &mut dyn RngCore,
) -> Option<AttackCategory> {
    let roll: f64 = rng.gen();
    let mut cursor = 0.0;
    let mut landed = None;
    for category in order {
        let weight = weights.get(*category).max(0.0);
        if roll < cursor + weight {
            landed = Some(*category);
            break;
        }
        cursor += weight;
    }
    let landed = landed?;
    if available(landed) {
        return Some(landed);
    }
    let fallback: Vec<&AttackCategory> = order
        .iter()
        .filter(|c| **c != landed && weights.get(**c) > 0.0 && available(**c))
        .collect();
    if fallback.is_empty() {
        return None;
    }
    weighted_pick(&fallback, |c| weights.get(*c), rng).copied()
}
