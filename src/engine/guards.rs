use log::debug;
use rand::Rng;
use std::collections::HashSet;

use crate::temple::{RoomGraph, RoomId};

/// Source of "uniform sample without replacement" draws.
pub trait RoomSampler {
    /// Picks `amount` distinct entries of `pool`. `amount` never exceeds `pool.len()`.
    fn sample(&mut self, pool: &[RoomId], amount: usize) -> Vec<RoomId>;
}

/// Adapts any `rand` generator into a [`RoomSampler`].
#[derive(Debug)]
pub struct RngSampler<R>(pub R);

impl<R: Rng> RoomSampler for RngSampler<R> {
    fn sample(&mut self, pool: &[RoomId], amount: usize) -> Vec<RoomId> {
        rand::seq::index::sample(&mut self.0, pool.len(), amount)
            .into_iter()
            .map(|i| pool[i].clone())
            .collect()
    }
}

/// Chooses which guard-eligible rooms hide a temple guard.
///
/// Asking for more guards than there are eligible rooms places one in every
/// eligible room.
pub fn place_guards(
    graph: &RoomGraph,
    guard_count: usize,
    sampler: &mut dyn RoomSampler,
) -> HashSet<RoomId> {
    let eligible = graph.guard_eligible();
    let amount = guard_count.min(eligible.len());
    let placed: HashSet<RoomId> = sampler.sample(&eligible, amount).into_iter().collect();
    debug!(
        "placed {} of {} requested guards among {} eligible rooms",
        placed.len(),
        guard_count,
        eligible.len()
    );
    placed
}
