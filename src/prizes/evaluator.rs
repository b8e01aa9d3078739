use rand::seq::SliceRandom;
use rand::Rng;
use std::time::Duration;

use super::types::{Prize, PrizeTable};
use crate::engine::PlayerState;

const SPEED_BONUS_UNDER: Duration = Duration::from_secs(60);

/// Works out every prize earned by a finished run.
///
/// Contestants are assumed to have cleared the earlier rounds with a full
/// set of pendants, so those prizes are always awarded.
pub fn evaluate(
    player: &PlayerState,
    won: bool,
    rooms_visited: usize,
    total_rooms: usize,
    table: &PrizeTable,
) -> Vec<Prize> {
    let mut prizes = Vec::new();

    prizes.extend_from_slice(&table.participation);
    prizes.extend_from_slice(&table.moat_crossing);
    prizes.extend_from_slice(&table.steps_of_knowledge);
    prizes.extend_from_slice(&table.full_pendant);

    if rooms_visited >= 1 {
        prizes.extend_from_slice(&table.reached_temple);
    }
    if rooms_visited >= 5 {
        prizes.extend_from_slice(&table.five_rooms);
    }
    if player.has_artifact {
        prizes.extend_from_slice(&table.grabbed_artifact);
    }
    if won {
        prizes.extend_from_slice(&table.grand_prizes);
    }

    if player.elapsed() < SPEED_BONUS_UNDER {
        prizes.extend_from_slice(&table.speed_bonus);
    }
    if won && player.guards_encountered == 0 {
        prizes.extend_from_slice(&table.no_guards_met);
    }
    if rooms_visited == total_rooms {
        prizes.extend_from_slice(&table.all_rooms_visited);
    }

    prizes
}

pub fn total_value(prizes: &[Prize]) -> u64 {
    prizes
        .iter()
        .fold(0u64, |total, prize| total.saturating_add(prize.amount()))
}

/// Picks the closing sponsor plug. Purely cosmetic.
pub fn sponsor_message<'a, R: Rng>(table: &'a PrizeTable, rng: &mut R) -> Option<&'a str> {
    table.sponsor_announcements.choose(rng).map(String::as_str)
}
