//! Deathmatch respawn queue and contention-aware placement

use rand::Rng;
use rand_chacha::ChaCha8Rng;
use uuid::Uuid;

use super::engine::MatchState;
use super::entity::{Combatant, Direction};
use super::grid::spawn_px;
use super::snapshot::GameEvent;

/// One eliminated participant waiting out the respawn delay
#[derive(Debug, Clone)]
pub struct PendingRespawn {
    pub id: Uuid,
    pub remaining_ms: f32,
}

/// Advance the queue by elapsed simulated time and bring back every entry
/// whose delay has run out.
pub fn tick_respawns(state: &mut MatchState, elapsed_ms: f32, events: &mut Vec<GameEvent>) {
    for entry in &mut state.respawn_queue {
        entry.remaining_ms -= elapsed_ms;
    }

    let ready: Vec<Uuid> = state
        .respawn_queue
        .iter()
        .filter(|e| e.remaining_ms <= 0.0)
        .map(|e| e.id)
        .collect();
    state.respawn_queue.retain(|e| e.remaining_ms > 0.0);

    for id in ready {
        // a disconnected participant may still sit in the queue; skip it
        let Some(idx) = state.roster.iter().position(|c| c.id == id) else {
            continue;
        };
        let spawn = select_spawn_point(&state.dm_spawns, &state.roster, &mut state.rng);
        let shield = state.config.respawn_shield_ms;
        let c = &mut state.roster[idx];
        if let Some((x, y)) = spawn {
            c.x = x;
            c.y = y;
        }
        c.alive = true;
        c.facing = Direction::Up;
        c.shield_ms = shield;
        events.push(GameEvent::Respawned { id });
    }
}

/// Pick the spawn point that maximizes the minimum distance to any live
/// combatant - a max-min placement heuristic against spawn camping.
///
/// Exact ties, and the case of nobody alive, fall back to a uniformly random
/// choice. Returns `None` only for an empty spawn list.
pub fn select_spawn_point(
    spawns: &[(usize, usize)],
    roster: &[Combatant],
    rng: &mut ChaCha8Rng,
) -> Option<(f32, f32)> {
    debug_assert!(!spawns.is_empty(), "deathmatch map must declare spawn points");
    if spawns.is_empty() {
        return None;
    }

    let candidates: Vec<(f32, f32)> = spawns.iter().map(|&cell| spawn_px(cell)).collect();
    let live: Vec<(f32, f32)> = roster
        .iter()
        .filter(|c| c.alive)
        .map(|c| c.center())
        .collect();

    if live.is_empty() {
        return Some(candidates[rng.gen_range(0..candidates.len())]);
    }

    let min_dist = |&(x, y): &(f32, f32)| {
        live.iter()
            .map(|&(lx, ly)| {
                let dx = lx - x;
                let dy = ly - y;
                (dx * dx + dy * dy).sqrt()
            })
            .fold(f32::INFINITY, f32::min)
    };

    let scores: Vec<f32> = candidates.iter().map(min_dist).collect();
    let best = scores.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let tied: Vec<usize> = (0..candidates.len())
        .filter(|&i| scores[i] == best)
        .collect();
    let pick = tied[rng.gen_range(0..tied.len())];
    Some(candidates[pick])
}
