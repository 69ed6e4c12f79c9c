//! AI controllers - classic-enemy wander policy and deathmatch-bot targeting

use rand::Rng;
use uuid::Uuid;

use super::combat;
use super::engine::MatchState;
use super::entity::{CombatantKind, Direction, DIRECTIONS};
use super::grid::TILE_SIZE;
use super::movement;
use super::snapshot::GameEvent;

/// Run the active policy over every live AI combatant
pub fn drive_ai(state: &mut MatchState, elapsed_ms: f32, events: &mut Vec<GameEvent>) {
    for idx in 0..state.roster.len() {
        if !state.roster[idx].alive {
            continue;
        }
        match state.roster[idx].kind {
            CombatantKind::Enemy => drive_enemy(state, idx, elapsed_ms, events),
            CombatantKind::Bot => drive_bot(state, idx, elapsed_ms, events),
            CombatantKind::Human => {}
        }
    }
}

/// Cooperative-mode opponent: wander with a bias toward the base, firing on
/// a fixed staggered interval.
fn drive_enemy(state: &mut MatchState, idx: usize, elapsed_ms: f32, events: &mut Vec<GameEvent>) {
    let (repick, fire_due) = {
        let ai = state.roster[idx].ai.as_mut().expect("enemy has ai scratch");
        ai.move_timer_ms -= elapsed_ms;
        ai.fire_timer_ms -= elapsed_ms;
        (ai.move_timer_ms <= 0.0, ai.fire_timer_ms <= 0.0)
    };

    if repick {
        let dir = weighted_direction_toward_base(state, idx);
        state.roster[idx].facing = dir;
        let interval = state.config.enemy_move_interval_ms;
        state.roster[idx].ai.as_mut().unwrap().move_timer_ms = interval;
    }

    let dir = state.roster[idx].facing;
    let moved = movement::step(&state.grid, &mut state.roster, idx, dir);
    state.roster[idx].moving = true;
    if !moved {
        // unstick: quarter turn and try again next tick
        state.roster[idx].facing = dir.rotated();
    }

    if fire_due {
        combat::try_fire(state, idx, events);
        let interval = state.config.enemy_fire_interval_ms;
        state.roster[idx].ai.as_mut().unwrap().fire_timer_ms = interval;
    }
}

/// Weighted random facing, biased toward the objective. Named-direction
/// weights: each axis pointing at the base gets extra mass.
fn weighted_direction_toward_base(state: &mut MatchState, idx: usize) -> Direction {
    let mut weights = [1u32; 4];
    if let Some((bc, br)) = state.base_cell {
        let (cx, cy) = state.roster[idx].center();
        let bx = (bc as f32 + 0.5) * TILE_SIZE;
        let by = (br as f32 + 0.5) * TILE_SIZE;
        if bx > cx {
            weights[Direction::Right as usize] += 3;
        } else if bx < cx {
            weights[Direction::Left as usize] += 3;
        }
        if by > cy {
            weights[Direction::Down as usize] += 3;
        } else {
            weights[Direction::Up as usize] += 3;
        }
    }
    let total: u32 = weights.iter().sum();
    let mut roll = state.rng.gen_range(0..total);
    for (i, &w) in weights.iter().enumerate() {
        if roll < w {
            return DIRECTIONS[i];
        }
        roll -= w;
    }
    Direction::Down
}

/// Deathmatch bot: chase the nearest live combatant, with an occasional
/// random turn to stay unpredictable, and fire on a jittered interval.
fn drive_bot(state: &mut MatchState, idx: usize, elapsed_ms: f32, events: &mut Vec<GameEvent>) {
    let (decide, fire_due) = {
        let ai = state.roster[idx].ai.as_mut().expect("bot has ai scratch");
        ai.move_timer_ms -= elapsed_ms;
        ai.fire_timer_ms -= elapsed_ms;
        (ai.move_timer_ms <= 0.0, ai.fire_timer_ms <= 0.0)
    };

    // re-scan for the nearest target every tick
    let target = nearest_target(state, idx);
    state.roster[idx].ai.as_mut().unwrap().target = target;

    if decide {
        let chase = state.rng.gen::<f32>() < state.config.bot_chase_bias;
        let dir = match target {
            Some(tid) if chase => dominant_axis_toward(state, idx, tid),
            _ => DIRECTIONS[state.rng.gen_range(0..4)],
        };
        state.roster[idx].facing = dir;
        let interval = state.config.bot_move_interval_ms;
        state.roster[idx].ai.as_mut().unwrap().move_timer_ms = interval;
    }

    let dir = state.roster[idx].facing;
    let moved = movement::step(&state.grid, &mut state.roster, idx, dir);
    state.roster[idx].moving = true;
    if !moved {
        state.roster[idx].facing = dir.rotated();
    }

    if fire_due {
        // re-aim straight down the dominant axis before shooting
        if let Some(tid) = target {
            let aim = dominant_axis_toward(state, idx, tid);
            state.roster[idx].facing = aim;
        }
        combat::try_fire(state, idx, events);
        let (lo, hi) = (
            state.config.bot_fire_interval_min_ms,
            state.config.bot_fire_interval_max_ms,
        );
        let jitter = state.rng.gen_range(lo..hi);
        state.roster[idx].ai.as_mut().unwrap().fire_timer_ms = jitter;
    }
}

/// Nearest live combatant other than `roster[idx]`, by Euclidean distance
fn nearest_target(state: &MatchState, idx: usize) -> Option<Uuid> {
    let me = &state.roster[idx];
    let (mx, my) = me.center();
    state
        .roster
        .iter()
        .filter(|c| c.alive && c.id != me.id)
        .min_by(|a, b| {
            let da = dist_sq(a.center(), (mx, my));
            let db = dist_sq(b.center(), (mx, my));
            da.partial_cmp(&db).unwrap_or(std::cmp::Ordering::Equal)
        })
        .map(|c| c.id)
}

fn dist_sq((ax, ay): (f32, f32), (bx, by): (f32, f32)) -> f32 {
    let dx = ax - bx;
    let dy = ay - by;
    dx * dx + dy * dy
}

/// Facing along the axis with the greater absolute delta to the target
fn dominant_axis_toward(state: &MatchState, idx: usize, target_id: Uuid) -> Direction {
    let (mx, my) = state.roster[idx].center();
    let Some(target) = state.roster.iter().find(|c| c.id == target_id) else {
        return state.roster[idx].facing;
    };
    let (tx, ty) = target.center();
    let dx = tx - mx;
    let dy = ty - my;
    if dx.abs() >= dy.abs() {
        if dx >= 0.0 {
            Direction::Right
        } else {
            Direction::Left
        }
    } else if dy >= 0.0 {
        Direction::Down
    } else {
        Direction::Up
    }
}
