//! Combat resolution - firing, projectile advance, terrain and entity hits

use tracing::debug;
use uuid::Uuid;

use super::engine::MatchState;
use super::entity::{CombatantKind, Projectile, UnitStats};
use super::grid::{Material, PROJECTILE_SIZE, UNIT_SIZE};
use super::movement::aabb_overlap;
use super::respawn::PendingRespawn;
use super::snapshot::{GameEvent, Winner};
use super::GameMode;

/// Fire `roster[idx]`'s weapon if its cooldown has run out.
///
/// One owned projectile per shot; the cooldown resets to the per-kind
/// constant. Returns whether a shot was actually produced.
pub fn try_fire(state: &mut MatchState, idx: usize, events: &mut Vec<GameEvent>) -> bool {
    let shooter = &state.roster[idx];
    if !shooter.alive || shooter.cooldown_ms > 0.0 {
        return false;
    }
    let projectile = Projectile::fired_by(shooter);
    events.push(GameEvent::Shot {
        shooter_id: shooter.id,
        projectile_id: projectile.id,
    });
    let cooldown = UnitStats::for_kind(shooter.kind).fire_cooldown_ms;
    state.projectiles.push(projectile);
    state.roster[idx].cooldown_ms = cooldown;
    true
}

/// Advance every live projectile one tick and resolve collisions.
///
/// Projectiles are processed in creation order; each resolves on the first
/// matching condition - bounds exit, terrain impact at its current cell,
/// then entity hit - and a resolved projectile is removed within the same
/// tick. Two projectiles racing for one cell therefore resolve in creation
/// order, the documented tie-break.
pub fn advance_projectiles(state: &mut MatchState, events: &mut Vec<GameEvent>) {
    let mut resolved: Vec<Uuid> = Vec::new();

    for i in 0..state.projectiles.len() {
        {
            let p = &mut state.projectiles[i];
            let (dx, dy) = p.facing.delta();
            p.x += dx * p.speed;
            p.y += dy * p.speed;
        }
        let p = state.projectiles[i].clone();

        // (a) bounds
        if p.x < 0.0
            || p.y < 0.0
            || p.x + PROJECTILE_SIZE > state.grid.width_px()
            || p.y + PROJECTILE_SIZE > state.grid.height_px()
        {
            resolved.push(p.id);
            continue;
        }

        // (b) terrain at the projectile's current cell
        let (cx, cy) = p.center();
        if let Some((col, row)) = state.grid.cell_at(cx, cy) {
            match state.grid.get(col, row) {
                Some(Material::Brick) => {
                    state.grid.set(col, row, Material::Empty);
                    events.push(GameEvent::TerrainDestroyed { col, row });
                    resolved.push(p.id);
                    continue;
                }
                Some(Material::Steel) => {
                    resolved.push(p.id);
                    continue;
                }
                Some(Material::Base) => {
                    // the objective only matters in cooperative mode;
                    // elsewhere the cell absorbs the shot like steel
                    if state.mode == GameMode::Cooperative {
                        state.grid.set(col, row, Material::Empty);
                        events.push(GameEvent::BaseDestroyed);
                        state.finish(Winner::Enemies, events);
                    }
                    resolved.push(p.id);
                    continue;
                }
                _ => {}
            }
        }

        // (c) entity hit, branched by mode
        if let Some(victim_idx) = find_victim(state, &p) {
            resolve_hit(state, &p, victim_idx, events);
            resolved.push(p.id);
        }
    }

    state.projectiles.retain(|p| !resolved.contains(&p.id));
}

/// First eligible victim overlapping the projectile, in roster order.
///
/// Shielded combatants are not hit candidates at all; the shot passes
/// through them. The owner is always excluded.
fn find_victim(state: &MatchState, p: &Projectile) -> Option<usize> {
    state.roster.iter().position(|c| {
        if !c.alive || c.shielded() || c.id == p.owner {
            return false;
        }
        let eligible = match state.mode {
            // AI shots only threaten humans; human shots only threaten the AI
            GameMode::Cooperative => match p.owner_kind {
                CombatantKind::Enemy => c.kind == CombatantKind::Human,
                _ => c.kind == CombatantKind::Enemy,
            },
            // anyone can hit anyone but themselves
            GameMode::Deathmatch | GameMode::DeathmatchBots => true,
        };
        eligible && aabb_overlap(p.x, p.y, PROJECTILE_SIZE, c.x, c.y, UNIT_SIZE)
    })
}

fn resolve_hit(
    state: &mut MatchState,
    p: &Projectile,
    victim_idx: usize,
    events: &mut Vec<GameEvent>,
) {
    match state.mode {
        GameMode::Cooperative => {
            if state.roster[victim_idx].kind == CombatantKind::Human {
                resolve_cooperative_human_hit(state, p, victim_idx, events);
            } else {
                // classic enemy: removed from the roster entirely
                let victim = state.roster.remove(victim_idx);
                state.enemies_on_field = state.enemies_on_field.saturating_sub(1);
                let points = state.config.kill_points;
                if let Some(owner) = state.roster.iter_mut().find(|c| c.id == p.owner) {
                    owner.score += points;
                }
                debug!(victim_id = %victim.id, "enemy destroyed");
                events.push(GameEvent::Kill {
                    killer_id: Some(p.owner),
                    victim_id: victim.id,
                });
            }
        }
        GameMode::Deathmatch | GameMode::DeathmatchBots => {
            let victim_id = state.roster[victim_idx].id;
            {
                let victim = &mut state.roster[victim_idx];
                victim.deaths += 1;
                victim.alive = false;
                victim.moving = false;
            }
            // self-kill is impossible by construction: the owner is excluded
            if let Some(owner) = state.roster.iter_mut().find(|c| c.id == p.owner) {
                owner.score += 1;
            }
            state.respawn_queue.push(PendingRespawn {
                id: victim_id,
                remaining_ms: state.config.respawn_delay_ms,
            });
            events.push(GameEvent::Kill {
                killer_id: Some(p.owner),
                victim_id,
            });
        }
    }
}

fn resolve_cooperative_human_hit(
    state: &mut MatchState,
    p: &Projectile,
    victim_idx: usize,
    events: &mut Vec<GameEvent>,
) {
    let slot = state.roster[victim_idx].join_slot;
    let spawn = (!state.player_spawns.is_empty())
        .then(|| super::grid::spawn_px(state.player_spawns[slot % state.player_spawns.len()]));
    let shield = state.config.spawn_shield_ms;

    let victim = &mut state.roster[victim_idx];
    debug_assert!(victim.lives > 0, "a live cooperative human must have lives");
    victim.lives -= 1;
    victim.deaths += 1;
    let id = victim.id;
    let lives_left = victim.lives;
    if lives_left > 0 {
        // immediate respawn at the join-order slot, behind a fresh shield
        if let Some((x, y)) = spawn {
            victim.x = x;
            victim.y = y;
        }
        victim.facing = super::entity::Direction::Up;
        victim.shield_ms = shield;
        events.push(GameEvent::LifeLost { id, lives_left });
    } else {
        victim.alive = false;
        victim.moving = false;
        events.push(GameEvent::LifeLost { id, lives_left });
        events.push(GameEvent::Kill {
            killer_id: Some(p.owner),
            victim_id: id,
        });
    }
}
