//! Match state and the authoritative fixed-step tick

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info};
use uuid::Uuid;

use super::ai;
use super::combat;
use super::entity::{AiState, Combatant, CombatantKind};
use super::grid::{spawn_px, TileGrid, UNIT_SIZE};
use super::map::MapResource;
use super::movement;
use super::respawn::{self, PendingRespawn};
use super::snapshot::{CombatantView, GameEvent, StateSnapshot, Winner};
use super::{GameMode, InputIntent};

/// Match phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchPhase {
    /// Created, accepting participants, not yet simulating
    Lobby,
    /// Simulating
    Running,
    /// Terminal; never leaves this phase except by full reinitialization
    Ended,
}

/// Tuning constants for one match
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Maximum human participants
    pub max_participants: usize,
    /// Starting lives for cooperative humans
    pub coop_lives: i32,
    /// Score credited per classic-enemy kill
    pub kill_points: u32,
    /// Deathmatch score that ends the match
    pub frag_target: u32,
    /// Delay between elimination and deathmatch respawn (ms)
    pub respawn_delay_ms: f32,
    /// Invulnerability granted on join and cooperative respawn (ms)
    pub spawn_shield_ms: f32,
    /// Invulnerability granted on deathmatch respawn (ms)
    pub respawn_shield_ms: f32,

    // classic-enemy spawner and policy
    pub enemy_quota: u32,
    pub max_enemies_on_field: u32,
    pub enemy_spawn_interval_ms: f32,
    pub enemy_move_interval_ms: f32,
    pub enemy_fire_interval_ms: f32,

    // deathmatch-bot policy
    pub bot_count: u32,
    pub bot_move_interval_ms: f32,
    pub bot_fire_interval_min_ms: f32,
    pub bot_fire_interval_max_ms: f32,
    /// Probability of chasing the nearest target on a movement decision
    pub bot_chase_bias: f32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_participants: 8,
            coop_lives: 3,
            kill_points: 100,
            frag_target: 20,
            respawn_delay_ms: 2000.0,
            spawn_shield_ms: 3000.0,
            respawn_shield_ms: 4000.0,
            enemy_quota: 12,
            max_enemies_on_field: 4,
            enemy_spawn_interval_ms: 3000.0,
            enemy_move_interval_ms: 800.0,
            enemy_fire_interval_ms: 2000.0,
            bot_count: 3,
            bot_move_interval_ms: 800.0,
            bot_fire_interval_min_ms: 1500.0,
            bot_fire_interval_max_ms: 2500.0,
            bot_chase_bias: 0.8,
        }
    }
}

/// Errors surfaced by lifecycle operations. Everything inside the tick is
/// normal control flow and never errors.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("match is full")]
    MatchFull,

    #[error("participant already joined")]
    AlreadyJoined,

    #[error("match already ended")]
    MatchOver,

    #[error("match task unavailable")]
    Unavailable,
}

/// Authoritative state for one match (owned by the match task)
pub struct MatchState {
    pub mode: GameMode,
    pub grid: TileGrid,
    /// Join-order roster; iteration order is the documented evaluation order
    pub roster: Vec<Combatant>,
    /// Live projectiles in creation order
    pub projectiles: Vec<super::entity::Projectile>,
    pub phase: MatchPhase,
    pub winner: Option<Winner>,
    pub tick: u64,

    // cooperative counters
    pub enemies_to_spawn: u32,
    pub enemies_on_field: u32,
    pub enemy_spawn_timer_ms: f32,
    next_ai_spawn: usize,
    pub base_cell: Option<(usize, usize)>,

    // deathmatch
    pub respawn_queue: Vec<PendingRespawn>,

    pub player_spawns: Vec<(usize, usize)>,
    pub dm_spawns: Vec<(usize, usize)>,
    pub ai_spawns: Vec<(usize, usize)>,

    pub humans_ever_joined: bool,
    next_join_slot: usize,
    pub config: EngineConfig,
    pub rng: ChaCha8Rng,
}

impl MatchState {
    /// Latch the terminal state. Once set it is never unset; later calls in
    /// the same tick are ignored.
    pub fn finish(&mut self, winner: Winner, events: &mut Vec<GameEvent>) {
        if self.phase == MatchPhase::Ended {
            return;
        }
        self.phase = MatchPhase::Ended;
        self.winner = Some(winner);
        events.push(GameEvent::MatchOver { winner });
        info!(winner = ?winner, tick = self.tick, "match reached terminal state");
    }

    fn combatant_idx(&self, id: Uuid) -> Option<usize> {
        self.roster.iter().position(|c| c.id == id)
    }

    fn human_count(&self) -> usize {
        self.roster
            .iter()
            .filter(|c| c.kind == CombatantKind::Human)
            .count()
    }
}

/// The authoritative match engine.
///
/// A plain synchronous state machine: `tick` is a pure state transition
/// invoked by an external scheduler at a fixed nominal cadence, so the
/// engine is equally drivable by the production runner, a test harness, or
/// a deterministic replay driver.
pub struct MatchEngine {
    pub id: Uuid,
    state: MatchState,
}

impl MatchEngine {
    /// Create a new match over a defensive copy of the map's terrain
    pub fn new(map: &MapResource, config: EngineConfig, seed: u64) -> Self {
        let grid = map.grid();
        let base_cell = grid.find_base();
        let enemies_to_spawn = if map.mode == GameMode::Cooperative {
            config.enemy_quota
        } else {
            0
        };
        let spawn_timer = config.enemy_spawn_interval_ms;
        Self {
            id: Uuid::new_v4(),
            state: MatchState {
                mode: map.mode,
                grid,
                roster: Vec::new(),
                projectiles: Vec::new(),
                phase: MatchPhase::Lobby,
                winner: None,
                tick: 0,
                enemies_to_spawn,
                enemies_on_field: 0,
                enemy_spawn_timer_ms: spawn_timer,
                next_ai_spawn: 0,
                base_cell,
                respawn_queue: Vec::new(),
                player_spawns: map.player_spawns.clone(),
                dm_spawns: map.dm_spawns.clone(),
                ai_spawns: map.ai_spawns.clone(),
                humans_ever_joined: false,
                next_join_slot: 0,
                config,
                rng: ChaCha8Rng::seed_from_u64(seed),
            },
        }
    }

    pub fn mode(&self) -> GameMode {
        self.state.mode
    }

    pub fn is_finished(&self) -> bool {
        self.state.phase == MatchPhase::Ended
    }

    pub fn has_started(&self) -> bool {
        self.state.phase != MatchPhase::Lobby
    }

    pub fn winner(&self) -> Option<Winner> {
        self.state.winner
    }

    pub fn human_count(&self) -> usize {
        self.state.human_count()
    }

    /// Add a human participant and return its public view.
    ///
    /// Cooperative humans take the spawn slot matching their stable join
    /// order; deathmatch humans are placed by the max-min heuristic.
    pub fn add_participant(&mut self, id: Uuid, name: String) -> Result<CombatantView, EngineError> {
        let state = &mut self.state;
        if state.phase == MatchPhase::Ended {
            return Err(EngineError::MatchOver);
        }
        if state.combatant_idx(id).is_some() {
            return Err(EngineError::AlreadyJoined);
        }
        if state.human_count() >= state.config.max_participants {
            return Err(EngineError::MatchFull);
        }

        let slot = state.next_join_slot;
        state.next_join_slot += 1;

        let (x, y, lives) = match state.mode {
            GameMode::Cooperative => {
                debug_assert!(!state.player_spawns.is_empty());
                let (x, y) = state
                    .player_spawns
                    .get(slot % state.player_spawns.len().max(1))
                    .copied()
                    .map(spawn_px)
                    .unwrap_or((UNIT_SIZE, UNIT_SIZE));
                (x, y, state.config.coop_lives)
            }
            GameMode::Deathmatch | GameMode::DeathmatchBots => {
                let (x, y) =
                    respawn::select_spawn_point(&state.dm_spawns, &state.roster, &mut state.rng)
                        .unwrap_or((UNIT_SIZE, UNIT_SIZE));
                (x, y, -1)
            }
        };

        let mut combatant = Combatant::new(id, name, CombatantKind::Human, slot, x, y, lives);
        combatant.shield_ms = state.config.spawn_shield_ms;
        let view = CombatantView::of(&combatant);
        state.roster.push(combatant);
        state.humans_ever_joined = true;

        info!(
            match_id = %self.id,
            participant_id = %id,
            slot,
            "participant joined match"
        );
        Ok(view)
    }

    /// Remove a human participant. Safe to call mid-match: spawn-slot
    /// assignment is stored per combatant, so surviving indices are
    /// unaffected. Unknown ids and AI ids are no-ops.
    pub fn remove_participant(&mut self, id: Uuid) {
        let state = &mut self.state;
        let before = state.roster.len();
        state
            .roster
            .retain(|c| !(c.id == id && c.kind == CombatantKind::Human));
        if state.roster.len() != before {
            state.respawn_queue.retain(|e| e.id != id);
            info!(match_id = %self.id, participant_id = %id, "participant left match");
        }
    }

    /// Replace a human's standing input wholesale. Unknown ids are no-ops.
    pub fn apply_input(&mut self, id: Uuid, intent: InputIntent) {
        if let Some(idx) = self.state.combatant_idx(id) {
            if self.state.roster[idx].kind == CombatantKind::Human {
                self.state.roster[idx].input = intent;
            }
        }
    }

    /// Begin simulating. In deathmatch-with-bots this seeds the bot roster.
    pub fn start(&mut self) {
        if self.state.phase != MatchPhase::Lobby {
            return;
        }
        self.state.phase = MatchPhase::Running;
        if self.state.mode == GameMode::DeathmatchBots {
            self.spawn_bots();
        }
        info!(match_id = %self.id, mode = ?self.state.mode, "match started");
    }

    /// Halt the match immediately; no further ticks mutate state.
    pub fn stop(&mut self) {
        if self.state.phase != MatchPhase::Ended {
            self.state.phase = MatchPhase::Ended;
            info!(match_id = %self.id, "match stopped");
        }
    }

    /// Read-only projection of the most recently completed tick
    pub fn snapshot(&self) -> StateSnapshot {
        StateSnapshot::capture(&self.state)
    }

    /// Advance the simulation by one fixed step.
    ///
    /// `elapsed_ms` is the true time since the previous call and drives the
    /// simulated countdowns; displacement per tick is constant, so the
    /// caller's cadence determines effective speed.
    pub fn tick(&mut self, elapsed_ms: f32) -> Vec<GameEvent> {
        let mut events = Vec::new();
        if self.state.phase != MatchPhase::Running {
            return events;
        }
        self.state.tick += 1;

        // 1. per-entity timers
        for c in &mut self.state.roster {
            c.tick_timers(elapsed_ms);
        }

        // 2. pending respawns (deathmatch only)
        if self.state.mode.is_deathmatch() {
            respawn::tick_respawns(&mut self.state, elapsed_ms, &mut events);
        }

        // 3. buffered human input
        self.apply_human_intents(&mut events);

        // 4. AI control (and the cooperative enemy spawner feeding it)
        if self.state.mode == GameMode::Cooperative {
            self.spawn_enemies(elapsed_ms, &mut events);
        }
        ai::drive_ai(&mut self.state, elapsed_ms, &mut events);

        // 5. projectiles
        combat::advance_projectiles(&mut self.state, &mut events);

        // 6. terminal-state evaluation
        self.evaluate_win(&mut events);

        events
    }

    fn apply_human_intents(&mut self, events: &mut Vec<GameEvent>) {
        let state = &mut self.state;
        for idx in 0..state.roster.len() {
            if state.roster[idx].kind != CombatantKind::Human || !state.roster[idx].alive {
                continue;
            }
            let intent = state.roster[idx].input;
            // the moving flag follows intent, not success
            state.roster[idx].moving = intent.direction().is_some();
            if let Some(dir) = intent.direction() {
                movement::step(&state.grid, &mut state.roster, idx, dir);
            }
            if intent.fire {
                combat::try_fire(state, idx, events);
            }
        }
    }

    /// Feed the field from the spawn quota at a fixed interval
    fn spawn_enemies(&mut self, elapsed_ms: f32, events: &mut Vec<GameEvent>) {
        let state = &mut self.state;
        state.enemy_spawn_timer_ms -= elapsed_ms;
        if state.enemy_spawn_timer_ms > 0.0 {
            return;
        }
        state.enemy_spawn_timer_ms = state.config.enemy_spawn_interval_ms;

        if state.enemies_to_spawn == 0
            || state.enemies_on_field >= state.config.max_enemies_on_field
            || state.ai_spawns.is_empty()
        {
            return;
        }

        // round-robin over the entry cells, skipping blocked footprints;
        // a fully blocked field retries on the next interval
        for attempt in 0..state.ai_spawns.len() {
            let cell = state.ai_spawns[(state.next_ai_spawn + attempt) % state.ai_spawns.len()];
            let (x, y) = spawn_px(cell);
            if !movement::position_clear(&state.grid, &state.roster, Uuid::nil(), x, y) {
                continue;
            }
            state.next_ai_spawn = (state.next_ai_spawn + attempt + 1) % state.ai_spawns.len();

            let slot = state.next_join_slot;
            state.next_join_slot += 1;
            let id = Uuid::new_v4();
            let mut enemy = Combatant::new(
                id,
                format!("Invader {}", slot + 1),
                CombatantKind::Enemy,
                slot,
                x,
                y,
                -1,
            );
            // stagger the first shot so a wave doesn't fire in lockstep
            enemy.ai = Some(AiState {
                move_timer_ms: 0.0,
                fire_timer_ms: state.rng.gen_range(0.0..state.config.enemy_fire_interval_ms),
                target: None,
            });
            state.roster.push(enemy);
            state.enemies_to_spawn -= 1;
            state.enemies_on_field += 1;
            debug!(enemy_id = %id, remaining = state.enemies_to_spawn, "enemy spawned");
            events.push(GameEvent::EnemySpawned { id });
            return;
        }
    }

    /// Seed the bot roster at match start
    fn spawn_bots(&mut self) {
        let state = &mut self.state;
        for n in 0..state.config.bot_count {
            let (x, y) =
                respawn::select_spawn_point(&state.dm_spawns, &state.roster, &mut state.rng)
                    .unwrap_or((UNIT_SIZE, UNIT_SIZE));
            let slot = state.next_join_slot;
            state.next_join_slot += 1;
            let id = Uuid::new_v4();
            let mut bot = Combatant::new(
                id,
                format!("Bot {}", n + 1),
                CombatantKind::Bot,
                slot,
                x,
                y,
                -1,
            );
            bot.shield_ms = state.config.spawn_shield_ms;
            bot.ai = Some(AiState {
                move_timer_ms: 0.0,
                fire_timer_ms: state.rng.gen_range(
                    state.config.bot_fire_interval_min_ms..state.config.bot_fire_interval_max_ms,
                ),
                target: None,
            });
            state.roster.push(bot);
        }
    }

    /// Per-mode terminal-state detection. An already-terminal match is never
    /// re-evaluated; the cooperative base check runs inline during terrain
    /// resolution, not here.
    fn evaluate_win(&mut self, events: &mut Vec<GameEvent>) {
        let state = &mut self.state;
        if state.phase != MatchPhase::Running {
            return;
        }
        match state.mode {
            GameMode::Cooperative => {
                let defenders_out = state.humans_ever_joined
                    && state
                        .roster
                        .iter()
                        .filter(|c| c.kind == CombatantKind::Human)
                        .all(|c| c.lives == 0);
                if defenders_out {
                    state.finish(Winner::Enemies, events);
                } else if state.enemies_to_spawn == 0 && state.enemies_on_field == 0 {
                    state.finish(Winner::Humans, events);
                }
            }
            GameMode::Deathmatch | GameMode::DeathmatchBots => {
                // roster order is join order: the documented tie-break for
                // simultaneous frag-target achievement
                let target = state.config.frag_target;
                if let Some(id) = state
                    .roster
                    .iter()
                    .find(|c| c.score >= target)
                    .map(|c| c.id)
                {
                    state.finish(Winner::Participant { id }, events);
                }
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn state_mut(&mut self) -> &mut MatchState {
        &mut self.state
    }

    #[cfg(test)]
    pub(crate) fn state(&self) -> &MatchState {
        &self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::entity::Direction;
    use crate::game::grid::{Material, TILE_SIZE};
    use crate::game::map;

    const TICK_MS: f32 = 1000.0 / 30.0;

    fn quiet_config() -> EngineConfig {
        EngineConfig {
            spawn_shield_ms: 0.0,
            respawn_shield_ms: 0.0,
            enemy_quota: 0,
            bot_count: 0,
            ..EngineConfig::default()
        }
    }

    fn coop_engine(config: EngineConfig) -> MatchEngine {
        MatchEngine::new(&map::cooperative_arena(), config, 42)
    }

    fn dm_engine(config: EngineConfig) -> MatchEngine {
        MatchEngine::new(&map::deathmatch_arena(), config, 42)
    }

    #[test]
    fn tick_is_a_no_op_before_start_and_after_stop() {
        let mut engine = coop_engine(quiet_config());
        engine.add_participant(Uuid::new_v4(), "p1".into()).unwrap();
        assert!(engine.tick(TICK_MS).is_empty());
        assert_eq!(engine.snapshot().tick, 0);

        engine.start();
        engine.stop();
        assert!(engine.tick(TICK_MS).is_empty());
        assert!(engine.is_finished());
        assert_eq!(engine.winner(), None);
    }

    #[test]
    fn duplicate_join_and_full_match_are_rejected() {
        let mut engine = dm_engine(EngineConfig {
            max_participants: 1,
            ..quiet_config()
        });
        let id = Uuid::new_v4();
        engine.add_participant(id, "p1".into()).unwrap();
        assert!(matches!(
            engine.add_participant(id, "p1".into()),
            Err(EngineError::AlreadyJoined)
        ));
        assert!(matches!(
            engine.add_participant(Uuid::new_v4(), "p2".into()),
            Err(EngineError::MatchFull)
        ));
    }

    #[test]
    fn input_for_missing_participant_is_a_no_op() {
        let mut engine = dm_engine(quiet_config());
        engine.apply_input(
            Uuid::new_v4(),
            InputIntent {
                up: true,
                ..Default::default()
            },
        );
        engine.remove_participant(Uuid::new_v4());
    }

    #[test]
    fn human_movement_honors_priority_and_blocking() {
        let mut engine = dm_engine(quiet_config());
        let id = Uuid::new_v4();
        engine.add_participant(id, "p1".into()).unwrap();
        engine.start();

        let (x0, y0) = {
            let c = &engine.state().roster[0];
            (c.x, c.y)
        };
        engine.apply_input(
            id,
            InputIntent {
                up: true,
                left: true,
                ..Default::default()
            },
        );
        engine.tick(TICK_MS);
        let c = &engine.state().roster[0];
        // up wins the priority race over left; facing and the moving flag
        // change even if the border wall rejects the displacement
        assert_eq!(c.facing, Direction::Up);
        assert!(c.moving);
        assert_eq!(c.x, x0);
        assert!(c.y <= y0);
    }

    #[test]
    fn containment_holds_under_sustained_input() {
        let mut engine = dm_engine(quiet_config());
        let id = Uuid::new_v4();
        engine.add_participant(id, "p1".into()).unwrap();
        engine.start();
        engine.apply_input(
            id,
            InputIntent {
                left: true,
                ..Default::default()
            },
        );
        for _ in 0..200 {
            engine.tick(TICK_MS);
            let snap = engine.snapshot();
            let c = &snap.combatants[0];
            assert!(c.x >= 0.0 && c.y >= 0.0);
            assert!(c.x + UNIT_SIZE <= snap.grid.cols as f32 * TILE_SIZE);
            assert!(c.y + UNIT_SIZE <= snap.grid.rows as f32 * TILE_SIZE);
        }
    }

    #[test]
    fn destructible_cell_clears_once_then_shots_pass_through() {
        let mut engine = coop_engine(quiet_config());
        let id = Uuid::new_v4();
        engine.add_participant(id, "p1".into()).unwrap();
        engine.start();
        // keep the quota-exhausted victory branch out of reach while firing,
        // without actually letting the spawner run
        engine.state_mut().enemies_to_spawn = 5;
        engine.state_mut().enemy_spawn_timer_ms = f32::MAX;

        // place the human two tiles left of a brick, facing it
        {
            let state = engine.state_mut();
            state.grid.set(6, 6, Material::Empty); // clear the water channel row
            state.grid.set(7, 6, Material::Brick);
            state.grid.set(8, 6, Material::Empty);
            let c = &mut state.roster[0];
            c.x = 5.0 * TILE_SIZE + 2.0;
            c.y = 6.0 * TILE_SIZE + 2.0;
            c.facing = Direction::Right;
        }

        let fire_once = |engine: &mut MatchEngine| {
            engine.state_mut().roster[0].cooldown_ms = 0.0;
            let mut events = Vec::new();
            combat::try_fire(engine.state_mut(), 0, &mut events);
            // let the shot run to resolution
            for _ in 0..64 {
                engine.tick(TICK_MS);
                if engine.snapshot().projectiles.is_empty() {
                    break;
                }
            }
        };

        fire_once(&mut engine);
        assert_eq!(engine.state().grid.get(7, 6), Some(Material::Empty));

        // subsequent shots fly through the cleared cell and exit elsewhere
        fire_once(&mut engine);
        assert_eq!(engine.state().grid.get(7, 6), Some(Material::Empty));
        assert!(engine.snapshot().projectiles.is_empty());
    }

    #[test]
    fn indestructible_terrain_is_idempotent_under_fire() {
        let mut engine = coop_engine(quiet_config());
        let id = Uuid::new_v4();
        engine.add_participant(id, "p1".into()).unwrap();
        engine.start();
        engine.state_mut().enemies_to_spawn = 5;
        engine.state_mut().enemy_spawn_timer_ms = f32::MAX;
        {
            let state = engine.state_mut();
            state.grid.set(6, 6, Material::Steel);
            let c = &mut state.roster[0];
            c.x = 4.0 * TILE_SIZE + 2.0;
            c.y = 6.0 * TILE_SIZE + 2.0;
            c.facing = Direction::Right;
        }
        for _ in 0..3 {
            engine.state_mut().roster[0].cooldown_ms = 0.0;
            let mut events = Vec::new();
            combat::try_fire(engine.state_mut(), 0, &mut events);
            for _ in 0..32 {
                engine.tick(TICK_MS);
            }
            assert_eq!(engine.state().grid.get(6, 6), Some(Material::Steel));
        }
    }

    #[test]
    fn base_destruction_ends_cooperative_match_inline() {
        let mut engine = coop_engine(quiet_config());
        let id = Uuid::new_v4();
        engine.add_participant(id, "p1".into()).unwrap();
        engine.start();
        engine.state_mut().enemies_to_spawn = 5;
        engine.state_mut().enemy_spawn_timer_ms = f32::MAX;
        {
            let state = engine.state_mut();
            // open a clean lane to the base at (7,11)
            state.grid.set(6, 11, Material::Empty);
            let c = &mut state.roster[0];
            c.x = 4.0 * TILE_SIZE + 2.0;
            c.y = 11.0 * TILE_SIZE + 2.0;
            c.facing = Direction::Right;
            c.cooldown_ms = 0.0;
        }
        let mut events = Vec::new();
        combat::try_fire(engine.state_mut(), 0, &mut events);
        for _ in 0..64 {
            engine.tick(TICK_MS);
            if engine.is_finished() {
                break;
            }
        }
        assert!(engine.is_finished());
        assert_eq!(engine.winner(), Some(Winner::Enemies));
        assert_eq!(engine.state().grid.find_base(), None);

        let snap = engine.snapshot();
        assert!(snap.finished);
        assert_eq!(snap.winner, Some(Winner::Enemies));
    }

    #[test]
    fn cooperative_victory_when_quota_and_field_are_empty() {
        let mut engine = coop_engine(quiet_config()); // quota 0
        engine.add_participant(Uuid::new_v4(), "p1".into()).unwrap();
        engine.start();
        engine.tick(TICK_MS);
        assert!(engine.is_finished());
        assert_eq!(engine.winner(), Some(Winner::Humans));
    }

    #[test]
    fn cooperative_defeat_when_all_lives_are_gone() {
        let mut engine = coop_engine(quiet_config());
        let id = Uuid::new_v4();
        engine.add_participant(id, "p1".into()).unwrap();
        // keep the victory branch out of reach
        engine.state_mut().enemies_to_spawn = 5;
        engine.start();
        engine.state_mut().roster[0].lives = 0;
        engine.state_mut().roster[0].alive = false;
        engine.tick(TICK_MS);
        assert!(engine.is_finished());
        assert_eq!(engine.winner(), Some(Winner::Enemies));
    }

    #[test]
    fn frag_target_ends_deathmatch_same_tick() {
        let mut engine = dm_engine(EngineConfig {
            frag_target: 20,
            ..quiet_config()
        });
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        engine.add_participant(a, "a".into()).unwrap();
        engine.add_participant(b, "b".into()).unwrap();
        engine.start();
        engine.state_mut().roster[0].score = 19;
        engine.tick(TICK_MS);
        assert!(!engine.is_finished());

        engine.state_mut().roster[0].score = 20;
        engine.tick(TICK_MS);
        assert!(engine.is_finished());
        assert_eq!(engine.winner(), Some(Winner::Participant { id: a }));
    }

    #[test]
    fn shielded_victim_cannot_be_eliminated() {
        let mut engine = dm_engine(quiet_config());
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        engine.add_participant(a, "a".into()).unwrap();
        engine.add_participant(b, "b".into()).unwrap();
        engine.start();
        {
            let state = engine.state_mut();
            // line them up point-blank on an open row
            state.roster[0].x = 5.0 * TILE_SIZE + 2.0;
            state.roster[0].y = 2.0 * TILE_SIZE + 2.0;
            state.roster[0].facing = Direction::Right;
            state.roster[0].cooldown_ms = 0.0;
            state.roster[1].x = 6.0 * TILE_SIZE + 2.0;
            state.roster[1].y = 2.0 * TILE_SIZE + 2.0;
            state.roster[1].shield_ms = 60_000.0;
        }
        let mut events = Vec::new();
        combat::try_fire(engine.state_mut(), 0, &mut events);
        for _ in 0..32 {
            engine.tick(TICK_MS);
        }
        let snap = engine.snapshot();
        let victim = snap.combatants.iter().find(|c| c.id == b).unwrap();
        assert!(victim.alive);
        assert_eq!(victim.deaths, 0);
        assert!(victim.shielded);
    }

    #[test]
    fn projectiles_never_hit_their_owner() {
        let mut engine = dm_engine(quiet_config());
        let a = Uuid::new_v4();
        engine.add_participant(a, "a".into()).unwrap();
        engine.start();
        {
            let state = engine.state_mut();
            state.roster[0].x = 5.0 * TILE_SIZE + 2.0;
            state.roster[0].y = 2.0 * TILE_SIZE + 2.0;
            state.roster[0].facing = Direction::Right;
            state.roster[0].cooldown_ms = 0.0;
        }
        let mut events = Vec::new();
        combat::try_fire(engine.state_mut(), 0, &mut events);
        // teleport the owner into the projectile's path
        {
            let state = engine.state_mut();
            state.roster[0].x = 8.0 * TILE_SIZE + 2.0;
        }
        for _ in 0..64 {
            engine.tick(TICK_MS);
        }
        let snap = engine.snapshot();
        assert!(snap.combatants[0].alive);
        assert_eq!(snap.combatants[0].deaths, 0);
    }

    #[test]
    fn deathmatch_hit_scores_enqueues_and_respawns_after_delay() {
        let mut engine = dm_engine(EngineConfig {
            respawn_delay_ms: 2000.0,
            respawn_shield_ms: 4000.0,
            ..quiet_config()
        });
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        engine.add_participant(a, "a".into()).unwrap();
        engine.add_participant(b, "b".into()).unwrap();
        engine.start();
        {
            let state = engine.state_mut();
            state.roster[0].x = 4.0 * TILE_SIZE + 2.0;
            state.roster[0].y = 2.0 * TILE_SIZE + 2.0;
            state.roster[0].facing = Direction::Right;
            state.roster[0].cooldown_ms = 0.0;
            state.roster[1].x = 5.0 * TILE_SIZE + 2.0;
            state.roster[1].y = 2.0 * TILE_SIZE + 2.0;
        }
        let mut events = Vec::new();
        combat::try_fire(engine.state_mut(), 0, &mut events);
        engine.tick(TICK_MS);

        let snap = engine.snapshot();
        let shooter = snap.combatants.iter().find(|c| c.id == a).unwrap();
        let victim = snap.combatants.iter().find(|c| c.id == b).unwrap();
        assert_eq!(shooter.score, 1);
        assert_eq!(victim.deaths, 1);
        assert!(!victim.alive);
        assert_eq!(victim.lives, -1);

        // sit out the delay in simulated time
        let mut sim_ms = 0.0;
        let mut revived_at = None;
        for _ in 0..80 {
            engine.tick(TICK_MS);
            sim_ms += TICK_MS;
            let mid = engine.snapshot();
            let v = mid.combatants.iter().find(|c| c.id == b).unwrap();
            if v.alive {
                assert!(v.shielded, "respawn must grant a fresh shield");
                revived_at = Some(sim_ms);
                break;
            }
        }
        let revived_at = revived_at.expect("victim never respawned");
        assert!(
            revived_at >= 2000.0 && revived_at <= 2000.0 + 2.0 * TICK_MS,
            "respawn after {revived_at}ms, expected the 2000ms delay"
        );
    }

    #[test]
    fn enemy_spawner_respects_quota_and_field_cap() {
        let mut engine = coop_engine(EngineConfig {
            enemy_quota: 2,
            max_enemies_on_field: 1,
            enemy_spawn_interval_ms: 100.0,
            ..quiet_config()
        });
        engine.add_participant(Uuid::new_v4(), "p1".into()).unwrap();
        engine.start();
        for _ in 0..120 {
            engine.tick(TICK_MS);
        }
        let snap = engine.snapshot();
        assert_eq!(snap.enemies_on_field, 1);
        assert_eq!(snap.enemies_remaining, 1);
        let enemies = snap
            .combatants
            .iter()
            .filter(|c| c.kind == CombatantKind::Enemy)
            .count();
        assert_eq!(enemies, 1);
    }

    #[test]
    fn removing_a_participant_keeps_other_spawn_slots_stable() {
        let mut engine = coop_engine(quiet_config());
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        engine.add_participant(a, "a".into()).unwrap();
        engine.add_participant(b, "b".into()).unwrap();
        engine.remove_participant(a);
        assert_eq!(engine.state().roster[0].join_slot, 1);
        // b still respawns at its own slot after a life loss
        let c = Uuid::new_v4();
        engine.add_participant(c, "c".into()).unwrap();
        assert_eq!(engine.state().roster[1].join_slot, 2);
    }

    #[test]
    fn snapshot_hides_raw_countdowns() {
        let mut engine = dm_engine(EngineConfig {
            spawn_shield_ms: 5000.0,
            ..quiet_config()
        });
        engine.add_participant(Uuid::new_v4(), "a".into()).unwrap();
        let snap = engine.snapshot();
        let json = serde_json::to_value(&snap).unwrap();
        let combatant = &json["combatants"][0];
        assert_eq!(combatant["shielded"], serde_json::Value::Bool(true));
        assert!(combatant.get("shield_ms").is_none());
        assert!(combatant.get("cooldown_ms").is_none());
        assert!(combatant.get("input").is_none());
        assert!(combatant.get("ai").is_none());
    }
}
