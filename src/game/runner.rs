//! Per-match actor task, handle, and registry
//!
//! Tick execution and input delivery come from different callers; giving
//! each match a single-owner task serializes them. Commands arrive on an
//! mpsc channel and are drained at the top of every tick, so a tick never
//! observes a half-applied write. Snapshots go out on a broadcast channel
//! and into a shared cell, so reading state never delays the tick.

use std::mem;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use parking_lot::RwLock;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::time::interval;
use tracing::{info, warn};
use uuid::Uuid;

use crate::util::time::{Timer, SIMULATION_TPS, SNAPSHOT_TPS, TICK_DURATION_MS};

use super::engine::{EngineConfig, EngineError, MatchEngine};
use super::map::MapResource;
use super::snapshot::{CombatantView, GameEvent, SnapshotCadence, StateSnapshot, Winner};
use super::InputIntent;

/// Lifecycle commands accepted by the match task
pub enum EngineCommand {
    Join {
        id: Uuid,
        name: String,
        reply: oneshot::Sender<Result<CombatantView, EngineError>>,
    },
    Leave {
        id: Uuid,
    },
    Input {
        id: Uuid,
        intent: InputIntent,
    },
    Start,
    Stop,
}

/// Messages broadcast to match subscribers
#[derive(Debug, Clone)]
pub enum MatchMessage {
    /// Periodic state snapshot plus the events since the previous one
    Snapshot {
        snapshot: StateSnapshot,
        events: Vec<GameEvent>,
    },
    /// The match is over; no further snapshots will follow
    Ended { winner: Option<Winner> },
}

/// Handle to a running match
#[derive(Clone)]
pub struct MatchHandle {
    pub id: Uuid,
    cmd_tx: mpsc::Sender<EngineCommand>,
    msg_tx: broadcast::Sender<MatchMessage>,
    latest: Arc<RwLock<StateSnapshot>>,
    participants: Arc<AtomicUsize>,
}

impl MatchHandle {
    /// Add a human participant, returning its public view
    pub async fn join(&self, id: Uuid, name: String) -> Result<CombatantView, EngineError> {
        let (reply, rx) = oneshot::channel();
        self.cmd_tx
            .send(EngineCommand::Join { id, name, reply })
            .await
            .map_err(|_| EngineError::Unavailable)?;
        rx.await.map_err(|_| EngineError::Unavailable)?
    }

    pub async fn leave(&self, id: Uuid) {
        let _ = self.cmd_tx.send(EngineCommand::Leave { id }).await;
    }

    /// Deliver a standing input intent; last write wins
    pub async fn input(&self, id: Uuid, intent: InputIntent) {
        let _ = self.cmd_tx.send(EngineCommand::Input { id, intent }).await;
    }

    pub async fn start(&self) {
        let _ = self.cmd_tx.send(EngineCommand::Start).await;
    }

    pub async fn stop(&self) {
        let _ = self.cmd_tx.send(EngineCommand::Stop).await;
    }

    /// Subscribe to snapshot/event broadcasts
    pub fn subscribe(&self) -> broadcast::Receiver<MatchMessage> {
        self.msg_tx.subscribe()
    }

    /// Copy of the most recently completed tick's snapshot
    pub fn state(&self) -> StateSnapshot {
        self.latest.read().clone()
    }

    pub fn participant_count(&self) -> usize {
        self.participants.load(Ordering::Relaxed)
    }
}

/// Spawns and owns the tick task for one match
pub struct MatchRunner;

impl MatchRunner {
    /// Create the engine and drive it on its own task at the fixed cadence
    pub fn spawn(map: &MapResource, config: EngineConfig, seed: u64) -> MatchHandle {
        let engine = MatchEngine::new(map, config, seed);
        let id = engine.id;

        let (cmd_tx, cmd_rx) = mpsc::channel(256);
        let (msg_tx, _) = broadcast::channel(64);
        let latest = Arc::new(RwLock::new(engine.snapshot()));
        let participants = Arc::new(AtomicUsize::new(0));

        let handle = MatchHandle {
            id,
            cmd_tx,
            msg_tx: msg_tx.clone(),
            latest: latest.clone(),
            participants: participants.clone(),
        };

        tokio::spawn(run_match(engine, cmd_rx, msg_tx, latest, participants));

        handle
    }
}

/// The authoritative tick loop for one match
async fn run_match(
    mut engine: MatchEngine,
    mut cmd_rx: mpsc::Receiver<EngineCommand>,
    msg_tx: broadcast::Sender<MatchMessage>,
    latest: Arc<RwLock<StateSnapshot>>,
    participants: Arc<AtomicUsize>,
) {
    let match_id = engine.id;
    info!(match_id = %match_id, mode = ?engine.mode(), "match task started");

    let mut ticker = interval(Duration::from_millis(TICK_DURATION_MS));
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    let mut cadence = SnapshotCadence::new(SIMULATION_TPS / SNAPSHOT_TPS);
    let mut clock = Timer::new();
    let mut pending_events: Vec<GameEvent> = Vec::new();

    loop {
        ticker.tick().await;

        // drain all commands delivered since the previous tick
        let mut channel_closed = false;
        loop {
            match cmd_rx.try_recv() {
                Ok(cmd) => apply_command(&mut engine, cmd, &participants),
                Err(mpsc::error::TryRecvError::Empty) => break,
                Err(mpsc::error::TryRecvError::Disconnected) => {
                    channel_closed = true;
                    break;
                }
            }
        }

        // true elapsed time since the previous tick drives the countdowns
        let elapsed_ms = clock.elapsed_ms() as f32;
        clock.reset();
        let events = engine.tick(elapsed_ms);
        pending_events.extend(events);

        let snapshot = engine.snapshot();
        *latest.write() = snapshot.clone();

        if engine.is_finished() {
            cadence.force_next();
        }
        if cadence.should_send() {
            let _ = msg_tx.send(MatchMessage::Snapshot {
                snapshot,
                events: mem::take(&mut pending_events),
            });
        }

        if engine.is_finished() {
            info!(match_id = %match_id, winner = ?engine.winner(), "match ended");
            let _ = msg_tx.send(MatchMessage::Ended {
                winner: engine.winner(),
            });
            break;
        }

        if channel_closed {
            warn!(match_id = %match_id, "command channel closed, ending match task");
            break;
        }

        // everyone left a started match: nothing more to simulate for
        if engine.has_started() && engine.human_count() == 0 {
            info!(match_id = %match_id, "all participants left, ending match");
            let _ = msg_tx.send(MatchMessage::Ended { winner: None });
            break;
        }
    }
}

fn apply_command(engine: &mut MatchEngine, cmd: EngineCommand, participants: &AtomicUsize) {
    match cmd {
        EngineCommand::Join { id, name, reply } => {
            let result = engine.add_participant(id, name);
            participants.store(engine.human_count(), Ordering::Relaxed);
            let _ = reply.send(result);
        }
        EngineCommand::Leave { id } => {
            engine.remove_participant(id);
            participants.store(engine.human_count(), Ordering::Relaxed);
        }
        EngineCommand::Input { id, intent } => engine.apply_input(id, intent),
        EngineCommand::Start => engine.start(),
        EngineCommand::Stop => engine.stop(),
    }
}

/// Registry of all active matches
pub struct MatchRegistry {
    matches: DashMap<Uuid, MatchHandle>,
}

impl MatchRegistry {
    pub fn new() -> Self {
        Self {
            matches: DashMap::new(),
        }
    }

    pub fn get(&self, id: &Uuid) -> Option<MatchHandle> {
        self.matches.get(id).map(|m| m.value().clone())
    }

    pub fn insert(&self, handle: MatchHandle) {
        self.matches.insert(handle.id, handle);
    }

    pub fn remove(&self, id: &Uuid) -> Option<MatchHandle> {
        self.matches.remove(id).map(|(_, h)| h)
    }

    pub fn active_matches(&self) -> usize {
        self.matches.len()
    }

    pub fn total_participants(&self) -> usize {
        self.matches
            .iter()
            .map(|m| m.value().participant_count())
            .sum()
    }

    /// Find a match with open participant slots
    pub fn find_available_match(&self, max_participants: usize) -> Option<MatchHandle> {
        for entry in self.matches.iter() {
            if entry.value().participant_count() < max_participants {
                return Some(entry.value().clone());
            }
        }
        None
    }
}

impl Default for MatchRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::map;

    #[tokio::test]
    async fn join_tick_snapshot_stop_round_trip() {
        let map = map::deathmatch_arena();
        let config = EngineConfig {
            spawn_shield_ms: 0.0,
            bot_count: 0,
            ..EngineConfig::default()
        };
        let handle = MatchRunner::spawn(&map, config, 7);
        let mut rx = handle.subscribe();

        let id = Uuid::new_v4();
        let view = handle.join(id, "p1".into()).await.unwrap();
        assert_eq!(view.id, id);
        assert_eq!(handle.participant_count(), 1);

        handle.start().await;
        handle
            .input(
                id,
                InputIntent {
                    right: true,
                    ..Default::default()
                },
            )
            .await;

        // wait for a broadcast proving the loop is ticking
        let msg = tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .expect("no broadcast within 2s")
            .expect("broadcast channel closed");
        assert!(matches!(msg, MatchMessage::Snapshot { .. }));

        // the start command is applied before some subsequent tick
        for _ in 0..100 {
            if handle.state().tick > 0 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        let snap = handle.state();
        assert_eq!(snap.combatants.len(), 1);
        assert!(snap.tick > 0);

        handle.stop().await;
        // the task announces termination
        loop {
            match tokio::time::timeout(Duration::from_secs(2), rx.recv())
                .await
                .expect("no end message within 2s")
            {
                Ok(MatchMessage::Ended { winner }) => {
                    assert_eq!(winner, None);
                    break;
                }
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(e) => panic!("broadcast closed early: {e}"),
            }
        }
        assert!(handle.state().finished);
    }

    #[tokio::test]
    async fn registry_tracks_handles() {
        let registry = MatchRegistry::new();
        let handle = MatchRunner::spawn(
            &map::deathmatch_arena(),
            EngineConfig::default(),
            1,
        );
        let id = handle.id;
        registry.insert(handle);
        assert_eq!(registry.active_matches(), 1);
        assert!(registry.get(&id).is_some());
        assert!(registry.find_available_match(8).is_some());
        registry.remove(&id);
        assert_eq!(registry.active_matches(), 0);
    }
}
