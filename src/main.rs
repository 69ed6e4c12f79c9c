//! Arena Server - headless match driver
//!
//! Runs one match to completion without any network attached: builds the
//! stock arena for the configured mode, spawns the match task, subscribes
//! to its broadcasts, and logs the outcome. Useful for smoke-testing the
//! simulation and for profiling the tick loop.

use tokio::time::Duration;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use arena_server::config::Config;
use arena_server::game::runner::MatchMessage;
use arena_server::game::{map, EngineConfig, GameMode, MatchRegistry, MatchRunner};
use arena_server::util::time::unix_millis;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let config = Config::from_env()?;
    init_tracing(&config.log_level);

    let seed = config.seed.unwrap_or_else(unix_millis);
    info!(mode = ?config.mode, seed, "starting headless match");

    let map = match config.mode {
        GameMode::Cooperative => map::cooperative_arena(),
        GameMode::Deathmatch => map::deathmatch_arena(),
        GameMode::DeathmatchBots => {
            map::deathmatch_arena().with_mode(GameMode::DeathmatchBots)
        }
    };
    let engine_config = EngineConfig {
        frag_target: config.frag_target,
        bot_count: config.bot_count,
        ..EngineConfig::default()
    };

    let registry = MatchRegistry::new();
    let handle = MatchRunner::spawn(&map, engine_config, seed);
    let mut messages = handle.subscribe();
    registry.insert(handle.clone());

    handle.start().await;

    let deadline = tokio::time::sleep(Duration::from_secs(config.run_secs));
    tokio::pin!(deadline);
    let mut capped = false;

    loop {
        tokio::select! {
            msg = messages.recv() => match msg {
                Ok(MatchMessage::Ended { winner }) => {
                    info!(winner = ?winner, "match finished");
                    break;
                }
                Ok(MatchMessage::Snapshot { snapshot, events }) => {
                    if !events.is_empty() {
                        info!(tick = snapshot.tick, events = events.len(), "tick events");
                    }
                }
                Err(_) => break,
            },
            _ = &mut deadline, if !capped => {
                info!("run time cap reached, stopping match");
                capped = true;
                handle.stop().await;
            }
        }
    }

    let last = handle.state();
    for c in &last.combatants {
        info!(
            name = %c.name,
            score = c.score,
            deaths = c.deaths,
            alive = c.alive,
            "final standing"
        );
    }

    registry.remove(&handle.id);
    Ok(())
}

/// Initialize tracing/logging
fn init_tracing(log_level: &str) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();
}
