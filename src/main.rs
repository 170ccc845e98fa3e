//! Lane Runner
//!
//! Headless demo: plays a scripted session on the reference corridor,
//! then replays the recorded input and checks the state hash.

use anyhow::{bail, Context};
use tracing::info;
use tracing_subscriber::EnvFilter;

use lane_runner::{
    TICK_RATE, VERSION,
    core::vec3::{Vec2, Vec3},
    game::{
        collision::FlatCorridor,
        config::RunnerConfig,
        events::SimEventData,
        input::{HostCommand, InputLog, KeyCommand, PointerId, PointerPhase, PointerSample, TickInput},
        presentation::{present, HudState, TracingHud},
        store::{BestScoreStore, JsonFileStore, MemoryStore},
        tick::{replay_run, Simulation},
    },
};

/// Store file used when `LANE_RUNNER_STORE` is unset.
const DEFAULT_STORE_PATH: &str = "lane_runner_scores.json";

/// Demo length: 30 seconds.
const DEMO_TICKS: u64 = 30 * TICK_RATE as u64;

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Lane Runner v{}", VERSION);

    let config = RunnerConfig::from_env().context("loading runner config")?;
    info!("Tick Rate: {} Hz, seed {:#x}", config.tick_rate, config.seed);

    let store_path = std::env::var("LANE_RUNNER_STORE").unwrap_or_else(|_| DEFAULT_STORE_PATH.to_string());
    let store = JsonFileStore::open(&store_path).with_context(|| format!("opening {store_path}"))?;

    demo_run(config, store)
}

/// Swipe gesture over two ticks: press, then move far enough to fire.
fn swipe(tick: u64, start_tick: u64, delta: Vec2) -> Option<TickInput> {
    let time = tick as f32 / TICK_RATE as f32;
    let origin = Vec2::new(540.0, 960.0);
    let phase = match tick - start_tick {
        0 => PointerPhase::Begin,
        2 => PointerPhase::Move,
        3 => PointerPhase::End,
        _ => return None,
    };
    let position = if phase == PointerPhase::Begin { origin } else { origin + delta };
    Some(TickInput::pointer(PointerSample::new(PointerId(0), phase, position, time)))
}

/// Scripted input for one tick.
fn scripted_input(tick: u64) -> TickInput {
    let time = tick as f32 / TICK_RATE as f32;
    match tick {
        30..=33 => swipe(tick, 30, Vec2::new(-180.0, 10.0)).unwrap_or_default(),
        90 => TickInput::key(KeyCommand::Jump, time),
        150..=153 => swipe(tick, 150, Vec2::new(8.0, 200.0)).unwrap_or_default(),
        200 => TickInput::command(HostCommand::TogglePause),
        260 => TickInput::command(HostCommand::TogglePause),
        320 | 380 => TickInput::key(KeyCommand::Right, time),
        500..=503 => swipe(tick, 500, Vec2::new(-200.0, -15.0)).unwrap_or_default(),
        1500 => TickInput::command(HostCommand::HazardContact),
        _ => TickInput::empty(),
    }
}

/// Play the scripted session, then verify the replay.
fn demo_run(config: RunnerConfig, store: JsonFileStore) -> anyhow::Result<()> {
    info!("=== Starting Demo Run ===");

    let key = config.session.best_score_key.clone();
    let initial_best = store.get(&key);
    info!("Stored best: {:.0} m", initial_best);

    let mut sim = Simulation::new(config.clone(), FlatCorridor::new(Vec3::ZERO), store);
    let mut hud = TracingHud::default();
    let mut hud_state = HudState::default();

    let mut total_events = 0;
    for tick in 1..=DEMO_TICKS {
        let result = sim.tick(&scripted_input(tick));
        total_events += result.events.len();

        present(&result.events, &mut hud);
        present(&result.events, &mut hud_state);

        for event in &result.events {
            match &event.data {
                SimEventData::LaneChanged { to_lane, .. } => {
                    info!("Tick {}: lane -> {}", event.tick, to_lane);
                }
                SimEventData::JumpExecuted { launch_velocity, coyote } => {
                    info!("Tick {}: jump (v = {:.2}, coyote = {})", event.tick, launch_velocity, coyote);
                }
                _ => {}
            }
        }

        if let Some(summary) = result.game_over {
            info!(
                "Run ended at tick {}: {:.1} m (best {:.1} m{})",
                tick,
                summary.final_score,
                summary.final_best,
                if summary.new_best { ", new best" } else { "" }
            );
            break;
        }

        if tick % (10 * TICK_RATE as u64) == 0 {
            info!(
                "Tick {}: {:.1} m at {:.2} u/s, {} tiles active",
                tick,
                sim.session().distance_run(),
                sim.session().current_speed(),
                sim.world().active_len()
            );
        }
    }

    // Print final results
    info!("=== Run Results ===");
    let hash = sim.compute_hash();
    info!("Final State Hash: {}", hex::encode(hash));
    info!("HUD: score {:.0} m, best {:.0} m", hud_state.score, hud_state.best);
    info!("Total events: {}", total_events);

    let log = sim.take_input_log();
    let bytes = log.to_bytes().context("encoding input log")?;
    info!("Input log: {} entries over {} ticks, {} bytes", log.len(), log.end_tick, bytes.len());

    // Verify by replaying
    info!("=== Verifying Replay ===");
    let restored = InputLog::from_bytes(&bytes).context("decoding input log")?;
    let replayed = replay_run(
        &config,
        &restored,
        FlatCorridor::new(Vec3::ZERO),
        MemoryStore::with_value(&key, initial_best),
    );
    let replay_hash = replayed.compute_hash();
    info!("Replay State Hash: {}", hex::encode(replay_hash));

    if hash != replay_hash {
        bail!("replay diverged: hashes differ");
    }
    info!("REPLAY VERIFIED: Hashes match!");
    Ok(())
}
