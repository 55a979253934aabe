//! Ledgeline Demo
//!
//! Runs a scripted platforming sequence at a render rate that differs from
//! the tick rate, then replays the recorded input and checks the state hash.

use anyhow::{bail, Context};
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use ledgeline::{
    VERSION,
    core::vec2::Vec2,
    game::{
        config::{SimConfig, CONFIG_ENV_VAR},
        events::{GameEvent, GameEventData},
        input::{ButtonId, InputFrame, InputRecording},
        collision::StaticGeometry,
        tick::{replay, Simulation, Spawn},
    },
};

/// Render rate of the demo, deliberately not a multiple of the tick rate.
const RENDER_HZ: u32 = 144;

/// Demo length in seconds.
const DEMO_SECONDS: u32 = 4;

fn main() -> anyhow::Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("Failed to set tracing subscriber")?;

    info!("Ledgeline demo v{}", VERSION);

    let config = SimConfig::from_env().with_context(|| format!("Failed to load config from ${}", CONFIG_ENV_VAR))?;
    info!("Tick Rate: {} Hz, Render Rate: {} Hz", config.tick_rate, RENDER_HZ);

    demo_run(config)
}

/// Floor, a wall to run into and a low ledge to clip with a jump.
fn demo_level() -> StaticGeometry {
    StaticGeometry::new()
        .with_box(Vec2::new(-20.0, -1.0), Vec2::new(60.0, 1.0))
        .with_box(Vec2::new(-6.0, 0.0), Vec2::new(1.0, 6.0))
        .with_box(Vec2::new(4.0, 2.2), Vec2::new(4.0, 0.5))
}

/// Input for the frame starting `ms` milliseconds into the demo.
fn scripted_input(ms: u32) -> InputFrame {
    let mut frame = InputFrame::new();
    match ms {
        0..=799 => frame.set(ButtonId::Left, true),
        1000..=2199 => frame.set(ButtonId::Right, true),
        _ => {}
    }
    // Short hop, then a full jump under the ledge, then a buffered jump
    let jump = matches!(ms, 1200..=1249 | 1500..=1899 | 2950..=3100);
    frame.set(ButtonId::Jump, jump);
    frame
}

fn demo_run(config: SimConfig) -> anyhow::Result<()> {
    info!("=== Starting Demo Run ===");

    let spawn = Spawn::at(Vec2::new(0.0, 1.0));
    let mut sim = Simulation::new(config.clone(), demo_level(), spawn);
    sim.add_listener(Box::new(|event: &GameEvent| match event.data {
        GameEventData::JumpStarted => info!("Tick {}: jump", event.tick),
        GameEventData::LandedWithImpactSpeed { speed } => {
            info!("Tick {}: landed at {:.2} u/s", event.tick, speed)
        }
    }));

    let frame_dt = 1.0 / f64::from(RENDER_HZ);
    let mut corrections = 0;
    for frame_index in 0..RENDER_HZ * DEMO_SECONDS {
        let ms = frame_index * 1000 / RENDER_HZ;
        for report in sim.frame(&scripted_input(ms), frame_dt) {
            if report.corrected {
                corrections += 1;
                info!("Tick {}: corner correction at {}", report.tick, report.position);
            }
        }
    }

    let actor = sim.actor();
    info!("=== Run Results ===");
    info!("Ticks: {}", sim.current_tick());
    info!("Final position: {}, grounded: {}", actor.position, actor.grounded());
    info!("Corner corrections: {}", corrections);

    let hash = sim.state_hash();
    info!("Final State Hash: {}", hex::encode(hash));

    // Verify the recording survives encoding and replays to the same state
    info!("=== Verifying Replay ===");
    let bytes = sim.recording().to_bytes()?;
    let recording = InputRecording::from_bytes(&bytes)?;
    info!(
        "Recording: {} ticks, {} deltas, {} bytes, input hash {}",
        recording.end_tick,
        recording.deltas().len(),
        bytes.len(),
        hex::encode(&recording.hash()[..8])
    );

    let replay_hash = replay(config, demo_level(), spawn, &recording);
    info!("Replay State Hash: {}", hex::encode(replay_hash));

    if hash != replay_hash {
        bail!("Replay diverged from live run");
    }
    info!("REPLAY VERIFIED: Hashes match!");
    Ok(())
}
