use std::path::{Path, PathBuf};
use std::sync::mpsc;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use glam::Vec3;
use physworld_backend::{
    BackendSettings, Body, DefaultMotionState, DistanceConstraint, ReferenceBackend, Shape,
};
use physworld_common::{BodyId, Transform};
use physworld_kernel::{ChannelSignalBus, RunState, SimulationConfig, SimulationWorld, SubstepPlan};
use physworld_render::{DebugTextRenderer, RenderView, Renderer};
use physworld_tools::WorldInspector;
use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "physworld-cli", about = "Fixed-step physics simulation driver")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and default configuration
    Info,
    /// Show how a frame delta is split into substeps
    Plan {
        /// Frame delta in seconds
        #[arg(long, default_value = "0.016666668")]
        dt: f32,
        /// Internal simulation frequency
        #[arg(long, default_value = "60")]
        hz: f32,
        /// Substep cap; 0 means uncapped, negative means one variable step
        #[arg(long, default_value = "0", allow_negative_numbers = true)]
        max_sub_steps: i32,
    },
    /// Drop spheres onto a ground plane and report where they end up
    Run {
        #[command(flatten)]
        scene: SceneArgs,
        /// Number of frames to simulate
        #[arg(short, long, default_value = "120")]
        frames: u32,
        /// Environment run state while stepping
        #[arg(long, value_enum, default_value = "running")]
        mode: Mode,
    },
    /// Step a scene, reset it, and show the world before and after
    Reset {
        #[command(flatten)]
        scene: SceneArgs,
        /// Frames to simulate before resetting
        #[arg(short, long, default_value = "30")]
        frames: u32,
    },
}

#[derive(clap::Args)]
struct SceneArgs {
    /// JSON file with `simulation` and `backend` sections
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Frame delta in seconds
    #[arg(long, default_value = "0.016666668")]
    dt: f32,
    /// Number of spheres in the scene
    #[arg(short, long, default_value = "3")]
    bodies: usize,
    /// Override the internal simulation frequency
    #[arg(long)]
    hz: Option<f32>,
    /// Override the substep cap
    #[arg(long, allow_negative_numbers = true)]
    max_sub_steps: Option<i32>,
    /// Link consecutive spheres with distance constraints
    #[arg(long)]
    chain: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum Mode {
    Running,
    Stopped,
}

impl From<Mode> for RunState {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Running => RunState::Running,
            Mode::Stopped => RunState::Stopped,
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct FileConfig {
    simulation: SimulationConfig,
    backend: BackendSettings,
}

fn load_config(path: Option<&Path>) -> anyhow::Result<FileConfig> {
    let Some(path) = path else {
        return Ok(FileConfig::default());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing config {}", path.display()))
}

fn build_scene(
    scene: &SceneArgs,
) -> anyhow::Result<(SimulationWorld<ReferenceBackend>, Vec<BodyId>, mpsc::Receiver<physworld_kernel::Signal>)> {
    let mut file = load_config(scene.config.as_deref())?;
    if let Some(hz) = scene.hz {
        file.simulation.internal_frequency_hz = hz;
    }
    if let Some(max_sub_steps) = scene.max_sub_steps {
        file.simulation.max_sub_steps = max_sub_steps;
    }

    let (tx, rx) = mpsc::channel();
    let mut sim = SimulationWorld::new(ReferenceBackend::new(file.backend), file.simulation)
        .with_signal_bus(ChannelSignalBus(tx));
    sim.initialize().context("initializing simulation")?;

    let world = sim
        .world_mut()
        .context("simulation world missing after initialize")?;
    world.add_rigid_body(Body::new_static(Shape::plane(Vec3::Y, 0.0), Transform::default()))?;

    let mut spheres = Vec::with_capacity(scene.bodies);
    for i in 0..scene.bodies {
        let position = Vec3::new(i as f32 * 1.5, 2.0 + i as f32, 0.0);
        let start = Transform::from_position(position);
        let id = world.add_rigid_body(
            Body::new_rigid(Shape::sphere(0.5), 1.0, start)
                .with_motion_state(Box::new(DefaultMotionState::new(start))),
        )?;
        spheres.push(id);
    }
    if scene.chain {
        for pair in spheres.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            let rest = world
                .body(a)
                .zip(world.body(b))
                .map_or(1.0, |(a, b)| a.position().distance(b.position()));
            world.add_constraint(DistanceConstraint::new(a, b, rest))?;
        }
    }

    tracing::info!(spheres = spheres.len(), chain = scene.chain, "scene built");
    Ok((sim, spheres, rx))
}

fn print_bodies(sim: &SimulationWorld<ReferenceBackend>, ids: &[BodyId]) {
    let Some(world) = sim.world() else {
        return;
    };
    for &id in ids {
        if let Some(info) = WorldInspector::inspect_body(world, id) {
            println!("  {info}");
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match cli.command {
        Commands::Info => {
            println!("physworld-cli v{}", env!("CARGO_PKG_VERSION"));
            let defaults = FileConfig::default();
            println!("{}", serde_json::to_string_pretty(&defaults)?);
        }
        Commands::Plan {
            dt,
            hz,
            max_sub_steps,
        } => {
            let config = SimulationConfig {
                internal_frequency_hz: hz,
                max_sub_steps,
                ..Default::default()
            };
            config.validate()?;
            let plan = SubstepPlan::compute(dt, hz, max_sub_steps);
            println!(
                "time_step={} max_sub_steps={} fixed_time_step={}",
                plan.time_step, plan.max_sub_steps, plan.fixed_time_step
            );
            println!(
                "budget={:.6}s falls_behind={}",
                plan.budgeted_time(),
                plan.falls_behind()
            );
        }
        Commands::Run {
            scene,
            frames,
            mode,
        } => {
            let (mut sim, spheres, signals) = build_scene(&scene)?;
            let env = RunState::from(mode);
            let mut substeps = 0u64;
            for _ in 0..frames {
                substeps += u64::from(sim.step(scene.dt, &env));
            }
            println!("{}", WorldInspector::summary(&sim));
            println!(
                "frames={frames} substeps={substeps} signals={}",
                signals.try_iter().count()
            );
            print_bodies(&sim, &spheres);

            if let Some(sink) = sim.debug_draw() {
                if sink.borrow().line_count() > 0 {
                    let text = DebugTextRenderer::new().render(&sink.borrow(), &RenderView::default());
                    print!("{text}");
                }
            }
            sim.teardown();
        }
        Commands::Reset { scene, frames } => {
            let (mut sim, spheres, _signals) = build_scene(&scene)?;
            for _ in 0..frames {
                sim.step(scene.dt, &RunState::Running);
            }
            println!("before: {}", WorldInspector::summary(&sim));
            print_bodies(&sim, &spheres);

            sim.reset();
            println!("after:  {}", WorldInspector::summary(&sim));
        }
    }

    Ok(())
}
