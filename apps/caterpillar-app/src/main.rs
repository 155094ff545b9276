//! Caterpillar crawling robot CLI.
//!
//! - `convert`: rewrite an exported xacro file into a self-contained URDF
//! - `train`: random-search training with periodic checkpoints
//! - `evaluate`: replay the latest trained policy and chart the run
//! - `show`: open-loop gait demonstration with a four-panel analysis chart
//! - `info`: print versions and environment dimensions

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result, ensure};
use clap::{Parser, Subcommand};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use caterpillar_core::components::BaseState;
use caterpillar_core::config::CaterpillarConfig;
use caterpillar_core::traits::Policy;
use caterpillar_env::gait::{GaitMode, OpenLoopWave};
use caterpillar_gym::{Environment, GymEnv};
use caterpillar_policy::{NeutralPolicy, PolicyArtifact, resolve_policy_artifact};
use caterpillar_record::prelude::*;
use caterpillar_sim::{EpisodeStats, SceneBuilder};
use caterpillar_train::RandomSearchTrainer;
use caterpillar_urdf::UrdfError;
use caterpillar_urdf::xacro::convert_file;

const DEFAULT_CONFIG: &str = "configs/caterpillar.toml";

/// Per-step pacing base used by `evaluate --realtime`, in seconds.
const PACING_BASE: f32 = 1.0 / 1240.0;

// ---------------------------------------------------------------------------
// CLI
// ---------------------------------------------------------------------------

/// Caterpillar crawling robot: training, evaluation and gait analysis.
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// TOML configuration file (defaults to configs/caterpillar.toml when present).
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rewrite an exported xacro description into a self-contained URDF.
    Convert {
        /// Source xacro file.
        #[arg(short, long, default_value = "assets/urdf/caterpillar.xacro")]
        input: PathBuf,

        /// File name of the output, written next to the input.
        #[arg(short, long, default_value = "caterpillar.urdf")]
        output: String,
    },

    /// Train a linear policy with random search.
    Train {
        /// Override `training.total_timesteps`.
        #[arg(short, long)]
        total_timesteps: Option<u64>,

        /// Override `training.seed`.
        #[arg(short, long)]
        seed: Option<u64>,
    },

    /// Replay the latest trained policy and write charts.
    Evaluate {
        /// Override `evaluation.steps`.
        #[arg(short = 'n', long)]
        steps: Option<usize>,

        /// Override `evaluation.results_dir`.
        #[arg(short, long)]
        results_dir: Option<PathBuf>,

        /// Sleep between steps so the run can be watched.
        #[arg(long)]
        realtime: bool,
    },

    /// Drive the open-loop wave and write the analysis chart.
    Show {
        /// Override `showcase.steps`.
        #[arg(short = 'n', long)]
        steps: Option<usize>,

        /// Override `showcase.results_dir`.
        #[arg(short, long)]
        results_dir: Option<PathBuf>,
    },

    /// Print crate and environment information.
    Info,
}

// ---------------------------------------------------------------------------
// Setup
// ---------------------------------------------------------------------------

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn load_config(path: Option<&Path>) -> Result<CaterpillarConfig> {
    match path {
        Some(path) => CaterpillarConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display())),
        None if Path::new(DEFAULT_CONFIG).exists() => CaterpillarConfig::from_file(DEFAULT_CONFIG)
            .with_context(|| format!("loading config {DEFAULT_CONFIG}")),
        None => {
            info!("no config file, using defaults");
            Ok(CaterpillarConfig::default())
        }
    }
}

fn build_env(config: &CaterpillarConfig, mode: GaitMode) -> Result<GymEnv> {
    let scene = SceneBuilder::new()
        .with_config(config.clone())
        .with_gait_mode(mode)
        .build()
        .context("building the simulation scene")?;
    Ok(scene.into_env())
}

/// Forward velocity and xy position of the base as last written by a reset or step.
fn base_sample(env: &GymEnv) -> (f32, [f32; 2]) {
    let base = env.app().world().resource::<BaseState>();
    (
        base.linear_velocity.x,
        [base.position.x, base.position.y],
    )
}

/// The open-loop run ignores falls and flips and outlasts the episode
/// limit; only numerical divergence still ends it.
fn showcase_settings(mut config: CaterpillarConfig) -> CaterpillarConfig {
    let steps = u32::try_from(config.showcase.steps).unwrap_or(u32::MAX);
    config.simulation.max_episode_steps = config
        .simulation
        .max_episode_steps
        .max(steps.saturating_add(1));
    config.termination.max_height = f32::INFINITY;
    config.termination.max_tilt = f32::INFINITY;
    config
}

/// Keep only joints the robot actually has.
fn chartable_joints(joints: &[usize], joint_count: usize) -> Vec<usize> {
    let (kept, dropped): (Vec<usize>, Vec<usize>) =
        joints.iter().partition(|&&j| j < joint_count);
    if !dropped.is_empty() {
        warn!(?dropped, joint_count, "skipping chart joints the robot does not have");
    }
    kept
}

fn log_stats(env: &GymEnv) {
    let stats = env.app().world().resource::<EpisodeStats>();
    info!(
        episodes = stats.episodes_completed,
        mean_length = stats.mean_episode_length().unwrap_or(0.0),
        mean_return = stats.mean_return().unwrap_or(0.0),
        "episode statistics"
    );
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

fn run_convert(input: &Path, output: &str) -> Result<()> {
    match convert_file(input, output) {
        Ok(path) => {
            info!(path = %path.display(), "conversion finished");
            Ok(())
        }
        Err(UrdfError::SourceNotFound(path)) => {
            error!(path = %path.display(), "nothing to convert: source file not found");
            Ok(())
        }
        Err(e) => Err(e).context("xacro conversion failed"),
    }
}

fn run_train(mut config: CaterpillarConfig, total: Option<u64>, seed: Option<u64>) -> Result<()> {
    if let Some(total) = total {
        config.training.total_timesteps = total;
    }
    if let Some(seed) = seed {
        config.training.seed = seed;
    }
    let env = build_env(&config, GaitMode::Residual)?;
    let mut trainer = RandomSearchTrainer::new(env, config.training.clone())?;
    let summary = trainer.train()?;
    info!(
        iterations = summary.iterations,
        timesteps = summary.timesteps,
        best_return = summary.best_return,
        checkpoints = summary.checkpoints.len(),
        path = %summary.final_model.display(),
        "training finished"
    );
    Ok(())
}

fn run_evaluate(
    mut config: CaterpillarConfig,
    steps: Option<usize>,
    results_dir: Option<PathBuf>,
    realtime: bool,
) -> Result<()> {
    if let Some(steps) = steps {
        config.evaluation.steps = steps;
    }
    if let Some(dir) = results_dir {
        config.evaluation.results_dir = dir;
    }
    let evaluation = &config.evaluation;

    let path = resolve_policy_artifact(&config.training)?;
    let artifact = PolicyArtifact::load(&path)
        .with_context(|| format!("loading policy {}", path.display()))?;
    info!(path = %path.display(), timesteps = artifact.timesteps, "evaluating policy");

    let mut env = build_env(&config, GaitMode::Residual)?;
    let joints = env.action_space().size();
    ensure!(
        artifact.policy.obs_dim() == env.observation_space().size()
            && artifact.policy.act_dim() == joints,
        "policy expects {}→{} but the environment is {}→{}",
        artifact.policy.obs_dim(),
        artifact.policy.act_dim(),
        env.observation_space().size(),
        joints,
    );

    #[allow(clippy::cast_possible_truncation)]
    let dt = config.simulation.control_dt as f32;
    let pause = Duration::from_secs_f32(PACING_BASE * evaluation.slow_motion_factor.max(0.0));
    if realtime {
        info!(pause_ms = pause.as_millis(), "real-time pacing enabled");
    }

    let mut log = TrajectoryLog::new(joints, evaluation.steps, dt);
    let mut obs = env.reset(Some(config.simulation.seed))?.observation;
    for step in 0..evaluation.steps {
        let action = artifact.policy.get_action(&obs);
        let result = env.step(&action)?;
        let (velocity, position) = base_sample(&env);
        log.record(action.as_slice(), velocity, position);

        if realtime {
            std::thread::sleep(pause);
        }
        obs = if result.is_done() {
            info!(
                step = step + 1,
                terminated = result.terminated,
                "episode ended, respawning"
            );
            log.mark_discontinuity();
            env.reset(None)?.observation
        } else {
            result.observation
        };
    }
    log_stats(&env);
    env.close();

    let dir = &evaluation.results_dir;
    let phase_joints = chartable_joints(&evaluation.phase_joints, joints);
    render_heatmap(&log, &dir.join("Fig1_Heatmap.png"))?;
    render_phase_lag(&log, &phase_joints, log.len().min(1000), &dir.join("Fig2_PhaseShift.png"))?;
    render_displacement(&log, &dir.join("Fig3_Displacement.png"))?;
    log.save_json(&dir.join("trajectory.json"))?;
    info!(dir = %dir.display(), "evaluation charts written");
    Ok(())
}

fn run_show(
    mut config: CaterpillarConfig,
    steps: Option<usize>,
    results_dir: Option<PathBuf>,
) -> Result<()> {
    if let Some(steps) = steps {
        config.showcase.steps = steps;
    }
    if let Some(dir) = results_dir {
        config.showcase.results_dir = dir;
    }
    let config = showcase_settings(config);
    let showcase = &config.showcase;

    #[allow(clippy::cast_possible_truncation)]
    let control_hz = (1.0 / config.simulation.control_dt) as f32;
    let wave = OpenLoopWave::from_config(showcase, control_hz);
    let mut env = build_env(&config, GaitMode::OpenLoop(wave))?;
    let joints = env.action_space().size();
    info!(
        steps = showcase.steps,
        frequency = wave.frequency,
        amplitude = wave.amplitude,
        max_velocity = wave.max_velocity,
        "open-loop showcase started"
    );

    #[allow(clippy::cast_possible_truncation)]
    let dt = config.simulation.control_dt as f32;
    let mut log = TrajectoryLog::new(joints, showcase.steps, dt);
    let idle = NeutralPolicy::new(joints, config.gait.neutral_action);
    let mut obs = env.reset(Some(config.simulation.seed))?.observation;
    for _ in 0..showcase.steps {
        // Sample the command about to be sent and the state it acts on.
        let elapsed = env.episode().step_count;
        let intensity: Vec<f32> = (0..joints).map(|j| wave.intensity(elapsed, j)).collect();
        let (velocity, position) = base_sample(&env);
        log.record(&intensity, velocity, position);

        let result = env.step(&idle.get_action(&obs))?;
        obs = if result.is_done() {
            warn!(step = elapsed + 1, "showcase diverged, respawning");
            log.mark_discontinuity();
            env.reset(None)?.observation
        } else {
            result.observation
        };
    }
    log_stats(&env);
    env.close();

    let [zoom_start, zoom_end] = showcase.zoom_window;
    let phase_joints = chartable_joints(&showcase.phase_joints, joints);
    let path = showcase.results_dir.join("Showcase_Analysis.png");
    render_showcase(&log, zoom_start..zoom_end, &phase_joints, &path)?;
    info!(
        mean_velocity = log.mean_velocity(),
        path = %path.display(),
        "showcase chart written"
    );
    Ok(())
}

fn run_info(config: &CaterpillarConfig) -> Result<()> {
    let scene = SceneBuilder::new()
        .with_config(config.clone())
        .build()
        .context("building the simulation scene")?;
    let version = env!("CARGO_PKG_VERSION");

    println!("caterpillar v{version}");
    println!();
    println!("crates:");
    for name in [
        "caterpillar-core",
        "caterpillar-urdf",
        "caterpillar-physics",
        "caterpillar-env",
        "caterpillar-gym",
        "caterpillar-sim",
        "caterpillar-policy",
        "caterpillar-train",
        "caterpillar-record",
    ] {
        println!("  {name:<20} {version}");
    }
    println!();
    println!("robot:          {}", scene.model.name);
    println!("joints:         {}", scene.joint_count());
    println!("observation:    {}", scene.observation_dim());
    println!("action:         {}", scene.joint_count());
    println!("max steps:      {}", config.simulation.max_episode_steps);
    Ok(())
}

// ---------------------------------------------------------------------------
// main
// ---------------------------------------------------------------------------

fn run(cli: Cli) -> Result<()> {
    let config = load_config(cli.config.as_deref())?;
    match cli.command {
        Commands::Convert { input, output } => run_convert(&input, &output),
        Commands::Train {
            total_timesteps,
            seed,
        } => run_train(config, total_timesteps, seed),
        Commands::Evaluate {
            steps,
            results_dir,
            realtime,
        } => run_evaluate(config, steps, results_dir, realtime),
        Commands::Show { steps, results_dir } => run_show(config, steps, results_dir),
        Commands::Info => run_info(&config),
    }
}

fn main() -> ExitCode {
    init_tracing();
    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
