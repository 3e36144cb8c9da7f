//! Command-line driver for the online planners.
//!
//! Runs MCTS or RTDP on the Russell & Norvig grid world and reports episode
//! returns. MCTS episodes run in parallel, each with its own seeded random
//! source; RTDP trains sequentially and then prints its value function and
//! greedy policy.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::info;
use planner_core::envs::{Cell, GridWorld};
use planner_core::{LinearDecay, Mdp};
use planner_mcts::{Mcts, MctsConfig};
use planner_rtdp::{EpisodeSummary, Rtdp, RtdpConfig};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Online MDP planning on a stochastic grid world.
#[derive(Parser)]
#[command(name = "mdp-plan")]
#[command(about = "Run MCTS or RTDP on the 4x3 grid world")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Act with MCTS, replanning from scratch at every step.
    Mcts {
        /// Number of episodes to play.
        #[arg(short, long, default_value = "10")]
        episodes: usize,

        /// Rollouts per search (overrides the config file).
        #[arg(short, long)]
        rollouts: Option<usize>,

        /// Step cap per episode.
        #[arg(long, default_value = "100")]
        max_steps: usize,

        /// Probability of slipping sideways.
        #[arg(long, default_value = "0.2")]
        slip: f64,

        /// Base random seed; episode i uses seed + i.
        #[arg(long, default_value = "0")]
        seed: u64,

        /// JSON file with MCTS parameters.
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Print results as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Train RTDP, then print the learned values and greedy policy.
    Rtdp {
        /// Training episodes (overrides the config file).
        #[arg(short, long)]
        episodes: Option<usize>,

        /// Initial exploration rate.
        #[arg(long)]
        epsilon_start: Option<f64>,

        /// Final exploration rate.
        #[arg(long, default_value = "0.0")]
        epsilon_end: f64,

        /// Episodes over which epsilon decays.
        #[arg(long, default_value = "50")]
        epsilon_steps: usize,

        /// Probability of slipping sideways.
        #[arg(long, default_value = "0.2")]
        slip: f64,

        /// Random seed for reproducibility.
        #[arg(long, default_value = "0")]
        seed: u64,

        /// JSON file with RTDP parameters.
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Print results as JSON.
        #[arg(long)]
        json: bool,
    },
}

/// Outcome of one MCTS-driven episode.
#[derive(Serialize, Debug, Clone, PartialEq)]
struct MctsEpisode {
    seed: u64,
    steps: usize,
    total_reward: f64,
    final_cell: (usize, usize),
    reached_terminal: bool,
}

/// Learned RTDP state for JSON output.
#[derive(Serialize, Debug)]
struct RtdpReport {
    episodes: Vec<EpisodeSummary>,
    /// Table size when training finished, before the policy was read out.
    states_valued: usize,
    values: Vec<CellValue>,
}

#[derive(Serialize, Debug)]
struct CellValue {
    row: usize,
    col: usize,
    value: f64,
    action: Option<char>,
}

/// Load a JSON config file, or fall back to defaults.
fn load_config<T: DeserializeOwned + Default>(path: Option<&Path>) -> Result<T> {
    let Some(path) = path else {
        return Ok(T::default());
    };
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;
    serde_json::from_str(&text)
        .with_context(|| format!("Failed to parse config file: {:?}", path))
}

/// Play one episode, calling MCTS for every move.
fn play_episode(
    world: &GridWorld,
    config: &MctsConfig,
    seed: u64,
    max_steps: usize,
) -> Result<MctsEpisode> {
    let mut mcts = Mcts::with_rng(world, config.clone(), ChaCha8Rng::seed_from_u64(seed));
    let mut env_rng = ChaCha8Rng::seed_from_u64(seed.wrapping_add(1));

    let mut state = world.initial_state();
    let mut steps = 0;
    let mut total_reward = 0.0;

    while !world.is_terminal(&state) && steps < max_steps {
        let action = mcts
            .search(&state)
            .with_context(|| format!("Search failed at {state}"))?;
        let (next, reward) = world.sample(&state, &action, &mut env_rng)?;
        total_reward += reward;
        state = next;
        steps += 1;
    }

    Ok(MctsEpisode {
        seed,
        steps,
        total_reward,
        final_cell: (state.row, state.col),
        reached_terminal: world.is_terminal(&state),
    })
}

/// Run the mcts command.
fn cmd_mcts(
    episodes: usize,
    rollouts: Option<usize>,
    max_steps: usize,
    slip: f64,
    seed: u64,
    config: Option<PathBuf>,
    json: bool,
) -> Result<()> {
    let mut mcts_config: MctsConfig = load_config(config.as_deref())?;
    if let Some(rollouts) = rollouts {
        mcts_config.rollouts = rollouts;
    }
    mcts_config.validate().context("Invalid MCTS configuration")?;

    let world = GridWorld::classic().with_slip(slip);
    info!(
        "Playing {} episodes with {} rollouts/step (seed {})",
        episodes, mcts_config.rollouts, seed
    );

    let start = Instant::now();
    let results: Vec<MctsEpisode> = (0..episodes)
        .into_par_iter()
        .map(|i| {
            let episode_seed = seed.wrapping_add(i as u64);
            play_episode(&world, &mcts_config, episode_seed, max_steps)
        })
        .collect::<Result<_>>()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&results)?);
        return Ok(());
    }

    for (i, r) in results.iter().enumerate() {
        println!(
            "Episode {}: steps={}, total_reward={:.2}, final={:?}",
            i + 1,
            r.steps,
            r.total_reward,
            r.final_cell
        );
    }

    let mean = results.iter().map(|r| r.total_reward).sum::<f64>() / episodes.max(1) as f64;
    let finished = results.iter().filter(|r| r.reached_terminal).count();
    println!("\nCompleted in {:.2}s", start.elapsed().as_secs_f64());
    println!("Mean return: {:.3}", mean);
    println!("Episodes reaching a terminal: {}/{}", finished, episodes);
    Ok(())
}

/// Value and greedy move for every open cell.
///
/// Reading the policy seeds table entries for cells training never reached.
fn policy_table<R: Rng>(
    rtdp: &mut Rtdp<&GridWorld, R>,
    world: &GridWorld,
) -> Result<Vec<CellValue>> {
    let mut out = Vec::new();
    for cell in world.cells() {
        let action = if world.is_terminal(&cell) {
            None
        } else {
            Some(rtdp.greedy_action(&cell)?.arrow())
        };
        out.push(CellValue {
            row: cell.row,
            col: cell.col,
            value: rtdp.value(&cell),
            action,
        });
    }
    Ok(out)
}

/// Train, then read out values and the greedy policy.
fn train_rtdp<R: Rng>(rtdp: &mut Rtdp<&GridWorld, R>, world: &GridWorld) -> Result<RtdpReport> {
    let episodes = rtdp.run().context("RTDP training failed")?;
    let states_valued = rtdp.values().len();
    let values = policy_table(rtdp, world)?;
    Ok(RtdpReport {
        episodes,
        states_valued,
        values,
    })
}

/// Run the rtdp command.
fn cmd_rtdp(
    episodes: Option<usize>,
    epsilon_start: Option<f64>,
    epsilon_end: f64,
    epsilon_steps: usize,
    slip: f64,
    seed: u64,
    config: Option<PathBuf>,
    json: bool,
) -> Result<()> {
    let mut rtdp_config: RtdpConfig = load_config(config.as_deref())?;
    if let Some(episodes) = episodes {
        rtdp_config.episodes = episodes;
    }
    if let Some(start) = epsilon_start {
        let schedule = LinearDecay::new(start, epsilon_end, epsilon_steps);
        rtdp_config = rtdp_config.with_epsilon_schedule(schedule);
    }
    rtdp_config.validate().context("Invalid RTDP configuration")?;

    let world = GridWorld::classic().with_slip(slip);
    let mut rtdp = Rtdp::with_rng(&world, rtdp_config, ChaCha8Rng::seed_from_u64(seed));

    let start = Instant::now();
    let report = train_rtdp(&mut rtdp, &world)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let lookup = |cell: Cell| {
        report
            .values
            .iter()
            .find(|v| v.row == cell.row && v.col == cell.col)
    };

    println!(
        "Trained {} episodes in {:.2}s",
        report.episodes.len(),
        start.elapsed().as_secs_f64()
    );
    println!("States valued: {}", report.states_valued);
    println!("\nValues:");
    print!(
        "{}",
        world.render(|cell| match lookup(cell) {
            Some(v) => format!("{:.3}", v.value),
            None => String::new(),
        })
    );
    println!("\nGreedy policy:");
    print!(
        "{}",
        world.render(|cell| {
            match (lookup(cell).and_then(|v| v.action), world.terminal_reward(cell)) {
                (Some(arrow), _) => arrow.to_string(),
                (None, Some(r)) => format!("{r:+}"),
                (None, None) => String::new(),
            }
        })
    );
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Mcts {
            episodes,
            rollouts,
            max_steps,
            slip,
            seed,
            config,
            json,
        } => cmd_mcts(episodes, rollouts, max_steps, slip, seed, config, json),

        Commands::Rtdp {
            episodes,
            epsilon_start,
            epsilon_end,
            epsilon_steps,
            slip,
            seed,
            config,
            json,
        } => cmd_rtdp(
            episodes,
            epsilon_start,
            epsilon_end,
            epsilon_steps,
            slip,
            seed,
            config,
            json,
        ),
    }
}
