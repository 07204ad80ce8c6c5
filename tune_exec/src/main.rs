//! Tuning executable entry point.
//!
//! # Architecture
//!
//! A single run consists of:
//!
//!     - Initialise the session and logging
//!     - Load the tuning parameters
//!     - Load or generate the reference trajectory
//!     - Evaluate the initial guess as a baseline
//!     - Train the swarm
//!     - Re-run the winning gains with a full trace
//!     - Save the results into the session directory

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{Report, eyre::{WrapErr, eyre}};
use log::{debug, info};
use std::path::PathBuf;
use std::sync::Arc;
use structopt::StructOpt;

// Internal
use tune_lib::{
    eval::EpisodeEvaluator,
    params::TuneParams,
    pso::{self, ParticleSwarmOptimizer},
    traj::{self, Trajectory},
    traj_ctrl::ControlGains
};
use util::{
    archive::Archiver,
    host,
    logger::{logger_init, LevelFilter},
    session::Session
};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Tuning parameter file under the software root's `params` directory.
const PARAMS_FILE: &str = "tune.toml";

/// Modules whose per-tick output is capped at debug level in the log.
const NOISY_TARGETS: [&str; 3] = [
    "tune_lib::eval",
    "tune_lib::kin_model",
    "tune_lib::traj_ctrl"
];

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Tune PID gains and an event-triggered control threshold for a waypoint
/// following bot.
#[derive(Debug, StructOpt)]
#[structopt(name = "tune_exec")]
struct Opt {
    /// Path to the tuning parameter file. Defaults to `params/tune.toml`
    /// under the software root.
    #[structopt(long, parse(from_os_str))]
    params: Option<PathBuf>,

    /// Path to a CSV trajectory with an `x,y` header. If not given a
    /// trajectory is generated.
    #[structopt(long, parse(from_os_str))]
    path: Option<PathBuf>,

    /// Seed for the random number generator, overriding the parameter file.
    #[structopt(long)]
    seed: Option<u64>,

    /// Evaluate the swarm in parallel.
    #[structopt(long)]
    parallel: bool,

    /// Minimum log level, one of `info`, `debug` or `trace`. Per-tick
    /// simulation output is never logged below `debug`.
    #[structopt(long, default_value = "info")]
    log_level: LevelFilter
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {
    color_eyre::install()?;

    let opt = Opt::from_args();

    // ---- EARLY INITIALISATION ----

    let session = Session::new(
        "tune_exec",
        "sessions"
    ).wrap_err("Failed to create the session")?;

    logger_init(opt.log_level, &NOISY_TARGETS, &session)
        .wrap_err("Failed to initialise logging")?;

    info!("ETC PID Tuning Executable\n");
    info!("Session directory: {:?}\n", session.session_root);
    debug!("CLI options: {:?}", opt);

    // ---- LOAD PARAMETERS ----

    let params_path = opt.params
        .clone()
        .unwrap_or_else(|| host::get_sw_root().join("params").join(PARAMS_FILE));

    let mut params: TuneParams = match opt.params {
        Some(ref p) => util::params::load_file::<TuneParams, _>(p),
        None => util::params::load::<TuneParams>(PARAMS_FILE)
    }
    .wrap_err_with(|| format!("Could not load tuning params from {:?}", params_path))?;

    if opt.seed.is_some() {
        params.pso.seed = opt.seed;
    }
    if opt.parallel {
        params.pso.parallel = true;
    }

    params.validate().wrap_err("Invalid tuning parameters")?;

    info!("Parameters loaded from {:?}", params_path);

    let mut rng = pso::new_rng(params.pso.seed);

    // ---- TRAJECTORY ----

    let traj = match opt.path {
        Some(ref p) => {
            info!("Loading trajectory from {:?}", p);
            Trajectory::load_csv(p)
                .wrap_err_with(|| format!("Could not load the trajectory from {:?}", p))?
        },
        None => {
            let gen_params = if params.gen.random {
                params.gen.randomised(&mut rng)
            }
            else {
                params.gen.clone()
            };

            info!(
                "Generating trajectory (octaves: {}, seeds: {:?})", 
                gen_params.octaves, gen_params.seeds
            );
            traj::gen::generate(&gen_params)
                .wrap_err("Could not generate a trajectory")?
        }
    };

    info!(
        "Trajectory has {} points, length {:.3}", 
        traj.get_num_points(), traj.get_length()
    );

    let traj = Arc::new(traj);

    // ---- BASELINE ----

    let evaluator = EpisodeEvaluator::new(params.eval.clone())
        .wrap_err("Could not create the episode evaluator")?;

    let init_gains = ControlGains::from_vars(&params.pso.init_guess_vars());
    let baseline = evaluator.run(&traj, &init_gains);

    info!(
        "Initial guess: score {:.3} ({:?} after {} ticks, ETC saving {:.1} %)",
        baseline.score, baseline.end_reason, baseline.num_ticks, 
        baseline.etc_saving_pct()
    );

    // ---- TRAINING ----

    let archiver = Archiver::from_path(&session, "pso_progress.csv")
        .map_err(|e| eyre!("Could not create the progress archive: {}", e))?;

    let mut optimiser = ParticleSwarmOptimizer::new(
        params.pso.clone(), 
        params.eval.clone(), 
        traj.clone(), 
        rng
    )
    .wrap_err("Could not create the optimiser")?
    .with_archiver(archiver);

    info!(
        "Training {} candidates for {} iterations", 
        params.pso.num_bots, params.pso.num_steps
    );

    let output = optimiser.train(params.pso.num_steps, params.pso.learning_rates);

    info!(
        "Trained gains:\n    P: {:?}\n    I: {:?}\n    D: {:?}\n    threshold: {:.3}",
        output.gains.k_p.as_slice(), 
        output.gains.k_i.as_slice(), 
        output.gains.k_d.as_slice(), 
        output.gains.threshold
    );
    info!(
        "Trained score {:.3} ({:?} after {} ticks, {} updates sent, ETC saving {:.1} %)",
        output.max_score, output.result.end_reason, output.result.num_ticks,
        output.result.num_accepted, output.result.etc_saving_pct()
    );

    // ---- FINAL EPISODE ----

    let (final_result, final_trace) = evaluator.run_traced(&traj, &output.gains);

    write_paths(&session, &traj, &final_result.flown_path)?;

    session.save("final_episode.json", (final_result, final_trace));
    session.save("train_output.json", output);

    info!("Results saved");

    session.exit();

    Ok(())
}

/// Write the reference and flown paths as CSV into the session directory.
fn write_paths(
    session: &Session, 
    traj: &Trajectory, 
    flown_path: &[nalgebra::Vector2<f64>]
) -> Result<(), Report> {
    let traj_path = session.session_root.join("trajectory.csv");
    traj.write_csv(&traj_path)
        .wrap_err("Could not write the trajectory")?;

    let flown_path_path = session.session_root.join("flown_path.csv");
    traj::write_points_csv(flown_path, &flown_path_path)
        .wrap_err("Could not write the flown path")?;

    Ok(())
}
