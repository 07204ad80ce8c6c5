//! # Particle swarm optimiser module
//!
//! Searches the seven design variables of the tracker and ETC gate for the
//! set giving the highest episode score. This is a position-only swarm: no
//! velocity is carried between iterations, each candidate is simply pulled
//! towards its own best and the swarm's best by random fractions of the
//! learning rates.
//!
//! Each iteration:
//!
//! 1. Every candidate runs one episode and its personal best is updated on a
//!    strict improvement, as is the swarm's global best.
//! 2. Every candidate's variables are moved towards the bests.
//! 3. The scores and the variables that were evaluated are added to the
//!    history.
//!
//! After the last iteration the global best is evaluated once more to give
//! the winning episode.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod candidate;
mod params;
mod swarm;

pub use candidate::Candidate;
pub use params::PsoParams;
pub use swarm::Swarm;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{info, warn};
use ndarray::{Array2, Array3};
use rand::{rngs::StdRng, SeedableRng};
use serde::Serialize;
use std::sync::Arc;

// Internal
use crate::{
    eval::{EpisodeEvaluator, EpisodeResult, EvalParams},
    params::ConfigError,
    traj::Trajectory,
    traj_ctrl::{ControlGains, NUM_DESIGN_VARS}
};
use util::archive::{Archived, Archiver};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Tunes the control gains and ETC threshold over one trajectory.
pub struct ParticleSwarmOptimizer {
    params: PsoParams,
    evaluator: EpisodeEvaluator,
    traj: Arc<Trajectory>,
    swarm: Swarm,
    rng: StdRng,

    last_record: Option<IterationRecord>,
    arch_progress: Archiver
}

/// Summary of one training iteration.
#[derive(Debug, Copy, Clone, Serialize)]
pub struct IterationRecord {
    pub iteration: usize,
    pub best_score: f64,
    pub mean_score: f64,
    pub min_score: f64,
    pub max_score: f64
}

/// The result of training.
#[derive(Debug, Clone, Serialize)]
pub struct TrainOutput {
    /// The winning gains and threshold
    pub gains: ControlGains,

    /// Score of the winning episode
    pub max_score: f64,

    /// The winning episode
    pub result: EpisodeResult,

    /// The variables evaluated, indexed `[iteration, candidate, variable]`
    pub vars_history: Array3<f64>,

    /// The score of each evaluation, indexed `[iteration, candidate]`
    pub scores_history: Array2<f64>,

    /// The global best score at the end of each iteration
    pub best_scores_history: Vec<f64>
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl ParticleSwarmOptimizer {
    /// Create a new optimiser, building the swarm with draws from `rng`.
    pub fn new(
        params: PsoParams,
        eval_params: EvalParams,
        traj: Arc<Trajectory>,
        mut rng: StdRng
    ) -> Result<Self, ConfigError> {
        params.validate()?;
        let evaluator = EpisodeEvaluator::new(eval_params)?;

        let swarm = Swarm::new(&params, &mut rng);

        Ok(Self {
            params,
            evaluator,
            traj,
            swarm,
            rng,
            last_record: None,
            arch_progress: Archiver::default()
        })
    }

    /// Archive a progress record after every iteration.
    pub fn with_archiver(mut self, archiver: Archiver) -> Self {
        self.arch_progress = archiver;
        self
    }

    pub fn swarm(&self) -> &Swarm {
        &self.swarm
    }

    pub fn evaluator(&self) -> &EpisodeEvaluator {
        &self.evaluator
    }

    /// Train for the given number of iterations.
    pub fn train(&mut self, iterations: usize, learning_rates: [f64; 2]) -> TrainOutput {
        let num_bots = self.swarm.candidates().len();

        let mut vars_history = Array3::zeros((iterations, num_bots, NUM_DESIGN_VARS));
        let mut scores_history = Array2::zeros((iterations, num_bots));
        let mut best_scores_history = Vec::with_capacity(iterations);

        for iteration in 0..iterations {
            // Snapshot before the update moves the candidates
            for (c, candidate) in self.swarm.candidates().iter().enumerate() {
                for (v, val) in candidate.vars().iter().enumerate() {
                    vars_history[[iteration, c, v]] = *val;
                }
            }

            let scores = self.swarm.evaluate_all(
                &self.evaluator, 
                &self.traj, 
                self.params.parallel
            );
            self.swarm.update_vars(learning_rates, &mut self.rng);

            for (c, score) in scores.iter().enumerate() {
                scores_history[[iteration, c]] = *score;
            }
            best_scores_history.push(self.swarm.global_best_score());

            let record = IterationRecord::new(
                iteration, 
                self.swarm.global_best_score(), 
                &scores
            );

            info!(
                "Iteration {}/{}: best {:.3}, mean {:.3}, range [{:.3}, {:.3}]",
                iteration + 1, iterations, 
                record.best_score, record.mean_score, 
                record.min_score, record.max_score
            );

            self.last_record = Some(record);
            if self.arch_progress.is_active() {
                if let Err(e) = self.write() {
                    warn!("Could not archive training progress: {}", e);
                }
            }
        }

        // Re-run the winner to get its full episode
        let gains = ControlGains::from_vars(self.swarm.global_best());
        let result = self.evaluator.run(&self.traj, &gains);

        TrainOutput {
            gains,
            max_score: result.score,
            result,
            vars_history,
            scores_history,
            best_scores_history
        }
    }
}

impl Archived for ParticleSwarmOptimizer {
    fn write(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        if let Some(record) = self.last_record {
            self.arch_progress.serialise(record)?;
        }

        Ok(())
    }
}

impl IterationRecord {
    fn new(iteration: usize, best_score: f64, scores: &[f64]) -> Self {
        let (min_score, max_score) = scores.iter().fold(
            (std::f64::INFINITY, std::f64::NEG_INFINITY), 
            |(lo, hi), &s| (lo.min(s), hi.max(s))
        );

        Self {
            iteration,
            best_score,
            mean_score: scores.iter().sum::<f64>() / scores.len() as f64,
            min_score,
            max_score
        }
    }
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Build the optimiser's random number generator, from the seed if one is
/// given or from system entropy if not.
pub fn new_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_entropy()
    }
}
