//! The swarm of candidates and its global best

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::debug;
use rand::Rng;
use rayon::prelude::*;

// Internal
use super::{Candidate, PsoParams};
use crate::{
    eval::EpisodeEvaluator,
    traj::Trajectory,
    traj_ctrl::DesignVars
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The population of candidates.
///
/// The swarm is the only owner of the global best, and applies every update
/// to it itself.
#[derive(Debug, Clone)]
pub struct Swarm {
    candidates: Vec<Candidate>,
    global_best: DesignVars,
    global_best_score: f64
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Swarm {
    /// Create a new swarm of `num_bots` candidates jittered about the initial
    /// guess. The global best starts at the initial guess with a score of
    /// zero.
    pub fn new<R: Rng + ?Sized>(params: &PsoParams, rng: &mut R) -> Self {
        let init_guess = params.init_guess_vars();
        let range_var = params.range_var_vars();

        let candidates = (0..params.num_bots)
            .map(|_| Candidate::new_jittered(&init_guess, &range_var, rng))
            .collect();

        Self {
            candidates,
            global_best: init_guess,
            global_best_score: 0.0
        }
    }

    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    pub fn global_best(&self) -> &DesignVars {
        &self.global_best
    }

    pub fn global_best_score(&self) -> f64 {
        self.global_best_score
    }

    /// Evaluate every candidate and update the personal and global bests.
    ///
    /// If `parallel` is set the episodes are run on the rayon thread pool.
    /// The bests are always updated afterwards in candidate order, so both
    /// paths give the same result. Returns the score of each candidate.
    pub fn evaluate_all(
        &mut self,
        evaluator: &EpisodeEvaluator,
        traj: &Trajectory,
        parallel: bool
    ) -> Vec<f64> {
        let scores: Vec<f64> = if parallel {
            self.candidates
                .par_iter()
                .map(|c| c.evaluate(evaluator, traj).score)
                .collect()
        }
        else {
            self.candidates
                .iter()
                .map(|c| c.evaluate(evaluator, traj).score)
                .collect()
        };

        for (i, (candidate, &score)) in self.candidates
            .iter_mut()
            .zip(scores.iter())
            .enumerate() 
        {
            candidate.record_score(score);

            if score > self.global_best_score {
                debug!(
                    "New global best from candidate {}: {:.3} (was {:.3})", 
                    i, score, self.global_best_score
                );
                self.global_best = *candidate.vars();
                self.global_best_score = score;
            }
        }

        scores
    }

    /// Move every candidate towards its personal best and the global best,
    /// drawing `r1` then `r2` for each candidate in order.
    pub fn update_vars<R: Rng + ?Sized>(&mut self, learning_rates: [f64; 2], rng: &mut R) {
        let global_best = self.global_best;

        for candidate in self.candidates.iter_mut() {
            let r1: f64 = rng.gen();
            let r2: f64 = rng.gen();

            candidate.step_towards(&global_best, learning_rates, r1, r2);
        }
    }
}
