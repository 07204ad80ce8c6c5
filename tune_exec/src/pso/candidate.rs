//! A single member of the swarm

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use rand::Rng;

// Internal
use crate::{
    eval::{EpisodeEvaluator, EpisodeResult},
    traj::Trajectory,
    traj_ctrl::{ControlGains, DesignVars}
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// One candidate set of design variables along with the best it has seen.
#[derive(Debug, Clone)]
pub struct Candidate {
    vars: DesignVars,
    personal_best: DesignVars,
    personal_best_score: f64
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Candidate {
    /// Create a candidate from the given variables. The personal best starts
    /// at these variables with a score of zero.
    pub fn from_vars(vars: DesignVars) -> Self {
        Self {
            vars,
            personal_best: vars,
            personal_best_score: 0.0
        }
    }

    /// Create a candidate uniformly jittered about `init_guess`, each element
    /// lying within half of its `range_var` entry of the guess.
    pub fn new_jittered<R: Rng + ?Sized>(
        init_guess: &DesignVars, 
        range_var: &DesignVars, 
        rng: &mut R
    ) -> Self {
        let mut vars = *init_guess;
        for i in 0..vars.len() {
            vars[i] += (rng.gen::<f64>() - 0.5) * range_var[i];
        }

        Self::from_vars(vars)
    }

    pub fn vars(&self) -> &DesignVars {
        &self.vars
    }

    pub fn personal_best(&self) -> &DesignVars {
        &self.personal_best
    }

    pub fn personal_best_score(&self) -> f64 {
        self.personal_best_score
    }

    /// The gains encoded by the current variables.
    pub fn gains(&self) -> ControlGains {
        ControlGains::from_vars(&self.vars)
    }

    /// Run an episode with the current variables.
    pub fn evaluate(
        &self, 
        evaluator: &EpisodeEvaluator, 
        traj: &Trajectory
    ) -> EpisodeResult {
        evaluator.run(traj, &self.gains())
    }

    /// Record the score of the current variables, updating the personal best
    /// on strict improvement. Returns true if the personal best changed.
    pub fn record_score(&mut self, score: f64) -> bool {
        if score > self.personal_best_score {
            self.personal_best = self.vars;
            self.personal_best_score = score;
            true
        }
        else {
            false
        }
    }

    /// Move the variables towards the personal and global bests:
    ///
    /// `vars += r1 lr1 (personal_best - vars) + r2 lr2 (global_best - vars)`
    pub fn step_towards(
        &mut self, 
        global_best: &DesignVars, 
        learning_rates: [f64; 2],
        r1: f64,
        r2: f64
    ) {
        let cognitive = (self.personal_best - self.vars) * (r1 * learning_rates[0]);
        let social = (global_best - self.vars) * (r2 * learning_rates[1]);

        self.vars += cognitive + social;
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn test_jitter_within_range() {
        let init = DesignVars::from_column_slice(&[10.0, -50.0, 1.0, 10.0, 1.0, 25.0, 300.0]);
        let range = DesignVars::from_column_slice(&[50.0, 50.0, 25.0, 25.0, 25.0, 25.0, 250.0]);
        let mut rng = StdRng::seed_from_u64(3);

        for _ in 0..200 {
            let c = Candidate::new_jittered(&init, &range, &mut rng);
            for i in 0..7 {
                assert!((c.vars()[i] - init[i]).abs() <= 0.5 * range[i]);
            }
            assert_eq!(c.personal_best(), c.vars());
            assert_eq!(c.personal_best_score(), 0.0);
        }

        // Zero range gives the guess exactly
        let c = Candidate::new_jittered(&init, &DesignVars::zeros(), &mut rng);
        assert_eq!(*c.vars(), init);
    }

    #[test]
    fn test_record_score_strict() {
        let mut c = Candidate::from_vars(DesignVars::from_element(1.0));

        assert!(!c.record_score(0.0));
        assert!(!c.record_score(-10.0));
        assert!(c.record_score(5.0));
        assert!(!c.record_score(5.0));
        assert_eq!(c.personal_best_score(), 5.0);
    }

    #[test]
    fn test_step_towards() {
        let mut c = Candidate::from_vars(DesignVars::from_element(1.0));
        c.record_score(1.0);

        // Personal best equals vars so only the social term moves it
        c.step_towards(&DesignVars::from_element(3.0), [0.5, 0.25], 1.0, 1.0);
        assert_eq!(*c.vars(), DesignVars::from_element(1.5));

        // Now both terms act
        c.step_towards(&DesignVars::from_element(3.0), [0.5, 0.25], 0.5, 0.0);
        assert_eq!(*c.vars(), DesignVars::from_element(1.375));

        // Zero draws leave the variables alone
        c.step_towards(&DesignVars::from_element(100.0), [0.5, 0.25], 0.0, 0.0);
        assert_eq!(*c.vars(), DesignVars::from_element(1.375));
    }
}
