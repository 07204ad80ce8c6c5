//! Optimiser parameters

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::{Deserialize, Serialize};

// Internal
use crate::{
    params::ConfigError,
    traj_ctrl::{DesignVars, NUM_DESIGN_VARS}
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for the particle swarm optimiser
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct PsoParams {
    /// Number of candidates in the swarm
    pub num_bots: usize,

    /// Number of training iterations
    pub num_steps: usize,

    /// Cognitive and social learning rates
    pub learning_rates: [f64; 2],

    /// Design variables the swarm is initialised around
    pub init_guess: [f64; NUM_DESIGN_VARS],

    /// Full width of the uniform jitter applied to `init_guess` for each
    /// candidate
    pub range_var: [f64; NUM_DESIGN_VARS],

    /// Seed for the optimiser's random number generator. If not given the
    /// generator is seeded from system entropy.
    pub seed: Option<u64>,

    /// Evaluate candidates in parallel
    pub parallel: bool
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for PsoParams {
    fn default() -> Self {
        Self {
            num_bots: 50,
            num_steps: 50,
            learning_rates: [0.05, 0.1],
            init_guess: [10.0, -50.0, 1.0, 10.0, 1.0, 25.0, 300.0],
            range_var: [50.0, 50.0, 25.0, 25.0, 25.0, 25.0, 250.0],
            seed: None,
            parallel: false
        }
    }
}

impl PsoParams {
    pub fn init_guess_vars(&self) -> DesignVars {
        DesignVars::from_column_slice(&self.init_guess)
    }

    pub fn range_var_vars(&self) -> DesignVars {
        DesignVars::from_column_slice(&self.range_var)
    }

    /// Check the parameters describe a valid swarm.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.num_bots < 1 {
            return Err(ConfigError::TooFewBots(self.num_bots))
        }

        check_finite("init_guess", &self.init_guess)?;
        check_finite("range_var", &self.range_var)?;
        check_finite("learning_rates", &self.learning_rates)?;

        Ok(())
    }
}

fn check_finite(name: &'static str, vals: &[f64]) -> Result<(), ConfigError> {
    match vals.iter().position(|v| !v.is_finite()) {
        Some(i) => Err(ConfigError::NonFiniteVar(name, i)),
        None => Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_validate() {
        assert!(PsoParams::default().validate().is_ok());

        let params = PsoParams { num_bots: 0, ..Default::default() };
        assert!(matches!(params.validate(), Err(ConfigError::TooFewBots(0))));

        let mut params = PsoParams::default();
        params.range_var[4] = std::f64::INFINITY;
        assert!(matches!(
            params.validate(), 
            Err(ConfigError::NonFiniteVar("range_var", 4))
        ));
    }

    #[test]
    fn test_vars() {
        let params = PsoParams::default();
        let init = params.init_guess_vars();

        assert_eq!(init[1], -50.0);
        assert_eq!(init[6], 300.0);
        assert_eq!(params.range_var_vars()[6], 250.0);
    }
}
