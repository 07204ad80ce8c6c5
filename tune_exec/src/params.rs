//! Tuning parameters
//!
//! All configuration for a run is held in one immutable [`TuneParams`] value,
//! normally loaded from `params/tune.toml`, and handed by reference to the
//! constructors of the components that need it.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::{Deserialize, Serialize};

// Internal
use crate::{
    eval::EvalParams,
    pso::PsoParams,
    traj::GenParams
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for a whole tuning run
#[derive(Deserialize, Serialize, Debug, Clone, Default)]
#[serde(default)]
pub struct TuneParams {
    /// Episode evaluation parameters
    pub eval: EvalParams,

    /// Optimiser parameters
    pub pso: PsoParams,

    /// Trajectory generation parameters, used when no trajectory file is
    /// given
    pub gen: GenParams
}

// -----------------------------------------------------------------------------------------------
// ENUMS
// -----------------------------------------------------------------------------------------------

/// Invalid configuration. These are raised before any simulation starts.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("The time step must be positive and finite, found {0}")]
    InvalidTimeStep(f64),

    #[error("The maximum number of ticks per episode must be at least 1")]
    ZeroMaxIter,

    #[error("The {0} weight matrix is not symmetric positive definite: {1:?}")]
    NotPosDef(&'static str, [[f64; 2]; 2]),

    #[error("The swarm needs at least one bot, found {0}")]
    TooFewBots(usize),

    #[error("Element {1} of {0} is not finite")]
    NonFiniteVar(&'static str, usize)
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl TuneParams {
    /// Check every section of the parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.eval.validate()?;
        self.pso.validate()
    }
}
