//! Episode evaluation parameters

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use nalgebra::Matrix2;
use serde::{Deserialize, Serialize};

// Internal
use crate::params::ConfigError;
use util::maths::is_pos_def;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for episode evaluation
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct EvalParams {
    /// Simulation time step
    ///
    /// Units: seconds
    pub dt: f64,

    /// Maximum number of ticks in one episode before it is abandoned
    pub max_iter: usize,

    /// Weights for the tracking error, `err^T Q_err err`, row major
    pub q_err: [[f64; 2]; 2],

    /// Weights for command changes at the ETC gate, `d^T Q_etc d`, row major
    pub q_etc: [[f64; 2]; 2]
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for EvalParams {
    fn default() -> Self {
        Self {
            dt: 0.01,
            max_iter: 1000,
            q_err: [[0.01, 0.0], [0.0, 50.0]],
            q_etc: [[0.01, 0.0], [0.0, 5.0]]
        }
    }
}

impl EvalParams {
    /// The tracking error weight matrix.
    pub fn q_err_matrix(&self) -> Matrix2<f64> {
        to_matrix(&self.q_err)
    }

    /// The ETC gate weight matrix.
    pub fn q_etc_matrix(&self) -> Matrix2<f64> {
        to_matrix(&self.q_etc)
    }

    /// Check the parameters describe a valid evaluation.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.dt.is_finite() && self.dt > 0.0) {
            return Err(ConfigError::InvalidTimeStep(self.dt))
        }

        if self.max_iter == 0 {
            return Err(ConfigError::ZeroMaxIter)
        }

        if !is_pos_def(&self.q_err_matrix()) {
            return Err(ConfigError::NotPosDef("Q_err", self.q_err))
        }

        if !is_pos_def(&self.q_etc_matrix()) {
            return Err(ConfigError::NotPosDef("Q_etc", self.q_etc))
        }

        Ok(())
    }
}

fn to_matrix(rows: &[[f64; 2]; 2]) -> Matrix2<f64> {
    Matrix2::new(
        rows[0][0], rows[0][1],
        rows[1][0], rows[1][1]
    )
}
