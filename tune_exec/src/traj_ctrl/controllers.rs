//! # Trajectory controllers module
//!
//! This module provides the PID tracker used for trajectory control,
//! including its error calculations, and the gains it is tuned with.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::trace;
use nalgebra::{SVector, Vector2};
use serde::{Deserialize, Serialize};

// Internal
use crate::{
    kin_model::{Pose, VelCmd},
    traj::Trajectory
};
use util::maths::cross2;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Number of error and command channels (linear and angular).
pub const NUM_CHANNELS: usize = 2;

/// Number of design variables: P, I and D for each channel, then the ETC
/// threshold.
pub const NUM_DESIGN_VARS: usize = 3 * NUM_CHANNELS + 1;

/// Distance at which the current target waypoint counts as reached.
pub const WAYPOINT_REACHED_DIST: f64 = 50.0;

/// Added to the distance when normalising the cross-track error, so that the
/// normalisation never divides by zero.
pub const CROSS_TRACK_EPS: f64 = 1e-3;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The flat design variable vector searched by the optimiser:
/// `[P_lin, P_ang, I_lin, I_ang, D_lin, D_ang, threshold]`.
pub type DesignVars = SVector<f64, NUM_DESIGN_VARS>;

/// Gains for the tracker and threshold for the ETC gate.
///
/// Each gain vector is `[linear, angular]`, applied elementwise to the error.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlGains {
    /// Proportional gain
    pub k_p: Vector2<f64>,

    /// Integral gain
    pub k_i: Vector2<f64>,

    /// Derivative gain
    pub k_d: Vector2<f64>,

    /// Event triggering threshold
    pub threshold: f64
}

/// Result of one tracker update.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct TrackerOutput {
    /// The commanded velocities
    pub cmd: VelCmd,

    /// The `[distance, cross-track]` error used to compute the command
    pub error: Vector2<f64>,

    /// Index of the target waypoint after this update
    pub target_index: usize,

    /// True once the last waypoint has been reached
    pub done: bool
}

/// Waypoint-indexed PID tracker.
#[derive(Debug, Clone, Default)]
pub struct PidTracker {
    /// Index of the current target waypoint
    target_index: usize,

    /// Error from the previous update
    prev_error: Vector2<f64>
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl ControlGains {

    /// Decode gains from design variables.
    pub fn from_vars(vars: &DesignVars) -> Self {
        Self {
            k_p: Vector2::new(vars[0], vars[1]),
            k_i: Vector2::new(vars[2], vars[3]),
            k_d: Vector2::new(vars[4], vars[5]),
            threshold: vars[6]
        }
    }

    /// Encode the gains as design variables.
    pub fn to_vars(&self) -> DesignVars {
        DesignVars::from_column_slice(&[
            self.k_p[0], self.k_p[1],
            self.k_i[0], self.k_i[1],
            self.k_d[0], self.k_d[1],
            self.threshold
        ])
    }
}

impl PidTracker {

    /// Create a new tracker targeting the first waypoint with zero previous
    /// error.
    pub fn new() -> Self {
        Self::default()
    }

    /// Index of the current target waypoint.
    pub fn target_index(&self) -> usize {
        self.target_index
    }

    /// Error from the previous update.
    pub fn prev_error(&self) -> Vector2<f64> {
        self.prev_error
    }

    /// Compute the command for the current pose, advancing the target
    /// waypoint if it has been reached.
    pub fn compute(
        &mut self, 
        pose: &Pose, 
        traj: &Trajectory, 
        gains: &ControlGains
    ) -> TrackerOutput {
        let out = track(pose, traj, self.target_index, &self.prev_error, gains);

        self.target_index = out.target_index;
        self.prev_error = out.error;

        out
    }
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Calculate the tracking error of the pose relative to a waypoint.
///
/// The cross-track component is positive when the waypoint lies to the right
/// of the direction of travel (right hand rule about Z).
pub fn calc_error(pose: &Pose, waypoint: &Vector2<f64>) -> Vector2<f64> {
    let delta = pose.position - waypoint;
    let dist = delta.norm();

    Vector2::new(
        dist,
        cross2(&pose.forward2(), &delta) / (dist + CROSS_TRACK_EPS)
    )
}

/// One PID tracking update.
///
/// The integral term is trapezoidal and the derivative a backward difference,
/// both per update rather than per unit time. If the target index is already
/// past the end of the trajectory the update is `done` with a zero command.
pub fn track(
    pose: &Pose,
    traj: &Trajectory,
    target_index: usize,
    prev_error: &Vector2<f64>,
    gains: &ControlGains
) -> TrackerOutput {
    let waypoint = match traj.points().get(target_index) {
        Some(w) => w,
        None => return TrackerOutput {
            cmd: VelCmd::zeros(),
            error: *prev_error,
            target_index,
            done: true
        }
    };

    let error = calc_error(pose, waypoint);

    let cmd = error.component_mul(&gains.k_p)
        + (error + prev_error).component_mul(&gains.k_i) * 0.5
        + (error - prev_error).component_mul(&gains.k_d);

    // Target management
    let mut target_index = target_index;
    let mut done = false;
    if error[0] <= WAYPOINT_REACHED_DIST {
        target_index += 1;
        done = target_index == traj.get_num_points();
    }

    trace!(
        "Tracker: target {} err [{:.3}, {:.4}] cmd [{:.3}, {:.3}]",
        target_index, error[0], error[1], cmd[0], cmd[1]
    );

    TrackerOutput {
        cmd,
        error,
        target_index,
        done
    }
}
