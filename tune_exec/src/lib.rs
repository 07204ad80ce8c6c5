//! # Tuning library.
//!
//! This library provides the simulation and optimisation core used by
//! `tune_exec` to find PID gains and an event-triggering threshold for a
//! two-wheeled bot following a waypoint trajectory.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Episode evaluation - runs one traversal of a trajectory and scores it
pub mod eval;

/// Kinematic model - integrates the bot's pose under velocity commands
pub mod kin_model;

/// Tuning parameters - the configuration bundle for a whole run
pub mod params;

/// Particle swarm optimisation - searches the gain and threshold space
pub mod pso;

/// Trajectories - the reference paths the bot must follow
pub mod traj;

/// Trajectory control - PID tracking and the event-triggered control gate
pub mod traj_ctrl;
