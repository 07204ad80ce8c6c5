//! # Trajectory control module
//!
//! Trajectory control keeps the bot on the reference trajectory. It is made
//! of two parts:
//!
//! - The [`PidTracker`], which measures the error between the bot and its
//!   current target waypoint and turns it into a velocity command with an
//!   elementwise PID law.
//! - The [`EtcGate`], an event-triggered control gate which only lets a new
//!   command through to the bot when it differs enough from the command
//!   currently applied. Otherwise the previous command is held.
//!
//! The error has two components. The first is the distance to the target
//! waypoint. The second is the cross product of the direction of travel and
//! the offset from the target, normalised by that distance, which gives a
//! signed measure of how far the target lies off to one side.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

pub mod controllers;
pub mod etc_gate;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
pub use controllers::*;
pub use etc_gate::*;
