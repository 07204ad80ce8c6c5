//! # Episode evaluation module
//!
//! An episode is one traversal of a trajectory by a simulated bot under a
//! fixed set of [`ControlGains`]. Each tick the tracker computes a new
//! command, the ETC gate decides whether it replaces the applied command, and
//! the kinematic model advances the bot. The episode ends when:
//!
//! - the last waypoint is reached (`Completed`),
//! - the weighted tracking error exceeds [`ERROR_CAP`] (`Diverged`), or
//! - the tick count exceeds `max_iter` (`Timeout`).
//!
//! None of these are errors, every episode produces a score:
//!
//! ```text
//! score = 1000 + 0.35 * (ticks - accepted) - 0.65 * |flown_len - ref_len| - integrated_error
//! ```
//!
//! The first term rewards ticks on which the gate saved a control update,
//! the others punish geometric deviation and accumulated tracking error.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;

pub use params::EvalParams;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, trace};
use nalgebra::{Matrix2, Vector2};
use serde::Serialize;

// Internal
use crate::{
    kin_model::{KinModel, VelCmd},
    params::ConfigError,
    traj::Trajectory,
    traj_ctrl::{ControlGains, EtcGate, PidTracker}
};
use util::maths::{polyline_length, quad_form};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Weighted tracking error above which the episode is abandoned.
pub const ERROR_CAP: f64 = 100.0;

/// Score of a perfect, instantaneous episode.
pub const SCORE_BASE: f64 = 1000.0;

/// Reward for each tick on which no new command was sent.
pub const SAVED_UPDATE_REWARD: f64 = 0.35;

/// Penalty per unit difference between flown and reference path lengths.
pub const PATH_LENGTH_PENALTY: f64 = 0.65;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Runs episodes with a fixed configuration.
#[derive(Debug, Clone)]
pub struct EpisodeEvaluator {
    params: EvalParams,
    q_err: Matrix2<f64>,
    q_etc: Matrix2<f64>,
    model: KinModel
}

/// The outcome of one episode.
#[derive(Debug, Clone, Serialize)]
pub struct EpisodeResult {
    /// Fitness of the episode, higher is better
    pub score: f64,

    /// Why the episode ended
    pub end_reason: EndReason,

    /// Number of simulated ticks
    pub num_ticks: usize,

    /// Number of ticks on which the ETC gate let a new command through
    pub num_accepted: usize,

    /// Weighted tracking error integrated over the episode
    pub integrated_error: f64,

    /// Absolute difference between the flown and reference path lengths
    pub path_length_error: f64,

    /// Position of the bot at the end of every tick
    pub flown_path: Vec<Vector2<f64>>
}

/// Per-tick record of an episode, for plotting and inspection.
#[derive(Debug, Clone, Default, Serialize)]
pub struct EpisodeTrace {
    /// Distance to the target waypoint
    pub dist_error: Vec<f64>,

    /// Normalised cross-track error
    pub cross_track_error: Vec<f64>,

    /// Target waypoint index after the tracker update
    pub target_index: Vec<usize>,

    /// The command applied to the bot
    pub applied_cmd: Vec<VelCmd>,

    /// Ticks on which the gate accepted a new command
    pub etc_instants: Vec<usize>
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// The reason an episode ended.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub enum EndReason {
    /// The last waypoint was reached
    Completed,

    /// The weighted tracking error exceeded the cap
    Diverged,

    /// The tick limit was exceeded
    Timeout
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl EpisodeEvaluator {
    /// Create a new evaluator, validating the parameters.
    pub fn new(params: EvalParams) -> Result<Self, ConfigError> {
        params.validate()?;

        Ok(Self {
            q_err: params.q_err_matrix(),
            q_etc: params.q_etc_matrix(),
            model: KinModel::new(params.dt),
            params
        })
    }

    pub fn params(&self) -> &EvalParams {
        &self.params
    }

    /// Run one episode along the trajectory with the given gains.
    pub fn run(&self, traj: &Trajectory, gains: &ControlGains) -> EpisodeResult {
        self.simulate(traj, gains, None)
    }

    /// Run one episode, also recording a per-tick trace.
    pub fn run_traced(
        &self, 
        traj: &Trajectory, 
        gains: &ControlGains
    ) -> (EpisodeResult, EpisodeTrace) {
        let mut trace = EpisodeTrace::default();
        let result = self.simulate(traj, gains, Some(&mut trace));

        (result, trace)
    }

    fn simulate(
        &self,
        traj: &Trajectory,
        gains: &ControlGains,
        mut trace: Option<&mut EpisodeTrace>
    ) -> EpisodeResult {
        let mut pose = traj.start_pose();
        let mut tracker = PidTracker::new();
        let mut gate = EtcGate::new(self.q_etc);

        let mut num_ticks = 0usize;
        let mut integrated_error = 0f64;
        let mut flown_path = Vec::new();

        let end_reason = loop {
            let out = tracker.compute(&pose, traj, gains);
            if out.done {
                break EndReason::Completed;
            }

            // Hold the last applied command if the gate rejects the new one
            let decision = gate.apply(out.cmd, gains.threshold);
            pose = self.model.step(&pose, &decision.applied);

            // The abort checks use the tick count before this tick is counted,
            // and the aborting tick is still recorded.
            let weighted_error = quad_form(&out.error, &self.q_err);
            let abort = if weighted_error > ERROR_CAP {
                Some(EndReason::Diverged)
            }
            else if num_ticks > self.params.max_iter {
                Some(EndReason::Timeout)
            }
            else {
                None
            };

            if let Some(t) = trace.as_deref_mut() {
                if decision.accepted {
                    t.etc_instants.push(num_ticks);
                }
                t.dist_error.push(out.error[0]);
                t.cross_track_error.push(out.error[1]);
                t.target_index.push(out.target_index);
                t.applied_cmd.push(decision.applied);
            }

            num_ticks += 1;
            integrated_error += weighted_error * self.params.dt;
            flown_path.push(pose.position);

            if let Some(reason) = abort {
                trace!("Episode aborted at tick {}: {:?}", num_ticks, reason);
                break reason;
            }
        };

        let path_length_error = (polyline_length(&flown_path) - traj.get_length()).abs();
        let num_accepted = gate.num_accepted();

        let score = SCORE_BASE
            + SAVED_UPDATE_REWARD * (num_ticks - num_accepted) as f64
            - PATH_LENGTH_PENALTY * path_length_error
            - integrated_error;

        debug!(
            "Episode {:?} after {} ticks ({} accepted): score {:.3}",
            end_reason, num_ticks, num_accepted, score
        );

        EpisodeResult {
            score,
            end_reason,
            num_ticks,
            num_accepted,
            integrated_error,
            path_length_error,
            flown_path
        }
    }
}

impl EpisodeResult {
    /// Percentage of ticks on which the gate saved a control update compared
    /// to sending a command every tick.
    pub fn etc_saving_pct(&self) -> f64 {
        if self.num_ticks == 0 {
            return 0.0
        }

        (1.0 - self.num_accepted as f64 / self.num_ticks as f64) * 100.0
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::traj_ctrl::{DesignVars, WAYPOINT_REACHED_DIST};

    const INIT_GUESS: [f64; 7] = [10.0, -50.0, 1.0, 10.0, 1.0, 25.0, 300.0];

    fn gains(vars: &[f64; 7]) -> ControlGains {
        ControlGains::from_vars(&DesignVars::from_column_slice(vars))
    }

    fn straight_line() -> Trajectory {
        Trajectory::direct(Vector2::zeros(), Vector2::new(1000.0, 0.0), 20).unwrap()
    }

    fn evaluator() -> EpisodeEvaluator {
        EpisodeEvaluator::new(EvalParams::default()).unwrap()
    }

    #[test]
    fn test_straight_line_completes() {
        let result = evaluator().run(&straight_line(), &gains(&INIT_GUESS));

        assert_eq!(result.end_reason, EndReason::Completed);
        assert!(result.num_ticks > 0);
        assert!(result.num_accepted <= result.num_ticks);
        assert!(result.num_accepted > 0);
        assert_eq!(result.flown_path.len(), result.num_ticks);
        assert!(result.integrated_error >= 0.0);
        assert!(result.etc_saving_pct() >= 0.0 && result.etc_saving_pct() <= 100.0);

        // The bot stays on the line
        for p in &result.flown_path {
            assert!(p.y.abs() < 1e-6);
        }
    }

    #[test]
    fn test_score_is_deterministic() {
        let eval = evaluator();
        let traj = straight_line();
        let g = gains(&INIT_GUESS);

        let a = eval.run(&traj, &g);
        let b = eval.run(&traj, &g);

        assert_eq!(a.score.to_bits(), b.score.to_bits());
        assert_eq!(a.num_ticks, b.num_ticks);
        assert_eq!(a.flown_path, b.flown_path);

        // Tracing does not change the result
        let (c, _) = eval.run_traced(&traj, &g);
        assert_eq!(a.score.to_bits(), c.score.to_bits());
    }

    #[test]
    fn test_short_path_score() {
        // Both points within reach: the first tick advances to the second
        // point and sends nothing, the second tick completes the path.
        let traj = Trajectory::new(vec![Vector2::zeros(), Vector2::new(30.0, 0.0)]).unwrap();
        let result = evaluator().run(&traj, &gains(&INIT_GUESS));

        assert_eq!(result.end_reason, EndReason::Completed);
        assert_eq!(result.num_ticks, 1);
        assert_eq!(result.num_accepted, 0);
        assert_eq!(result.integrated_error, 0.0);
        assert!((result.path_length_error - 30.0).abs() < 1e-12);
        assert!((result.score - (1000.0 + 0.35 - 0.65 * 30.0)).abs() < 1e-9);
    }

    #[test]
    fn test_timeout() {
        // Zero gains never move the bot
        let eval = evaluator();
        let result = eval.run(&straight_line(), &gains(&[0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 300.0]));

        assert_eq!(result.end_reason, EndReason::Timeout);
        assert_eq!(result.num_ticks, eval.params().max_iter + 2);
        assert_eq!(result.num_accepted, 0);
        assert!(result.score < SCORE_BASE);
    }

    #[test]
    fn test_divergence() {
        let traj = Trajectory::new(vec![
            Vector2::new(0.0, 0.0),
            Vector2::new(100.0, 0.0),
            Vector2::new(100.0, 100.0),
        ]).unwrap();

        let result = evaluator().run(&traj, &gains(&INIT_GUESS));

        assert_eq!(result.end_reason, EndReason::Diverged);
        assert!(result.num_ticks < evaluator().params().max_iter);
    }

    #[test]
    fn test_threshold_extremes() {
        let eval = evaluator();
        let traj = straight_line();

        // A negative threshold lets every command through
        let mut vars = INIT_GUESS;
        vars[6] = -1.0;
        let result = eval.run(&traj, &gains(&vars));
        assert_eq!(result.num_accepted, result.num_ticks);
        assert!((result.etc_saving_pct()).abs() < 1e-12);

        // A huge threshold lets nothing through so the bot never moves
        vars[6] = 1e12;
        let result = eval.run(&traj, &gains(&vars));
        assert_eq!(result.num_accepted, 0);
        assert_eq!(result.end_reason, EndReason::Timeout);
        assert!(result.flown_path.iter().all(|p| *p == Vector2::zeros()));
    }

    #[test]
    fn test_trace_hold_and_waypoints() {
        let (result, trace) = evaluator().run_traced(&straight_line(), &gains(&INIT_GUESS));

        assert_eq!(trace.applied_cmd.len(), result.num_ticks);
        assert_eq!(trace.etc_instants.len(), result.num_accepted);

        // Rejected ticks reuse the previous applied command
        let mut last = VelCmd::zeros();
        for (tick, cmd) in trace.applied_cmd.iter().enumerate() {
            if !trace.etc_instants.contains(&tick) {
                assert_eq!(*cmd, last);
            }
            last = *cmd;
        }

        // The waypoint index advances by one exactly on the ticks where the
        // distance to the target is within reach, and holds otherwise
        let mut prev = 0;
        for (&idx, &dist) in trace.target_index.iter().zip(trace.dist_error.iter()) {
            if dist <= WAYPOINT_REACHED_DIST {
                assert_eq!(idx, prev + 1);
            }
            else {
                assert_eq!(idx, prev);
            }
            prev = idx;
        }
        assert!(prev > 1);
    }

    /// 41 points around a circle of radius 300 about (400, 400), first and
    /// last coincident, travelled anticlockwise so the heading passes pi.
    fn circle() -> Trajectory {
        Trajectory::new((0..=40)
            .map(|i| {
                let a = 2.0 * std::f64::consts::PI * i as f64 / 40.0;
                Vector2::new(400.0 + 300.0 * a.cos(), 400.0 + 300.0 * a.sin())
            })
            .collect()
        ).unwrap()
    }

    #[test]
    fn test_heading_wrap_scores() {
        let eval = evaluator();
        let traj = circle();

        // The direction of travel lags the heading on the step after each
        // wrap, which these scores depend on
        let result = eval.run(&traj, &gains(&INIT_GUESS));
        assert_eq!(result.end_reason, EndReason::Completed);
        assert_eq!(result.num_ticks, 236);
        assert_eq!(result.num_accepted, 118);
        assert!((result.score - 904.075_547_655_751).abs() < 1e-6);

        let result = eval.run(&traj, &gains(&[5.0, -80.0, 0.5, 20.0, 2.0, 40.0, 800.0]));
        assert_eq!(result.end_reason, EndReason::Diverged);
        assert_eq!(result.num_ticks, 138);
        assert_eq!(result.num_accepted, 21);
        assert!((result.score - 120.036_319_349_099).abs() < 1e-6);
    }

    #[test]
    fn test_invalid_params() {
        let params = EvalParams {
            q_err: [[0.0, 0.0], [0.0, 0.0]],
            ..Default::default()
        };
        assert!(EpisodeEvaluator::new(params).is_err());
    }

}
