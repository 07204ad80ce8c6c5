//! # Kinematic model module
//!
//! The bot is modelled as a unicycle: it moves along its heading at the
//! commanded linear velocity and rotates at the commanded angular velocity.
//! There is no actuator or wheel dynamics, a command takes effect
//! immediately and for the whole of one time step.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::trace;
use nalgebra::Vector2;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A velocity command, `[linear, angular]`.
///
/// Units: distance units per second and radians per second.
pub type VelCmd = Vector2<f64>;

/// The pose (position and heading in the plane) of the bot.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    /// Position of the bot
    pub position: Vector2<f64>,

    /// Heading of the bot, the angle to the positive X axis.
    pub heading_rad: f64,

    /// Unit direction of travel.
    ///
    /// Taken from the heading before it is wrapped, so on the step after a
    /// wrap it still points along the unwrapped heading.
    dir: Vector2<f64>
}

/// Integrates a [`Pose`] forward in time using fixed time steps.
#[derive(Debug, Copy, Clone)]
pub struct KinModel {
    dt_s: f64
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for Pose {
    fn default() -> Self {
        Self::new(Vector2::zeros(), 0.0)
    }
}

impl Pose {
    /// Create a pose travelling along its heading.
    pub fn new(position: Vector2<f64>, heading_rad: f64) -> Self {
        Self {
            position,
            heading_rad,
            dir: heading_to_dir(heading_rad)
        }
    }

    /// Unit vector along the direction of travel of the bot.
    pub fn forward2(&self) -> Vector2<f64> {
        self.dir
    }
}

impl KinModel {
    /// Create a new model stepping with the given time step.
    pub fn new(dt_s: f64) -> Self {
        Self { dt_s }
    }

    /// Advance the pose by one time step under the given command.
    ///
    /// The position moves along the direction of travel held at the start of
    /// the step. The heading is then integrated, the new direction of travel
    /// taken from it, and only then is it wrapped with [`wrap_heading`].
    pub fn step(&self, pose: &Pose, cmd: &VelCmd) -> Pose {
        let position = pose.position + cmd[0] * self.dt_s * pose.forward2();
        let unwrapped_rad = pose.heading_rad + cmd[1] * self.dt_s;
        let dir = heading_to_dir(unwrapped_rad);
        let heading_rad = wrap_heading(unwrapped_rad);

        trace!(
            "KinModel step: ({:.3}, {:.3}) @ {:.4} rad -> ({:.3}, {:.3}) @ {:.4} rad",
            pose.position.x, pose.position.y, pose.heading_rad,
            position.x, position.y, heading_rad
        );

        Pose {
            position,
            heading_rad,
            dir
        }
    }
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

fn heading_to_dir(heading_rad: f64) -> Vector2<f64> {
    Vector2::new(heading_rad.cos(), heading_rad.sin())
}

/// Wrap a heading by flipping its sign once its magnitude reaches pi.
///
/// This is not a modulo wrap. A heading that passes pi in a step lands just
/// past -pi (and vice versa), so after a step the magnitude can exceed pi by
/// at most the angle turned in that step. The cross-track sign used by the
/// tracker, and so the tuned gains, depend on this convention.
pub fn wrap_heading(heading_rad: f64) -> f64 {
    if heading_rad.abs() >= PI {
        -heading_rad
    }
    else {
        heading_rad
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_straight_step() {
        let model = KinModel::new(0.01);
        let pose = Pose::new(Vector2::new(1.0, 2.0), 0.0);

        let next = model.step(&pose, &VelCmd::new(100.0, 0.0));

        assert!((next.position - Vector2::new(2.0, 2.0)).norm() < 1e-12);
        assert_eq!(next.heading_rad, 0.0);
    }

    #[test]
    fn test_moves_along_old_heading() {
        let model = KinModel::new(0.1);
        let pose = Pose::new(Vector2::zeros(), FRAC_PI_2);

        // Position uses the heading at the start of the step even while
        // turning
        let next = model.step(&pose, &VelCmd::new(10.0, 1.0));

        assert!((next.position - Vector2::new(0.0, 1.0)).norm() < 1e-12);
        assert!((next.heading_rad - (FRAC_PI_2 + 0.1)).abs() < 1e-12);
    }

    #[test]
    fn test_heading_wrap_flips_sign() {
        assert_eq!(wrap_heading(PI), -PI);
        assert_eq!(wrap_heading(3.5), -3.5);
        assert_eq!(wrap_heading(-3.5), 3.5);
        assert_eq!(wrap_heading(3.0), 3.0);
        assert_eq!(wrap_heading(-3.0), -3.0);

        // Driving the heading to exactly pi flips it
        let model = KinModel::new(1.0);
        let pose = Pose::new(Vector2::zeros(), PI - 1.0);
        let next = model.step(&pose, &VelCmd::new(0.0, 1.0));
        assert_eq!(next.heading_rad, -PI);
    }

    #[test]
    fn test_direction_lags_wrap() {
        let model = KinModel::new(0.1);
        let pose = Pose::new(Vector2::zeros(), PI - 0.05);

        // Turning through pi wraps the heading but not the direction
        let next = model.step(&pose, &VelCmd::new(0.0, 1.0));
        let unwrapped = PI + 0.05;
        assert!((next.heading_rad + unwrapped).abs() < 1e-12);
        assert!((next.forward2() - Vector2::new(unwrapped.cos(), unwrapped.sin())).norm() < 1e-12);
        assert!(next.forward2().y < 0.0);

        // The next step moves along the held direction. Without turning the
        // heading is still past pi, so it flips back and the direction is
        // taken from the wrapped heading.
        let after = model.step(&next, &VelCmd::new(10.0, 0.0));
        assert!((after.position - next.forward2()).norm() < 1e-12);
        assert_eq!(after.heading_rad, -next.heading_rad);
        assert!(after.forward2().y > 0.0);
    }

    #[test]
    fn test_new_pose_travels_along_heading() {
        let pose = Pose::new(Vector2::new(3.0, 4.0), FRAC_PI_2);
        assert!((pose.forward2() - Vector2::new(0.0, 1.0)).norm() < 1e-12);
        assert_eq!(Pose::default().forward2(), Vector2::new(1.0, 0.0));
    }

    #[test]
    fn test_heading_bounded_when_spinning() {
        let model = KinModel::new(0.01);
        let ang_step = 2.0 * 0.01;

        for &rate in &[2.0, -2.0] {
            let mut pose = Pose::default();
            for _ in 0..5000 {
                pose = model.step(&pose, &VelCmd::new(0.0, rate));
                assert!(pose.heading_rad.abs() < PI + ang_step + 1e-12);
            }
        }
    }
}
