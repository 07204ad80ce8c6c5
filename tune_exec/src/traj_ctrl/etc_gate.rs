//! # Event-triggered control gate
//!
//! The gate compares a newly computed command against the command currently
//! applied to the bot. The change is weighted by a fixed positive definite
//! matrix `Q_etc`, and only when `delta^T Q_etc delta` reaches the threshold
//! is the new command let through. Otherwise the bot keeps moving under the
//! last applied command.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use nalgebra::Matrix2;

// Internal
use crate::kin_model::VelCmd;
use util::maths::quad_form;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Stateful gate remembering the last applied command.
#[derive(Debug, Clone)]
pub struct EtcGate {
    /// Weight matrix for command changes
    q_etc: Matrix2<f64>,

    /// The command currently applied to the bot
    last_applied: VelCmd,

    /// Number of commands let through since creation
    num_accepted: usize
}

/// Outcome of passing one command through the gate.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct GateDecision {
    /// True if the new command was let through
    pub accepted: bool,

    /// The command to apply to the bot this step
    pub applied: VelCmd
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl EtcGate {
    /// Create a new gate with a zero last applied command.
    pub fn new(q_etc: Matrix2<f64>) -> Self {
        Self {
            q_etc,
            last_applied: VelCmd::zeros(),
            num_accepted: 0
        }
    }

    /// Decide whether `new_cmd` should replace `last_cmd`.
    pub fn decide(&self, new_cmd: &VelCmd, last_cmd: &VelCmd, threshold: f64) -> bool {
        decide(new_cmd, last_cmd, &self.q_etc, threshold)
    }

    /// Pass a new command through the gate.
    ///
    /// If accepted the new command becomes the last applied command, if not
    /// the last applied command is returned unchanged.
    pub fn apply(&mut self, new_cmd: VelCmd, threshold: f64) -> GateDecision {
        let accepted = self.decide(&new_cmd, &self.last_applied, threshold);

        if accepted {
            self.last_applied = new_cmd;
            self.num_accepted += 1;
        }

        GateDecision {
            accepted,
            applied: self.last_applied
        }
    }

    /// The command currently applied to the bot.
    pub fn last_applied(&self) -> VelCmd {
        self.last_applied
    }

    /// Number of commands let through so far.
    pub fn num_accepted(&self) -> usize {
        self.num_accepted
    }
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// The gate decision rule, `delta^T Q_etc delta >= threshold`.
///
/// A NaN command change is never accepted.
pub fn decide(
    new_cmd: &VelCmd, 
    last_cmd: &VelCmd, 
    q_etc: &Matrix2<f64>, 
    threshold: f64
) -> bool {
    quad_form(&(new_cmd - last_cmd), q_etc) >= threshold
}

#[cfg(test)]
mod test {
    use super::*;

    fn q_etc() -> Matrix2<f64> {
        Matrix2::new(0.01, 0.0, 0.0, 5.0)
    }

    #[test]
    fn test_decide() {
        let q = q_etc();
        let last = VelCmd::new(100.0, 1.0);

        // 0.01 * 100^2 = 100
        assert!(decide(&VelCmd::new(200.0, 1.0), &last, &q, 100.0));
        assert!(!decide(&VelCmd::new(200.0, 1.0), &last, &q, 100.5));

        // 5 * 2^2 = 20
        assert!(decide(&VelCmd::new(100.0, 3.0), &last, &q, 20.0));
        assert!(!decide(&VelCmd::new(100.0, 3.0), &last, &q, 21.0));

        // No change only passes a non-positive threshold
        assert!(decide(&last, &last, &q, 0.0));
        assert!(!decide(&last, &last, &q, 1e-9));

        assert!(!decide(&VelCmd::new(std::f64::NAN, 0.0), &last, &q, -1.0));
    }

    #[test]
    fn test_hold_last_value() {
        let mut gate = EtcGate::new(q_etc());
        let first = VelCmd::new(500.0, 2.0);

        let d = gate.apply(first, 300.0);
        assert!(d.accepted);
        assert_eq!(d.applied, first);
        assert_eq!(gate.last_applied(), first);

        // Small change is rejected and the previous command is held
        let d = gate.apply(VelCmd::new(510.0, 2.5), 300.0);
        assert!(!d.accepted);
        assert_eq!(d.applied, first);
        assert_eq!(gate.last_applied(), first);

        // The comparison is against the held command, not the rejected one
        let second = VelCmd::new(700.0, 2.0);
        let d = gate.apply(second, 300.0);
        assert!(d.accepted);
        assert_eq!(d.applied, second);

        assert_eq!(gate.num_accepted(), 2);
    }
}
