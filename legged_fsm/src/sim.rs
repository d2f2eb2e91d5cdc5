//! Simulated leg plant for the bootstrap harness.
//!
//! Stands in for the leg driver and estimator: each leg's measured foot
//! and joint positions track the commanded targets through a first-order
//! lag, but only on the spaces the active state put gains on. A limp leg
//! does not move.

use legged_common::leg::LegController;
use legged_common::{Real, Vec3};

/// Tracking time constant [s].
pub const DEFAULT_TRACKING_TAU: Real = 0.02;

/// Foot position of a robot lying on the ground, hip frame [m].
pub const REST_FOOT_POSITION: [Real; 3] = [0.0, 0.0, -0.05];

/// Joint pose of a robot lying on the ground [rad].
pub const REST_JOINT_POSITION: [Real; 3] = [0.0, -1.4, 2.7];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LegPlant {
    tau: Real,
}

impl LegPlant {
    pub fn new(tau: Real) -> Self {
        Self {
            tau: tau.max(0.0),
        }
    }

    /// Place every leg in the resting pose with zero velocity.
    pub fn rest(legs: &mut LegController) {
        for data in legs.datas.iter_mut() {
            data.p = Vec3::from(REST_FOOT_POSITION);
            data.q = Vec3::from(REST_JOINT_POSITION);
            data.v = Vec3::zeros();
            data.qd = Vec3::zeros();
        }
    }

    /// Advance measured state by one period `dt`.
    pub fn step(&self, legs: &mut LegController, dt: Real) {
        if dt <= 0.0 {
            return;
        }
        let alpha = dt / (self.tau + dt);
        for (data, cmd) in legs.datas.iter_mut().zip(legs.commands.iter()) {
            if cmd.kp_cartesian.diagonal().iter().any(|k| *k > 0.0) {
                let delta = (cmd.p_des - data.p) * alpha;
                data.p += delta;
                data.v = delta / dt;
            } else {
                data.v = Vec3::zeros();
            }
            if cmd.kp_joint.diagonal().iter().any(|k| *k > 0.0) {
                let delta = (cmd.q_des - data.q) * alpha;
                data.q += delta;
                data.qd = delta / dt;
            } else {
                data.qd = Vec3::zeros();
            }
        }
    }
}

impl Default for LegPlant {
    fn default() -> Self {
        Self::new(DEFAULT_TRACKING_TAU)
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
