//! Per-leg measured data and command targets.
//!
//! Measurement fields (`LegData`) are written only by the external leg
//! driver / estimator. Command fields (`LegCommand`) are written only by
//! the active FSM state during its cycle slot.

use crate::consts::NUM_LEGS;
use crate::{Mat3, Real, Vec3};

/// Measured state of one leg, in the hip frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LegData {
    /// Joint positions (ab/ad, hip, knee) [rad].
    pub q: Vec3,
    /// Joint velocities [rad/s].
    pub qd: Vec3,
    /// Foot position [m].
    pub p: Vec3,
    /// Foot velocity [m/s].
    pub v: Vec3,
}

impl LegData {
    pub fn zeroed() -> Self {
        Self {
            q: Vec3::zeros(),
            qd: Vec3::zeros(),
            p: Vec3::zeros(),
            v: Vec3::zeros(),
        }
    }
}

impl Default for LegData {
    fn default() -> Self {
        Self::zeroed()
    }
}

/// Command targets for one leg.
///
/// Cartesian and joint PD terms are summed by the leg driver; a state that
/// only uses one space leaves the other's gains at zero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LegCommand {
    /// Desired foot position [m].
    pub p_des: Vec3,
    /// Desired foot velocity [m/s].
    pub v_des: Vec3,
    /// Feed-forward foot force [N].
    pub force_feed_forward: Vec3,
    /// Cartesian stiffness (diagonal).
    pub kp_cartesian: Mat3,
    /// Cartesian damping (diagonal).
    pub kd_cartesian: Mat3,
    /// Desired joint positions [rad].
    pub q_des: Vec3,
    /// Desired joint velocities [rad/s].
    pub qd_des: Vec3,
    /// Feed-forward joint torque [N·m].
    pub tau_feed_forward: Vec3,
    /// Joint stiffness (diagonal).
    pub kp_joint: Mat3,
    /// Joint damping (diagonal).
    pub kd_joint: Mat3,
}

impl LegCommand {
    pub fn zeroed() -> Self {
        Self {
            p_des: Vec3::zeros(),
            v_des: Vec3::zeros(),
            force_feed_forward: Vec3::zeros(),
            kp_cartesian: Mat3::zeros(),
            kd_cartesian: Mat3::zeros(),
            q_des: Vec3::zeros(),
            qd_des: Vec3::zeros(),
            tau_feed_forward: Vec3::zeros(),
            kp_joint: Mat3::zeros(),
            kd_joint: Mat3::zeros(),
        }
    }

    /// Reset every target and gain to zero (limp leg).
    #[inline]
    pub fn zero(&mut self) {
        *self = Self::zeroed();
    }

    /// Apply the same cartesian stiffness/damping on all three axes.
    #[inline]
    pub fn set_cartesian_gains(&mut self, kp: Real, kd: Real) {
        self.kp_cartesian = uniform_diagonal(kp);
        self.kd_cartesian = uniform_diagonal(kd);
    }

    /// Apply the same joint stiffness/damping on all three joints.
    #[inline]
    pub fn set_joint_gains(&mut self, kp: Real, kd: Real) {
        self.kp_joint = uniform_diagonal(kp);
        self.kd_joint = uniform_diagonal(kd);
    }
}

impl Default for LegCommand {
    fn default() -> Self {
        Self::zeroed()
    }
}

/// `diag(k, k, k)`.
#[inline]
pub fn uniform_diagonal(k: Real) -> Mat3 {
    Mat3::from_diagonal(&Vec3::new(k, k, k))
}

/// Measured data and command buffers for all legs.
#[derive(Debug, Clone, PartialEq)]
pub struct LegController {
    /// Measured per-leg state (external producer writes).
    pub datas: [LegData; NUM_LEGS],
    /// Per-leg command targets (active state writes).
    pub commands: [LegCommand; NUM_LEGS],
}

impl LegController {
    pub fn new() -> Self {
        Self {
            datas: [LegData::zeroed(); NUM_LEGS],
            commands: [LegCommand::zeroed(); NUM_LEGS],
        }
    }

    /// Zero every leg's command.
    pub fn zero_commands(&mut self) {
        for cmd in self.commands.iter_mut() {
            cmd.zero();
        }
    }

    /// Snapshot of all measured foot positions.
    pub fn foot_positions(&self) -> [Vec3; NUM_LEGS] {
        std::array::from_fn(|leg| self.datas[leg].p)
    }

    /// Snapshot of all measured joint positions.
    pub fn joint_positions(&self) -> [Vec3; NUM_LEGS] {
        std::array::from_fn(|leg| self.datas[leg].q)
    }
}

impl Default for LegController {
    fn default() -> Self {
        Self::new()
    }
}
