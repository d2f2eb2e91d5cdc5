//! Shared control context.
//!
//! Single structure passed by explicit borrow to every state hook.
//! Field ownership per writer:
//!
//! | field | written by |
//! |---|---|
//! | `robot_type` | startup only |
//! | `legs.datas`, `body` | leg driver / estimator (between cycles) |
//! | `params` | operator interface (between cycles) |
//! | `legs.commands` | active FSM state (during its cycle slot) |

use legged_common::leg::LegController;
use legged_common::params::ControlParameters;
use legged_common::robot::RobotType;
use legged_common::{Real, Vec3};

/// Measured body orientation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyState {
    /// Roll, pitch, yaw [rad].
    pub rpy: Vec3,
}

impl BodyState {
    #[inline]
    pub fn roll(&self) -> Real {
        self.rpy.x
    }

    #[inline]
    pub fn pitch(&self) -> Real {
        self.rpy.y
    }
}

impl Default for BodyState {
    fn default() -> Self {
        Self { rpy: Vec3::zeros() }
    }
}

/// Everything a state reads or writes in one cycle.
#[derive(Debug, Clone)]
pub struct ControlContext {
    robot_type: RobotType,
    /// Per-leg measurements and command buffers.
    pub legs: LegController,
    /// Live-tunable parameters.
    pub params: ControlParameters,
    /// Measured body orientation.
    pub body: BodyState,
}

impl ControlContext {
    pub fn new(robot_type: RobotType, params: ControlParameters) -> Self {
        Self {
            robot_type,
            legs: LegController::new(),
            params,
            body: BodyState::default(),
        }
    }

    /// Robot variant, fixed for the lifetime of the context.
    #[inline]
    pub const fn robot_type(&self) -> RobotType {
        self.robot_type
    }

    /// Control-loop period [s].
    #[inline]
    pub const fn controller_dt(&self) -> Real {
        self.params.controller_dt
    }
}
