//! Prelude module for common re-exports.
//!
//! `use legged_common::prelude::*;` brings in the types every state and
//! the orchestrator touch.

// ─── Numerics ───────────────────────────────────────────────────────
pub use crate::{Mat3, Real, Vec3};

// ─── Configuration ──────────────────────────────────────────────────
pub use crate::config::{ConfigError, ConfigLoader, LogLevel, SharedConfig, Validate};

// ─── System Constants ───────────────────────────────────────────────
pub use crate::consts::{AXIS_Z, DEFAULT_CONTROLLER_DT, NUM_LEGS};

// ─── FSM Vocabulary ─────────────────────────────────────────────────
pub use crate::fsm::{ControlMode, SafetyChecks, StateName, TransitionData};
pub use crate::leg::{LegCommand, LegController, LegData};
pub use crate::params::ControlParameters;
pub use crate::robot::RobotType;
