//! Live-tunable control parameters.
//!
//! Written by the operator interface between cycles; read by the FSM every
//! cycle. Loaded from the `[parameters]` table of the FSM config at startup.

use serde::{Deserialize, Serialize};

use crate::consts::{
    CONTROLLER_DT_MAX, CONTROLLER_DT_MIN, DEFAULT_CONTROLLER_DT, STAND_KD_CARTESIAN,
    STAND_KP_CARTESIAN,
};
use crate::fsm::ControlMode;
use crate::{Real, Vec3};

/// Operator-facing parameter record.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ControlParameters {
    /// Control-loop period [s].
    #[serde(default = "default_controller_dt")]
    pub controller_dt: Real,

    /// Raw operator mode. Decoded with [`ControlMode::from_u8`].
    #[serde(default)]
    pub control_mode: u8,

    /// Stand cartesian stiffness; only axis 0 is consumed.
    #[serde(default = "default_stand_kp")]
    pub stand_kp_cartesian: Vec3,

    /// Stand cartesian damping; only axis 0 is consumed.
    #[serde(default = "default_stand_kd")]
    pub stand_kd_cartesian: Vec3,

    /// Remote-controller input enabled. Not consumed by the FSM core.
    #[serde(default)]
    pub use_rc: bool,
}

fn default_controller_dt() -> Real {
    DEFAULT_CONTROLLER_DT
}
fn default_stand_kp() -> Vec3 {
    Vec3::repeat(STAND_KP_CARTESIAN)
}
fn default_stand_kd() -> Vec3 {
    Vec3::repeat(STAND_KD_CARTESIAN)
}

impl ControlParameters {
    /// Decoded operator mode, `None` if the raw value is not in the enumeration.
    #[inline]
    pub const fn mode(&self) -> Option<ControlMode> {
        ControlMode::from_u8(self.control_mode)
    }

    /// Select an operator mode.
    #[inline]
    pub fn set_mode(&mut self, mode: ControlMode) {
        self.control_mode = mode as u8;
    }

    /// Validate parameter bounds.
    pub fn validate(&self) -> Result<(), String> {
        if !(self.controller_dt.is_finite()
            && self.controller_dt >= CONTROLLER_DT_MIN
            && self.controller_dt <= CONTROLLER_DT_MAX)
        {
            return Err(format!(
                "controller_dt {} out of range [{}, {}]",
                self.controller_dt, CONTROLLER_DT_MIN, CONTROLLER_DT_MAX
            ));
        }
        if self.stand_kp_cartesian.iter().any(|k| !k.is_finite() || *k < 0.0) {
            return Err("stand_kp_cartesian must be finite and non-negative".to_string());
        }
        if self.stand_kd_cartesian.iter().any(|k| !k.is_finite() || *k < 0.0) {
            return Err("stand_kd_cartesian must be finite and non-negative".to_string());
        }
        Ok(())
    }
}

impl Default for ControlParameters {
    fn default() -> Self {
        Self {
            controller_dt: DEFAULT_CONTROLLER_DT,
            control_mode: ControlMode::Passive as u8,
            stand_kp_cartesian: default_stand_kp(),
            stand_kd_cartesian: default_stand_kd(),
            use_rc: false,
        }
    }
}
