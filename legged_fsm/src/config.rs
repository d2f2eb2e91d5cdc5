//! FSM configuration: TOML schema, defaults and validation.
//!
//! Every per-variant tuning constant (stance height, ramp rate, gains,
//! feed-forward) is a named default from [`legged_common::consts`] and can
//! be overridden here. Parameter bounds are checked against const MIN/MAX.
//!
//! ```toml
//! [controller]
//! robot_type = "milab"
//! initial_state = "passive"
//! transition_stall_cycles = 500
//! stall_policy = "force_passive"
//!
//! [parameters]
//! controller_dt = 0.002
//!
//! [stand_up.milab]
//! rate = 1.0
//! target_height = 0.30
//! gain_source = "parameters"
//! force_feed_forward = [0.0, 0.0, -50.0]
//! ```

use std::path::Path;

use legged_common::config::{ConfigError, ConfigLoader, SharedConfig, Validate};
use legged_common::consts::*;
use legged_common::fsm::StateName;
use legged_common::params::ControlParameters;
use legged_common::robot::RobotType;
use legged_common::{Real, Vec3};
use serde::{Deserialize, Serialize};

// ─── Controller ─────────────────────────────────────────────────────

/// What the orchestrator does when a handoff exceeds its cycle budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StallPolicy {
    /// Abandon the handoff and keep running the current state.
    Hold,
    /// Escalate to an emergency stop (forced Passive).
    #[default]
    ForcePassive,
}

/// Orchestrator settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ControllerConfig {
    /// Robot variant, fixed for the process lifetime.
    #[serde(default)]
    pub robot_type: RobotType,

    /// State entered by `StateMachine::initialize`.
    #[serde(default)]
    pub initial_state: StateName,

    /// Cycles a handoff may stay incomplete before it is reported as stalled.
    #[serde(default = "default_stall_cycles")]
    pub transition_stall_cycles: u32,

    #[serde(default)]
    pub stall_policy: StallPolicy,
}

fn default_stall_cycles() -> u32 {
    DEFAULT_TRANSITION_STALL_CYCLES
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            robot_type: RobotType::default(),
            initial_state: StateName::Passive,
            transition_stall_cycles: DEFAULT_TRANSITION_STALL_CYCLES,
            stall_policy: StallPolicy::default(),
        }
    }
}

impl ControllerConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.initial_state == StateName::Invalid {
            return Err("initial_state cannot be 'invalid'".to_string());
        }
        if self.transition_stall_cycles == 0
            || self.transition_stall_cycles > TRANSITION_STALL_CYCLES_MAX
        {
            return Err(format!(
                "transition_stall_cycles {} out of range [1, {}]",
                self.transition_stall_cycles, TRANSITION_STALL_CYCLES_MAX
            ));
        }
        Ok(())
    }
}

// ─── Stand-Up Profiles ──────────────────────────────────────────────

/// Where a stand profile takes its cartesian gains from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum GainSource {
    /// `kp_cartesian` / `kd_cartesian` from the profile.
    #[default]
    Fixed,
    /// `stand_kp_cartesian[0]` / `stand_kd_cartesian[0]` from the live parameters.
    Parameters,
}

/// Per-variant stance ramp tuning.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StandUpProfile {
    /// Progress per second of elapsed time [1/s].
    pub rate: Real,
    /// Final foot height below the hip [m].
    pub target_height: Real,
    #[serde(default)]
    pub gain_source: GainSource,
    #[serde(default = "default_kp")]
    pub kp_cartesian: Real,
    #[serde(default = "default_kd")]
    pub kd_cartesian: Real,
    /// Constant feed-forward foot force issued throughout the ramp [N].
    #[serde(default = "default_force")]
    pub force_feed_forward: Vec3,
}

fn default_kp() -> Real {
    STAND_KP_CARTESIAN
}
fn default_kd() -> Real {
    STAND_KD_CARTESIAN
}
fn default_force() -> Vec3 {
    Vec3::zeros()
}

impl StandUpProfile {
    pub fn mini_cheetah() -> Self {
        Self {
            rate: MINI_CHEETAH_STAND_RATE,
            target_height: MINI_CHEETAH_STAND_HEIGHT,
            gain_source: GainSource::Fixed,
            kp_cartesian: STAND_KP_CARTESIAN,
            kd_cartesian: STAND_KD_CARTESIAN,
            force_feed_forward: Vec3::zeros(),
        }
    }

    pub fn cheetah_3() -> Self {
        Self {
            rate: CHEETAH_3_STAND_RATE,
            target_height: CHEETAH_3_STAND_HEIGHT,
            ..Self::mini_cheetah()
        }
    }

    pub fn milab() -> Self {
        Self {
            rate: MILAB_STAND_RATE,
            target_height: MILAB_STAND_HEIGHT,
            gain_source: GainSource::Parameters,
            kp_cartesian: STAND_KP_CARTESIAN,
            kd_cartesian: STAND_KD_CARTESIAN,
            force_feed_forward: Vec3::new(0.0, 0.0, MILAB_STAND_FORCE_Z),
        }
    }

    /// Cartesian `(kp, kd)` applied uniformly on all three axes.
    #[inline]
    pub fn gains(&self, params: &ControlParameters) -> (Real, Real) {
        match self.gain_source {
            GainSource::Fixed => (self.kp_cartesian, self.kd_cartesian),
            GainSource::Parameters => (params.stand_kp_cartesian[0], params.stand_kd_cartesian[0]),
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if !(self.rate >= STAND_RATE_MIN && self.rate <= STAND_RATE_MAX) {
            return Err(format!(
                "rate {} out of range [{}, {}]",
                self.rate, STAND_RATE_MIN, STAND_RATE_MAX
            ));
        }
        if !(self.target_height > STAND_HEIGHT_MIN && self.target_height <= STAND_HEIGHT_MAX) {
            return Err(format!(
                "target_height {} out of range ({}, {}]",
                self.target_height, STAND_HEIGHT_MIN, STAND_HEIGHT_MAX
            ));
        }
        if !(self.kp_cartesian >= 0.0 && self.kd_cartesian >= 0.0) {
            return Err("kp_cartesian / kd_cartesian must be non-negative".to_string());
        }
        if self.force_feed_forward.iter().any(|f| !f.is_finite()) {
            return Err("force_feed_forward must be finite".to_string());
        }
        Ok(())
    }
}

/// Stand profiles for every robot variant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StandUpProfiles {
    #[serde(default = "StandUpProfile::mini_cheetah")]
    pub mini_cheetah: StandUpProfile,
    #[serde(default = "StandUpProfile::cheetah_3")]
    pub cheetah_3: StandUpProfile,
    #[serde(default = "StandUpProfile::milab")]
    pub milab: StandUpProfile,
}

impl StandUpProfiles {
    #[inline]
    pub const fn for_robot(&self, robot: RobotType) -> &StandUpProfile {
        match robot {
            RobotType::MiniCheetah => &self.mini_cheetah,
            RobotType::Cheetah3 => &self.cheetah_3,
            RobotType::Milab => &self.milab,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        for robot in RobotType::ALL {
            self.for_robot(robot)
                .validate()
                .map_err(|e| format!("stand_up.{robot}: {e}"))?;
        }
        Ok(())
    }
}

impl Default for StandUpProfiles {
    fn default() -> Self {
        Self {
            mini_cheetah: StandUpProfile::mini_cheetah(),
            cheetah_3: StandUpProfile::cheetah_3(),
            milab: StandUpProfile::milab(),
        }
    }
}

// ─── Squat-Down ─────────────────────────────────────────────────────

/// Squat-down target; ramp rate and gains come from the stand profile.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SquatDownConfig {
    /// Final foot height below the hip [m].
    #[serde(default = "default_squat_height")]
    pub squat_height: Real,
}

fn default_squat_height() -> Real {
    DEFAULT_SQUAT_HEIGHT
}

impl Default for SquatDownConfig {
    fn default() -> Self {
        Self {
            squat_height: DEFAULT_SQUAT_HEIGHT,
        }
    }
}

// ─── Recovery ───────────────────────────────────────────────────────

/// Joint-space recovery sequence: entry pose → fold pose → stand pose.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RecoveryConfig {
    #[serde(default = "default_fold_cycles")]
    pub fold_cycles: u32,
    #[serde(default = "default_stand_cycles")]
    pub stand_cycles: u32,
    #[serde(default = "default_kp_joint")]
    pub kp_joint: Real,
    #[serde(default = "default_kd_joint")]
    pub kd_joint: Real,
    /// Folded joint pose (ab/ad, hip, knee) [rad].
    #[serde(default = "default_fold_pose")]
    pub fold_pose: Vec3,
    /// Standing joint pose (ab/ad, hip, knee) [rad].
    #[serde(default = "default_stand_pose")]
    pub stand_pose: Vec3,
}

fn default_fold_cycles() -> u32 {
    DEFAULT_RECOVERY_FOLD_CYCLES
}
fn default_stand_cycles() -> u32 {
    DEFAULT_RECOVERY_STAND_CYCLES
}
fn default_kp_joint() -> Real {
    DEFAULT_RECOVERY_KP_JOINT
}
fn default_kd_joint() -> Real {
    DEFAULT_RECOVERY_KD_JOINT
}
fn default_fold_pose() -> Vec3 {
    Vec3::from(DEFAULT_FOLD_POSE)
}
fn default_stand_pose() -> Vec3 {
    Vec3::from(DEFAULT_STAND_POSE)
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self {
            fold_cycles: DEFAULT_RECOVERY_FOLD_CYCLES,
            stand_cycles: DEFAULT_RECOVERY_STAND_CYCLES,
            kp_joint: DEFAULT_RECOVERY_KP_JOINT,
            kd_joint: DEFAULT_RECOVERY_KD_JOINT,
            fold_pose: default_fold_pose(),
            stand_pose: default_stand_pose(),
        }
    }
}

impl RecoveryConfig {
    pub fn validate(&self) -> Result<(), String> {
        if !(self.kp_joint >= 0.0 && self.kd_joint >= 0.0) {
            return Err("recovery kp_joint / kd_joint must be non-negative".to_string());
        }
        if self
            .fold_pose
            .iter()
            .chain(self.stand_pose.iter())
            .any(|q| !q.is_finite())
        {
            return Err("recovery poses must be finite".to_string());
        }
        Ok(())
    }
}

// ─── Safety Limits ──────────────────────────────────────────────────

/// Limits used by the safety gate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SafetyLimits {
    #[serde(default = "default_max_roll")]
    pub max_roll: Real,
    #[serde(default = "default_max_pitch")]
    pub max_pitch: Real,
    #[serde(default = "default_max_leg_length")]
    pub max_leg_length: Real,
    #[serde(default = "default_max_foot_angle")]
    pub max_foot_angle: Real,
    #[serde(default = "default_max_lateral_force")]
    pub max_lateral_force: Real,
    #[serde(default = "default_max_vertical_force")]
    pub max_vertical_force: Real,
}

fn default_max_roll() -> Real {
    DEFAULT_MAX_ROLL
}
fn default_max_pitch() -> Real {
    DEFAULT_MAX_PITCH
}
fn default_max_leg_length() -> Real {
    DEFAULT_MAX_LEG_LENGTH
}
fn default_max_foot_angle() -> Real {
    DEFAULT_MAX_FOOT_ANGLE
}
fn default_max_lateral_force() -> Real {
    DEFAULT_MAX_LATERAL_FORCE
}
fn default_max_vertical_force() -> Real {
    DEFAULT_MAX_VERTICAL_FORCE
}

impl Default for SafetyLimits {
    fn default() -> Self {
        Self {
            max_roll: DEFAULT_MAX_ROLL,
            max_pitch: DEFAULT_MAX_PITCH,
            max_leg_length: DEFAULT_MAX_LEG_LENGTH,
            max_foot_angle: DEFAULT_MAX_FOOT_ANGLE,
            max_lateral_force: DEFAULT_MAX_LATERAL_FORCE,
            max_vertical_force: DEFAULT_MAX_VERTICAL_FORCE,
        }
    }
}

impl SafetyLimits {
    pub fn validate(&self) -> Result<(), String> {
        let all = [
            ("max_roll", self.max_roll),
            ("max_pitch", self.max_pitch),
            ("max_leg_length", self.max_leg_length),
            ("max_foot_angle", self.max_foot_angle),
            ("max_lateral_force", self.max_lateral_force),
            ("max_vertical_force", self.max_vertical_force),
        ];
        for (name, value) in all {
            if !(value.is_finite() && value > 0.0) {
                return Err(format!("safety.{name} must be finite and > 0 (got {value})"));
            }
        }
        Ok(())
    }
}

// ─── Top-Level Config ───────────────────────────────────────────────

/// Complete FSM configuration. Every table is optional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct FsmConfig {
    #[serde(default)]
    pub shared: SharedConfig,
    #[serde(default)]
    pub controller: ControllerConfig,
    /// Initial live parameters.
    #[serde(default)]
    pub parameters: ControlParameters,
    #[serde(default)]
    pub stand_up: StandUpProfiles,
    #[serde(default)]
    pub squat_down: SquatDownConfig,
    #[serde(default)]
    pub recovery: RecoveryConfig,
    #[serde(default)]
    pub safety: SafetyLimits,
}

impl Validate for FsmConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        self.shared.validate()?;
        let checks = [
            self.controller.validate(),
            self.parameters.validate(),
            self.stand_up.validate(),
            self.recovery.validate(),
            self.safety.validate(),
            validate_squat(&self.squat_down),
        ];
        for check in checks {
            check.map_err(ConfigError::ValidationError)?;
        }
        Ok(())
    }
}

fn validate_squat(squat: &SquatDownConfig) -> Result<(), String> {
    if !(squat.squat_height > STAND_HEIGHT_MIN && squat.squat_height <= STAND_HEIGHT_MAX) {
        return Err(format!(
            "squat_height {} out of range ({}, {}]",
            squat.squat_height, STAND_HEIGHT_MIN, STAND_HEIGHT_MAX
        ));
    }
    Ok(())
}

// ─── Loading Functions ──────────────────────────────────────────────

/// Load and validate the FSM configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<FsmConfig, ConfigError> {
    FsmConfig::load(path)
}

/// Load and validate the FSM configuration from a TOML string.
pub fn load_config_from_str(toml_str: &str) -> Result<FsmConfig, ConfigError> {
    FsmConfig::from_toml_str(toml_str)
}

// ─── Tests ──────────────────────────────────────────────────────────
