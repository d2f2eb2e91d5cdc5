//! FSM vocabulary shared between the control core and its producers.
//!
//! State identifiers, operator modes, the transition record carried by a
//! state during a handoff, and the declarative safety-check flags a state
//! publishes to the safety gate.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use static_assertions::assert_eq_size;

use crate::consts::NUM_LEGS;
use crate::{Real, Vec3};

// ─── State Identifier ───────────────────────────────────────────────

/// Stable identifier of an FSM state.
///
/// `Invalid` is never active; it exists so that an undefined destination
/// can be represented and rejected rather than silently mapped.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum StateName {
    Invalid = 0,
    #[default]
    Passive = 1,
    StandUp = 2,
    BalanceStand = 3,
    RecoveryStand = 4,
    SquatDown = 5,
}

assert_eq_size!(StateName, u8);

impl StateName {
    /// Every state that can be active.
    pub const ACTIVE: [Self; 5] = [
        Self::Passive,
        Self::StandUp,
        Self::BalanceStand,
        Self::RecoveryStand,
        Self::SquatDown,
    ];

    /// Convert from raw `u8`. Returns `None` for invalid values.
    #[inline]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Invalid),
            1 => Some(Self::Passive),
            2 => Some(Self::StandUp),
            3 => Some(Self::BalanceStand),
            4 => Some(Self::RecoveryStand),
            5 => Some(Self::SquatDown),
            _ => None,
        }
    }

    /// Display string used in diagnostics.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Invalid => "INVALID",
            Self::Passive => "PASSIVE",
            Self::StandUp => "STAND_UP",
            Self::BalanceStand => "BALANCE_STAND",
            Self::RecoveryStand => "RECOVERY_STAND",
            Self::SquatDown => "SQUAT_DOWN",
        }
    }
}

impl std::fmt::Display for StateName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── Operator Mode ──────────────────────────────────────────────────

/// Operator-selected control mode.
///
/// The parameter store carries the raw value; decoding happens at
/// `check_transition` time so that unknown values can be reported.
/// Only a subset is reachable from any given state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum ControlMode {
    Passive = 0,
    StandUp = 1,
    BalanceStand = 3,
    Locomotion = 4,
    RecoveryStand = 6,
    SquatDown = 7,
    Vision = 8,
    Backflip = 9,
    Frontjump = 11,
}

assert_eq_size!(ControlMode, u8);

impl ControlMode {
    /// Convert from raw `u8`. Returns `None` for values outside the enumeration.
    #[inline]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Passive),
            1 => Some(Self::StandUp),
            3 => Some(Self::BalanceStand),
            4 => Some(Self::Locomotion),
            6 => Some(Self::RecoveryStand),
            7 => Some(Self::SquatDown),
            8 => Some(Self::Vision),
            9 => Some(Self::Backflip),
            11 => Some(Self::Frontjump),
            _ => None,
        }
    }

    /// Parse a mode name as used on the command line (`stand_up`, `passive`, ...).
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "passive" => Self::Passive,
            "stand_up" => Self::StandUp,
            "balance_stand" => Self::BalanceStand,
            "locomotion" => Self::Locomotion,
            "recovery_stand" => Self::RecoveryStand,
            "squat_down" => Self::SquatDown,
            "vision" => Self::Vision,
            "backflip" => Self::Backflip,
            "frontjump" => Self::Frontjump,
            _ => return None,
        })
    }
}

// ─── Transition Record ──────────────────────────────────────────────

/// Outcome of an in-progress state-to-state handoff.
///
/// Owned by its state and zeroed on every entry. `done` is only raised
/// once the destination's entry preconditions hold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransitionData {
    /// Handoff complete; the orchestrator may swap states.
    pub done: bool,
    /// Handoff start time [s].
    pub t0: Real,
    /// Time elapsed since `t0` [s].
    pub t_current: Real,
    /// Planned handoff duration [s].
    pub t_duration: Real,
    /// Foot positions at handoff start.
    pub foot_start: [Vec3; NUM_LEGS],
}

impl TransitionData {
    /// A fully reset record.
    pub fn zeroed() -> Self {
        Self {
            done: false,
            t0: 0.0,
            t_current: 0.0,
            t_duration: 0.0,
            foot_start: [Vec3::zeros(); NUM_LEGS],
        }
    }

    /// Reset in place.
    #[inline]
    pub fn zero(&mut self) {
        *self = Self::zeroed();
    }

    /// Raise `done`. Never lowered again until the next `zero()`.
    #[inline]
    pub fn complete(&mut self) {
        self.done = true;
    }
}

impl Default for TransitionData {
    fn default() -> Self {
        Self::zeroed()
    }
}

// ─── Safety-Check Flags ─────────────────────────────────────────────

bitflags! {
    /// Safety checks a state asks the gate to apply around its `run()`.
    ///
    /// `SAFE_ORIENTATION` is evaluated before control; the other two
    /// after the state has written its commands.
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct SafetyChecks: u8 {
        /// Body roll/pitch must be within limits before `run()`.
        const SAFE_ORIENTATION   = 0x01;
        /// Desired foot positions are clamped to the reachable envelope.
        const DESIRED_FOOT       = 0x02;
        /// Feed-forward forces are clamped to configured limits.
        const FORCE_FEED_FORWARD = 0x04;
    }
}

impl SafetyChecks {
    /// Checks evaluated after the state writes its commands.
    pub const POST_CONTROL: Self = Self::from_bits_truncate(
        Self::DESIRED_FOOT.bits() | Self::FORCE_FEED_FORWARD.bits(),
    );

    #[inline]
    pub const fn requires_safe_orientation(&self) -> bool {
        self.contains(Self::SAFE_ORIENTATION)
    }

    #[inline]
    pub const fn requires_desired_foot_check(&self) -> bool {
        self.contains(Self::DESIRED_FOOT)
    }

    #[inline]
    pub const fn requires_force_feed_forward_check(&self) -> bool {
        self.contains(Self::FORCE_FEED_FORWARD)
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
