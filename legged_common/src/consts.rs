//! System-wide constants for the legged control workspace.
//!
//! Single source of truth for limb count, cycle-period bounds and the
//! per-variant tuning defaults. The tuning values are provisional (they
//! were never validated on hardware) and every one of them can be
//! overridden from the FSM config file.

use crate::Real;

/// Number of legs driven by the controller.
pub const NUM_LEGS: usize = 4;

/// Vertical axis index in a cartesian 3-vector.
pub const AXIS_Z: usize = 2;

// ─── Control Period ─────────────────────────────────────────────────

/// Default control-loop period [s] (500 Hz).
pub const DEFAULT_CONTROLLER_DT: Real = 0.002;

/// Shortest accepted control-loop period [s].
pub const CONTROLLER_DT_MIN: Real = 0.0001;

/// Longest accepted control-loop period [s].
pub const CONTROLLER_DT_MAX: Real = 0.1;

// ─── Transition Handoff ─────────────────────────────────────────────

/// Cycles a handoff may stay incomplete before it is reported as stalled.
pub const DEFAULT_TRANSITION_STALL_CYCLES: u32 = 1000;

/// Upper bound for the configurable stall budget.
pub const TRANSITION_STALL_CYCLES_MAX: u32 = 1_000_000;

// ─── Stand-Up Defaults ──────────────────────────────────────────────

/// Cartesian stiffness used by the fixed-gain variants [N/m].
pub const STAND_KP_CARTESIAN: Real = 500.0;

/// Cartesian damping used by the fixed-gain variants [N·s/m].
pub const STAND_KD_CARTESIAN: Real = 8.0;

/// Mini Cheetah stance height [m] and ramp rate [1/s].
pub const MINI_CHEETAH_STAND_HEIGHT: Real = 0.25;
pub const MINI_CHEETAH_STAND_RATE: Real = 2.0;

/// Cheetah 3 stance height [m] and ramp rate [1/s].
pub const CHEETAH_3_STAND_HEIGHT: Real = 0.45;
pub const CHEETAH_3_STAND_RATE: Real = 2.0;

/// MILAB stance height [m] and ramp rate [1/s].
pub const MILAB_STAND_HEIGHT: Real = 0.35;
pub const MILAB_STAND_RATE: Real = 1.0;

/// MILAB constant downward feed-forward force during stand-up [N].
pub const MILAB_STAND_FORCE_Z: Real = -50.0;

/// Ramp rate bounds [1/s].
pub const STAND_RATE_MIN: Real = 0.01;
pub const STAND_RATE_MAX: Real = 100.0;

/// Stance height bounds [m].
pub const STAND_HEIGHT_MIN: Real = 0.0;
pub const STAND_HEIGHT_MAX: Real = 2.0;

// ─── Squat-Down Defaults ────────────────────────────────────────────

/// Foot height below the hip at the end of a squat [m].
pub const DEFAULT_SQUAT_HEIGHT: Real = 0.10;

// ─── Recovery Defaults ──────────────────────────────────────────────

/// Cycles spent folding the legs.
pub const DEFAULT_RECOVERY_FOLD_CYCLES: u32 = 800;

/// Cycles spent extending from the fold pose to the stand pose.
pub const DEFAULT_RECOVERY_STAND_CYCLES: u32 = 1000;

/// Joint stiffness during recovery [N·m/rad].
pub const DEFAULT_RECOVERY_KP_JOINT: Real = 80.0;

/// Joint damping during recovery [N·m·s/rad].
pub const DEFAULT_RECOVERY_KD_JOINT: Real = 1.0;

/// Folded joint pose (ab/ad, hip, knee) [rad].
pub const DEFAULT_FOLD_POSE: [Real; 3] = [0.0, -1.4, 2.7];

/// Standing joint pose (ab/ad, hip, knee) [rad].
pub const DEFAULT_STAND_POSE: [Real; 3] = [0.0, -0.8, 1.6];

// ─── Safety Defaults ────────────────────────────────────────────────

/// Maximum body roll before the orientation gate trips [rad].
pub const DEFAULT_MAX_ROLL: Real = 0.5;

/// Maximum body pitch before the orientation gate trips [rad].
pub const DEFAULT_MAX_PITCH: Real = 0.5;

/// Maximum leg length used for the foot envelope [m].
pub const DEFAULT_MAX_LEG_LENGTH: Real = 0.409;

/// Maximum leg swing angle from vertical [rad] (60°).
pub const DEFAULT_MAX_FOOT_ANGLE: Real = 1.0472;

/// Lateral (x/y) feed-forward force limit [N].
pub const DEFAULT_MAX_LATERAL_FORCE: Real = 350.0;

/// Vertical feed-forward force limit [N].
pub const DEFAULT_MAX_VERTICAL_FORCE: Real = 350.0;
