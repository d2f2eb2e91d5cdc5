//! Legged Common Library
//!
//! Shared types, constants and configuration primitives for the legged
//! control FSM workspace. Everything a state, the orchestrator, or an
//! external producer needs to agree on lives here.
//!
//! # Module Structure
//!
//! - [`consts`] - Leg count, cycle-period bounds, default tuning constants
//! - [`robot`] - Robot variant (closed enumeration, fixed at startup)
//! - [`fsm`] - State identifiers, operator modes, transition record, safety-check flags
//! - [`leg`] - Per-leg measured data and command targets
//! - [`params`] - Live-tunable control parameters
//! - [`config`] - Configuration loading traits and types
//! - [`prelude`] - Common re-exports for convenience
//!
//! # Precision
//!
//! The whole core runs on a single floating-point type, [`Real`]. It is
//! `f64` by default and `f32` when the `single-precision` feature is on.
//!
//! ```rust
//! use legged_common::prelude::*;
//!
//! let dt: Real = DEFAULT_CONTROLLER_DT;
//! assert!(dt > 0.0);
//! ```

pub mod config;
pub mod consts;
pub mod fsm;
pub mod leg;
pub mod params;
pub mod prelude;
pub mod robot;

/// Floating-point type used by every computation in the core.
#[cfg(not(feature = "single-precision"))]
pub type Real = f64;

/// Floating-point type used by every computation in the core.
#[cfg(feature = "single-precision")]
pub type Real = f32;

/// Cartesian 3-vector (x forward, y left, z up).
pub type Vec3 = nalgebra::Vector3<Real>;

/// 3×3 matrix, used for diagonal cartesian and joint gains.
pub type Mat3 = nalgebra::Matrix3<Real>;
