//! Time-parameterized open-loop trajectories.
//!
//! Pure functions used by the ramp states. No feedback enters here; the
//! trajectory is a function of elapsed cycles and the entry snapshot only.

use legged_common::{Real, Vec3};

/// Ramp progress `clamp(rate * iteration * dt, 0, 1)`.
///
/// Non-decreasing in `iteration` for fixed `rate` and `dt`, and never
/// exceeds 1 however long the loop runs.
#[inline]
pub fn ramp_progress(rate: Real, iteration: u64, dt: Real) -> Real {
    let p = rate * iteration as Real * dt;
    if p.is_nan() {
        return 0.0;
    }
    p.clamp(0.0, 1.0)
}

/// Linear blend `p * target + (1 - p) * start`.
#[inline]
pub fn blend(progress: Real, start: Real, target: Real) -> Real {
    progress * target + (1.0 - progress) * start
}

/// Component-wise linear blend of two 3-vectors.
#[inline]
pub fn blend_vec(progress: Real, start: &Vec3, target: &Vec3) -> Vec3 {
    start * (1.0 - progress) + target * progress
}

/// Progress through a phase that lasts `phase_cycles` cycles.
///
/// A zero-length phase is complete immediately.
#[inline]
pub fn phase_progress(elapsed_cycles: u64, phase_cycles: u32) -> Real {
    if phase_cycles == 0 {
        return 1.0;
    }
    (elapsed_cycles as Real / phase_cycles as Real).min(1.0)
}

// ─── Tests ──────────────────────────────────────────────────────────
