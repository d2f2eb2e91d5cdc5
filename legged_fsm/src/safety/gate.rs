//! Safety gate.
//!
//! Pre-control: body roll/pitch within limits.
//! Post-control: desired foot x/y within the reachable envelope
//! `max_leg_length * sin(max_foot_angle)`, feed-forward force within the
//! lateral / vertical limits. Out-of-range and non-finite values are
//! clamped in place; each clamp is counted.

use legged_common::leg::LegController;
use legged_common::{Real, Vec3};
use tracing::debug;

use crate::config::SafetyLimits;
use crate::context::BodyState;

#[derive(Debug, Clone)]
pub struct SafetyGate {
    limits: SafetyLimits,
    /// Cached `max_leg_length * sin(max_foot_angle)`.
    max_reach_xy: Real,
}

impl SafetyGate {
    pub fn new(limits: SafetyLimits) -> Self {
        Self {
            max_reach_xy: limits.max_leg_length * limits.max_foot_angle.sin(),
            limits,
        }
    }

    #[inline]
    pub const fn limits(&self) -> &SafetyLimits {
        &self.limits
    }

    /// Horizontal reach limit for desired foot positions [m].
    #[inline]
    pub const fn max_reach_xy(&self) -> Real {
        self.max_reach_xy
    }

    /// `true` if roll and pitch are finite and within limits.
    pub fn orientation_ok(&self, body: &BodyState) -> bool {
        let (roll, pitch) = (body.roll(), body.pitch());
        roll.is_finite()
            && pitch.is_finite()
            && roll.abs() <= self.limits.max_roll
            && pitch.abs() <= self.limits.max_pitch
    }

    /// Clamp every leg's desired foot x/y. Returns the number of clamped legs.
    pub fn clamp_desired_foot(&self, legs: &mut LegController) -> u32 {
        let reach = self.max_reach_xy;
        let bounds = Vec3::new(reach, reach, Real::INFINITY);
        let mut clamped = 0;
        for (leg, cmd) in legs.commands.iter_mut().enumerate() {
            if clamp_symmetric(&mut cmd.p_des, &bounds) {
                debug!("leg {leg}: desired foot clamped to {:?}", cmd.p_des.as_slice());
                clamped += 1;
            }
        }
        clamped
    }

    /// Clamp every leg's feed-forward force. Returns the number of clamped legs.
    pub fn clamp_force_feed_forward(&self, legs: &mut LegController) -> u32 {
        let lateral = self.limits.max_lateral_force;
        let bounds = Vec3::new(lateral, lateral, self.limits.max_vertical_force);
        let mut clamped = 0;
        for (leg, cmd) in legs.commands.iter_mut().enumerate() {
            if clamp_symmetric(&mut cmd.force_feed_forward, &bounds) {
                debug!(
                    "leg {leg}: feed-forward force clamped to {:?}",
                    cmd.force_feed_forward.as_slice()
                );
                clamped += 1;
            }
        }
        clamped
    }
}

/// Clamp each component of `v` to `[-bound, bound]`; non-finite → 0.
/// Returns `true` if anything changed.
fn clamp_symmetric(v: &mut Vec3, bounds: &Vec3) -> bool {
    let mut changed = false;
    for (x, &bound) in v.iter_mut().zip(bounds.iter()) {
        let value: Real = *x;
        let limited = if value.is_finite() { value.clamp(-bound, bound) } else { 0.0 };
        if limited != value {
            *x = limited;
            changed = true;
        }
    }
    changed
}

// ─── Tests ──────────────────────────────────────────────────────────
