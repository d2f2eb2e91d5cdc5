//! FSM fault taxonomy.
//!
//! Faults are reported (traced and recorded), never propagated across the
//! cycle boundary: an aborted cycle would stop command production, which is
//! worse than any of these conditions.

use legged_common::Real;
use legged_common::fsm::StateName;
use thiserror::Error;

/// A reported, non-fatal FSM condition.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum FsmFault {
    /// Operator mode has no mapped destination from the current state.
    /// The state holds its current target.
    #[error("bad request: cannot transition from {state} with operator mode {mode}")]
    InvalidRequest { state: StateName, mode: u8 },

    /// `transition()` reached with a destination outside the state's legal
    /// set. `done` is left false so the handoff cannot complete.
    #[error("inconsistent transition: {state} cannot hand off to {target}")]
    InconsistentTransition { state: StateName, target: StateName },

    /// A handoff stayed incomplete past the configured cycle budget.
    #[error("transition stall: {from} -> {to} incomplete after {cycles} cycles")]
    TransitionStall {
        from: StateName,
        to: StateName,
        cycles: u32,
    },

    /// Pre-control orientation gate tripped.
    #[error("unsafe orientation in {state}: roll {roll:.3} rad, pitch {pitch:.3} rad")]
    UnsafeOrientation {
        state: StateName,
        roll: Real,
        pitch: Real,
    },
}

impl FsmFault {
    /// Faults that indicate a logic defect rather than an operator request.
    #[inline]
    pub const fn is_defect(&self) -> bool {
        matches!(self, Self::InconsistentTransition { .. })
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
