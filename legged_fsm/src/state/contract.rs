//! Uniform state contract.
//!
//! Every state owns a [`StateCore`] (identifier, declared next state,
//! transition record, safety flags, fault bookkeeping) and implements
//! [`FsmState`] on top of it. The orchestrator only talks to states
//! through this trait.
//!
//! Hook order per activation:
//!
//! ```text
//! on_enter → { run → check_transition }* → transition* → on_exit
//! ```

use legged_common::fsm::{SafetyChecks, StateName, TransitionData};
use tracing::{error, warn};

use crate::context::ControlContext;
use crate::error::FsmFault;

// ─── State Core ─────────────────────────────────────────────────────

/// Bookkeeping shared by every state.
#[derive(Debug, Clone)]
pub struct StateCore {
    name: StateName,
    pub(crate) next_state: StateName,
    transition_data: TransitionData,
    safety_checks: SafetyChecks,
    last_fault: Option<FsmFault>,
    fault_count: u32,
    /// Last logged fault; identical repeats are counted but not re-logged.
    suppressed: Option<FsmFault>,
}

impl StateCore {
    pub fn new(name: StateName, safety_checks: SafetyChecks) -> Self {
        Self {
            name,
            next_state: name,
            transition_data: TransitionData::zeroed(),
            safety_checks,
            last_fault: None,
            fault_count: 0,
            suppressed: None,
        }
    }

    #[inline]
    pub const fn name(&self) -> StateName {
        self.name
    }

    /// Currently declared destination (`name()` when staying).
    #[inline]
    pub const fn next_state(&self) -> StateName {
        self.next_state
    }

    #[inline]
    pub const fn safety_checks(&self) -> SafetyChecks {
        self.safety_checks
    }

    #[inline]
    pub const fn transition_data(&self) -> &TransitionData {
        &self.transition_data
    }

    #[inline]
    pub const fn last_fault(&self) -> Option<FsmFault> {
        self.last_fault
    }

    /// Faults reported since construction, repeats included.
    #[inline]
    pub const fn fault_count(&self) -> u32 {
        self.fault_count
    }

    /// Entry reset: declare "stay" and zero the transition record.
    pub fn reset_for_entry(&mut self) {
        self.next_state = self.name;
        self.transition_data.zero();
        self.suppressed = None;
    }

    /// Resolve one decision.
    ///
    /// `target` is the state's table lookup for the decoded mode; `None`
    /// means the raw mode has no destination from here. That case is
    /// reported and the state stays.
    pub fn decide(&mut self, mode_raw: u8, target: Option<StateName>) -> StateName {
        match target {
            Some(next) => {
                self.next_state = next;
                self.suppressed = None;
            }
            None => {
                self.next_state = self.name;
                self.report(FsmFault::InvalidRequest {
                    state: self.name,
                    mode: mode_raw,
                });
            }
        }
        self.next_state
    }

    /// Advance the handoff toward `next_state`.
    ///
    /// `legal` is the state's verdict on its own declared destination.
    /// An illegal destination is reported and `done` is left as it was, so
    /// an unverified handoff can never complete. `done` is never lowered.
    pub fn finish(&mut self, legal: bool) -> TransitionData {
        if legal {
            self.transition_data.complete();
        } else {
            self.report(FsmFault::InconsistentTransition {
                state: self.name,
                target: self.next_state,
            });
        }
        self.transition_data
    }

    /// Record a fault and log it unless it repeats the previous one.
    pub fn report(&mut self, fault: FsmFault) {
        self.fault_count = self.fault_count.saturating_add(1);
        self.last_fault = Some(fault);
        if self.suppressed == Some(fault) {
            return;
        }
        self.suppressed = Some(fault);
        match fault {
            FsmFault::InvalidRequest { .. } => warn!("[CONTROL FSM] {fault}"),
            _ => error!("[CONTROL FSM] {fault}"),
        }
    }
}

// ─── Contract ───────────────────────────────────────────────────────

/// Lifecycle hooks of one FSM state.
///
/// No hook may block, allocate or perform I/O: all of them run inside the
/// control period.
pub trait FsmState {
    fn core(&self) -> &StateCore;
    fn core_mut(&mut self) -> &mut StateCore;

    #[inline]
    fn name(&self) -> StateName {
        self.core().name()
    }

    #[inline]
    fn next_state(&self) -> StateName {
        self.core().next_state()
    }

    #[inline]
    fn safety_checks(&self) -> SafetyChecks {
        self.core().safety_checks()
    }

    /// Fully re-initialize local state and take entry snapshots.
    ///
    /// Repeated calls are idempotent apart from re-snapshotting.
    fn on_enter(&mut self, ctx: &ControlContext);

    /// Per-cycle computation: write leg commands.
    fn run(&mut self, ctx: &mut ControlContext);

    /// Decide the next state from the operator mode. Never writes commands.
    fn check_transition(&mut self, ctx: &ControlContext) -> StateName;

    /// Advance the handoff toward `next_state()`. Safe to call repeatedly.
    fn transition(&mut self, ctx: &mut ControlContext) -> TransitionData;

    /// Cleanup on leave. Must not request further transitions.
    fn on_exit(&mut self, _ctx: &mut ControlContext) {}
}

// ─── Tests ──────────────────────────────────────────────────────────
