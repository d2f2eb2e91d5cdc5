//! PASSIVE: limp legs.
//!
//! Every command target and gain is zeroed each cycle. This is the safe
//! sink of the machine: the emergency stop always lands here.

use legged_common::fsm::{ControlMode, SafetyChecks, StateName, TransitionData};

use crate::context::ControlContext;
use crate::state::contract::{FsmState, StateCore};

#[derive(Debug, Clone)]
pub struct PassiveState {
    core: StateCore,
}

impl PassiveState {
    pub fn new() -> Self {
        Self {
            core: StateCore::new(StateName::Passive, SafetyChecks::empty()),
        }
    }

    const fn target_for(mode: ControlMode) -> Option<StateName> {
        match mode {
            ControlMode::Passive => Some(StateName::Passive),
            ControlMode::StandUp => Some(StateName::StandUp),
            ControlMode::RecoveryStand => Some(StateName::RecoveryStand),
            ControlMode::BalanceStand
            | ControlMode::Locomotion
            | ControlMode::SquatDown
            | ControlMode::Vision
            | ControlMode::Backflip
            | ControlMode::Frontjump => None,
        }
    }

    const fn accepts(target: StateName) -> bool {
        matches!(target, StateName::StandUp | StateName::RecoveryStand)
    }
}

impl Default for PassiveState {
    fn default() -> Self {
        Self::new()
    }
}

impl FsmState for PassiveState {
    #[inline]
    fn core(&self) -> &StateCore {
        &self.core
    }

    #[inline]
    fn core_mut(&mut self) -> &mut StateCore {
        &mut self.core
    }

    fn on_enter(&mut self, _ctx: &ControlContext) {
        self.core.reset_for_entry();
    }

    fn run(&mut self, ctx: &mut ControlContext) {
        ctx.legs.zero_commands();
    }

    fn check_transition(&mut self, ctx: &ControlContext) -> StateName {
        let raw = ctx.params.control_mode;
        let target = ControlMode::from_u8(raw).and_then(Self::target_for);
        self.core.decide(raw, target)
    }

    fn transition(&mut self, _ctx: &mut ControlContext) -> TransitionData {
        let legal = Self::accepts(self.core.next_state());
        self.core.finish(legal)
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
