//! RECOVERY_STAND: joint-space get-up sequence.
//!
//! The phase is a pure function of cycles since entry:
//!
//! ```text
//! [0, fold)                 entry joints → fold pose
//! [fold, fold + stand)      fold pose    → stand pose
//! [fold + stand, ∞)         hold stand pose
//! ```

use legged_common::consts::NUM_LEGS;
use legged_common::fsm::{ControlMode, SafetyChecks, StateName, TransitionData};
use legged_common::Vec3;
use tracing::debug;

use crate::config::RecoveryConfig;
use crate::context::ControlContext;
use crate::state::contract::{FsmState, StateCore};
use crate::trajectory::{blend_vec, phase_progress};

/// Recovery sequence phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum RecoveryPhase {
    Fold = 0,
    Stand = 1,
    Hold = 2,
}

#[derive(Debug, Clone)]
pub struct RecoveryStandState {
    core: StateCore,
    iteration: u64,
    initial_joint_positions: [Vec3; NUM_LEGS],
    config: RecoveryConfig,
    /// Last phase seen by `run`, for change logging only.
    last_phase: RecoveryPhase,
}

impl RecoveryStandState {
    pub fn new(config: RecoveryConfig) -> Self {
        Self {
            core: StateCore::new(StateName::RecoveryStand, SafetyChecks::empty()),
            iteration: 0,
            initial_joint_positions: [Vec3::zeros(); NUM_LEGS],
            config,
            last_phase: RecoveryPhase::Fold,
        }
    }

    #[inline]
    pub const fn iteration(&self) -> u64 {
        self.iteration
    }

    /// Phase the next `run` will execute.
    pub fn phase(&self) -> RecoveryPhase {
        let fold = u64::from(self.config.fold_cycles);
        let stand = u64::from(self.config.stand_cycles);
        if self.iteration < fold {
            RecoveryPhase::Fold
        } else if self.iteration < fold + stand {
            RecoveryPhase::Stand
        } else {
            RecoveryPhase::Hold
        }
    }

    fn joint_target(&self, leg: usize) -> Vec3 {
        let cfg = &self.config;
        let fold = u64::from(cfg.fold_cycles);
        match self.phase() {
            RecoveryPhase::Fold => {
                let p = phase_progress(self.iteration, cfg.fold_cycles);
                blend_vec(p, &self.initial_joint_positions[leg], &cfg.fold_pose)
            }
            RecoveryPhase::Stand => {
                let p = phase_progress(self.iteration - fold, cfg.stand_cycles);
                blend_vec(p, &cfg.fold_pose, &cfg.stand_pose)
            }
            RecoveryPhase::Hold => cfg.stand_pose,
        }
    }

    const fn target_for(mode: ControlMode) -> Option<StateName> {
        match mode {
            ControlMode::RecoveryStand => Some(StateName::RecoveryStand),
            ControlMode::StandUp => Some(StateName::StandUp),
            ControlMode::BalanceStand => Some(StateName::BalanceStand),
            ControlMode::SquatDown => Some(StateName::SquatDown),
            ControlMode::Passive => Some(StateName::Passive),
            ControlMode::Locomotion
            | ControlMode::Vision
            | ControlMode::Backflip
            | ControlMode::Frontjump => None,
        }
    }

    const fn accepts(target: StateName) -> bool {
        matches!(
            target,
            StateName::StandUp
                | StateName::BalanceStand
                | StateName::SquatDown
                | StateName::Passive
        )
    }
}

impl FsmState for RecoveryStandState {
    #[inline]
    fn core(&self) -> &StateCore {
        &self.core
    }

    #[inline]
    fn core_mut(&mut self) -> &mut StateCore {
        &mut self.core
    }

    fn on_enter(&mut self, ctx: &ControlContext) {
        self.core.reset_for_entry();
        self.iteration = 0;
        self.initial_joint_positions = ctx.legs.joint_positions();
        self.last_phase = self.phase();
    }

    fn run(&mut self, ctx: &mut ControlContext) {
        let phase = self.phase();
        if phase != self.last_phase {
            debug!(
                "RECOVERY_STAND phase {:?} -> {:?} at cycle {}",
                self.last_phase, phase, self.iteration
            );
            self.last_phase = phase;
        }

        let (kp, kd) = (self.config.kp_joint, self.config.kd_joint);
        for (leg, cmd) in ctx.legs.commands.iter_mut().enumerate() {
            cmd.zero();
            cmd.set_joint_gains(kp, kd);
            cmd.q_des = self.joint_target(leg);
        }
    }

    fn check_transition(&mut self, ctx: &ControlContext) -> StateName {
        self.iteration += 1;
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
