//! STAND_UP: open-loop stance-height ramp.
//!
//! Drives all four feet from the positions measured at entry toward
//! `-target_height` on the vertical axis. Progress is
//! `clamp(rate * iteration * dt, 0, 1)`; nothing measured after entry
//! modulates the trajectory.
//!
//! | operator mode | next state |
//! |---|---|
//! | StandUp | stay |
//! | BalanceStand | BalanceStand |
//! | RecoveryStand | RecoveryStand |
//! | SquatDown | SquatDown |
//! | Passive | Passive |
//! | other | invalid request, stay |

use legged_common::consts::{AXIS_Z, NUM_LEGS};
use legged_common::fsm::{ControlMode, SafetyChecks, StateName, TransitionData};
use legged_common::{Real, Vec3};
use tracing::debug;

use crate::config::StandUpProfiles;
use crate::context::ControlContext;
use crate::state::contract::{FsmState, StateCore};
use crate::trajectory::{blend, ramp_progress};

/// Stance-height ramp state.
#[derive(Debug, Clone)]
pub struct StandUpState {
    core: StateCore,
    /// Cycles since entry; incremented once per `check_transition`.
    iteration: u64,
    /// Measured foot positions at entry. Never rewritten by `run`.
    initial_foot_positions: [Vec3; NUM_LEGS],
    profiles: StandUpProfiles,
}

impl StandUpState {
    pub fn new(profiles: StandUpProfiles) -> Self {
        // The ramp starts from arbitrary postures and issues targets a
        // generic envelope check would reject: no gating at all.
        Self {
            core: StateCore::new(StateName::StandUp, SafetyChecks::empty()),
            iteration: 0,
            initial_foot_positions: [Vec3::zeros(); NUM_LEGS],
            profiles,
        }
    }

    #[inline]
    pub const fn iteration(&self) -> u64 {
        self.iteration
    }

    #[inline]
    pub const fn initial_foot_positions(&self) -> &[Vec3; NUM_LEGS] {
        &self.initial_foot_positions
    }

    /// Ramp progress the next `run` will apply.
    pub fn progress(&self, ctx: &ControlContext) -> Real {
        let profile = self.profiles.for_robot(ctx.robot_type());
        ramp_progress(profile.rate, self.iteration, ctx.controller_dt())
    }

    const fn target_for(mode: ControlMode) -> Option<StateName> {
        match mode {
            ControlMode::StandUp => Some(StateName::StandUp),
            ControlMode::BalanceStand => Some(StateName::BalanceStand),
            ControlMode::RecoveryStand => Some(StateName::RecoveryStand),
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
            StateName::Passive
                | StateName::BalanceStand
                | StateName::SquatDown
                | StateName::RecoveryStand
        )
    }
}

impl FsmState for StandUpState {
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
        self.initial_foot_positions = ctx.legs.foot_positions();
        debug!(
            "STAND_UP entry snapshot: {:?}",
            self.initial_foot_positions.map(|p| p[AXIS_Z])
        );
    }

    fn run(&mut self, ctx: &mut ControlContext) {
        let progress = self.progress(ctx);
        let profile = self.profiles.for_robot(ctx.robot_type());
        let (kp, kd) = profile.gains(&ctx.params);
        let height = -profile.target_height;

        for (cmd, start) in ctx
            .legs
            .commands
            .iter_mut()
            .zip(self.initial_foot_positions.iter())
        {
            cmd.zero();
            cmd.set_cartesian_gains(kp, kd);
            cmd.force_feed_forward = profile.force_feed_forward;
            cmd.p_des = *start;
            cmd.p_des[AXIS_Z] = blend(progress, start[AXIS_Z], height);
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
