//! SQUAT_DOWN: lower the body toward a crouch.
//!
//! Same open-loop vertical ramp as STAND_UP, from the entry snapshot to
//! `-squat_height`, at the variant's stand rate and gains.

use legged_common::consts::{AXIS_Z, NUM_LEGS};
use legged_common::fsm::{ControlMode, SafetyChecks, StateName, TransitionData};
use legged_common::{Real, Vec3};

use crate::config::{SquatDownConfig, StandUpProfiles};
use crate::context::ControlContext;
use crate::state::contract::{FsmState, StateCore};
use crate::trajectory::{blend, ramp_progress};

#[derive(Debug, Clone)]
pub struct SquatDownState {
    core: StateCore,
    iteration: u64,
    initial_foot_positions: [Vec3; NUM_LEGS],
    profiles: StandUpProfiles,
    squat: SquatDownConfig,
}

impl SquatDownState {
    pub fn new(profiles: StandUpProfiles, squat: SquatDownConfig) -> Self {
        Self {
            core: StateCore::new(StateName::SquatDown, SafetyChecks::POST_CONTROL),
            iteration: 0,
            initial_foot_positions: [Vec3::zeros(); NUM_LEGS],
            profiles,
            squat,
        }
    }

    #[inline]
    pub const fn iteration(&self) -> u64 {
        self.iteration
    }

    pub fn progress(&self, ctx: &ControlContext) -> Real {
        let profile = self.profiles.for_robot(ctx.robot_type());
        ramp_progress(profile.rate, self.iteration, ctx.controller_dt())
    }

    const fn target_for(mode: ControlMode) -> Option<StateName> {
        match mode {
            ControlMode::SquatDown => Some(StateName::SquatDown),
            ControlMode::Passive => Some(StateName::Passive),
            ControlMode::StandUp => Some(StateName::StandUp),
            ControlMode::RecoveryStand => Some(StateName::RecoveryStand),
            ControlMode::BalanceStand
            | ControlMode::Locomotion
            | ControlMode::Vision
            | ControlMode::Backflip
            | ControlMode::Frontjump => None,
        }
    }

    const fn accepts(target: StateName) -> bool {
        matches!(
            target,
            StateName::Passive | StateName::StandUp | StateName::RecoveryStand
        )
    }
}

impl FsmState for SquatDownState {
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
    }

    fn run(&mut self, ctx: &mut ControlContext) {
        let progress = self.progress(ctx);
        let profile = self.profiles.for_robot(ctx.robot_type());
        let (kp, kd) = profile.gains(&ctx.params);
        let height = -self.squat.squat_height;

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
