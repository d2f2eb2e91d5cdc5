//! BALANCE_STAND: hold the stance reached at entry.
//!
//! Feet are held at the entry snapshot with the variant's stand gains and
//! feed-forward. All three safety checks apply while standing still.

use legged_common::consts::NUM_LEGS;
use legged_common::fsm::{ControlMode, SafetyChecks, StateName, TransitionData};
use legged_common::Vec3;

use crate::config::StandUpProfiles;
use crate::context::ControlContext;
use crate::state::contract::{FsmState, StateCore};

#[derive(Debug, Clone)]
pub struct BalanceStandState {
    core: StateCore,
    stance: [Vec3; NUM_LEGS],
    profiles: StandUpProfiles,
}

impl BalanceStandState {
    pub fn new(profiles: StandUpProfiles) -> Self {
        Self {
            core: StateCore::new(StateName::BalanceStand, SafetyChecks::all()),
            stance: [Vec3::zeros(); NUM_LEGS],
            profiles,
        }
    }

    /// Foot positions held since entry.
    #[inline]
    pub const fn stance(&self) -> &[Vec3; NUM_LEGS] {
        &self.stance
    }

    const fn target_for(mode: ControlMode) -> Option<StateName> {
        match mode {
            ControlMode::BalanceStand => Some(StateName::BalanceStand),
            ControlMode::StandUp => Some(StateName::StandUp),
            ControlMode::SquatDown => Some(StateName::SquatDown),
            ControlMode::RecoveryStand => Some(StateName::RecoveryStand),
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
                | StateName::SquatDown
                | StateName::RecoveryStand
                | StateName::Passive
        )
    }
}

impl FsmState for BalanceStandState {
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
        self.stance = ctx.legs.foot_positions();
    }

    fn run(&mut self, ctx: &mut ControlContext) {
        let profile = self.profiles.for_robot(ctx.robot_type());
        let (kp, kd) = profile.gains(&ctx.params);
        for (cmd, hold) in ctx.legs.commands.iter_mut().zip(self.stance.iter()) {
            cmd.zero();
            cmd.set_cartesian_gains(kp, kd);
            cmd.force_feed_forward = profile.force_feed_forward;
            cmd.p_des = *hold;
        }
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

#[cfg(test)]
mod tests {
    use super::*;
    use legged_common::leg::uniform_diagonal;
    use legged_common::params::ControlParameters;
    use legged_common::robot::RobotType;

    fn ctx() -> ControlContext {
        let mut params = ControlParameters::default();
        params.set_mode(ControlMode::BalanceStand);
        let mut ctx = ControlContext::new(RobotType::MiniCheetah, params);
        for data in ctx.legs.datas.iter_mut() {
            data.p = Vec3::new(0.0, 0.0, -0.25);
        }
        ctx
    }

    #[test]
    fn all_checks_enabled() {
        let s = BalanceStandState::new(StandUpProfiles::default());
        assert!(s.safety_checks().requires_safe_orientation());
        assert!(s.safety_checks().requires_desired_foot_check());
        assert!(s.safety_checks().requires_force_feed_forward_check());
    }

    #[test]
    fn holds_entry_stance() {
        let mut c = ctx();
        let mut s = BalanceStandState::new(StandUpProfiles::default());
        s.on_enter(&c);
        c.legs.datas[2].p = Vec3::new(0.1, 0.0, -0.1);
        s.run(&mut c);
        for cmd in &c.legs.commands {
            assert_eq!(cmd.p_des, Vec3::new(0.0, 0.0, -0.25));
            assert_eq!(cmd.kp_cartesian, uniform_diagonal(500.0));
        }
    }

    #[test]
    fn legal_targets_and_rejections() {
        let mut c = ctx();
        let mut s = BalanceStandState::new(StandUpProfiles::default());
        s.on_enter(&c);
        assert_eq!(s.check_transition(&c), StateName::BalanceStand);

        c.params.set_mode(ControlMode::Locomotion);
        assert_eq!(s.check_transition(&c), StateName::BalanceStand);
        assert!(s.core().last_fault().is_some());

        c.params.set_mode(ControlMode::SquatDown);
        assert_eq!(s.check_transition(&c), StateName::SquatDown);
        assert!(s.transition(&mut c).done);
    }
}
