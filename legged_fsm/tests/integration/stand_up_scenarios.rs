//! STAND_UP driven hook-by-hook, the way the orchestrator calls it.

use legged_common::fsm::{ControlMode, StateName};
use legged_common::leg::uniform_diagonal;
use legged_common::params::ControlParameters;
use legged_common::robot::RobotType;
use legged_common::{Real, Vec3};
use legged_fsm::config::StandUpProfiles;
use legged_fsm::context::ControlContext;
use legged_fsm::state::FsmState;
use legged_fsm::state::stand_up::StandUpState;

const EPS: Real = 1e-9;

fn lying_down(robot: RobotType) -> ControlContext {
    let mut params = ControlParameters::default();
    params.controller_dt = 0.002;
    params.set_mode(ControlMode::StandUp);
    let mut ctx = ControlContext::new(robot, params);
    for (i, data) in ctx.legs.datas.iter_mut().enumerate() {
        data.p = Vec3::new(0.02 * i as Real, -0.01, -0.05);
    }
    ctx
}

/// Run `cycles` full cycles (`run` then `check_transition`).
fn cycle(state: &mut StandUpState, ctx: &mut ControlContext, cycles: u32) {
    for _ in 0..cycles {
        state.run(ctx);
        assert_eq!(state.check_transition(ctx), StateName::StandUp);
    }
}

#[test]
fn mini_cheetah_reaches_stance_height_after_250_cycles() {
    let mut ctx = lying_down(RobotType::MiniCheetah);
    let mut state = StandUpState::new(StandUpProfiles::default());
    state.on_enter(&ctx);

    cycle(&mut state, &mut ctx, 250);
    assert!((state.progress(&ctx) - 1.0).abs() < EPS);

    state.run(&mut ctx);
    for (i, cmd) in ctx.legs.commands.iter().enumerate() {
        assert!((cmd.p_des.z + 0.25).abs() < EPS);
        assert!((cmd.p_des.x - 0.02 * i as Real).abs() < EPS);
        assert!((cmd.p_des.y + 0.01).abs() < EPS);
        assert_eq!(cmd.kp_cartesian, uniform_diagonal(500.0));
        assert_eq!(cmd.kd_cartesian, uniform_diagonal(8.0));
        assert_eq!(cmd.force_feed_forward, Vec3::zeros());
    }

    // Progress is clamped; the target stays put.
    cycle(&mut state, &mut ctx, 500);
    assert!((ctx.legs.commands[3].p_des.z + 0.25).abs() < EPS);
}

#[test]
fn milab_is_half_way_after_250_cycles() {
    let mut ctx = lying_down(RobotType::Milab);
    ctx.params.stand_kp_cartesian = Vec3::new(700.0, 0.0, 0.0);
    ctx.params.stand_kd_cartesian = Vec3::new(15.0, 0.0, 0.0);
    let mut state = StandUpState::new(StandUpProfiles::default());
    state.on_enter(&ctx);

    cycle(&mut state, &mut ctx, 250);
    assert!((state.progress(&ctx) - 0.5).abs() < EPS);

    state.run(&mut ctx);
    let expected_z = 0.5 * -0.35 + 0.5 * -0.05;
    for cmd in ctx.legs.commands.iter() {
        assert!((cmd.p_des.z - expected_z).abs() < EPS);
        assert_eq!(cmd.kp_cartesian, uniform_diagonal(700.0));
        assert_eq!(cmd.kd_cartesian, uniform_diagonal(15.0));
        assert_eq!(cmd.force_feed_forward, Vec3::new(0.0, 0.0, -50.0));
    }
}

#[test]
fn milab_gains_track_live_edits_mid_ramp() {
    let mut ctx = lying_down(RobotType::Milab);
    let mut state = StandUpState::new(StandUpProfiles::default());
    state.on_enter(&ctx);
    cycle(&mut state, &mut ctx, 10);

    ctx.params.stand_kp_cartesian = Vec3::new(300.0, 0.0, 0.0);
    state.run(&mut ctx);
    assert_eq!(ctx.legs.commands[0].kp_cartesian, uniform_diagonal(300.0));
}

#[test]
fn trajectory_ignores_motion_after_entry() {
    let mut ctx = lying_down(RobotType::Cheetah3);
    let mut state = StandUpState::new(StandUpProfiles::default());
    state.on_enter(&ctx);
    let snapshot = *state.initial_foot_positions();

    for data in ctx.legs.datas.iter_mut() {
        data.p = Vec3::new(0.3, 0.3, -0.4);
    }
    cycle(&mut state, &mut ctx, 100);

    assert_eq!(state.initial_foot_positions(), &snapshot);
    let progress = state.progress(&ctx);
    state.run(&mut ctx);
    let expected_z = progress * -0.45 + (1.0 - progress) * -0.05;
    assert!((ctx.legs.commands[2].p_des.z - expected_z).abs() < EPS);
    assert!((ctx.legs.commands[2].p_des.x - 0.04).abs() < EPS);
}

#[test]
fn re_entry_restarts_the_ramp() {
    let mut ctx = lying_down(RobotType::MiniCheetah);
    let mut state = StandUpState::new(StandUpProfiles::default());
    state.on_enter(&ctx);
    cycle(&mut state, &mut ctx, 120);

    for data in ctx.legs.datas.iter_mut() {
        data.p.z = -0.15;
    }
    state.on_enter(&ctx);
    assert_eq!(state.iteration(), 0);
    assert_eq!(state.progress(&ctx), 0.0);

    state.run(&mut ctx);
    assert!((ctx.legs.commands[0].p_des.z + 0.15).abs() < EPS);
}

#[test]
fn operator_requests_from_stand_up() {
    let mut ctx = lying_down(RobotType::MiniCheetah);
    let mut state = StandUpState::new(StandUpProfiles::default());
    state.on_enter(&ctx);

    let cases = [
        (ControlMode::BalanceStand as u8, StateName::BalanceStand),
        (ControlMode::SquatDown as u8, StateName::SquatDown),
        (ControlMode::RecoveryStand as u8, StateName::RecoveryStand),
        (ControlMode::Passive as u8, StateName::Passive),
        (ControlMode::StandUp as u8, StateName::StandUp),
    ];
    for (raw, expected) in cases {
        ctx.params.control_mode = raw;
        assert_eq!(state.check_transition(&ctx), expected, "mode {raw}");
    }
    assert_eq!(state.core().fault_count(), 0);

    for raw in [ControlMode::Locomotion as u8, 2, 200] {
        ctx.params.control_mode = raw;
        assert_eq!(state.check_transition(&ctx), StateName::StandUp);
    }
    assert_eq!(state.core().fault_count(), 3);
}

#[test]
fn legal_handoff_completes_once_requested() {
    let mut ctx = lying_down(RobotType::MiniCheetah);
    let mut state = StandUpState::new(StandUpProfiles::default());
    state.on_enter(&ctx);

    ctx.params.set_mode(ControlMode::BalanceStand);
    assert_eq!(state.check_transition(&ctx), StateName::BalanceStand);
    assert!(state.transition(&mut ctx).done);
    assert_eq!(state.next_state(), StateName::BalanceStand);
}
