//! Pre-control orientation gate and post-control clamps, per active state.

use legged_common::fsm::{ControlMode, StateName};
use legged_common::robot::RobotType;
use legged_common::{Real, Vec3};
use legged_fsm::config::{FsmConfig, load_config_from_str};
use legged_fsm::context::ControlContext;
use legged_fsm::error::FsmFault;
use legged_fsm::state::machine::{CycleOutcome, StateMachine};

fn machine_in(
    config: &FsmConfig,
    robot: RobotType,
    feet: Vec3,
    path: &[ControlMode],
) -> (StateMachine, ControlContext) {
    let mut machine = StateMachine::new(config);
    let mut ctx = ControlContext::new(robot, config.parameters);
    for data in ctx.legs.datas.iter_mut() {
        data.p = feet;
    }
    for mode in path {
        ctx.params.set_mode(*mode);
        machine.run_fsm(&mut ctx);
    }
    (machine, ctx)
}

#[test]
fn balance_stand_clamps_out_of_reach_feet() {
    let config = FsmConfig::default();
    let (mut m, mut ctx) = machine_in(
        &config,
        RobotType::Milab,
        Vec3::new(0.6, -0.6, -0.3),
        &[ControlMode::StandUp, ControlMode::BalanceStand],
    );
    assert_eq!(m.current_state(), StateName::BalanceStand);

    m.run_fsm(&mut ctx);
    let reach = m.gate().max_reach_xy();
    let expected: Real = 0.409 * (1.0472 as Real).sin();
    assert!((reach - expected).abs() < 1e-9);
    for cmd in ctx.legs.commands.iter() {
        assert_eq!(cmd.p_des, Vec3::new(reach, -reach, -0.3));
    }
    assert_eq!(m.stats().foot_clamps, 4);
}

#[test]
fn stand_up_is_never_clamped() {
    let config = FsmConfig::default();
    let (mut m, mut ctx) = machine_in(
        &config,
        RobotType::MiniCheetah,
        Vec3::new(0.6, 0.0, -0.05),
        &[ControlMode::StandUp],
    );
    for _ in 0..10 {
        m.run_fsm(&mut ctx);
    }
    assert!(ctx.legs.commands.iter().all(|c| c.p_des.x == 0.6));
    assert_eq!(m.stats().foot_clamps, 0);
}

#[test]
fn excessive_feed_forward_is_limited() {
    let config = load_config_from_str(
        r#"
[stand_up.milab]
rate = 1.0
target_height = 0.35
gain_source = "parameters"
force_feed_forward = [400.0, 0.0, -500.0]

[safety]
max_lateral_force = 100.0
max_vertical_force = 350.0
"#,
    )
    .unwrap();
    let (mut m, mut ctx) = machine_in(
        &config,
        RobotType::Milab,
        Vec3::new(0.0, 0.0, -0.3),
        &[ControlMode::StandUp],
    );

    // STAND_UP issues the profile force unchecked.
    m.run_fsm(&mut ctx);
    assert_eq!(
        ctx.legs.commands[0].force_feed_forward,
        Vec3::new(400.0, 0.0, -500.0)
    );

    ctx.params.set_mode(ControlMode::BalanceStand);
    m.run_fsm(&mut ctx);
    m.run_fsm(&mut ctx);
    for cmd in ctx.legs.commands.iter() {
        assert_eq!(cmd.force_feed_forward, Vec3::new(100.0, 0.0, -350.0));
    }
    assert!(m.stats().force_clamps >= 4);
}

#[test]
fn non_finite_targets_are_zeroed() {
    let config = FsmConfig::default();
    let (mut m, mut ctx) = machine_in(
        &config,
        RobotType::MiniCheetah,
        Vec3::new(Real::NAN, 0.1, -0.25),
        &[ControlMode::StandUp, ControlMode::BalanceStand],
    );
    m.run_fsm(&mut ctx);
    for cmd in ctx.legs.commands.iter() {
        assert_eq!(cmd.p_des.x, 0.0);
        assert_eq!(cmd.p_des.y, 0.1);
    }
}

#[test]
fn tipped_over_balance_stand_goes_passive() {
    let config = FsmConfig::default();
    let (mut m, mut ctx) = machine_in(
        &config,
        RobotType::MiniCheetah,
        Vec3::new(0.0, 0.0, -0.25),
        &[ControlMode::StandUp, ControlMode::BalanceStand],
    );

    ctx.body.rpy = Vec3::new(0.0, -0.7, 0.0);
    assert_eq!(
        m.run_fsm(&mut ctx),
        CycleOutcome::EStopped {
            from: StateName::BalanceStand
        }
    );
    assert!(matches!(
        m.last_fault(),
        Some(FsmFault::UnsafeOrientation {
            state: StateName::BalanceStand,
            ..
        })
    ));
    assert_eq!(m.stats().estops, 1);
}

#[test]
fn orientation_is_ignored_outside_balance_stand() {
    let config = FsmConfig::default();
    let (mut m, mut ctx) = machine_in(
        &config,
        RobotType::MiniCheetah,
        Vec3::new(0.0, 0.0, -0.25),
        &[ControlMode::StandUp, ControlMode::SquatDown],
    );
    assert_eq!(m.current_state(), StateName::SquatDown);

    ctx.body.rpy = Vec3::new(1.2, 1.2, 0.0);
    for _ in 0..20 {
        assert_eq!(m.run_fsm(&mut ctx), CycleOutcome::Steady);
    }
    assert_eq!(m.current_state(), StateName::SquatDown);

    ctx.params.set_mode(ControlMode::RecoveryStand);
    m.run_fsm(&mut ctx);
    assert_eq!(m.current_state(), StateName::RecoveryStand);
    for _ in 0..20 {
        assert_eq!(m.run_fsm(&mut ctx), CycleOutcome::Steady);
    }
    assert_eq!(m.stats().estops, 0);
}

#[test]
fn tighter_limits_from_config() {
    let config = load_config_from_str(
        r#"
[safety]
max_roll = 0.1
"#,
    )
    .unwrap();
    let (mut m, mut ctx) = machine_in(
        &config,
        RobotType::Cheetah3,
        Vec3::new(0.0, 0.0, -0.45),
        &[ControlMode::StandUp, ControlMode::BalanceStand],
    );
    ctx.body.rpy = Vec3::new(0.2, 0.0, 0.0);
    assert!(matches!(m.run_fsm(&mut ctx), CycleOutcome::EStopped { .. }));
    assert_eq!(m.current_state(), StateName::Passive);
}
