//! Full operator sequences through the orchestrator and the cycle runner.

use legged_common::fsm::{ControlMode, StateName};
use legged_common::leg::LegCommand;
use legged_common::robot::RobotType;
use legged_common::{Real, Vec3};
use legged_fsm::config::{FsmConfig, RecoveryConfig};
use legged_fsm::context::ControlContext;
use legged_fsm::cycle::CycleRunner;
use legged_fsm::error::FsmFault;
use legged_fsm::script::ModeScript;
use legged_fsm::state::machine::{CycleOutcome, OperatingMode, StateMachine};
use legged_fsm::state::recovery_stand::RecoveryPhase;

fn runner(robot: RobotType, script: &str) -> CycleRunner {
    let mut config = FsmConfig::default();
    config.controller.robot_type = robot;
    CycleRunner::new(&config, script.parse().unwrap())
}

/// Step `n` cycles and keep every non-steady outcome with its cycle.
fn drive(runner: &mut CycleRunner, n: u64) -> Vec<(u64, CycleOutcome)> {
    let mut events = Vec::new();
    for _ in 0..n {
        let at = runner.cycle();
        let outcome = runner.step();
        if outcome != CycleOutcome::Steady {
            events.push((at, outcome));
        }
    }
    events
}

#[test]
fn stand_balance_squat_lie_down() {
    let mut r = runner(
        RobotType::MiniCheetah,
        "stand_up@0,balance_stand@400,squat_down@500,passive@1000",
    );
    let events = drive(&mut r, 1100);

    assert_eq!(
        events,
        vec![
            (
                0,
                CycleOutcome::Transitioned {
                    from: StateName::Passive,
                    to: StateName::StandUp
                }
            ),
            (
                400,
                CycleOutcome::Transitioned {
                    from: StateName::StandUp,
                    to: StateName::BalanceStand
                }
            ),
            (
                500,
                CycleOutcome::Transitioned {
                    from: StateName::BalanceStand,
                    to: StateName::SquatDown
                }
            ),
            (
                1000,
                CycleOutcome::Transitioned {
                    from: StateName::SquatDown,
                    to: StateName::Passive
                }
            ),
        ]
    );

    let stats = r.machine.stats();
    assert_eq!(stats.cycles, 1100);
    assert_eq!(stats.transitions, 4);
    assert_eq!((stats.stalls, stats.estops), (0, 0));
    assert_eq!(r.machine.current_state(), StateName::Passive);
    assert!(r.ctx.legs.commands.iter().all(|c| *c == LegCommand::zeroed()));
}

#[test]
fn balance_stand_holds_the_stance_reached_by_stand_up() {
    let mut r = runner(RobotType::MiniCheetah, "stand_up@0,balance_stand@400");
    drive(&mut r, 401);
    assert_eq!(r.machine.current_state(), StateName::BalanceStand);

    let stance = *r.machine.balance_stand().stance();
    for foot in stance.iter() {
        assert!((foot.z + 0.25).abs() < 0.01, "stance z {}", foot.z);
    }

    drive(&mut r, 50);
    for (cmd, foot) in r.ctx.legs.commands.iter().zip(stance.iter()) {
        assert_eq!(cmd.p_des, *foot);
    }
}

#[test]
fn squat_down_lowers_the_body() {
    let mut r = runner(RobotType::MiniCheetah, "stand_up@0,squat_down@400");
    drive(&mut r, 800);
    assert_eq!(r.machine.current_state(), StateName::SquatDown);
    for cmd in r.ctx.legs.commands.iter() {
        assert!((cmd.p_des.z + 0.10).abs() < 1e-9);
    }
    for data in r.ctx.legs.datas.iter() {
        assert!((data.p.z + 0.10).abs() < 0.01);
    }
}

#[test]
fn unsupported_modes_keep_the_active_state() {
    let mut r = runner(
        RobotType::Milab,
        "stand_up@0,locomotion@100,2@110,backflip@120,250@130",
    );
    let events = drive(&mut r, 200);

    assert_eq!(events.len(), 1);
    assert_eq!(r.machine.current_state(), StateName::StandUp);
    // Every cycle from 100 on carries a rejected request.
    assert_eq!(r.machine.core(StateName::StandUp).fault_count(), 100);
    assert_eq!(
        r.machine.core(StateName::StandUp).last_fault(),
        Some(FsmFault::InvalidRequest {
            state: StateName::StandUp,
            mode: 250
        })
    );
}

#[test]
fn illegal_pair_from_passive_is_rejected() {
    let mut r = runner(RobotType::MiniCheetah, "balance_stand@0");
    let events = drive(&mut r, 10);
    assert!(events.is_empty());
    assert_eq!(r.machine.current_state(), StateName::Passive);
    assert_eq!(r.machine.core(StateName::Passive).fault_count(), 10);
}

#[test]
fn recovery_stand_sequence_ends_in_stand_pose() {
    let mut config = FsmConfig::default();
    config.recovery = RecoveryConfig {
        fold_cycles: 20,
        stand_cycles: 30,
        ..RecoveryConfig::default()
    };
    let stand_pose = config.recovery.stand_pose;
    let mut r = CycleRunner::new(&config, "recovery_stand@0".parse().unwrap());

    drive(&mut r, 11);
    assert_eq!(r.machine.current_state(), StateName::RecoveryStand);
    assert_eq!(r.machine.recovery_stand().phase(), RecoveryPhase::Fold);

    drive(&mut r, 20);
    assert_eq!(r.machine.recovery_stand().phase(), RecoveryPhase::Stand);

    drive(&mut r, 200);
    assert_eq!(r.machine.recovery_stand().phase(), RecoveryPhase::Hold);
    for (cmd, data) in r.ctx.legs.commands.iter().zip(r.ctx.legs.datas.iter()) {
        assert_eq!(cmd.q_des, stand_pose);
        assert!((data.q - stand_pose).norm() < 1e-3);
    }
}

#[test]
fn requested_estop_leaves_operator_mode_alone() {
    let config = FsmConfig::default();
    let mut machine = StateMachine::new(&config);
    let mut ctx = ControlContext::new(RobotType::Cheetah3, config.parameters);
    for data in ctx.legs.datas.iter_mut() {
        data.p = Vec3::new(0.0, 0.0, -0.4);
    }

    ctx.params.set_mode(ControlMode::StandUp);
    machine.run_fsm(&mut ctx);
    ctx.params.set_mode(ControlMode::BalanceStand);
    machine.run_fsm(&mut ctx);
    assert_eq!(machine.current_state(), StateName::BalanceStand);

    machine.request_estop();
    assert_eq!(
        machine.run_fsm(&mut ctx),
        CycleOutcome::EStopped {
            from: StateName::BalanceStand
        }
    );
    assert_eq!(machine.current_state(), StateName::Passive);
    assert_eq!(machine.operating_mode(), OperatingMode::Normal);
    assert_eq!(ctx.params.control_mode, ControlMode::BalanceStand as u8);
    assert!(ctx.legs.commands.iter().all(|c| *c == LegCommand::zeroed()));

    // The stop is latched: nothing leaves PASSIVE until the operator has
    // acknowledged it by selecting Passive.
    assert_eq!(machine.run_fsm(&mut ctx), CycleOutcome::Steady);
    ctx.params.set_mode(ControlMode::StandUp);
    for _ in 0..3 {
        assert_eq!(machine.run_fsm(&mut ctx), CycleOutcome::Steady);
    }
    assert_eq!(machine.current_state(), StateName::Passive);

    ctx.params.set_mode(ControlMode::Passive);
    machine.run_fsm(&mut ctx);
    assert!(!machine.estop_latched());
    ctx.params.set_mode(ControlMode::StandUp);
    assert_eq!(
        machine.run_fsm(&mut ctx),
        CycleOutcome::Transitioned {
            from: StateName::Passive,
            to: StateName::StandUp
        }
    );
    assert_eq!(machine.stats().estops, 1);
}

#[test]
fn every_robot_variant_stands_up() {
    let heights: [(RobotType, Real); 3] = [
        (RobotType::MiniCheetah, 0.25),
        (RobotType::Cheetah3, 0.45),
        (RobotType::Milab, 0.35),
    ];
    for (robot, height) in heights {
        let mut r = runner(robot, "stand_up@0");
        // Slowest profile (rate 1.0) needs 500 cycles at 2 ms.
        drive(&mut r, 700);
        for cmd in r.ctx.legs.commands.iter() {
            assert!((cmd.p_des.z + height).abs() < 1e-9, "{robot}");
        }
    }
}

#[test]
fn script_with_raw_values_parses_like_names() {
    let by_name: ModeScript = "stand_up@0,squat_down@5".parse().unwrap();
    let by_value: ModeScript = "1@0,7@5".parse().unwrap();
    assert_eq!(by_name.steps(), by_value.steps());
}
