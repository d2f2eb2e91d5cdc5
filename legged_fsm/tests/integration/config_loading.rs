//! Config file → running machine.

use std::io::Write;

use legged_common::config::{ConfigError, LogLevel};
use legged_common::fsm::{ControlMode, StateName};
use legged_common::robot::RobotType;
use legged_common::Vec3;
use legged_fsm::config::{FsmConfig, GainSource, StallPolicy, load_config, load_config_from_str};
use legged_fsm::cycle::CycleRunner;
use legged_fsm::script::ModeScript;
use tempfile::NamedTempFile;

const FULL_CONFIG: &str = r#"
[shared]
log_level = "debug"
service_name = "legged-fsm-bench"

[controller]
robot_type = "milab"
initial_state = "passive"
transition_stall_cycles = 200
stall_policy = "hold"

[parameters]
controller_dt = 0.001
stand_kp_cartesian = [650.0, 0.0, 0.0]
stand_kd_cartesian = [11.0, 0.0, 0.0]

[stand_up.milab]
rate = 0.5
target_height = 0.32
gain_source = "parameters"
force_feed_forward = [0.0, 0.0, -40.0]

[squat_down]
squat_height = 0.12

[recovery]
fold_cycles = 400
stand_cycles = 600

[safety]
max_roll = 0.4
max_pitch = 0.45
"#;

fn write_config(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
fn load_full_config_from_file() {
    let file = write_config(FULL_CONFIG);
    let cfg = load_config(file.path()).unwrap();

    assert_eq!(cfg.shared.log_level, LogLevel::Debug);
    assert_eq!(cfg.shared.service_name, "legged-fsm-bench");
    assert_eq!(cfg.controller.robot_type, RobotType::Milab);
    assert_eq!(cfg.controller.initial_state, StateName::Passive);
    assert_eq!(cfg.controller.transition_stall_cycles, 200);
    assert_eq!(cfg.controller.stall_policy, StallPolicy::Hold);
    assert_eq!(cfg.parameters.controller_dt, 0.001);
    assert_eq!(cfg.parameters.stand_kp_cartesian, Vec3::new(650.0, 0.0, 0.0));

    let milab = cfg.stand_up.for_robot(RobotType::Milab);
    assert_eq!((milab.rate, milab.target_height), (0.5, 0.32));
    assert_eq!(milab.gain_source, GainSource::Parameters);
    assert_eq!(milab.force_feed_forward, Vec3::new(0.0, 0.0, -40.0));
    // Untouched variants keep their defaults.
    assert_eq!(
        cfg.stand_up.for_robot(RobotType::MiniCheetah),
        FsmConfig::default().stand_up.for_robot(RobotType::MiniCheetah)
    );

    assert_eq!(cfg.squat_down.squat_height, 0.12);
    assert_eq!((cfg.recovery.fold_cycles, cfg.recovery.stand_cycles), (400, 600));
    assert_eq!((cfg.safety.max_roll, cfg.safety.max_pitch), (0.4, 0.45));
}

#[test]
fn loaded_config_drives_the_runner() {
    let cfg = load_config_from_str(FULL_CONFIG).unwrap();
    let script: ModeScript = "stand_up@0".parse().unwrap();
    let mut runner = CycleRunner::new(&cfg, script);
    assert_eq!(runner.cycle_time_ns(), 1_000_000);

    // rate 0.5 at 1 ms: full height after 2000 cycles.
    for _ in 0..2_100 {
        runner.step();
    }
    assert_eq!(runner.machine.current_state(), StateName::StandUp);
    for cmd in runner.ctx.legs.commands.iter() {
        assert!((cmd.p_des.z + 0.32).abs() < 1e-9);
        assert_eq!(cmd.kp_cartesian[(0, 0)], 650.0);
        assert_eq!(cmd.force_feed_forward.z, -40.0);
    }
}

#[test]
fn configured_initial_state_is_entered_first() {
    let cfg = load_config_from_str(
        r#"
[controller]
initial_state = "recovery_stand"
"#,
    )
    .unwrap();
    let mut runner = CycleRunner::new(&cfg, ModeScript::default());
    runner.ctx.params.set_mode(ControlMode::RecoveryStand);
    runner.step();
    assert_eq!(runner.machine.current_state(), StateName::RecoveryStand);
    assert_eq!(runner.machine.stats().transitions, 0);
}

#[test]
fn missing_file_is_reported() {
    let result = load_config(std::path::Path::new("/nonexistent/legged_fsm.toml"));
    assert_eq!(result, Err(ConfigError::FileNotFound));
}

#[test]
fn malformed_toml_is_a_parse_error() {
    let file = write_config("[controller\nrobot_type = ");
    assert!(matches!(load_config(file.path()), Err(ConfigError::ParseError(_))));
}

#[test]
fn unknown_robot_variant_is_a_parse_error() {
    let result = load_config_from_str(
        r#"
[controller]
robot_type = "spot"
"#,
    );
    assert!(matches!(result, Err(ConfigError::ParseError(_))));
}

#[test]
fn out_of_range_values_fail_validation() {
    let cases = [
        "[parameters]\ncontroller_dt = 0.0\n",
        "[controller]\ninitial_state = \"invalid\"\n",
        "[controller]\ntransition_stall_cycles = 0\n",
        "[stand_up.mini_cheetah]\nrate = 2.0\ntarget_height = -0.1\n",
        "[squat_down]\nsquat_height = 5.0\n",
        "[safety]\nmax_pitch = -1.0\n",
        "[shared]\nservice_name = \"\"\n",
    ];
    for toml in cases {
        assert!(
            matches!(load_config_from_str(toml), Err(ConfigError::ValidationError(_))),
            "accepted: {toml}"
        );
    }
}

#[test]
fn printed_config_loads_back() {
    let cfg = load_config_from_str(FULL_CONFIG).unwrap();
    let printed = toml::to_string_pretty(&cfg).unwrap();
    assert_eq!(load_config_from_str(&printed).unwrap(), cfg);
}
