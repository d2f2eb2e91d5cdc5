//! # Legged FSM
//!
//! Bootstrap harness around the control FSM: loads the TOML config, builds
//! the state machine against a simulated leg plant, replays an operator
//! mode script and paces the loop at `controller_dt`.
//!
//! ```text
//! legged_fsm --robot milab --cycles 3000 \
//!     --mode-script stand_up@0,balance_stand@1200,squat_down@2000
//! ```

use clap::Parser;
use legged_common::config::LogLevel;
use legged_common::robot::RobotType;
use legged_fsm::config::{FsmConfig, load_config};
use legged_fsm::cycle::{CycleRunner, rt_setup};
use legged_fsm::script::ModeScript;
use std::path::PathBuf;
use std::process;
use std::sync::atomic::Ordering;
use tracing::{error, info, warn, Level};
use tracing_subscriber::EnvFilter;

/// Legged FSM: cyclic control state machine for quadruped robots
#[derive(Parser, Debug)]
#[command(name = "legged_fsm")]
#[command(version)]
#[command(about = "Cyclic control FSM for legged robots (simulated leg plant)")]
struct Args {
    /// Path to the FSM configuration TOML. Built-in defaults when omitted.
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Robot variant, overrides `[controller].robot_type`.
    #[arg(long, value_name = "VARIANT")]
    robot: Option<RobotType>,

    /// Stop after this many cycles (default: run until Ctrl+C).
    #[arg(long)]
    cycles: Option<u64>,

    /// Operator mode script: `<mode>@<cycle>,...`.
    #[arg(long, value_name = "SCRIPT", default_value = "")]
    mode_script: ModeScript,

    /// CPU core to pin the RT thread to.
    #[arg(long, default_value_t = 1)]
    cpu_core: usize,

    /// SCHED_FIFO priority.
    #[arg(long, default_value_t = 80)]
    rt_priority: i32,

    /// Print the effective configuration as TOML and exit.
    #[arg(long)]
    print_config: bool,

    /// Enable verbose logging (DEBUG level).
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format.
    #[arg(long)]
    json: bool,
}

fn main() {
    let args = Args::parse();

    // Tracing needs the configured level, so the config is read first and
    // its error (if any) reported once the subscriber is up.
    let config = load(&args);
    let configured = config.as_ref().map_or(LogLevel::Info, |c| c.shared.log_level);
    setup_tracing(&args, configured);

    info!("Legged FSM v{} starting...", env!("CARGO_PKG_VERSION"));

    let result = config
        .map_err(|e| Box::new(e) as Box<dyn std::error::Error>)
        .and_then(|config| run(&args, config));
    if let Err(e) = result {
        error!("FATAL: {e}");
        process::exit(1);
    }

    info!("Legged FSM shutdown complete");
}

fn load(args: &Args) -> Result<FsmConfig, legged_common::config::ConfigError> {
    let mut config = match args.config {
        Some(ref path) => load_config(path)?,
        None => FsmConfig::default(),
    };
    if let Some(robot) = args.robot {
        config.controller.robot_type = robot;
    }
    Ok(config)
}

fn run(args: &Args, config: FsmConfig) -> Result<(), Box<dyn std::error::Error>> {
    if args.print_config {
        println!("{}", toml::to_string_pretty(&config)?);
        return Ok(());
    }

    info!(
        "Config OK: service={}, log_level={}, robot={}, controller_dt={}s, initial_state={}, stall_budget={} cycles",
        config.shared.service_name,
        config.shared.log_level.as_directive(),
        config.controller.robot_type,
        config.parameters.controller_dt,
        config.controller.initial_state,
        config.controller.transition_stall_cycles,
    );

    let script_end = args.mode_script.last_cycle();
    if let Some(cycles) = args.cycles {
        if !args.mode_script.steps().is_empty() && cycles <= script_end {
            warn!("--cycles {cycles} stops before the mode script step at cycle {script_end}");
        }
    }

    rt_setup(args.cpu_core, args.rt_priority)?;
    info!(
        "RT setup complete (cpu_core={}, priority={})",
        args.cpu_core, args.rt_priority
    );

    let mut runner = CycleRunner::new(&config, args.mode_script.clone());
    info!(
        "CycleRunner initialized ({} script steps), entering loop",
        args.mode_script.steps().len()
    );

    let gate = runner.machine.gate();
    let limits = gate.limits();
    info!(
        "Safety limits: roll={} rad, pitch={} rad, foot reach xy={:.3} m, lateral_force={} N, vertical_force={} N",
        limits.max_roll,
        limits.max_pitch,
        gate.max_reach_xy(),
        limits.max_lateral_force,
        limits.max_vertical_force,
    );

    let running = runner.stop_handle();
    ctrlc::set_handler(move || {
        info!("Received shutdown signal");
        running.store(false, Ordering::SeqCst);
    })?;

    let outcome = runner.run(args.cycles);

    let fsm = runner.machine.stats();
    let timing = &runner.stats;
    info!(
        "Final state {} after {} cycles: transitions={}, stalls={}, estops={}, foot_clamps={}, force_clamps={}",
        runner.machine.current_state(),
        fsm.cycles,
        fsm.transitions,
        fsm.stalls,
        fsm.estops,
        fsm.foot_clamps,
        fsm.force_clamps,
    );
    if timing.cycle_count > 0 {
        info!(
            "Cycle timing: min={}ns, avg={}ns, max={}ns, max_latency={}ns, overruns={}",
            timing.min_cycle_ns,
            timing.avg_cycle_ns(),
            timing.max_cycle_ns,
            timing.max_latency_ns,
            timing.overruns,
        );
    }

    if let Err(e) = outcome {
        error!("Cycle loop error: {e}");
        return Err(Box::new(e));
    }
    Ok(())
}

const fn level_of(level: LogLevel) -> Level {
    match level {
        LogLevel::Trace => Level::TRACE,
        LogLevel::Debug => Level::DEBUG,
        LogLevel::Info => Level::INFO,
        LogLevel::Warn => Level::WARN,
        LogLevel::Error => Level::ERROR,
    }
}

/// Setup tracing subscriber based on CLI arguments and the configured level.
fn setup_tracing(args: &Args, configured: LogLevel) {
    let level = if args.verbose {
        Level::DEBUG
    } else {
        level_of(configured)
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    if args.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .compact()
            .init();
    }
}
