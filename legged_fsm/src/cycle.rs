//! Deterministic control cycle: script → FSM → plant.
//!
//! Paces [`StateMachine::run_fsm`] at `controller_dt` against the simulated
//! leg plant. The FSM itself never sleeps; pacing lives here.
//!
//! ## RT Setup Sequence
//! 1. Pre-allocate all runtime state (zero heap in loop).
//! 2. `mlockall(MCL_CURRENT | MCL_FUTURE)`: lock all pages.
//! 3. Prefault stack pages.
//! 4. `sched_setaffinity`: pin to isolated CPU core.
//! 5. `sched_setscheduler(SCHED_FIFO, prio)`: RT priority.
//!
//! ## Cycle Loop
//! `rt` feature: absolute-time sleep on `CLOCK_MONOTONIC`, a single overrun
//! aborts the loop. Simulation: `std::thread::sleep` for the remainder of
//! the period, overruns are only counted.
//!
//! ## Cycle Body
//! Apply due operator-mode script step → `run_fsm` → advance plant.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, info};

use crate::config::FsmConfig;
use crate::context::ControlContext;
use crate::script::ModeScript;
use crate::sim::LegPlant;
use crate::state::machine::{CycleOutcome, StateMachine};

// ─── Cycle Statistics ───────────────────────────────────────────────

/// Timing of the paced loop around `run_fsm`, reported at shutdown.
#[derive(Debug, Clone)]
pub struct CycleStats {
    pub cycle_count: u64,
    /// Shortest FSM + plant step [ns]; `i64::MAX` until the first record.
    pub min_cycle_ns: i64,
    pub max_cycle_ns: i64,
    pub sum_cycle_ns: i64,
    /// Steps that took longer than `controller_dt`.
    pub overruns: u64,
    /// Worst wake-up lateness of the `rt` loop [ns]; 0 in simulation.
    pub max_latency_ns: i64,
}

impl CycleStats {
    pub const fn new() -> Self {
        Self {
            cycle_count: 0,
            min_cycle_ns: i64::MAX,
            max_cycle_ns: 0,
            sum_cycle_ns: 0,
            overruns: 0,
            max_latency_ns: 0,
        }
    }

    #[inline]
    pub fn record(&mut self, duration_ns: i64, latency_ns: i64) {
        self.cycle_count += 1;
        self.min_cycle_ns = self.min_cycle_ns.min(duration_ns);
        self.max_cycle_ns = self.max_cycle_ns.max(duration_ns);
        self.sum_cycle_ns += duration_ns;
        self.max_latency_ns = self.max_latency_ns.max(latency_ns);
    }

    /// Mean step duration [ns], 0 before the first cycle.
    #[inline]
    pub fn avg_cycle_ns(&self) -> i64 {
        if self.cycle_count == 0 {
            0
        } else {
            self.sum_cycle_ns / self.cycle_count as i64
        }
    }
}

impl Default for CycleStats {
    fn default() -> Self {
        Self::new()
    }
}

// ─── RT Setup ───────────────────────────────────────────────────────

/// Failure of the paced loop. FSM faults never surface here.
#[derive(Debug)]
pub enum CycleError {
    /// Locking memory, pinning or scheduling the control thread failed.
    RtSetup(String),
    /// One `run_fsm` + plant step exceeded `controller_dt` (`rt` only).
    CycleOverrun { actual_ns: i64, budget_ns: i64 },
}

impl std::fmt::Display for CycleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RtSetup(msg) => write!(f, "control thread setup failed: {msg}"),
            Self::CycleOverrun {
                actual_ns,
                budget_ns,
            } => write!(
                f,
                "FSM cycle took {actual_ns}ns, controller_dt allows {budget_ns}ns"
            ),
        }
    }
}

impl std::error::Error for CycleError {}

#[cfg(feature = "rt")]
fn rt_mlockall() -> Result<(), CycleError> {
    use nix::sys::mman::{MlockallFlags, mlockall};
    mlockall(MlockallFlags::MCL_CURRENT | MlockallFlags::MCL_FUTURE)
        .map_err(|e| CycleError::RtSetup(format!("mlockall failed: {e}")))
}

#[cfg(not(feature = "rt"))]
fn rt_mlockall() -> Result<(), CycleError> {
    Ok(())
}

/// Touch the stack the FSM cycle will use so it is resident before pacing starts.
fn prefault_stack() {
    let mut buf = [0u8; 256 * 1024];
    for byte in buf.iter_mut() {
        // SAFETY: `byte` is a valid, exclusive reference into `buf`.
        unsafe { core::ptr::write_volatile(byte, 0xFF) };
    }
    core::hint::black_box(&buf);
}

#[cfg(feature = "rt")]
fn rt_set_affinity(cpu: usize) -> Result<(), CycleError> {
    use nix::sched::{CpuSet, sched_setaffinity};
    use nix::unistd::Pid;

    let mut cpuset = CpuSet::new();
    cpuset
        .set(cpu)
        .map_err(|e| CycleError::RtSetup(format!("CpuSet::set({cpu}) failed: {e}")))?;
    sched_setaffinity(Pid::from_raw(0), &cpuset)
        .map_err(|e| CycleError::RtSetup(format!("sched_setaffinity failed: {e}")))
}

#[cfg(not(feature = "rt"))]
fn rt_set_affinity(_cpu: usize) -> Result<(), CycleError> {
    Ok(())
}

#[cfg(feature = "rt")]
fn rt_set_scheduler(priority: i32) -> Result<(), CycleError> {
    let param = libc::sched_param {
        sched_priority: priority,
    };
    // SAFETY: `param` is a valid sched_param; pid 0 is the calling thread.
    let ret = unsafe { libc::sched_setscheduler(0, libc::SCHED_FIFO, &param) };
    if ret != 0 {
        let err = std::io::Error::last_os_error();
        return Err(CycleError::RtSetup(format!(
            "sched_setscheduler(SCHED_FIFO, {priority}) failed: {err}"
        )));
    }
    Ok(())
}

#[cfg(not(feature = "rt"))]
fn rt_set_scheduler(_priority: i32) -> Result<(), CycleError> {
    Ok(())
}

/// Prepare the calling thread to run the control loop: lock memory,
/// prefault the stack, pin to `cpu_core`, switch to `SCHED_FIFO`.
/// Only the stack prefault runs without the `rt` feature.
pub fn rt_setup(cpu_core: usize, rt_priority: i32) -> Result<(), CycleError> {
    rt_mlockall()?;
    prefault_stack();
    rt_set_affinity(cpu_core)?;
    rt_set_scheduler(rt_priority)?;
    Ok(())
}

// ─── Cycle Runner ───────────────────────────────────────────────────

/// Owns the FSM, its context and the simulated plant.
pub struct CycleRunner {
    pub machine: StateMachine,
    pub ctx: ControlContext,
    pub stats: CycleStats,
    plant: LegPlant,
    script: ModeScript,
    cycle: u64,
    cycle_time_ns: i64,
    running: Arc<AtomicBool>,
}

impl CycleRunner {
    /// Build the runner from a validated config. Legs start at rest.
    pub fn new(config: &FsmConfig, script: ModeScript) -> Self {
        let mut ctx = ControlContext::new(config.controller.robot_type, config.parameters);
        LegPlant::rest(&mut ctx.legs);
        let cycle_time_ns = (config.parameters.controller_dt * 1e9).round() as i64;
        Self {
            machine: StateMachine::new(config),
            ctx,
            stats: CycleStats::new(),
            plant: LegPlant::default(),
            script,
            cycle: 0,
            cycle_time_ns,
            running: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Flag polled once per cycle; storing `false` ends `run`.
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.running)
    }

    /// Cycles executed so far.
    #[inline]
    pub const fn cycle(&self) -> u64 {
        self.cycle
    }

    #[inline]
    pub const fn cycle_time_ns(&self) -> i64 {
        self.cycle_time_ns
    }

    /// One unpaced cycle.
    pub fn step(&mut self) -> CycleOutcome {
        if let Some(mode) = self.script.poll(self.cycle) {
            info!("cycle {}: operator mode -> {mode}", self.cycle);
            self.ctx.params.control_mode = mode;
            if self.script.is_finished() {
                info!("cycle {}: mode script finished", self.cycle);
            }
        }

        let outcome = self.machine.run_fsm(&mut self.ctx);
        if outcome != CycleOutcome::Steady {
            debug!("cycle {}: {outcome:?}", self.cycle);
        }

        let dt = self.ctx.controller_dt();
        self.plant.step(&mut self.ctx.legs, dt);
        self.cycle += 1;
        outcome
    }

    /// Run paced cycles until stopped or `max_cycles` have executed.
    pub fn run(&mut self, max_cycles: Option<u64>) -> Result<(), CycleError> {
        #[cfg(feature = "rt")]
        {
            self.run_rt_loop(max_cycles)
        }

        #[cfg(not(feature = "rt"))]
        {
            self.run_sim_loop(max_cycles)
        }
    }

    fn keep_going(&self, max_cycles: Option<u64>) -> bool {
        self.running.load(Ordering::Relaxed) && max_cycles.is_none_or(|max| self.cycle < max)
    }

    #[cfg(feature = "rt")]
    fn run_rt_loop(&mut self, max_cycles: Option<u64>) -> Result<(), CycleError> {
        use nix::time::{ClockId, ClockNanosleepFlags, clock_gettime, clock_nanosleep};

        let clock = ClockId::CLOCK_MONOTONIC;
        let mut next_wake = clock_gettime(clock)
            .map_err(|e| CycleError::RtSetup(format!("clock_gettime: {e}")))?;

        while self.keep_going(max_cycles) {
            next_wake = timespec_add_ns(next_wake, self.cycle_time_ns);

            let cycle_start = clock_gettime(clock)
                .map_err(|e| CycleError::RtSetup(format!("clock_gettime: {e}")))?;
            let wake_latency_ns = timespec_diff_ns(&cycle_start, &next_wake).abs();

            self.step();

            let cycle_end = clock_gettime(clock)
                .map_err(|e| CycleError::RtSetup(format!("clock_gettime: {e}")))?;
            let duration_ns = timespec_diff_ns(&cycle_end, &cycle_start);
            self.stats.record(duration_ns, wake_latency_ns);

            if duration_ns > self.cycle_time_ns {
                self.stats.overruns += 1;
                return Err(CycleError::CycleOverrun {
                    actual_ns: duration_ns,
                    budget_ns: self.cycle_time_ns,
                });
            }

            let _ = clock_nanosleep(clock, ClockNanosleepFlags::TIMER_ABSTIME, &next_wake);
        }
        Ok(())
    }

    #[cfg(not(feature = "rt"))]
    fn run_sim_loop(&mut self, max_cycles: Option<u64>) -> Result<(), CycleError> {
        use std::time::{Duration, Instant};

        let cycle_duration = Duration::from_nanos(self.cycle_time_ns.max(0) as u64);

        while self.keep_going(max_cycles) {
            let cycle_start = Instant::now();

            self.step();

            let elapsed = cycle_start.elapsed();
            let duration_ns = elapsed.as_nanos() as i64;
            self.stats.record(duration_ns, 0);

            if duration_ns > self.cycle_time_ns {
                self.stats.overruns += 1;
            }

            if let Some(remaining) = cycle_duration.checked_sub(elapsed) {
                std::thread::sleep(remaining);
            }
        }
        Ok(())
    }
}

// ─── Time Helpers ───────────────────────────────────────────────────

#[cfg(feature = "rt")]
fn timespec_add_ns(ts: nix::sys::time::TimeSpec, ns: i64) -> nix::sys::time::TimeSpec {
    use nix::sys::time::TimeSpec;
    let mut secs = ts.tv_sec();
    let mut nanos = ts.tv_nsec() + ns;
    while nanos >= 1_000_000_000 {
        secs += 1;
        nanos -= 1_000_000_000;
    }
    while nanos < 0 {
        secs -= 1;
        nanos += 1_000_000_000;
    }
    TimeSpec::new(secs, nanos)
}

/// `a - b` in nanoseconds.
#[cfg(feature = "rt")]
fn timespec_diff_ns(a: &nix::sys::time::TimeSpec, b: &nix::sys::time::TimeSpec) -> i64 {
    (a.tv_sec() - b.tv_sec()) * 1_000_000_000 + (a.tv_nsec() - b.tv_nsec())
}

// ─── Tests ──────────────────────────────────────────────────────────
