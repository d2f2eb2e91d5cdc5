//! FSM orchestrator.
//!
//! Owns every state (constructed once, reused across activations) and
//! dispatches by [`StateName`] tag. One call to [`StateMachine::run_fsm`]
//! per control cycle:
//!
//! ```text
//!            ┌── orientation unsafe / estop requested ──────────────┐
//!            │                                                      ▼
//! Normal: run → post-control clamps → check_transition ──≠──▶ Transitioning
//!   ▲                                                               │
//!   │           transition() each cycle until done                  │
//!   ├────────── on_exit(old), on_enter(new) ◀───────────────────────┤
//!   │                                                               │ budget exceeded
//!   └── EStop: exit active, enter + run PASSIVE ◀── ForcePassive ───┘
//! ```
//!
//! While a handoff spans cycles the old state's `run` is not called; its
//! `transition` owns the command buffers until the swap.
//!
//! An emergency stop latches: PASSIVE ignores every requested destination
//! until the operator mode has been seen as `Passive`. A handoff abandoned
//! under `StallPolicy::Hold` is not retried until the operator mode changes.

use legged_common::fsm::{ControlMode, SafetyChecks, StateName};
use static_assertions::assert_eq_size;
use tracing::{error, info, warn};

use crate::config::{FsmConfig, StallPolicy};
use crate::context::ControlContext;
use crate::error::FsmFault;
use crate::safety::SafetyGate;
use crate::state::balance_stand::BalanceStandState;
use crate::state::contract::{FsmState, StateCore};
use crate::state::passive::PassiveState;
use crate::state::recovery_stand::RecoveryStandState;
use crate::state::squat_down::SquatDownState;
use crate::state::stand_up::StandUpState;

/// Orchestrator operating mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum OperatingMode {
    /// Active state runs and decides.
    Normal = 0,
    /// Handoff in progress; only `transition()` is called.
    Transitioning = 1,
    /// Forced PASSIVE on the current cycle.
    EStop = 2,
}

assert_eq_size!(OperatingMode, u8);

/// What happened during one `run_fsm` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Active state ran and stays.
    Steady,
    /// Handoff started or continued but is not complete.
    TransitionPending { from: StateName, to: StateName },
    /// Handoff completed; `to` has been entered.
    Transitioned { from: StateName, to: StateName },
    /// Handoff exceeded its cycle budget; the stall policy was applied.
    Stalled { from: StateName, to: StateName },
    /// PASSIVE was forced.
    EStopped { from: StateName },
}

/// Orchestrator counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FsmStats {
    pub cycles: u64,
    pub transitions: u64,
    pub stalls: u64,
    pub estops: u64,
    /// Legs whose desired foot position was clamped (summed over cycles).
    pub foot_clamps: u64,
    /// Legs whose feed-forward force was clamped (summed over cycles).
    pub force_clamps: u64,
}

/// Static dispatch over the closed state set.
macro_rules! dispatch {
    ($machine:expr, $name:expr, |$state:ident| $body:expr) => {{
        let name: StateName = $name;
        match name {
            // `Invalid` is never active; see `complete_handoff`.
            StateName::Passive | StateName::Invalid => {
                let $state = &mut $machine.passive;
                $body
            }
            StateName::StandUp => {
                let $state = &mut $machine.stand_up;
                $body
            }
            StateName::BalanceStand => {
                let $state = &mut $machine.balance_stand;
                $body
            }
            StateName::RecoveryStand => {
                let $state = &mut $machine.recovery_stand;
                $body
            }
            StateName::SquatDown => {
                let $state = &mut $machine.squat_down;
                $body
            }
        }
    }};
}

/// The control FSM.
#[derive(Debug, Clone)]
pub struct StateMachine {
    passive: PassiveState,
    stand_up: StandUpState,
    balance_stand: BalanceStandState,
    recovery_stand: RecoveryStandState,
    squat_down: SquatDownState,

    current: StateName,
    target: StateName,
    mode: OperatingMode,
    /// Cycles the current handoff has stayed incomplete.
    handoff_cycles: u32,
    initialized: bool,
    estop_requested: bool,
    /// Set by every emergency stop; cleared once the operator selects `Passive`.
    estop_latched: bool,
    /// Raw operator mode whose handoff was abandoned under `Hold`.
    held_mode: Option<u8>,

    initial_state: StateName,
    stall_cycles: u32,
    stall_policy: StallPolicy,
    gate: SafetyGate,

    stats: FsmStats,
    last_fault: Option<FsmFault>,
}

impl StateMachine {
    /// Construct every state. Nothing is entered until `initialize`.
    pub fn new(config: &FsmConfig) -> Self {
        let initial_state = match config.controller.initial_state {
            StateName::Invalid => StateName::Passive,
            other => other,
        };
        Self {
            passive: PassiveState::new(),
            stand_up: StandUpState::new(config.stand_up),
            balance_stand: BalanceStandState::new(config.stand_up),
            recovery_stand: RecoveryStandState::new(config.recovery),
            squat_down: SquatDownState::new(config.stand_up, config.squat_down),
            current: initial_state,
            target: initial_state,
            mode: OperatingMode::Normal,
            handoff_cycles: 0,
            initialized: false,
            estop_requested: false,
            estop_latched: false,
            held_mode: None,
            initial_state,
            stall_cycles: config.controller.transition_stall_cycles,
            stall_policy: config.controller.stall_policy,
            gate: SafetyGate::new(config.safety),
            stats: FsmStats::default(),
            last_fault: None,
        }
    }

    /// Enter the configured initial state.
    ///
    /// Called lazily by the first `run_fsm`; calling it again re-enters the
    /// initial state from scratch.
    pub fn initialize(&mut self, ctx: &mut ControlContext) {
        self.current = self.initial_state;
        self.target = self.initial_state;
        self.mode = OperatingMode::Normal;
        self.handoff_cycles = 0;
        self.estop_latched = false;
        self.held_mode = None;
        dispatch!(self, self.current, |s| s.on_enter(ctx));
        self.initialized = true;
        info!(
            "[CONTROL FSM] initialized in {} ({})",
            self.current,
            ctx.robot_type()
        );
    }

    /// Execute exactly one control cycle.
    pub fn run_fsm(&mut self, ctx: &mut ControlContext) -> CycleOutcome {
        if !self.initialized {
            self.initialize(ctx);
        }
        self.stats.cycles += 1;

        let checks = self.safety_checks();
        if self.estop_requested {
            self.estop_requested = false;
            self.mode = OperatingMode::EStop;
        } else if checks.requires_safe_orientation() && !self.gate.orientation_ok(&ctx.body) {
            self.record(FsmFault::UnsafeOrientation {
                state: self.current,
                roll: ctx.body.roll(),
                pitch: ctx.body.pitch(),
            });
            self.mode = OperatingMode::EStop;
        }

        match self.mode {
            OperatingMode::Normal => self.step_normal(ctx, checks),
            OperatingMode::Transitioning => self.step_transition(ctx),
            OperatingMode::EStop => self.step_estop(ctx),
        }
    }

    /// Force PASSIVE on the next cycle.
    #[inline]
    pub fn request_estop(&mut self) {
        self.estop_requested = true;
    }

    /// `true` from an emergency stop until the operator selects `Passive`.
    #[inline]
    pub const fn estop_latched(&self) -> bool {
        self.estop_latched
    }

    #[inline]
    pub const fn current_state(&self) -> StateName {
        self.current
    }

    /// Destination of the handoff in progress, if any.
    #[inline]
    pub fn pending_target(&self) -> Option<StateName> {
        (self.mode == OperatingMode::Transitioning).then_some(self.target)
    }

    #[inline]
    pub const fn operating_mode(&self) -> OperatingMode {
        self.mode
    }

    #[inline]
    pub const fn stats(&self) -> &FsmStats {
        &self.stats
    }

    /// Last orchestrator-level fault (stall, orientation).
    #[inline]
    pub const fn last_fault(&self) -> Option<FsmFault> {
        self.last_fault
    }

    #[inline]
    pub const fn gate(&self) -> &SafetyGate {
        &self.gate
    }

    /// Safety checks declared by the active state.
    pub fn safety_checks(&self) -> SafetyChecks {
        self.core(self.current).safety_checks()
    }

    /// Bookkeeping of any state, active or not.
    pub fn core(&self, name: StateName) -> &StateCore {
        match name {
            StateName::Passive | StateName::Invalid => self.passive.core(),
            StateName::StandUp => self.stand_up.core(),
            StateName::BalanceStand => self.balance_stand.core(),
            StateName::RecoveryStand => self.recovery_stand.core(),
            StateName::SquatDown => self.squat_down.core(),
        }
    }

    #[inline]
    pub const fn stand_up(&self) -> &StandUpState {
        &self.stand_up
    }

    #[inline]
    pub const fn balance_stand(&self) -> &BalanceStandState {
        &self.balance_stand
    }

    #[inline]
    pub const fn squat_down(&self) -> &SquatDownState {
        &self.squat_down
    }

    #[inline]
    pub const fn recovery_stand(&self) -> &RecoveryStandState {
        &self.recovery_stand
    }

    // ─── Modes ──────────────────────────────────────────────────────

    fn step_normal(&mut self, ctx: &mut ControlContext, checks: SafetyChecks) -> CycleOutcome {
        dispatch!(self, self.current, |s| s.run(ctx));
        self.post_control(ctx, checks);

        self.release_holds(ctx);
        let current = self.current;
        let next = dispatch!(self, current, |s| s.check_transition(ctx));
        if next == current {
            return CycleOutcome::Steady;
        }
        if self.estop_latched || self.held_mode.is_some() {
            dispatch!(self, current, |s| s.core_mut().next_state = current);
            return CycleOutcome::Steady;
        }

        info!("[CONTROL FSM] transition requested: {} -> {next}", self.current);
        self.target = next;
        self.mode = OperatingMode::Transitioning;
        self.handoff_cycles = 0;
        self.step_transition(ctx)
    }

    fn step_transition(&mut self, ctx: &mut ControlContext) -> CycleOutcome {
        let (from, to) = (self.current, self.target);
        let data = dispatch!(self, from, |s| s.transition(ctx));
        if data.done {
            self.complete_handoff(ctx, to);
            return CycleOutcome::Transitioned { from, to };
        }

        self.handoff_cycles = self.handoff_cycles.saturating_add(1);
        if self.handoff_cycles <= self.stall_cycles {
            return CycleOutcome::TransitionPending { from, to };
        }

        self.stats.stalls += 1;
        self.record(FsmFault::TransitionStall {
            from,
            to,
            cycles: self.handoff_cycles,
        });
        match self.stall_policy {
            StallPolicy::Hold => {
                warn!("[CONTROL FSM] abandoning handoff, holding {from}");
                dispatch!(self, from, |s| s.core_mut().next_state = from);
                self.target = from;
                self.mode = OperatingMode::Normal;
                self.handoff_cycles = 0;
                self.held_mode = Some(ctx.params.control_mode);
            }
            StallPolicy::ForcePassive => {
                self.step_estop(ctx);
            }
        }
        CycleOutcome::Stalled { from, to }
    }

    fn step_estop(&mut self, ctx: &mut ControlContext) -> CycleOutcome {
        let from = self.current;
        self.stats.estops += 1;
        warn!("[CONTROL FSM] emergency stop in {from}, forcing PASSIVE");

        dispatch!(self, from, |s| s.on_exit(ctx));
        self.current = StateName::Passive;
        self.target = StateName::Passive;
        self.passive.on_enter(ctx);
        self.passive.run(ctx);
        self.mode = OperatingMode::Normal;
        self.handoff_cycles = 0;
        self.estop_latched = true;
        self.held_mode = None;
        CycleOutcome::EStopped { from }
    }

    /// Drop the estop latch and the held handoff once the operator has
    /// acknowledged them.
    fn release_holds(&mut self, ctx: &ControlContext) {
        if self.estop_latched && ctx.params.mode() == Some(ControlMode::Passive) {
            self.estop_latched = false;
            info!("[CONTROL FSM] emergency stop released by operator");
        }
        if self.held_mode.is_some_and(|raw| raw != ctx.params.control_mode) {
            self.held_mode = None;
        }
    }

    fn complete_handoff(&mut self, ctx: &mut ControlContext, to: StateName) {
        let from = self.current;
        // No state accepts `Invalid`; land in PASSIVE if one ever does.
        let to = match to {
            StateName::Invalid => StateName::Passive,
            other => other,
        };
        dispatch!(self, from, |s| s.on_exit(ctx));
        self.current = to;
        self.target = to;
        dispatch!(self, to, |s| s.on_enter(ctx));
        self.mode = OperatingMode::Normal;
        self.handoff_cycles = 0;
        self.stats.transitions += 1;
        info!("[CONTROL FSM] {from} -> {to}");
    }

    fn post_control(&mut self, ctx: &mut ControlContext, checks: SafetyChecks) {
        if checks.requires_desired_foot_check() {
            self.stats.foot_clamps += u64::from(self.gate.clamp_desired_foot(&mut ctx.legs));
        }
        if checks.requires_force_feed_forward_check() {
            self.stats.force_clamps +=
                u64::from(self.gate.clamp_force_feed_forward(&mut ctx.legs));
        }
    }

    fn record(&mut self, fault: FsmFault) {
        error!("[CONTROL FSM] {fault}");
        self.last_fault = Some(fault);
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
