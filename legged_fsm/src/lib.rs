//! # Legged FSM Library
//!
//! Finite-state control core of a legged-robot motion controller. A cyclic
//! state machine selects the robot's high-level behavior (passive, stand
//! up, balance stand, recovery stand, squat down) and, inside the active
//! state, computes per-cycle leg targets.
//!
//! ## Layers
//!
//! 1. **ControlContext**: measured leg data, command buffers, live
//!    parameters; borrowed by states, never owned.
//! 2. **States**: one struct per mode behind the [`state::FsmState`]
//!    contract (`on_enter`, `run`, `check_transition`, `transition`, `on_exit`).
//! 3. **StateMachine**: owns every state, dispatches by [`StateName`]
//!    tag, performs safety gating and the enter/exit handoff.
//! 4. **CycleRunner**: paces the machine at `controller_dt` against a
//!    simulated leg plant (bootstrap harness, not part of the core).
//!
//! ## Zero-Allocation Cycle
//!
//! All states, snapshots and transition records are constructed once at
//! startup. `StateMachine::run_fsm` performs no heap allocation, no I/O
//! and never blocks.
//!
//! [`StateName`]: legged_common::fsm::StateName

#![deny(clippy::disallowed_types)]

pub mod config;
pub mod context;
pub mod cycle;
pub mod error;
pub mod safety;
pub mod script;
pub mod sim;
pub mod state;
pub mod trajectory;
