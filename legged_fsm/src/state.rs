//! State module root.
//!
//! The closed set of FSM states, their shared contract, and the
//! orchestrator that dispatches between them by [`StateName`] tag.
//!
//! [`StateName`]: legged_common::fsm::StateName

pub mod balance_stand;
pub mod contract;
pub mod machine;
pub mod passive;
pub mod recovery_stand;
pub mod squat_down;
pub mod stand_up;

pub use contract::{FsmState, StateCore};
