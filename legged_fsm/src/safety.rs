//! Safety module root.
//!
//! Declarative per-state safety checks are evaluated here, around the
//! active state's `run()`: orientation before control, foot-target and
//! feed-forward clamps after it.

pub mod gate;

pub use gate::SafetyGate;
