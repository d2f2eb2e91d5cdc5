//! Operator mode script.
//!
//! Stands in for the operator interface when running the bootstrap
//! harness: a fixed-capacity list of `(cycle, mode)` steps written into
//! `ControlParameters::control_mode` as the cycle counter passes them.
//!
//! Syntax: comma-separated `<mode>@<cycle>`, where `<mode>` is a mode name
//! (`stand_up`, `balance_stand`, ...) or a raw `u8`.
//!
//! ```text
//! stand_up@0,balance_stand@600,squat_down@1200,passive@2000
//! ```

use std::str::FromStr;

use heapless::Vec;
use legged_common::fsm::ControlMode;
use thiserror::Error;

/// Maximum number of steps in one script.
pub const MAX_SCRIPT_STEPS: usize = 32;

/// One scripted mode change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeStep {
    /// Cycle at which the mode is written.
    pub at_cycle: u64,
    /// Raw operator mode; may be outside the enumeration on purpose.
    pub mode: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScriptError {
    #[error("malformed mode script entry '{0}': expected <mode>@<cycle>")]
    Malformed(String),
    #[error("unknown mode '{0}'")]
    UnknownMode(String),
    #[error("invalid cycle '{0}'")]
    InvalidCycle(String),
    #[error("step at cycle {0} is earlier than the previous step")]
    OutOfOrder(u64),
    #[error("mode script exceeds {max} steps")]
    TooLong { max: usize },
}

/// Parsed mode script with a replay cursor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModeScript {
    steps: Vec<ModeStep, MAX_SCRIPT_STEPS>,
    cursor: usize,
}

impl ModeScript {
    pub fn steps(&self) -> &[ModeStep] {
        &self.steps
    }

    #[inline]
    pub fn is_finished(&self) -> bool {
        self.cursor >= self.steps.len()
    }

    /// Mode to write at `cycle`, if a step became due since the last poll.
    ///
    /// When several steps are due at once only the latest one is returned.
    pub fn poll(&mut self, cycle: u64) -> Option<u8> {
        let mut due = None;
        while let Some(step) = self.steps.get(self.cursor) {
            if step.at_cycle > cycle {
                break;
            }
            due = Some(step.mode);
            self.cursor += 1;
        }
        due
    }

    /// Cycle of the last step (0 for an empty script).
    pub fn last_cycle(&self) -> u64 {
        self.steps.last().map_or(0, |s| s.at_cycle)
    }
}

impl FromStr for ModeScript {
    type Err = ScriptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut script = Self::default();
        for entry in s.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let step = parse_step(entry)?;
            if let Some(prev) = script.steps.last() {
                if step.at_cycle < prev.at_cycle {
                    return Err(ScriptError::OutOfOrder(step.at_cycle));
                }
            }
            script
                .steps
                .push(step)
                .map_err(|_| ScriptError::TooLong {
                    max: MAX_SCRIPT_STEPS,
                })?;
        }
        Ok(script)
    }
}

fn parse_step(entry: &str) -> Result<ModeStep, ScriptError> {
    let (mode, cycle) = entry
        .split_once('@')
        .ok_or_else(|| ScriptError::Malformed(entry.to_string()))?;
    let (mode, cycle) = (mode.trim(), cycle.trim());

    let mode = match ControlMode::from_name(mode) {
        Some(m) => m as u8,
        None => mode
            .parse::<u8>()
            .map_err(|_| ScriptError::UnknownMode(mode.to_string()))?,
    };
    let at_cycle = cycle
        .parse::<u64>()
        .map_err(|_| ScriptError::InvalidCycle(cycle.to_string()))?;
    Ok(ModeStep { at_cycle, mode })
}

// ─── Tests ──────────────────────────────────────────────────────────
