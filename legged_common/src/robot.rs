//! Robot variant selection.
//!
//! The variant is read once from the robot-model provider at startup and
//! selects the physical tuning profile for the lifetime of the process.

use serde::{Deserialize, Serialize};

/// Closed set of supported robot variants.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum RobotType {
    /// MIT Mini Cheetah.
    #[default]
    MiniCheetah = 0,
    /// MIT Cheetah 3.
    #[serde(rename = "cheetah_3")]
    Cheetah3 = 1,
    /// MILAB quadruped (live-tuned stand gains, downward feed-forward).
    Milab = 2,
}

impl RobotType {
    /// All variants, in declaration order.
    pub const ALL: [Self; 3] = [Self::MiniCheetah, Self::Cheetah3, Self::Milab];

    /// Convert from raw `u8`. Returns `None` for invalid values.
    #[inline]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::MiniCheetah),
            1 => Some(Self::Cheetah3),
            2 => Some(Self::Milab),
            _ => None,
        }
    }

    /// Config-table key for this variant.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::MiniCheetah => "mini_cheetah",
            Self::Cheetah3 => "cheetah_3",
            Self::Milab => "milab",
        }
    }
}

impl std::fmt::Display for RobotType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RobotType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| format!("unknown robot type '{s}' (expected mini_cheetah, cheetah_3 or milab)"))
    }
}
