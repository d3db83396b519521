use std::num::NonZeroU32;

use serde::{Deserialize, Serialize};

pub const DEFAULT_CYCLE_LENGTH: NonZeroU32 = match NonZeroU32::new(28) {
    Some(n) => n,
    None => unreachable!(),
};
pub const DEFAULT_PERIOD_LENGTH: u32 = 7;
pub const DEFAULT_HORIZON_CYCLES: u32 = 24;
pub const DEFAULT_OVULATION_WINDOW_DAYS: u32 = 3;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("ovulation window must cover at least one day")]
    ZeroOvulationWindow,
    #[error("default period length {period} exceeds cycle length {cycle}")]
    PeriodLongerThanCycle { period: u32, cycle: u32 },
    #[error("phase boundaries out of order: follicular ends day {follicular}, ovulatory ends day {ovulatory}, cycle is {cycle} days")]
    Boundaries {
        follicular: u32,
        ovulatory: u32,
        cycle: u32,
    },
    #[error("invalid settings: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Where the ovulation window starts, counted in days from the period start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OvulationOffset {
    /// `days` after the last period day, i.e. `period_length + days`.
    AfterPeriod { days: u32 },
    /// A fixed distance regardless of period length.
    Fixed { days: u32 },
}

impl OvulationOffset {
    pub fn resolve(self, period_length: u32) -> u32 {
        match self {
            Self::AfterPeriod { days } => period_length.saturating_add(days),
            Self::Fixed { days } => days,
        }
    }
}

impl Default for OvulationOffset {
    fn default() -> Self {
        Self::AfterPeriod { days: 5 }
    }
}

/// Inclusive upper cycle days of the phase ladder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhaseBoundaries {
    pub follicular_last_day: u32,
    pub ovulatory_last_day: u32,
    pub ovulation_day: u32,
}

impl Default for PhaseBoundaries {
    fn default() -> Self {
        Self {
            follicular_last_day: 14,
            ovulatory_last_day: 17,
            ovulation_day: 14,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerSettings {
    pub cycle_length: NonZeroU32,
    pub default_period_length: u32,
    pub horizon_cycles: u32,
    pub ovulation_window_days: u32,
    pub ovulation_offset: OvulationOffset,
    pub boundaries: PhaseBoundaries,
}

impl Default for TrackerSettings {
    fn default() -> Self {
        Self {
            cycle_length: DEFAULT_CYCLE_LENGTH,
            default_period_length: DEFAULT_PERIOD_LENGTH,
            horizon_cycles: DEFAULT_HORIZON_CYCLES,
            ovulation_window_days: DEFAULT_OVULATION_WINDOW_DAYS,
            ovulation_offset: OvulationOffset::default(),
            boundaries: PhaseBoundaries::default(),
        }
    }
}

impl TrackerSettings {
    /// Parse settings from JSON. Missing fields fall back to the defaults and
    /// a zero `cycle_length` fails to deserialize. The result is validated
    /// before it is returned.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let settings: Self = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let cycle = self.cycle_length.get();

        if self.ovulation_window_days == 0 {
            return Err(ConfigError::ZeroOvulationWindow);
        }
        if self.default_period_length > cycle {
            return Err(ConfigError::PeriodLongerThanCycle {
                period: self.default_period_length,
                cycle,
            });
        }

        let b = &self.boundaries;
        if b.follicular_last_day > b.ovulatory_last_day || b.ovulatory_last_day > cycle {
            return Err(ConfigError::Boundaries {
                follicular: b.follicular_last_day,
                ovulatory: b.ovulatory_last_day,
                cycle,
            });
        }

        Ok(())
    }
}
