use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// The user's cycle data at one point in time. Every change builds a new
/// value; nothing mutates a config in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleConfig {
    /// First day of the most recently logged period. `None` until one is logged.
    pub anchor_date: Option<NaiveDate>,
    pub period_length: u32,
    #[serde(default)]
    pub custom_period_days: BTreeSet<NaiveDate>,
}

impl CycleConfig {
    pub fn new(period_length: u32) -> Self {
        Self {
            anchor_date: None,
            period_length,
            custom_period_days: BTreeSet::new(),
        }
    }

    pub fn with_anchor_date(self, date: NaiveDate) -> Self {
        Self {
            anchor_date: Some(date),
            ..self
        }
    }

    pub fn clear_anchor(self) -> Self {
        Self {
            anchor_date: None,
            ..self
        }
    }

    /// Negative lengths clamp to zero.
    pub fn with_period_length(self, days: i64) -> Self {
        let period_length = u32::try_from(days.max(0)).unwrap_or(u32::MAX);
        Self {
            period_length,
            ..self
        }
    }

    pub fn toggle_custom_day(self, date: NaiveDate) -> Self {
        let mut custom_period_days = self.custom_period_days;
        if !custom_period_days.remove(&date) {
            custom_period_days.insert(date);
        }
        Self {
            custom_period_days,
            ..self
        }
    }

    /// Pre-fill the custom set from the logged period when entering edit
    /// mode. An existing selection is left alone.
    pub fn seed_custom_days(self) -> Self {
        match self.anchor_date {
            Some(anchor) if self.custom_period_days.is_empty() => {
                let custom_period_days = anchor
                    .iter_days()
                    .take(self.period_length as usize)
                    .collect();
                Self {
                    custom_period_days,
                    ..self
                }
            }
            _ => self,
        }
    }

    /// Fold the custom selection back into anchor and length when leaving
    /// edit mode. An empty selection wipes the logged period.
    pub fn commit_custom_days(self) -> Self {
        match self.custom_period_days.first().copied() {
            Some(first) => {
                let count = u32::try_from(self.custom_period_days.len()).unwrap_or(u32::MAX);
                Self {
                    anchor_date: Some(first),
                    period_length: count,
                    ..self
                }
            }
            None => Self {
                anchor_date: None,
                period_length: 0,
                custom_period_days: BTreeSet::new(),
            },
        }
    }

    pub fn has_data(&self) -> bool {
        self.anchor_date.is_some()
    }
}

/// Which marking rules the calendar uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CalendarMode {
    /// Logged period plus predictions and ovulation.
    #[default]
    Tracking,
    /// Only the hand-picked custom period days.
    Editing,
}

/// How a calendar day is highlighted. Variants are declared in ascending
/// precedence so `Ord` decides which mark wins on a shared date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum MarkKind {
    PredictedPeriod,
    CurrentPeriod,
    Ovulation,
}

impl MarkKind {
    pub fn color_key(self) -> &'static str {
        match self {
            Self::PredictedPeriod => "predictedPeriodDay",
            Self::CurrentPeriod => "periodDay",
            Self::Ovulation => "ovulationDay",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PhaseName {
    Menstrual,
    Follicular,
    Ovulatory,
    Luteal,
    NoData,
}

impl PhaseName {
    pub fn label(self) -> &'static str {
        match self {
            Self::Menstrual => "Menstrual Phase",
            Self::Follicular => "Follicular Phase",
            Self::Ovulatory => "Ovulatory Phase",
            Self::Luteal => "Luteal Phase",
            Self::NoData => "No Cycle Data",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PhaseInfo {
    pub name: PhaseName,
    pub label: &'static str,
    pub color_key: &'static str,
    pub description: &'static str,
    pub tips: &'static [&'static str],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OvulationWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl OvulationWindow {
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let end = self.end;
        self.start.iter_days().take_while(move |d| *d <= end)
    }
}

impl std::fmt::Display for OvulationWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} - {}",
            self.start.format("%B %d"),
            self.end.format("%B %d, %Y")
        )
    }
}

/// Snapshot for the "today" screen.
#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub today: NaiveDate,
    pub cycle_day: Option<u32>,
    pub cycle_length: u32,
    pub phase: PhaseInfo,
    pub next_period_date: Option<NaiveDate>,
    pub days_until_next_period: Option<u32>,
    pub ovulation_window: Option<OvulationWindow>,
    pub ovulation_label: Option<String>,
    /// Fraction of the cycle elapsed, 0.0 with no data.
    pub progress: f32,
}

#[derive(Debug, Clone, Serialize)]
pub struct DayInfo {
    pub date: NaiveDate,
    pub cycle_day: Option<u32>,
    pub phase: PhaseName,
    pub mark: Option<MarkKind>,
    pub is_today: bool,
}

/// Data returned to the frontend for a month view
#[derive(Debug, Clone, Serialize)]
pub struct MonthData {
    pub year: i32,
    pub month: u32,
    pub mode: CalendarMode,
    pub days: Vec<DayInfo>,
}
