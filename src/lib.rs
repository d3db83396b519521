//! Cycle-phase and period prediction for an on-device cycle tracker.
//!
//! [`prediction`] and [`phases`] are pure functions of a [`CycleConfig`],
//! the [`TrackerSettings`] and an explicit `today`. [`commands`] is the
//! boundary a presentation layer drives: it owns the one mutable session and
//! replaces it with a new value on every user action.

pub mod commands;
pub mod models;
pub mod phases;
pub mod prediction;
pub mod settings;

pub use commands::{AppState, CommandError, Session};
pub use models::{
    CalendarMode, CycleConfig, Dashboard, DayInfo, MarkKind, MonthData, OvulationWindow,
    PhaseInfo, PhaseName,
};
pub use prediction::MarkedDates;
pub use settings::{ConfigError, OvulationOffset, PhaseBoundaries, TrackerSettings};
