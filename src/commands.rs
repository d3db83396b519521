use std::sync::Mutex;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::*;
use crate::prediction::{self, MarkedDates};
use crate::settings::{ConfigError, TrackerSettings};

#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("invalid date: {0}")]
    InvalidDate(#[from] chrono::ParseError),
    #[error("invalid month {year}-{month:02}")]
    InvalidMonth { year: i32, month: u32 },
    #[error("settings rejected: {0}")]
    Config(#[from] ConfigError),
    #[error("session state is poisoned")]
    Poisoned,
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Everything the user has entered so far, plus the calendar mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub config: CycleConfig,
    pub mode: CalendarMode,
}

impl Session {
    fn fresh(settings: &TrackerSettings) -> Self {
        Self {
            config: CycleConfig::new(settings.default_period_length),
            mode: CalendarMode::Tracking,
        }
    }
}

/// Local calendar day from the wall clock.
pub fn local_today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

/// App state shared by the presentation layer. The session is swapped for a
/// newly built value on every command and never edited in place.
pub struct AppState {
    settings: TrackerSettings,
    session: Mutex<Session>,
    clock: fn() -> NaiveDate,
}

impl AppState {
    pub fn new(settings: TrackerSettings) -> Result<Self, CommandError> {
        settings.validate()?;
        Ok(Self {
            session: Mutex::new(Session::fresh(&settings)),
            settings,
            clock: local_today,
        })
    }

    /// Replace the wall clock, e.g. with a fixed day.
    pub fn with_clock(self, clock: fn() -> NaiveDate) -> Self {
        Self { clock, ..self }
    }

    pub fn settings(&self) -> &TrackerSettings {
        &self.settings
    }

    fn today(&self) -> NaiveDate {
        (self.clock)()
    }

    fn snapshot(&self) -> Result<Session, CommandError> {
        let session = self.session.lock().map_err(|_| CommandError::Poisoned)?;
        Ok(session.clone())
    }

    fn update(&self, change: impl FnOnce(Session) -> Session) -> Result<Session, CommandError> {
        let mut session = self.session.lock().map_err(|_| CommandError::Poisoned)?;
        let next = change(session.clone());
        *session = next.clone();
        Ok(next)
    }
}

impl Default for AppState {
    fn default() -> Self {
        let settings = TrackerSettings::default();
        Self {
            session: Mutex::new(Session::fresh(&settings)),
            settings,
            clock: local_today,
        }
    }
}

fn parse_date(date: &str) -> Result<NaiveDate, CommandError> {
    Ok(NaiveDate::parse_from_str(date, "%Y-%m-%d")?)
}

pub fn set_period_start(date: &str, state: &AppState) -> Result<Session, CommandError> {
    let date = parse_date(date)?;
    let session = state.update(|s| Session {
        config: s.config.with_anchor_date(date),
        ..s
    })?;
    tracing::info!(%date, "period start set");
    Ok(session)
}

/// Negative lengths clamp to zero and lengths past the cycle clamp to the
/// cycle length.
pub fn set_period_length(days: i64, state: &AppState) -> Result<Session, CommandError> {
    let cycle_length = i64::from(state.settings.cycle_length.get());
    if days < 0 {
        tracing::warn!(days, "negative period length clamped to zero");
    } else if days > cycle_length {
        tracing::warn!(days, cycle_length, "period length clamped to cycle length");
    }
    let days = days.min(cycle_length);
    let session = state.update(|s| Session {
        config: s.config.with_period_length(days),
        ..s
    })?;
    tracing::info!(period_length = session.config.period_length, "period length set");
    Ok(session)
}

/// A calendar tap. In tracking mode it moves the period start, in edit mode
/// it toggles the day in the custom selection.
pub fn tap_day(date: &str, state: &AppState) -> Result<Session, CommandError> {
    let date = parse_date(date)?;
    let session = state.update(|s| match s.mode {
        CalendarMode::Tracking => Session {
            config: s.config.with_anchor_date(date),
            ..s
        },
        CalendarMode::Editing => Session {
            config: s.config.toggle_custom_day(date),
            ..s
        },
    })?;
    tracing::debug!(%date, mode = ?session.mode, "day tapped");
    Ok(session)
}

/// Enter or leave edit mode and return the new mode.
pub fn toggle_edit_mode(state: &AppState) -> Result<CalendarMode, CommandError> {
    let session = state.update(|s| match s.mode {
        CalendarMode::Tracking => Session {
            config: s.config.seed_custom_days(),
            mode: CalendarMode::Editing,
        },
        CalendarMode::Editing => Session {
            config: s.config.commit_custom_days(),
            mode: CalendarMode::Tracking,
        },
    })?;
    tracing::info!(
        mode = ?session.mode,
        anchor = ?session.config.anchor_date,
        period_length = session.config.period_length,
        "edit mode toggled"
    );
    Ok(session.mode)
}

pub fn inspect_day(date: &str, state: &AppState) -> Result<DayInfo, CommandError> {
    let date = parse_date(date)?;
    let session = state.snapshot()?;
    Ok(prediction::day_info(
        &session.config,
        &state.settings,
        session.mode,
        date,
        state.today(),
    ))
}

pub fn get_dashboard(state: &AppState) -> Result<Dashboard, CommandError> {
    let session = state.snapshot()?;
    Ok(prediction::dashboard(
        &session.config,
        &state.settings,
        state.today(),
    ))
}

pub fn get_month(year: i32, month: u32, state: &AppState) -> Result<MonthData, CommandError> {
    let session = state.snapshot()?;
    prediction::month_view(
        &session.config,
        &state.settings,
        session.mode,
        year,
        month,
        state.today(),
    )
    .ok_or(CommandError::InvalidMonth { year, month })
}

pub fn get_marked_dates(state: &AppState) -> Result<MarkedDates, CommandError> {
    let session = state.snapshot()?;
    Ok(prediction::marked_dates(
        &session.config,
        &state.settings,
        session.mode,
    ))
}

pub fn get_session(state: &AppState) -> Result<Session, CommandError> {
    state.snapshot()
}

pub fn export_data(state: &AppState) -> Result<String, CommandError> {
    let session = state.snapshot()?;
    Ok(serde_json::to_string_pretty(&session)?)
}

/// Back to the start-up state.
pub fn reset(state: &AppState) -> Result<Session, CommandError> {
    let session = state.update(|_| Session::fresh(&state.settings))?;
    tracing::info!("session reset");
    Ok(session)
}
