use std::collections::{BTreeMap, BTreeSet};
use std::num::NonZeroU32;

use chrono::{Datelike, Duration, NaiveDate};

use crate::models::{
    CalendarMode, CycleConfig, Dashboard, DayInfo, MarkKind, MonthData, OvulationWindow, PhaseName,
};
use crate::phases;
use crate::settings::{OvulationOffset, TrackerSettings};

pub type MarkedDates = BTreeMap<NaiveDate, MarkKind>;

/// Whole calendar days from `earlier` to `later`, negative if `later` comes first.
pub fn days_between(later: NaiveDate, earlier: NaiveDate) -> i64 {
    (later - earlier).num_days()
}

fn shift(date: NaiveDate, days: i64) -> Option<NaiveDate> {
    date.checked_add_signed(Duration::days(days))
}

/// 1-based position of `query` within the repeating cycle that starts at `anchor`.
/// Days before the anchor continue the same grid backwards, so the day before
/// the anchor is the last day of a cycle.
///
/// Exactly `n` whole cycles before the anchor is day 1, not day `cycle_length`
/// as the `L - (|diff| mod L)` reading would give; that reading also puts the
/// day before the anchor on `L - 1`.
pub fn cycle_day_number(anchor: NaiveDate, cycle_length: NonZeroU32, query: NaiveDate) -> u32 {
    let len = i64::from(cycle_length.get());
    // rem_euclid lands in 0..len and len came from a u32
    (days_between(query, anchor).rem_euclid(len) + 1) as u32
}

/// First day of the cycle that contains `today`.
pub fn current_cycle_start(
    anchor: NaiveDate,
    cycle_length: NonZeroU32,
    today: NaiveDate,
) -> NaiveDate {
    let len = i64::from(cycle_length.get());
    let cycles = days_between(today, anchor).div_euclid(len);
    shift(anchor, cycles * len).unwrap_or(anchor)
}

pub fn days_until_next_period(
    anchor: Option<NaiveDate>,
    cycle_length: NonZeroU32,
    today: NaiveDate,
) -> Option<u32> {
    let anchor = anchor?;
    Some(cycle_length.get() - cycle_day_number(anchor, cycle_length, today))
}

/// `today` plus the days left in the current cycle. Zero days left means
/// today is the last day before the cycle rolls over.
pub fn next_period_date(
    anchor: Option<NaiveDate>,
    cycle_length: NonZeroU32,
    today: NaiveDate,
) -> Option<NaiveDate> {
    let days = days_until_next_period(anchor, cycle_length, today)?;
    shift(today, i64::from(days))
}

pub fn ovulation_window(
    anchor: Option<NaiveDate>,
    period_length: u32,
    offset: OvulationOffset,
    window_days: u32,
) -> Option<OvulationWindow> {
    let start = shift(anchor?, i64::from(offset.resolve(period_length)))?;
    let end = shift(start, i64::from(window_days.saturating_sub(1)))?;
    Some(OvulationWindow { start, end })
}

/// Record a mark, keeping whichever kind has the higher precedence.
fn mark(marks: &mut MarkedDates, date: NaiveDate, kind: MarkKind) {
    marks
        .entry(date)
        .and_modify(|existing| *existing = (*existing).max(kind))
        .or_insert(kind);
}

fn mark_run(marks: &mut MarkedDates, start: NaiveDate, days: u32, kind: MarkKind) {
    for date in start.iter_days().take(days as usize) {
        mark(marks, date, kind);
    }
}

/// Logged period, predicted periods for the next `horizon_cycles` cycles and
/// the ovulation window of the logged cycle.
pub fn build_marked_dates(
    anchor: Option<NaiveDate>,
    period_length: u32,
    settings: &TrackerSettings,
) -> MarkedDates {
    let mut marks = MarkedDates::new();
    let Some(anchor) = anchor else {
        return marks;
    };

    let len = i64::from(settings.cycle_length.get());
    mark_run(&mut marks, anchor, period_length, MarkKind::CurrentPeriod);

    for cycle in 1..=i64::from(settings.horizon_cycles) {
        let Some(start) = shift(anchor, cycle * len) else {
            break;
        };
        mark_run(&mut marks, start, period_length, MarkKind::PredictedPeriod);
    }

    if let Some(window) = ovulation_window(
        Some(anchor),
        period_length,
        settings.ovulation_offset,
        settings.ovulation_window_days,
    ) {
        for date in window.days() {
            mark(&mut marks, date, MarkKind::Ovulation);
        }
    }

    tracing::debug!(%anchor, period_length, entries = marks.len(), "built marked dates");
    marks
}

/// Edit-mode marks: exactly the selected days, no predictions.
pub fn edit_mode_marks(custom_period_days: &BTreeSet<NaiveDate>) -> MarkedDates {
    custom_period_days
        .iter()
        .map(|&date| (date, MarkKind::CurrentPeriod))
        .collect()
}

pub fn marked_dates(
    config: &CycleConfig,
    settings: &TrackerSettings,
    mode: CalendarMode,
) -> MarkedDates {
    match mode {
        CalendarMode::Tracking => {
            build_marked_dates(config.anchor_date, config.period_length, settings)
        }
        CalendarMode::Editing => edit_mode_marks(&config.custom_period_days),
    }
}

fn describe_day(
    config: &CycleConfig,
    settings: &TrackerSettings,
    marks: &MarkedDates,
    date: NaiveDate,
    today: NaiveDate,
) -> DayInfo {
    let cycle_day = config
        .anchor_date
        .map(|anchor| cycle_day_number(anchor, settings.cycle_length, date));
    let phase = cycle_day.map_or(PhaseName::NoData, |day| {
        phases::phase_name(day, config.period_length, &settings.boundaries)
    });

    DayInfo {
        date,
        cycle_day,
        phase,
        mark: marks.get(&date).copied(),
        is_today: date == today,
    }
}

pub fn day_info(
    config: &CycleConfig,
    settings: &TrackerSettings,
    mode: CalendarMode,
    date: NaiveDate,
    today: NaiveDate,
) -> DayInfo {
    let marks = marked_dates(config, settings, mode);
    describe_day(config, settings, &marks, date, today)
}

/// Every day of one calendar month. `None` for an invalid year/month.
pub fn month_view(
    config: &CycleConfig,
    settings: &TrackerSettings,
    mode: CalendarMode,
    year: i32,
    month: u32,
    today: NaiveDate,
) -> Option<MonthData> {
    let first_day = NaiveDate::from_ymd_opt(year, month, 1)?;
    let marks = marked_dates(config, settings, mode);

    let days = first_day
        .iter_days()
        .take_while(|d| d.month() == month)
        .map(|date| describe_day(config, settings, &marks, date, today))
        .collect();

    Some(MonthData {
        year,
        month,
        mode,
        days,
    })
}

pub fn dashboard(config: &CycleConfig, settings: &TrackerSettings, today: NaiveDate) -> Dashboard {
    let cycle_length = settings.cycle_length;
    let anchor = config.anchor_date;

    let cycle_day = anchor.map(|a| cycle_day_number(a, cycle_length, today));
    let phase = phases::classify_phase(cycle_day, config.period_length, &settings.boundaries);

    // The dashboard shows the window of the cycle in progress, not the logged one.
    let window = anchor
        .map(|a| current_cycle_start(a, cycle_length, today))
        .and_then(|start| {
            ovulation_window(
                Some(start),
                config.period_length,
                settings.ovulation_offset,
                settings.ovulation_window_days,
            )
        });

    Dashboard {
        today,
        cycle_day,
        cycle_length: cycle_length.get(),
        phase,
        next_period_date: next_period_date(anchor, cycle_length, today),
        days_until_next_period: days_until_next_period(anchor, cycle_length, today),
        ovulation_window: window,
        ovulation_label: window.map(|w| w.to_string()),
        progress: cycle_day.map_or(0.0, |day| day as f32 / cycle_length.get() as f32),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::DEFAULT_CYCLE_LENGTH;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn len(days: u32) -> NonZeroU32 {
        NonZeroU32::new(days).unwrap()
    }

    fn config(anchor: &str, period_length: u32) -> CycleConfig {
        CycleConfig::new(period_length).with_anchor_date(date(anchor))
    }

    #[test]
    fn cycle_day_scenario() {
        let anchor = date("2024-01-01");
        let l = DEFAULT_CYCLE_LENGTH;
        assert_eq!(cycle_day_number(anchor, l, date("2024-01-01")), 1);
        assert_eq!(cycle_day_number(anchor, l, date("2024-01-06")), 6);
        assert_eq!(cycle_day_number(anchor, l, date("2023-12-31")), 28);
        assert_eq!(cycle_day_number(anchor, l, date("2024-01-29")), 1);
    }

    #[test]
    fn cycle_day_stays_in_range() {
        let anchor = date("2024-06-15");
        for cycle in [1, 2, 7, 28, 35] {
            for diff in -200..200 {
                let query = anchor + Duration::days(diff);
                let day = cycle_day_number(anchor, len(cycle), query);
                assert!((1..=cycle).contains(&day), "day {day} for diff {diff}");
            }
        }
    }

    #[test]
    fn cycle_day_is_periodic() {
        let anchor = date("2023-03-10");
        for cycle in [1, 21, 28, 40] {
            let later = anchor + Duration::days(i64::from(cycle));
            let earlier = anchor - Duration::days(i64::from(cycle));
            assert_eq!(cycle_day_number(anchor, len(cycle), anchor), 1);
            assert_eq!(cycle_day_number(anchor, len(cycle), later), 1);
            assert_eq!(cycle_day_number(anchor, len(cycle), earlier), 1);
        }
    }

    #[test]
    fn one_cycle_later_is_menstrual() {
        let settings = TrackerSettings::default();
        let cfg = config("2024-01-01", 5);
        let info = day_info(
            &cfg,
            &settings,
            CalendarMode::Tracking,
            date("2024-01-29"),
            date("2024-01-29"),
        );
        assert_eq!(info.cycle_day, Some(1));
        assert_eq!(info.phase, PhaseName::Menstrual);
        assert_eq!(info.mark, Some(MarkKind::PredictedPeriod));
        assert!(info.is_today);
    }

    #[test]
    fn current_cycle_start_floors_towards_past() {
        let anchor = date("2024-01-01");
        let l = DEFAULT_CYCLE_LENGTH;
        assert_eq!(current_cycle_start(anchor, l, date("2024-01-28")), anchor);
        assert_eq!(
            current_cycle_start(anchor, l, date("2024-02-05")),
            date("2024-01-29")
        );
        assert_eq!(
            current_cycle_start(anchor, l, date("2023-12-31")),
            date("2023-12-04")
        );
    }

    #[test]
    fn next_period_counts_remaining_days() {
        let anchor = Some(date("2024-01-01"));
        let l = DEFAULT_CYCLE_LENGTH;
        assert_eq!(days_until_next_period(anchor, l, date("2024-01-06")), Some(22));
        assert_eq!(
            next_period_date(anchor, l, date("2024-01-06")),
            Some(date("2024-01-28"))
        );
        // last day of the cycle
        assert_eq!(days_until_next_period(anchor, l, date("2024-01-28")), Some(0));
        assert_eq!(
            next_period_date(anchor, l, date("2024-01-28")),
            Some(date("2024-01-28"))
        );
    }

    #[test]
    fn no_anchor_gives_no_predictions() {
        let settings = TrackerSettings::default();
        let today = date("2024-01-10");
        assert_eq!(next_period_date(None, settings.cycle_length, today), None);
        assert_eq!(
            ovulation_window(None, 5, settings.ovulation_offset, 3),
            None
        );
        assert!(build_marked_dates(None, 5, &settings).is_empty());

        let board = dashboard(&CycleConfig::new(7), &settings, today);
        assert_eq!(board.phase.name, PhaseName::NoData);
        assert_eq!(board.cycle_day, None);
        assert_eq!(board.next_period_date, None);
        assert_eq!(board.ovulation_window, None);
        assert_eq!(board.progress, 0.0);
    }

    #[test]
    fn ovulation_offset_follows_period_length() {
        let anchor = Some(date("2024-01-01"));
        let window = ovulation_window(anchor, 5, OvulationOffset::default(), 3).unwrap();
        assert_eq!(window.start, date("2024-01-11"));
        assert_eq!(window.end, date("2024-01-13"));

        let window = ovulation_window(anchor, 7, OvulationOffset::default(), 3).unwrap();
        assert_eq!(window.start, date("2024-01-13"));

        let fixed = ovulation_window(anchor, 7, OvulationOffset::Fixed { days: 14 }, 3).unwrap();
        assert_eq!(fixed.start, date("2024-01-15"));
        assert_eq!(fixed.end, date("2024-01-17"));
    }

    #[test]
    fn marked_dates_cover_horizon() {
        let settings = TrackerSettings::default();
        let marks = build_marked_dates(Some(date("2024-01-01")), 5, &settings);

        assert_eq!(marks.len(), 5 + 24 * 5 + 3);
        assert_eq!(marks[&date("2024-01-01")], MarkKind::CurrentPeriod);
        assert_eq!(marks[&date("2024-01-05")], MarkKind::CurrentPeriod);
        assert_eq!(marks.get(&date("2024-01-06")), None);
        assert_eq!(marks[&date("2024-01-12")], MarkKind::Ovulation);
        assert_eq!(marks[&date("2024-01-29")], MarkKind::PredictedPeriod);

        let last_predicted = date("2024-01-01") + Duration::days(24 * 28 + 4);
        assert_eq!(marks[&last_predicted], MarkKind::PredictedPeriod);
        assert_eq!(marks.get(&(last_predicted + Duration::days(24))), None);
    }

    #[test]
    fn ovulation_overrides_period() {
        let settings = TrackerSettings {
            ovulation_offset: OvulationOffset::Fixed { days: 3 },
            ..TrackerSettings::default()
        };
        let marks = build_marked_dates(Some(date("2024-01-01")), 5, &settings);
        assert_eq!(marks[&date("2024-01-03")], MarkKind::CurrentPeriod);
        assert_eq!(marks[&date("2024-01-04")], MarkKind::Ovulation);
        assert_eq!(marks[&date("2024-01-05")], MarkKind::Ovulation);
    }

    #[test]
    fn current_period_beats_prediction_on_overlap() {
        let settings = TrackerSettings {
            cycle_length: len(10),
            horizon_cycles: 2,
            ovulation_offset: OvulationOffset::Fixed { days: 40 },
            ..TrackerSettings::default()
        };
        // 12-day period in a 10-day cycle: Jan 11 and 12 are both current and predicted
        let marks = build_marked_dates(Some(date("2024-01-01")), 12, &settings);
        assert_eq!(marks[&date("2024-01-11")], MarkKind::CurrentPeriod);
        assert_eq!(marks[&date("2024-01-12")], MarkKind::CurrentPeriod);
        assert_eq!(marks[&date("2024-01-13")], MarkKind::PredictedPeriod);
    }

    #[test]
    fn marked_dates_are_repeatable() {
        let settings = TrackerSettings::default();
        let first = build_marked_dates(Some(date("2024-02-10")), 6, &settings);
        let second = build_marked_dates(Some(date("2024-02-10")), 6, &settings);
        assert_eq!(first, second);
    }

    #[test]
    fn edit_mode_marks_only_selected_days() {
        let settings = TrackerSettings::default();
        let cfg = config("2024-01-01", 7)
            .toggle_custom_day(date("2024-03-02"))
            .toggle_custom_day(date("2024-03-05"))
            .toggle_custom_day(date("2024-03-03"));

        let marks = marked_dates(&cfg, &settings, CalendarMode::Editing);
        assert_eq!(marks.len(), 3);
        for day in ["2024-03-02", "2024-03-03", "2024-03-05"] {
            assert_eq!(marks[&date(day)], MarkKind::CurrentPeriod);
        }
        assert_eq!(marks.get(&date("2024-01-01")), None);
    }

    #[test]
    fn tracking_mode_ignores_custom_days() {
        let settings = TrackerSettings::default();
        let cfg = config("2024-01-01", 5).toggle_custom_day(date("2024-03-20"));
        let marks = marked_dates(&cfg, &settings, CalendarMode::Tracking);
        assert_eq!(marks.get(&date("2024-03-20")), None);
    }

    #[test]
    fn month_view_lists_every_day() {
        let settings = TrackerSettings::default();
        let cfg = config("2024-02-01", 5);
        let month = month_view(
            &cfg,
            &settings,
            CalendarMode::Tracking,
            2024,
            2,
            date("2024-02-14"),
        )
        .unwrap();

        assert_eq!(month.days.len(), 29);
        assert_eq!(month.days[0].mark, Some(MarkKind::CurrentPeriod));
        assert_eq!(month.days[0].phase, PhaseName::Menstrual);
        assert_eq!(month.days[20].phase, PhaseName::Luteal);
        assert_eq!(month.days.iter().filter(|d| d.is_today).count(), 1);
        assert_eq!(month.days[28].mark, Some(MarkKind::PredictedPeriod));
    }

    #[test]
    fn month_view_rejects_bad_month() {
        let settings = TrackerSettings::default();
        let cfg = CycleConfig::new(7);
        assert!(month_view(
            &cfg,
            &settings,
            CalendarMode::Tracking,
            2024,
            13,
            date("2024-01-01")
        )
        .is_none());
    }

    #[test]
    fn dashboard_snapshot() {
        let settings = TrackerSettings::default();
        let cfg = config("2024-01-01", 5);

        let board = dashboard(&cfg, &settings, date("2024-01-06"));
        assert_eq!(board.cycle_day, Some(6));
        assert_eq!(board.phase.name, PhaseName::Follicular);
        assert_eq!(board.days_until_next_period, Some(22));
        assert_eq!(
            board.ovulation_label.as_deref(),
            Some("January 11 - January 13, 2024")
        );
        assert!((board.progress - 6.0 / 28.0).abs() < f32::EPSILON);

        // second cycle: window moves with the cycle in progress
        let board = dashboard(&cfg, &settings, date("2024-02-05"));
        assert_eq!(board.cycle_day, Some(8));
        let window = board.ovulation_window.unwrap();
        assert_eq!(window.start, date("2024-02-08"));
        assert_eq!(window.end, date("2024-02-10"));
    }
}
