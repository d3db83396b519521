use crate::models::{PhaseInfo, PhaseName};
use crate::settings::PhaseBoundaries;

const MENSTRUAL_TIPS: &[&str] = &[
    "Get plenty of rest",
    "Stay hydrated",
    "Consider iron-rich foods",
    "Apply heat to reduce cramping",
];

const FOLLICULAR_TIPS: &[&str] = &[
    "Energy levels typically increase",
    "Good time for starting new projects",
    "Skin typically improves",
    "Consider strength training",
];

const OVULATORY_TIPS: &[&str] = &[
    "Peak fertility window",
    "May experience increased energy",
    "Good time for high-intensity workouts",
    "May notice changes in cervical mucus",
];

const LUTEAL_TIPS: &[&str] = &[
    "May experience PMS symptoms",
    "Focus on self-care",
    "Consider gentle exercise",
    "Healthy fats and complex carbs may help with cravings",
];

const NO_TIPS: &[&str] = &[];

/// Static card content for a phase.
pub fn phase_info(name: PhaseName) -> PhaseInfo {
    let (color_key, description, tips) = match name {
        PhaseName::Menstrual => ("periodDay", "Your period is active.", MENSTRUAL_TIPS),
        PhaseName::Follicular => (
            "sage",
            "Your body is preparing for ovulation.",
            FOLLICULAR_TIPS,
        ),
        PhaseName::Ovulatory => (
            "ovulationDay",
            "You are in your fertility window.",
            OVULATORY_TIPS,
        ),
        PhaseName::Luteal => (
            "terracotta",
            "Your body is preparing for your next period.",
            LUTEAL_TIPS,
        ),
        PhaseName::NoData => (
            "neutral500",
            "Please set your period start date to see cycle information.",
            NO_TIPS,
        ),
    };

    PhaseInfo {
        name,
        label: name.label(),
        color_key,
        description,
        tips,
    }
}

/// Phase for a 1-based cycle day. Rungs are checked top to bottom and the
/// first match wins, so the period always shadows the later phases.
pub fn phase_name(cycle_day: u32, period_length: u32, bounds: &PhaseBoundaries) -> PhaseName {
    if cycle_day <= period_length {
        PhaseName::Menstrual
    } else if cycle_day <= bounds.follicular_last_day {
        PhaseName::Follicular
    } else if cycle_day <= bounds.ovulatory_last_day {
        PhaseName::Ovulatory
    } else {
        PhaseName::Luteal
    }
}

/// Full phase card for a cycle day. `None` means no period has been logged,
/// which yields the no-data card whatever the day number.
pub fn classify_phase(
    cycle_day: Option<u32>,
    period_length: u32,
    bounds: &PhaseBoundaries,
) -> PhaseInfo {
    let Some(day) = cycle_day else {
        return phase_info(PhaseName::NoData);
    };

    let name = phase_name(day, period_length, bounds);
    let mut info = phase_info(name);
    // Only reachable when the follicular phase ends before the ovulation day.
    if name == PhaseName::Ovulatory && day == bounds.ovulation_day {
        info.description = "You are ovulating today!";
    }
    info
}
