use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::{CyclePrediction, UnknownVariant};

/// Predicted phase used for calendar colouring.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PredictedPhase {
    Menstrual,
    Ovulation,
    Fertile,
}

/// Where today sits relative to the next predicted period.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum CurrentPhase {
    FertileWindow,
    Luteal,
    Menstrual,
    Follicular,
}

impl CurrentPhase {
    pub const ALL: [CurrentPhase; 4] = [
        CurrentPhase::FertileWindow,
        CurrentPhase::Luteal,
        CurrentPhase::Menstrual,
        CurrentPhase::Follicular,
    ];

    /// Machine name, matches the serialized form.
    pub fn as_str(self) -> &'static str {
        match self {
            CurrentPhase::FertileWindow => "fertile_window",
            CurrentPhase::Luteal => "luteal",
            CurrentPhase::Menstrual => "menstrual",
            CurrentPhase::Follicular => "follicular",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            CurrentPhase::FertileWindow => "High chance of conception during this period",
            CurrentPhase::Luteal => "Your period is approaching soon",
            CurrentPhase::Menstrual => "Your period has started or just ended",
            CurrentPhase::Follicular => "Energy levels typically high during this phase",
        }
    }
}

impl fmt::Display for CurrentPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CurrentPhase::FertileWindow => "Fertile Window",
            CurrentPhase::Luteal => "Luteal Phase",
            CurrentPhase::Menstrual => "Menstrual Phase",
            CurrentPhase::Follicular => "Follicular Phase",
        })
    }
}

// Display is the human label, so parsing is written out here instead of
// going through the models macro.
impl FromStr for CurrentPhase {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase().replace([' ', '-'], "_");
        CurrentPhase::ALL
            .into_iter()
            .find(|p| p.as_str() == needle)
            .ok_or_else(|| UnknownVariant {
                kind: "phase",
                value: s.to_string(),
            })
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct PhaseInfo {
    pub phase: CurrentPhase,
    pub days_until_period: i64,
}

const LUTEAL_THRESHOLD_DAYS: i64 = 7;
const MENSTRUAL_THRESHOLD_DAYS: i64 = 20;

fn within(date: NaiveDate, start: NaiveDate, end: NaiveDate) -> bool {
    date >= start && date <= end
}

/// Predicted phase of a calendar day. Menstrual wins over ovulation, which wins
/// over the rest of the fertile window.
pub fn predicted_phase(prediction: &CyclePrediction, date: NaiveDate) -> Option<PredictedPhase> {
    if within(
        date,
        prediction.predicted_period_start,
        prediction.predicted_period_end,
    ) {
        Some(PredictedPhase::Menstrual)
    } else if date == prediction.ovulation_day {
        Some(PredictedPhase::Ovulation)
    } else if within(
        date,
        prediction.fertile_window_start,
        prediction.fertile_window_end,
    ) {
        Some(PredictedPhase::Fertile)
    } else {
        None
    }
}

pub fn current_phase(prediction: &CyclePrediction, today: NaiveDate) -> PhaseInfo {
    let days_until_period = (prediction.predicted_period_start - today).num_days();
    let phase = if within(
        today,
        prediction.fertile_window_start,
        prediction.fertile_window_end,
    ) {
        CurrentPhase::FertileWindow
    } else if days_until_period <= LUTEAL_THRESHOLD_DAYS {
        CurrentPhase::Luteal
    } else if days_until_period > MENSTRUAL_THRESHOLD_DAYS {
        CurrentPhase::Menstrual
    } else {
        CurrentPhase::Follicular
    };

    PhaseInfo {
        phase,
        days_until_period,
    }
}
