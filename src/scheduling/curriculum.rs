//! Curriculum tables.
//!
//! A curriculum is the fixed shape of a program: which sessions happen in
//! which week, their type, duration, and time-of-day bucket. Coaching
//! sessions and parent check-ins are interleaved per the table — the week
//! offsets are a business parameter, not a computed spacing.

use super::session::SessionType;
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

/// Preferred time-of-day bucket for a curriculum entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeOfDay {
    Morning,
    Afternoon,
    Evening,
}

impl TimeOfDay {
    /// Default slot start for the bucket.
    #[must_use]
    pub fn default_start(&self) -> NaiveTime {
        match self {
            // Unwraps are on compile-time-constant times.
            Self::Morning => NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            Self::Afternoon => NaiveTime::from_hms_opt(14, 0, 0).unwrap(),
            Self::Evening => NaiveTime::from_hms_opt(17, 30, 0).unwrap(),
        }
    }
}

/// One planned session in a curriculum.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurriculumEntry {
    /// Weeks after program start (0 = the start week).
    pub week_offset: u32,
    pub session_type: SessionType,
    pub duration_minutes: u32,
    pub time_of_day: TimeOfDay,
}

impl CurriculumEntry {
    /// Absolute date of this entry given a program start date.
    #[must_use]
    pub fn date_from(&self, program_start: NaiveDate) -> NaiveDate {
        program_start + chrono::Duration::weeks(self.week_offset as i64)
    }
}

/// An ordered curriculum. Entries carry their own week offsets; order in the
/// list is the sequence-number order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Curriculum {
    pub entries: Vec<CurriculumEntry>,
}

impl Curriculum {
    #[must_use]
    pub fn new(entries: Vec<CurriculumEntry>) -> Self {
        Self { entries }
    }

    /// The standard 12-week reading program: one coaching session per week,
    /// with parent check-ins after weeks 4, 8, and 12.
    #[must_use]
    pub fn standard_12_week() -> Self {
        let mut entries = Vec::new();
        for week in 0..12 {
            entries.push(CurriculumEntry {
                week_offset: week,
                session_type: SessionType::Coaching,
                duration_minutes: 45,
                time_of_day: TimeOfDay::Evening,
            });
            if matches!(week, 3 | 7 | 11) {
                entries.push(CurriculumEntry {
                    week_offset: week,
                    session_type: SessionType::ParentCheckin,
                    duration_minutes: 30,
                    time_of_day: TimeOfDay::Evening,
                });
            }
        }
        Self { entries }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
