use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

/// A user-defined recurring behaviour with a schedule and presentation
/// metadata. Serialised field names follow the stored JSON blob layout.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Habit {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub icon: String,
    pub color: String,
    pub schedule: HabitSchedule,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reminder: Option<NaiveTime>,
    pub created_at: DateTime<Utc>,
    pub is_archived: bool,
}

impl Habit {
    pub fn new(id: impl Into<String>, title: impl Into<String>, schedule: HabitSchedule) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: None,
            icon: "circle".to_string(),
            color: "#4A90D9".to_string(),
            schedule,
            reminder: None,
            created_at: Utc::now(),
            is_archived: false,
        }
    }
}

/// The single authoritative schedule representation. Weekday numbers are
/// ISO: Monday=1 through Sunday=7.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum HabitSchedule {
    Daily,
    Weekly { weekday: u8 },
    Monthly { day_of_month: u8 },
}

impl HabitSchedule {
    /// Whether a habit with this schedule runs on `date`. Monthly schedules
    /// past the end of a short month fire on its last day instead.
    pub fn runs_on(&self, date: NaiveDate) -> bool {
        match *self {
            HabitSchedule::Daily => true,
            HabitSchedule::Weekly { weekday } => iso_weekday(date) == weekday,
            HabitSchedule::Monthly { day_of_month } => {
                let clamped =
                    u32::from(day_of_month).min(days_in_month(date.year(), date.month()));
                date.day() == clamped
            }
        }
    }
}

/// ISO weekday number for `date`: Monday=1 through Sunday=7. The raw
/// Sunday-first index (Sunday=0) collapses onto 7 here.
pub fn iso_weekday(date: NaiveDate) -> u8 {
    match date.weekday().num_days_from_sunday() {
        0 => 7,
        n => n as u8,
    }
}

/// A record of whether one habit was completed on one calendar day.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct HabitLog {
    pub id: String,
    pub habit_id: String,
    pub date: String,
    pub completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl HabitLog {
    /// A fresh completed log for (habit, day). Ids embed the creation
    /// timestamp, so repeated creation never collides.
    pub fn first_completion(habit_id: &str, date: &str, now: DateTime<Utc>) -> Self {
        let day = day_key(date);
        Self {
            id: format!("{habit_id}_{day}_{}", now.timestamp_millis()),
            habit_id: habit_id.to_string(),
            date: day.to_string(),
            completed: true,
            notes: None,
        }
    }

    /// Whether this log belongs to the calendar day of `date`. Matching is
    /// day-granular: time-of-day suffixes on either side are ignored.
    pub fn matches_day(&self, date: &str) -> bool {
        self.date.starts_with(day_key(date))
    }
}

/// Truncates an ISO-8601 date or datetime string to its `YYYY-MM-DD` part.
pub fn day_key(date: &str) -> &str {
    match date.find('T') {
        Some(idx) => &date[..idx],
        None => date,
    }
}

pub(crate) fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 => {
            if is_leap_year(year) {
                29
            } else {
                28
            }
        }
        _ => 30,
    }
}

fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}
