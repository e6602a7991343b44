use std::collections::HashSet;

use chrono::{Datelike, Duration, NaiveDate};
use serde::Serialize;

use crate::habit::{day_key, Habit, HabitLog};

/// Per-day rollup: how many habits were due and how many got done.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DaySummary {
    pub date: NaiveDate,
    pub total: usize,
    pub completed: usize,
    pub completion_pct: f64,
}

/// One bar of the weekly histogram.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DayCompletion {
    pub date: NaiveDate,
    pub label: String,
    pub completion_pct: f64,
}

/// The Monday-starting week around a reference day, plus its average.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct WeekOverview {
    pub days: Vec<DayCompletion>,
    pub average_pct: f64,
}

/// Trailing-window rollup for a single habit.
#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct HabitStats {
    pub completion_rate: f64,
    pub streak: u32,
    pub total: usize,
}

/// Habits whose schedule includes `date`. Archived habits never qualify.
pub fn active_habits_on(date: NaiveDate, habits: &[Habit]) -> Vec<Habit> {
    habits
        .iter()
        .filter(|habit| !habit.is_archived && habit.schedule.runs_on(date))
        .cloned()
        .collect()
}

/// Completed share of the active set, in percent. An empty active set
/// yields 0 rather than a division by zero.
pub fn completion_rate(active: &[Habit], logs: &[HabitLog]) -> f64 {
    if active.is_empty() {
        return 0.0;
    }
    let completed = logs.iter().filter(|log| log.completed).count();
    completed as f64 / active.len() as f64 * 100.0
}

pub fn daily_summary(date: NaiveDate, habits: &[Habit], logs: &[HabitLog]) -> DaySummary {
    let day = date.format("%Y-%m-%d").to_string();
    let active = active_habits_on(date, habits);
    let day_logs: Vec<HabitLog> = logs
        .iter()
        .filter(|log| log.matches_day(&day))
        .cloned()
        .collect();
    let completed = day_logs.iter().filter(|log| log.completed).count();
    DaySummary {
        date,
        total: active.len(),
        completed,
        completion_pct: completion_rate(&active, &day_logs),
    }
}

/// Completion per day of the Monday-starting week containing `today`. Each
/// day is rated against its own active-habit set and its own logs.
pub fn weekly_histogram(today: NaiveDate, habits: &[Habit], logs: &[HabitLog]) -> WeekOverview {
    let monday = today - Duration::days(i64::from(today.weekday().num_days_from_monday()));
    let mut days = Vec::with_capacity(7);
    for offset in 0..7 {
        let date = monday + Duration::days(offset);
        let day = date.format("%Y-%m-%d").to_string();
        let active = active_habits_on(date, habits);
        let day_logs: Vec<HabitLog> = logs
            .iter()
            .filter(|log| log.matches_day(&day))
            .cloned()
            .collect();
        let label = date
            .format("%a")
            .to_string()
            .chars()
            .next()
            .map(String::from)
            .unwrap_or_default();
        days.push(DayCompletion {
            date,
            label,
            completion_pct: completion_rate(&active, &day_logs),
        });
    }
    let average_pct = days.iter().map(|day| day.completion_pct).sum::<f64>() / 7.0;
    WeekOverview { days, average_pct }
}

/// Consecutive completed days counting backward from `today`; the first day
/// without a completed log ends the run. `window_days` bounds the walk.
pub fn streak(today: NaiveDate, logs: &[HabitLog], window_days: u32) -> u32 {
    let completed_days: HashSet<&str> = logs
        .iter()
        .filter(|log| log.completed)
        .map(|log| day_key(&log.date))
        .collect();
    let mut run = 0;
    for offset in 0..window_days {
        let day = (today - Duration::days(i64::from(offset)))
            .format("%Y-%m-%d")
            .to_string();
        if completed_days.contains(day.as_str()) {
            run += 1;
        } else {
            break;
        }
    }
    run
}

/// Rollup over one habit's logs for the trailing `window_days` window.
pub fn habit_stats(today: NaiveDate, habit_logs: &[HabitLog], window_days: u32) -> HabitStats {
    let window_start = today - Duration::days(i64::from(window_days));
    let total = habit_logs
        .iter()
        .filter(|log| log.completed)
        .filter(|log| {
            NaiveDate::parse_from_str(day_key(&log.date), "%Y-%m-%d")
                .map(|date| date >= window_start)
                .unwrap_or(false)
        })
        .count();
    let completion_rate = if window_days == 0 {
        0.0
    } else {
        total as f64 / f64::from(window_days) * 100.0
    };
    HabitStats {
        completion_rate,
        streak: streak(today, habit_logs, window_days),
        total,
    }
}
