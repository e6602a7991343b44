use std::sync::Arc;

use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::habit::{day_key, Habit, HabitLog};
use crate::store::{KeyValueStore, HABITS_KEY, HABIT_LOGS_KEY};

/// Sole owner of the habit and log collection blobs. Reads degrade to empty
/// collections and writes report success as a plain `bool`; no storage
/// error escapes to a caller. Every write replaces the whole blob, so
/// interleaved writers are last-write-wins.
pub struct HabitRepository {
    store: Arc<dyn KeyValueStore>,
}

impl HabitRepository {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub fn list_habits(&self) -> Vec<Habit> {
        self.read_collection(HABITS_KEY)
    }

    /// Upsert by id: replaces a habit in place or appends a new one.
    pub fn save_habit(&self, habit: &Habit) -> bool {
        let mut habits = self.list_habits();
        match habits.iter_mut().find(|existing| existing.id == habit.id) {
            Some(existing) => *existing = habit.clone(),
            None => habits.push(habit.clone()),
        }
        self.write_collection(HABITS_KEY, &habits)
    }

    /// Removes the habit and every log that references it. The trimmed log
    /// blob is written first: a failure mid-cascade can leave the habit in
    /// place, never orphaned logs.
    pub fn delete_habit(&self, habit_id: &str) -> bool {
        let logs: Vec<HabitLog> = self
            .list_logs()
            .into_iter()
            .filter(|log| log.habit_id != habit_id)
            .collect();
        if !self.write_collection(HABIT_LOGS_KEY, &logs) {
            return false;
        }
        let habits: Vec<Habit> = self
            .list_habits()
            .into_iter()
            .filter(|habit| habit.id != habit_id)
            .collect();
        self.write_collection(HABITS_KEY, &habits)
    }

    /// Marks the matching habit archived; its logs are untouched.
    pub fn archive_habit(&self, habit_id: &str) -> bool {
        let mut habits = self.list_habits();
        if let Some(habit) = habits.iter_mut().find(|habit| habit.id == habit_id) {
            habit.is_archived = true;
        }
        self.write_collection(HABITS_KEY, &habits)
    }

    pub fn list_logs(&self) -> Vec<HabitLog> {
        self.read_collection(HABIT_LOGS_KEY)
    }

    pub fn logs_for_date(&self, date: &str) -> Vec<HabitLog> {
        let day = day_key(date);
        self.list_logs()
            .into_iter()
            .filter(|log| log.matches_day(day))
            .collect()
    }

    pub fn logs_for_habit(&self, habit_id: &str) -> Vec<HabitLog> {
        self.list_logs()
            .into_iter()
            .filter(|log| log.habit_id == habit_id)
            .collect()
    }

    /// Upsert by log id, same semantics as `save_habit`. Uniqueness per
    /// (habit, day) is not enforced here; lookups are find-first.
    pub fn save_log(&self, log: &HabitLog) -> bool {
        let mut logs = self.list_logs();
        match logs.iter_mut().find(|existing| existing.id == log.id) {
            Some(existing) => *existing = log.clone(),
            None => logs.push(log.clone()),
        }
        self.write_collection(HABIT_LOGS_KEY, &logs)
    }

    /// Flips the first log recorded for (habit, calendar day of `date`), or
    /// inserts a fresh completed one when none exists. Two toggles in a row
    /// restore the original state.
    pub fn toggle_completion(&self, habit_id: &str, date: &str) -> bool {
        let mut logs = self.list_logs();
        let day = day_key(date);
        match logs
            .iter_mut()
            .find(|log| log.habit_id == habit_id && log.matches_day(day))
        {
            Some(log) => log.completed = !log.completed,
            None => logs.push(HabitLog::first_completion(habit_id, day, Utc::now())),
        }
        self.write_collection(HABIT_LOGS_KEY, &logs)
    }

    fn read_collection<T: DeserializeOwned>(&self, key: &'static str) -> Vec<T> {
        let raw = match self.store.get(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(err) => {
                tracing::error!(key, %err, "storage read failed, substituting empty collection");
                return Vec::new();
            }
        };
        match serde_json::from_str(&raw) {
            Ok(values) => values,
            Err(err) => {
                tracing::error!(key, %err, "stored collection is not valid JSON, substituting empty collection");
                Vec::new()
            }
        }
    }

    fn write_collection<T: Serialize>(&self, key: &'static str, values: &[T]) -> bool {
        let payload = match serde_json::to_string(values) {
            Ok(payload) => payload,
            Err(err) => {
                tracing::error!(key, %err, "unable to encode collection");
                return false;
            }
        };
        if let Err(err) = self.store.set(key, &payload) {
            tracing::error!(key, %err, "storage write failed");
            return false;
        }
        true
    }
}
