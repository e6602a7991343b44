use std::sync::Arc;

use anyhow::{anyhow, Result};
use chrono::NaiveDate;
use parking_lot::RwLock;
use tracing::info;

use crate::habit::{day_key, Habit, HabitLog};
use crate::repository::HabitRepository;
use crate::stats::{self, DaySummary, HabitStats, WeekOverview};
use crate::store::KeyValueStore;

/// In-memory coordinator over the habit repository: the single owner of the
/// cached habit and log collections a UI layer renders from. Mutations
/// write through the repository and refresh the affected cache before
/// reporting the repository's verdict.
pub struct HabitService {
    repository: HabitRepository,
    habits: RwLock<Vec<Habit>>,
    logs: RwLock<Vec<HabitLog>>,
}

pub struct HabitServiceBuilder {
    store: Option<Arc<dyn KeyValueStore>>,
}

impl HabitServiceBuilder {
    pub fn new() -> Self {
        Self { store: None }
    }

    pub fn with_store(mut self, store: Arc<dyn KeyValueStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn build(self) -> Result<HabitService> {
        let store = self
            .store
            .ok_or_else(|| anyhow!("a key-value store is required"))?;
        let service = HabitService {
            repository: HabitRepository::new(store),
            habits: RwLock::new(Vec::new()),
            logs: RwLock::new(Vec::new()),
        };
        service.refresh_habits();
        service.refresh_logs();
        info!(
            habit_count = service.habits.read().len(),
            log_count = service.logs.read().len(),
            "habit service initialised"
        );
        Ok(service)
    }
}

impl HabitService {
    pub fn builder() -> HabitServiceBuilder {
        HabitServiceBuilder::new()
    }

    pub fn refresh_habits(&self) {
        *self.habits.write() = self.repository.list_habits();
    }

    pub fn refresh_logs(&self) {
        *self.logs.write() = self.repository.list_logs();
    }

    pub fn habits(&self) -> Vec<Habit> {
        self.habits.read().clone()
    }

    pub fn logs(&self) -> Vec<HabitLog> {
        self.logs.read().clone()
    }

    pub fn active_habits(&self) -> Vec<Habit> {
        self.habits
            .read()
            .iter()
            .filter(|habit| !habit.is_archived)
            .cloned()
            .collect()
    }

    pub fn archived_habits(&self) -> Vec<Habit> {
        self.habits
            .read()
            .iter()
            .filter(|habit| habit.is_archived)
            .cloned()
            .collect()
    }

    pub fn habit_by_id(&self, habit_id: &str) -> Option<Habit> {
        self.habits
            .read()
            .iter()
            .find(|habit| habit.id == habit_id)
            .cloned()
    }

    pub fn logs_for_date(&self, date: &str) -> Vec<HabitLog> {
        let day = day_key(date);
        self.logs
            .read()
            .iter()
            .filter(|log| log.matches_day(day))
            .cloned()
            .collect()
    }

    pub fn logs_for_habit(&self, habit_id: &str) -> Vec<HabitLog> {
        self.logs
            .read()
            .iter()
            .filter(|log| log.habit_id == habit_id)
            .cloned()
            .collect()
    }

    /// Upsert. An empty title is rejected before anything touches storage.
    pub fn save_habit(&self, habit: &Habit) -> bool {
        if habit.title.trim().is_empty() {
            tracing::warn!(habit_id = %habit.id, "rejecting habit with an empty title");
            return false;
        }
        let saved = self.repository.save_habit(habit);
        if saved {
            self.refresh_habits();
        }
        saved
    }

    pub fn delete_habit(&self, habit_id: &str) -> bool {
        let deleted = self.repository.delete_habit(habit_id);
        if deleted {
            self.refresh_habits();
            self.refresh_logs();
        }
        deleted
    }

    pub fn archive_habit(&self, habit_id: &str) -> bool {
        let archived = self.repository.archive_habit(habit_id);
        if archived {
            self.refresh_habits();
        }
        archived
    }

    pub fn toggle_completion(&self, habit_id: &str, date: &str) -> bool {
        let toggled = self.repository.toggle_completion(habit_id, date);
        if toggled {
            self.refresh_logs();
        }
        toggled
    }

    pub fn save_log(&self, log: &HabitLog) -> bool {
        let saved = self.repository.save_log(log);
        if saved {
            self.refresh_logs();
        }
        saved
    }

    pub fn active_habits_on(&self, date: NaiveDate) -> Vec<Habit> {
        stats::active_habits_on(date, &self.habits.read())
    }

    pub fn daily_summary(&self, date: NaiveDate) -> DaySummary {
        stats::daily_summary(date, &self.habits.read(), &self.logs.read())
    }

    pub fn week_overview(&self, today: NaiveDate) -> WeekOverview {
        stats::weekly_histogram(today, &self.habits.read(), &self.logs.read())
    }

    pub fn habit_stats(&self, habit_id: &str, today: NaiveDate, window_days: u32) -> HabitStats {
        let logs = self.logs_for_habit(habit_id);
        stats::habit_stats(today, &logs, window_days)
    }
}
