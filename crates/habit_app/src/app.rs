use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use habit_core::habit::Habit;
use habit_core::session::SessionStore;
use habit_core::stats::WeekOverview;
use habit_core::store::FileStore;
use habit_core::theme::load_theme;
use habit_core::HabitService;
use tracing::info;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub(crate) data_dir: PathBuf,
    pub(crate) stats_window_days: u32,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        if let Ok(dir) = std::env::var("HABITKEEP_DATA_DIR") {
            if !dir.trim().is_empty() {
                config.data_dir = PathBuf::from(dir);
            }
        }
        if let Ok(window) = std::env::var("HABITKEEP_STATS_WINDOW_DAYS") {
            if let Ok(value) = window.trim().parse::<u32>() {
                if value > 0 {
                    config.stats_window_days = value;
                }
            }
        }
        Ok(config)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("habitkeep-data"),
            stats_window_days: 30,
        }
    }
}

pub fn run(config: AppConfig) -> Result<()> {
    info!(data_dir = %config.data_dir.display(), "starting habitkeep");
    let store = Arc::new(FileStore::new(&config.data_dir));
    let session = SessionStore::new(store.clone());
    let service = HabitService::builder()
        .with_store(store.clone())
        .build()
        .context("failed to initialise habit service")?;

    let today = Local::now().date_naive();
    render_dashboard(&service, &session, store.as_ref(), today, &config);
    Ok(())
}

fn render_dashboard(
    service: &HabitService,
    session: &SessionStore,
    store: &FileStore,
    today: NaiveDate,
    config: &AppConfig,
) {
    let theme = load_theme(store);
    let greeting = match session.current_user() {
        Some(user) => format!("Hi, {}", user.name),
        None => "Hi there".to_string(),
    };
    println!("{}", today.format("%A, %B %d, %Y"));
    println!("{greeting} ({} theme)", theme.as_str());
    println!();

    let due_today = service.active_habits_on(today);
    if due_today.is_empty() {
        println!("Nothing scheduled for today.");
    } else {
        let day = today.format("%Y-%m-%d").to_string();
        let day_logs = service.logs_for_date(&day);
        println!("Today's habits:");
        for habit in &due_today {
            let done = day_logs
                .iter()
                .any(|log| log.habit_id == habit.id && log.completed);
            let mark = if done { 'x' } else { ' ' };
            println!("  [{mark}] {}", habit.title);
        }
    }

    let summary = service.daily_summary(today);
    println!();
    println!(
        "Daily goals: {}/{} habits, {:.0}%",
        summary.completed,
        summary.total,
        summary.completion_pct
    );

    println!();
    render_week(&service.week_overview(today));

    let streaks = habit_streaks(service, today, config.stats_window_days);
    if !streaks.is_empty() {
        println!();
        println!("Streaks:");
        for (habit, streak) in streaks {
            let days = if streak == 1 { "day" } else { "days" };
            println!("  {} — {streak} {days}", habit.title);
        }
    }
}

fn render_week(week: &WeekOverview) {
    println!("This week ({:.0}% average):", week.average_pct);
    for day in &week.days {
        let filled = (day.completion_pct / 10.0).round() as usize;
        let bar: String = "#".repeat(filled.min(10));
        println!("  {} {:<10} {:>3.0}%", day.label, bar, day.completion_pct);
    }
}

fn habit_streaks(
    service: &HabitService,
    today: NaiveDate,
    window_days: u32,
) -> Vec<(Habit, u32)> {
    service
        .active_habits()
        .into_iter()
        .filter_map(|habit| {
            let stats = service.habit_stats(&habit.id, today, window_days);
            (stats.streak > 0).then_some((habit, stats.streak))
        })
        .collect()
}
