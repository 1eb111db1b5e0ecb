//! flow report command implementation
//!
//! Every report runs over the tasks visible to the current identity.

use chrono::{Datelike, NaiveDate};

use crate::cli::Globals;
use crate::error::{Error, Result};
use crate::output::{emit_success, HumanOutput};
use crate::query::{self, Count, Stats};
use crate::task::Task;

#[derive(serde::Serialize)]
struct StatsReport {
    today: String,
    #[serde(flatten)]
    stats: Stats,
    urgent_today: Vec<i64>,
}

#[derive(serde::Serialize)]
struct CalendarDay<'a> {
    day: u32,
    tasks: Vec<&'a Task>,
}

#[derive(serde::Serialize)]
struct CalendarReport<'a> {
    year: i32,
    month: u32,
    weeks: Vec<[u32; 7]>,
    days: Vec<CalendarDay<'a>>,
}

#[derive(serde::Serialize)]
struct ScheduleReport<'a> {
    year: i32,
    months: Vec<query::MonthBucket<'a>>,
}

pub fn run_stats(globals: &Globals) -> Result<()> {
    let ctx = globals.context()?;
    let tasks = ctx.visible_tasks();
    let stats = query::calculate_stats(&tasks, ctx.today);
    let urgent_today: Vec<i64> = tasks
        .iter()
        .filter(|task| query::is_urgent_today(task, ctx.today))
        .map(|task| task.id)
        .collect();

    let mut human = HumanOutput::new(format!("flow report stats: {}", ctx.today));
    human.push_summary("total", stats.total.to_string());
    human.push_summary("completed", stats.completed.to_string());
    human.push_summary("in progress", stats.in_progress.to_string());
    human.push_summary("high priority", stats.urgent.to_string());
    human.push_summary("overdue", stats.overdue.to_string());
    human.push_summary("due this week", stats.this_week.to_string());
    if !urgent_today.is_empty() {
        human.push_warning(format!("{} urgent task(s) due today", urgent_today.len()));
    }

    emit_success(
        globals.output(),
        "report stats",
        &StatsReport {
            today: ctx.today.to_string(),
            stats,
            urgent_today,
        },
        Some(&human),
    )
}

pub fn run_follow_up(globals: &Globals) -> Result<()> {
    let ctx = globals.context()?;
    let tasks = ctx.visible_tasks();
    let view = query::follow_up(&tasks, ctx.today);

    let mut human = HumanOutput::new(format!("flow report follow-up: {}", ctx.today));
    human.push_summary("completed in the last 7 days", view.completed_week.len().to_string());
    human.push_summary("in progress", view.in_progress.len().to_string());
    human.push_summary("overdue", view.overdue.len().to_string());
    human.push_summary("due in the next 7 days", view.upcoming.len().to_string());
    human.push_summary("high priority pending", view.high_priority_pending.len().to_string());
    for task in &view.overdue {
        human.push_warning(format!(
            "#{} {} overdue since {}",
            task.id,
            task.title,
            task.due_date_string()
        ));
    }
    for task in &view.upcoming {
        human.push_detail(format!("#{} {} due {}", task.id, task.title, task.due_date_string()));
    }

    emit_success(globals.output(), "report follow-up", &view, Some(&human))
}

pub fn run_calendar(globals: &Globals, year: Option<i32>, month: Option<u32>) -> Result<()> {
    let ctx = globals.context()?;
    let year = year.unwrap_or_else(|| ctx.today.year());
    let month = month.unwrap_or_else(|| ctx.today.month());
    let weeks = query::month_matrix(year, month)?;
    let tasks = ctx.visible_tasks();

    let mut days = Vec::new();
    for day in weeks.iter().flatten().copied().filter(|day| *day > 0) {
        let date = NaiveDate::from_ymd_opt(year, month, day)
            .ok_or_else(|| Error::InvalidArgument(format!("invalid date {year}-{month:02}-{day:02}")))?;
        let due = query::tasks_on(&tasks, date);
        if !due.is_empty() {
            days.push(CalendarDay { day, tasks: due });
        }
    }

    let mut human = HumanOutput::new(format!("flow report calendar: {year}-{month:02}"));
    human.push_detail("Mo Tu We Th Fr Sa Su".to_string());
    for week in &weeks {
        let row: Vec<String> = week
            .iter()
            .map(|day| match day {
                0 => "  ".to_string(),
                day if days.iter().any(|d| d.day == *day) => format!("{day:>2}*"),
                day => format!("{day:>2}"),
            })
            .collect();
        human.push_detail(row.join(" "));
    }
    for entry in &days {
        for task in &entry.tasks {
            human.push_summary(format!("{:02}", entry.day), format!("#{} {}", task.id, task.title));
        }
    }

    emit_success(
        globals.output(),
        "report calendar",
        &CalendarReport {
            year,
            month,
            weeks,
            days,
        },
        Some(&human),
    )
}

pub fn run_schedule(globals: &Globals, year: Option<i32>) -> Result<()> {
    let ctx = globals.context()?;
    let year = year.unwrap_or_else(|| ctx.today.year());
    let tasks = ctx.visible_tasks();
    let months = query::schedule(&tasks, year);

    let mut human = HumanOutput::new(format!("flow report schedule: {year}"));
    for bucket in &months {
        let titles: Vec<&str> = bucket.tasks.iter().map(|t| t.title.as_str()).collect();
        human.push_summary(
            format!("{year}-{:02}", bucket.month),
            if titles.is_empty() {
                "-".to_string()
            } else {
                titles.join(", ")
            },
        );
    }

    emit_success(
        globals.output(),
        "report schedule",
        &ScheduleReport { year, months },
        Some(&human),
    )
}

pub fn run_breakdown(globals: &Globals) -> Result<()> {
    let ctx = globals.context()?;
    let tasks = ctx.visible_tasks();
    let book = ctx.categories();
    let breakdown = query::breakdown(&tasks, &book);

    let mut human = HumanOutput::new(format!("flow report breakdown: {} task(s)", tasks.len()));
    push_counts(&mut human, "status", &breakdown.by_status);
    push_counts(&mut human, "priority", &breakdown.by_priority);
    push_counts(&mut human, "category", &breakdown.by_category);
    push_counts(&mut human, "responsible", &breakdown.by_responsible);

    emit_success(globals.output(), "report breakdown", &breakdown, Some(&human))
}

fn push_counts(human: &mut HumanOutput, group: &str, counts: &[Count]) {
    for count in counts {
        human.push_detail(format!("{group}: {} = {}", count.label, count.count));
    }
}
