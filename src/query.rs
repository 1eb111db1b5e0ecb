//! Derived views over a task collection.
//!
//! Everything here is pure: callers pass the tasks and the reference date.

use std::collections::BTreeMap;

use chrono::{Datelike, Duration, NaiveDate};
use serde::Serialize;

use crate::category::{CategoryBook, CategoryKey};
use crate::error::{Error, Result};
use crate::task::{Priority, Status, Task};

/// Headline counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Stats {
    pub total: usize,
    pub completed: usize,
    pub in_progress: usize,
    /// High or Urgent priority, regardless of status
    pub urgent: usize,
    pub overdue: usize,
    /// Due within the Monday–Sunday week containing today
    pub this_week: usize,
}

/// Monday and Sunday of the week containing `today`.
pub fn week_bounds(today: NaiveDate) -> (NaiveDate, NaiveDate) {
    let start = today - Duration::days(i64::from(today.weekday().num_days_from_monday()));
    (start, start + Duration::days(6))
}

pub fn calculate_stats(tasks: &[Task], today: NaiveDate) -> Stats {
    let (week_start, week_end) = week_bounds(today);
    Stats {
        total: tasks.len(),
        completed: tasks.iter().filter(|t| t.status == Status::Done).count(),
        in_progress: tasks.iter().filter(|t| t.status == Status::InProgress).count(),
        urgent: tasks.iter().filter(|t| t.priority.is_high()).count(),
        overdue: tasks.iter().filter(|t| t.is_overdue(today)).count(),
        this_week: tasks
            .iter()
            .filter(|t| t.due_date >= week_start && t.due_date <= week_end)
            .count(),
    }
}

pub fn is_urgent_today(task: &Task, today: NaiveDate) -> bool {
    task.is_urgent_today(today)
}

/// Executive follow-up lists
#[derive(Debug, Clone, Default, Serialize)]
pub struct FollowUp<'a> {
    pub completed_week: Vec<&'a Task>,
    pub in_progress: Vec<&'a Task>,
    pub overdue: Vec<&'a Task>,
    pub upcoming: Vec<&'a Task>,
    pub high_priority_pending: Vec<&'a Task>,
}

pub fn follow_up(tasks: &[Task], today: NaiveDate) -> FollowUp<'_> {
    let last_week = today - Duration::days(7);
    let next_week = today + Duration::days(7);
    let mut view = FollowUp::default();
    for task in tasks {
        if task.is_done() {
            if task.due_date >= last_week {
                view.completed_week.push(task);
            }
            continue;
        }
        if task.status == Status::InProgress {
            view.in_progress.push(task);
        }
        if task.due_date < today {
            view.overdue.push(task);
        } else if task.due_date <= next_week {
            view.upcoming.push(task);
        }
        if task.priority.is_high() {
            view.high_priority_pending.push(task);
        }
    }
    view
}

pub fn tasks_on(tasks: &[Task], date: NaiveDate) -> Vec<&Task> {
    tasks.iter().filter(|task| task.due_date == date).collect()
}

/// Weeks of a month, Monday first; days outside the month are 0.
pub fn month_matrix(year: i32, month: u32) -> Result<Vec<[u32; 7]>> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| Error::InvalidArgument(format!("invalid month {year}-{month:02}")))?;
    let next_month = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    }
    .ok_or_else(|| Error::InvalidArgument(format!("invalid month {year}-{month:02}")))?;
    let days = u32::try_from((next_month - first).num_days())
        .map_err(|_| Error::InvalidArgument(format!("invalid month {year}-{month:02}")))?;

    let mut weeks = Vec::new();
    let mut week = [0u32; 7];
    let mut slot = first.weekday().num_days_from_monday() as usize;
    for day in 1..=days {
        week[slot] = day;
        slot += 1;
        if slot == 7 {
            weeks.push(week);
            week = [0; 7];
            slot = 0;
        }
    }
    if slot > 0 {
        weeks.push(week);
    }
    Ok(weeks)
}

/// Tasks due in one month of the schedule
#[derive(Debug, Clone, Serialize)]
pub struct MonthBucket<'a> {
    pub month: u32,
    pub tasks: Vec<&'a Task>,
}

/// Twelve buckets for `year`, January first.
pub fn schedule(tasks: &[Task], year: i32) -> Vec<MonthBucket<'_>> {
    let mut buckets: Vec<MonthBucket<'_>> = (1..=12)
        .map(|month| MonthBucket {
            month,
            tasks: Vec::new(),
        })
        .collect();
    for task in tasks.iter().filter(|t| t.due_date.year() == year) {
        buckets[task.due_date.month0() as usize].tasks.push(task);
    }
    buckets
}

/// One row of a breakdown table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Count {
    pub label: String,
    pub count: usize,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Breakdown {
    pub by_status: Vec<Count>,
    pub by_priority: Vec<Count>,
    pub by_category: Vec<Count>,
    pub by_responsible: Vec<Count>,
}

pub fn breakdown(tasks: &[Task], book: &CategoryBook) -> Breakdown {
    let by_status = Status::ALL
        .iter()
        .map(|status| Count {
            label: status.label().to_string(),
            count: tasks.iter().filter(|t| t.status == *status).count(),
        })
        .collect();
    let by_priority = Priority::ALL
        .iter()
        .map(|priority| Count {
            label: priority.label().to_string(),
            count: tasks.iter().filter(|t| t.priority == *priority).count(),
        })
        .collect();

    let mut categories: BTreeMap<String, usize> = BTreeMap::new();
    let mut people: BTreeMap<String, usize> = BTreeMap::new();
    for task in tasks {
        *categories
            .entry(book.canonical_key(&task.category).to_string())
            .or_default() += 1;
        let person = title_case(task.responsible.trim());
        if !person.is_empty() {
            *people.entry(person).or_default() += 1;
        }
    }

    Breakdown {
        by_status,
        by_priority,
        by_category: into_counts(categories),
        by_responsible: into_counts(people),
    }
}

fn into_counts(map: BTreeMap<String, usize>) -> Vec<Count> {
    let mut counts: Vec<Count> = map
        .into_iter()
        .map(|(label, count)| Count { label, count })
        .collect();
    counts.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.label.cmp(&b.label)));
    counts
}

/// Capitalize the first letter of every word, lowercase the rest.
pub fn title_case(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut at_word_start = true;
    for ch in value.chars() {
        if ch.is_alphabetic() {
            if at_word_start {
                out.extend(ch.to_uppercase());
            } else {
                out.extend(ch.to_lowercase());
            }
            at_word_start = false;
        } else {
            out.push(ch);
            at_word_start = true;
        }
    }
    out
}

/// Board filters; all set criteria must match.
#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    pub category: Option<CategoryKey>,
    pub responsible: Option<String>,
    pub priority: Option<Priority>,
    pub status: Option<Status>,
    pub due_today: bool,
    pub search: Option<String>,
}

impl TaskFilter {
    pub fn matches(&self, task: &Task, book: &CategoryBook, today: NaiveDate) -> bool {
        if let Some(category) = &self.category {
            if book.canonical_key(&task.category) != *category {
                return false;
            }
        }
        if let Some(responsible) = &self.responsible {
            if !task.responsible.trim().eq_ignore_ascii_case(responsible.trim())
                && title_case(task.responsible.trim()) != title_case(responsible.trim())
            {
                return false;
            }
        }
        if self.priority.is_some_and(|p| p != task.priority) {
            return false;
        }
        if self.status.is_some_and(|s| s != task.status) {
            return false;
        }
        if self.due_today && task.due_date != today {
            return false;
        }
        if let Some(needle) = &self.search {
            let needle = needle.trim().to_lowercase();
            let category = book.resolve(&task.category).name;
            let hit = [task.title.as_str(), category.as_str(), task.responsible.as_str()]
                .iter()
                .any(|field| field.to_lowercase().contains(&needle));
            if !hit {
                return false;
            }
        }
        true
    }

    pub fn apply<'a>(&self, tasks: &'a [Task], book: &CategoryBook, today: NaiveDate) -> Vec<&'a Task> {
        tasks
            .iter()
            .filter(|task| self.matches(task, book, today))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::TaskDraft;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("date")
    }

    fn task(id: i64, status: Status, priority: Priority, due: NaiveDate) -> Task {
        let mut draft = TaskDraft::new(format!("Tarefa {id}"), "maicon silva", due);
        draft.status = status;
        draft.priority = priority;
        Task::build(draft, id, "2025-01-01").expect("task")
    }

    // Wednesday 2025-03-12; week is 03-10..03-16.
    fn today() -> NaiveDate {
        date(2025, 3, 12)
    }

    fn fixture() -> Vec<Task> {
        vec![
            task(1, Status::Done, Priority::Low, date(2025, 3, 10)),
            task(2, Status::Done, Priority::High, date(2025, 2, 1)),
            task(3, Status::InProgress, Priority::Urgent, date(2025, 3, 11)),
            task(4, Status::Pending, Priority::Medium, date(2025, 3, 16)),
            task(5, Status::ForReview, Priority::High, date(2025, 3, 20)),
        ]
    }

    #[test]
    fn stats_count_every_bucket() {
        let stats = calculate_stats(&fixture(), today());
        assert_eq!(
            stats,
            Stats {
                total: 5,
                completed: 2,
                in_progress: 1,
                urgent: 3,
                overdue: 1,
                this_week: 3,
            }
        );
    }

    #[test]
    fn week_runs_monday_to_sunday() {
        assert_eq!(week_bounds(today()), (date(2025, 3, 10), date(2025, 3, 16)));
        assert_eq!(
            week_bounds(date(2025, 3, 16)),
            (date(2025, 3, 10), date(2025, 3, 16))
        );
        assert_eq!(
            week_bounds(date(2025, 3, 10)),
            (date(2025, 3, 10), date(2025, 3, 16))
        );
    }

    #[test]
    fn follow_up_lists() {
        let tasks = fixture();
        let view = follow_up(&tasks, today());
        let ids = |list: &[&Task]| list.iter().map(|t| t.id).collect::<Vec<_>>();
        assert_eq!(ids(&view.completed_week), vec![1]);
        assert_eq!(ids(&view.in_progress), vec![3]);
        assert_eq!(ids(&view.overdue), vec![3]);
        assert_eq!(ids(&view.upcoming), vec![4]);
        assert_eq!(ids(&view.high_priority_pending), vec![3, 5]);
    }

    #[test]
    fn month_matrix_pads_with_zero() {
        // March 2025 starts on a Saturday.
        let weeks = month_matrix(2025, 3).expect("matrix");
        assert_eq!(weeks.len(), 6);
        assert_eq!(weeks[0], [0, 0, 0, 0, 0, 1, 2]);
        assert_eq!(weeks[5], [31, 0, 0, 0, 0, 0, 0]);

        // February 2021 fits exactly four weeks.
        assert_eq!(month_matrix(2021, 2).expect("matrix").len(), 4);
        assert!(month_matrix(2025, 13).is_err());
    }

    #[test]
    fn schedule_groups_by_month() {
        let tasks = fixture();
        let buckets = schedule(&tasks, 2025);
        assert_eq!(buckets.len(), 12);
        assert_eq!(buckets[1].tasks.len(), 1);
        assert_eq!(buckets[2].tasks.len(), 4);
        assert!(schedule(&tasks, 2024).iter().all(|b| b.tasks.is_empty()));
    }

    #[test]
    fn breakdown_uses_canonical_categories_and_title_case() {
        let mut tasks = fixture();
        tasks[0].category = "Deskbee".to_string();
        tasks[1].category = "🏢 Deskbee".to_string();
        let view = breakdown(&tasks, &CategoryBook::defaults());

        assert_eq!(view.by_category[0], Count { label: "📋 Outros".into(), count: 3 });
        assert_eq!(view.by_category[1], Count { label: "🏢 Deskbee".into(), count: 2 });
        assert_eq!(view.by_responsible, vec![Count { label: "Maicon Silva".into(), count: 5 }]);
        assert_eq!(view.by_status.len(), 4);
    }

    #[test]
    fn filter_combines_criteria() {
        let tasks = fixture();
        let book = CategoryBook::defaults();
        let filter = TaskFilter {
            responsible: Some("MAICON SILVA".to_string()),
            priority: Some(Priority::High),
            ..TaskFilter::default()
        };
        let hits: Vec<i64> = filter.apply(&tasks, &book, today()).iter().map(|t| t.id).collect();
        assert_eq!(hits, vec![2, 5]);

        let search = TaskFilter {
            search: Some("tarefa 4".to_string()),
            ..TaskFilter::default()
        };
        assert_eq!(search.apply(&tasks, &book, today()).len(), 1);

        let due_today = TaskFilter {
            due_today: true,
            ..TaskFilter::default()
        };
        assert!(due_today.apply(&tasks, &book, today()).is_empty());
    }

    #[test]
    fn title_case_matches_word_rules() {
        assert_eq!(title_case("maria DA silva"), "Maria Da Silva");
        assert_eq!(title_case("ana-clara"), "Ana-Clara");
    }
}
