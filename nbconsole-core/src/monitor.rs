//! Client-side task query logic
//!
//! The API returns the full task list; filtering, ordering and paging all
//! happen here, after each fetch.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};

use crate::domain::task::{Task, TaskStatus};

/// How long after completion an artifact stays downloadable
///
/// Must match the backend's output retention.
pub const DOWNLOAD_RETENTION: Duration = Duration::hours(3);

pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Status filter: everything, or one exact status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StatusFilter {
    #[default]
    All,
    Only(TaskStatus),
}

impl std::str::FromStr for StatusFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            Ok(StatusFilter::All)
        } else {
            s.parse().map(StatusFilter::Only)
        }
    }
}

/// Filter applied to fetched tasks
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskFilter {
    /// Case-insensitive substring of request id, pipeline name or version
    pub search: String,
    pub status: StatusFilter,
    /// Inclusive lower bound on the creation date
    pub from: Option<NaiveDate>,
    /// Inclusive upper bound on the creation date (through end of day)
    pub to: Option<NaiveDate>,
}

impl TaskFilter {
    pub fn matches(&self, task: &Task) -> bool {
        self.matches_search(task) && self.matches_status(task) && self.matches_dates(task)
    }

    fn matches_search(&self, task: &Task) -> bool {
        let needle = self.search.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }
        task.request_id.to_string().contains(&needle)
            || task.notebook_name.to_lowercase().contains(&needle)
            || task
                .version
                .as_deref()
                .is_some_and(|v| v.to_lowercase().contains(&needle))
    }

    fn matches_status(&self, task: &Task) -> bool {
        match self.status {
            StatusFilter::All => true,
            StatusFilter::Only(status) => task.status == status,
        }
    }

    fn matches_dates(&self, task: &Task) -> bool {
        if let Some(from) = self.from {
            if task.created_at < from.and_time(NaiveTime::MIN).and_utc() {
                return false;
            }
        }
        if let Some(to) = self.to {
            let end_of_day = to.and_time(NaiveTime::MIN).and_utc() + Duration::days(1);
            if task.created_at >= end_of_day {
                return false;
            }
        }
        true
    }
}

/// Order tasks by finish time, most recent first
///
/// Unfinished tasks trail the finished ones and keep their relative order.
pub fn sort_by_finished_desc(tasks: &mut [Task]) {
    tasks.sort_by(|a, b| match (a.finished_at, b.finished_at) {
        (Some(a), Some(b)) => b.cmp(&a),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });
}

/// One page of results
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// 1-based, already clamped
    pub page: usize,
    pub total_pages: usize,
    pub total_items: usize,
}

/// Slice out one page, clamping the page number to `[1, total_pages]`
pub fn paginate<T: Clone>(items: &[T], page: usize, page_size: usize) -> Page<T> {
    let page_size = page_size.max(1);
    let total_items = items.len();
    let total_pages = total_items.div_ceil(page_size).max(1);
    let page = page.clamp(1, total_pages);
    let start = (page - 1) * page_size;

    Page {
        items: items.iter().skip(start).take(page_size).cloned().collect(),
        page,
        total_pages,
        total_items,
    }
}

/// Filter + page state of a task view
///
/// Changing the filter always resets to the first page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskQuery {
    filter: TaskFilter,
    page: usize,
    page_size: usize,
}

impl Default for TaskQuery {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl TaskQuery {
    pub fn new(page_size: usize) -> Self {
        Self {
            filter: TaskFilter::default(),
            page: 1,
            page_size: page_size.max(1),
        }
    }

    pub fn filter(&self) -> &TaskFilter {
        &self.filter
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn set_filter(&mut self, filter: TaskFilter) {
        self.filter = filter;
        self.page = 1;
    }

    pub fn set_page(&mut self, page: usize) {
        self.page = page.max(1);
    }

    /// Filter, sort and page a fetched task list
    ///
    /// The stored page is clamped to what the result actually has.
    pub fn apply(&mut self, tasks: &[Task]) -> Page<Task> {
        let mut matching: Vec<Task> = tasks
            .iter()
            .filter(|t| self.filter.matches(t))
            .cloned()
            .collect();
        sort_by_finished_desc(&mut matching);
        let page = paginate(&matching, self.page, self.page_size);
        self.page = page.page;
        page
    }
}

/// Whether a task's artifact can be downloaded right now
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadAvailability {
    Available { expires_at: DateTime<Utc> },
    Expired,
    Unavailable,
}

impl DownloadAvailability {
    pub fn is_available(&self) -> bool {
        matches!(self, DownloadAvailability::Available { .. })
    }
}

/// Download rule: SUCCESS, finished, and within [`DOWNLOAD_RETENTION`]
pub fn download_availability(task: &Task, now: DateTime<Utc>) -> DownloadAvailability {
    match (task.status, task.finished_at) {
        (TaskStatus::Success, Some(finished)) => {
            let expires_at = finished + DOWNLOAD_RETENTION;
            if now <= expires_at {
                DownloadAvailability::Available { expires_at }
            } else {
                DownloadAvailability::Expired
            }
        }
        _ => DownloadAvailability::Unavailable,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use uuid::Uuid;

    fn task(name: &str, status: TaskStatus, created_at: DateTime<Utc>) -> Task {
        Task {
            request_id: Uuid::new_v4(),
            notebook_name: name.to_string(),
            version: Some("v1".to_string()),
            params: serde_json::json!({}),
            status,
            retry_count: 0,
            created_at,
            started_at: None,
            finished_at: None,
            output_type: None,
            output_path: None,
            error: None,
            logs: Vec::new(),
        }
    }

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, day, hour, 0, 0).unwrap()
    }

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, day).unwrap()
    }

    #[test]
    fn test_search_is_case_insensitive_across_fields() {
        let mut t = task("Daily_Sales", TaskStatus::Success, at(1, 9));
        t.version = Some("Release-7".to_string());

        let by = |search: &str| TaskFilter {
            search: search.to_string(),
            ..TaskFilter::default()
        };
        assert!(by("daily").matches(&t));
        assert!(by("RELEASE").matches(&t));
        assert!(by(&t.request_id.to_string()[..8].to_uppercase()).matches(&t));
        assert!(by("").matches(&t));
        assert!(!by("weekly").matches(&t));
    }

    #[test]
    fn test_status_filter() {
        let t = task("a_job", TaskStatus::Failure, at(1, 9));
        let mut filter = TaskFilter::default();
        assert!(filter.matches(&t));
        filter.status = "failure".parse().unwrap();
        assert!(filter.matches(&t));
        filter.status = StatusFilter::Only(TaskStatus::Success);
        assert!(!filter.matches(&t));
        assert_eq!("ALL".parse::<StatusFilter>(), Ok(StatusFilter::All));
    }

    #[test]
    fn test_date_range_is_inclusive_with_end_of_day() {
        let filter = TaskFilter {
            from: Some(date(2)),
            to: Some(date(3)),
            ..TaskFilter::default()
        };
        let late_on_last_day = Utc.with_ymd_and_hms(2025, 6, 3, 23, 59, 59).unwrap();

        assert!(!filter.matches(&task("a_job", TaskStatus::Pending, at(1, 23))));
        assert!(filter.matches(&task("a_job", TaskStatus::Pending, at(2, 0))));
        assert!(filter.matches(&task("a_job", TaskStatus::Pending, late_on_last_day)));
        assert!(!filter.matches(&task("a_job", TaskStatus::Pending, at(4, 0))));
    }

    #[test]
    fn test_finished_tasks_sort_before_unfinished() {
        let mut unfinished = task("unfinished", TaskStatus::Started, at(1, 8));
        unfinished.finished_at = None;
        let mut finished = task("finished", TaskStatus::Success, at(1, 7));
        finished.finished_at = Some(at(1, 9));

        let mut tasks = vec![unfinished, finished];
        sort_by_finished_desc(&mut tasks);
        assert_eq!(tasks[0].notebook_name, "finished");
    }

    #[test]
    fn test_sort_is_descending_and_stable_for_unfinished() {
        let mut older = task("older", TaskStatus::Success, at(1, 1));
        older.finished_at = Some(at(1, 2));
        let mut newer = task("newer", TaskStatus::Success, at(1, 1));
        newer.finished_at = Some(at(1, 5));
        let first = task("first_pending", TaskStatus::Pending, at(1, 3));
        let second = task("second_pending", TaskStatus::Pending, at(1, 4));

        let mut tasks = vec![first, older, second, newer];
        sort_by_finished_desc(&mut tasks);
        let names: Vec<_> = tasks.iter().map(|t| t.notebook_name.as_str()).collect();
        assert_eq!(names, vec!["newer", "older", "first_pending", "second_pending"]);
    }

    #[test]
    fn test_paginate_clamps_page() {
        let items: Vec<u32> = (1..=23).collect();

        let page = paginate(&items, 3, 10);
        assert_eq!(page.items, vec![21, 22, 23]);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.total_items, 23);

        assert_eq!(paginate(&items, 99, 10).page, 3);
        assert_eq!(paginate(&items, 0, 10).page, 1);

        let empty = paginate::<u32>(&[], 4, 10);
        assert_eq!(empty.page, 1);
        assert_eq!(empty.total_pages, 1);
        assert!(empty.items.is_empty());
    }

    #[test]
    fn test_query_resets_page_on_filter_change() {
        let tasks: Vec<Task> = (0..25)
            .map(|i| task(&format!("job_{i}"), TaskStatus::Pending, at(1, 0)))
            .collect();

        let mut query = TaskQuery::new(10);
        query.set_page(3);
        assert_eq!(query.apply(&tasks).items.len(), 5);

        query.set_filter(TaskFilter {
            search: "job_1".to_string(),
            ..TaskFilter::default()
        });
        assert_eq!(query.page(), 1);
        let page = query.apply(&tasks);
        assert_eq!(page.total_items, 11);

        query.set_page(7);
        assert_eq!(query.apply(&tasks).page, 2);
        assert_eq!(query.page(), 2);
    }

    #[test]
    fn test_download_window() {
        let now = at(10, 12);
        let mut t = task("report", TaskStatus::Success, at(10, 8));

        t.finished_at = Some(now - Duration::hours(2) - Duration::minutes(59));
        assert!(download_availability(&t, now).is_available());

        t.finished_at = Some(now - Duration::hours(3) - Duration::minutes(1));
        assert_eq!(download_availability(&t, now), DownloadAvailability::Expired);

        t.finished_at = None;
        assert_eq!(
            download_availability(&t, now),
            DownloadAvailability::Unavailable
        );

        t.status = TaskStatus::Failure;
        t.finished_at = Some(now);
        assert_eq!(
            download_availability(&t, now),
            DownloadAvailability::Unavailable
        );
    }
}
