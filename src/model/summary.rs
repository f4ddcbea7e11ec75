use chrono::{DateTime, Utc};

/// Inclusive reporting window, both ends UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant <= self.end
    }

    pub fn is_inverted(&self) -> bool {
        self.end < self.start
    }
}

/// Per-project aggregation result; the unit both renderers consume.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectSummary {
    pub project_name: String,
    pub active_count: usize,
    pub completed_count: usize,
    /// Active lines first, then completed lines.
    pub task_lines: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct Report {
    pub user_name: String,
    pub window: DateWindow,
    pub summaries: Vec<ProjectSummary>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn window_is_inclusive_on_both_ends() {
        let start = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2025, 1, 31, 0, 0, 0).unwrap();
        let window = DateWindow::new(start, end);
        assert!(window.contains(start));
        assert!(window.contains(end));
        assert!(!window.contains(end + chrono::Duration::seconds(1)));
        assert!(!window.contains(start - chrono::Duration::seconds(1)));
        assert!(!window.is_inverted());
    }
}
