use std::collections::{BTreeSet, HashMap};

use crate::model::project::Project;
use crate::model::summary::{DateWindow, ProjectSummary};
use crate::model::work_item::WorkItem;

/// Status names treated as terminal regardless of a project's own workflow naming.
pub const COMPLETED_KEYWORDS: &[&str] = &[
    "done",
    "completed",
    "verified",
    "closed",
    "deployed",
    "cancelled",
];

const UNKNOWN_STATUS: &str = "Unknown";

/// State id -> display name for one project.
pub type StateLookup = HashMap<String, String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Classification {
    Active,
    Completed,
}

/// Reduces a project's work items into a [`ProjectSummary`].
#[derive(Debug, Clone)]
pub struct Aggregator {
    allowed_statuses: BTreeSet<String>,
    completed_keywords: BTreeSet<String>,
    window: DateWindow,
}

impl Aggregator {
    /// An empty `allowed_statuses` set means no status restriction.
    pub fn new<I, S>(allowed_statuses: I, window: DateWindow) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            allowed_statuses: normalize_all(allowed_statuses),
            completed_keywords: normalize_all(COMPLETED_KEYWORDS),
            window,
        }
    }

    #[cfg(test)]
    pub fn with_completed_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.completed_keywords = normalize_all(keywords);
        self
    }

    pub fn window(&self) -> DateWindow {
        self.window
    }

    /// Returns `None` when no item survives filtering.
    pub fn summarize(
        &self,
        project: &Project,
        states: &StateLookup,
        items: &[WorkItem],
        user_id: &str,
    ) -> Option<ProjectSummary> {
        let mut active = Vec::new();
        let mut completed = Vec::new();

        for item in items {
            match self.classify(item, states, user_id) {
                Some(Classification::Active) => active.push(item.name.clone()),
                Some(Classification::Completed) => completed.push(format!("• {} (Done)", item.name)),
                None => {}
            }
        }

        if active.is_empty() && completed.is_empty() {
            return None;
        }

        let active_count = active.len();
        let completed_count = completed.len();
        let mut task_lines = active;
        task_lines.extend(completed);

        Some(ProjectSummary {
            project_name: project.name.clone(),
            active_count,
            completed_count,
            task_lines,
        })
    }

    fn classify(&self, item: &WorkItem, states: &StateLookup, user_id: &str) -> Option<Classification> {
        // The server-side assignee filter is advisory only.
        if !item.is_assigned_to(user_id) {
            return None;
        }

        let status = normalize_status(resolve_status(item, states));
        if !self.allowed_statuses.is_empty() && !self.allowed_statuses.contains(&status) {
            return None;
        }

        if !self.completed_keywords.contains(&status) {
            return Some(Classification::Active);
        }

        match item.completed_at {
            Some(at) if self.window.contains(at) => Some(Classification::Completed),
            _ => None,
        }
    }
}

fn resolve_status<'a>(item: &WorkItem, states: &'a StateLookup) -> &'a str {
    item.state
        .as_ref()
        .and_then(|id| states.get(id))
        .map(String::as_str)
        .filter(|name| !name.is_empty())
        .unwrap_or(UNKNOWN_STATUS)
}

pub fn normalize_status(name: &str) -> String {
    name.trim().to_lowercase()
}

fn normalize_all<I, S>(names: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    names
        .into_iter()
        .map(|n| normalize_status(n.as_ref()))
        .filter(|n| !n.is_empty())
        .collect()
}
