use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};

use crate::util::time::parse_instant;

/// Read-only snapshot of a Plane work item.
#[derive(Debug, Clone, Deserialize)]
pub struct WorkItem {
    #[serde(default)]
    pub id: String,
    #[serde(default = "untitled", deserialize_with = "name_or_untitled")]
    pub name: String,
    /// Workflow state id, resolved through the project's state lookup.
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default, deserialize_with = "assignee_ids")]
    pub assignees: BTreeSet<String>,
    #[serde(default, deserialize_with = "lenient_instant")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient_instant")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient_instant")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl WorkItem {
    pub fn is_assigned_to(&self, user_id: &str) -> bool {
        self.assignees.contains(user_id)
    }
}

/// Assignees come back as bare ids, or as member objects when the
/// request asked the server to expand them.
#[derive(Deserialize)]
#[serde(untagged)]
enum AssigneeRef {
    Id(String),
    Member { id: String },
}

fn untitled() -> String {
    "Untitled".into()
}

fn name_or_untitled<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_else(untitled))
}

fn assignee_ids<'de, D>(deserializer: D) -> Result<BTreeSet<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let refs: Option<Vec<AssigneeRef>> = Option::deserialize(deserializer)?;
    Ok(refs
        .unwrap_or_default()
        .into_iter()
        .map(|r| match r {
            AssigneeRef::Id(id) | AssigneeRef::Member { id } => id,
        })
        .collect())
}

fn lenient_instant<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.and_then(|s| {
        let parsed = parse_instant(&s);
        if parsed.is_none() {
            tracing::debug!(value = %s, "ignoring unparseable work item timestamp");
        }
        parsed
    }))
}
