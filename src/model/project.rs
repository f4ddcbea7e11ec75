use serde::{Deserialize, Deserializer};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Project {
    #[serde(default)]
    pub id: String,
    #[serde(default = "unknown_name", deserialize_with = "name_or_unknown")]
    pub name: String,
    #[serde(default = "missing_identifier", deserialize_with = "identifier_or_missing")]
    pub identifier: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WorkflowState {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CurrentUser {
    pub id: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
}

impl CurrentUser {
    pub fn display_name(&self) -> String {
        format!(
            "{} {}",
            self.first_name.as_deref().unwrap_or_default(),
            self.last_name.as_deref().unwrap_or_default()
        )
        .trim()
        .to_string()
    }
}

/// A workspace wiki page.
#[derive(Debug, Clone, Deserialize)]
pub struct WikiPage {
    #[serde(default)]
    pub id: String,
    pub name: Option<String>,
    pub created_by: Option<String>,
    pub description_html: Option<String>,
    pub description: Option<serde_json::Value>,
}

impl WikiPage {
    pub fn title(&self) -> &str {
        self.name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or("No Title")
    }

    pub fn author(&self) -> &str {
        self.created_by.as_deref().unwrap_or("Unknown")
    }

    /// HTML body if the server sent one, else the plain description.
    pub fn content(&self) -> Option<String> {
        if let Some(html) = self.description_html.as_ref().filter(|h| !h.trim().is_empty()) {
            return Some(html.clone());
        }
        match &self.description {
            None | Some(serde_json::Value::Null) => None,
            Some(serde_json::Value::String(s)) if s.trim().is_empty() => None,
            Some(serde_json::Value::String(s)) => Some(s.clone()),
            Some(other) => Some(other.to_string()),
        }
    }
}

fn unknown_name() -> String {
    "Unknown".into()
}

fn missing_identifier() -> String {
    "N/A".into()
}

fn name_or_unknown<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_else(unknown_name))
}

fn identifier_or_missing<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_else(missing_identifier))
}
