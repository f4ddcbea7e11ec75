pub mod client;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

use crate::aggregate::StateLookup;
use crate::model::project::{CurrentUser, Project};
use crate::model::work_item::WorkItem;

pub use client::PlaneClient;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} returned HTTP {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },
    #[error("could not decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

/// The four reads the report pipeline needs.
///
/// Every operation degrades instead of failing: a missing identity is `None`,
/// any other failure is an empty collection.
#[async_trait]
pub trait PlaneApi: Send + Sync {
    async fn current_user(&self) -> Option<CurrentUser>;
    /// The configured project alone, or every project in the workspace.
    async fn list_projects(&self) -> Vec<Project>;
    async fn state_lookup(&self, project: &Project) -> StateLookup;
    /// Items are requested pre-filtered by assignee, but callers must not rely on it.
    async fn work_items(&self, project: &Project, user_id: &str) -> Vec<WorkItem>;
}

/// List responses come either wrapped in a cursor envelope or as a bare array.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum Listing<T> {
    Envelope {
        results: Vec<T>,
        #[serde(default)]
        next_cursor: Option<String>,
        #[serde(default)]
        next_page_results: Option<bool>,
    },
    Bare(Vec<T>),
}

impl<T> Listing<T> {
    /// Cursor for the following page, if the server says there is one.
    pub(crate) fn next_cursor(&self) -> Option<&str> {
        match self {
            Listing::Envelope {
                next_cursor: Some(cursor),
                next_page_results: Some(true),
                ..
            } if !cursor.is_empty() => Some(cursor.as_str()),
            _ => None,
        }
    }

    pub(crate) fn into_items(self) -> Vec<T> {
        match self {
            Listing::Envelope { results, .. } => results,
            Listing::Bare(items) => items,
        }
    }
}

#[cfg(test)]
mod tests;
