use async_trait::async_trait;
use serde::de::DeserializeOwned;

use super::{ApiError, Listing, PlaneApi};
use crate::aggregate::StateLookup;
use crate::config::{Credential, Settings};
use crate::model::project::{CurrentUser, Project, WikiPage, WorkflowState};
use crate::model::work_item::WorkItem;

const PER_PAGE: &str = "100";
/// Upper bound on cursor hops for one listing.
const MAX_PAGES: usize = 50;

pub struct PlaneClient {
    base_url: String,
    workspace: String,
    project_id: Option<String>,
    api_key: Credential,
    client: reqwest::Client,
}

impl PlaneClient {
    pub fn new(settings: &Settings) -> Self {
        Self::with_base(
            settings.base_url.clone(),
            settings.workspace.clone(),
            settings.project_id.clone(),
            settings.credential.clone(),
        )
    }

    pub fn with_base(
        base_url: String,
        workspace: String,
        project_id: Option<String>,
        api_key: Credential,
    ) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            workspace,
            project_id,
            api_key,
            client: reqwest::Client::new(),
        }
    }

    #[cfg(test)]
    pub(crate) fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    fn workspace_url(&self, path: &str) -> String {
        format!(
            "{}/workspaces/{}/{path}",
            self.base_url,
            urlencoding::encode(&self.workspace)
        )
    }

    fn project_url(&self, project_id: &str, path: &str) -> String {
        self.workspace_url(&format!("projects/{}/{path}", urlencoding::encode(project_id)))
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<T, ApiError> {
        let transport = |source: reqwest::Error| ApiError::Transport {
            url: url.to_string(),
            source,
        };
        let resp = self
            .client
            .get(url)
            .header("X-API-Key", self.api_key.expose())
            .header("Content-Type", "application/json")
            .query(query)
            .send()
            .await
            .map_err(transport)?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ApiError::Status {
                url: url.to_string(),
                status,
            });
        }

        let body = resp.text().await.map_err(transport)?;
        serde_json::from_str(&body).map_err(|source| ApiError::Decode {
            url: url.to_string(),
            source,
        })
    }

    /// Follows `next_cursor` until the server reports no further results.
    async fn get_listing<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<Vec<T>, ApiError> {
        let mut items = Vec::new();
        let mut cursor: Option<String> = None;

        for _ in 0..MAX_PAGES {
            let mut params = query.to_vec();
            if let Some(c) = cursor.as_deref() {
                params.push(("cursor", c));
            }
            let page: Listing<T> = self.get_json(url, &params).await?;
            let next = page.next_cursor().map(String::from);
            items.extend(page.into_items());

            match next {
                Some(c) if cursor.as_deref() != Some(c.as_str()) => cursor = Some(c),
                _ => return Ok(items),
            }
        }

        tracing::warn!(url, pages = MAX_PAGES, "stopped following pagination cursor");
        Ok(items)
    }

    pub async fn try_current_user(&self) -> Result<CurrentUser, ApiError> {
        self.get_json(&format!("{}/users/me/", self.base_url), &[]).await
    }

    /// The configured project alone, or the whole workspace collection.
    pub async fn try_projects(&self) -> Result<Vec<Project>, ApiError> {
        match self.project_id.as_deref() {
            Some(id) => {
                let project: Project = self.get_json(&self.project_url(id, ""), &[]).await?;
                Ok(vec![project])
            }
            None => self.try_project_index().await,
        }
    }

    /// Every project in the workspace, ignoring any configured project id.
    pub async fn try_project_index(&self) -> Result<Vec<Project>, ApiError> {
        self.get_listing(&self.workspace_url("projects/"), &[]).await
    }

    pub async fn try_states(&self, project: &Project) -> Result<StateLookup, ApiError> {
        let states: Vec<WorkflowState> = self
            .get_listing(&self.project_url(&project.id, "states/"), &[])
            .await?;
        Ok(states.into_iter().map(|s| (s.id, s.name)).collect())
    }

    pub async fn try_work_items(
        &self,
        project: &Project,
        user_id: &str,
    ) -> Result<Vec<WorkItem>, ApiError> {
        self.get_listing(
            &self.project_url(&project.id, "work-items/"),
            &[("assignees", user_id), ("per_page", PER_PAGE)],
        )
        .await
    }

    pub async fn page(&self, page_id: &str) -> Result<WikiPage, ApiError> {
        let url = self.workspace_url(&format!("pages/{}/", urlencoding::encode(page_id)));
        self.get_json(&url, &[]).await
    }
}

#[async_trait]
impl PlaneApi for PlaneClient {
    async fn current_user(&self) -> Option<CurrentUser> {
        self.try_current_user()
            .await
            .map_err(|e| tracing::warn!(error = %e, "could not resolve current user"))
            .ok()
    }

    async fn list_projects(&self) -> Vec<Project> {
        self.try_projects().await.unwrap_or_else(|e| {
            tracing::warn!(error = %e, "could not list projects");
            Vec::new()
        })
    }

    async fn state_lookup(&self, project: &Project) -> StateLookup {
        self.try_states(project).await.unwrap_or_else(|e| {
            tracing::warn!(project = %project.name, error = %e, "could not fetch workflow states");
            StateLookup::new()
        })
    }

    async fn work_items(&self, project: &Project, user_id: &str) -> Vec<WorkItem> {
        self.try_work_items(project, user_id).await.unwrap_or_else(|e| {
            tracing::warn!(project = %project.name, error = %e, "could not fetch work items");
            Vec::new()
        })
    }
}
