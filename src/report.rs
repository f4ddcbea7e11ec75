use anyhow::{bail, Result};

use crate::aggregate::Aggregator;
use crate::model::summary::Report;
use crate::plane::PlaneApi;

/// Fetch, filter and aggregate one report.
///
/// A missing identity aborts the run. Everything else that goes wrong on the
/// wire only shrinks the result; `Ok(None)` means no project had anything to
/// report.
pub async fn build_report(api: &dyn PlaneApi, aggregator: &Aggregator) -> Result<Option<Report>> {
    let Some(user) = api.current_user().await.filter(|u| !u.id.is_empty()) else {
        bail!("Could not resolve the current user. Check domain/keys in config.");
    };
    let user_name = user.display_name();
    let window = aggregator.window();

    println!("user: {user_name}");
    println!("period: {} to {}", window.start.date_naive(), window.end.date_naive());

    let mut summaries = Vec::new();
    for project in api.list_projects().await {
        if project.id.is_empty() {
            tracing::warn!(project = %project.name, "skipping project without an id");
            continue;
        }
        println!("   ...checking {}", project.name);

        let states = api.state_lookup(&project).await;
        let items = api.work_items(&project, &user.id).await;
        tracing::debug!(
            project = %project.name,
            states = states.len(),
            items = items.len(),
            "fetched project data"
        );

        if let Some(summary) = aggregator.summarize(&project, &states, &items, &user.id) {
            tracing::info!(
                project = %summary.project_name,
                active = summary.active_count,
                completed = summary.completed_count,
                "project summarized"
            );
            summaries.push(summary);
        }
    }

    if summaries.is_empty() {
        return Ok(None);
    }

    Ok(Some(Report {
        user_name,
        window,
        summaries,
    }))
}
