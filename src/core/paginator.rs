use crate::config::DecodePolicy;
use crate::domain::model::Project;
use crate::domain::ports::RedmineApi;
use crate::utils::error::Result;

/// Redmine's default page size for `/projects.json`.
pub const PROJECTS_PER_PAGE: usize = 25;

/// Walks the project list page by page. A page is the last one iff it holds
/// fewer than `PROJECTS_PER_PAGE` entries, so a full final page costs one
/// extra (empty) request.
pub async fn list_all_projects<A: RedmineApi + ?Sized>(
    api: &A,
    policy: DecodePolicy,
) -> Result<Vec<Project>> {
    let mut projects = Vec::new();
    let mut page = 0;

    loop {
        let offset = page * PROJECTS_PER_PAGE;
        tracing::info!("requesting projects list (page={})...", page);

        let batch = match api.project_page(offset).await {
            Ok(batch) => batch,
            Err(e) if e.is_decode() && policy == DecodePolicy::Skip => {
                tracing::warn!("Treating unreadable projects page {} as empty: {}", page, e);
                Vec::new()
            }
            Err(e) => {
                tracing::error!("Project listing aborted at page {}: {}", page, e);
                return Err(e);
            }
        };

        let count = batch.len();
        projects.extend(batch);

        if count < PROJECTS_PER_PAGE {
            break;
        }
        page += 1;
    }

    Ok(projects)
}
