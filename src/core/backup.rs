use crate::config::{DecodePolicies, DecodePolicy};
use crate::core::fetch::{fetch_page, list_wiki_pages};
use crate::core::paginator::list_all_projects;
use crate::core::report::BackupReport;
use crate::core::writer::BackupWriter;
use crate::domain::model::Project;
use crate::domain::ports::{RedmineApi, Storage};
use crate::utils::error::Result;
use std::sync::Arc;
use tokio::task::JoinSet;

/// Drives the crawl: projects, then each project's wiki index, then every
/// page and its attachments. Work fans out per project and per page; the
/// run ends when every task has been joined. The first fatal error cancels
/// the outstanding tasks and is returned.
pub struct BackupEngine<A, S> {
    api: Arc<A>,
    storage: Arc<S>,
    writer: Arc<BackupWriter<A, S>>,
    policies: DecodePolicies,
}

impl<A, S> BackupEngine<A, S>
where
    A: RedmineApi + 'static,
    S: Storage + 'static,
{
    pub fn new(api: A, storage: S) -> Self {
        Self::with_policies(api, storage, DecodePolicies::default())
    }

    pub fn with_policies(api: A, storage: S, policies: DecodePolicies) -> Self {
        let api = Arc::new(api);
        let storage = Arc::new(storage);
        let writer = Arc::new(BackupWriter::new(Arc::clone(&api), Arc::clone(&storage)));
        Self {
            api,
            storage,
            writer,
            policies,
        }
    }

    pub async fn run(&self) -> Result<BackupReport> {
        tracing::info!("Starting wiki backup...");
        let mut report = BackupReport::start();

        self.storage.ensure_root().await?;

        let projects = list_all_projects(self.api.as_ref(), self.policies.projects).await?;
        tracing::info!("{} projects found.", projects.len());
        report.projects = projects.len();

        let mut tasks = JoinSet::new();
        for project in projects {
            tasks.spawn(backup_project(
                Arc::clone(&self.api),
                Arc::clone(&self.writer),
                project,
                self.policies,
            ));
        }

        while let Some(joined) = tasks.join_next().await {
            report.merge(joined??);
        }

        report.finish();
        tracing::info!("Backup finished: {}", report);
        Ok(report)
    }
}

async fn backup_project<A, S>(
    api: Arc<A>,
    writer: Arc<BackupWriter<A, S>>,
    project: Project,
    policies: DecodePolicies,
) -> Result<BackupReport>
where
    A: RedmineApi + 'static,
    S: Storage + 'static,
{
    let mut report = BackupReport::default();

    let Some(pages) = list_wiki_pages(api.as_ref(), &project, policies.wiki_index).await? else {
        report.wiki_indexes_skipped += 1;
        return Ok(report);
    };
    if pages.is_empty() {
        return Ok(report);
    }

    tracing::info!("{} wiki pages found for project {}", pages.len(), project.identifier);
    report.pages_listed = pages.len();

    let project = Arc::new(project);
    let mut tasks = JoinSet::new();
    for summary in pages {
        tasks.spawn(backup_page(
            Arc::clone(&api),
            Arc::clone(&writer),
            Arc::clone(&project),
            summary.title,
            policies.wiki_page,
        ));
    }

    while let Some(joined) = tasks.join_next().await {
        report.merge(joined??);
    }

    Ok(report)
}

async fn backup_page<A, S>(
    api: Arc<A>,
    writer: Arc<BackupWriter<A, S>>,
    project: Arc<Project>,
    title: String,
    policy: DecodePolicy,
) -> Result<BackupReport>
where
    A: RedmineApi + 'static,
    S: Storage + 'static,
{
    match fetch_page(api.as_ref(), &project, &title, policy).await? {
        Some(page) => writer.write_page(&project, &page).await,
        None => Ok(BackupReport {
            pages_skipped: 1,
            ..BackupReport::default()
        }),
    }
}
