use crate::domain::model::{Project, WikiPageFull, WikiPageSummary};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::path::Path;

/// Local backup target. Paths are relative to the backup root.
pub trait Storage: Send + Sync {
    fn ensure_root(&self) -> impl std::future::Future<Output = Result<()>> + Send;
    /// Single-level create; an existing directory counts as success.
    fn ensure_dir(&self, path: &Path) -> impl std::future::Future<Output = Result<()>> + Send;
    fn write_file(
        &self,
        path: &Path,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

/// Remote Redmine REST surface consumed by the backup.
#[async_trait]
pub trait RedmineApi: Send + Sync {
    /// One page of the project list starting at `offset`.
    async fn project_page(&self, offset: usize) -> Result<Vec<Project>>;
    async fn wiki_index(&self, project_identifier: &str) -> Result<Vec<WikiPageSummary>>;
    /// Full page including attachment metadata.
    async fn wiki_page(&self, project_identifier: &str, title: &str) -> Result<WikiPageFull>;
    async fn attachment(&self, id: u64) -> Result<Vec<u8>>;
}
