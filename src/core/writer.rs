use crate::core::fetch::fetch_attachment;
use crate::core::report::BackupReport;
use crate::domain::model::{Project, WikiPageFull};
use crate::domain::ports::{RedmineApi, Storage};
use crate::utils::error::{BackupError, Result};
use crate::utils::validation::validate_path_segment;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::task::JoinSet;

pub const ATTACHMENTS_DIR: &str = "attachments";

/// Materializes fetched pages as `<project>/<title>.md` and
/// `<project>/attachments/<filename>` under the storage root.
pub struct BackupWriter<A, S> {
    api: Arc<A>,
    storage: Arc<S>,
}

impl<A, S> BackupWriter<A, S>
where
    A: RedmineApi + 'static,
    S: Storage + 'static,
{
    pub fn new(api: Arc<A>, storage: Arc<S>) -> Self {
        Self { api, storage }
    }

    pub async fn write_page(&self, project: &Project, page: &WikiPageFull) -> Result<BackupReport> {
        validate_path_segment("project identifier", &project.identifier)?;
        validate_path_segment("page title", &page.title)?;
        for attachment in page.attachments.iter().filter(|a| a.download_id().is_some()) {
            validate_path_segment("attachment filename", &attachment.filename)?;
        }

        let project_dir = PathBuf::from(&project.identifier);
        self.storage.ensure_dir(&project_dir).await?;

        let page_path = project_dir.join(format!("{}.md", page.title));
        self.storage
            .write_file(&page_path, page.text.as_bytes())
            .await?;
        tracing::debug!("[{}] wrote {}", project.identifier, page_path.display());

        let mut report = BackupReport {
            pages_written: 1,
            ..BackupReport::default()
        };

        if page.attachments.is_empty() {
            return Ok(report);
        }

        let attachment_dir = project_dir.join(ATTACHMENTS_DIR);
        self.storage.ensure_dir(&attachment_dir).await?;

        let mut downloads = JoinSet::new();
        for attachment in page.attachments.iter().cloned() {
            let api = Arc::clone(&self.api);
            let storage = Arc::clone(&self.storage);
            let path = attachment_dir.join(&attachment.filename);

            downloads.spawn(async move {
                let Some(content) = fetch_attachment(api.as_ref(), &attachment).await else {
                    return Ok(false);
                };
                storage.write_file(&path, &content).await?;
                tracing::debug!("wrote attachment {} ({} bytes)", path.display(), content.len());
                Ok::<bool, BackupError>(true)
            });
        }

        // 附件互相獨立，完成順序不固定
        while let Some(joined) = downloads.join_next().await {
            if joined?? {
                report.attachments_written += 1;
            } else {
                report.attachments_skipped += 1;
            }
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::test_support::{attachment, page, MemoryStorage, Reply, ScriptedApi};
    use crate::domain::model::AttachmentRef;

    fn writer(api: ScriptedApi, storage: Arc<MemoryStorage>) -> BackupWriter<ScriptedApi, MemoryStorage> {
        BackupWriter::new(Arc::new(api), storage)
    }

    #[tokio::test]
    async fn test_write_page_without_attachments() {
        let storage = Arc::new(MemoryStorage::new());
        let writer = writer(ScriptedApi::new(), storage.clone());

        let report = writer
            .write_page(&Project::new("demo"), &page("Home", "hi", vec![]))
            .await
            .unwrap();

        assert_eq!(report.pages_written, 1);
        assert_eq!(storage.get_file("demo/Home.md").await, Some(b"hi".to_vec()));
        assert!(storage.has_dir("demo").await);
        assert!(!storage.has_dir("demo/attachments").await);
        assert_eq!(storage.file_count().await, 1);
    }

    #[tokio::test]
    async fn test_write_page_with_attachments() {
        let api = ScriptedApi::new()
            .with_attachment(1, Reply::Ok(vec![0xde, 0xad]))
            .with_attachment(2, Reply::Ok(b"second".to_vec()));
        let storage = Arc::new(MemoryStorage::new());
        let writer = writer(api, storage.clone());

        let full = page(
            "Design",
            "h1. Design",
            vec![attachment(1, "diagram.png"), attachment(2, "notes.txt")],
        );
        let report = writer.write_page(&Project::new("demo"), &full).await.unwrap();

        assert_eq!(report.attachments_written, 2);
        assert_eq!(report.attachments_skipped, 0);
        assert!(storage.has_dir("demo/attachments").await);
        assert_eq!(
            storage.get_file("demo/attachments/diagram.png").await,
            Some(vec![0xde, 0xad])
        );
        assert_eq!(
            storage.get_file("demo/attachments/notes.txt").await,
            Some(b"second".to_vec())
        );
    }

    #[tokio::test]
    async fn test_failed_attachment_does_not_affect_siblings() {
        let api = ScriptedApi::new()
            .with_attachment(1, Reply::Status(500))
            .with_attachment(2, Reply::Ok(b"ok".to_vec()));
        let storage = Arc::new(MemoryStorage::new());
        let writer = writer(api, storage.clone());

        let orphan = AttachmentRef {
            id: None,
            filename: String::new(),
        };
        let full = page(
            "Home",
            "hi",
            vec![attachment(1, "broken.bin"), attachment(2, "fine.bin"), orphan],
        );
        let report = writer.write_page(&Project::new("demo"), &full).await.unwrap();

        assert_eq!(report.attachments_written, 1);
        assert_eq!(report.attachments_skipped, 2);
        assert!(storage.get_file("demo/attachments/broken.bin").await.is_none());
        assert_eq!(
            storage.get_file("demo/attachments/fine.bin").await,
            Some(b"ok".to_vec())
        );
    }

    #[tokio::test]
    async fn test_attachment_with_zero_id_is_skipped_without_request() {
        let api = Arc::new(ScriptedApi::new().with_attachment(0, Reply::Ok(b"stray".to_vec())));
        let storage = Arc::new(MemoryStorage::new());
        let writer = BackupWriter::new(api.clone(), storage.clone());

        // id 0 的附件不下載，也不檢查檔名
        let full = page("Home", "hi", vec![attachment(0, "")]);
        let report = writer.write_page(&Project::new("demo"), &full).await.unwrap();

        assert_eq!(report.attachments_written, 0);
        assert_eq!(report.attachments_skipped, 1);
        assert!(api.calls().is_empty());
        assert_eq!(storage.file_count().await, 1);
    }

    #[tokio::test]
    async fn test_write_page_overwrites_existing_content() {
        let storage = Arc::new(MemoryStorage::new());
        let writer = writer(ScriptedApi::new(), storage.clone());
        let project = Project::new("demo");

        writer.write_page(&project, &page("Home", "old", vec![])).await.unwrap();
        writer.write_page(&project, &page("Home", "new", vec![])).await.unwrap();

        assert_eq!(storage.get_file("demo/Home.md").await, Some(b"new".to_vec()));
        assert_eq!(storage.file_count().await, 1);
    }

    #[tokio::test]
    async fn test_unsafe_title_is_rejected_before_writing() {
        let storage = Arc::new(MemoryStorage::new());
        let writer = writer(ScriptedApi::new(), storage.clone());

        let err = writer
            .write_page(&Project::new("demo"), &page("../escape", "x", vec![]))
            .await
            .unwrap_err();

        assert!(matches!(err, BackupError::UnsafePathSegment { .. }));
        assert_eq!(storage.file_count().await, 0);
        assert!(!storage.has_dir("demo").await);
    }

    #[tokio::test]
    async fn test_unsafe_attachment_filename_is_rejected() {
        let storage = Arc::new(MemoryStorage::new());
        let writer = writer(ScriptedApi::new(), storage.clone());

        let full = page("Home", "hi", vec![attachment(1, "sub/dir.png")]);
        let err = writer.write_page(&Project::new("demo"), &full).await.unwrap_err();

        assert!(matches!(err, BackupError::UnsafePathSegment { .. }));
        assert_eq!(storage.file_count().await, 0);
    }

    #[tokio::test]
    async fn test_directory_failure_propagates() {
        let storage = Arc::new(MemoryStorage::read_only());
        let writer = writer(ScriptedApi::new(), storage);

        let err = writer
            .write_page(&Project::new("demo"), &page("Home", "hi", vec![]))
            .await
            .unwrap_err();

        assert!(matches!(err, BackupError::Filesystem { .. }));
    }
}
