use crate::config::DecodePolicy;
use crate::domain::model::{AttachmentRef, Project, WikiPageFull, WikiPageSummary};
use crate::domain::ports::RedmineApi;
use crate::utils::error::{BackupError, Result};
use reqwest::StatusCode;

/// Lists the wiki of one project. A 404 is an empty wiki. `Ok(None)` means
/// the index was skipped (request failed, or an unreadable body under
/// `DecodePolicy::Skip`).
pub async fn list_wiki_pages<A: RedmineApi + ?Sized>(
    api: &A,
    project: &Project,
    policy: DecodePolicy,
) -> Result<Option<Vec<WikiPageSummary>>> {
    match api.wiki_index(&project.identifier).await {
        Ok(pages) => Ok(Some(pages)),
        Err(e) if e.is_decode() => match policy {
            DecodePolicy::Skip => {
                tracing::warn!("[{}] Cannot parse wiki index: {}", project.identifier, e);
                Ok(None)
            }
            DecodePolicy::Abort => Err(e),
        },
        // Projects with the wiki module disabled answer 404.
        Err(BackupError::HttpStatus { status, .. }) if status == StatusCode::NOT_FOUND => {
            tracing::debug!("[{}] No wiki", project.identifier);
            Ok(Some(Vec::new()))
        }
        Err(e) => {
            tracing::warn!("[{}] Wiki index request failed: {}", project.identifier, e);
            Ok(None)
        }
    }
}

/// Fetches one page with its attachment metadata. `Ok(None)` means the page
/// is skipped and nothing will be written for it.
pub async fn fetch_page<A: RedmineApi + ?Sized>(
    api: &A,
    project: &Project,
    title: &str,
    policy: DecodePolicy,
) -> Result<Option<WikiPageFull>> {
    tracing::info!("[{}] requesting wiki page {}...", project.identifier, title);

    match api.wiki_page(&project.identifier, title).await {
        Ok(page) => Ok(Some(page)),
        Err(e) if e.is_decode() => match policy {
            DecodePolicy::Skip => {
                tracing::warn!("[{}][{}] Cannot parse wiki page: {}", project.identifier, title, e);
                Ok(None)
            }
            DecodePolicy::Abort => Err(e),
        },
        Err(e) => {
            tracing::warn!("[{}][{}] Wiki page request failed: {}", project.identifier, title, e);
            Ok(None)
        }
    }
}

/// Downloads attachment content. Never fails the run: a reference without
/// a usable id, a failed request or an empty body all yield `None`.
pub async fn fetch_attachment<A: RedmineApi + ?Sized>(
    api: &A,
    attachment: &AttachmentRef,
) -> Option<Vec<u8>> {
    let id = attachment.download_id()?;

    match api.attachment(id).await {
        Ok(content) if content.is_empty() => {
            tracing::debug!("Attachment {} ({}) has an empty body", id, attachment.filename);
            None
        }
        Ok(content) => Some(content),
        Err(e) => {
            tracing::warn!("Attachment {} ({}) skipped: {}", id, attachment.filename, e);
            None
        }
    }
}
