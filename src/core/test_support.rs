//! In-memory fakes of the domain ports shared by the core unit tests.

use crate::adapters::http::{attachment_path, projects_path, wiki_index_path, wiki_page_path};
use crate::core::paginator::PROJECTS_PER_PAGE;
use crate::domain::model::{AttachmentRef, Project, WikiPageFull, WikiPageSummary};
use crate::domain::ports::{RedmineApi, Storage};
use crate::utils::error::{BackupError, Result};
use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Mutex as StdMutex;
use tokio::sync::Mutex;

#[derive(Clone)]
pub(crate) enum Reply<T> {
    Ok(T),
    Malformed,
    Status(u16),
}

impl<T: Clone> Reply<T> {
    fn resolve(&self, path: &str) -> Result<T> {
        match self {
            Reply::Ok(value) => Ok(value.clone()),
            Reply::Malformed => {
                let body = b"<html>502 Bad Gateway</html>";
                let source = serde_json::from_slice::<serde_json::Value>(body).unwrap_err();
                Err(BackupError::decode(path, source, body))
            }
            Reply::Status(code) => Err(BackupError::HttpStatus {
                path: path.to_string(),
                status: reqwest::StatusCode::from_u16(*code).unwrap(),
                body: String::new(),
            }),
        }
    }
}

#[derive(Default)]
pub(crate) struct ScriptedApi {
    project_pages: Vec<Reply<Vec<Project>>>,
    wiki_indexes: HashMap<String, Reply<Vec<WikiPageSummary>>>,
    pages: HashMap<(String, String), Reply<WikiPageFull>>,
    attachments: HashMap<u64, Reply<Vec<u8>>>,
    calls: StdMutex<Vec<String>>,
}

impl ScriptedApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_project_page(mut self, reply: Reply<Vec<Project>>) -> Self {
        self.project_pages.push(reply);
        self
    }

    pub fn with_wiki_index(mut self, project: &str, reply: Reply<Vec<WikiPageSummary>>) -> Self {
        self.wiki_indexes.insert(project.to_string(), reply);
        self
    }

    pub fn with_page(mut self, project: &str, page: WikiPageFull) -> Self {
        self.pages
            .insert((project.to_string(), page.title.clone()), Reply::Ok(page));
        self
    }

    pub fn with_page_reply(mut self, project: &str, title: &str, reply: Reply<WikiPageFull>) -> Self {
        self.pages
            .insert((project.to_string(), title.to_string()), reply);
        self
    }

    pub fn with_attachment(mut self, id: u64, reply: Reply<Vec<u8>>) -> Self {
        self.attachments.insert(id, reply);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn requested_offsets(&self) -> Vec<usize> {
        self.calls()
            .iter()
            .filter_map(|call| call.strip_prefix("/projects.json?offset="))
            .map(|offset| offset.parse().unwrap())
            .collect()
    }

    fn record(&self, path: &str) {
        self.calls.lock().unwrap().push(path.to_string());
    }
}

#[async_trait]
impl RedmineApi for ScriptedApi {
    async fn project_page(&self, offset: usize) -> Result<Vec<Project>> {
        let path = projects_path(offset);
        self.record(&path);
        match self.project_pages.get(offset / PROJECTS_PER_PAGE) {
            Some(reply) => reply.resolve(&path),
            None => Ok(Vec::new()),
        }
    }

    async fn wiki_index(&self, project_identifier: &str) -> Result<Vec<WikiPageSummary>> {
        let path = wiki_index_path(project_identifier);
        self.record(&path);
        match self.wiki_indexes.get(project_identifier) {
            Some(reply) => reply.resolve(&path),
            None => Ok(Vec::new()),
        }
    }

    async fn wiki_page(&self, project_identifier: &str, title: &str) -> Result<WikiPageFull> {
        let path = wiki_page_path(project_identifier, title);
        self.record(&path);
        self.pages
            .get(&(project_identifier.to_string(), title.to_string()))
            .cloned()
            .unwrap_or(Reply::Status(404))
            .resolve(&path)
    }

    async fn attachment(&self, id: u64) -> Result<Vec<u8>> {
        let path = attachment_path(id);
        self.record(&path);
        self.attachments
            .get(&id)
            .cloned()
            .unwrap_or(Reply::Status(404))
            .resolve(&path)
    }
}

#[derive(Default)]
pub(crate) struct MemoryStorage {
    dirs: Mutex<BTreeSet<PathBuf>>,
    files: Mutex<BTreeMap<PathBuf, Vec<u8>>>,
    read_only: bool,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every directory creation fails with PermissionDenied.
    pub fn read_only() -> Self {
        Self {
            read_only: true,
            ..Self::default()
        }
    }

    pub async fn get_file(&self, path: &str) -> Option<Vec<u8>> {
        self.files.lock().await.get(Path::new(path)).cloned()
    }

    pub async fn has_dir(&self, path: &str) -> bool {
        self.dirs.lock().await.contains(Path::new(path))
    }

    pub async fn file_count(&self) -> usize {
        self.files.lock().await.len()
    }
}

impl Storage for MemoryStorage {
    async fn ensure_root(&self) -> Result<()> {
        Ok(())
    }

    async fn ensure_dir(&self, path: &Path) -> Result<()> {
        if self.read_only {
            return Err(BackupError::filesystem(
                path,
                std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only"),
            ));
        }
        self.dirs.lock().await.insert(path.to_path_buf());
        Ok(())
    }

    async fn write_file(&self, path: &Path, data: &[u8]) -> Result<()> {
        self.files
            .lock()
            .await
            .insert(path.to_path_buf(), data.to_vec());
        Ok(())
    }
}

pub(crate) fn projects(prefix: &str, count: usize) -> Vec<Project> {
    (0..count)
        .map(|i| Project::new(format!("{}-{}", prefix, i)))
        .collect()
}

pub(crate) fn summaries(titles: &[&str]) -> Vec<WikiPageSummary> {
    titles
        .iter()
        .map(|title| WikiPageSummary {
            title: title.to_string(),
        })
        .collect()
}

pub(crate) fn page(title: &str, text: &str, attachments: Vec<AttachmentRef>) -> WikiPageFull {
    WikiPageFull {
        title: title.to_string(),
        text: text.to_string(),
        attachments,
    }
}

pub(crate) fn attachment(id: u64, filename: &str) -> AttachmentRef {
    AttachmentRef {
        id: Some(id),
        filename: filename.to_string(),
    }
}
