use crate::config::{Credentials, ServiceConfig};
use crate::domain::model::{
    Project, ProjectsEnvelope, WikiIndexEnvelope, WikiPageEnvelope, WikiPageFull,
    WikiPageSummary,
};
use crate::domain::ports::RedmineApi;
use crate::utils::error::{body_snippet, BackupError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tokio::sync::Semaphore;

pub fn projects_path(offset: usize) -> String {
    format!("/projects.json?offset={}", offset)
}

pub fn wiki_index_path(project_identifier: &str) -> String {
    format!("/projects/{}/wiki/index.json", project_identifier)
}

pub fn wiki_page_path(project_identifier: &str, title: &str) -> String {
    format!(
        "/projects/{}/wiki/{}.json?include=attachments",
        project_identifier,
        urlencoding::encode(title)
    )
}

pub fn attachment_path(id: u64) -> String {
    format!("/attachments/download/{}", id)
}

/// Authenticated client for the Redmine REST API. Every request holds a
/// permit from a shared semaphore for its whole lifetime.
#[derive(Debug, Clone)]
pub struct RedmineClient {
    base_url: String,
    credentials: Option<Credentials>,
    http: Client,
    limiter: Arc<Semaphore>,
}

impl RedmineClient {
    pub fn new(config: ServiceConfig) -> Result<Self> {
        let mut builder = Client::builder().danger_accept_invalid_certs(config.insecure_tls);
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().map_err(|source| BackupError::Transport {
            path: config.base_url.clone(),
            source,
        })?;

        if config.insecure_tls {
            tracing::warn!("TLS certificate validation is disabled for {}", config.base_url);
        }

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            credentials: config.credentials,
            http,
            limiter: Arc::new(Semaphore::new(config.max_concurrent_requests.max(1))),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn send(&self, path: &str) -> Result<Vec<u8>> {
        // The semaphore is never closed, so acquiring can only wait.
        let _permit = self.limiter.acquire().await.ok();

        tracing::debug!("requesting {}...", path);
        let mut request = self.http.get(format!("{}{}", self.base_url, path));
        if let Some(credentials) = &self.credentials {
            request = request.basic_auth(&credentials.user, Some(&credentials.password));
        }

        let response = request.send().await.map_err(|source| BackupError::Transport {
            path: path.to_string(),
            source,
        })?;
        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|source| BackupError::Transport {
                path: path.to_string(),
                source,
            })?;

        tracing::debug!("{} -> {} ({} bytes)", path, status, body.len());

        if !status.is_success() {
            return Err(BackupError::HttpStatus {
                path: path.to_string(),
                status,
                body: body_snippet(&body),
            });
        }

        Ok(body.to_vec())
    }

    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let body = self.send(path).await?;
        serde_json::from_slice(&body).map_err(|source| BackupError::decode(path, source, &body))
    }

    pub async fn get_binary(&self, path: &str) -> Result<Vec<u8>> {
        self.send(path).await
    }
}

#[async_trait]
impl RedmineApi for RedmineClient {
    async fn project_page(&self, offset: usize) -> Result<Vec<Project>> {
        let envelope: ProjectsEnvelope = self.get_json(&projects_path(offset)).await?;
        Ok(envelope.projects)
    }

    async fn wiki_index(&self, project_identifier: &str) -> Result<Vec<WikiPageSummary>> {
        let envelope: WikiIndexEnvelope =
            self.get_json(&wiki_index_path(project_identifier)).await?;
        Ok(envelope.wiki_pages)
    }

    async fn wiki_page(&self, project_identifier: &str, title: &str) -> Result<WikiPageFull> {
        let envelope: WikiPageEnvelope = self
            .get_json(&wiki_page_path(project_identifier, title))
            .await?;
        Ok(envelope.wiki_page)
    }

    async fn attachment(&self, id: u64) -> Result<Vec<u8>> {
        self.get_binary(&attachment_path(id)).await
    }
}
