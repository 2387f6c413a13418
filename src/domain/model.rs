use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Redmine project. Only `identifier` drives the backup; the remaining
/// server fields are kept so they survive in debug output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub identifier: String,
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

impl Project {
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            id: None,
            name: None,
            extra: HashMap::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WikiPageSummary {
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WikiPageFull {
    pub title: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub attachments: Vec<AttachmentRef>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttachmentRef {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub filename: String,
}

impl AttachmentRef {
    /// Id to download, if any. Redmine never issues id 0, so it counts as absent.
    pub fn download_id(&self) -> Option<u64> {
        self.id.filter(|id| *id != 0)
    }
}

// Redmine REST envelopes

#[derive(Debug, Deserialize)]
pub struct ProjectsEnvelope {
    pub projects: Vec<Project>,
}

#[derive(Debug, Deserialize)]
pub struct WikiIndexEnvelope {
    pub wiki_pages: Vec<WikiPageSummary>,
}

#[derive(Debug, Deserialize)]
pub struct WikiPageEnvelope {
    pub wiki_page: WikiPageFull,
}
