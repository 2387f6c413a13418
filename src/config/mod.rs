#[cfg(feature = "cli")]
pub mod cli;

use crate::utils::error::{BackupError, Result};
use crate::utils::validation::{validate_positive_number, validate_url, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_CONFIG_FILE: &str = "config.json";
pub const DEFAULT_MAX_CONCURRENT_REQUESTS: usize = 8;

/// What a fetch does with a response body that is not the expected JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecodePolicy {
    /// Fail the whole backup run.
    Abort,
    /// Log the body and treat the response as empty.
    Skip,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DecodePolicies {
    pub projects: DecodePolicy,
    pub wiki_index: DecodePolicy,
    pub wiki_page: DecodePolicy,
}

impl Default for DecodePolicies {
    fn default() -> Self {
        Self {
            projects: DecodePolicy::Abort,
            wiki_index: DecodePolicy::Skip,
            wiki_page: DecodePolicy::Skip,
        }
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub user: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &self.user)
            .field("password", &"***")
            .finish()
    }
}

/// Transport settings handed to the API client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    pub base_url: String,
    pub credentials: Option<Credentials>,
    pub insecure_tls: bool,
    pub timeout: Option<Duration>,
    pub max_concurrent_requests: usize,
}

impl ServiceConfig {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            credentials: None,
            insecure_tls: false,
            timeout: None,
            max_concurrent_requests: DEFAULT_MAX_CONCURRENT_REQUESTS,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupConfig {
    pub redmine_url: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub output_dir: Option<String>,
    #[serde(default)]
    pub insecure: bool,
    pub max_concurrent_requests: Option<usize>,
    pub request_timeout_secs: Option<u64>,
    #[serde(default)]
    pub decode_errors: DecodePolicies,
}

impl BackupConfig {
    /// 從設定檔載入，副檔名為 .toml 時以 TOML 解析，其餘一律視為 JSON
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| BackupError::ConfigMissing {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;

        let is_toml = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));

        let parsed = if is_toml {
            Self::from_toml_str(&content)
        } else {
            Self::from_json_str(&content)
        };

        parsed.map_err(|e| match e {
            BackupError::ConfigMissing { message, .. } => BackupError::ConfigMissing {
                path: path.display().to_string(),
                message,
            },
            other => other,
        })
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        let processed = substitute_env_vars(content)?;
        serde_json::from_str(&processed).map_err(|e| BackupError::ConfigMissing {
            path: DEFAULT_CONFIG_FILE.to_string(),
            message: format!("JSON parsing error: {}", e),
        })
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed = substitute_env_vars(content)?;
        toml::from_str(&processed).map_err(|e| BackupError::ConfigMissing {
            path: DEFAULT_CONFIG_FILE.to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    pub fn max_concurrent_requests(&self) -> usize {
        self.max_concurrent_requests
            .unwrap_or(DEFAULT_MAX_CONCURRENT_REQUESTS)
    }

    /// Credentials are sent only when both halves are configured.
    pub fn credentials(&self) -> Option<Credentials> {
        match (self.user.as_deref(), self.password.as_deref()) {
            (Some(user), Some(password)) if !user.is_empty() && !password.is_empty() => {
                Some(Credentials {
                    user: user.to_string(),
                    password: password.to_string(),
                })
            }
            _ => None,
        }
    }

    pub fn service_config(&self) -> Result<ServiceConfig> {
        let base_url = self
            .redmine_url
            .as_deref()
            .filter(|url| !url.is_empty())
            .ok_or_else(|| BackupError::ConfigIncomplete {
                field: "redmineUrl".to_string(),
            })?;

        Ok(ServiceConfig {
            credentials: self.credentials(),
            insecure_tls: self.insecure,
            timeout: self.request_timeout_secs.map(Duration::from_secs),
            max_concurrent_requests: self.max_concurrent_requests(),
            ..ServiceConfig::new(base_url)
        })
    }

    /// Backup root: the configured directory, else the working directory.
    pub fn output_root(&self) -> Result<PathBuf> {
        match self.output_dir.as_deref().filter(|dir| !dir.is_empty()) {
            Some(dir) => Ok(PathBuf::from(dir)),
            None => std::env::current_dir().map_err(|e| BackupError::filesystem(".", e)),
        }
    }
}

impl Validate for BackupConfig {
    fn validate(&self) -> Result<()> {
        let url = self
            .redmine_url
            .as_deref()
            .ok_or_else(|| BackupError::ConfigIncomplete {
                field: "redmineUrl".to_string(),
            })?;
        validate_url("redmineUrl", url)?;

        validate_positive_number("maxConcurrentRequests", self.max_concurrent_requests(), 1)?;

        if let Some(timeout) = self.request_timeout_secs {
            validate_positive_number("requestTimeoutSecs", timeout as usize, 1)?;
        }

        Ok(())
    }
}

/// 替換環境變數 (例如 ${REDMINE_PASSWORD})，未定義的變數保留原樣
fn substitute_env_vars(content: &str) -> Result<String> {
    let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| BackupError::ConfigMissing {
        path: DEFAULT_CONFIG_FILE.to_string(),
        message: format!("placeholder pattern error: {}", e),
    })?;

    let result = re.replace_all(content, |caps: &regex::Captures| {
        let var_name = &caps[1];
        std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
    });

    Ok(result.to_string())
}
