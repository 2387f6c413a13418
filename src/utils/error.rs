use std::path::PathBuf;
use thiserror::Error;

/// 診斷用的回應內容上限
pub const MAX_BODY_SNIPPET: usize = 1000;

#[derive(Error, Debug)]
pub enum BackupError {
    #[error("Configuration file {path} could not be loaded: {message}")]
    ConfigMissing { path: String, message: String },

    #[error("Missing required configuration: {field}")]
    ConfigIncomplete { field: String },

    #[error("Invalid configuration value for {field}: '{value}' ({reason})")]
    InvalidConfigValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Request to {path} failed: {source}")]
    Transport {
        path: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Request to {path} returned HTTP {status}: {body}")]
    HttpStatus {
        path: String,
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("Cannot parse JSON from {path}: {source}; body: {body}")]
    Decode {
        path: String,
        #[source]
        source: serde_json::Error,
        body: String,
    },

    #[error("Filesystem operation on {path:?} failed: {source}")]
    Filesystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unsafe {kind} '{value}' cannot be used as a path segment: {reason}")]
    UnsafePathSegment {
        kind: String,
        value: String,
        reason: String,
    },

    #[error("Backup task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Network,
    Data,
    Filesystem,
    Internal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl BackupError {
    pub fn decode(path: &str, source: serde_json::Error, body: &[u8]) -> Self {
        BackupError::Decode {
            path: path.to_string(),
            source,
            body: body_snippet(body),
        }
    }

    pub fn filesystem(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        BackupError::Filesystem {
            path: path.into(),
            source,
        }
    }

    /// Decode failures are the only class governed by a per-fetch policy.
    pub fn is_decode(&self) -> bool {
        matches!(self, BackupError::Decode { .. })
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            BackupError::ConfigMissing { .. }
            | BackupError::ConfigIncomplete { .. }
            | BackupError::InvalidConfigValue { .. } => ErrorCategory::Configuration,
            BackupError::Transport { .. } | BackupError::HttpStatus { .. } => {
                ErrorCategory::Network
            }
            BackupError::Decode { .. } => ErrorCategory::Data,
            BackupError::Filesystem { .. } | BackupError::UnsafePathSegment { .. } => {
                ErrorCategory::Filesystem
            }
            BackupError::Task(_) => ErrorCategory::Internal,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            // 設定錯誤時直接結束，不視為失敗
            ErrorCategory::Configuration => ErrorSeverity::Low,
            ErrorCategory::Network => ErrorSeverity::Medium,
            ErrorCategory::Data => ErrorSeverity::High,
            ErrorCategory::Filesystem | ErrorCategory::Internal => ErrorSeverity::Critical,
        }
    }

    pub fn exit_code(&self) -> i32 {
        match self.severity() {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            BackupError::ConfigMissing { .. } => {
                "Create a config.json with at least a redmineUrl key, or pass --config"
            }
            BackupError::ConfigIncomplete { .. } => "Add the missing key to the configuration file",
            BackupError::InvalidConfigValue { .. } => "Fix the configuration value and retry",
            BackupError::Transport { .. } => {
                "Check that the Redmine server is reachable; set insecure=true for self-signed certificates"
            }
            BackupError::HttpStatus { .. } => {
                "Check the credentials and that the REST API is enabled on the Redmine server"
            }
            BackupError::Decode { .. } => {
                "The server did not answer with JSON; check the redmineUrl and REST API settings"
            }
            BackupError::Filesystem { .. } => {
                "Check that the output directory is writable and has free space"
            }
            BackupError::UnsafePathSegment { .. } => {
                "Rename the offending project, page or attachment on the server"
            }
            BackupError::Task(_) => "Re-run the backup; report the issue if it persists",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            BackupError::ConfigMissing { path, .. } => {
                format!("No usable configuration file found at {}", path)
            }
            BackupError::ConfigIncomplete { field } => {
                format!("Cannot find {} in the configuration", field)
            }
            BackupError::Transport { path, .. } | BackupError::HttpStatus { path, .. } => {
                format!("Could not retrieve {} from the Redmine server", path)
            }
            BackupError::Decode { path, .. } => {
                format!("The Redmine server returned an unreadable response for {}", path)
            }
            other => other.to_string(),
        }
    }
}

pub fn body_snippet(body: &[u8]) -> String {
    let text = String::from_utf8_lossy(body);
    if text.len() > MAX_BODY_SNIPPET {
        let mut end = MAX_BODY_SNIPPET;
        while !text.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &text[..end])
    } else {
        text.into_owned()
    }
}

pub type Result<T> = std::result::Result<T, BackupError>;
