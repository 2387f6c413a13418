use crate::utils::error::{BackupError, Result};
use url::Url;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_url(field_name: &str, url_str: &str) -> Result<()> {
    if url_str.is_empty() {
        return Err(BackupError::ConfigIncomplete {
            field: field_name.to_string(),
        });
    }

    match Url::parse(url_str) {
        Ok(url) => match url.scheme() {
            "http" | "https" => Ok(()),
            scheme => Err(BackupError::InvalidConfigValue {
                field: field_name.to_string(),
                value: url_str.to_string(),
                reason: format!("Unsupported URL scheme: {}", scheme),
            }),
        },
        Err(e) => Err(BackupError::InvalidConfigValue {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: format!("Invalid URL format: {}", e),
        }),
    }
}

pub fn validate_positive_number(field_name: &str, value: usize, min_value: usize) -> Result<()> {
    if value < min_value {
        return Err(BackupError::InvalidConfigValue {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be at least {}", min_value),
        });
    }
    Ok(())
}

/// Rejects names that would escape or alias their parent directory once
/// joined onto a path. Names are checked, never rewritten.
pub fn validate_path_segment(kind: &str, value: &str) -> Result<()> {
    let reason = if value.is_empty() {
        Some("name is empty".to_string())
    } else if value == "." || value == ".." {
        Some("name is a relative directory reference".to_string())
    } else {
        value
            .chars()
            .find(|c| matches!(c, '/' | '\\' | '\0'))
            .map(|c| format!("contains {:?}", c))
    };

    match reason {
        Some(reason) => Err(BackupError::UnsafePathSegment {
            kind: kind.to_string(),
            value: value.to_string(),
            reason,
        }),
        None => Ok(()),
    }
}
