use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

/// Aggregate outcome of a backup run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BackupReport {
    pub projects: usize,
    pub wiki_indexes_skipped: usize,
    pub pages_listed: usize,
    pub pages_written: usize,
    pub pages_skipped: usize,
    pub attachments_written: usize,
    pub attachments_skipped: usize,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl BackupReport {
    pub fn start() -> Self {
        Self {
            started_at: Some(Utc::now()),
            ..Self::default()
        }
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    /// Adds the counters of a sub-task; timestamps stay untouched.
    pub fn merge(&mut self, other: BackupReport) {
        self.projects += other.projects;
        self.wiki_indexes_skipped += other.wiki_indexes_skipped;
        self.pages_listed += other.pages_listed;
        self.pages_written += other.pages_written;
        self.pages_skipped += other.pages_skipped;
        self.attachments_written += other.attachments_written;
        self.attachments_skipped += other.attachments_skipped;
    }

    pub fn is_complete(&self) -> bool {
        self.wiki_indexes_skipped == 0 && self.pages_skipped == 0 && self.attachments_skipped == 0
    }

    pub fn elapsed(&self) -> Option<chrono::Duration> {
        Some(self.finished_at? - self.started_at?)
    }
}

impl fmt::Display for BackupReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} projects, {}/{} wiki pages written ({} skipped), {} attachments written ({} skipped), {} wiki indexes skipped",
            self.projects,
            self.pages_written,
            self.pages_listed,
            self.pages_skipped,
            self.attachments_written,
            self.attachments_skipped,
            self.wiki_indexes_skipped
        )?;
        if let Some(elapsed) = self.elapsed() {
            write!(f, " in {:.1}s", elapsed.num_milliseconds() as f64 / 1000.0)?;
        }
        Ok(())
    }
}
