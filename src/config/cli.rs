use crate::config::{BackupConfig, DEFAULT_CONFIG_FILE};
use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "redmine-wiki-backup")]
#[command(about = "Back up every Redmine wiki page and attachment to a local directory tree")]
pub struct CliArgs {
    #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    #[arg(long, help = "Override outputDir from the configuration file")]
    pub output_dir: Option<String>,

    #[arg(long, help = "Override maxConcurrentRequests from the configuration file")]
    pub max_concurrent_requests: Option<usize>,

    #[arg(long, help = "Skip TLS certificate validation")]
    pub insecure: bool,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON lines")]
    pub log_json: bool,
}

impl CliArgs {
    /// 命令列參數優先於設定檔
    pub fn apply_to(&self, config: &mut BackupConfig) {
        if let Some(dir) = &self.output_dir {
            config.output_dir = Some(dir.clone());
        }
        if let Some(max) = self.max_concurrent_requests {
            config.max_concurrent_requests = Some(max);
        }
        if self.insecure {
            config.insecure = true;
        }
    }
}
