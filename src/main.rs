use anyhow::Context;
use clap::Parser;
use redmine_wiki_backup::utils::{logger, validation::Validate};
use redmine_wiki_backup::{
    BackupConfig, BackupEngine, BackupError, CliArgs, LocalStorage, RedmineClient,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();

    // 初始化日誌
    if args.log_json {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(args.verbose);
    }

    tracing::info!("Starting redmine-wiki-backup");

    // 讀取並驗證設定，失敗時直接結束 (exit code 0)
    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => exit_with(&e),
    };
    if args.verbose {
        tracing::debug!(
            "Backup config: redmineUrl={:?} outputDir={:?} insecure={} maxConcurrentRequests={}",
            config.redmine_url,
            config.output_dir,
            config.insecure,
            config.max_concurrent_requests()
        );
    }

    let output_root = config.output_root().unwrap_or_else(|e| exit_with(&e));
    let service = config.service_config().unwrap_or_else(|e| exit_with(&e));
    let client = RedmineClient::new(service).context("failed to build the Redmine HTTP client")?;
    let storage = LocalStorage::new(&output_root);

    tracing::info!("📁 Backing up {} into {}", client.base_url(), storage.root().display());

    let engine = BackupEngine::with_policies(client, storage, config.decode_errors);

    match engine.run().await {
        Ok(report) => {
            if args.log_json {
                tracing::info!(report = %serde_json::to_string(&report)?, "backup report");
            }
            if report.is_complete() {
                tracing::info!("✅ Backup completed: {}", report);
            } else {
                tracing::warn!("⚠️ Backup completed with skipped items: {}", report);
            }
        }
        Err(e) => exit_with(&e),
    }

    Ok(())
}

fn load_config(args: &CliArgs) -> redmine_wiki_backup::Result<BackupConfig> {
    let mut config = BackupConfig::from_file(&args.config)?;
    args.apply_to(&mut config);
    config.validate()?;
    Ok(config)
}

fn exit_with(e: &BackupError) -> ! {
    tracing::error!(
        "❌ Backup failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
    println!("❌ {}", e.user_friendly_message());

    std::process::exit(e.exit_code());
}
