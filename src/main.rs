use clap::Parser;
use genesis_export::domain::ss58;
use genesis_export::utils::{logger, validation::Validate};
use genesis_export::{run_export, CliConfig, ExportError};

#[tokio::main]
async fn main() {
    let cli = CliConfig::parse();

    // 初始化日誌 (stdout 只留給匯出文件)
    if cli.log_json {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("Starting genesis-export");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    if let Err(e) = run(cli).await {
        fail(e);
    }
}

async fn run(cli: CliConfig) -> Result<(), ExportError> {
    let config = cli.resolve()?;

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        return Err(e);
    }

    ss58::set_address_prefix(config.ss58_prefix);
    let job = cli.job(&config)?;

    if cli.dry_run {
        tracing::info!("🔍 DRY RUN MODE - not reading chain state");
        tracing::info!("Source: {}", config.raw_state.as_deref().unwrap_or(&config.endpoint));
        tracing::info!(
            "Block: {}",
            config
                .at_block
                .map_or_else(|| "best".to_string(), |n| n.to_string())
        );
        tracing::info!("Export: {:?}", job);
        tracing::info!(
            "Output: {} ({:?})",
            config.output_dir.as_deref().unwrap_or("stdout"),
            config.output_format
        );
        return Ok(());
    }

    if cli.monitor {
        tracing::info!("🔍 System monitoring enabled");
    }

    let output = run_export(&config, job, cli.monitor).await?;
    tracing::info!("✅ Export completed, written to {}", output);
    Ok(())
}

fn fail(e: ExportError) -> ! {
    tracing::error!(
        "❌ Export failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

    // 輸出用戶友好的錯誤信息
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());

    // 依錯誤嚴重程度決定退出碼，失敗時一律非零
    std::process::exit(e.exit_code().max(1));
}
