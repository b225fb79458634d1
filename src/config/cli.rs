use crate::app::ExportJob;
use crate::config::toml_config::FileConfig;
use crate::config::{ConfigLayer, ExportConfig};
use crate::core::OutputFormat;
use crate::domain::model::{Balance, BlockNumber, WorkingGroup};
use crate::utils::error::Result;
use clap::{Args, Parser, Subcommand};

#[derive(Debug, Clone, Parser)]
#[command(name = "genesis-export")]
#[command(about = "Export Joystream chain state as JSON snapshots for a new genesis")]
#[command(version)]
pub struct CliConfig {
    /// Node RPC endpoint (ws, wss, http or https)
    #[arg(long, env = "WS_URL", global = true)]
    pub ws_url: Option<String>,

    /// Read state at this block instead of the best block
    #[arg(long, env = "AT_BLOCK_NUMBER", global = true)]
    pub at_block: Option<BlockNumber>,

    /// Read a raw state dump instead of connecting to a node
    #[arg(long, env = "RAW_STATE", global = true)]
    pub raw_state: Option<String>,

    /// TOML file with lower-priority defaults
    #[arg(long, env = "EXPORT_CONFIG", global = true)]
    pub config: Option<String>,

    /// Write `<name>.json|csv` here instead of stdout
    #[arg(long, env = "OUTPUT_DIR", global = true)]
    pub output_dir: Option<String>,

    #[arg(long, env = "OUTPUT_FORMAT", global = true)]
    pub format: Option<OutputFormat>,

    /// Keys requested per `state_getKeysPaged` call
    #[arg(long, global = true)]
    pub page_size: Option<u32>,

    #[arg(long, global = true)]
    pub timeout_secs: Option<u64>,

    #[arg(long, env = "SS58_PREFIX", global = true)]
    pub ss58_prefix: Option<u16>,

    #[arg(long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Log process memory and CPU per phase")]
    pub monitor: bool,

    #[arg(long, global = true, help = "Emit logs as JSON lines on stderr")]
    pub log_json: bool,

    /// Resolve and print the configuration without reading the chain
    #[arg(long, global = true)]
    pub dry_run: bool,

    #[command(subcommand)]
    pub command: ExportCommand,
}

#[derive(Debug, Clone, Subcommand)]
pub enum ExportCommand {
    /// Free plus reserved balance of every account
    Balances(BalancesArgs),
    /// Registered memberships
    Members,
    /// Workers of the selected working groups
    Workers(WorkersArgs),
    /// Forum categories, threads and posts re-encoded for a new chain
    Forum,
    /// Active council seats and backers
    Council,
    /// Session validators and their bonded stake
    Validators,
}

#[derive(Debug, Clone, Default, Args)]
pub struct BalancesArgs {
    /// Per-account upper bound, 0 for none
    #[arg(long, env = "CAP_BALANCE")]
    pub cap: Option<Balance>,

    /// Drop accounts below this amount, 0 for none
    #[arg(long, env = "MIN_BALANCE")]
    pub floor: Option<Balance>,

    /// Credit stakes held by proposals and working groups to their owners
    #[arg(long)]
    pub with_stake: bool,

    /// SS58 addresses left out of the output
    #[arg(long, env = "EXCLUDE_ACCOUNTS", value_delimiter = ',')]
    pub exclude: Vec<String>,
}

#[derive(Debug, Clone, Default, Args)]
pub struct WorkersArgs {
    /// Comma separated groups, defaults to storage and gateway
    #[arg(long, value_delimiter = ',')]
    pub groups: Vec<WorkingGroup>,
}

impl CliConfig {
    /// Settings given on the command line or through the environment.
    pub fn layer(&self) -> ConfigLayer {
        let mut layer = ConfigLayer {
            endpoint: self.ws_url.clone(),
            at_block: self.at_block,
            raw_state: self.raw_state.clone(),
            output_dir: self.output_dir.clone(),
            output_format: self.format,
            page_size: self.page_size,
            timeout_secs: self.timeout_secs,
            ss58_prefix: self.ss58_prefix,
            ..Default::default()
        };

        if let ExportCommand::Balances(args) = &self.command {
            layer.cap = args.cap;
            layer.floor = args.floor;
            // 未指定的旗標交給設定檔決定
            layer.with_stake = args.with_stake.then_some(true);
            if !args.exclude.is_empty() {
                layer.exclude = Some(args.exclude.clone());
            }
        }

        layer
    }

    /// Command line over environment over config file over defaults.
    pub fn resolve(&self) -> Result<ExportConfig> {
        let file_layer = match &self.config {
            Some(path) => {
                tracing::info!("Loading configuration from {}", path);
                FileConfig::from_file(path)?.into_layer()
            }
            None => ConfigLayer::default(),
        };

        Ok(self.layer().or(file_layer).resolve())
    }

    pub fn job(&self, config: &ExportConfig) -> Result<ExportJob> {
        Ok(match &self.command {
            ExportCommand::Balances(_) => ExportJob::Balances(config.balance_options()?),
            ExportCommand::Members => ExportJob::Members,
            ExportCommand::Workers(args) => ExportJob::Workers(args.groups.clone()),
            ExportCommand::Forum => ExportJob::Forum,
            ExportCommand::Council => ExportJob::Council,
            ExportCommand::Validators => ExportJob::Validators,
        })
    }
}
