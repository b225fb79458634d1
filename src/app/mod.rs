pub mod pipelines;

use crate::adapters::memory::MemoryChain;
use crate::adapters::rpc::RpcClient;
use crate::adapters::storage::OutputSink;
use crate::config::ExportConfig;
use crate::core::etl::EtlEngine;
use crate::core::{ChainReader, ChainSource, Result};
use crate::domain::model::WorkingGroup;
use pipelines::{
    BalanceOptions, BalancesPipeline, CouncilPipeline, ForumPipeline, MembersPipeline,
    ValidatorsPipeline, WorkersPipeline,
};
use std::sync::Arc;
use std::time::Duration;

/// One export selected on the command line.
#[derive(Debug, Clone, PartialEq)]
pub enum ExportJob {
    Balances(BalanceOptions),
    Members,
    /// Empty means the default groups.
    Workers(Vec<WorkingGroup>),
    Forum,
    Council,
    Validators,
}

impl ExportJob {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Balances(_) => "balances",
            Self::Members => "members",
            Self::Workers(_) => "workers",
            Self::Forum => "forum",
            Self::Council => "council",
            Self::Validators => "validators",
        }
    }
}

/// Opens the raw state file when one is configured, the node otherwise.
pub fn open_source(config: &ExportConfig) -> Result<Arc<dyn ChainSource>> {
    match &config.raw_state {
        Some(path) => Ok(Arc::new(MemoryChain::from_file(path)?)),
        None => {
            tracing::info!("Connecting to {}", config.endpoint);
            let client = RpcClient::new(&config.endpoint, Duration::from_secs(config.timeout_secs))?;
            Ok(Arc::new(client))
        }
    }
}

pub async fn run_export(config: &ExportConfig, job: ExportJob, monitor: bool) -> Result<String> {
    let source = open_source(config)?;
    export_from(source, config, job, monitor).await
}

/// Runs `job` against an already opened source and returns where the
/// document went.
pub async fn export_from(
    source: Arc<dyn ChainSource>,
    config: &ExportConfig,
    job: ExportJob,
    monitor: bool,
) -> Result<String> {
    tracing::info!("Exporting {}", job.name());

    let reader = ChainReader::new(source)
        .with_page_size(config.page_size)
        .at_block(config.at_block)
        .await?;
    let storage = OutputSink::from_output_dir(config.output_dir.as_deref());
    let config = config.clone();

    match job {
        ExportJob::Balances(options) => {
            let pipeline = BalancesPipeline::new(reader, storage, config, options);
            EtlEngine::new_with_monitoring(pipeline, monitor).run().await
        }
        ExportJob::Members => {
            let pipeline = MembersPipeline::new(reader, storage, config);
            EtlEngine::new_with_monitoring(pipeline, monitor).run().await
        }
        ExportJob::Workers(groups) => {
            let pipeline = WorkersPipeline::new(reader, storage, config, groups);
            EtlEngine::new_with_monitoring(pipeline, monitor).run().await
        }
        ExportJob::Forum => {
            let pipeline = ForumPipeline::new(reader, storage, config);
            EtlEngine::new_with_monitoring(pipeline, monitor).run().await
        }
        ExportJob::Council => {
            let pipeline = CouncilPipeline::new(reader, storage, config);
            EtlEngine::new_with_monitoring(pipeline, monitor).run().await
        }
        ExportJob::Validators => {
            let pipeline = ValidatorsPipeline::new(reader, storage, config);
            EtlEngine::new_with_monitoring(pipeline, monitor).run().await
        }
    }
}
