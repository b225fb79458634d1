use crate::core::output::write_result;
use crate::core::{ChainReader, ConfigProvider, Pipeline, RecordCount, Storage, TransformResult};
use crate::domain::export::WorkersDocument;
use crate::domain::keys::items;
use crate::domain::model::{Worker, WorkerId, WorkingGroup};
use crate::utils::error::Result;

pub const DEFAULT_GROUPS: [WorkingGroup; 2] = [WorkingGroup::Storage, WorkingGroup::Gateway];

#[derive(Debug, Default)]
pub struct GroupWorkers {
    pub groups: Vec<(WorkingGroup, Vec<Worker>)>,
}

impl RecordCount for GroupWorkers {
    fn record_count(&self) -> usize {
        self.groups.iter().map(|(_, workers)| workers.len()).sum()
    }
}

pub struct WorkersPipeline<S: Storage, C: ConfigProvider> {
    reader: ChainReader,
    storage: S,
    config: C,
    groups: Vec<WorkingGroup>,
}

impl<S: Storage, C: ConfigProvider> WorkersPipeline<S, C> {
    pub fn new(reader: ChainReader, storage: S, config: C, groups: Vec<WorkingGroup>) -> Self {
        let groups = if groups.is_empty() {
            DEFAULT_GROUPS.to_vec()
        } else {
            groups
        };

        Self {
            reader,
            storage,
            config,
            groups,
        }
    }

    async fn group_workers(&self, group: WorkingGroup) -> Result<Vec<Worker>> {
        let pallet = group.pallet();
        let next: WorkerId = self
            .reader
            .value_or_default(&items::next_worker_id(pallet))
            .await?;
        let worker_by_id = items::worker_by_id(pallet);

        let mut workers = Vec::new();
        let mut vacated = 0usize;
        for id in 0..next {
            // 離職的 worker 會從 map 中移除
            match self.reader.map_value::<_, Worker>(&worker_by_id, &id).await? {
                Some(worker) => workers.push(worker),
                None => vacated += 1,
            }
        }

        tracing::info!(
            "{} working group: {} workers ({} vacated ids)",
            group,
            workers.len(),
            vacated
        );
        Ok(workers)
    }
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider> Pipeline for WorkersPipeline<S, C> {
    type Extracted = GroupWorkers;

    async fn extract(&self) -> Result<Self::Extracted> {
        let mut extracted = GroupWorkers::default();
        for group in &self.groups {
            let workers = self.group_workers(*group).await?;
            extracted.groups.push((*group, workers));
        }
        Ok(extracted)
    }

    async fn transform(&self, data: Self::Extracted) -> Result<TransformResult> {
        let record_count = data.record_count();
        let document: WorkersDocument = data
            .groups
            .into_iter()
            .map(|(group, workers)| (group.name().to_string(), workers))
            .collect();

        Ok(TransformResult {
            name: "workers",
            record_count,
            json_output: serde_json::to_string(&document)?,
            csv_output: None,
        })
    }

    async fn load(&self, result: TransformResult) -> Result<String> {
        write_result(&self.storage, self.config.output_format(), result).await
    }
}
