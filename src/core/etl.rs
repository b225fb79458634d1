use crate::core::{Pipeline, RecordCount};
use crate::utils::error::Result;
use crate::utils::monitor::SystemMonitor;

pub struct EtlEngine<P: Pipeline> {
    pipeline: P,
    monitor: SystemMonitor,
}

impl<P: Pipeline> EtlEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self::new_with_monitoring(pipeline, false)
    }

    pub fn new_with_monitoring(pipeline: P, monitor_enabled: bool) -> Self {
        Self {
            pipeline,
            monitor: SystemMonitor::new(monitor_enabled),
        }
    }

    /// 依序執行 extract → transform → load，回傳輸出位置
    pub async fn run(&self) -> Result<String> {
        tracing::info!("Extracting chain state...");
        let extracted = self.pipeline.extract().await?;
        let extracted_count = extracted.record_count();
        tracing::info!("Extracted {} records", extracted_count);
        self.monitor.log_stats("Extract", extracted_count);

        let result = self.pipeline.transform(extracted).await?;
        tracing::info!("Transformed into {} {} entries", result.record_count, result.name);
        self.monitor.log_stats("Transform", result.record_count);

        let record_count = result.record_count;
        let output_path = self.pipeline.load(result).await?;
        tracing::debug!("Output written to {}", output_path);
        self.monitor.log_stats("Load", record_count);

        self.monitor.log_final_stats();
        Ok(output_path)
    }
}
