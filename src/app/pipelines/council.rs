use crate::core::output::{to_csv, write_result};
use crate::core::{ChainReader, ConfigProvider, Pipeline, RecordCount, Storage, TransformResult};
use crate::domain::export::CouncilDocument;
use crate::domain::keys::items;
use crate::domain::model::{AccountId, Balance, BlockNumber, Seat};
use crate::utils::error::Result;
use serde::Serialize;

#[derive(Debug, Default)]
pub struct CouncilState {
    pub seats: Vec<Seat>,
    pub term_ends_at: BlockNumber,
}

impl RecordCount for CouncilState {
    fn record_count(&self) -> usize {
        self.seats.len()
    }
}

#[derive(Serialize)]
struct SeatRow {
    member: AccountId,
    stake: String,
    backing_stake: String,
    backers: usize,
}

pub struct CouncilPipeline<S: Storage, C: ConfigProvider> {
    reader: ChainReader,
    storage: S,
    config: C,
}

impl<S: Storage, C: ConfigProvider> CouncilPipeline<S, C> {
    pub fn new(reader: ChainReader, storage: S, config: C) -> Self {
        Self {
            reader,
            storage,
            config,
        }
    }
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider> Pipeline for CouncilPipeline<S, C> {
    type Extracted = CouncilState;

    async fn extract(&self) -> Result<Self::Extracted> {
        let seats: Vec<Seat> = self.reader.value_or_default(&items::ACTIVE_COUNCIL).await?;
        let term_ends_at: BlockNumber = self.reader.value_or_default(&items::TERM_ENDS_AT).await?;
        Ok(CouncilState {
            seats,
            term_ends_at,
        })
    }

    async fn transform(&self, data: Self::Extracted) -> Result<TransformResult> {
        let total_stake: Balance = data
            .seats
            .iter()
            .fold(0, |sum: Balance, seat| sum.saturating_add(seat.total_stake()));
        tracing::info!(
            "Council of {} seats, term ends at #{}, total stake {}",
            data.seats.len(),
            data.term_ends_at,
            total_stake
        );

        let rows: Vec<SeatRow> = data
            .seats
            .iter()
            .map(|seat| SeatRow {
                member: seat.member,
                stake: seat.stake.to_string(),
                backing_stake: (seat.total_stake() - seat.stake).to_string(),
                backers: seat.backers.len(),
            })
            .collect();

        let document = CouncilDocument {
            term_ends_at: data.term_ends_at,
            seats: data.seats,
            total_stake,
        };

        Ok(TransformResult {
            name: "council",
            record_count: document.seats.len(),
            json_output: serde_json::to_string(&document)?,
            csv_output: Some(to_csv(rows)?),
        })
    }

    async fn load(&self, result: TransformResult) -> Result<String> {
        write_result(&self.storage, self.config.output_format(), result).await
    }
}
