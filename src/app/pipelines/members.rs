use crate::core::output::{to_csv, write_result};
use crate::core::{ChainReader, ConfigProvider, Pipeline, Storage, TransformResult};
use crate::domain::export::MemberRecord;
use crate::domain::keys::items;
use crate::domain::model::{MemberId, Membership};
use crate::utils::error::Result;

pub struct MembersPipeline<S: Storage, C: ConfigProvider> {
    reader: ChainReader,
    storage: S,
    config: C,
}

impl<S: Storage, C: ConfigProvider> MembersPipeline<S, C> {
    pub fn new(reader: ChainReader, storage: S, config: C) -> Self {
        Self {
            reader,
            storage,
            config,
        }
    }
}

pub fn member_record(member_id: MemberId, membership: Membership) -> MemberRecord {
    MemberRecord {
        member_id,
        root_account: membership.root_account,
        controller_account: membership.controller_account,
        handle: text(&membership.handle),
        // 新鏈不沿用舊的名稱欄位
        name: String::new(),
        avatar_uri: text(&membership.avatar_uri),
        about: text(&membership.about),
        registered_at_time: membership.registered_at_time,
    }
}

fn text(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider> Pipeline for MembersPipeline<S, C> {
    type Extracted = Vec<(MemberId, Membership)>;

    async fn extract(&self) -> Result<Self::Extracted> {
        let first: MemberId = 0;
        let next: MemberId = self.reader.value_or_default(&items::NEXT_MEMBER_ID).await?;
        tracing::info!("Members {} {}", first, next);

        let mut members = Vec::with_capacity(next.saturating_sub(first) as usize);
        for id in first..next {
            let membership: Membership = self
                .reader
                .required_map_value(&items::MEMBERSHIP_BY_ID, &id)
                .await?;
            members.push((id, membership));
        }

        Ok(members)
    }

    async fn transform(&self, data: Self::Extracted) -> Result<TransformResult> {
        let records: Vec<MemberRecord> = data
            .into_iter()
            .map(|(id, membership)| member_record(id, membership))
            .collect();

        Ok(TransformResult {
            name: "members",
            record_count: records.len(),
            json_output: serde_json::to_string(&records)?,
            csv_output: Some(to_csv(&records)?),
        })
    }

    async fn load(&self, result: TransformResult) -> Result<String> {
        write_result(&self.storage, self.config.output_format(), result).await
    }
}
