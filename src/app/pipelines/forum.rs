//! Forum export.
//!
//! Records are re-encoded for a new chain: block numbers of the old chain are
//! meaningless there, so every `BlockAndTime` keeps its timestamp but points at
//! block 1, and post edit history is dropped.

use crate::core::output::write_result;
use crate::core::{ChainReader, ConfigProvider, Pipeline, RecordCount, Storage, TransformResult};
use crate::domain::export::ForumDocument;
use crate::domain::keys::{items, StorageItem};
use crate::domain::model::{BlockAndTime, Category, ModerationAction, Post, Thread};
use crate::utils::error::Result;
use parity_scale_codec::{Decode, Encode};

const FIRST_ID: u64 = 1;

#[derive(Debug, Default)]
pub struct ForumState {
    pub categories: Vec<Category>,
    pub threads: Vec<Thread>,
    pub posts: Vec<Post>,
}

impl RecordCount for ForumState {
    fn record_count(&self) -> usize {
        self.categories.len() + self.threads.len() + self.posts.len()
    }
}

pub struct ForumPipeline<S: Storage, C: ConfigProvider> {
    reader: ChainReader,
    storage: S,
    config: C,
}

impl<S: Storage, C: ConfigProvider> ForumPipeline<S, C> {
    pub fn new(reader: ChainReader, storage: S, config: C) -> Self {
        Self {
            reader,
            storage,
            config,
        }
    }

    /// Every id in `1..next` must exist.
    async fn all_checked<T: Decode + Send>(
        &self,
        next_item: &StorageItem,
        by_id: &StorageItem,
    ) -> Result<Vec<T>> {
        let next: u64 = self.reader.value_or_default(next_item).await?;

        let mut records = Vec::with_capacity(next.saturating_sub(FIRST_ID) as usize);
        for id in FIRST_ID..next {
            records.push(self.reader.required_map_value(by_id, &id).await?);
        }
        Ok(records)
    }
}

pub fn at_block_one(at: &BlockAndTime) -> BlockAndTime {
    BlockAndTime {
        block: 1,
        time: at.time,
    }
}

fn migrate_moderation(action: Option<ModerationAction>) -> Option<ModerationAction> {
    action.map(|action| ModerationAction {
        moderated_at: at_block_one(&action.moderated_at),
        ..action
    })
}

pub fn migrate_category(category: Category) -> Category {
    Category {
        created_at: at_block_one(&category.created_at),
        ..category
    }
}

pub fn migrate_thread(thread: Thread) -> Thread {
    Thread {
        moderation: migrate_moderation(thread.moderation),
        created_at: at_block_one(&thread.created_at),
        ..thread
    }
}

pub fn migrate_post(post: Post) -> Post {
    Post {
        moderation: migrate_moderation(post.moderation),
        text_change_history: Vec::new(),
        created_at: at_block_one(&post.created_at),
        ..post
    }
}

fn to_hex<T: Encode>(record: &T) -> String {
    format!("0x{}", hex::encode(record.encode()))
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider> Pipeline for ForumPipeline<S, C> {
    type Extracted = ForumState;

    async fn extract(&self) -> Result<Self::Extracted> {
        let categories = self
            .all_checked(&items::NEXT_CATEGORY_ID, &items::CATEGORY_BY_ID)
            .await?;
        let posts = self
            .all_checked(&items::NEXT_POST_ID, &items::POST_BY_ID)
            .await?;
        let threads = self
            .all_checked(&items::NEXT_THREAD_ID, &items::THREAD_BY_ID)
            .await?;

        Ok(ForumState {
            categories,
            threads,
            posts,
        })
    }

    async fn transform(&self, data: Self::Extracted) -> Result<TransformResult> {
        tracing::info!("Category count {}", data.categories.len());
        tracing::info!("Thread count {}", data.threads.len());
        tracing::info!("Post count {}", data.posts.len());

        let record_count = data.record_count();
        let document = ForumDocument {
            categories: data
                .categories
                .into_iter()
                .map(|category| to_hex(&migrate_category(category)))
                .collect(),
            posts: data
                .posts
                .into_iter()
                .map(|post| to_hex(&migrate_post(post)))
                .collect(),
            threads: data
                .threads
                .into_iter()
                .map(|thread| to_hex(&migrate_thread(thread)))
                .collect(),
        };

        Ok(TransformResult {
            name: "forum",
            record_count,
            json_output: serde_json::to_string(&document)?,
            csv_output: None,
        })
    }

    async fn load(&self, result: TransformResult) -> Result<String> {
        write_result(&self.storage, self.config.output_format(), result).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{AccountId, PostTextChange};

    fn at(block: u32, time: u64) -> BlockAndTime {
        BlockAndTime { block, time }
    }

    fn moderation() -> ModerationAction {
        ModerationAction {
            moderated_at: at(900, 1_600_000_900_000),
            moderator_id: AccountId([9; 32]),
            rationale: b"spam".to_vec(),
        }
    }

    #[test]
    fn test_migrate_post_resets_blocks_and_history() {
        let post = Post {
            id: 3,
            thread_id: 1,
            nr_in_thread: 2,
            current_text: b"edited".to_vec(),
            moderation: Some(moderation()),
            text_change_history: vec![PostTextChange {
                expired_at: at(500, 1_600_000_500_000),
                text: b"original".to_vec(),
            }],
            created_at: at(400, 1_600_000_400_000),
            author_id: AccountId([1; 32]),
        };

        let migrated = migrate_post(post);
        assert_eq!(migrated.created_at, at(1, 1_600_000_400_000));
        assert!(migrated.text_change_history.is_empty());
        let action = migrated.moderation.unwrap();
        assert_eq!(action.moderated_at, at(1, 1_600_000_900_000));
        assert_eq!(action.rationale, b"spam".to_vec());
        assert_eq!(migrated.current_text, b"edited".to_vec());
    }

    #[test]
    fn test_migrate_thread_without_moderation() {
        let thread = Thread {
            id: 1,
            title: b"Welcome".to_vec(),
            category_id: 1,
            nr_in_category: 1,
            moderation: None,
            num_unmoderated_posts: 4,
            num_moderated_posts: 0,
            created_at: at(77, 1_590_000_000_000),
            author_id: AccountId([2; 32]),
        };

        let migrated = migrate_thread(thread);
        assert_eq!(migrated.created_at.block, 1);
        assert!(migrated.moderation.is_none());
        assert_eq!(migrated.num_unmoderated_posts, 4);
    }

    #[test]
    fn test_hex_is_prefixed_scale() {
        assert_eq!(to_hex(&at(1, 2)), "0x010000000200000000000000");
    }
}
