pub mod chain;
pub mod etl;
pub mod output;

pub use crate::domain::ports::{
    ChainSource, ConfigProvider, OutputFormat, Pipeline, RecordCount, Storage, TransformResult,
};
pub use crate::utils::error::Result;
pub use chain::ChainReader;
