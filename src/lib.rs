pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::cli::CliConfig;

pub use app::{export_from, run_export, ExportJob};
pub use config::{ConfigLayer, ExportConfig};
pub use core::{etl::EtlEngine, ChainReader};
pub use utils::error::{ExportError, Result};
