pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::{FileSource, HttpOrderService};
pub use config::SyncConfig;
pub use crate::core::{engine::SyncEngine, processor::ShipmentProcessor};
pub use domain::model::{BatchReport, ProcessingResult, ProcessingStatus, ShipmentRecord};
pub use utils::error::{Result, SyncError};
