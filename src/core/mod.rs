pub mod engine;
pub mod matcher;
pub mod payload;
pub mod plan;
pub mod po;
pub mod processor;
pub mod sku;

pub use crate::domain::model::{BatchReport, ProcessingResult, ShipmentRecord};
pub use crate::domain::ports::{ConfigProvider, OrderService, ShipmentSource};
pub use crate::utils::error::Result;
