use crate::core::processor::ShipmentProcessor;
use crate::domain::model::{BatchReport, ProcessingStatus};
use crate::domain::ports::{ConfigProvider, OrderService, ShipmentSource};
use crate::utils::error::Result;

pub struct SyncEngine<Src: ShipmentSource, S: OrderService, C: ConfigProvider> {
    source: Src,
    processor: ShipmentProcessor<S, C>,
}

impl<Src: ShipmentSource, S: OrderService, C: ConfigProvider> SyncEngine<Src, S, C> {
    pub fn new(source: Src, processor: ShipmentProcessor<S, C>) -> Self {
        Self { source, processor }
    }

    pub async fn run(&self) -> Result<BatchReport> {
        tracing::info!("Starting shipment sync...");

        // Extract
        let entries = self.source.load().await?;
        tracing::info!("📥 Loaded {} shipment records", entries.len());

        // Reconcile
        let report = self.processor.process_entries(&entries).await?;

        tracing::info!(
            "Shipment sync finished: {} updated, {} skipped, {} failed ({} distinct errors)",
            report.count(ProcessingStatus::Success),
            report.count(ProcessingStatus::Skipped),
            report.count(ProcessingStatus::Error),
            report.errors.len()
        );

        Ok(report)
    }
}
