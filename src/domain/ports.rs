use crate::domain::model::{Order, ShipmentEntry, ShipmentUpdatePayload, StoreConfig, UpdateAck};
use crate::utils::error::Result;
use async_trait::async_trait;

/// Where shipment records come from (mail attachment files, etc.)
///
/// A record that cannot be read is returned as `Err` inside the list; only
/// an unreadable input as a whole fails `load`.
pub trait ShipmentSource: Send + Sync {
    fn load(&self) -> impl std::future::Future<Output = Result<Vec<ShipmentEntry>>> + Send;
}

/// Store registry and the other static settings the pipeline reads.
pub trait ConfigProvider: Send + Sync {
    fn store(&self, store_id: &str) -> Option<&StoreConfig>;
    fn reserved_orders(&self) -> &[String];
    fn shipping_method(&self, description: &str) -> Option<&str>;
    fn note_template(&self) -> &str;
}

#[async_trait]
pub trait OrderService: Send + Sync {
    async fn lookup_order(&self, order_id: &str, store: &StoreConfig) -> Result<Order>;
    async fn update_order(
        &self,
        order_id: &str,
        store: &StoreConfig,
        payload: &ShipmentUpdatePayload,
    ) -> Result<UpdateAck>;
}
