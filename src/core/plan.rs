use crate::core::processor::{Resolution, ShipmentProcessor};
use crate::domain::model::ShipmentEntry;
use crate::domain::ports::{ConfigProvider, OrderService};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PlannedAction {
    Update,
    Skip,
    Error,
}

/// What a real run would do with one record, decided without calling any store.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlannedShipment {
    pub shipment: String,
    pub action: PlannedAction,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl PlannedShipment {
    fn new(shipment: String, action: PlannedAction, detail: String) -> Self {
        Self {
            shipment,
            action,
            store_id: None,
            order_id: None,
            quantity: None,
            detail: Some(detail),
        }
    }
}

impl<S: OrderService, C: ConfigProvider> ShipmentProcessor<S, C> {
    /// Dry run: decode POs and resolve stores for every entry.
    pub fn plan(&self, entries: &[ShipmentEntry]) -> Vec<PlannedShipment> {
        entries
            .iter()
            .map(|entry| {
                let shipment = match entry {
                    Ok(shipment) => shipment,
                    Err(rejected) => {
                        return PlannedShipment::new(
                            rejected.shipment.clone(),
                            PlannedAction::Error,
                            rejected.to_error().to_string(),
                        )
                    }
                };
                let shipment_id = shipment.shipment_id().to_string();

                match self.resolve(shipment) {
                    Ok(Resolution::Order {
                        store,
                        order_id,
                        quantity,
                    }) => PlannedShipment {
                        shipment: shipment_id,
                        action: PlannedAction::Update,
                        store_id: Some(store.id.clone()),
                        order_id: Some(order_id),
                        quantity: Some(quantity),
                        // 實際比對用的 SKU (含商店前綴)
                        detail: Some(format!("{}{}", store.sku_prefix, shipment.stock_item)),
                    },
                    Ok(Resolution::Skip { cleaned_po }) => PlannedShipment::new(
                        shipment_id,
                        PlannedAction::Skip,
                        format!("B2B order {} skipped", cleaned_po),
                    ),
                    Err(e) => PlannedShipment::new(shipment_id, PlannedAction::Error, e.to_string()),
                }
            })
            .collect()
    }
}
