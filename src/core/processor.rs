use crate::core::matcher::{match_line_items, shipped_quantity};
use crate::core::payload::build_payload;
use crate::core::po::{decode_po, PoDecision};
use crate::core::sku::sku_variants;
use crate::domain::model::{
    BatchReport, ErrorSet, ProcessingResult, ProcessingStatus, RejectedRecord, ShipmentEntry,
    ShipmentRecord, StoreConfig, UpdateAck,
};
use crate::domain::ports::{ConfigProvider, OrderService};
use crate::utils::error::{Result, SyncError};
use chrono::NaiveDate;

/// 單筆出貨處理的結果 (錯誤由 `process_batch` 轉成結果列)
#[derive(Debug, Clone, PartialEq)]
pub enum ShipmentOutcome {
    Updated { order_id: String, ack: UpdateAck },
    Skipped { cleaned_po: String },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Resolution<'a> {
    Order {
        store: &'a StoreConfig,
        order_id: String,
        quantity: u64,
    },
    Skip {
        cleaned_po: String,
    },
}

pub struct ShipmentProcessor<S: OrderService, C: ConfigProvider> {
    service: S,
    config: C,
    today: Option<NaiveDate>,
}

impl<S: OrderService, C: ConfigProvider> ShipmentProcessor<S, C> {
    pub fn new(service: S, config: C) -> Self {
        Self {
            service,
            config,
            today: None,
        }
    }

    /// Pin the date stamped into update notes instead of using the current UTC date.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    pub fn config(&self) -> &C {
        &self.config
    }

    fn today(&self) -> NaiveDate {
        self.today.unwrap_or_else(|| chrono::Utc::now().date_naive())
    }

    /// Decode the PO and resolve the owning store without touching the network.
    pub fn resolve<'a>(&'a self, shipment: &ShipmentRecord) -> Result<Resolution<'a>> {
        let (store_id, order_id) =
            match decode_po(&shipment.customer_po, self.config.reserved_orders())? {
                PoDecision::Skip { cleaned_po } => return Ok(Resolution::Skip { cleaned_po }),
                PoDecision::Order { store_id, order_id } => (store_id, order_id),
            };

        let store = self
            .config
            .store(&store_id)
            .ok_or_else(|| SyncError::UnknownStore {
                store_id: store_id.clone(),
            })?;

        let quantity = shipped_quantity(&shipment.tracking_number, shipment.item_quantity)?;

        Ok(Resolution::Order {
            store,
            order_id,
            quantity,
        })
    }

    /// decode → store → lookup → match → build → update
    pub async fn process_shipment(&self, shipment: &ShipmentRecord) -> Result<ShipmentOutcome> {
        let (store, order_id, quantity) = match self.resolve(shipment)? {
            Resolution::Skip { cleaned_po } => {
                tracing::info!("⏭️  B2B order {} skipped", cleaned_po);
                return Ok(ShipmentOutcome::Skipped { cleaned_po });
            }
            Resolution::Order {
                store,
                order_id,
                quantity,
            } => (store, order_id, quantity),
        };
        let store_id = &store.id;

        tracing::debug!("Looking up order {} in store {}", order_id, store_id);
        let order = self.service.lookup_order(&order_id, store).await?;
        let line_items = order.line_items.ok_or_else(|| SyncError::InvalidOrderData {
            order_id: order_id.clone(),
            reason: "missing line_items".to_string(),
        })?;

        let stock_item = format!("{}{}", store.sku_prefix, shipment.stock_item);
        let shipment_variants = sku_variants(&stock_item);
        tracing::debug!(
            "Matching {} against {} line items ({} SKU variants)",
            stock_item,
            line_items.len(),
            shipment_variants.len()
        );
        let matched = match_line_items(&shipment_variants, &line_items, quantity)?;

        let payload = build_payload(&self.config, shipment, matched, self.today());
        let ack = self.service.update_order(&order_id, store, &payload).await?;

        tracing::info!(
            "📦 Order {} updated with tracking number {} ({} line items)",
            order_id,
            shipment.tracking_number,
            payload.line_items.len()
        );

        Ok(ShipmentOutcome::Updated { order_id, ack })
    }

    /// Process every record in order. A failing record never stops the batch;
    /// its message is collected once into the report's error set.
    pub async fn process_batch(&self, shipments: &[ShipmentRecord]) -> Result<BatchReport> {
        self.run_batch(shipments.iter().map(Ok).collect()).await
    }

    /// Same as `process_batch`, for source output where some records were
    /// unreadable. Those become `Error` results in their original position.
    pub async fn process_entries(&self, entries: &[ShipmentEntry]) -> Result<BatchReport> {
        self.run_batch(entries.iter().map(|entry| entry.as_ref()).collect())
            .await
    }

    async fn run_batch(
        &self,
        entries: Vec<std::result::Result<&ShipmentRecord, &RejectedRecord>>,
    ) -> Result<BatchReport> {
        if entries.is_empty() {
            return Err(SyncError::EmptyBatch);
        }

        let total = entries.len();
        let mut results = Vec::with_capacity(total);
        let mut errors = ErrorSet::new();

        for (index, entry) in entries.into_iter().enumerate() {
            let (shipment_id, tracking_number, outcome) = match entry {
                Ok(shipment) => {
                    let shipment_id = shipment.shipment_id().to_string();
                    tracing::info!(
                        "🚚 Processing shipment {} ({}/{})",
                        shipment_id,
                        index + 1,
                        total
                    );
                    let outcome = self.process_shipment(shipment).await;
                    (shipment_id, shipment.tracking_number.clone(), outcome)
                }
                Err(rejected) => (
                    rejected.shipment.clone(),
                    rejected.tracking_number.clone(),
                    Err(rejected.to_error()),
                ),
            };

            let mut result = ProcessingResult {
                shipment: shipment_id,
                status: ProcessingStatus::Error,
                tracking_number,
                order_id: None,
                message: None,
                error: None,
                response: None,
            };

            match outcome {
                Ok(ShipmentOutcome::Updated { order_id, ack }) => {
                    result.status = ProcessingStatus::Success;
                    result.order_id = Some(order_id);
                    result.response = Some(ack.body);
                }
                Ok(ShipmentOutcome::Skipped { cleaned_po }) => {
                    result.status = ProcessingStatus::Skipped;
                    result.message = Some(format!("B2B order {} skipped", cleaned_po));
                }
                Err(e) => {
                    let message = e.to_string();
                    tracing::error!(
                        "❌ Shipment {} failed: {} (Category: {:?}, transient: {})",
                        result.shipment,
                        message,
                        e.category(),
                        e.is_transient()
                    );
                    errors.insert(message.clone());
                    result.error = Some(message);
                }
            }
            results.push(result);
        }

        if !errors.is_empty() {
            tracing::error!("Accumulated errors:\n{}", errors.joined());
        }

        Ok(BatchReport { results, errors })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{
        LineItemId, Order, OrderLineItem, ResponseBody, ShipmentUpdatePayload,
    };
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct MockOrderService {
        orders: HashMap<String, Order>,
        updates: Arc<Mutex<Vec<(String, ShipmentUpdatePayload)>>>,
        reject_updates: bool,
    }

    impl MockOrderService {
        fn with_order(mut self, order_id: &str, skus: &[(u64, &str)]) -> Self {
            let line_items = skus
                .iter()
                .map(|(id, sku)| OrderLineItem {
                    id: LineItemId::Number(*id),
                    final_sku: Some(sku.to_string()),
                })
                .collect();
            self.orders.insert(
                order_id.to_string(),
                Order {
                    line_items: Some(line_items),
                },
            );
            self
        }

        fn updates(&self) -> Vec<(String, ShipmentUpdatePayload)> {
            self.updates.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl OrderService for MockOrderService {
        async fn lookup_order(&self, order_id: &str, _store: &StoreConfig) -> Result<Order> {
            self.orders
                .get(order_id)
                .cloned()
                .ok_or_else(|| SyncError::OrderLookupFailed {
                    order_id: order_id.to_string(),
                    status: 404,
                    body: "not found".to_string(),
                })
        }

        async fn update_order(
            &self,
            order_id: &str,
            _store: &StoreConfig,
            payload: &ShipmentUpdatePayload,
        ) -> Result<UpdateAck> {
            if self.reject_updates {
                return Err(SyncError::OrderUpdateFailed {
                    order_id: order_id.to_string(),
                    tracking_number: payload.tracking_number.clone(),
                    status: 422,
                    body: "{}".to_string(),
                });
            }
            self.updates
                .lock()
                .unwrap()
                .push((order_id.to_string(), payload.clone()));
            Ok(UpdateAck {
                status: 201,
                body: ResponseBody::Text("created".to_string()),
            })
        }
    }

    struct MockConfig {
        stores: Vec<StoreConfig>,
        reserved: Vec<String>,
    }

    impl MockConfig {
        fn new() -> Self {
            Self {
                stores: vec![StoreConfig {
                    id: "7400".to_string(),
                    base_url: "http://localhost/".to_string(),
                    api_key: "key".to_string(),
                    sku_prefix: "TS".to_string(),
                }],
                reserved: vec!["239457".to_string()],
            }
        }
    }

    impl ConfigProvider for MockConfig {
        fn store(&self, store_id: &str) -> Option<&StoreConfig> {
            self.stores.iter().find(|s| s.id == store_id)
        }

        fn reserved_orders(&self) -> &[String] {
            &self.reserved
        }

        fn shipping_method(&self, _description: &str) -> Option<&str> {
            None
        }

        fn note_template(&self) -> &str {
            "Synced on {date}"
        }
    }

    fn shipment(po: &str, sku: &str, qty: f64) -> ShipmentRecord {
        ShipmentRecord {
            tracking_number: format!("1Z-{}", po),
            customer_po: po.to_string(),
            ship_via_description: Some("UPS GRND".to_string()),
            stock_item: sku.to_string(),
            item_quantity: qty,
            shipment_date: "2024-05-01".to_string(),
            order_number: None,
        }
    }

    fn processor(service: MockOrderService) -> ShipmentProcessor<MockOrderService, MockConfig> {
        ShipmentProcessor::new(service, MockConfig::new())
            .with_today(NaiveDate::from_ymd_opt(2024, 5, 2).unwrap())
    }

    #[tokio::test]
    async fn test_single_match_sends_rounded_quantity() {
        let service = MockOrderService::default().with_order("100", &[(1, "TSA-100"), (2, "TSB-200")]);
        let processor = processor(service.clone());

        let outcome = processor
            .process_shipment(&shipment("7400-100", "A 100", 2.6))
            .await
            .unwrap();

        assert!(matches!(outcome, ShipmentOutcome::Updated { ref order_id, .. } if order_id == "100"));
        let updates = service.updates();
        assert_eq!(updates.len(), 1);
        let (_, payload) = &updates[0];
        assert_eq!(payload.line_items.len(), 1);
        assert_eq!(payload.line_items[0].id, LineItemId::Number(1));
        assert_eq!(payload.line_items[0].quantity, 3);
        assert_eq!(payload.note, "Synced on 2024-05-02");
        assert_eq!(payload.shipping_method.as_deref(), Some("UPS Ground"));
    }

    #[tokio::test]
    async fn test_multiple_matches_are_bundled_in_one_update() {
        let service = MockOrderService::default().with_order("100", &[(1, "TSA-100"), (2, "TSA 100")]);
        let processor = processor(service.clone());

        processor
            .process_shipment(&shipment("7400-100", "A100", 1.0))
            .await
            .unwrap();

        let updates = service.updates();
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].1.line_items.len(), 2);
    }

    #[tokio::test]
    async fn test_missing_line_items_is_invalid_order_data() {
        let mut service = MockOrderService::default();
        service.orders.insert("100".to_string(), Order { line_items: None });
        let processor = processor(service);

        let err = processor
            .process_shipment(&shipment("7400-100", "A100", 1.0))
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::InvalidOrderData { .. }));
    }

    #[tokio::test]
    async fn test_unknown_store() {
        let processor = processor(MockOrderService::default());
        let err = processor
            .process_shipment(&shipment("9999-100", "A100", 1.0))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "storeId 9999 does not match any stores.");
    }

    #[tokio::test]
    async fn test_batch_isolates_failures_and_dedupes_messages() {
        let service = MockOrderService::default()
            .with_order("100", &[(1, "TSA100")])
            .with_order("200", &[(2, "TSB200")]);
        let processor = processor(service.clone());

        let shipments = vec![
            shipment("7400-100", "A100", 1.0),
            shipment("ABC", "A100", 1.0),
            shipment("ABC", "A100", 1.0),
            shipment("7400-239457", "A100", 1.0),
            shipment("7400-200", "B200", 4.0),
        ];

        let report = processor.process_batch(&shipments).await.unwrap();

        assert_eq!(report.results.len(), 5);
        assert_eq!(report.count(ProcessingStatus::Success), 2);
        assert_eq!(report.count(ProcessingStatus::Skipped), 1);
        assert_eq!(report.count(ProcessingStatus::Error), 2);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(service.updates().len(), 2);
        assert_eq!(
            report.results[0].response,
            Some(ResponseBody::Text("created".to_string()))
        );
        assert_eq!(report.results[1].response, None);

        let err = report.into_result().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Shipment batch encountered errors:\nInvalid customer_po format: ABC"
        );
    }

    #[tokio::test]
    async fn test_rejected_update_is_reported_per_record() {
        let service = MockOrderService {
            reject_updates: true,
            ..MockOrderService::default()
        }
        .with_order("100", &[(1, "TSA100")]);
        let processor = processor(service);

        let report = processor
            .process_batch(&[shipment("7400-100", "A100", 1.0)])
            .await
            .unwrap();

        assert_eq!(report.results[0].status, ProcessingStatus::Error);
        assert!(report.results[0]
            .error
            .as_deref()
            .unwrap()
            .contains("status: 422"));
    }

    #[test]
    fn test_resolve_does_not_call_the_service() {
        let processor = processor(MockOrderService::default());

        match processor.resolve(&shipment("TS-7400-55-S3", "A100", 1.2)).unwrap() {
            Resolution::Order {
                store,
                order_id,
                quantity,
            } => {
                assert_eq!(store.id, "7400");
                assert_eq!(order_id, "55");
                assert_eq!(quantity, 1);
            }
            other => panic!("unexpected resolution: {:?}", other),
        }

        assert!(matches!(
            processor.resolve(&shipment("7400-100", "A100", -3.0)),
            Err(SyncError::InvalidQuantity { .. })
        ));
    }

    #[tokio::test]
    async fn test_empty_batch_is_rejected() {
        let processor = processor(MockOrderService::default());
        assert!(matches!(
            processor.process_batch(&[]).await,
            Err(SyncError::EmptyBatch)
        ));
    }

    #[tokio::test]
    async fn test_unreadable_record_becomes_an_error_result() {
        let service = MockOrderService::default().with_order("100", &[(1, "TSA100")]);
        let processor = processor(service.clone());

        let entries: Vec<ShipmentEntry> = vec![
            Ok(shipment("7400-100", "A100", 1.0)),
            Err(RejectedRecord {
                shipment: "E-77".to_string(),
                tracking_number: "1Z77".to_string(),
                reason: "missing field `customer_po`".to_string(),
            }),
        ];

        let report = processor.process_entries(&entries).await.unwrap();

        assert_eq!(report.results.len(), 2);
        assert_eq!(report.count(ProcessingStatus::Success), 1);
        assert_eq!(report.count(ProcessingStatus::Error), 1);
        assert_eq!(report.results[1].shipment, "E-77");
        assert_eq!(report.results[1].tracking_number, "1Z77");
        assert_eq!(service.updates().len(), 1);
        assert_eq!(
            report.failure().unwrap().to_string(),
            "Shipment batch encountered errors:\n\
             Invalid shipment record E-77: missing field `customer_po`"
        );
    }

    #[test]
    fn test_result_serializes_store_response() {
        let result = ProcessingResult {
            shipment: "E-1".to_string(),
            status: ProcessingStatus::Success,
            tracking_number: "1Z1".to_string(),
            order_id: Some("100".to_string()),
            message: None,
            error: None,
            response: Some(ResponseBody::Json(serde_json::json!({"id": 9}))),
        };

        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            serde_json::json!({
                "shipment": "E-1",
                "status": "Success",
                "tracking_number": "1Z1",
                "order_id": "100",
                "response": {"id": 9}
            })
        );
    }
}
