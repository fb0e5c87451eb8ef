use crate::core::OrderService;
use crate::domain::model::{
    Order, ResponseBody, ShipmentUpdatePayload, ShipmentUpdateRequest, StoreConfig, UpdateAck,
};
use crate::utils::error::{Result, SyncError};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

pub const API_VERSION_PATH: &str = "api/v2.3.0";

/// Store order API over HTTP. The store's API key travels as the `token` query parameter.
#[derive(Debug, Clone)]
pub struct HttpOrderService {
    client: Client,
}

impl HttpOrderService {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }

    pub fn with_timeout(timeout: Option<Duration>) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
        })
    }

    fn orders_url(store: &StoreConfig, order_id: &str) -> String {
        let base = store.base_url.trim_end_matches('/');
        format!("{}/{}/orders/{}", base, API_VERSION_PATH, order_id)
    }
}

impl Default for HttpOrderService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OrderService for HttpOrderService {
    async fn lookup_order(&self, order_id: &str, store: &StoreConfig) -> Result<Order> {
        let url = Self::orders_url(store, order_id);
        tracing::debug!("Making API request to: {}", url);

        let response = self
            .client
            .get(&url)
            .query(&[("token", store.api_key.as_str())])
            .header("Accept", "application/json")
            .send()
            .await?;

        let status = response.status();
        tracing::debug!("API response status: {}", status);
        let body = response.text().await?;

        if !status.is_success() {
            tracing::warn!(
                "API request rejected: URL: {}, Status: {}, Response: {}",
                url,
                status,
                body
            );
            return Err(SyncError::OrderLookupFailed {
                order_id: order_id.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str(&body).map_err(|e| SyncError::InvalidOrderData {
            order_id: order_id.to_string(),
            reason: e.to_string(),
        })
    }

    async fn update_order(
        &self,
        order_id: &str,
        store: &StoreConfig,
        payload: &ShipmentUpdatePayload,
    ) -> Result<UpdateAck> {
        let url = format!("{}/shipments", Self::orders_url(store, order_id));
        tracing::debug!("Posting shipment update to: {}", url);

        let response = self
            .client
            .post(&url)
            .query(&[("token", store.api_key.as_str())])
            .json(&ShipmentUpdateRequest { shipment: payload })
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            tracing::warn!(
                "API request rejected: URL: {}, Status: {}, Payload: {}, Response: {}",
                url,
                status,
                serde_json::to_string(payload).unwrap_or_default(),
                body
            );
            return Err(SyncError::OrderUpdateFailed {
                order_id: order_id.to_string(),
                tracking_number: payload.tracking_number.clone(),
                status: status.as_u16(),
                body,
            });
        }

        Ok(UpdateAck {
            status: status.as_u16(),
            body: ResponseBody::parse(body),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{LineItemId, MatchedLine};
    use httpmock::prelude::*;

    fn store(server: &MockServer) -> StoreConfig {
        StoreConfig {
            id: "8636".to_string(),
            base_url: server.url("/"),
            api_key: "secret".to_string(),
            sku_prefix: "TS".to_string(),
        }
    }

    fn payload() -> ShipmentUpdatePayload {
        ShipmentUpdatePayload {
            tracking_number: "1Z999".to_string(),
            send_shipping_confirmation: true,
            ship_date: "2024-05-01".to_string(),
            note: "note".to_string(),
            shipping_method: Some("UPS Ground".to_string()),
            line_items: vec![MatchedLine {
                id: LineItemId::Number(11),
                quantity: 2,
            }],
        }
    }

    #[tokio::test]
    async fn test_lookup_order_success() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(GET)
                .path("/api/v2.3.0/orders/12345")
                .query_param("token", "secret");
            then.status(200)
                .header("Content-Type", "application/json")
                .json_body(serde_json::json!({
                    "id": 12345,
                    "line_items": [{"id": 11, "final_sku": "TSA-100"}]
                }));
        });

        let service = HttpOrderService::new();
        let order = service.lookup_order("12345", &store(&server)).await.unwrap();

        api_mock.assert();
        let items = order.line_items.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].final_sku.as_deref(), Some("TSA-100"));
    }

    #[tokio::test]
    async fn test_lookup_order_without_line_items() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/api/v2.3.0/orders/1");
            then.status(200).json_body(serde_json::json!({"id": 1}));
        });

        let order = HttpOrderService::new()
            .lookup_order("1", &store(&server))
            .await
            .unwrap();
        assert!(order.line_items.is_none());
    }

    #[tokio::test]
    async fn test_lookup_order_rejected() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(GET).path("/api/v2.3.0/orders/404");
            then.status(404).body("Order not found");
        });

        let err = HttpOrderService::new()
            .lookup_order("404", &store(&server))
            .await
            .unwrap_err();

        api_mock.assert();
        match err {
            SyncError::OrderLookupFailed { status, body, .. } => {
                assert_eq!(status, 404);
                assert_eq!(body, "Order not found");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_lookup_order_with_garbage_body() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/api/v2.3.0/orders/2");
            then.status(200).body("<html>maintenance</html>");
        });

        let err = HttpOrderService::new()
            .lookup_order("2", &store(&server))
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::InvalidOrderData { .. }));
    }

    #[tokio::test]
    async fn test_update_order_posts_shipment_envelope() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(POST)
                .path("/api/v2.3.0/orders/12345/shipments")
                .query_param("token", "secret")
                .json_body(serde_json::json!({
                    "shipment": {
                        "tracking_number": "1Z999",
                        "send_shipping_confirmation": true,
                        "ship_date": "2024-05-01",
                        "note": "note",
                        "shipping_method": "UPS Ground",
                        "line_items": [{"id": 11, "quantity": 2}]
                    }
                }));
            then.status(201).json_body(serde_json::json!({"id": 77}));
        });

        let ack = HttpOrderService::new()
            .update_order("12345", &store(&server), &payload())
            .await
            .unwrap();

        api_mock.assert();
        assert_eq!(ack.status, 201);
        assert_eq!(ack.body, ResponseBody::Json(serde_json::json!({"id": 77})));
    }

    #[tokio::test]
    async fn test_update_order_keeps_plain_text_body() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/api/v2.3.0/orders/5/shipments");
            then.status(200).body("ok");
        });

        let ack = HttpOrderService::new()
            .update_order("5", &store(&server), &payload())
            .await
            .unwrap();
        assert_eq!(ack.body, ResponseBody::Text("ok".to_string()));
    }

    #[tokio::test]
    async fn test_update_order_rejected() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/api/v2.3.0/orders/5/shipments");
            then.status(422).json_body(serde_json::json!({"error": "bad line item"}));
        });

        let err = HttpOrderService::new()
            .update_order("5", &store(&server), &payload())
            .await
            .unwrap_err();

        assert_eq!(
            err.to_string(),
            "Order update rejected for orderId 5, tracking: 1Z999, status: 422"
        );
    }

    #[test]
    fn test_orders_url_normalizes_trailing_slash() {
        let mut store = StoreConfig {
            id: "1".to_string(),
            base_url: "https://shop.example.com".to_string(),
            api_key: "k".to_string(),
            sku_prefix: String::new(),
        };
        assert_eq!(
            HttpOrderService::orders_url(&store, "9"),
            "https://shop.example.com/api/v2.3.0/orders/9"
        );

        store.base_url = "https://shop.example.com/".to_string();
        assert_eq!(
            HttpOrderService::orders_url(&store, "9"),
            "https://shop.example.com/api/v2.3.0/orders/9"
        );
    }
}
