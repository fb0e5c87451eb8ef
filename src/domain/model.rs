use crate::utils::error::{Result, SyncError};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashSet;
use std::fmt;

/// One line of a carrier shipment notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShipmentRecord {
    pub tracking_number: String,
    pub customer_po: String,
    #[serde(default)]
    pub ship_via_description: Option<String>,
    #[serde(default)]
    pub stock_item: String,
    #[serde(rename = "item_qty", deserialize_with = "deserialize_quantity")]
    pub item_quantity: f64,
    #[serde(default)]
    pub shipment_date: String,
    #[serde(
        default,
        alias = "edwards_order_number",
        deserialize_with = "deserialize_optional_id"
    )]
    pub order_number: Option<String>,
}

impl ShipmentRecord {
    /// 結果列表中用來辨識此筆出貨的 id
    pub fn shipment_id(&self) -> &str {
        self.order_number
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or(&self.tracking_number)
    }
}

/// `item_qty` 可能是數字或數字字串
fn deserialize_quantity<'de, D>(deserializer: D) -> std::result::Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    struct QuantityVisitor;

    impl<'de> serde::de::Visitor<'de> for QuantityVisitor {
        type Value = f64;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a number or a numeric string")
        }

        fn visit_u64<E: serde::de::Error>(self, v: u64) -> std::result::Result<f64, E> {
            Ok(v as f64)
        }

        fn visit_i64<E: serde::de::Error>(self, v: i64) -> std::result::Result<f64, E> {
            Ok(v as f64)
        }

        fn visit_f64<E: serde::de::Error>(self, v: f64) -> std::result::Result<f64, E> {
            Ok(v)
        }

        fn visit_str<E: serde::de::Error>(self, v: &str) -> std::result::Result<f64, E> {
            v.trim()
                .parse::<f64>()
                .map_err(|_| E::custom(format!("invalid item_qty: {:?}", v)))
        }
    }

    deserializer.deserialize_any(QuantityVisitor)
}

/// Carrier order numbers arrive as strings or bare numbers; blanks count as absent.
fn deserialize_optional_id<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    struct IdVisitor;

    impl<'de> serde::de::Visitor<'de> for IdVisitor {
        type Value = Option<String>;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a string or number identifier")
        }

        fn visit_unit<E: serde::de::Error>(self) -> std::result::Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_none<E: serde::de::Error>(self) -> std::result::Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_some<D2: Deserializer<'de>>(
            self,
            deserializer: D2,
        ) -> std::result::Result<Self::Value, D2::Error> {
            deserializer.deserialize_any(IdVisitor)
        }

        fn visit_u64<E: serde::de::Error>(self, v: u64) -> std::result::Result<Self::Value, E> {
            Ok(Some(v.to_string()))
        }

        fn visit_i64<E: serde::de::Error>(self, v: i64) -> std::result::Result<Self::Value, E> {
            Ok(Some(v.to_string()))
        }

        fn visit_f64<E: serde::de::Error>(self, v: f64) -> std::result::Result<Self::Value, E> {
            Ok(Some(v.to_string()))
        }

        fn visit_str<E: serde::de::Error>(self, v: &str) -> std::result::Result<Self::Value, E> {
            let v = v.trim();
            Ok((!v.is_empty()).then(|| v.to_string()))
        }
    }

    deserializer.deserialize_any(IdVisitor)
}

/// An attachment row that could not be read as a `ShipmentRecord`.
/// It still produces an `Error` result so the rest of the batch goes through.
#[derive(Debug, Clone, PartialEq)]
pub struct RejectedRecord {
    pub shipment: String,
    pub tracking_number: String,
    pub reason: String,
}

impl RejectedRecord {
    pub fn to_error(&self) -> SyncError {
        SyncError::MalformedRecord {
            shipment: self.shipment.clone(),
            reason: self.reason.clone(),
        }
    }
}

pub type ShipmentEntry = std::result::Result<ShipmentRecord, RejectedRecord>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    pub id: String,
    pub base_url: String,
    pub api_key: String,
    #[serde(default)]
    pub sku_prefix: String,
}

/// Store APIs return numeric ids, but some backends send them as strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LineItemId {
    Number(u64),
    Text(String),
}

impl fmt::Display for LineItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LineItemId::Number(n) => write!(f, "{}", n),
            LineItemId::Text(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderLineItem {
    pub id: LineItemId,
    #[serde(default)]
    pub final_sku: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Order {
    #[serde(default)]
    pub line_items: Option<Vec<OrderLineItem>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchedLine {
    pub id: LineItemId,
    pub quantity: u64,
}

/// Body of `POST .../shipments`, wrapped in a `shipment` envelope on the wire.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShipmentUpdatePayload {
    pub tracking_number: String,
    pub send_shipping_confirmation: bool,
    pub ship_date: String,
    pub note: String,
    pub shipping_method: Option<String>,
    pub line_items: Vec<MatchedLine>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShipmentUpdateRequest<'a> {
    pub shipment: &'a ShipmentUpdatePayload,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ResponseBody {
    Json(serde_json::Value),
    Text(String),
}

impl ResponseBody {
    pub fn parse(raw: String) -> Self {
        match serde_json::from_str(&raw) {
            Ok(value) => ResponseBody::Json(value),
            Err(_) => ResponseBody::Text(raw),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpdateAck {
    pub status: u16,
    pub body: ResponseBody,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProcessingStatus {
    Success,
    Skipped,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessingResult {
    pub shipment: String,
    pub status: ProcessingStatus,
    pub tracking_number: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Store response to the shipment update
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<ResponseBody>,
}

/// Distinct error messages in first-seen order.
#[derive(Debug, Clone, Default)]
pub struct ErrorSet {
    seen: HashSet<String>,
    ordered: Vec<String>,
}

impl ErrorSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` when the message was already recorded.
    pub fn insert(&mut self, message: impl Into<String>) -> bool {
        let message = message.into();
        if self.seen.contains(&message) {
            return false;
        }
        self.seen.insert(message.clone());
        self.ordered.push(message);
        true
    }

    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }

    pub fn joined(&self) -> String {
        self.ordered.join("\n")
    }
}

#[derive(Debug, Clone)]
pub struct BatchReport {
    pub results: Vec<ProcessingResult>,
    pub errors: ErrorSet,
}

impl BatchReport {
    pub fn count(&self, status: ProcessingStatus) -> usize {
        self.results.iter().filter(|r| r.status == status).count()
    }

    /// The aggregate failure, if any record failed.
    pub fn failure(&self) -> Option<SyncError> {
        if self.errors.is_empty() {
            return None;
        }
        Some(SyncError::BatchFailed {
            message: self.errors.joined(),
        })
    }

    pub fn into_result(self) -> Result<Vec<ProcessingResult>> {
        match self.failure() {
            Some(err) => Err(err),
            None => Ok(self.results),
        }
    }
}
