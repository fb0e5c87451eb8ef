use crate::core::ShipmentSource;
use crate::domain::model::{RejectedRecord, ShipmentEntry, ShipmentRecord};
use crate::utils::error::{Result, SyncError};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Shipment attachments stored on local disk, either CSV or mail parser JSON.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
    dedupe: bool,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            dedupe: false,
        }
    }

    /// Drop exact repeats (same tracking number and stock item) before processing.
    pub fn with_dedupe(mut self, dedupe: bool) -> Self {
        self.dedupe = dedupe;
        self
    }

    fn is_csv(path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("csv"))
            .unwrap_or(false)
    }
}

impl ShipmentSource for FileSource {
    async fn load(&self) -> Result<Vec<ShipmentEntry>> {
        let data = tokio::fs::read(&self.path).await?;
        tracing::debug!("Read {} bytes from {}", data.len(), self.path.display());

        let entries = if Self::is_csv(&self.path) {
            parse_csv(&data)?
        } else {
            parse_mail_payload(&serde_json::from_slice(&data)?)?
        };

        let rejected = entries.iter().filter(|e| e.is_err()).count();
        if rejected > 0 {
            tracing::warn!("⚠️  {} shipment records could not be read", rejected);
        }

        if self.dedupe {
            Ok(dedupe_records(entries))
        } else {
            Ok(entries)
        }
    }
}

/// Decode one attachment. A record that does not fit `ShipmentRecord` is kept
/// as a rejection so the rest of the file is still processed.
pub fn decode_entry(index: usize, value: Value) -> ShipmentEntry {
    match serde_json::from_value::<ShipmentRecord>(value.clone()) {
        Ok(record) => Ok(record),
        Err(e) => {
            let field = |name: &str| value.get(name).and_then(identifier);
            let tracking_number = field("tracking_number").unwrap_or_default();
            let shipment = field("edwards_order_number")
                .or_else(|| field("order_number"))
                .or_else(|| (!tracking_number.is_empty()).then(|| tracking_number.clone()))
                .unwrap_or_else(|| format!("#{}", index + 1));

            Err(RejectedRecord {
                shipment,
                tracking_number,
                reason: e.to_string(),
            })
        }
    }
}

fn identifier(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// 每一列先轉成 JSON 物件 (空欄位省略)，再跟 mail parser 的附件走同一條解碼路徑
pub fn parse_csv(data: &[u8]) -> Result<Vec<ShipmentEntry>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(data);
    let headers = reader.headers()?.clone();

    let entries = reader
        .records()
        .enumerate()
        .map(|(index, row)| match row {
            Ok(row) => {
                let object: Map<String, Value> = headers
                    .iter()
                    .zip(row.iter())
                    .filter(|(_, field)| !field.is_empty())
                    .map(|(name, field)| (name.to_string(), Value::String(field.to_string())))
                    .collect();
                decode_entry(index, Value::Object(object))
            }
            Err(e) => Err(RejectedRecord {
                shipment: format!("#{}", index + 1),
                tracking_number: String::new(),
                reason: e.to_string(),
            }),
        })
        .collect();
    Ok(entries)
}

/// 支援三種輸入格式:
/// - 直接是 record 陣列
/// - `{ "mail_attachments": [...] }`
/// - `{ "mailparser": "<json string>" }` (mail parser 轉發時常見)
pub fn parse_mail_payload(payload: &Value) -> Result<Vec<ShipmentEntry>> {
    match payload {
        Value::Array(attachments) => Ok(decode_attachments(attachments)),
        Value::Object(obj) => {
            if let Some(inner) = obj.get("mailparser") {
                return match inner {
                    Value::String(raw) => parse_mail_payload(&serde_json::from_str(raw)?),
                    other => parse_mail_payload(other),
                };
            }

            match obj.get("mail_attachments") {
                Some(Value::Array(attachments)) => Ok(decode_attachments(attachments)),
                Some(_) => Err(SyncError::InvalidInput {
                    message: "'mail_attachments' must be an array".to_string(),
                }),
                None => Err(SyncError::InvalidInput {
                    message: "No mail_attachments found in input".to_string(),
                }),
            }
        }
        _ => Err(SyncError::InvalidInput {
            message: "expected a JSON object or array of shipment records".to_string(),
        }),
    }
}

fn decode_attachments(attachments: &[Value]) -> Vec<ShipmentEntry> {
    attachments
        .iter()
        .cloned()
        .enumerate()
        .map(|(index, value)| decode_entry(index, value))
        .collect()
}

/// Rejected entries are always kept; only readable records are deduplicated.
pub fn dedupe_records(entries: Vec<ShipmentEntry>) -> Vec<ShipmentEntry> {
    let mut seen = HashSet::new();
    let before = entries.len();
    let unique: Vec<ShipmentEntry> = entries
        .into_iter()
        .filter(|entry| match entry {
            Ok(r) => seen.insert((r.tracking_number.clone(), r.stock_item.clone())),
            Err(_) => true,
        })
        .collect();

    if unique.len() < before {
        tracing::info!("Dropped {} duplicate shipment records", before - unique.len());
    }
    unique
}
