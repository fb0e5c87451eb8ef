use crate::utils::error::{Result, SyncError};
use regex::Regex;
use std::sync::LazyLock;

/// 多次出貨的序號後綴，例如 `-S2` 或 `-S#`
static SEQUENCE_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-S(\d+|#)$").expect("sequence suffix pattern is valid"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PoDecision {
    Order { store_id: String, order_id: String },
    /// Business-to-business order, intentionally not processed.
    Skip { cleaned_po: String },
}

pub fn strip_sequence_suffix(po: &str) -> &str {
    match SEQUENCE_SUFFIX.find(po) {
        Some(m) => &po[..m.start()],
        None => po,
    }
}

/// Decode `[ABBR-]STORE-ORDER[-S<n>]` into a store and order id.
pub fn decode_po(raw_po: &str, reserved_orders: &[String]) -> Result<PoDecision> {
    let cleaned = strip_sequence_suffix(raw_po.trim());

    if reserved_orders
        .iter()
        .any(|reserved| !reserved.is_empty() && cleaned.contains(reserved.as_str()))
    {
        return Ok(PoDecision::Skip {
            cleaned_po: cleaned.to_string(),
        });
    }

    let segments: Vec<&str> = cleaned.split('-').collect();
    let (store_id, order_id) = match segments.as_slice() {
        [store, order] => (*store, *order),
        [_, store, order, ..] => (*store, *order),
        _ => {
            return Err(SyncError::InvalidFormat {
                po: cleaned.to_string(),
            })
        }
    };

    if store_id.is_empty() || !store_id.bytes().all(|b| b.is_ascii_digit()) {
        return Err(SyncError::InvalidStoreId {
            store_id: store_id.to_string(),
        });
    }

    if order_id.is_empty() {
        return Err(SyncError::InvalidFormat {
            po: cleaned.to_string(),
        });
    }

    Ok(PoDecision::Order {
        store_id: store_id.to_string(),
        order_id: order_id.to_string(),
    })
}
