use crate::core::sku::sku_variants;
use crate::domain::model::{MatchedLine, OrderLineItem};
use crate::utils::error::{Result, SyncError};
use std::collections::{BTreeSet, HashSet};

pub const VARIANT_DELIMITER: &str = " | ";

/// Select the order lines whose SKU renderings overlap the shipment's.
/// Every matched line ships the same `quantity`.
pub fn match_line_items(
    shipment_variants: &BTreeSet<String>,
    line_items: &[OrderLineItem],
    quantity: u64,
) -> Result<Vec<MatchedLine>> {
    let mut seen = HashSet::new();
    let mut matched = Vec::new();

    for item in line_items {
        let Some(final_sku) = item.final_sku.as_deref() else {
            tracing::debug!("Line item {} has no final_sku, skipping", item.id);
            continue;
        };

        let item_variants = sku_variants(final_sku);
        if item_variants.is_disjoint(shipment_variants) {
            continue;
        }

        if seen.insert(item.id.clone()) {
            matched.push(MatchedLine {
                id: item.id.clone(),
                quantity,
            });
        }
    }

    if matched.is_empty() {
        return Err(SyncError::NoMatchingSku {
            variants: shipment_variants
                .iter()
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join(VARIANT_DELIMITER),
        });
    }

    Ok(matched)
}

/// Halves round toward positive infinity (-0.5 becomes 0, 2.5 becomes 3),
/// unlike `f64::round` which rounds them away from zero.
fn round_half_up(value: f64) -> f64 {
    let floor = value.floor();
    if value - floor >= 0.5 {
        floor + 1.0
    } else {
        floor
    }
}

/// Rounded `item_qty`, rejecting values that cannot be a shipped quantity.
pub fn shipped_quantity(tracking_number: &str, item_quantity: f64) -> Result<u64> {
    let rounded = round_half_up(item_quantity);
    if !rounded.is_finite() || rounded < 0.0 || rounded > u64::MAX as f64 {
        return Err(SyncError::InvalidQuantity {
            tracking_number: tracking_number.to_string(),
            value: item_quantity,
        });
    }
    Ok(rounded as u64)
}
