use crate::domain::model::{MatchedLine, ShipmentRecord, ShipmentUpdatePayload};
use crate::domain::ports::ConfigProvider;
use chrono::NaiveDate;

pub const DATE_PLACEHOLDER: &str = "{date}";

/// Carrier service descriptions the store backends know under another name.
pub fn builtin_shipping_method(description: &str) -> Option<&'static str> {
    match description {
        "UPS RES" | "UPS GRND" => Some("UPS Ground"),
        "FedEx GRND" => Some("FedEx Ground"),
        "UPS 3DAY" => Some("UPS 3 Day Select"),
        _ => None,
    }
}

/// 設定檔中的對照優先，其次是內建對照，最後保留原始描述
pub fn resolve_shipping_method<C: ConfigProvider>(
    config: &C,
    description: Option<&str>,
) -> Option<String> {
    let description = description?;
    let resolved = config
        .shipping_method(description)
        .or_else(|| builtin_shipping_method(description))
        .unwrap_or(description);
    Some(resolved.to_string())
}

pub fn render_note(template: &str, today: NaiveDate) -> String {
    template.replace(DATE_PLACEHOLDER, &today.format("%Y-%m-%d").to_string())
}

/// One bundled update covering every matched line of the shipment.
pub fn build_payload<C: ConfigProvider>(
    config: &C,
    shipment: &ShipmentRecord,
    line_items: Vec<MatchedLine>,
    today: NaiveDate,
) -> ShipmentUpdatePayload {
    ShipmentUpdatePayload {
        tracking_number: shipment.tracking_number.clone(),
        send_shipping_confirmation: true,
        ship_date: shipment.shipment_date.clone(),
        note: render_note(config.note_template(), today),
        shipping_method: resolve_shipping_method(
            config,
            shipment.ship_via_description.as_deref(),
        ),
        line_items,
    }
}
