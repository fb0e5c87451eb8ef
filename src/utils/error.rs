use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Invalid customer_po format: {po}")]
    InvalidFormat { po: String },

    #[error("storeId is not valid (non-digit characters found): {store_id}")]
    InvalidStoreId { store_id: String },

    #[error("storeId {store_id} does not match any stores.")]
    UnknownStore { store_id: String },

    #[error("Invalid item quantity for tracking {tracking_number}: {value}")]
    InvalidQuantity { tracking_number: String, value: f64 },

    #[error("Order lookup rejected for orderId {order_id}, status: {status}")]
    OrderLookupFailed {
        order_id: String,
        status: u16,
        body: String,
    },

    #[error("Invalid order data received for orderId {order_id}: {reason}")]
    InvalidOrderData { order_id: String, reason: String },

    #[error("No matching SKU found for shipment with SKU variations: {variants}")]
    NoMatchingSku { variants: String },

    #[error(
        "Order update rejected for orderId {order_id}, tracking: {tracking_number}, status: {status}"
    )]
    OrderUpdateFailed {
        order_id: String,
        tracking_number: String,
        status: u16,
        body: String,
    },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("CSV processing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Invalid shipment record {shipment}: {reason}")]
    MalformedRecord { shipment: String, reason: String },

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("No shipments found in input")]
    EmptyBatch,

    #[error("Configuration error in {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value for {field} ({value}): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Shipment batch encountered errors:\n{message}")]
    BatchFailed { message: String },
}

/// 錯誤分類，對應 pipeline 的各個階段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Input,
    Lookup,
    Match,
    Update,
    Config,
    System,
}

impl SyncError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            SyncError::InvalidFormat { .. }
            | SyncError::InvalidStoreId { .. }
            | SyncError::UnknownStore { .. }
            | SyncError::InvalidQuantity { .. }
            | SyncError::MalformedRecord { .. }
            | SyncError::InvalidInput { .. }
            | SyncError::EmptyBatch => ErrorCategory::Input,
            SyncError::OrderLookupFailed { .. } | SyncError::InvalidOrderData { .. } => {
                ErrorCategory::Lookup
            }
            SyncError::NoMatchingSku { .. } => ErrorCategory::Match,
            SyncError::OrderUpdateFailed { .. } => ErrorCategory::Update,
            SyncError::ConfigValidationError { .. }
            | SyncError::InvalidConfigValueError { .. }
            | SyncError::MissingConfigError { .. } => ErrorCategory::Config,
            SyncError::Http(_)
            | SyncError::Io(_)
            | SyncError::Serialization(_)
            | SyncError::Csv(_)
            | SyncError::BatchFailed { .. } => ErrorCategory::System,
        }
    }

    /// 可在 batch 之後重跑而可能成功的錯誤 (遠端或網路問題)
    pub fn is_transient(&self) -> bool {
        match self {
            SyncError::Http(e) => e.is_timeout() || e.is_connect(),
            SyncError::OrderLookupFailed { status, .. }
            | SyncError::OrderUpdateFailed { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;
