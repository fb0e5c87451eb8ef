use crate::core::ConfigProvider;
use crate::domain::model::StoreConfig;
use crate::utils::error::{Result, SyncError};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;

pub const DEFAULT_NOTE_TEMPLATE: &str = "Updated via carrier shipment document on {date}";

fn default_reserved_orders() -> Vec<String> {
    ["239457", "239558", "155255"]
        .into_iter()
        .map(String::from)
        .collect()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    #[serde(default)]
    pub sync: SyncSettings,
    #[serde(default)]
    pub shipping_methods: HashMap<String, String>,
    #[serde(default)]
    pub stores: Vec<StoreConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncSettings {
    #[serde(default = "default_note_template")]
    pub note_template: String,
    #[serde(default = "default_reserved_orders")]
    pub reserved_orders: Vec<String>,
    pub request_timeout_seconds: Option<u64>,
    #[serde(default)]
    pub dedupe_records: bool,
}

fn default_note_template() -> String {
    DEFAULT_NOTE_TEMPLATE.to_string()
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            note_template: default_note_template(),
            reserved_orders: default_reserved_orders(),
            request_timeout_seconds: None,
            dedupe_records: false,
        }
    }
}

impl SyncConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(SyncError::Io)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        // 處理環境變數替換 (API keys 由環境提供)
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| SyncError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${API_KEY_8636})，未設定的保留原樣
    fn substitute_env_vars(content: &str) -> String {
        use regex::Regex;
        use std::sync::LazyLock;

        static ENV_VAR: LazyLock<Regex> =
            LazyLock::new(|| Regex::new(r"\$\{([^}]+)\}").expect("env var pattern is valid"));

        ENV_VAR
            .replace_all(content, |caps: &regex::Captures| {
                let var_name = &caps[1];
                std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
            })
            .into_owned()
    }

    pub fn request_timeout(&self) -> Option<std::time::Duration> {
        self.sync
            .request_timeout_seconds
            .map(std::time::Duration::from_secs)
    }

    pub fn dedupe_records(&self) -> bool {
        self.sync.dedupe_records
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        if self.stores.is_empty() {
            return Err(SyncError::MissingConfigError {
                field: "stores".to_string(),
            });
        }

        let mut seen_ids = HashSet::new();
        for store in &self.stores {
            validation::validate_digits("stores.id", &store.id)?;
            if !seen_ids.insert(store.id.as_str()) {
                return Err(SyncError::InvalidConfigValueError {
                    field: "stores.id".to_string(),
                    value: store.id.clone(),
                    reason: "Duplicate store id".to_string(),
                });
            }
            validation::validate_url(&format!("stores.{}.base_url", store.id), &store.base_url)?;
            validation::validate_resolved_secret(
                &format!("stores.{}.api_key", store.id),
                &store.api_key,
            )?;
        }

        validation::validate_non_empty_string("sync.note_template", &self.sync.note_template)?;

        if let Some(timeout) = self.sync.request_timeout_seconds {
            validation::validate_range("sync.request_timeout_seconds", timeout, 1, 300)?;
        }

        Ok(())
    }
}

impl ConfigProvider for SyncConfig {
    fn store(&self, store_id: &str) -> Option<&StoreConfig> {
        self.stores.iter().find(|store| store.id == store_id)
    }

    fn reserved_orders(&self) -> &[String] {
        &self.sync.reserved_orders
    }

    fn shipping_method(&self, description: &str) -> Option<&str> {
        self.shipping_methods.get(description).map(String::as_str)
    }

    fn note_template(&self) -> &str {
        &self.sync.note_template
    }
}

impl Validate for SyncConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
