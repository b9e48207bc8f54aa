use conditional_discount::config::DiscountConfig;
use conditional_discount::discounts::{
    CatalogProduct, InMemorySettingsStore, JsonFileSettingsStore, ProductId, SelectionPolicy,
    SettingsError, SettingsStore, StaticCatalog,
};
use metrics_exporter_prometheus::PrometheusHandle;
use serde_json::Value;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Settings backend chosen from configuration at startup.
pub(crate) enum ConfiguredSettingsStore {
    Memory(InMemorySettingsStore),
    File(JsonFileSettingsStore),
}

impl ConfiguredSettingsStore {
    pub(crate) fn from_config(config: &DiscountConfig) -> Self {
        match &config.settings_path {
            Some(path) => Self::File(JsonFileSettingsStore::new(path.clone())),
            None => Self::Memory(InMemorySettingsStore::default()),
        }
    }

    pub(crate) fn describe(&self) -> String {
        match self {
            Self::Memory(_) => "in-memory".to_string(),
            Self::File(store) => store.path().display().to_string(),
        }
    }
}

impl SettingsStore for ConfiguredSettingsStore {
    fn get(&self, key: &str) -> Result<Option<Value>, SettingsError> {
        match self {
            Self::Memory(store) => store.get(key),
            Self::File(store) => store.get(key),
        }
    }

    fn set(&self, key: &str, value: Value) -> Result<(), SettingsError> {
        match self {
            Self::Memory(store) => store.set(key, value),
            Self::File(store) => store.set(key, value),
        }
    }
}

/// Sample storefront catalog offered in the rule editor.
pub(crate) fn demo_catalog() -> StaticCatalog {
    StaticCatalog::new(
        [
            (7, "Espresso Beans"),
            (9, "Paper Filters"),
            (12, "Ceramic Dripper"),
            (15, "Gooseneck Kettle"),
        ]
        .into_iter()
        .map(|(id, name)| CatalogProduct {
            id: ProductId(id),
            name: name.to_string(),
        })
        .collect(),
    )
}

pub(crate) fn parse_policy(raw: &str) -> Result<SelectionPolicy, String> {
    raw.parse::<SelectionPolicy>().map_err(|err| err.to_string())
}
