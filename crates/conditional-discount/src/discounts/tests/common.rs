use std::sync::Arc;

use axum::response::Response;
use serde_json::{json, Value};

use crate::discounts::catalog::StaticCatalog;
use crate::discounts::domain::{CartLineItem, CatalogProduct, DiscountRule, ProductId};
use crate::discounts::evaluation::{DiscountEvaluator, SelectionPolicy};
use crate::discounts::service::DiscountService;
use crate::discounts::store::{InMemorySettingsStore, SettingsError, SettingsStore};

pub(super) fn line_item(product_id: i64, unit_price: f64, quantity: u32) -> CartLineItem {
    CartLineItem {
        product_id: ProductId(product_id),
        name: format!("Product {product_id}"),
        unit_price,
        quantity,
    }
}

pub(super) fn rule(threshold: f64, discount_percent: f64, products: &[i64]) -> DiscountRule {
    DiscountRule::new(
        threshold,
        discount_percent,
        products.iter().copied().map(ProductId).collect(),
    )
}

/// Two overlapping rules for product 7: 10% from 50, 20% from 80.
pub(super) fn overlapping_rules() -> Vec<DiscountRule> {
    vec![rule(50.0, 10.0, &[7]), rule(80.0, 20.0, &[7])]
}

pub(super) fn overlapping_rules_json() -> Value {
    json!([
        { "threshold": 50, "discount": 10, "products": [7] },
        { "threshold": 80, "discount": 20, "products": [7] },
    ])
}

pub(super) fn highest() -> DiscountEvaluator {
    DiscountEvaluator::new(SelectionPolicy::HighestDiscount)
}

pub(super) fn first_match() -> DiscountEvaluator {
    DiscountEvaluator::new(SelectionPolicy::FirstMatch)
}

pub(super) fn catalog() -> StaticCatalog {
    StaticCatalog::new(vec![
        CatalogProduct {
            id: ProductId(7),
            name: "Espresso Beans".to_string(),
        },
        CatalogProduct {
            id: ProductId(9),
            name: "Paper Filters".to_string(),
        },
    ])
}

pub(super) fn build_service(
    policy: SelectionPolicy,
) -> (
    DiscountService<InMemorySettingsStore, StaticCatalog>,
    Arc<InMemorySettingsStore>,
) {
    let store = Arc::new(InMemorySettingsStore::default());
    let service = DiscountService::new(store.clone(), Arc::new(catalog()), policy);
    (service, store)
}

pub(super) fn seeded_service(
    rules: Value,
) -> DiscountService<InMemorySettingsStore, StaticCatalog> {
    DiscountService::new(
        Arc::new(InMemorySettingsStore::with_rules(rules)),
        Arc::new(catalog()),
        SelectionPolicy::HighestDiscount,
    )
}

pub(super) struct UnavailableSettings;

impl SettingsStore for UnavailableSettings {
    fn get(&self, _key: &str) -> Result<Option<Value>, SettingsError> {
        Err(SettingsError::Unavailable("database offline".to_string()))
    }

    fn set(&self, _key: &str, _value: Value) -> Result<(), SettingsError> {
        Err(SettingsError::Unavailable("database offline".to_string()))
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

pub(super) async fn read_text_body(response: Response) -> String {
    let body = axum::body::to_bytes(response.into_body(), 256 * 1024)
        .await
        .expect("read body");
    String::from_utf8(body.to_vec()).expect("utf-8 body")
}
