use std::path::PathBuf;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use conditional_discount::discounts::{
    parse_cart_csv, sanitize_rules, CatalogProduct, DiscountService, JsonFileSettingsStore,
    ProductId, RequestContext, SelectionPolicy, SessionCart, StaticCatalog,
};
use serde_json::json;

const CART_CSV: &str = "\
Product ID,Name,Unit Price,Quantity
7,Espresso Beans,50.00,2
9,Paper Filters,4.50,3
12,Gift Card,25,1
";

fn settings_path(label: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_nanos())
        .unwrap_or_default();
    std::env::temp_dir().join(format!(
        "checkout-discounts-{label}-{}-{nanos}.json",
        std::process::id()
    ))
}

fn catalog() -> Arc<StaticCatalog> {
    Arc::new(StaticCatalog::new(vec![
        CatalogProduct {
            id: ProductId(7),
            name: "Espresso Beans".to_string(),
        },
        CatalogProduct {
            id: ProductId(9),
            name: "Paper Filters".to_string(),
        },
    ]))
}

#[test]
fn saved_rules_discount_an_imported_cart() {
    let path = settings_path("checkout");
    let service = DiscountService::new(
        Arc::new(JsonFileSettingsStore::new(path.clone())),
        catalog(),
        SelectionPolicy::HighestDiscount,
    );

    service
        .save_rules(json!([
            { "threshold": "50", "discount": "10", "products": ["7"] },
            { "threshold": "80", "discount": "20", "products": ["7"] },
            { "threshold": "10", "discount": "150", "products": ["9"] },
            { "threshold": "0", "discount": "50", "products": [] },
        ]))
        .expect("rules saved");

    let items = parse_cart_csv(CART_CSV.as_bytes()).expect("cart parses");
    let mut cart = SessionCart::new(items);
    let added = service.calculate_fees(&RequestContext::storefront(), &mut cart);

    assert_eq!(added, 1, "one discount subscriber runs");
    let fees: Vec<(&str, f64)> = cart
        .fees()
        .iter()
        .map(|fee| (fee.label.as_str(), fee.amount))
        .collect();
    assert_eq!(
        fees,
        vec![
            ("Discount for Espresso Beans", -20.0),
            ("Discount for Paper Filters", -13.5),
        ]
    );
    assert_eq!(cart.subtotal(), 138.5);
    assert_eq!(cart.total(), 105.0);

    let persisted = std::fs::read_to_string(&path).expect("settings written");
    let stored: serde_json::Value = serde_json::from_str(&persisted).expect("settings json");
    let rules = sanitize_rules(&stored["cpd_discount_rules"]);
    assert_eq!(rules.len(), 4);
    assert_eq!(rules[2].discount_percent, 100.0);

    let _ = std::fs::remove_file(&path);
}

#[test]
fn a_fresh_service_reads_rules_saved_by_another() {
    let path = settings_path("reload");
    let writer = DiscountService::new(
        Arc::new(JsonFileSettingsStore::new(path.clone())),
        catalog(),
        SelectionPolicy::HighestDiscount,
    );
    writer
        .save_rules(json!([
            { "threshold": 50, "discount": 10, "products": [7] },
            { "threshold": 80, "discount": 20, "products": [7] },
        ]))
        .expect("rules saved");

    let reader = DiscountService::new(
        Arc::new(JsonFileSettingsStore::new(path.clone())),
        catalog(),
        SelectionPolicy::FirstMatch,
    );
    let items = parse_cart_csv(CART_CSV.as_bytes()).expect("cart parses");
    let quote = reader.quote(&items).expect("quote builds");

    assert_eq!(quote.adjustments.len(), 1);
    assert_eq!(quote.adjustments[0].amount, -10.0);
    assert_eq!(quote.adjustments[0].rule_index, 0);

    let _ = std::fs::remove_file(&path);
}
