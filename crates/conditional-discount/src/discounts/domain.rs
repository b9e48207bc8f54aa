use serde::{Deserialize, Serialize};

/// Catalog identifier of a purchasable product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(pub i64);

impl std::fmt::Display for ProductId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Administrator-defined discount rule as persisted in the settings record.
///
/// Field names mirror the stored record (`threshold`, `discount`, `products`) so
/// that a saved rule list can be fed back through the sanitizer unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscountRule {
    pub threshold: f64,
    #[serde(rename = "discount")]
    pub discount_percent: f64,
    #[serde(rename = "products", default)]
    pub product_ids: Vec<ProductId>,
}

impl DiscountRule {
    pub fn new(threshold: f64, discount_percent: f64, product_ids: Vec<ProductId>) -> Self {
        Self {
            threshold,
            discount_percent,
            product_ids,
        }
    }

    /// An empty product list makes the rule inert rather than store-wide.
    pub fn covers(&self, product_id: ProductId) -> bool {
        !self.product_ids.is_empty() && self.product_ids.contains(&product_id)
    }

    pub fn is_met_by(&self, line_total: f64) -> bool {
        line_total >= self.threshold
    }
}

/// Line item as exposed by the host cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartLineItem {
    pub product_id: ProductId,
    pub name: String,
    pub unit_price: f64,
    pub quantity: u32,
}

impl CartLineItem {
    pub fn total_price(&self) -> f64 {
        self.unit_price * f64::from(self.quantity)
    }
}

/// Negative cart fee computed for a single line item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeeAdjustment {
    pub label: String,
    pub amount: f64,
    pub product_id: ProductId,
    pub line_total: f64,
    pub discount_percent: f64,
    pub rule_index: usize,
}

impl FeeAdjustment {
    pub fn discount_label(item_name: &str) -> String {
        format!("Discount for {item_name}")
    }
}

/// Product entry offered in the admin multi-select.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogProduct {
    pub id: ProductId,
    pub name: String,
}
