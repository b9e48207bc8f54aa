use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize};

use super::domain::{CartLineItem, ProductId};

/// Mutation surface the host cart exposes to fee handlers.
pub trait Cart {
    fn items(&self) -> &[CartLineItem];
    fn add_fee(&mut self, label: String, amount: f64);
}

/// Named, possibly negative, adjustment to the cart total.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartFee {
    pub label: String,
    pub amount: f64,
}

/// Request-scoped cart used by the HTTP surface and the CLI.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionCart {
    items: Vec<CartLineItem>,
    fees: Vec<CartFee>,
}

impl SessionCart {
    pub fn new(items: Vec<CartLineItem>) -> Self {
        Self {
            items,
            fees: Vec::new(),
        }
    }

    pub fn fees(&self) -> &[CartFee] {
        &self.fees
    }

    pub fn subtotal(&self) -> f64 {
        self.items.iter().map(CartLineItem::total_price).sum()
    }

    pub fn fee_total(&self) -> f64 {
        self.fees.iter().map(|fee| fee.amount).sum()
    }

    pub fn total(&self) -> f64 {
        self.subtotal() + self.fee_total()
    }

    pub fn summary(&self) -> CartSummary {
        CartSummary {
            items: self.items.clone(),
            fees: self.fees.clone(),
            subtotal: self.subtotal(),
            fee_total: self.fee_total(),
            total: self.total(),
        }
    }
}

impl Cart for SessionCart {
    fn items(&self) -> &[CartLineItem] {
        &self.items
    }

    fn add_fee(&mut self, label: String, amount: f64) {
        self.fees.push(CartFee { label, amount });
    }
}

/// Serializable snapshot of a recalculated cart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CartSummary {
    pub items: Vec<CartLineItem>,
    pub fees: Vec<CartFee>,
    pub subtotal: f64,
    pub fee_total: f64,
    pub total: f64,
}

#[derive(Debug, thiserror::Error)]
pub enum CartImportError {
    #[error("failed to read cart export: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid cart CSV data: {0}")]
    Csv(#[from] csv::Error),
    #[error("line {line}: product {product_id} has a zero quantity")]
    ZeroQuantity { line: usize, product_id: ProductId },
    #[error("line {line}: product {product_id} has an invalid unit price")]
    InvalidPrice { line: usize, product_id: ProductId },
}

/// Read cart lines from a `Product ID,Name,Unit Price,Quantity` export.
pub fn parse_cart_csv<R: Read>(reader: R) -> Result<Vec<CartLineItem>, CartImportError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut items = Vec::new();

    for (index, record) in csv_reader.deserialize::<CartRow>().enumerate() {
        let row = record?;
        let line = index + 2;
        let product_id = ProductId(row.product_id);

        if row.quantity == 0 {
            return Err(CartImportError::ZeroQuantity { line, product_id });
        }
        if !row.unit_price.is_finite() || row.unit_price < 0.0 {
            return Err(CartImportError::InvalidPrice { line, product_id });
        }

        items.push(CartLineItem {
            product_id,
            name: row
                .name
                .unwrap_or_else(|| format!("Product #{}", row.product_id)),
            unit_price: row.unit_price,
            quantity: row.quantity,
        });
    }

    Ok(items)
}

pub fn load_cart_csv(path: &Path) -> Result<Vec<CartLineItem>, CartImportError> {
    let file = File::open(path)?;
    parse_cart_csv(file)
}

#[derive(Debug, Deserialize)]
struct CartRow {
    #[serde(rename = "Product ID")]
    product_id: i64,
    #[serde(rename = "Name", default, deserialize_with = "empty_string_as_none")]
    name: Option<String>,
    #[serde(rename = "Unit Price")]
    unit_price: f64,
    #[serde(rename = "Quantity")]
    quantity: u32,
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}
