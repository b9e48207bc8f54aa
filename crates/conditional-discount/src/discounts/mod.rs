//! Threshold-based product discounts applied as negative cart fees.
//!
//! Administrators maintain an ordered rule list in a single settings record.
//! Every cart recalculation reloads that list, picks one rule per line item,
//! and records the resulting discount as a fee on the cart.

pub mod admin;
pub mod cart;
pub mod catalog;
pub mod domain;
pub mod evaluation;
pub mod hooks;
pub mod plugin;
pub mod router;
pub mod sanitize;
pub mod service;
pub mod store;

#[cfg(test)]
mod tests;

pub use cart::{
    load_cart_csv, parse_cart_csv, Cart, CartFee, CartImportError, CartSummary, SessionCart,
};
pub use catalog::{CatalogError, ProductCatalog, StaticCatalog};
pub use domain::{CartLineItem, CatalogProduct, DiscountRule, FeeAdjustment, ProductId};
pub use evaluation::{DiscountEvaluator, SelectionPolicy, UnknownPolicy};
pub use hooks::{Hook, HookRegistry, RequestContext, CART_CALCULATE_FEES};
pub use plugin::{DiscountPlugin, DiscountQuote, CART_FEES_PRIORITY};
pub use router::discount_router;
pub use sanitize::{sanitize_rules, sanitize_rules_value};
pub use service::{DiscountService, DiscountServiceError};
pub use store::{
    InMemorySettingsStore, JsonFileSettingsStore, RuleStore, SettingsApi, SettingsError,
    SettingsStore, RULES_OPTION,
};
