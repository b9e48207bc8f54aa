use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};

use super::cart::Cart;
use super::domain::{CartLineItem, DiscountRule, FeeAdjustment};
use super::evaluation::{DiscountEvaluator, SelectionPolicy};
use super::hooks::{
    sanitize_option_event, Hook, HookRegistry, RequestContext, CART_CALCULATE_FEES,
    DEFAULT_PRIORITY,
};
use super::sanitize::sanitize_rules_value;
use super::store::{RuleStore, SettingsError, SettingsStore, RULES_OPTION};

/// Priority of the discount handler on the cart fee event.
pub const CART_FEES_PRIORITY: i32 = 20;

/// Discount extension: reads rules on every recalculation and adds one
/// negative fee per discounted line item.
pub struct DiscountPlugin<S> {
    rules: RuleStore<S>,
    evaluator: DiscountEvaluator,
}

impl<S> DiscountPlugin<S>
where
    S: SettingsStore + 'static,
{
    pub fn new(settings: Arc<S>, policy: SelectionPolicy) -> Self {
        Self {
            rules: RuleStore::new(settings),
            evaluator: DiscountEvaluator::new(policy),
        }
    }

    pub fn policy(&self) -> SelectionPolicy {
        self.evaluator.policy()
    }

    /// Subscribe the cart fee handler and the rule sanitize filter.
    pub fn register(self: &Arc<Self>, hooks: &mut HookRegistry) {
        let plugin = Arc::clone(self);
        hooks.subscribe(
            CART_CALCULATE_FEES,
            CART_FEES_PRIORITY,
            Hook::CartFees(Arc::new(
                move |context: &RequestContext, cart: &mut dyn Cart| {
                    plugin.apply_discounts(context, cart);
                },
            )),
        );
        hooks.subscribe(
            sanitize_option_event(RULES_OPTION),
            DEFAULT_PRIORITY,
            Hook::Filter(Arc::new(sanitize_rules_value)),
        );
    }

    pub fn rules(&self) -> Result<Vec<DiscountRule>, SettingsError> {
        self.rules.load()
    }

    /// Add discount fees to `cart`, returning how many were added.
    ///
    /// A settings failure leaves the cart untouched; checkout never fails
    /// because discounts could not be read.
    pub fn apply_discounts(&self, context: &RequestContext, cart: &mut dyn Cart) -> usize {
        if context.is_admin_page_load() {
            debug!("skipping discounts for admin page load");
            return 0;
        }

        let rules = match self.rules.load() {
            Ok(rules) => rules,
            Err(err) => {
                warn!(error = %err, "discount rules unavailable; cart left unchanged");
                return 0;
            }
        };

        let adjustments = self.evaluator.evaluate(cart.items(), &rules);
        let added = adjustments.len();
        for adjustment in adjustments {
            cart.add_fee(adjustment.label, adjustment.amount);
        }
        added
    }

    /// Evaluate `items` against the stored rules without touching any cart.
    pub fn quote(&self, items: &[CartLineItem]) -> Result<DiscountQuote, SettingsError> {
        let rules = self.rules.load()?;
        Ok(DiscountQuote::new(
            self.policy(),
            items,
            self.evaluator.evaluate(items, &rules),
        ))
    }
}

/// Side-effect free preview of the discounts a cart would receive.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiscountQuote {
    pub policy: SelectionPolicy,
    pub adjustments: Vec<FeeAdjustment>,
    pub subtotal: f64,
    pub discount_total: f64,
    pub total: f64,
}

impl DiscountQuote {
    pub fn new(
        policy: SelectionPolicy,
        items: &[CartLineItem],
        adjustments: Vec<FeeAdjustment>,
    ) -> Self {
        let subtotal: f64 = items.iter().map(CartLineItem::total_price).sum();
        let discount_total: f64 = adjustments.iter().map(|adjustment| adjustment.amount).sum();
        Self {
            policy,
            adjustments,
            subtotal,
            discount_total,
            total: subtotal + discount_total,
        }
    }
}
