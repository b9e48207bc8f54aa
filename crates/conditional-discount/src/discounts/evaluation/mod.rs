mod policy;
mod rules;

pub use policy::{SelectionPolicy, UnknownPolicy};

use super::domain::{CartLineItem, DiscountRule, FeeAdjustment};
use tracing::debug;

/// Stateless evaluator turning cart lines and stored rules into discount fees.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiscountEvaluator {
    policy: SelectionPolicy,
}

impl DiscountEvaluator {
    pub fn new(policy: SelectionPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> SelectionPolicy {
        self.policy
    }

    /// Compute one negative fee per line item that earns a non-zero discount.
    pub fn evaluate(&self, items: &[CartLineItem], rules: &[DiscountRule]) -> Vec<FeeAdjustment> {
        items
            .iter()
            .filter_map(|item| self.evaluate_item(item, rules))
            .collect()
    }

    pub fn evaluate_item(
        &self,
        item: &CartLineItem,
        rules: &[DiscountRule],
    ) -> Option<FeeAdjustment> {
        let line_total = item.total_price();
        let selected = self
            .policy
            .select(rules::qualifying_rules(item, line_total, rules));

        let Some(candidate) = selected else {
            debug!(product_id = %item.product_id, line_total, "no discount rule qualifies");
            return None;
        };

        if candidate.discount_percent <= 0.0 {
            debug!(
                product_id = %item.product_id,
                rule_index = candidate.rule_index,
                "selected rule carries no discount"
            );
            return None;
        }

        let discount = line_total * candidate.discount_percent / 100.0;
        if discount == 0.0 {
            debug!(
                product_id = %item.product_id,
                rule_index = candidate.rule_index,
                "line total is zero; no fee added"
            );
            return None;
        }

        debug!(
            product_id = %item.product_id,
            rule_index = candidate.rule_index,
            discount_percent = candidate.discount_percent,
            policy = %self.policy,
            discount,
            "discount applied"
        );

        Some(FeeAdjustment {
            label: FeeAdjustment::discount_label(&item.name),
            amount: -discount,
            product_id: item.product_id,
            line_total,
            discount_percent: candidate.discount_percent,
            rule_index: candidate.rule_index,
        })
    }
}
