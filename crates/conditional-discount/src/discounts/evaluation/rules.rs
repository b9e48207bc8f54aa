use super::super::domain::{CartLineItem, DiscountRule};
use super::super::sanitize::clamp_percent;

/// Qualifying rule for a line item, with its evaluation-time clamped discount.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Candidate {
    pub rule_index: usize,
    pub discount_percent: f64,
}

/// Rules covering the item's product whose threshold the line total meets, in
/// stored order.
pub(crate) fn qualifying_rules<'a>(
    item: &'a CartLineItem,
    line_total: f64,
    rules: &'a [DiscountRule],
) -> impl Iterator<Item = Candidate> + 'a {
    rules
        .iter()
        .enumerate()
        .filter(move |(_, rule)| rule.covers(item.product_id))
        .filter(move |(_, rule)| rule.is_met_by(line_total))
        .map(|(rule_index, rule)| Candidate {
            rule_index,
            discount_percent: clamp_percent(rule.discount_percent),
        })
}
