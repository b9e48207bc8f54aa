//! Lenient normalization of submitted rule lists.
//!
//! Nothing in here fails: malformed numbers coerce to zero, out-of-range values
//! clamp, and anything that is not a product list becomes an empty one.

use serde_json::{json, Map, Value};

use super::domain::{DiscountRule, ProductId};

pub const MAX_DISCOUNT_PERCENT: f64 = 100.0;

/// Rebuild a submitted rule collection into a dense, validated list.
///
/// Arrays keep their order. Objects (form submissions keyed by row index) are
/// flattened with numeric keys in numeric order, followed by any other keys.
pub fn sanitize_rules(input: &Value) -> Vec<DiscountRule> {
    match input {
        Value::Array(rules) => rules.iter().map(sanitize_rule).collect(),
        Value::Object(rows) => ordered_rows(rows).into_iter().map(sanitize_rule).collect(),
        _ => Vec::new(),
    }
}

/// Sanitize filter body: raw settings value in, stored settings value out.
pub fn sanitize_rules_value(input: Value) -> Value {
    rules_to_value(&sanitize_rules(&input))
}

/// Stored form of a rule list.
pub fn rules_to_value(rules: &[DiscountRule]) -> Value {
    Value::Array(rules.iter().map(rule_to_value).collect())
}

pub fn sanitize_rule(input: &Value) -> DiscountRule {
    let field = |name: &str| input.as_object().and_then(|row| row.get(name));

    // An overflowing threshold saturates instead of becoming infinite, which
    // JSON cannot store; it still never matches a real line total.
    let threshold = field("threshold")
        .map(coerce_float)
        .unwrap_or(0.0)
        .clamp(0.0, f64::MAX);
    let discount_percent = clamp_percent(field("discount").map(coerce_float).unwrap_or(0.0));
    let product_ids = match field("products") {
        Some(Value::Array(products)) => products
            .iter()
            .map(|product| ProductId(coerce_int(product)))
            .collect(),
        _ => Vec::new(),
    };

    DiscountRule {
        threshold,
        discount_percent,
        product_ids,
    }
}

pub fn rule_to_value(rule: &DiscountRule) -> Value {
    json!({
        "threshold": rule.threshold,
        "discount": rule.discount_percent,
        "products": rule.product_ids.iter().map(|id| id.0).collect::<Vec<_>>(),
    })
}

/// Clamp a percentage into `[0, 100]`, mapping NaN to zero.
pub fn clamp_percent(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, MAX_DISCOUNT_PERCENT)
    }
}

fn ordered_rows(rows: &Map<String, Value>) -> Vec<&Value> {
    let mut entries: Vec<(Option<i64>, &String, &Value)> = rows
        .iter()
        .map(|(key, value)| (key.trim().parse::<i64>().ok(), key, value))
        .collect();
    entries.sort_by(|(left_index, left_key, _), (right_index, right_key, _)| {
        match (left_index, right_index) {
            (Some(left), Some(right)) => left.cmp(right),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => left_key.cmp(right_key),
        }
    });
    entries.into_iter().map(|(_, _, value)| value).collect()
}

/// Loose float conversion: strings contribute their leading numeric prefix.
///
/// Prefixes that overflow stay infinite; only NaN falls back to zero.
pub fn coerce_float(value: &Value) -> f64 {
    let number = match value {
        Value::Number(number) => number.as_f64().unwrap_or(0.0),
        Value::String(raw) => leading_float(raw),
        Value::Bool(flag) => f64::from(u8::from(*flag)),
        Value::Array(items) => f64::from(u8::from(!items.is_empty())),
        Value::Object(fields) => f64::from(u8::from(!fields.is_empty())),
        Value::Null => 0.0,
    };

    if number.is_nan() {
        0.0
    } else {
        number
    }
}

/// Loose integer conversion: floats truncate, strings use their leading digits.
pub fn coerce_int(value: &Value) -> i64 {
    match value {
        Value::Number(number) => number
            .as_i64()
            .or_else(|| number.as_f64().map(|float| float as i64))
            .unwrap_or(0),
        Value::String(raw) => leading_int(raw),
        Value::Bool(flag) => i64::from(*flag),
        Value::Array(items) => i64::from(!items.is_empty()),
        Value::Object(fields) => i64::from(!fields.is_empty()),
        Value::Null => 0,
    }
}

fn leading_float(raw: &str) -> f64 {
    let trimmed = raw.trim_start();
    let bytes = trimmed.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end += 1;
    }

    let integer_start = end;
    while bytes.get(end).is_some_and(u8::is_ascii_digit) {
        end += 1;
    }
    let mut digits = end - integer_start;

    if bytes.get(end) == Some(&b'.') {
        let fraction_start = end + 1;
        let mut cursor = fraction_start;
        while bytes.get(cursor).is_some_and(u8::is_ascii_digit) {
            cursor += 1;
        }
        digits += cursor - fraction_start;
        if digits > 0 {
            end = cursor;
        }
    }

    if digits == 0 {
        return 0.0;
    }

    if matches!(bytes.get(end), Some(b'e') | Some(b'E')) {
        let mut cursor = end + 1;
        if matches!(bytes.get(cursor), Some(b'+') | Some(b'-')) {
            cursor += 1;
        }
        let exponent_start = cursor;
        while bytes.get(cursor).is_some_and(u8::is_ascii_digit) {
            cursor += 1;
        }
        if cursor > exponent_start {
            end = cursor;
        }
    }

    trimmed[..end].parse::<f64>().unwrap_or(0.0)
}

fn leading_int(raw: &str) -> i64 {
    let trimmed = raw.trim_start();
    let bytes = trimmed.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end += 1;
    }
    let digits_start = end;
    while bytes.get(end).is_some_and(u8::is_ascii_digit) {
        end += 1;
    }
    if end == digits_start {
        return 0;
    }

    let negative = bytes.first() == Some(&b'-');
    trimmed[..end]
        .parse::<i64>()
        .unwrap_or(if negative { i64::MIN } else { i64::MAX })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamps_discount_into_percentage_range() {
        let rules = sanitize_rules(&json!([
            { "threshold": "10", "discount": "150", "products": ["7"] },
            { "threshold": "10", "discount": "-5", "products": ["7"] },
        ]));

        assert_eq!(rules[0].discount_percent, 100.0);
        assert_eq!(rules[1].discount_percent, 0.0);
    }

    #[test]
    fn negative_threshold_floors_at_zero() {
        let rule = sanitize_rule(&json!({ "threshold": -25.5, "discount": 10 }));
        assert_eq!(rule.threshold, 0.0);
    }

    #[test]
    fn malformed_numbers_coerce_to_zero() {
        let rule = sanitize_rule(&json!({
            "threshold": "abc",
            "discount": null,
            "products": ["x", "12"],
        }));

        assert_eq!(rule.threshold, 0.0);
        assert_eq!(rule.discount_percent, 0.0);
        assert_eq!(rule.product_ids, vec![ProductId(0), ProductId(12)]);
    }

    #[test]
    fn numeric_prefixes_are_honored() {
        assert_eq!(coerce_float(&json!("12.5abc")), 12.5);
        assert_eq!(coerce_float(&json!("  7")), 7.0);
        assert_eq!(coerce_float(&json!(".5")), 0.5);
        assert_eq!(coerce_float(&json!("1e2 units")), 100.0);
        assert_eq!(coerce_float(&json!("1e")), 1.0);
        assert_eq!(coerce_float(&json!("-")), 0.0);
        assert_eq!(coerce_float(&json!(true)), 1.0);
        assert_eq!(coerce_int(&json!("42nd")), 42);
        assert_eq!(coerce_int(&json!(9.99)), 9);
        assert_eq!(coerce_int(&json!("-3")), -3);
    }

    #[test]
    fn missing_or_scalar_products_make_the_rule_inert() {
        let missing = sanitize_rule(&json!({ "threshold": 5, "discount": 5 }));
        let scalar = sanitize_rule(&json!({ "threshold": 5, "discount": 5, "products": "7" }));

        assert!(missing.product_ids.is_empty());
        assert!(scalar.product_ids.is_empty());
    }

    #[test]
    fn object_submissions_are_reindexed_in_numeric_order() {
        let rules = sanitize_rules(&json!({
            "10": { "threshold": 3, "discount": 3, "products": [3] },
            "2": { "threshold": 1, "discount": 1, "products": [1] },
            "5": { "threshold": 2, "discount": 2, "products": [2] },
        }));

        let thresholds: Vec<f64> = rules.iter().map(|rule| rule.threshold).collect();
        assert_eq!(thresholds, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn non_collection_input_yields_no_rules() {
        assert!(sanitize_rules(&json!("rules")).is_empty());
        assert!(sanitize_rules(&Value::Null).is_empty());
    }

    #[test]
    fn sanitizing_sanitized_rules_is_stable() {
        let first = sanitize_rules_value(json!([
            { "threshold": "49.99", "discount": "250", "products": ["7", 8.6] },
            { "discount": "abc" },
        ]));
        let second = sanitize_rules_value(first.clone());

        assert_eq!(first, second);
        assert_eq!(sanitize_rules(&first), sanitize_rules(&second));
    }

    #[test]
    fn overflowing_numbers_keep_their_sign_through_the_clamps() {
        assert_eq!(coerce_float(&json!("1e400")), f64::INFINITY);
        assert_eq!(coerce_float(&json!("-1e400abc")), f64::NEG_INFINITY);

        let huge = sanitize_rule(&json!({
            "threshold": "1e400",
            "discount": "1e400",
            "products": ["7"],
        }));
        assert_eq!(huge.threshold, f64::MAX);
        assert_eq!(huge.discount_percent, 100.0);
        assert!(!huge.is_met_by(1_000_000.0));

        let tiny = sanitize_rule(&json!({
            "threshold": "-1e400",
            "discount": "-1e400",
            "products": ["7"],
        }));
        assert_eq!(tiny.threshold, 0.0);
        assert_eq!(tiny.discount_percent, 0.0);

        let stored = rules_to_value(&[huge.clone()]);
        assert_eq!(sanitize_rules(&stored), vec![huge]);
    }

    #[test]
    fn clamp_percent_handles_non_finite_input() {
        assert_eq!(clamp_percent(f64::NAN), 0.0);
        assert_eq!(clamp_percent(f64::INFINITY), 100.0);
        assert_eq!(clamp_percent(f64::NEG_INFINITY), 0.0);
        assert_eq!(clamp_percent(120.0), 100.0);
        assert_eq!(clamp_percent(-1.0), 0.0);
    }
}
