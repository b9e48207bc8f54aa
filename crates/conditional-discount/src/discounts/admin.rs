//! Rule editor page and its form decoding.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use serde_json::{Map, Value};

use super::domain::{CatalogProduct, DiscountRule};
use super::sanitize::MAX_DISCOUNT_PERCENT;
use super::store::RULES_OPTION;

pub const ADMIN_PATH: &str = "/admin/discounts";

/// Decode `cpd_discount_rules[<row>][<field>]` style form pairs into a row map.
///
/// Scalar fields take the last submitted value; `[]` suffixed fields collect
/// every value in submission order. Pairs for other settings are ignored.
pub fn parse_rules_form(pairs: &[(String, String)]) -> Value {
    let mut rows: BTreeMap<String, Map<String, Value>> = BTreeMap::new();

    for (key, value) in pairs {
        let Some(segments) = bracket_segments(key, RULES_OPTION) else {
            continue;
        };

        match segments.as_slice() {
            [row, field] if !row.is_empty() && !field.is_empty() => {
                rows.entry(row.clone())
                    .or_default()
                    .insert(field.clone(), Value::String(value.clone()));
            }
            [row, field, list] if !row.is_empty() && !field.is_empty() && list.is_empty() => {
                let entry = rows
                    .entry(row.clone())
                    .or_default()
                    .entry(field.clone())
                    .or_insert_with(|| Value::Array(Vec::new()));
                match entry {
                    Value::Array(values) => values.push(Value::String(value.clone())),
                    other => *other = Value::Array(vec![Value::String(value.clone())]),
                }
            }
            _ => {}
        }
    }

    Value::Object(
        rows.into_iter()
            .map(|(row, fields)| (row, Value::Object(fields)))
            .collect(),
    )
}

fn bracket_segments(key: &str, base: &str) -> Option<Vec<String>> {
    let mut rest = key.strip_prefix(base)?;
    let mut segments = Vec::new();

    while !rest.is_empty() {
        let inner = rest.strip_prefix('[')?;
        let close = inner.find(']')?;
        segments.push(inner[..close].trim().to_string());
        rest = &inner[close + 1..];
    }

    if segments.is_empty() {
        None
    } else {
        Some(segments)
    }
}

/// Render the rule editor with one row per stored rule.
pub fn render_rules_page(
    rules: &[DiscountRule],
    products: &[CatalogProduct],
    notice: Option<&str>,
) -> String {
    let option_markup = products.iter().fold(String::new(), |mut html, product| {
        let _ = write!(
            html,
            r#"<option value="{}">{}</option>"#,
            product.id,
            escape_html(&product.name)
        );
        html
    });

    let mut rows = String::new();
    for (index, rule) in rules.iter().enumerate() {
        rows.push_str(&render_rule_row(index, rule, products));
    }

    let notice_markup = notice
        .map(|message| {
            format!(
                r#"<div class="notice notice-success"><p>{}</p></div>"#,
                escape_html(message)
            )
        })
        .unwrap_or_default();

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8" />
<title>Conditional Product Discounts</title>
<style>
.cpd-rule-row {{ position: relative; border: 1px solid #c3c4c7; border-radius: 8px; padding: 12px 16px; margin-bottom: 16px; }}
.cpd-rule-row__inner {{ display: flex; flex-direction: column; gap: 5px; }}
.cpd-rule-row__inner label {{ font-weight: 700; }}
.cpd-remove-rule {{ position: absolute; top: 10px; right: 10px; cursor: pointer; font-size: 20px; color: #a00; }}
</style>
</head>
<body>
<div class="wrap cpd-wrap">
<h1>Conditional Product Discounts</h1>
{notice_markup}
<form method="post" action="{ADMIN_PATH}" onsubmit="return validateDiscountLimits();">
<div id="cpd-rules-table">
{rows}</div>
<p><button type="button" class="button" onclick="addRule()">Add Rule</button></p>
<p><button type="submit" class="button button-primary">Save Changes</button></p>
</form>
</div>
<script>
const cpdProductOptionsHTML = {options_literal};
let cpdRuleIndex = {next_index};
function addRule() {{
  const index = cpdRuleIndex++;
  const row = document.createElement('div');
  row.className = 'cpd-rule-row';
  row.innerHTML =
    '<span class="cpd-remove-rule" onclick="this.parentNode.remove()">&times;</span>' +
    '<h2>Rule #' + (index + 1) + '</h2>' +
    '<div class="cpd-rule-row__inner">' +
    '<label>Total Product Price Over:</label>' +
    '<input type="number" name="{RULES_OPTION}[' + index + '][threshold]" step="0.01" />' +
    '<label>Discount (%):</label>' +
    '<input type="number" name="{RULES_OPTION}[' + index + '][discount]" step="0.01" max="{max_discount}" />' +
    '<label>Products:</label>' +
    '<select name="{RULES_OPTION}[' + index + '][products][]" multiple class="cpd-select2">' +
    cpdProductOptionsHTML + '</select>' +
    '</div>';
  document.getElementById('cpd-rules-table').appendChild(row);
}}
function validateDiscountLimits() {{
  const inputs = document.querySelectorAll('input[name$="[discount]"]');
  for (const input of inputs) {{
    if (parseFloat(input.value) > {max_discount}) {{
      alert('Discount cannot be more than {max_discount}%.');
      input.focus();
      return false;
    }}
  }}
  return true;
}}
</script>
</body>
</html>
"#,
        options_literal = js_string_literal(&option_markup),
        next_index = rules.len(),
        max_discount = MAX_DISCOUNT_PERCENT,
    )
}

fn render_rule_row(index: usize, rule: &DiscountRule, products: &[CatalogProduct]) -> String {
    let options = products.iter().fold(String::new(), |mut html, product| {
        let selected = if rule.product_ids.contains(&product.id) {
            " selected"
        } else {
            ""
        };
        let _ = write!(
            html,
            r#"<option value="{}"{selected}>{}</option>"#,
            product.id,
            escape_html(&product.name)
        );
        html
    });

    format!(
        r#"<div class="cpd-rule-row">
<span class="cpd-remove-rule" onclick="this.parentNode.remove()">&times;</span>
<h2>Rule #{number}</h2>
<div class="cpd-rule-row__inner">
<label>Total Product Price Over:</label>
<input type="number" name="{RULES_OPTION}[{index}][threshold]" value="{threshold}" step="0.01" />
<label>Discount (%):</label>
<input type="number" name="{RULES_OPTION}[{index}][discount]" value="{discount}" step="0.01" max="{max_discount}" />
<label>Products:</label>
<select name="{RULES_OPTION}[{index}][products][]" multiple class="cpd-select2">{options}</select>
</div>
</div>
"#,
        number = index + 1,
        threshold = rule.threshold,
        discount = rule.discount_percent,
        max_discount = MAX_DISCOUNT_PERCENT,
    )
}

pub fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for character in raw.chars() {
        match character {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}

/// JSON-encode `raw` for inline script use, keeping `</script>` inert.
fn js_string_literal(raw: &str) -> String {
    Value::String(raw.to_string())
        .to_string()
        .replace("</", "<\\/")
}
