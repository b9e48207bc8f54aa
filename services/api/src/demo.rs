use crate::infra::{demo_catalog, parse_policy};
use clap::Args;
use conditional_discount::discounts::{
    load_cart_csv, CartLineItem, DiscountQuote, DiscountService, InMemorySettingsStore, ProductId,
    RequestContext, SelectionPolicy, SessionCart, StaticCatalog,
};
use conditional_discount::error::AppError;
use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Args, Debug)]
pub(crate) struct QuoteArgs {
    /// JSON rule list (raw submissions are sanitized before use)
    #[arg(long)]
    pub(crate) rules: PathBuf,
    /// Cart export with `Product ID,Name,Unit Price,Quantity` columns
    #[arg(long)]
    pub(crate) cart: PathBuf,
    /// Selection policy: `highest` (default) or `first`
    #[arg(long, value_parser = parse_policy)]
    pub(crate) policy: Option<SelectionPolicy>,
}

#[derive(Args, Debug)]
pub(crate) struct SanitizeArgs {
    /// JSON rule submission to normalize
    #[arg(long)]
    pub(crate) rules: PathBuf,
}

type LocalService = DiscountService<InMemorySettingsStore, StaticCatalog>;

fn local_service(policy: SelectionPolicy) -> LocalService {
    DiscountService::new(
        Arc::new(InMemorySettingsStore::default()),
        Arc::new(demo_catalog()),
        policy,
    )
}

fn read_rules(path: &Path) -> Result<Value, AppError> {
    let raw = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

pub(crate) fn run_quote(args: QuoteArgs) -> Result<(), AppError> {
    let QuoteArgs {
        rules,
        cart,
        policy,
    } = args;

    let service = local_service(policy.unwrap_or_default());
    let saved = service.save_rules(read_rules(&rules)?)?;
    let items = load_cart_csv(&cart)?;
    let quote = service.quote(&items)?;

    println!(
        "Loaded {} rule(s) and {} cart line(s); policy {}",
        saved.len(),
        items.len(),
        quote.policy
    );
    render_quote(&items, &quote);
    Ok(())
}

pub(crate) fn run_sanitize(args: SanitizeArgs) -> Result<(), AppError> {
    let service = local_service(SelectionPolicy::default());
    let rules = service.save_rules(read_rules(&args.rules)?)?;
    println!("{}", serde_json::to_string_pretty(&rules)?);
    Ok(())
}

pub(crate) fn run_demo() -> Result<(), AppError> {
    let rules = json!([
        { "threshold": "50", "discount": "10", "products": ["7"] },
        { "threshold": "80", "discount": "20", "products": ["7"] },
        { "threshold": "0", "discount": "35", "products": [] },
    ]);
    let items = vec![
        CartLineItem {
            product_id: ProductId(7),
            name: "Espresso Beans".to_string(),
            unit_price: 50.0,
            quantity: 2,
        },
        CartLineItem {
            product_id: ProductId(9),
            name: "Paper Filters".to_string(),
            unit_price: 4.5,
            quantity: 3,
        },
    ];

    println!("Conditional discount demo");
    println!("Rules (the third has no products and never applies):");
    for policy in [SelectionPolicy::HighestDiscount, SelectionPolicy::FirstMatch] {
        let service = local_service(policy);
        let saved = service.save_rules(rules.clone())?;
        if policy == SelectionPolicy::HighestDiscount {
            for (index, rule) in saved.iter().enumerate() {
                let products: Vec<String> =
                    rule.product_ids.iter().map(ProductId::to_string).collect();
                println!(
                    "  #{} spend >= {:.2} -> {}% off [{}]",
                    index + 1,
                    rule.threshold,
                    rule.discount_percent,
                    products.join(", ")
                );
            }
        }

        let mut cart = SessionCart::new(items.clone());
        service.calculate_fees(&RequestContext::storefront(), &mut cart);
        println!("\nPolicy {policy}:");
        for fee in cart.fees() {
            println!("  - {}: {:.2}", fee.label, fee.amount);
        }
        println!(
            "  Subtotal {:.2} | fees {:.2} | total {:.2}",
            cart.subtotal(),
            cart.fee_total(),
            cart.total()
        );
    }

    Ok(())
}

fn render_quote(items: &[CartLineItem], quote: &DiscountQuote) {
    let mut adjustments = quote.adjustments.iter().peekable();
    for item in items {
        let adjustment = adjustments.next_if(|adjustment| {
            adjustment.product_id == item.product_id && adjustment.line_total == item.total_price()
        });
        match adjustment {
            Some(adjustment) => println!(
                "- {} x{} = {:.2} | rule #{} {}% -> {:.2}",
                item.name,
                item.quantity,
                item.total_price(),
                adjustment.rule_index + 1,
                adjustment.discount_percent,
                adjustment.amount
            ),
            None => println!(
                "- {} x{} = {:.2} | no discount",
                item.name,
                item.quantity,
                item.total_price()
            ),
        }
    }
    println!(
        "Subtotal {:.2} | discounts {:.2} | total {:.2}",
        quote.subtotal, quote.discount_total, quote.total
    );
}
