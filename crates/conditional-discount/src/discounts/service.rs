use std::sync::Arc;

use serde_json::Value;
use tracing::info;

use super::admin::render_rules_page;
use super::cart::SessionCart;
use super::catalog::{CatalogError, ProductCatalog};
use super::domain::{CartLineItem, DiscountRule};
use super::evaluation::SelectionPolicy;
use super::hooks::{HookRegistry, RequestContext};
use super::plugin::{DiscountPlugin, DiscountQuote};
use super::store::{SettingsApi, SettingsError, SettingsStore, RULES_OPTION};

/// Service composing the settings store, hook registry, discount plugin, and
/// product catalog behind the HTTP and CLI surfaces.
pub struct DiscountService<S, C> {
    plugin: Arc<DiscountPlugin<S>>,
    hooks: Arc<HookRegistry>,
    settings: SettingsApi<S>,
    catalog: Arc<C>,
}

impl<S, C> DiscountService<S, C>
where
    S: SettingsStore + 'static,
    C: ProductCatalog + 'static,
{
    pub fn new(store: Arc<S>, catalog: Arc<C>, policy: SelectionPolicy) -> Self {
        let plugin = Arc::new(DiscountPlugin::new(store.clone(), policy));
        let mut hooks = HookRegistry::new();
        plugin.register(&mut hooks);
        let hooks = Arc::new(hooks);

        Self {
            plugin,
            settings: SettingsApi::new(store, hooks.clone()),
            hooks,
            catalog,
        }
    }

    pub fn policy(&self) -> SelectionPolicy {
        self.plugin.policy()
    }

    pub fn hooks(&self) -> &HookRegistry {
        &self.hooks
    }

    pub fn rules(&self) -> Result<Vec<DiscountRule>, DiscountServiceError> {
        Ok(self.plugin.rules()?)
    }

    /// Save a raw rule submission through the sanitize filter, returning the
    /// rules as stored.
    pub fn save_rules(&self, submission: Value) -> Result<Vec<DiscountRule>, DiscountServiceError> {
        self.settings.update_option(RULES_OPTION, submission)?;
        let rules = self.plugin.rules()?;
        info!(rule_count = rules.len(), "discount rules saved");
        Ok(rules)
    }

    pub fn quote(&self, items: &[CartLineItem]) -> Result<DiscountQuote, DiscountServiceError> {
        Ok(self.plugin.quote(items)?)
    }

    /// Fire the cart recalculation event, letting every subscriber add fees.
    pub fn calculate_fees(&self, context: &RequestContext, cart: &mut SessionCart) -> usize {
        self.hooks.calculate_fees(context, cart)
    }

    pub fn admin_page(&self, notice: Option<&str>) -> Result<String, DiscountServiceError> {
        let rules = self.plugin.rules()?;
        let products = self.catalog.products()?;
        Ok(render_rules_page(&rules, &products, notice))
    }
}

/// Error raised by the discount service.
#[derive(Debug, thiserror::Error)]
pub enum DiscountServiceError {
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}
