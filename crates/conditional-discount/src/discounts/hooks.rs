//! Host event subscription surface.
//!
//! The host publishes named events; extensions subscribe handlers with a
//! priority. Lower priorities run first and equal priorities keep their
//! registration order.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{trace, warn};

use super::cart::Cart;

/// Fired whenever the cart recalculates its totals and collects fees.
pub const CART_CALCULATE_FEES: &str = "woocommerce_cart_calculate_fees";

/// Default priority for subscribers that do not care about ordering.
pub const DEFAULT_PRIORITY: i32 = 10;

/// Name of the filter event applied to an option before it is persisted.
pub fn sanitize_option_event(option: &str) -> String {
    format!("sanitize_option_{option}")
}

/// Facts about the request that triggered a cart recalculation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestContext {
    #[serde(default)]
    pub admin: bool,
    #[serde(default)]
    pub ajax: bool,
}

impl RequestContext {
    pub fn storefront() -> Self {
        Self::default()
    }

    pub fn admin_page() -> Self {
        Self {
            admin: true,
            ajax: false,
        }
    }

    /// Admin screens only see discounts when the cart is refreshed over AJAX.
    pub fn is_admin_page_load(&self) -> bool {
        self.admin && !self.ajax
    }
}

pub type CartFeesHandler = Arc<dyn Fn(&RequestContext, &mut dyn Cart) + Send + Sync>;
pub type ValueFilter = Arc<dyn Fn(Value) -> Value + Send + Sync>;

/// Handler attached to an event.
#[derive(Clone)]
pub enum Hook {
    CartFees(CartFeesHandler),
    Filter(ValueFilter),
}

impl Hook {
    fn kind(&self) -> &'static str {
        match self {
            Hook::CartFees(_) => "cart_fees",
            Hook::Filter(_) => "filter",
        }
    }
}

struct Subscription {
    priority: i32,
    hook: Hook,
}

/// Registry of event subscribers, built once at wiring time and then shared.
#[derive(Default)]
pub struct HookRegistry {
    events: HashMap<String, Vec<Subscription>>,
}

impl HookRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, event: impl Into<String>, priority: i32, hook: Hook) {
        let subscribers = self.events.entry(event.into()).or_default();
        let position = subscribers
            .iter()
            .position(|existing| existing.priority > priority)
            .unwrap_or(subscribers.len());
        subscribers.insert(position, Subscription { priority, hook });
    }

    pub fn subscriber_count(&self, event: &str) -> usize {
        self.events.get(event).map(Vec::len).unwrap_or(0)
    }

    /// Run every cart fee handler against `cart`, returning how many ran.
    pub fn calculate_fees(&self, context: &RequestContext, cart: &mut dyn Cart) -> usize {
        let mut invoked = 0;
        for subscription in self.subscribers(CART_CALCULATE_FEES) {
            match &subscription.hook {
                Hook::CartFees(handler) => {
                    trace!(priority = subscription.priority, "running cart fee handler");
                    handler(context, &mut *cart);
                    invoked += 1;
                }
                other => warn!(
                    event = CART_CALCULATE_FEES,
                    kind = other.kind(),
                    "skipping subscriber with mismatched hook kind"
                ),
            }
        }
        invoked
    }

    /// Thread `value` through every filter subscribed to `event`.
    pub fn apply_filters(&self, event: &str, value: Value) -> Value {
        self.subscribers(event)
            .fold(value, |current, subscription| match &subscription.hook {
                Hook::Filter(filter) => filter(current),
                other => {
                    warn!(event, kind = other.kind(), "skipping non-filter subscriber");
                    current
                }
            })
    }

    fn subscribers(&self, event: &str) -> impl Iterator<Item = &Subscription> {
        self.events.get(event).into_iter().flatten()
    }
}

impl fmt::Debug for HookRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut events: Vec<(&String, usize)> = self
            .events
            .iter()
            .map(|(event, subscribers)| (event, subscribers.len()))
            .collect();
        events.sort();
        f.debug_struct("HookRegistry")
            .field("events", &events)
            .finish()
    }
}
