use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};

use super::admin::{parse_rules_form, ADMIN_PATH};
use super::cart::SessionCart;
use super::catalog::ProductCatalog;
use super::domain::CartLineItem;
use super::hooks::RequestContext;
use super::service::{DiscountService, DiscountServiceError};
use super::store::SettingsStore;

/// Cart payload accepted by the quote and fee endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct CartRequest {
    #[serde(default)]
    pub context: RequestContext,
    pub items: Vec<CartLineItem>,
}

#[derive(Debug, Default, Deserialize)]
pub struct AdminPageQuery {
    #[serde(default, rename = "settings-updated")]
    pub settings_updated: Option<bool>,
}

/// Router builder exposing rule management, cart evaluation, and the editor page.
pub fn discount_router<S, C>(service: Arc<DiscountService<S, C>>) -> Router
where
    S: SettingsStore + 'static,
    C: ProductCatalog + 'static,
{
    Router::new()
        .route(
            "/api/v1/discounts/rules",
            get(list_rules_handler::<S, C>).put(save_rules_handler::<S, C>),
        )
        .route("/api/v1/discounts/quote", post(quote_handler::<S, C>))
        .route(
            "/api/v1/cart/calculate-fees",
            post(calculate_fees_handler::<S, C>),
        )
        .route(
            ADMIN_PATH,
            get(admin_page_handler::<S, C>).post(admin_form_handler::<S, C>),
        )
        .with_state(service)
}

pub(crate) async fn list_rules_handler<S, C>(
    State(service): State<Arc<DiscountService<S, C>>>,
) -> Response
where
    S: SettingsStore + 'static,
    C: ProductCatalog + 'static,
{
    match service.rules() {
        Ok(rules) => (StatusCode::OK, Json(rules)).into_response(),
        Err(err) => service_error_response(err),
    }
}

pub(crate) async fn save_rules_handler<S, C>(
    State(service): State<Arc<DiscountService<S, C>>>,
    Json(submission): Json<Value>,
) -> Response
where
    S: SettingsStore + 'static,
    C: ProductCatalog + 'static,
{
    match service.save_rules(submission) {
        Ok(rules) => (StatusCode::OK, Json(rules)).into_response(),
        Err(err) => service_error_response(err),
    }
}

pub(crate) async fn quote_handler<S, C>(
    State(service): State<Arc<DiscountService<S, C>>>,
    Json(request): Json<CartRequest>,
) -> Response
where
    S: SettingsStore + 'static,
    C: ProductCatalog + 'static,
{
    match service.quote(&request.items) {
        Ok(quote) => (StatusCode::OK, Json(quote)).into_response(),
        Err(err) => service_error_response(err),
    }
}

pub(crate) async fn calculate_fees_handler<S, C>(
    State(service): State<Arc<DiscountService<S, C>>>,
    Json(request): Json<CartRequest>,
) -> Response
where
    S: SettingsStore + 'static,
    C: ProductCatalog + 'static,
{
    let mut cart = SessionCart::new(request.items);
    service.calculate_fees(&request.context, &mut cart);
    (StatusCode::OK, Json(cart.summary())).into_response()
}

pub(crate) async fn admin_page_handler<S, C>(
    State(service): State<Arc<DiscountService<S, C>>>,
    Query(query): Query<AdminPageQuery>,
) -> Response
where
    S: SettingsStore + 'static,
    C: ProductCatalog + 'static,
{
    let notice = query.settings_updated.unwrap_or(false).then_some("Settings saved.");
    match service.admin_page(notice) {
        Ok(page) => Html(page).into_response(),
        Err(err) => service_error_response(err),
    }
}

pub(crate) async fn admin_form_handler<S, C>(
    State(service): State<Arc<DiscountService<S, C>>>,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Response
where
    S: SettingsStore + 'static,
    C: ProductCatalog + 'static,
{
    match service.save_rules(parse_rules_form(&pairs)) {
        Ok(_) => Redirect::to(&format!("{ADMIN_PATH}?settings-updated=true")).into_response(),
        Err(err) => service_error_response(err),
    }
}

fn service_error_response(err: DiscountServiceError) -> Response {
    let status = match err {
        DiscountServiceError::Settings(_) | DiscountServiceError::Catalog(_) => {
            StatusCode::SERVICE_UNAVAILABLE
        }
    };
    let payload = json!({
        "error": err.to_string(),
    });
    (status, Json(payload)).into_response()
}
