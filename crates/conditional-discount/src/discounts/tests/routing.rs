use std::sync::Arc;

use axum::body::Body;
use axum::extract::State;
use axum::http::{header, Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

use super::common::*;
use crate::discounts::evaluation::SelectionPolicy;
use crate::discounts::router::{discount_router, list_rules_handler};
use crate::discounts::service::DiscountService;

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(&body).expect("json body")))
        .expect("request builds")
}

#[tokio::test]
async fn put_rules_sanitizes_and_get_returns_them() {
    let (service, _) = build_service(SelectionPolicy::HighestDiscount);
    let router = discount_router(Arc::new(service));

    let response = router
        .clone()
        .oneshot(json_request(
            "PUT",
            "/api/v1/discounts/rules",
            json!([{ "threshold": "80", "discount": "250", "products": ["7"] }]),
        ))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::OK);

    let response = router
        .oneshot(
            Request::get("/api/v1/discounts/rules")
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(
        payload,
        json!([{ "threshold": 80.0, "discount": 100.0, "products": [7] }])
    );
}

#[tokio::test]
async fn quote_route_returns_adjustments_and_totals() {
    let router = discount_router(Arc::new(seeded_service(overlapping_rules_json())));

    let response = router
        .oneshot(json_request(
            "POST",
            "/api/v1/discounts/quote",
            json!({
                "items": [
                    { "product_id": 7, "name": "Espresso Beans", "unit_price": 50.0, "quantity": 2 },
                ],
            }),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["policy"], json!("highest_discount"));
    assert_eq!(payload["adjustments"][0]["amount"], json!(-20.0));
    assert_eq!(
        payload["adjustments"][0]["label"],
        json!("Discount for Espresso Beans")
    );
    assert_eq!(payload["total"], json!(80.0));
}

#[tokio::test]
async fn calculate_fees_route_respects_request_context() {
    let router = discount_router(Arc::new(seeded_service(overlapping_rules_json())));
    let items = json!([
        { "product_id": 7, "name": "Espresso Beans", "unit_price": 50.0, "quantity": 2 },
    ]);

    let storefront = router
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/v1/cart/calculate-fees",
            json!({ "items": items.clone() }),
        ))
        .await
        .expect("route executes");
    let storefront = read_json_body(storefront).await;
    assert_eq!(storefront["fees"].as_array().map(Vec::len), Some(1));
    assert_eq!(storefront["fee_total"], json!(-20.0));

    let admin = router
        .oneshot(json_request(
            "POST",
            "/api/v1/cart/calculate-fees",
            json!({ "context": { "admin": true }, "items": items }),
        ))
        .await
        .expect("route executes");
    let admin = read_json_body(admin).await;
    assert_eq!(admin["fees"], json!([]));
    assert_eq!(admin["total"], json!(100.0));
}

#[tokio::test]
async fn admin_form_submission_saves_and_redirects() {
    let (service, _) = build_service(SelectionPolicy::HighestDiscount);
    let service = Arc::new(service);
    let router = discount_router(service.clone());

    let form = "cpd_discount_rules%5B0%5D%5Bthreshold%5D=50\
&cpd_discount_rules%5B0%5D%5Bdiscount%5D=120\
&cpd_discount_rules%5B0%5D%5Bproducts%5D%5B%5D=7\
&cpd_discount_rules%5B0%5D%5Bproducts%5D%5B%5D=9";
    let response = router
        .clone()
        .oneshot(
            Request::post("/admin/discounts")
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from(form))
                .expect("request builds"),
        )
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        response
            .headers()
            .get(header::LOCATION)
            .and_then(|value| value.to_str().ok()),
        Some("/admin/discounts?settings-updated=true")
    );

    let rules = service.rules().expect("rules saved");
    assert_eq!(rules.len(), 1);
    assert_eq!(rules[0].discount_percent, 100.0);
    assert_eq!(rules[0].product_ids.len(), 2);

    let page = router
        .oneshot(
            Request::get("/admin/discounts?settings-updated=true")
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("route executes");
    assert_eq!(page.status(), StatusCode::OK);
    let html = read_text_body(page).await;
    assert!(html.contains("Settings saved."));
    assert!(html.contains(r#"<option value="9" selected>Paper Filters</option>"#));
}

#[tokio::test]
async fn settings_outages_surface_as_service_unavailable() {
    let service = Arc::new(DiscountService::new(
        Arc::new(UnavailableSettings),
        Arc::new(catalog()),
        SelectionPolicy::HighestDiscount,
    ));

    let response = list_rules_handler(State(service)).await;

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let payload = read_json_body(response).await;
    assert!(payload["error"]
        .as_str()
        .unwrap_or_default()
        .contains("database offline"));
}
