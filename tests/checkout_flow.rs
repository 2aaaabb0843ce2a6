//! Pricing, order lifecycle and dashboard totals

#![cfg(feature = "ssr")]

mod common;

use axum::http::{Method, StatusCode};
use pretty_assertions::assert_eq;
use serde_json::json;

use common::{TestApp, TAX_PERCENT};

fn order(fleet_id: &str) -> serde_json::Value {
    json!({
        "item_kind": "fleet",
        "item_id": fleet_id,
        "quantity": 2,
        "days": 3,
        "customer_name": "John Smith",
        "customer_email": "john@example.com",
        "customer_phone": "+6281234567890",
        "start_date": "2026-12-24",
    })
}

#[tokio::test]
async fn test_summary_applies_tax() {
    let app = TestApp::new().await;
    let (token, _) = app
        .owner("indra", "indra@example.com", "081400000001", "Indra Rent")
        .await;
    let fleet_id = app.create_fleet(&token, "Innova Reborn", 350_000).await;

    let summary = app
        .call(
            Method::POST,
            "/api/checkout/summary",
            Some(&token),
            Some(json!({
                "item_kind": "fleet",
                "item_id": fleet_id,
                "quantity": 2,
                "days": 3,
            })),
        )
        .await;

    assert_eq!(summary.status, StatusCode::OK, "{}", summary.body);
    let data = summary.data();
    assert_eq!(data["unit_price"], 350_000);
    assert_eq!(data["subtotal"], 2_100_000);
    assert_eq!(data["tax_percent"], TAX_PERCENT);
    assert_eq!(data["tax"], 231_000);
    assert_eq!(data["total"], 2_331_000);
}

#[tokio::test]
async fn test_fleet_summary_requires_days() {
    let app = TestApp::new().await;
    let (token, _) = app
        .owner("joko", "joko@example.com", "081400000002", "Joko Cars")
        .await;
    let fleet_id = app.create_fleet(&token, "Brio", 250_000).await;

    let response = app
        .call(
            Method::POST,
            "/api/checkout/summary",
            Some(&token),
            Some(json!({ "item_kind": "fleet", "item_id": fleet_id, "quantity": 1 })),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_tour_summary_respects_capacity() {
    let app = TestApp::new().await;
    let (token, _) = app
        .owner("kadek", "kadek@example.com", "081400000003", "Kadek Tours")
        .await;
    let created = app
        .call(
            Method::POST,
            "/api/tour-packages",
            Some(&token),
            Some(json!({
                "name": "Ubud Culture Day",
                "destination": "Ubud",
                "duration_days": 1,
                "price": 500_000,
                "max_participants": 4,
                "is_published": true,
            })),
        )
        .await;
    let package_id = created.data()["id"].as_str().unwrap().to_string();

    let too_many = app
        .call(
            Method::POST,
            "/api/checkout/summary",
            Some(&token),
            Some(json!({ "item_kind": "tour_package", "item_id": package_id, "quantity": 5 })),
        )
        .await;
    assert_eq!(too_many.status, StatusCode::BAD_REQUEST);

    let fits = app
        .call(
            Method::POST,
            "/api/checkout/summary",
            Some(&token),
            Some(json!({ "item_kind": "tour_package", "item_id": package_id, "quantity": 4 })),
        )
        .await;
    assert_eq!(fits.status, StatusCode::OK);
    assert_eq!(fits.data()["days"], 1);
    assert_eq!(fits.data()["subtotal"], 2_000_000);
}

#[tokio::test]
async fn test_order_status_transitions() {
    let app = TestApp::new().await;
    let (token, _) = app
        .owner("lina", "lina@example.com", "081400000004", "Lina Trans")
        .await;
    let fleet_id = app.create_fleet(&token, "Xenia", 300_000).await;

    let placed = app
        .call(Method::POST, "/api/orders", Some(&token), Some(order(&fleet_id)))
        .await;
    assert_eq!(placed.status, StatusCode::CREATED, "{}", placed.body);
    assert_eq!(placed.data()["status"], "pending");
    assert_eq!(placed.data()["total"], 1_998_000);
    let order_id = placed.data()["id"].as_str().unwrap().to_string();
    let status_uri = format!("/api/orders/{}/status", order_id);

    let paid = app
        .call(Method::PUT, &status_uri, Some(&token), Some(json!({ "status": "paid" })))
        .await;
    assert_eq!(paid.status, StatusCode::OK);
    assert_eq!(paid.data()["status"], "paid");

    let back = app
        .call(Method::PUT, &status_uri, Some(&token), Some(json!({ "status": "pending" })))
        .await;
    assert_eq!(back.status, StatusCode::BAD_REQUEST);

    let listed = app
        .call(Method::GET, "/api/orders?status=paid", Some(&token), None)
        .await;
    assert_eq!(listed.data()["total"], 1);
    assert_eq!(listed.data()["items"][0]["id"], order_id.as_str());
}

#[tokio::test]
async fn test_dashboard_counts_current_month() {
    let app = TestApp::new().await;
    let (token, _) = app
        .owner("made", "made@example.com", "081400000005", "Made Holidays")
        .await;
    let fleet_id = app.create_fleet(&token, "Alphard", 2_000_000).await;
    app.create_fleet(&token, "Fortuner", 1_200_000).await;

    let kept = app
        .call(Method::POST, "/api/orders", Some(&token), Some(order(&fleet_id)))
        .await;
    assert_eq!(kept.data()["total"], 13_320_000);

    let cancelled = app
        .call(Method::POST, "/api/orders", Some(&token), Some(order(&fleet_id)))
        .await;
    let cancelled_id = cancelled.data()["id"].as_str().unwrap().to_string();
    let cancel = app
        .call(
            Method::PUT,
            &format!("/api/orders/{}/status", cancelled_id),
            Some(&token),
            Some(json!({ "status": "cancelled" })),
        )
        .await;
    assert_eq!(cancel.status, StatusCode::OK);

    let dashboard = app.call(Method::GET, "/api/dashboard", Some(&token), None).await;
    assert_eq!(dashboard.status, StatusCode::OK, "{}", dashboard.body);
    let stats = dashboard.data();
    assert_eq!(stats["fleets"], 2);
    assert_eq!(stats["tour_packages"], 0);
    assert_eq!(stats["members"], 1);
    assert_eq!(stats["orders"]["current"], 1);
    assert_eq!(stats["orders"]["previous"], 0);
    assert_eq!(stats["orders"]["percent_change"], 100.0);
    assert_eq!(stats["revenue"]["current"], 13_320_000);
}

#[tokio::test]
async fn test_partner_places_order_with_api_key() {
    let app = TestApp::new().await;
    let (token, _) = app
        .owner("nanda", "nanda@example.com", "081400000006", "Nanda Cars")
        .await;
    let fleet_id = app.create_fleet(&token, "Pajero", 1_000_000).await;
    let key = app
        .call(Method::POST, "/api/organization/api-key", Some(&token), None)
        .await;
    let api_key = key.data()["api_key"].as_str().unwrap().to_string();

    let placed = app
        .with_api_key(Method::POST, "/api/orders", &api_key, Some(order(&fleet_id)))
        .await;
    assert_eq!(placed.status, StatusCode::CREATED, "{}", placed.body);
    assert!(placed.data()["placed_by"].is_null());

    let paid = app
        .with_api_key(
            Method::PUT,
            &format!("/api/orders/{}/status", placed.data()["id"].as_str().unwrap()),
            &api_key,
            Some(json!({ "status": "paid" })),
        )
        .await;
    assert_eq!(paid.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_partner_cannot_read_order_book() {
    let app = TestApp::new().await;
    let (token, _) = app
        .owner("rai", "rai@example.com", "081400000007", "Rai Trans")
        .await;
    let fleet_id = app.create_fleet(&token, "Hiace", 900_000).await;
    let placed = app
        .call(Method::POST, "/api/orders", Some(&token), Some(order(&fleet_id)))
        .await;
    assert_eq!(placed.status, StatusCode::CREATED, "{}", placed.body);
    let order_id = placed.data()["id"].as_str().unwrap().to_string();

    let key = app
        .call(Method::POST, "/api/organization/api-key", Some(&token), None)
        .await;
    let api_key = key.data()["api_key"].as_str().unwrap().to_string();

    let listed = app.with_api_key(Method::GET, "/api/orders", &api_key, None).await;
    assert_eq!(listed.status, StatusCode::FORBIDDEN);
    assert!(listed.data().is_null());

    let single = app
        .with_api_key(Method::GET, &format!("/api/orders/{}", order_id), &api_key, None)
        .await;
    assert_eq!(single.status, StatusCode::FORBIDDEN);

    let owner_view = app.call(Method::GET, "/api/orders", Some(&token), None).await;
    assert_eq!(owner_view.status, StatusCode::OK);
    assert_eq!(owner_view.data()["total"], 1);
}
