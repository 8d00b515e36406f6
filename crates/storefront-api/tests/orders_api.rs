mod common;

use axum::http::{Method, StatusCode};
use chrono::{Days, Utc};
use serde_json::json;

use common::app;

#[tokio::test]
async fn purchase_flips_flag_notifies_and_counts() {
    let app = app();
    let user = app.create_user("Ada Lovelace", "ada@example.com").await;
    let component = app.create_component("Hero Section", "hero-section").await;

    let order = app
        .purchase(json!({
            "user_id": user,
            "component_id": component,
            "type": "Component",
            "amount": 49.99,
            "payment_provider": "Stripe",
        }))
        .await;
    let number = order["order_number"].as_str().unwrap().to_string();
    assert!(number.starts_with("ORD-"));
    assert_eq!(order["status"], "PENDING");
    assert_eq!(order["is_component"], true);
    assert_eq!(order["component"]["slug"], "hero-section");
    assert_eq!(order["user"]["email"], "ada@example.com");

    let buyer = app.state.db.get_user(&user).unwrap().unwrap();
    assert!(buyer.has_purchased);

    let (status, notes) = app.get(&format!("/users/{user}/notifications")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(notes[0]["message"].as_str().unwrap().contains(&number));

    let (status, stats) = app.get(&format!("/users/{user}/stats")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(stats["total_orders"].as_u64().unwrap() >= 1);
    assert!(stats["total_spent"].as_f64().unwrap() >= 49.99);
}

#[tokio::test]
async fn status_change_is_persisted_and_announced() {
    let app = app();
    let user = app.create_user("Bob", "bob@example.com").await;
    let order = app
        .purchase(json!({ "user_id": user, "type": "Bundle", "amount": 20.0 }))
        .await;
    let id = order["id"].as_str().unwrap();

    let (status, body) = app
        .call(
            Method::PATCH,
            &format!("/admin/orders/{id}/status"),
            Some(json!({ "status": "SUCCESS" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "success": true }));

    let (_, notes) = app.get(&format!("/users/{user}/notifications")).await;
    assert_eq!(notes.as_array().unwrap().len(), 2);
    assert!(notes[0]["message"].as_str().unwrap().contains("SUCCESS"));

    let (status, details) = app.get(&format!("/admin/orders/{id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(details["order"]["status"], "SUCCESS");
    assert_eq!(details["user_stats"]["total_orders"], 1);
}

#[tokio::test]
async fn details_use_requested_user_stats() {
    let app = app();
    let ada = app.create_user("Ada", "ada@example.com").await;
    let bob = app.create_user("Bob", "bob@example.com").await;
    let order = app
        .purchase(json!({ "user_id": ada, "type": "Pack", "pack": "Starter", "amount": 10.0 }))
        .await;
    for amount in [5.0, 7.5] {
        app.purchase(json!({ "user_id": bob, "type": "Bundle", "amount": amount }))
            .await;
    }

    let id = order["id"].as_str().unwrap();
    let (status, details) = app.get(&format!("/admin/orders/{id}?user_id={bob}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(details["order"]["pack"], "Starter");
    assert_eq!(details["user_stats"]["total_orders"], 2);
    assert_eq!(details["user_stats"]["total_spent"], 12.5);
}

#[tokio::test]
async fn listing_applies_query_string_filters() {
    let app = app();
    let ada = app.create_user("Ada", "ada@example.com").await;
    let bob = app.create_user("Bob", "bob@paypal.test").await;
    app.purchase(json!({ "user_id": ada, "type": "Component", "amount": 9.0 }))
        .await;
    app.purchase(json!({ "user_id": ada, "type": "Bundle", "amount": 49.0 }))
        .await;
    app.purchase(json!({ "user_id": bob, "type": "Bundle", "amount": 99.0, "payment_provider": "PayPal" }))
        .await;

    let (status, page) = app.get("/admin/orders?type=Bundle&status=&minPrice=10").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["filtered_total"], 2);
    assert_eq!(page["total"], 3);

    let (_, page) = app.get("/admin/orders?search=PAYPAL").await;
    assert_eq!(page["filtered_total"], 1);
    assert_eq!(page["orders"][0]["user"]["name"], "Bob");

    let (_, page) = app.get("/admin/orders?max_price=49&limit=1").await;
    assert_eq!(page["filtered_total"], 2);
    assert_eq!(page["orders"].as_array().unwrap().len(), 1);

    let today = Utc::now().date_naive();
    let yesterday = today.checked_sub_days(Days::new(1)).unwrap();
    let (_, page) = app.get(&format!("/admin/orders?dateTo={today}")).await;
    assert_eq!(page["filtered_total"], 3);
    let (_, page) = app.get(&format!("/admin/orders?dateTo={yesterday}")).await;
    assert_eq!(page["filtered_total"], 0);
    assert_eq!(page["total"], 3);
}

#[tokio::test]
async fn listing_rejects_unparseable_criteria() {
    let app = app();
    let (status, _) = app.get("/admin/orders?status=lost").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn store_failure_reads_as_empty_page() {
    let app = app();
    let user = app.create_user("Ada", "ada@example.com").await;
    app.purchase(json!({ "user_id": user, "type": "Bundle", "amount": 1.0 }))
        .await;

    app.state
        .db
        .with_conn_mut(|conn| Ok(conn.execute_batch("DROP TABLE orders")?))
        .unwrap();

    let (status, page) = app.get("/admin/orders").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        page,
        json!({ "orders": [], "filtered_total": 0, "total": 0 })
    );
}

#[tokio::test]
async fn missing_and_incomplete_orders_are_distinct() {
    let app = app();
    let missing = uuid::Uuid::new_v4();
    let (status, body) = app.get(&format!("/admin/orders/{missing}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "success": false, "message": "Order not found" }));

    let orphan = uuid::Uuid::new_v4();
    app.state
        .db
        .with_conn_mut(|conn| {
            conn.execute_batch("PRAGMA foreign_keys = OFF")?;
            conn.execute(
                "INSERT INTO orders (id, order_number, amount, user_id, is_bundle)
                 VALUES (?1, 'ORD-20240101-ORPHAN', 5.0, 'gone', 1)",
                [orphan.to_string()],
            )?;
            conn.execute_batch("PRAGMA foreign_keys = ON")?;
            Ok(())
        })
        .unwrap();

    let (status, body) = app.get(&format!("/admin/orders/{orphan}")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["success"], false);
    assert!(body["message"].as_str().unwrap().starts_with("Incomplete record"));
}

#[tokio::test]
async fn purchase_validation_errors_use_envelope() {
    let app = app();
    let user = app.create_user("Ada", "ada@example.com").await;

    let (status, body) = app
        .call(
            Method::POST,
            "/orders",
            Some(json!({ "user_id": user, "type": "Bundle", "amount": -1.0 })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);

    let stranger = uuid::Uuid::new_v4();
    let (status, body) = app
        .call(
            Method::POST,
            "/orders",
            Some(json!({ "user_id": stranger, "type": "Bundle", "amount": 5.0 })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "success": false, "message": "User not found" }));
}

#[tokio::test]
async fn full_update_rewrites_order() {
    let app = app();
    let ada = app.create_user("Ada", "ada@example.com").await;
    let bob = app.create_user("Bob", "bob@example.com").await;
    let order = app
        .purchase(json!({ "user_id": ada, "type": "Bundle", "amount": 20.0 }))
        .await;
    let id = order["id"].as_str().unwrap();

    let (status, body) = app
        .call(
            Method::PUT,
            &format!("/admin/orders/{id}"),
            Some(json!({
                "user_id": bob,
                "type": "Pack",
                "pack": "Dashboard Pack",
                "amount": 120.0,
                "address": "1 Main St",
                "phone": "555-0100",
                "zip": "10001",
                "payment_provider": "PayPal",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");

    let (_, details) = app.get(&format!("/admin/orders/{id}")).await;
    let updated = &details["order"];
    assert_eq!(updated["user"]["name"], "Bob");
    assert_eq!(updated["order_type"], "Pack");
    assert_eq!(updated["is_bundle"], false);
    assert_eq!(updated["amount"], 120.0);
    assert_eq!(details["user_stats"]["total_orders"], 1);

    let (_, notes) = app.get(&format!("/users/{bob}/notifications")).await;
    assert!(notes.as_array().unwrap().is_empty());

    let missing = uuid::Uuid::new_v4();
    let (status, _) = app
        .call(
            Method::PUT,
            &format!("/admin/orders/{missing}"),
            Some(json!({ "user_id": bob, "type": "Pack", "amount": 1.0 })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn deletes_single_and_bulk() {
    let app = app();
    let user = app.create_user("Ada", "ada@example.com").await;
    let mut ids = Vec::new();
    for _ in 0..3 {
        let order = app
            .purchase(json!({ "user_id": user, "type": "Bundle", "amount": 1.0 }))
            .await;
        ids.push(order["id"].as_str().unwrap().to_string());
    }

    let (status, _) = app
        .call(Method::DELETE, &format!("/admin/orders/{}", ids[0]), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app
        .call(Method::DELETE, &format!("/admin/orders/{}", ids[0]), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let ghost = uuid::Uuid::new_v4().to_string();
    let (status, body) = app
        .call(
            Method::POST,
            "/admin/orders/delete",
            Some(json!({ "ids": [ids[0], ids[1], ids[2], ghost] })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "success": true, "deleted": 2 }));

    let (_, page) = app.get("/admin/orders").await;
    assert_eq!(page["total"], 0);
}

#[tokio::test]
async fn duplicate_user_email_conflicts() {
    let app = app();
    app.create_user("Ada", "ada@example.com").await;
    let (status, body) = app
        .call(
            Method::POST,
            "/users",
            Some(json!({ "name": "Imposter", "email": "Ada@Example.com" })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn duplicate_component_slug_conflicts() {
    let app = app();
    app.create_component("Hero", "hero").await;
    let (status, body) = app
        .call(
            Method::POST,
            "/components",
            Some(json!({ "name": "Hero again", "slug": "hero" })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Slug 'hero' already taken");
}
