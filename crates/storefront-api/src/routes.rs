use axum::{
    Router,
    routing::{get, patch, post},
};

use crate::state::AppState;
use crate::{components, orders, users};

async fn health() -> &'static str {
    "ok"
}

pub fn router(state: AppState) -> Router {
    let admin_routes = Router::new()
        .route("/admin/orders", get(orders::list_orders))
        .route("/admin/orders/delete", post(orders::bulk_delete))
        .route(
            "/admin/orders/{order_id}",
            get(orders::get_order)
                .put(orders::update_order)
                .delete(orders::delete_order),
        )
        .route("/admin/orders/{order_id}/status", patch(orders::update_status));

    let store_routes = Router::new()
        .route("/orders", post(orders::create_purchase))
        .route("/users", post(users::create_user))
        .route("/users/{user_id}/stats", get(users::get_user_stats))
        .route("/users/{user_id}/notifications", get(users::list_notifications))
        .route("/components", post(components::create_component));

    Router::new()
        .route("/health", get(health))
        .merge(admin_routes)
        .merge(store_routes)
        .with_state(state)
}
