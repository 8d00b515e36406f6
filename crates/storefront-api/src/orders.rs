use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::Utc;
use tracing::{error, info};
use uuid::Uuid;

use storefront_db::models::{OrderFields, PurchaseOutcome, UpdateOutcome};
use storefront_types::api::{
    BulkDeleteRequest, BulkDeleteResponse, CreatePurchaseRequest, MutationResponse, OrderDetails,
    OrderDetailsQuery, OrderFilter, OrderPage, PurchaseResponse, UpdateOrderRequest,
    UpdateStatusRequest,
};
use storefront_types::{OrderStatus, UserStats};

use crate::convert;
use crate::error::ApiError;
use crate::state::{AppState, with_db};

const MAX_PAGE_LIMIT: u32 = 200;

fn validate_amount(amount: f64) -> Result<(), ApiError> {
    if !amount.is_finite() || amount < 0.0 {
        return Err(ApiError::Invalid(format!("Invalid amount: {}", amount)));
    }
    Ok(())
}

/// Admin order listing.
///
/// A failing search is logged and answered with an empty page and zero
/// counts, so callers cannot tell it apart from "no matches".
pub async fn list_orders(
    State(state): State<AppState>,
    Query(mut filter): Query<OrderFilter>,
) -> Json<OrderPage> {
    filter.limit = Some(filter.limit().min(MAX_PAGE_LIMIT));

    match search(&state, filter).await {
        Ok(page) => Json(page),
        Err(e) => {
            error!("Order search failed, returning empty page: {}", e);
            Json(OrderPage::empty())
        }
    }
}

async fn search(state: &AppState, filter: OrderFilter) -> Result<OrderPage, ApiError> {
    let result = with_db(state, move |db| db.search_orders(&filter)).await?;

    let orders = result
        .rows
        .into_iter()
        .map(convert::order)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(OrderPage {
        orders,
        filtered_total: result.filtered_total,
        total: result.total,
    })
}

/// Lifetime totals for a user, from two aggregate queries run side by side.
pub async fn user_stats(state: &AppState, user_id: String) -> Result<UserStats, ApiError> {
    let uid = user_id.clone();
    let (total_orders, total_spent) = tokio::try_join!(
        with_db(state, move |db| db.count_orders_for_user(&uid)),
        with_db(state, move |db| db.total_spent_by_user(&user_id)),
    )?;

    Ok(UserStats {
        total_orders,
        total_spent,
    })
}

/// One order plus its buyer's stats. `user_id` picks whose stats to load;
/// without it the order's own buyer is used.
pub async fn get_order(
    State(state): State<AppState>,
    Path(order_id): Path<Uuid>,
    Query(query): Query<OrderDetailsQuery>,
) -> Result<Json<OrderDetails>, ApiError> {
    let oid = order_id.to_string();

    let (row, stats) = match query.user_id {
        Some(user_id) => {
            let (row, stats) = tokio::try_join!(
                with_db(&state, move |db| db.get_order(&oid)),
                user_stats(&state, user_id.to_string()),
            )?;
            (row, Some(stats))
        }
        None => (with_db(&state, move |db| db.get_order(&oid)).await?, None),
    };

    let row = row.ok_or(ApiError::NotFound("Order"))?;
    let user_stats = match stats {
        Some(stats) => stats,
        None => user_stats(&state, row.user_id.clone()).await?,
    };

    Ok(Json(OrderDetails {
        order: convert::order(row)?,
        user_stats,
    }))
}

/// Record a purchase. The order, the buyer flag, the notification and the
/// queued receipt commit in one transaction; delivery happens in the outbox.
pub async fn create_purchase(
    State(state): State<AppState>,
    Json(req): Json<CreatePurchaseRequest>,
) -> Result<(StatusCode, Json<PurchaseResponse>), ApiError> {
    validate_amount(req.amount)?;

    let status = req.status.unwrap_or(OrderStatus::Pending);
    let fields = OrderFields {
        user_id: req.user_id.to_string(),
        component_id: req.component_id.map(|id| id.to_string()),
        order_type: req.order_type,
        pack: req.pack,
        amount: req.amount,
        address: req.address,
        phone: req.phone,
        zip: req.zip,
        payment_provider: req.payment_provider,
    };

    let outcome = with_db(&state, move |db| db.record_purchase(&fields, status, Utc::now())).await?;

    match outcome {
        PurchaseOutcome::Recorded(row) => Ok((
            StatusCode::CREATED,
            Json(PurchaseResponse {
                success: true,
                purchase: convert::order(row)?,
            }),
        )),
        PurchaseOutcome::UnknownUser => Err(ApiError::Invalid("User not found".into())),
        PurchaseOutcome::UnknownComponent => Err(ApiError::Invalid("Component not found".into())),
    }
}

pub async fn update_status(
    State(state): State<AppState>,
    Path(order_id): Path<Uuid>,
    Json(req): Json<UpdateStatusRequest>,
) -> Result<Json<MutationResponse>, ApiError> {
    let oid = order_id.to_string();
    let status = req.status;

    let updated = with_db(&state, move |db| db.update_order_status(&oid, status)).await?;
    if !updated {
        return Err(ApiError::NotFound("Order"));
    }

    Ok(Json(MutationResponse::ok()))
}

pub async fn update_order(
    State(state): State<AppState>,
    Path(order_id): Path<Uuid>,
    Json(req): Json<UpdateOrderRequest>,
) -> Result<Json<MutationResponse>, ApiError> {
    validate_amount(req.amount)?;

    let oid = order_id.to_string();
    let fields = OrderFields {
        user_id: req.user_id.to_string(),
        component_id: req.component_id.map(|id| id.to_string()),
        order_type: req.order_type,
        pack: req.pack,
        amount: req.amount,
        address: req.address,
        phone: req.phone,
        zip: req.zip,
        payment_provider: req.payment_provider,
    };

    match with_db(&state, move |db| db.update_order(&oid, &fields)).await? {
        UpdateOutcome::Updated => Ok(Json(MutationResponse::ok())),
        UpdateOutcome::NotFound => Err(ApiError::NotFound("Order")),
        UpdateOutcome::UnknownUser => Err(ApiError::Invalid("User not found".into())),
        UpdateOutcome::UnknownComponent => Err(ApiError::Invalid("Component not found".into())),
    }
}

pub async fn delete_order(
    State(state): State<AppState>,
    Path(order_id): Path<Uuid>,
) -> Result<Json<MutationResponse>, ApiError> {
    let oid = order_id.to_string();

    let deleted = with_db(&state, move |db| db.delete_order(&oid)).await?;
    if !deleted {
        return Err(ApiError::NotFound("Order"));
    }

    info!("Deleted order {}", order_id);
    Ok(Json(MutationResponse::ok()))
}

/// Unknown ids are skipped; `deleted` reports how many rows went away.
pub async fn bulk_delete(
    State(state): State<AppState>,
    Json(req): Json<BulkDeleteRequest>,
) -> Result<Json<BulkDeleteResponse>, ApiError> {
    let ids: Vec<String> = req.ids.iter().map(Uuid::to_string).collect();

    let deleted = with_db(&state, move |db| db.delete_orders(&ids)).await?;

    Ok(Json(BulkDeleteResponse {
        success: true,
        deleted,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_amount_validation() {
        assert!(validate_amount(0.0).is_ok());
        assert!(validate_amount(49.99).is_ok());
        assert!(validate_amount(-0.01).is_err());
        assert!(validate_amount(f64::NAN).is_err());
        assert!(validate_amount(f64::INFINITY).is_err());
    }
}
