use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use uuid::Uuid;

use storefront_types::api::CreateUserRequest;
use storefront_types::{Notification, User, UserStats};

use crate::convert;
use crate::error::ApiError;
use crate::orders;
use crate::state::{AppState, with_db};

#[derive(Debug, Deserialize)]
pub struct NotificationQuery {
    #[serde(default = "default_limit")]
    pub limit: u32,
}

fn default_limit() -> u32 {
    50
}

pub async fn create_user(
    State(state): State<AppState>,
    Json(req): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    let name = req.name.trim().to_string();
    let email = req.email.trim().to_string();
    if name.is_empty() || name.len() > 100 {
        return Err(ApiError::Invalid("Name must be 1-100 characters".into()));
    }
    if !email.contains('@') {
        return Err(ApiError::Invalid("Invalid email address".into()));
    }

    let user_id = Uuid::new_v4().to_string();
    let avatar = req.avatar;

    let row = with_db(&state, move |db| {
        if db.get_user_by_email(&email)?.is_some() {
            return Ok(None);
        }
        // A concurrent registration can still win between check and insert.
        match db.create_user(&user_id, &name, &email, avatar.as_deref()) {
            Ok(()) => db.get_user(&user_id),
            Err(e) if storefront_db::is_unique_violation(&e) => Ok(None),
            Err(e) => Err(e),
        }
    })
    .await?
    .ok_or_else(|| ApiError::Conflict("Email already registered".into()))?;

    Ok((StatusCode::CREATED, Json(convert::user(row)?)))
}

pub async fn get_user_stats(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<UserStats>, ApiError> {
    let uid = user_id.to_string();
    let exists = with_db(&state, move |db| db.get_user(&uid)).await?.is_some();
    if !exists {
        return Err(ApiError::NotFound("User"));
    }

    Ok(Json(orders::user_stats(&state, user_id.to_string()).await?))
}

pub async fn list_notifications(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Query(query): Query<NotificationQuery>,
) -> Result<Json<Vec<Notification>>, ApiError> {
    let uid = user_id.to_string();
    let limit = query.limit.min(200);

    let rows = with_db(&state, move |db| db.get_notifications(&uid, limit)).await?;
    let notifications = rows
        .into_iter()
        .map(convert::notification)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Json(notifications))
}
