use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::models::{Order, OrderStatus, OrderType, UserStats};

pub const DEFAULT_PAGE_LIMIT: u32 = 10;

// -- Order search --

/// Criteria for the admin order listing. Every field is optional; empty
/// query-string values (`status=`) are treated as absent.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct OrderFilter {
    #[serde(default, deserialize_with = "empty_as_none")]
    pub search: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub status: Option<OrderStatus>,
    #[serde(default, rename = "type", deserialize_with = "empty_as_none")]
    pub order_type: Option<OrderType>,
    #[serde(default, alias = "minPrice", deserialize_with = "empty_as_none")]
    pub min_price: Option<f64>,
    #[serde(default, alias = "maxPrice", deserialize_with = "empty_as_none")]
    pub max_price: Option<f64>,
    #[serde(default, alias = "dateFrom", deserialize_with = "empty_as_none")]
    pub date_from: Option<NaiveDate>,
    #[serde(default, alias = "dateTo", deserialize_with = "empty_as_none")]
    pub date_to: Option<NaiveDate>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub limit: Option<u32>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub offset: Option<u32>,
}

impl OrderFilter {
    pub fn limit(&self) -> u32 {
        self.limit.unwrap_or(DEFAULT_PAGE_LIMIT)
    }

    pub fn offset(&self) -> u32 {
        self.offset.unwrap_or(0)
    }
}

/// Query values arrive as strings; parse them through `FromStr` so the same
/// rules apply to every field.
fn empty_as_none<'de, D, T>(de: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: fmt::Display,
{
    let raw: Option<String> = Option::deserialize(de)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => s.parse().map(Some).map_err(serde::de::Error::custom),
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OrderPage {
    pub orders: Vec<Order>,
    /// Orders matching the filter, ignoring pagination.
    pub filtered_total: u64,
    /// All orders in the store.
    pub total: u64,
}

impl OrderPage {
    pub fn empty() -> Self {
        Self {
            orders: vec![],
            filtered_total: 0,
            total: 0,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OrderDetails {
    pub order: Order,
    pub user_stats: UserStats,
}

#[derive(Debug, Deserialize)]
pub struct OrderDetailsQuery {
    pub user_id: Option<Uuid>,
}

// -- Mutations --

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreatePurchaseRequest {
    pub user_id: Uuid,
    pub component_id: Option<Uuid>,
    #[serde(rename = "type")]
    pub order_type: OrderType,
    pub pack: Option<String>,
    pub amount: f64,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub zip: Option<String>,
    pub payment_provider: Option<String>,
    pub status: Option<OrderStatus>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateOrderRequest {
    pub user_id: Uuid,
    pub component_id: Option<Uuid>,
    #[serde(rename = "type")]
    pub order_type: OrderType,
    pub pack: Option<String>,
    pub amount: f64,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub zip: Option<String>,
    pub payment_provider: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateStatusRequest {
    pub status: OrderStatus,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BulkDeleteRequest {
    pub ids: Vec<Uuid>,
}

/// Envelope returned by every mutation.
#[derive(Debug, Serialize, Deserialize)]
pub struct MutationResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl MutationResponse {
    pub fn ok() -> Self {
        Self {
            success: true,
            message: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PurchaseResponse {
    pub success: bool,
    pub purchase: Order,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BulkDeleteResponse {
    pub success: bool,
    pub deleted: u64,
}

// -- Users & components --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateUserRequest {
    pub name: String,
    pub email: String,
    pub avatar: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateComponentRequest {
    pub name: String,
    pub slug: String,
}
