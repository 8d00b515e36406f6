//! Database row types — these map directly to SQLite rows.
//! Distinct from storefront-types models to keep the DB layer independent.

use storefront_types::OrderType;

/// An order joined with its buyer and (optional) component. The buyer columns
/// are `None` only when the referenced user row is missing.
#[derive(Debug, Clone)]
pub struct OrderRow {
    pub id: String,
    pub order_number: String,
    pub amount: f64,
    pub status: String,
    pub created_at: String,
    pub is_component: bool,
    pub is_bundle: bool,
    pub is_pack: bool,
    pub pack: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub zip: Option<String>,
    pub payment_provider: Option<String>,
    pub user_id: String,
    pub user_name: Option<String>,
    pub user_email: Option<String>,
    pub user_avatar: Option<String>,
    pub component_id: Option<String>,
    pub component_name: Option<String>,
    pub component_slug: Option<String>,
}

#[derive(Debug, Clone)]
pub struct UserRow {
    pub id: String,
    pub name: String,
    pub email: String,
    pub avatar: Option<String>,
    pub has_purchased: bool,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct ComponentRow {
    pub id: String,
    pub name: String,
    pub slug: String,
}

#[derive(Debug, Clone)]
pub struct NotificationRow {
    pub id: String,
    pub user_id: String,
    pub message: String,
    pub read: bool,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct OutboxRow {
    pub id: i64,
    pub kind: String,
    pub payload: String,
    pub attempts: u32,
    pub last_error: Option<String>,
    pub created_at: String,
}

/// Editable order columns, shared by purchase recording and the admin
/// full update.
#[derive(Debug, Clone)]
pub struct OrderFields {
    pub user_id: String,
    pub component_id: Option<String>,
    pub order_type: OrderType,
    pub pack: Option<String>,
    pub amount: f64,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub zip: Option<String>,
    pub payment_provider: Option<String>,
}

/// Page of order rows plus the two counts the admin listing shows.
#[derive(Debug)]
pub struct OrderSearch {
    pub rows: Vec<OrderRow>,
    pub filtered_total: u64,
    pub total: u64,
}

#[derive(Debug)]
pub enum PurchaseOutcome {
    Recorded(OrderRow),
    UnknownUser,
    UnknownComponent,
}

#[derive(Debug, PartialEq, Eq)]
pub enum UpdateOutcome {
    Updated,
    NotFound,
    UnknownUser,
    UnknownComponent,
}
