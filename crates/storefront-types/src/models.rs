use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unrecognised {kind}: '{value}'")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

/// Payment state of an order. Stored and serialized in upper case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderStatus {
    Pending,
    Success,
    Failed,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Success => "SUCCESS",
            Self::Failed => "FAILED",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PENDING" => Ok(Self::Pending),
            "SUCCESS" => Ok(Self::Success),
            "FAILED" => Ok(Self::Failed),
            _ => Err(ParseEnumError {
                kind: "order status",
                value: s.to_string(),
            }),
        }
    }
}

/// What an order bought. Each variant corresponds to one of the stored
/// `is_component` / `is_bundle` / `is_pack` flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderType {
    Component,
    Bundle,
    Pack,
}

impl OrderType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Component => "Component",
            Self::Bundle => "Bundle",
            Self::Pack => "Pack",
        }
    }

    /// Flag triple `(is_component, is_bundle, is_pack)` with exactly one set.
    pub fn flags(&self) -> (bool, bool, bool) {
        match self {
            Self::Component => (true, false, false),
            Self::Bundle => (false, true, false),
            Self::Pack => (false, false, true),
        }
    }

    /// Reads a stored flag triple back. Component wins over Bundle wins over
    /// Pack when more than one flag is set.
    pub fn from_flags(is_component: bool, is_bundle: bool, is_pack: bool) -> Option<Self> {
        if is_component {
            Some(Self::Component)
        } else if is_bundle {
            Some(Self::Bundle)
        } else if is_pack {
            Some(Self::Pack)
        } else {
            None
        }
    }
}

impl fmt::Display for OrderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderType {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "component" => Ok(Self::Component),
            "bundle" => Ok(Self::Bundle),
            "pack" => Ok(Self::Pack),
            _ => Err(ParseEnumError {
                kind: "order type",
                value: s.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub avatar: Option<String>,
    pub has_purchased: bool,
}

/// Buyer projection embedded in an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Buyer {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub avatar: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Component {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    pub order_number: String,
    pub amount: f64,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub order_type: Option<OrderType>,
    pub is_component: bool,
    pub is_bundle: bool,
    pub is_pack: bool,
    pub pack: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub zip: Option<String>,
    pub payment_provider: Option<String>,
    pub user: Buyer,
    pub component: Option<Component>,
}

/// Lifetime purchase totals for one user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct UserStats {
    pub total_orders: u64,
    pub total_spent: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub user_id: Uuid,
    pub message: String,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}
