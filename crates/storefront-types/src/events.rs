use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Contents of the purchase confirmation email.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Receipt {
    pub to: String,
    pub name: String,
    pub order_number: String,
    pub amount: f64,
    pub created_at: DateTime<Utc>,
}

/// Work queued in the outbox alongside a committed write and delivered later
/// by the dispatcher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum SideEffect {
    /// Purchase confirmation sent to the buyer
    EmailReceipt(Receipt),

    /// Cached storefront page that must be rebuilt
    Revalidate { path: String },
}

impl SideEffect {
    /// Short name stored in the outbox `kind` column.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::EmailReceipt(_) => "email_receipt",
            Self::Revalidate { .. } => "revalidate",
        }
    }
}
