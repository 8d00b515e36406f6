//! Row → API model conversion.
//!
//! Rows that cannot be read back (missing buyer, unknown status text,
//! malformed ids or timestamps) become [`ApiError::Incomplete`].

use chrono::{DateTime, Utc};
use storefront_db::models::{ComponentRow, NotificationRow, OrderRow, UserRow};
use storefront_db::parse_timestamp;
use storefront_types::models::Buyer;
use storefront_types::{Component, Notification, Order, OrderStatus, OrderType, User};
use uuid::Uuid;

use crate::error::ApiError;

fn parse_id(raw: &str, what: &str, owner: &str) -> Result<Uuid, ApiError> {
    raw.parse()
        .map_err(|e| ApiError::Incomplete(format!("corrupt {} '{}' on {}: {}", what, raw, owner, e)))
}

fn timestamp(raw: &str, owner: &str) -> Result<DateTime<Utc>, ApiError> {
    parse_timestamp(raw)
        .ok_or_else(|| ApiError::Incomplete(format!("corrupt created_at '{}' on {}", raw, owner)))
}

pub fn order(row: OrderRow) -> Result<Order, ApiError> {
    let owner = format!("order {}", row.id);

    let status = row
        .status
        .parse::<OrderStatus>()
        .map_err(|e| ApiError::Incomplete(format!("{} on {}", e, owner)))?;

    let (Some(name), Some(email)) = (row.user_name, row.user_email) else {
        return Err(ApiError::Incomplete(format!(
            "{} references missing user {}",
            owner, row.user_id
        )));
    };
    let user = Buyer {
        id: parse_id(&row.user_id, "user_id", &owner)?,
        name,
        email,
        avatar: row.user_avatar,
    };

    // A dangling component reference reads as no component.
    let component = match (row.component_id, row.component_name, row.component_slug) {
        (Some(id), Some(name), Some(slug)) => Some(Component {
            id: parse_id(&id, "component_id", &owner)?,
            name,
            slug,
        }),
        _ => None,
    };

    Ok(Order {
        id: parse_id(&row.id, "id", &owner)?,
        created_at: timestamp(&row.created_at, &owner)?,
        order_number: row.order_number,
        amount: row.amount,
        status,
        order_type: OrderType::from_flags(row.is_component, row.is_bundle, row.is_pack),
        is_component: row.is_component,
        is_bundle: row.is_bundle,
        is_pack: row.is_pack,
        pack: row.pack,
        address: row.address,
        phone: row.phone,
        zip: row.zip,
        payment_provider: row.payment_provider,
        user,
        component,
    })
}

pub fn user(row: UserRow) -> Result<User, ApiError> {
    Ok(User {
        id: parse_id(&row.id, "id", &format!("user {}", row.id))?,
        name: row.name,
        email: row.email,
        avatar: row.avatar,
        has_purchased: row.has_purchased,
    })
}

pub fn component(row: ComponentRow) -> Result<Component, ApiError> {
    Ok(Component {
        id: parse_id(&row.id, "id", &format!("component {}", row.id))?,
        name: row.name,
        slug: row.slug,
    })
}

pub fn notification(row: NotificationRow) -> Result<Notification, ApiError> {
    let owner = format!("notification {}", row.id);
    Ok(Notification {
        id: parse_id(&row.id, "id", &owner)?,
        user_id: parse_id(&row.user_id, "user_id", &owner)?,
        created_at: timestamp(&row.created_at, &owner)?,
        message: row.message,
        read: row.read,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row() -> OrderRow {
        OrderRow {
            id: Uuid::new_v4().to_string(),
            order_number: "ORD-20240601-ABC123".into(),
            amount: 49.99,
            status: "SUCCESS".into(),
            created_at: "2024-06-01 12:00:00".into(),
            is_component: false,
            is_bundle: true,
            is_pack: false,
            pack: None,
            address: None,
            phone: None,
            zip: None,
            payment_provider: Some("Stripe".into()),
            user_id: Uuid::new_v4().to_string(),
            user_name: Some("Ada".into()),
            user_email: Some("ada@example.com".into()),
            user_avatar: None,
            component_id: None,
            component_name: None,
            component_slug: None,
        }
    }

    #[test]
    fn test_complete_row_converts() {
        let order = order(row()).unwrap();
        assert_eq!(order.status, OrderStatus::Success);
        assert_eq!(order.order_type, Some(OrderType::Bundle));
        assert_eq!(order.user.name, "Ada");
        assert!(order.component.is_none());
    }

    #[test]
    fn test_missing_buyer_is_incomplete() {
        let mut r = row();
        r.user_name = None;
        r.user_email = None;
        assert!(matches!(order(r), Err(ApiError::Incomplete(_))));
    }

    #[test]
    fn test_unknown_status_is_incomplete() {
        let mut r = row();
        r.status = "REFUNDED".into();
        assert!(matches!(order(r), Err(ApiError::Incomplete(_))));
    }

    #[test]
    fn test_bad_timestamp_is_incomplete() {
        let mut r = row();
        r.created_at = "last tuesday".into();
        assert!(matches!(order(r), Err(ApiError::Incomplete(_))));
    }
}
