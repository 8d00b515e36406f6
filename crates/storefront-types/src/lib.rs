pub mod api;
pub mod events;
pub mod models;

pub use models::{Component, Notification, Order, OrderStatus, OrderType, User, UserStats};
