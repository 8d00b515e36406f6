pub mod components;
pub mod convert;
pub mod error;
pub mod notify;
pub mod orders;
pub mod outbox;
pub mod routes;
pub mod state;
pub mod users;

pub use error::ApiError;
pub use state::{AppState, AppStateInner};
