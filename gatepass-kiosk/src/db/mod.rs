//! Database access for the kiosk service

pub mod retry;
pub mod visits;

pub use retry::retry_on_lock;
pub use visits::SqliteVisitStore;
