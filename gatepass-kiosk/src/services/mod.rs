//! Concrete collaborators for object storage and notifications

pub mod notifier;
pub mod storage;

pub use notifier::HttpNotifier;
pub use storage::LocalBucket;
