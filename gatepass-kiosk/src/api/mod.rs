//! HTTP API handlers for gatepass-kiosk
//!
//! Kiosk front-end: sessions, camera relay, confirmation, testimonials.
//! Staff console: visit listing, live feed, event stream, stored selfies.

pub mod camera;
pub mod confirmation;
pub mod feed;
pub mod health;
pub mod sessions;
pub mod sse;
pub mod storage;
pub mod testimonials;
pub mod visits;

pub use camera::camera_routes;
pub use confirmation::confirmation_routes;
pub use feed::feed_routes;
pub use health::health_routes;
pub use sessions::session_routes;
pub use sse::event_stream;
pub use storage::storage_routes;
pub use testimonials::testimonial_routes;
pub use visits::visit_routes;
