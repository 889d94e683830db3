//! Test Helper Utilities
//!
//! Shared fakes and fixtures for gatepass-kiosk integration tests

#![allow(dead_code)]

pub mod app;
pub mod fakes;
pub mod fixtures;

pub use app::{body_json, create_test_app, TestApp};
pub use fakes::{FakeNotifier, FakeStorage, FakeStore};
pub use fixtures::{complete_intake, new_visit, selfie_snapshot};
