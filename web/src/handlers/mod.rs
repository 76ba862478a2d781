//! HTTP request handlers.
//!
//! This module contains all HTTP handlers organized by domain.

pub mod health;
pub mod items;

pub use health::{health_check, readiness_check};
pub use items::{create_item, delete_item, get_item, list_items, update_item};
