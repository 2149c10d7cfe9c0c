//! HTTP request handlers for the wx API.

pub mod api;
pub mod health;
pub mod pages;

pub use api::weather_handler;
pub use health::{health_handler, ready_handler};
pub use pages::{help_handler, index_handler};
