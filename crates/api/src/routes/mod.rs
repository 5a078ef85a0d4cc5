//! HTTP route handlers.

pub mod concerts;
pub mod system;
