//! API layer - HTTP entry points.

pub mod dto;
pub mod http;
pub mod identity;

pub use http::ApiError;
pub use identity::{CurrentUser, RequiredUser};
