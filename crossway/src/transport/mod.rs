//! Transport layer.
//!
//! The controller is driven over HTTP; see [`http`] for the routes.

pub mod http;

pub use http::{HttpConfig, HttpServer, SequenceRequest, build_router, parse_bind_addr};

use crate::error::TransportError;

/// Result type alias for transport operations.
pub type Result<T> = std::result::Result<T, TransportError>;
