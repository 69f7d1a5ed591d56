//! Instagram private API module.
//!
//! This module provides:
//! - HTTP client with the fixed mobile header set and cookie jar
//! - Swappable transport
//! - Request signing and password encryption
//! - API response types

pub mod auth;
pub mod client;
pub mod constants;
pub mod encryption;
pub mod headers;
pub mod transport;
pub mod types;

pub use auth::{HmacSigner, PlaceholderSigner, RequestSigner};
pub use client::{ClientSettings, ErrorHandler, Instagram, ReqOptions};
pub use transport::{HttpRequest, HttpResponse, ProxySettings, ReqwestTransport, Transport};
pub use types::*;
