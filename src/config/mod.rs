//! Configuration module.
//!
//! This module handles:
//! - Loading configuration from TOML files
//! - Converting it into client settings and a request signer
//! - Configuration validation

pub mod loader;
pub mod validation;

pub use loader::{
    AccountConfig, ClientConfig, DeviceConfig, NetworkConfig, SessionConfig, SigningConfig,
};
pub use validation::{parse_user_id, validate_config};
