//! Configuration validation logic.

use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

use crate::config::loader::ClientConfig;
use crate::error::{Error, Result};

/// Maximum Instagram username length.
const MAX_USERNAME_LENGTH: usize = 30;

/// Timeouts outside this range are almost certainly typos.
const MAX_TIMEOUT_SECS: u64 = 600;

/// Shortest signing key accepted.
const MIN_HMAC_KEY_LENGTH: usize = 16;

const PROXY_SCHEMES: &[&str] = &["http", "https", "socks5", "socks5h"];

static USERNAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9._]+$").expect("valid username pattern"));

/// Validate the entire configuration.
pub fn validate_config(config: &ClientConfig) -> Result<()> {
    validate_username(&config.account.username)?;
    if let Some(proxy) = &config.network.proxy {
        validate_proxy(proxy)?;
    }
    validate_timeout(config.network.timeout_secs)?;
    if let Some(key) = &config.signing.hmac_key {
        validate_hmac_key(key)?;
    }
    Ok(())
}

/// Validate an Instagram username.
pub fn validate_username(username: &str) -> Result<()> {
    let username = username.trim_start_matches('@');
    if username.is_empty() {
        return Err(Error::MissingConfig("account.username".to_string()));
    }

    if username.len() > MAX_USERNAME_LENGTH {
        return Err(Error::ConfigValidation {
            field: "account.username".to_string(),
            message: format!(
                "Username '{}' is too long (maximum {} characters)",
                username, MAX_USERNAME_LENGTH
            ),
        });
    }

    if !USERNAME.is_match(username) {
        return Err(Error::ConfigValidation {
            field: "account.username".to_string(),
            message: format!(
                "Username '{}' contains invalid characters. Only letters, digits, periods and underscores allowed.",
                username
            ),
        });
    }

    if matches!(username.to_lowercase().as_str(), "replaceme" | "username") {
        return Err(Error::ConfigValidation {
            field: "account.username".to_string(),
            message: "Username appears to be a placeholder".to_string(),
        });
    }

    Ok(())
}

/// Validate a proxy URL.
pub fn validate_proxy(proxy: &str) -> Result<()> {
    let url = Url::parse(proxy).map_err(|e| Error::ConfigValidation {
        field: "network.proxy".to_string(),
        message: format!("'{}' is not a valid URL: {}", proxy, e),
    })?;

    if !PROXY_SCHEMES.contains(&url.scheme()) {
        return Err(Error::ConfigValidation {
            field: "network.proxy".to_string(),
            message: format!(
                "Unsupported proxy scheme '{}' (expected one of {})",
                url.scheme(),
                PROXY_SCHEMES.join(", ")
            ),
        });
    }
    if url.host_str().is_none() {
        return Err(Error::ConfigValidation {
            field: "network.proxy".to_string(),
            message: format!("Proxy '{}' has no host", proxy),
        });
    }

    Ok(())
}

/// Validate the request timeout.
pub fn validate_timeout(secs: u64) -> Result<()> {
    if secs == 0 || secs > MAX_TIMEOUT_SECS {
        return Err(Error::ConfigValidation {
            field: "network.timeout_secs".to_string(),
            message: format!("Timeout must be between 1 and {} seconds", MAX_TIMEOUT_SECS),
        });
    }
    Ok(())
}

/// Validate the signing key.
pub fn validate_hmac_key(key: &str) -> Result<()> {
    if key.len() < MIN_HMAC_KEY_LENGTH {
        return Err(Error::ConfigValidation {
            field: "signing.hmac_key".to_string(),
            message: format!(
                "Signing key must be at least {} characters (got {})",
                MIN_HMAC_KEY_LENGTH,
                key.len()
            ),
        });
    }
    if key.to_lowercase().contains("replaceme") {
        return Err(Error::ConfigValidation {
            field: "signing.hmac_key".to_string(),
            message: "Signing key appears to be a placeholder".to_string(),
        });
    }
    Ok(())
}

/// Extract a numeric user id from a plain id or an `@id` argument.
pub fn parse_user_id(input: &str) -> Result<i64> {
    let input = input.trim().trim_start_matches('@');
    input
        .parse::<i64>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| Error::ConfigValidation {
            field: "user_id".to_string(),
            message: format!("Invalid user id: '{}'. Must be a positive number.", input),
        })
}
