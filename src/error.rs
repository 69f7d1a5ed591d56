//! Error types for the instagram-private client.

use thiserror::Error;

/// Main error type for the library and CLI.
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration value for '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    #[error("Missing required configuration: {0}")]
    MissingConfig(String),

    // Pagination sentinel
    #[error("No more results")]
    NoMore,

    // API errors
    #[error("API error: {0}")]
    Api(String),

    #[error("Instagram returned HTTP {status}: {message}")]
    Instagram { status: u16, message: String },

    #[error("Rate limited by Instagram (HTTP 429)")]
    RateLimited,

    #[error("Not logged in: {0}")]
    NotLoggedIn(String),

    // Session lifecycle errors
    #[error("Sync returned empty public key and/or public key id")]
    MissingKeyMaterial,

    #[error("Password encryption failed: {0}")]
    Encryption(String),

    #[error("Login bootstrap step '{step}' failed: {reason}")]
    Bootstrap { step: &'static str, reason: String },

    // Upload errors
    #[error("Upload failed: {0}")]
    Upload(String),

    // Media errors
    #[error("Invalid media: {0}")]
    Media(String),

    #[error("Invalid filename (path traversal attempt): {0}")]
    InvalidFilename(String),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // HTTP errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid header value: {0}")]
    Header(#[from] reqwest::header::InvalidHeaderValue),

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    // URL parsing errors
    #[error("Invalid URL: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}

impl Error {
    /// True for the pagination-exhausted sentinel.
    pub fn is_no_more(&self) -> bool {
        matches!(self, Error::NoMore)
    }
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Process exit codes used by the CLI.
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const ABORT: i32 = 1;
    pub const API_ERROR: i32 = 2;
    pub const CONFIG_ERROR: i32 = 3;
    pub const UPLOAD_ERROR: i32 = 4;
    pub const UNEXPECTED_ERROR: i32 = 5;
    pub const LOGIN_ERROR: i32 = 6;
}
