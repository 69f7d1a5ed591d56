//! instagram-private - a client for the Instagram private mobile API.
//!
//! The client presents itself as the Android app: it carries the app's fixed
//! header set, signs request bodies, encrypts the password for login and runs
//! the same bootstrap calls the app makes after a fresh login.
//!
//! # Features
//!
//! - Login with the pre-login sync and post-login bootstrap sequence
//! - Session export and import, so later runs skip the login
//! - Paginated feeds: user media, stories, saved posts, timeline, activity,
//!   direct inbox and explore
//! - Photo, album and video uploads
//! - Pluggable transport, request signer and error handler
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use instagram_private::{ClientSettings, Instagram, Paginated};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let insta = Instagram::new("alice", "hunter2")?;
//!     let report = insta.login().await?;
//!     println!("{} posts on the first timeline page", report.timeline.items.len());
//!     insta.export_path(Path::new("alice.json")).await?;
//!
//!     let settings = ClientSettings::default();
//!     let insta = Instagram::import_path(Path::new("alice.json"), settings).await?;
//!     insta.refresh_zr_token().await?;
//!     if let Some(account) = insta.account().await {
//!         let mut saved = account.saved();
//!         while saved.next(&insta).await {}
//!         println!("{} saved posts", saved.items.len());
//!     }
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod feeds;
pub mod fs;
pub mod media;
pub mod models;
pub mod output;
pub mod session;
pub mod upload;

// Re-exports for convenience
pub use api::{ClientSettings, Instagram, ReqOptions, Transport};
pub use config::ClientConfig;
pub use error::{Error, Result};
pub use feeds::{Activity, Discover, Inbox, Timeline};
pub use media::{FeedMedia, Item, Paginated, SavedMedia, StoryMedia};
pub use models::{Account, User};
pub use session::{BootstrapReport, Phase, SessionBlob};
