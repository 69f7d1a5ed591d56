//! Command-line argument definitions using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::ClientConfig;

/// Instagram private API client.
#[derive(Parser, Debug)]
#[command(
    name = "instagram-private",
    version,
    about = "Talk to Instagram through its private mobile API",
    long_about = "Log in as an Android device, browse feeds and publish media.\n\n\
                  A successful login is saved to a session file so later commands \
                  skip the login sequence."
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Account username.
    #[arg(short, long, env = "INSTAGRAM_USERNAME", global = true)]
    pub username: Option<String>,

    /// Path to configuration file (defaults to the per-user config dir).
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Session file to read and write.
    #[arg(short, long, env = "INSTAGRAM_SESSION", global = true)]
    pub session: Option<PathBuf>,

    /// Proxy URL for all traffic.
    #[arg(long, env = "INSTAGRAM_PROXY", global = true)]
    pub proxy: Option<String>,

    /// Accept invalid proxy certificates.
    #[arg(long, global = true)]
    pub insecure: bool,

    /// Device locale, e.g. en_US.
    #[arg(long, global = true)]
    pub locale: Option<String>,

    /// Request timeout in seconds.
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    /// Request signing key.
    #[arg(long, env = "INSTAGRAM_SIGNING_KEY", hide_env_values = true, global = true)]
    pub signing_key: Option<String>,

    /// Enable debug logging.
    #[arg(long, global = true)]
    pub debug: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Log in and save the session.
    Login {
        /// Account password.
        #[arg(short, long, env = "INSTAGRAM_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Show the account of the saved session.
    Whoami,

    /// List posts from the home timeline.
    Timeline {
        /// Number of pages to fetch.
        #[arg(long, default_value_t = 1)]
        pages: usize,

        /// Download the listed posts into this directory.
        #[arg(long)]
        download: Option<PathBuf>,
    },

    /// List saved posts.
    Saved {
        /// Number of pages to fetch.
        #[arg(long, default_value_t = 1)]
        pages: usize,

        /// Download the listed posts into this directory.
        #[arg(long)]
        download: Option<PathBuf>,
    },

    /// List a user's current stories.
    Stories {
        /// Numeric user id.
        user_id: String,

        /// Download the stories into this directory.
        #[arg(long)]
        download: Option<PathBuf>,
    },

    /// Publish a photo.
    UploadPhoto {
        path: PathBuf,

        #[arg(long, default_value = "")]
        caption: String,

        /// JPEG quality reported to the server.
        #[arg(long, default_value_t = 80)]
        quality: u8,
    },

    /// Publish several photos as one carousel post.
    UploadAlbum {
        #[arg(required = true, num_args = 2..)]
        paths: Vec<PathBuf>,

        #[arg(long, default_value = "")]
        caption: String,

        #[arg(long, default_value_t = 80)]
        quality: u8,
    },

    /// End the session and delete the session file.
    Logout,
}

impl Args {
    /// Merge CLI arguments into an existing config, overriding where specified.
    pub fn merge_into_config(&self, config: &mut ClientConfig) {
        if let Some(username) = &self.username {
            config.account.username = username.clone();
        }

        if let Some(session) = &self.session {
            config.session.path = Some(session.clone());
        }

        if let Some(proxy) = &self.proxy {
            config.network.proxy = Some(proxy.clone());
        }

        if self.insecure {
            config.network.insecure = true;
        }

        if let Some(locale) = &self.locale {
            config.device.locale = locale.clone();
        }

        if let Some(timeout) = self.timeout {
            config.network.timeout_secs = timeout;
        }

        if let Some(key) = &self.signing_key {
            config.signing.hmac_key = Some(key.clone());
        }
    }
}
