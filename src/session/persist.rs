//! Session export and import.
//!
//! A logged-in session is saved as a flat JSON document so later runs can
//! skip the login sequence. Importing makes no network call.

use std::collections::{BTreeSet, HashMap};
use std::io::{Read, Write};
use std::path::Path;
use std::sync::Arc;

use reqwest::cookie::Jar;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::api::constants::{API_URL, API_URL_B, COOKIE_DOMAIN};
use crate::api::types::SavedCookie;
use crate::api::{ClientSettings, Instagram, ReqwestTransport, Transport};
use crate::error::{Error, Result};
use crate::fs::default_session_path;
use crate::models::Account;
use crate::session::{Phase, SessionState};

/// Serialized form of a logged-in session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionBlob {
    pub id: i64,
    pub user: String,
    pub device_id: String,
    pub family_id: String,
    pub uuid: String,
    pub rank_token: String,
    pub token: String,
    pub phone_id: String,
    #[serde(default = "default_xmid_expiry")]
    pub xmid_expiry: i64,
    #[serde(default)]
    pub header_options: HashMap<String, String>,
    #[serde(default)]
    pub cookies: Vec<SavedCookie>,
}

fn default_xmid_expiry() -> i64 {
    -1
}

impl Instagram {
    /// Snapshot the session. Fails before login.
    pub async fn export_blob(&self) -> Result<SessionBlob> {
        let account = self.require_account().await?;
        let shared = self.cookie_pairs_for(API_URL).await?;
        let seen: BTreeSet<&(String, String)> = shared.iter().collect();
        let b_only: Vec<(String, String)> = self
            .cookie_pairs_for(API_URL_B)
            .await?
            .into_iter()
            .filter(|pair| !seen.contains(pair))
            .collect();
        let b_host = host_of(API_URL_B)?;

        let mut cookies: Vec<SavedCookie> = shared
            .iter()
            .cloned()
            .map(|pair| saved_cookie(pair, COOKIE_DOMAIN))
            .chain(b_only.into_iter().map(|pair| saved_cookie(pair, &b_host)))
            .collect();
        cookies.sort();

        let state = self.state.read().await;
        Ok(SessionBlob {
            id: account.id,
            user: state.username.clone(),
            device_id: state.device_id.clone(),
            family_id: state.family_id.clone(),
            uuid: state.uuid.clone(),
            rank_token: state.rank_token.clone().unwrap_or_default(),
            token: state.token.clone(),
            phone_id: state.phone_id.clone(),
            xmid_expiry: state.xmid_expiry,
            header_options: state.header_options.clone(),
            cookies,
        })
    }

    /// Write the session as JSON.
    pub async fn export<W: Write>(&self, writer: W) -> Result<()> {
        let blob = self.export_blob().await?;
        serde_json::to_writer_pretty(writer, &blob)?;
        Ok(())
    }

    /// Write the session to a file, creating parent directories.
    pub async fn export_path(&self, path: &Path) -> Result<()> {
        let mut bytes = Vec::new();
        self.export(&mut bytes).await?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(path, bytes).await?;
        tracing::info!("Session saved to {}", path.display());
        Ok(())
    }

    /// Write the session to the default session file.
    pub async fn save(&self) -> Result<()> {
        self.export_path(&default_session_path()?).await
    }

    /// Restore a session over the default transport.
    pub fn import_blob(blob: SessionBlob, settings: ClientSettings) -> Result<Self> {
        let transport = Arc::new(ReqwestTransport::new(settings.timeout_secs)?);
        Self::restore(blob, settings, transport)
    }

    /// Restore a session from JSON.
    pub fn import_reader<R: Read>(reader: R, settings: ClientSettings) -> Result<Self> {
        let blob: SessionBlob = serde_json::from_reader(reader)?;
        Self::import_blob(blob, settings)
    }

    /// Restore a session from a file written by [`Instagram::export_path`].
    pub async fn import_path(path: &Path, settings: ClientSettings) -> Result<Self> {
        let bytes = tokio::fs::read(path).await.map_err(|e| {
            Error::Config(format!("Cannot open session {}: {}", path.display(), e))
        })?;
        Self::import_reader(bytes.as_slice(), settings)
    }

    pub(crate) fn restore(
        blob: SessionBlob,
        settings: ClientSettings,
        transport: Arc<dyn Transport>,
    ) -> Result<Self> {
        if blob.id == 0 || blob.user.is_empty() {
            return Err(Error::Config("Session file has no account".into()));
        }

        let api_url = Url::parse(API_URL)?;
        let jar = Jar::default();
        for cookie in &blob.cookies {
            let path = if cookie.path.is_empty() { "/" } else { cookie.path.as_str() };
            let pair = format!("{}={}; Path={}", cookie.name, cookie.value, path);
            match cookie.domain.as_str() {
                "" => jar.add_cookie_str(&format!("{}; Domain={}", pair, COOKIE_DOMAIN), &api_url),
                domain if domain.starts_with('.') => {
                    jar.add_cookie_str(&format!("{}; Domain={}", pair, domain), &api_url)
                }
                // Host-only: set from its own host with no Domain attribute.
                host => jar.add_cookie_str(&pair, &Url::parse(&format!("https://{}/", host))?),
            }
        }

        let mut state = SessionState::new(blob.user.clone(), String::new());
        state.device_id = blob.device_id;
        state.family_id = blob.family_id;
        state.uuid = blob.uuid;
        state.phone_id = blob.phone_id;
        state.token = blob.token;
        state.xmid_expiry = blob.xmid_expiry;
        state.header_options = blob.header_options;
        state.set_account(Account::new(blob.id, blob.user));
        if !blob.rank_token.is_empty() {
            state.rank_token = Some(blob.rank_token);
        }
        state.phase = Phase::Ready;

        Ok(Self::from_parts(state, settings, transport, Arc::new(jar)))
    }
}

fn saved_cookie((name, value): (String, String), domain: &str) -> SavedCookie {
    SavedCookie {
        name,
        value,
        domain: domain.to_string(),
        path: "/".to_string(),
    }
}

fn host_of(base: &str) -> Result<String> {
    Url::parse(base)?
        .host_str()
        .map(str::to_string)
        .ok_or_else(|| Error::Config(format!("{} has no host", base)))
}
