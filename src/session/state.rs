//! Session identity and lifecycle state.

use std::collections::HashMap;
use std::fmt;

use zeroize::Zeroizing;

use crate::api::auth::{generate_device_id, generate_pigeon_session_id, generate_uuid, md5_hex};
use crate::models::Account;

/// Where a session is in the login sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Unauthenticated,
    /// Token fetched and key material synced.
    PreLogin,
    /// Credentials accepted, warm-up not finished.
    PendingBootstrap,
    Ready,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Unauthenticated => "unauthenticated",
            Phase::PreLogin => "pre-login",
            Phase::PendingBootstrap => "pending bootstrap",
            Phase::Ready => "ready",
        };
        f.write_str(name)
    }
}

/// Device identity, tokens and the account of one session.
pub struct SessionState {
    pub username: String,
    pub(crate) password: Zeroizing<String>,
    /// `android-XXXXXXXXXXXXXXXX`
    pub device_id: String,
    pub family_id: String,
    pub uuid: String,
    pub phone_id: String,
    pub ad_id: String,
    pub pigeon_session_id: String,
    pub rank_token: Option<String>,
    pub token: String,
    /// Headers learned from `ig-set-*` responses.
    pub header_options: HashMap<String, String>,
    /// Unix time the X-Mid token expires; -1 until fetched.
    pub xmid_expiry: i64,
    pub phase: Phase,
    pub account: Option<Account>,
}

impl SessionState {
    /// Fresh identity for a username/password pair.
    pub fn new(username: String, password: String) -> Self {
        let device_id = generate_device_id(&md5_hex(&format!("{}{}", username, password)));
        let mut header_options = HashMap::new();
        header_options.insert("X-Ig-Www-Claim".to_string(), "0".to_string());

        Self {
            username,
            password: Zeroizing::new(password),
            device_id,
            family_id: generate_uuid(),
            uuid: generate_uuid(),
            phone_id: generate_uuid(),
            ad_id: generate_uuid(),
            pigeon_session_id: generate_pigeon_session_id(),
            rank_token: None,
            token: String::new(),
            header_options,
            xmid_expiry: -1,
            phase: Phase::Unauthenticated,
            account: None,
        }
    }

    pub fn account_id(&self) -> Option<i64> {
        self.account.as_ref().map(|a| a.id)
    }

    /// Store the account and derive the rank token from it.
    pub fn set_account(&mut self, account: Account) {
        self.rank_token = Some(format!("{}_{}", account.id, self.uuid));
        self.account = Some(account);
    }

    pub fn has_password(&self) -> bool {
        !self.password.is_empty()
    }

    /// Wipe the plaintext password.
    pub(crate) fn clear_password(&mut self) {
        self.password = Zeroizing::new(String::new());
    }
}

impl fmt::Debug for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionState")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("device_id", &self.device_id)
            .field("uuid", &self.uuid)
            .field("rank_token", &self.rank_token)
            .field("xmid_expiry", &self.xmid_expiry)
            .field("phase", &self.phase)
            .field("account_id", &self.account_id())
            .finish()
    }
}
