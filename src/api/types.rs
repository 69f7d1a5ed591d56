//! API response type definitions.

use std::collections::HashMap;

use serde::{Deserialize, Deserializer, Serialize};

use crate::media::Item;
use crate::models::{Account, User};

/// Minimal `{status, message}` envelope most endpoints return.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatusResponse {
    #[serde(default)]
    pub status: String,
    pub message: Option<String>,
    pub error_type: Option<String>,
}

/// Zero-rating token response.
#[derive(Debug, Clone, Deserialize)]
pub struct ZrTokenResponse {
    pub token: ZrToken,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ZrToken {
    #[serde(default)]
    pub ttl: f64,
    #[serde(default)]
    pub request_time: f64,
    #[serde(default)]
    pub carrier_name: String,
}

impl ZrToken {
    /// Unix time at which the X-Mid token must be refreshed.
    pub fn expiry(&self) -> i64 {
        (self.request_time + self.ttl) as i64
    }
}

/// Login response.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub logged_in_user: Account,
    #[serde(default)]
    pub status: String,
}

/// `accounts/current_user/` response.
#[derive(Debug, Clone, Deserialize)]
pub struct CurrentUserResponse {
    pub user: Account,
}

/// Quick promotion cooldowns. Only the global value is understood.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Cooldowns {
    #[serde(default)]
    pub global: i64,
    #[serde(default)]
    pub default: i64,
    #[serde(default)]
    pub surfaces: Vec<serde_json::Value>,
    #[serde(default)]
    pub slots: Vec<serde_json::Value>,
    #[serde(default)]
    pub status: String,
}

/// Ranked user lists for the client's autocomplete surfaces.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScoresBootstrapUsers {
    #[serde(default)]
    pub surfaces: Vec<serde_json::Value>,
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub status: String,
}

/// Response of a raw rupload call.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadResponse {
    pub upload_id: Option<String>,
    #[serde(default)]
    pub status: String,
}

/// Response of `media/configure/`.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigureResponse {
    #[serde(default)]
    pub media: Item,
    pub upload_id: Option<String>,
    #[serde(default)]
    pub status: String,
}

/// Response of `media/configure_sidecar/`.
#[derive(Debug, Clone, Deserialize)]
pub struct SidecarResponse {
    #[serde(default)]
    pub media: Item,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub client_sidecar_id: i64,
    #[serde(default)]
    pub status: String,
}

/// Response of `media/{id}/likers/`.
#[derive(Debug, Clone, Deserialize)]
pub struct LikersResponse {
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub user_count: u64,
}

/// Persisted cookie.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SavedCookie {
    pub name: String,
    pub value: String,
    #[serde(default)]
    pub domain: String,
    #[serde(default)]
    pub path: String,
}

/// Map of reel id to reel, as returned by `feed/reels_media/`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TrayResponse {
    #[serde(default)]
    pub reels: HashMap<String, crate::media::story::ReelPage>,
    #[serde(default)]
    pub status: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum IntOrString {
    Int(i64),
    Float(f64),
    Str(String),
}

/// Accept ids sent either as numbers or as numeric strings.
pub(crate) fn lenient_i64<'de, D>(deserializer: D) -> std::result::Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<IntOrString>::deserialize(deserializer)? {
        Some(IntOrString::Int(n)) => n,
        Some(IntOrString::Float(f)) => f as i64,
        Some(IntOrString::Str(s)) => s.trim().parse().unwrap_or_default(),
        None => 0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    struct Holder {
        #[serde(default, deserialize_with = "lenient_i64")]
        pk: i64,
    }

    #[test]
    fn test_lenient_i64_shapes() {
        let n: Holder = serde_json::from_str(r#"{"pk": 42}"#).unwrap();
        let s: Holder = serde_json::from_str(r#"{"pk": "42"}"#).unwrap();
        let missing: Holder = serde_json::from_str("{}").unwrap();
        let null: Holder = serde_json::from_str(r#"{"pk": null}"#).unwrap();
        assert_eq!(n.pk, 42);
        assert_eq!(s.pk, 42);
        assert_eq!(missing.pk, 0);
        assert_eq!(null.pk, 0);
    }

    #[test]
    fn test_zr_token_expiry() {
        let resp: ZrTokenResponse = serde_json::from_str(
            r#"{"token":{"ttl":3600,"request_time":1700000000,"carrier_name":"none"},"status":"ok"}"#,
        )
        .unwrap();
        assert_eq!(resp.token.expiry(), 1700003600);
    }

    #[test]
    fn test_status_response_message() {
        let resp: StatusResponse =
            serde_json::from_str(r#"{"status":"fail","message":"login_required"}"#).unwrap();
        assert_eq!(resp.status, "fail");
        assert_eq!(resp.message.as_deref(), Some("login_required"));
    }
}
