//! Credential login and logout.

use serde_json::json;

use crate::api::auth::{is_xmid_expired, jazoest, unix_seconds};
use crate::api::constants::{
    HEADER_PUB_KEY, HEADER_PUB_KEY_ID, URL_CONTACT_PREFILL, URL_GET_PREFILL, URL_LOGIN,
    URL_LOGOUT, URL_SYNC, URL_ZR_TOKEN,
};
use crate::api::encryption::{encrypt_password, format_enc_password};
use crate::api::headers::{IGNORE_ON_PRELOGIN_SYNC, IGNORE_ON_SYNC_B, IGNORE_ON_ZR_TOKEN};
use crate::api::types::{LoginResponse, ZrTokenResponse};
use crate::api::{Instagram, ReqOptions};
use crate::error::{Error, Result};
use crate::session::bootstrap::BootstrapReport;
use crate::session::Phase;

/// Public key handed out by `launcher/sync/` for password encryption.
#[derive(Debug, Clone, Default)]
pub(crate) struct KeyMaterial {
    pub public_key: String,
    pub key_id: u8,
}

impl KeyMaterial {
    fn is_usable(&self) -> bool {
        !self.public_key.is_empty() && self.key_id != 0
    }
}

impl Instagram {
    /// Log in with the stored credentials and warm the session up.
    ///
    /// Returns the first pages the warm-up fetched. The password is wiped as
    /// soon as the credentials are accepted, whatever happens afterwards.
    pub async fn login(&self) -> Result<BootstrapReport> {
        if !self.state.read().await.has_password() {
            return Err(Error::MissingConfig(
                "password (already used or never set)".into(),
            ));
        }

        let key = self.pre_login().await?;
        self.submit_credentials(&key).await?;
        self.bootstrap().await
    }

    /// Token refresh, key sync and prefill calls the app makes before the
    /// login form is submitted.
    async fn pre_login(&self) -> Result<KeyMaterial> {
        self.zr_token().await?;
        let first = self.sync().await?;

        if let Err(e) = self.get_prefill_candidates().await {
            self.report("get_prefill_candidates", &e);
        }
        if let Err(e) = self.contact_point_prefill().await {
            self.report("contact_point_prefill", &e);
        }

        let second = self.sync().await?;
        let key = if second.is_usable() { second } else { first };
        if !key.is_usable() {
            return Err(Error::MissingKeyMaterial);
        }

        self.state.write().await.phase = Phase::PreLogin;
        tracing::debug!("Pre-login done, key id {}", key.key_id);
        Ok(key)
    }

    async fn submit_credentials(&self, key: &KeyMaterial) -> Result<()> {
        let timestamp = unix_seconds().to_string();
        let payload = {
            let state = self.state.read().await;
            let envelope = encrypt_password(&state.password, &key.public_key, key.key_id, &timestamp)?;
            json!({
                "jazoest": jazoest(&state.device_id),
                "country_code": "[{\"country_code\":\"44\",\"source\":[\"default\"]}]",
                "phone_id": state.family_id,
                "enc_password": format_enc_password(&timestamp, &envelope),
                "username": state.username,
                "adid": state.ad_id,
                "guid": state.uuid,
                "device_id": state.device_id,
                "google_tokens": "[]",
                "login_attempt_count": 0,
            })
        };

        let form = self.sign(&serde_json::to_string(&payload)?);
        let response = self.send_request(ReqOptions::post(URL_LOGIN).form(form)).await?;

        self.state.write().await.clear_password();

        let login: LoginResponse = serde_json::from_slice(&response.body).map_err(|e| {
            tracing::debug!("Unexpected login response: {}", response.text());
            Error::Json(e)
        })?;

        let mut state = self.state.write().await;
        tracing::info!("Logged in as {} ({})", login.logged_in_user.username, login.logged_in_user.id);
        state.set_account(login.logged_in_user);
        state.phase = Phase::PendingBootstrap;
        Ok(())
    }

    /// Refresh the zero-rating token and record when X-Mid expires.
    pub(crate) async fn zr_token(&self) -> Result<()> {
        let (device_id, uuid) = {
            let state = self.state.read().await;
            (state.device_id.clone(), state.uuid.clone())
        };
        let opts = ReqOptions::get(URL_ZR_TOKEN)
            .query("device_id", device_id)
            .query("token_hash", "")
            .query("custom_device_id", uuid)
            .query("fetch_reason", "token_expired")
            .ignore(IGNORE_ON_ZR_TOKEN);

        let response: ZrTokenResponse = self.request_json(opts).await?;
        self.state.write().await.xmid_expiry = response.token.expiry();
        Ok(())
    }

    /// Pre-login `launcher/sync/`. Returns the key material from its headers.
    pub(crate) async fn sync(&self) -> Result<KeyMaterial> {
        let uuid = self.uuid().await;
        let payload = json!({"id": uuid, "server_config_retrieval": 1});
        let opts = ReqOptions::post(URL_SYNC)
            .form(self.sign(&serde_json::to_string(&payload)?))
            .ignore(IGNORE_ON_PRELOGIN_SYNC);

        let response = self.send_request(opts).await?;
        Ok(KeyMaterial {
            public_key: response.header(HEADER_PUB_KEY).unwrap_or_default().to_string(),
            key_id: response
                .header(HEADER_PUB_KEY_ID)
                .and_then(|id| id.trim().parse().ok())
                .unwrap_or_default(),
        })
    }

    /// Logged-in `launcher/sync/` against the `b.` host.
    pub(crate) async fn sync_b(&self) -> Result<()> {
        let (account_id, uuid) = {
            let state = self.state.read().await;
            (state.account_id().unwrap_or_default().to_string(), state.uuid.clone())
        };
        let payload = json!({
            "id": account_id,
            "_id": account_id,
            "_uuid": uuid,
            "server_config_retrieval": 1,
        });
        let opts = ReqOptions::post(URL_SYNC)
            .form(self.sign(&serde_json::to_string(&payload)?))
            .use_b()
            .ignore(IGNORE_ON_SYNC_B);

        self.send_request(opts).await?;
        Ok(())
    }

    async fn get_prefill_candidates(&self) -> Result<()> {
        let payload = {
            let state = self.state.read().await;
            json!({
                "android_device_id": state.device_id,
                "phone_id": state.family_id,
                "usages": "[\"account_recovery_omnibox\"]",
                "device_id": state.uuid,
            })
        };
        let form = self.sign(&serde_json::to_string(&payload)?);
        self.send_request(ReqOptions::post(URL_GET_PREFILL).form(form))
            .await?;
        Ok(())
    }

    async fn contact_point_prefill(&self) -> Result<()> {
        let family_id = self.state.read().await.family_id.clone();
        let payload = json!({"phone_id": family_id, "usage": "prefill"});
        let form = self.sign(&serde_json::to_string(&payload)?);
        self.send_request(ReqOptions::post(URL_CONTACT_PREFILL).form(form))
            .await?;
        Ok(())
    }

    /// End the session server side and forget cookies and the account.
    pub async fn logout(&self) -> Result<()> {
        self.send_simple_request(URL_LOGOUT).await?;
        self.clear_cookies().await;

        let mut state = self.state.write().await;
        state.account = None;
        state.rank_token = None;
        state.header_options.remove("Authorization");
        state.phase = Phase::Unauthenticated;
        tracing::info!("Logged out {}", state.username);
        Ok(())
    }

    /// Fetch a new zero-rating token if the current X-Mid has expired.
    ///
    /// Returns true when a request was made. Imported sessions keep their
    /// saved expiry, so call this before using one.
    pub async fn refresh_zr_token(&self) -> Result<bool> {
        let expiry = self.state.read().await.xmid_expiry;
        if !is_xmid_expired(expiry) {
            return Ok(false);
        }
        tracing::debug!("X-Mid expired ({}), refreshing zero-rating token", expiry);
        self.zr_token().await?;
        Ok(true)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::api::transport::mock::MockTransport;
    use crate::api::{ClientSettings, HttpResponse};
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use rsa::pkcs8::{EncodePublicKey, LineEnding};
    use rsa::{RsaPrivateKey, RsaPublicKey};
    use std::sync::Arc;

    pub(crate) fn public_key_b64() -> String {
        let private = RsaPrivateKey::new(&mut rand::thread_rng(), 1024).unwrap();
        let pem = RsaPublicKey::from(&private)
            .to_public_key_pem(LineEnding::LF)
            .unwrap();
        STANDARD.encode(pem)
    }

    /// Routes for a full, successful login including every bootstrap step.
    pub(crate) fn mock_login_routes(mock: &MockTransport) {
        mock.on_json(
            "zr/token/result/",
            r#"{"token":{"ttl":3600,"request_time":1700000000},"status":"ok"}"#,
        );
        mock.on(
            "launcher/sync/",
            HttpResponse::new(200, r#"{"status":"ok"}"#)
                .with_header(HEADER_PUB_KEY, &public_key_b64())
                .with_header(HEADER_PUB_KEY_ID, "41"),
        );
        mock.on(
            "accounts/login/",
            HttpResponse::new(
                200,
                r#"{"logged_in_user":{"pk":42,"username":"alice"},"status":"ok"}"#,
            )
            .with_header("ig-set-authorization", "Bearer IGT:2:token")
            .with_header("ig-set-ig-u-ds-user-id", "42"),
        );
        mock.on_json("feed/timeline/", r#"{"feed_items":[],"more_available":false}"#);
        mock.on_json("news/inbox/", r#"{"new_stories":[],"old_stories":[]}"#);
        mock.on_json(
            "direct_v2/inbox/",
            r#"{"inbox":{"threads":[],"has_older":false},"seq_id":1}"#,
        );
        mock.on_json("discover/topical_explore/", r#"{"sectional_items":[]}"#);
        for fragment in [
            "multiple_accounts/",
            "devices/ndx/",
            "notifications/badge/",
            "banyan/",
            "media/blocked/",
            "qp/get_cooldowns/",
            "loom/fetch_config/",
            "scores/bootstrap/users/",
            "attribution/log_attribution/",
            "notifications/store_client_push_permissions/",
            "accounts/process_contact_point_signals/",
            "accounts/get_prefill_candidates/",
            "accounts/contact_point_prefill/",
            "accounts/logout/",
        ] {
            mock.on_json(fragment, r#"{"status":"ok"}"#);
        }
    }

    #[tokio::test]
    async fn test_login_reaches_ready() {
        let mock = Arc::new(MockTransport::new());
        mock_login_routes(&mock);
        let insta = Instagram::with_transport("alice", "hunter2", ClientSettings::default(), mock.clone());
        insta.set_uuid("u-1").await;

        let report = insta.login().await.unwrap();

        assert_eq!(insta.phase().await, Phase::Ready);
        assert!(!insta.state.read().await.has_password());
        assert_eq!(insta.rank_token().await.as_deref(), Some("42_u-1"));
        assert_eq!(insta.state.read().await.xmid_expiry, 1700003600);
        assert_eq!(
            insta.header_option("Authorization").await.as_deref(),
            Some("Bearer IGT:2:token")
        );
        assert!(report.advisory_failures.is_empty());

        let login = mock
            .requests()
            .into_iter()
            .find(|r| r.url.contains("accounts/login/"))
            .unwrap();
        let body = String::from_utf8(login.body).unwrap();
        assert!(body.starts_with("signed_body=SIGNATURE."));
        assert!(body.contains("PWD_INSTAGRAM"));
        assert!(!body.contains("hunter2"));
    }

    #[tokio::test]
    async fn test_pre_login_headers() {
        let mock = Arc::new(MockTransport::new());
        mock_login_routes(&mock);
        let insta = Instagram::with_transport("alice", "pw", ClientSettings::default(), mock.clone());
        insta.login().await.unwrap();

        let requests = mock.requests();
        let zr = &requests[0];
        assert!(zr.url.contains("zr/token/result/"));
        assert!(zr.header("X-Pigeon-Session-Id").is_none());
        assert!(zr.header("X-Ig-App-Locale").is_none());

        let pre_sync = &requests[1];
        assert!(pre_sync.url.contains("launcher/sync/"));
        assert!(pre_sync.header("Authorization").is_none());

        let sync_b = requests
            .iter()
            .find(|r| r.url.starts_with("https://b.i.instagram.com/"))
            .unwrap();
        assert!(sync_b.header("X-Pigeon-Session-Id").is_none());
        assert_eq!(sync_b.header("Authorization"), Some("Bearer IGT:2:token"));
        assert_eq!(mock.count_matching("launcher/sync/"), 3);
    }

    #[tokio::test]
    async fn test_missing_key_material_is_fatal() {
        let mock = Arc::new(MockTransport::new());
        mock.on_json("zr/token/result/", r#"{"token":{"ttl":1,"request_time":1}}"#);
        mock.on(
            "launcher/sync/",
            HttpResponse::new(200, "{}").with_header(HEADER_PUB_KEY_ID, "0"),
        );
        let insta = Instagram::with_transport("alice", "pw", ClientSettings::default(), mock.clone());

        assert!(matches!(insta.login().await, Err(Error::MissingKeyMaterial)));
        assert_eq!(mock.count_matching("accounts/login/"), 0);
        assert_eq!(insta.phase().await, Phase::Unauthenticated);
        assert!(insta.state.read().await.has_password());
    }

    #[tokio::test]
    async fn test_rejected_login_keeps_password() {
        let mock = Arc::new(MockTransport::new());
        mock.on(
            "accounts/login/",
            HttpResponse::new(400, r#"{"status":"fail","message":"bad_password"}"#),
        );
        mock_login_routes(&mock);
        let insta = Instagram::with_transport("alice", "pw", ClientSettings::default(), mock);

        match insta.login().await {
            Err(Error::Instagram { status, message }) => {
                assert_eq!(status, 400);
                assert_eq!(message, "bad_password");
            }
            other => panic!("unexpected: {:?}", other.map(|_| ())),
        }
        assert!(insta.state.read().await.has_password());
        assert_eq!(insta.phase().await, Phase::PreLogin);
    }

    #[tokio::test]
    async fn test_logout_clears_session() {
        let mock = Arc::new(MockTransport::new());
        mock.on(
            "accounts/login/",
            HttpResponse::new(200, r#"{"logged_in_user":{"pk":42,"username":"alice"}}"#)
                .with_header("set-cookie", "sessionid=s1; Domain=.instagram.com; Path=/")
                .with_header("ig-set-authorization", "Bearer IGT:2:token"),
        );
        mock_login_routes(&mock);
        let insta = Instagram::with_transport("alice", "pw", ClientSettings::default(), mock);
        insta.login().await.unwrap();
        assert!(!insta.cookie_pairs().await.unwrap().is_empty());

        insta.logout().await.unwrap();
        assert!(insta.cookie_pairs().await.unwrap().is_empty());
        assert!(!insta.is_logged_in().await);
        assert_eq!(insta.phase().await, Phase::Unauthenticated);
        assert!(insta.header_option("Authorization").await.is_none());
    }

    #[tokio::test]
    async fn test_second_login_needs_password() {
        let mock = Arc::new(MockTransport::new());
        mock_login_routes(&mock);
        let insta = Instagram::with_transport("alice", "pw", ClientSettings::default(), mock);
        insta.login().await.unwrap();
        assert!(matches!(insta.login().await, Err(Error::MissingConfig(_))));
    }

    fn restored(mock: Arc<MockTransport>, xmid_expiry: i64) -> Instagram {
        let blob: crate::session::SessionBlob = serde_json::from_value(json!({
            "id": 42, "user": "alice", "device_id": "android-1", "family_id": "f",
            "uuid": "u-1", "rank_token": "42_u-1", "token": "", "phone_id": "p",
            "xmid_expiry": xmid_expiry,
        }))
        .unwrap();
        Instagram::restore(blob, ClientSettings::default(), mock).unwrap()
    }

    #[tokio::test]
    async fn test_expired_xmid_is_refreshed() {
        let now = unix_seconds();
        let mock = Arc::new(MockTransport::new());
        mock.on_json(
            "zr/token/result/",
            &format!(r#"{{"token":{{"ttl":3600,"request_time":{}}},"status":"ok"}}"#, now),
        );
        let insta = restored(mock.clone(), now - 60);

        assert!(insta.refresh_zr_token().await.unwrap());
        assert_eq!(mock.count_matching("zr/token/result/"), 1);
        assert_eq!(insta.state.read().await.xmid_expiry, now + 3600);

        assert!(!insta.refresh_zr_token().await.unwrap());
        assert_eq!(mock.request_count(), 1);
    }

    #[tokio::test]
    async fn test_fresh_xmid_makes_no_request() {
        let mock = Arc::new(MockTransport::new());
        let insta = restored(mock.clone(), unix_seconds() + 3600);
        assert!(!insta.refresh_zr_token().await.unwrap());
        assert_eq!(mock.request_count(), 0);
    }
}
