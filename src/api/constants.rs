//! Hosts, endpoints and the fixed client identity.
//!
//! Everything here mirrors one specific Android build of the official app.
//! The server checks several of these values together, so bump them as a set.

/// Root host, used for rupload endpoints.
pub const BASE_URL: &str = "https://i.instagram.com/";

/// Primary API surface.
pub const API_URL: &str = "https://i.instagram.com/api/v1/";

/// Secondary API surface used by post-login sync.
pub const API_URL_B: &str = "https://b.i.instagram.com/api/v1/";

/// Cookie domain used for persisted cookies.
pub const COOKIE_DOMAIN: &str = ".instagram.com";

pub const APP_VERSION: &str = "195.0.0.31.123";
pub const APP_VERSION_CODE: &str = "302733750";
pub const BLOKS_VERSION_ID: &str =
    "927f06374b80864ae6a0b04757048065714dc50ff15d2b8b3de8d0b6de961649";
pub const FB_ANALYTICS_ID: &str = "567067343352427";
pub const CAPABILITIES: &str = "3brTvx0=";
pub const CONNECTION_TYPE: &str = "WIFI";
pub const DEFAULT_LOCALE: &str = "en_US";
pub const DEFAULT_COUNTRY: &str = "US";

/// Android device the client pretends to be.
#[derive(Debug, Clone, Copy)]
pub struct DeviceSettings {
    pub manufacturer: &'static str,
    pub model: &'static str,
    pub device: &'static str,
    pub cpu: &'static str,
    pub android_version: u32,
    pub android_release: &'static str,
    pub screen_dpi: &'static str,
    pub screen_resolution: &'static str,
}

pub const DEVICE: DeviceSettings = DeviceSettings {
    manufacturer: "OnePlus",
    model: "ONEPLUS A3003",
    device: "OnePlus3",
    cpu: "qcom",
    android_version: 28,
    android_release: "9.0",
    screen_dpi: "420dpi",
    screen_resolution: "1080x1920",
};

/// Build the user agent string for the given locale.
pub fn user_agent(locale: &str) -> String {
    format!(
        "Instagram {} Android ({}/{}; {}; {}; {}; {}; {}; {}; {}; {})",
        APP_VERSION,
        DEVICE.android_version,
        DEVICE.android_release,
        DEVICE.screen_dpi,
        DEVICE.screen_resolution,
        DEVICE.manufacturer,
        DEVICE.model,
        DEVICE.device,
        DEVICE.cpu,
        locale,
        APP_VERSION_CODE
    )
}

// Pre-login
pub const URL_ZR_TOKEN: &str = "zr/token/result/";
pub const URL_SYNC: &str = "launcher/sync/";
pub const URL_GET_PREFILL: &str = "accounts/get_prefill_candidates/";
pub const URL_CONTACT_PREFILL: &str = "accounts/contact_point_prefill/";
pub const URL_LOGIN: &str = "accounts/login/";
pub const URL_LOGOUT: &str = "accounts/logout/";

// Post-login warm-up
pub const URL_ACCOUNT_FAMILY: &str = "multiple_accounts/get_account_family/";
pub const URL_NDX_STEPS: &str = "devices/ndx/api/async_get_ndx_ig_steps/";
pub const URL_NOTIF_BADGE: &str = "notifications/badge/";
pub const URL_BANYAN: &str = "banyan/banyan/";
pub const URL_MEDIA_BLOCKED: &str = "media/blocked/";
pub const URL_COOLDOWNS: &str = "qp/get_cooldowns/";
pub const URL_FETCH_CONFIG: &str = "loom/fetch_config/";
pub const URL_SCORES_BOOTSTRAP_USERS: &str = "scores/bootstrap/users/";
pub const URL_LOG_ATTRIBUTION: &str = "attribution/log_attribution/";
pub const URL_STORE_PUSH_PERMISSIONS: &str = "notifications/store_client_push_permissions/";
pub const URL_CONTACT_POINT_SIGNALS: &str = "accounts/process_contact_point_signals/";

// Feeds
pub const URL_TIMELINE: &str = "feed/timeline/";
pub const URL_ACTIVITY: &str = "news/inbox/";
pub const URL_INBOX: &str = "direct_v2/inbox/";
pub const URL_DISCOVER: &str = "discover/topical_explore/";
pub const URL_SAVED: &str = "feed/saved/posts/";
pub const URL_CURRENT_USER: &str = "accounts/current_user/";
pub const URL_REEL_MEDIA: &str = "feed/reels_media/";

/// `feed/user/{id}/`
pub fn url_user_feed(user_id: i64) -> String {
    format!("feed/user/{}/", user_id)
}

/// `feed/user/{id}/reel_media/`
pub fn url_user_stories(user_id: i64) -> String {
    format!("feed/user/{}/reel_media/", user_id)
}

// Media actions, all keyed by media id
pub fn url_media_info(id: &str) -> String {
    format!("media/{}/info/", id)
}

pub fn url_media_action(id: &str, action: &str) -> String {
    format!("media/{}/{}/", id, action)
}

pub fn url_comment_add(pk: i64) -> String {
    format!("media/{}/comment/", pk)
}

pub const URL_REPLY_STORY: &str = "direct_v2/threads/broadcast/reel_share/";

// Uploads
pub const URL_RUPLOAD_PHOTO: &str = "rupload_igphoto/";
pub const URL_RUPLOAD_VIDEO: &str = "rupload_igvideo/";
pub const URL_CONFIGURE: &str = "media/configure/";
pub const URL_CONFIGURE_SIDECAR: &str = "media/configure_sidecar/";

// Response headers carrying password key material
pub const HEADER_PUB_KEY: &str = "ig-set-password-encryption-pub-key";
pub const HEADER_PUB_KEY_ID: &str = "ig-set-password-encryption-key-id";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_agent_mentions_build() {
        let ua = user_agent("en_US");
        assert!(ua.starts_with("Instagram 195.0.0.31.123 Android (28/9.0;"));
        assert!(ua.ends_with("en_US; 302733750)"));
    }

    #[test]
    fn test_media_urls() {
        assert_eq!(url_media_action("1_2", "like"), "media/1_2/like/");
        assert_eq!(url_user_feed(42), "feed/user/42/");
    }
}
