//! Fixed request header set and learned header options.

use std::collections::HashMap;

use crate::api::auth::raw_client_time;
use crate::api::constants::{
    BLOKS_VERSION_ID, CAPABILITIES, CONNECTION_TYPE, DEFAULT_COUNTRY, FB_ANALYTICS_ID,
    HEADER_PUB_KEY, HEADER_PUB_KEY_ID,
};
use crate::api::transport::HttpResponse;

/// Identity values that feed the header set.
#[derive(Debug, Clone, Copy)]
pub struct HeaderContext<'a> {
    pub user_agent: &'a str,
    pub locale: &'a str,
    pub timezone_offset: i32,
    pub uuid: &'a str,
    pub device_id: &'a str,
    pub family_id: &'a str,
    pub pigeon_session_id: &'a str,
    pub header_options: &'a HashMap<String, String>,
}

/// Headers the server rejects on the pre-login sync call.
pub const IGNORE_ON_PRELOGIN_SYNC: &[&str] = &["Authorization"];

/// Headers the server rejects on the zero-rating token call.
pub const IGNORE_ON_ZR_TOKEN: &[&str] = &[
    "X-Pigeon-Session-Id",
    "X-Pigeon-Rawclienttime",
    "X-Ig-App-Locale",
    "X-Ig-Device-Locale",
    "X-Ig-Mapped-Locale",
    "X-Ig-App-Startup-Country",
];

/// Headers the server rejects on the post-login sync against the `b.` host.
pub const IGNORE_ON_SYNC_B: &[&str] = &["X-Pigeon-Session-Id", "X-Pigeon-Rawclienttime"];

/// Build the header set for an API call, minus the suppressed names.
pub fn build_headers(ctx: &HeaderContext<'_>, ignore: &[&str]) -> Vec<(String, String)> {
    let mut headers: Vec<(String, String)> = vec![
        ("User-Agent".into(), ctx.user_agent.to_string()),
        ("Accept-Language".into(), ctx.locale.replace('_', "-")),
        ("X-Ig-App-Locale".into(), ctx.locale.to_string()),
        ("X-Ig-Device-Locale".into(), ctx.locale.to_string()),
        ("X-Ig-Mapped-Locale".into(), ctx.locale.to_string()),
        ("X-Ig-App-Startup-Country".into(), DEFAULT_COUNTRY.to_string()),
        ("X-Ig-App-Id".into(), FB_ANALYTICS_ID.to_string()),
        ("X-Ig-Capabilities".into(), CAPABILITIES.to_string()),
        ("X-Ig-Connection-Type".into(), CONNECTION_TYPE.to_string()),
        ("X-Ig-Bandwidth-Speed-Kbps".into(), "-1.000".to_string()),
        ("X-Ig-Bandwidth-Totalbytes-B".into(), "0".to_string()),
        ("X-Ig-Bandwidth-Totaltime-Ms".into(), "0".to_string()),
        ("X-Bloks-Version-Id".into(), BLOKS_VERSION_ID.to_string()),
        ("X-Bloks-Is-Layout-Rtl".into(), "false".to_string()),
        ("X-Bloks-Is-Panorama-Enabled".into(), "true".to_string()),
        ("X-Ig-Device-Id".into(), ctx.uuid.to_string()),
        ("X-Ig-Android-Id".into(), ctx.device_id.to_string()),
        ("X-Ig-Family-Device-Id".into(), ctx.family_id.to_string()),
        ("X-Ig-Timezone-Offset".into(), ctx.timezone_offset.to_string()),
        ("X-Pigeon-Session-Id".into(), ctx.pigeon_session_id.to_string()),
        ("X-Pigeon-Rawclienttime".into(), raw_client_time()),
        ("X-Fb-Http-Engine".into(), "Liger".to_string()),
        ("X-Fb-Client-Ip".into(), "True".to_string()),
        ("X-Fb-Server-Cluster".into(), "True".to_string()),
    ];

    let mut options: Vec<_> = ctx.header_options.iter().collect();
    options.sort();
    for (name, value) in options {
        if value.is_empty() {
            continue;
        }
        headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        headers.push((name.clone(), value.clone()));
    }

    headers.retain(|(name, _)| !ignore.iter().any(|i| i.eq_ignore_ascii_case(name)));
    headers
}

/// Store `ig-set-*` response headers as header options for later requests.
///
/// `ig-set-authorization` becomes `Authorization`, `ig-set-x-mid` becomes
/// `X-Mid`, and `x-ig-set-www-claim` becomes `X-Ig-Www-Claim`. Empty values and
/// the password key pair are ignored.
pub fn capture_header_options(response: &HttpResponse, options: &mut HashMap<String, String>) {
    for (name, value) in &response.headers {
        let name = name.to_ascii_lowercase();
        if name == HEADER_PUB_KEY || name == HEADER_PUB_KEY_ID || value.is_empty() {
            continue;
        }

        let target = if name == "x-ig-set-www-claim" {
            "x-ig-www-claim"
        } else if let Some(rest) = name.strip_prefix("ig-set-") {
            rest
        } else {
            continue;
        };

        options.insert(canonical_header_name(target), value.clone());
    }
}

/// `x-ig-www-claim` -> `X-Ig-Www-Claim`
pub fn canonical_header_name(name: &str) -> String {
    name.split('-')
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join("-")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(options: &HashMap<String, String>) -> HeaderContext<'_> {
        HeaderContext {
            user_agent: "Instagram test",
            locale: "en_US",
            timezone_offset: 0,
            uuid: "uuid-1",
            device_id: "android-1",
            family_id: "family-1",
            pigeon_session_id: "UFS-1-0",
            header_options: options,
        }
    }

    fn has(headers: &[(String, String)], name: &str) -> bool {
        headers.iter().any(|(k, _)| k.eq_ignore_ascii_case(name))
    }

    #[test]
    fn test_fixed_headers_present() {
        let options = HashMap::new();
        let headers = build_headers(&ctx(&options), &[]);
        assert!(has(&headers, "User-Agent"));
        assert!(has(&headers, "X-Ig-Capabilities"));
        assert!(has(&headers, "X-Pigeon-Session-Id"));
        let lang = headers.iter().find(|(k, _)| k == "Accept-Language").unwrap();
        assert_eq!(lang.1, "en-US");
    }

    #[test]
    fn test_ignored_headers_dropped() {
        let mut options = HashMap::new();
        options.insert("Authorization".to_string(), "Bearer IGT:2:abc".to_string());

        let headers = build_headers(&ctx(&options), &[]);
        assert!(has(&headers, "Authorization"));

        let headers = build_headers(&ctx(&options), IGNORE_ON_PRELOGIN_SYNC);
        assert!(!has(&headers, "Authorization"));

        let headers = build_headers(&ctx(&options), IGNORE_ON_ZR_TOKEN);
        assert!(!has(&headers, "X-Pigeon-Session-Id"));
        assert!(!has(&headers, "x-ig-app-locale"));
        assert!(has(&headers, "User-Agent"));
    }

    #[test]
    fn test_header_options_override_defaults() {
        let mut options = HashMap::new();
        options.insert("X-Ig-Www-Claim".to_string(), "hmac.claim".to_string());
        options.insert("X-Mid".to_string(), String::new());

        let headers = build_headers(&ctx(&options), &[]);
        let claims: Vec<_> = headers.iter().filter(|(k, _)| k == "X-Ig-Www-Claim").collect();
        assert_eq!(claims.len(), 1);
        assert_eq!(claims[0].1, "hmac.claim");
        assert!(!has(&headers, "X-Mid"));
    }

    #[test]
    fn test_capture_header_options() {
        let response = HttpResponse::new(200, "{}")
            .with_header("ig-set-authorization", "Bearer IGT:2:token")
            .with_header("ig-set-x-mid", "mid123")
            .with_header("ig-set-ig-u-ds-user-id", "42")
            .with_header("x-ig-set-www-claim", "hmac.AR")
            .with_header(HEADER_PUB_KEY, "key")
            .with_header(HEADER_PUB_KEY_ID, "41")
            .with_header("ig-set-ig-u-rur", "")
            .with_header("content-type", "application/json");

        let mut options = HashMap::new();
        capture_header_options(&response, &mut options);

        assert_eq!(options.get("Authorization").unwrap(), "Bearer IGT:2:token");
        assert_eq!(options.get("X-Mid").unwrap(), "mid123");
        assert_eq!(options.get("Ig-U-Ds-User-Id").unwrap(), "42");
        assert_eq!(options.get("X-Ig-Www-Claim").unwrap(), "hmac.AR");
        assert_eq!(options.len(), 4);
    }

    #[test]
    fn test_canonical_header_name() {
        assert_eq!(canonical_header_name("authorization"), "Authorization");
        assert_eq!(canonical_header_name("x-ig-www-claim"), "X-Ig-Www-Claim");
    }
}
