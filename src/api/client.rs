//! Instagram private API client.

use std::collections::BTreeMap;
use std::sync::Arc;

use reqwest::cookie::{CookieStore, Jar};
use reqwest::header::HeaderValue;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tokio::sync::RwLock;
use url::Url;

use crate::api::auth::{signed_form, PlaceholderSigner, RequestSigner};
use crate::api::constants::{
    self, user_agent, API_URL, API_URL_B, COOKIE_DOMAIN, DEFAULT_LOCALE,
};
use crate::api::headers::{build_headers, capture_header_options, HeaderContext};
use crate::api::transport::{
    HttpRequest, HttpResponse, ProxySettings, ReqwestTransport, Transport, DEFAULT_TIMEOUT_SECS,
};
use crate::api::types::StatusResponse;
use crate::error::{Error, Result};
use crate::media::FeedMedia;
use crate::models::Account;
use crate::session::{Phase, SessionState};

/// Receives advisory failures: a short context string and the error.
pub type ErrorHandler = Arc<dyn Fn(&str, &Error) + Send + Sync>;

/// Handler used until one is set: log and carry on.
pub fn default_error_handler() -> ErrorHandler {
    Arc::new(|context, err| tracing::warn!("{}: {}", context, err))
}

/// Device presentation knobs that do not change over a session.
#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub locale: String,
    pub user_agent: String,
    pub timezone_offset: i32,
    pub timeout_secs: u64,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            locale: DEFAULT_LOCALE.to_string(),
            user_agent: user_agent(DEFAULT_LOCALE),
            timezone_offset: 0,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// Options for a single API call.
#[derive(Debug, Clone, Default)]
pub struct ReqOptions {
    /// Path relative to the API root, e.g. `feed/timeline/`.
    pub endpoint: String,
    /// Query pairs for GET, form fields for POST.
    pub query: BTreeMap<String, String>,
    pub is_post: bool,
    /// Target the `b.` host.
    pub use_b: bool,
    /// Header names to drop from the fixed set.
    pub ignore_headers: &'static [&'static str],
    pub extra_headers: Vec<(String, String)>,
}

impl ReqOptions {
    pub fn get(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            ..Default::default()
        }
    }

    pub fn post(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            is_post: true,
            ..Default::default()
        }
    }

    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(key.into(), value.into());
        self
    }

    pub fn form(mut self, fields: BTreeMap<String, String>) -> Self {
        self.query.extend(fields);
        self
    }

    pub fn ignore(mut self, headers: &'static [&'static str]) -> Self {
        self.ignore_headers = headers;
        self
    }

    pub fn use_b(mut self) -> Self {
        self.use_b = true;
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_headers.push((name.into(), value.into()));
        self
    }
}

/// Client for the Instagram private mobile API.
///
/// Mutable session state lives behind locks so a single client can be shared
/// by reference. Cursors and items never hold on to the client; their network
/// operations take `&Instagram` instead.
pub struct Instagram {
    transport: Arc<dyn Transport>,
    signer: Arc<dyn RequestSigner>,
    cookies: RwLock<Arc<Jar>>,
    pub(crate) state: RwLock<SessionState>,
    settings: ClientSettings,
    error_handler: ErrorHandler,
}

impl Instagram {
    /// Create a client for the given credentials with default settings.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Result<Self> {
        Self::with_settings(username, password, ClientSettings::default())
    }

    /// Create a client with explicit device settings.
    pub fn with_settings(
        username: impl Into<String>,
        password: impl Into<String>,
        settings: ClientSettings,
    ) -> Result<Self> {
        let transport = Arc::new(ReqwestTransport::new(settings.timeout_secs)?);
        Ok(Self::with_transport(username, password, settings, transport))
    }

    /// Create a client on top of a custom transport.
    pub fn with_transport(
        username: impl Into<String>,
        password: impl Into<String>,
        settings: ClientSettings,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self::from_parts(
            SessionState::new(username.into(), password.into()),
            settings,
            transport,
            Arc::new(Jar::default()),
        )
    }

    /// Assemble a client around existing state, as a session import does.
    pub(crate) fn from_parts(
        state: SessionState,
        settings: ClientSettings,
        transport: Arc<dyn Transport>,
        jar: Arc<Jar>,
    ) -> Self {
        Self {
            transport,
            signer: Arc::new(PlaceholderSigner),
            cookies: RwLock::new(jar),
            state: RwLock::new(state),
            settings,
            error_handler: default_error_handler(),
        }
    }

    // Setup

    pub fn set_transport(&mut self, transport: Arc<dyn Transport>) {
        self.transport = transport;
    }

    /// Route all traffic through a proxy.
    pub fn set_proxy(&mut self, url: &str, insecure: bool, force_http2: bool) -> Result<()> {
        Url::parse(url)?;
        let proxy = ProxySettings {
            url: url.to_string(),
            insecure,
            force_http2,
        };
        self.transport = Arc::new(ReqwestTransport::with_proxy(
            self.settings.timeout_secs,
            &proxy,
        )?);
        tracing::debug!("Proxy set to {}", url);
        Ok(())
    }

    /// Go back to a direct connection.
    pub fn unset_proxy(&mut self) -> Result<()> {
        self.transport = Arc::new(ReqwestTransport::new(self.settings.timeout_secs)?);
        Ok(())
    }

    pub fn set_signer(&mut self, signer: Arc<dyn RequestSigner>) {
        self.signer = signer;
    }

    pub fn set_error_handler<F>(&mut self, handler: F)
    where
        F: Fn(&str, &Error) + Send + Sync + 'static,
    {
        self.error_handler = Arc::new(handler);
    }

    pub async fn set_device_id(&self, id: impl Into<String>) {
        self.state.write().await.device_id = id.into();
    }

    pub async fn set_uuid(&self, uuid: impl Into<String>) {
        self.state.write().await.uuid = uuid.into();
    }

    pub async fn set_phone_id(&self, id: impl Into<String>) {
        self.state.write().await.phone_id = id.into();
    }

    /// Swap the cookie jar, carrying the current API cookies over.
    pub async fn set_cookie_jar(&self, jar: Arc<Jar>) -> Result<()> {
        let url = Url::parse(API_URL)?;
        for (name, value) in self.cookie_pairs().await? {
            jar.add_cookie_str(&cookie_string(&name, &value), &url);
        }
        *self.cookies.write().await = jar;
        Ok(())
    }

    pub async fn cookie_jar(&self) -> Arc<Jar> {
        self.cookies.read().await.clone()
    }

    pub(crate) async fn clear_cookies(&self) {
        *self.cookies.write().await = Arc::new(Jar::default());
    }

    /// Name/value pairs the jar would send to the API host.
    pub async fn cookie_pairs(&self) -> Result<Vec<(String, String)>> {
        self.cookie_pairs_for(API_URL).await
    }

    /// Name/value pairs the jar would send to `base`.
    pub(crate) async fn cookie_pairs_for(&self, base: &str) -> Result<Vec<(String, String)>> {
        let url = Url::parse(base)?;
        let jar = self.cookie_jar().await;
        let header = match jar.cookies(&url) {
            Some(header) => header,
            None => return Ok(Vec::new()),
        };
        let header = header
            .to_str()
            .map_err(|e| Error::Api(format!("Unreadable cookie header: {}", e)))?;

        Ok(header
            .split("; ")
            .filter_map(|pair| pair.split_once('='))
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect())
    }

    pub(crate) async fn add_cookie(&self, name: &str, value: &str) -> Result<()> {
        let url = Url::parse(API_URL)?;
        self.cookie_jar()
            .await
            .add_cookie_str(&cookie_string(name, value), &url);
        Ok(())
    }

    // Accessors

    pub fn settings(&self) -> &ClientSettings {
        &self.settings
    }

    pub async fn username(&self) -> String {
        self.state.read().await.username.clone()
    }

    pub async fn account(&self) -> Option<Account> {
        self.state.read().await.account.clone()
    }

    pub async fn phase(&self) -> Phase {
        self.state.read().await.phase
    }

    pub async fn is_logged_in(&self) -> bool {
        self.state.read().await.account.is_some()
    }

    pub async fn rank_token(&self) -> Option<String> {
        self.state.read().await.rank_token.clone()
    }

    pub async fn device_id(&self) -> String {
        self.state.read().await.device_id.clone()
    }

    pub async fn uuid(&self) -> String {
        self.state.read().await.uuid.clone()
    }

    pub async fn header_option(&self, name: &str) -> Option<String> {
        self.state.read().await.header_options.get(name).cloned()
    }

    pub(crate) async fn require_account(&self) -> Result<Account> {
        self.account()
            .await
            .ok_or_else(|| Error::NotLoggedIn("no account on this session".into()))
    }

    /// Forward an advisory failure to the error handler.
    pub(crate) fn report(&self, context: &str, err: &Error) {
        (self.error_handler)(context, err);
    }

    // Request building

    /// Add `_uuid`, `device_id` and, once logged in, `_uid` to a payload and
    /// serialize it compactly.
    pub(crate) async fn prepare_data(&self, data: Value) -> Result<String> {
        let mut data = match data {
            Value::Object(map) => map,
            _ => Map::new(),
        };

        let state = self.state.read().await;
        data.insert("_uuid".into(), Value::String(state.uuid.clone()));
        data.insert("device_id".into(), Value::String(state.device_id.clone()));
        if let Some(id) = state.account_id() {
            data.entry("_uid")
                .or_insert_with(|| Value::String(id.to_string()));
        }

        Ok(serde_json::to_string(&Value::Object(data))?)
    }

    /// Plain form fields with the same identity fields `prepare_data` adds.
    pub(crate) async fn prepare_query(
        &self,
        mut query: BTreeMap<String, String>,
    ) -> BTreeMap<String, String> {
        let state = self.state.read().await;
        query.insert("_uuid".into(), state.uuid.clone());
        query.insert("device_id".into(), state.device_id.clone());
        if let Some(id) = state.account_id() {
            query.entry("_uid".into()).or_insert_with(|| id.to_string());
        }
        query
    }

    /// Wrap an already serialized payload in `signed_body`.
    pub(crate) fn sign(&self, payload: &str) -> BTreeMap<String, String> {
        signed_form(self.signer.as_ref(), payload)
    }

    /// `prepare_data` followed by `sign`.
    pub(crate) async fn signed_data(&self, data: Value) -> Result<BTreeMap<String, String>> {
        let payload = self.prepare_data(data).await?;
        Ok(self.sign(&payload))
    }

    async fn api_headers(&self, ignore: &[&str]) -> Vec<(String, String)> {
        let state = self.state.read().await;
        let ctx = HeaderContext {
            user_agent: &self.settings.user_agent,
            locale: &self.settings.locale,
            timezone_offset: self.settings.timezone_offset,
            uuid: &state.uuid,
            device_id: &state.device_id,
            family_id: &state.family_id,
            pigeon_session_id: &state.pigeon_session_id,
            header_options: &state.header_options,
        };
        build_headers(&ctx, ignore)
    }

    /// Send an API call and return the successful response.
    pub async fn send_request(&self, opts: ReqOptions) -> Result<HttpResponse> {
        let base = if opts.use_b {
            API_URL_B
        } else {
            API_URL
        };
        let mut url = Url::parse(base)?.join(&opts.endpoint)?;

        let mut headers = self.api_headers(opts.ignore_headers).await;

        let request = if opts.is_post {
            let body = url::form_urlencoded::Serializer::new(String::new())
                .extend_pairs(&opts.query)
                .finish();
            headers.push((
                "Content-Type".into(),
                "application/x-www-form-urlencoded; charset=UTF-8".into(),
            ));
            HttpRequest::post(url.as_str(), body.into_bytes())
        } else {
            if !opts.query.is_empty() {
                url.query_pairs_mut().extend_pairs(&opts.query);
            }
            HttpRequest::get(url.as_str())
        };

        let mut request = request;
        headers.extend(opts.extra_headers);
        request.headers = headers;

        tracing::debug!("{} {}", request.method, request.url);
        let response = self.execute(request).await?;
        check_status(response)
    }

    /// Send an API call and decode its JSON body.
    pub async fn request_json<T: DeserializeOwned>(&self, opts: ReqOptions) -> Result<T> {
        let endpoint = opts.endpoint.clone();
        let response = self.send_request(opts).await?;
        serde_json::from_slice(&response.body).map_err(|e| {
            tracing::debug!(
                "Failed to parse {} response: {} - Response: {}",
                endpoint,
                e,
                response.text()
            );
            Error::Json(e)
        })
    }

    /// GET an endpoint with no parameters and return the raw body.
    pub async fn send_simple_request(&self, endpoint: &str) -> Result<Vec<u8>> {
        Ok(self.send_request(ReqOptions::get(endpoint)).await?.body)
    }

    /// Run a prepared request through the transport.
    ///
    /// Attaches the jar's cookies, stores any `set-cookie` values and learns
    /// header options from the response. Status codes are not checked here.
    pub async fn execute(&self, mut request: HttpRequest) -> Result<HttpResponse> {
        let url = Url::parse(&request.url)?;
        let jar = self.cookie_jar().await;

        if let Some(cookie) = jar.cookies(&url) {
            if let Ok(cookie) = cookie.to_str() {
                request.headers.push(("Cookie".into(), cookie.to_string()));
            }
        }

        let response = self.transport.execute(request).await?;
        tracing::debug!("Response status: {}", response.status);

        let set_cookies: Vec<HeaderValue> = response
            .header_all("set-cookie")
            .filter_map(|v| HeaderValue::from_str(v).ok())
            .collect();
        if !set_cookies.is_empty() {
            jar.set_cookies(&mut set_cookies.iter(), &url);
        }

        capture_header_options(&response, &mut self.state.write().await.header_options);

        Ok(response)
    }

    /// Fetch an arbitrary URL (media CDN) with the client's identity.
    pub async fn fetch_url(&self, url: &str) -> Result<Vec<u8>> {
        let mut request = HttpRequest::get(url);
        request
            .headers
            .push(("User-Agent".into(), self.settings.user_agent.clone()));
        let response = check_status(self.execute(request).await?)?;
        Ok(response.body)
    }

    /// Fetch a single media item by id.
    pub async fn get_media(&self, id: impl Into<String>) -> Result<FeedMedia> {
        let mut media = FeedMedia::for_media(id);
        media.sync(self).await?;
        Ok(media)
    }

    /// Refresh the logged-in account from the current-user endpoint.
    pub async fn sync_account(&self) -> Result<Account> {
        self.require_account().await?;
        let response: crate::api::types::CurrentUserResponse = self
            .request_json(ReqOptions::get(constants::URL_CURRENT_USER).query("edit", "true"))
            .await?;

        let account = response.user;
        self.state.write().await.set_account(account.clone());
        Ok(account)
    }
}

/// Map non-2xx responses to errors, keeping the server message when present.
pub(crate) fn check_status(response: HttpResponse) -> Result<HttpResponse> {
    if response.status == 429 {
        return Err(Error::RateLimited);
    }
    if !response.is_success() {
        let message = serde_json::from_slice::<StatusResponse>(&response.body)
            .ok()
            .and_then(|r| r.message)
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| response.text());
        tracing::debug!("HTTP {} error: {}", response.status, message);
        return Err(Error::Instagram {
            status: response.status,
            message,
        });
    }
    Ok(response)
}

fn cookie_string(name: &str, value: &str) -> String {
    format!("{}={}; Domain={}; Path=/", name, value, COOKIE_DOMAIN)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::transport::mock::MockTransport;
    use serde_json::json;
    use std::sync::Mutex;

    fn client(mock: Arc<MockTransport>) -> Instagram {
        Instagram::with_transport("alice", "secret", ClientSettings::default(), mock)
    }

    #[tokio::test]
    async fn test_get_encodes_query_and_fixed_headers() {
        let mock = Arc::new(MockTransport::new());
        mock.on_json("feed/thing/", r#"{"status":"ok"}"#);
        let insta = client(mock.clone());

        insta
            .send_request(ReqOptions::get("feed/thing/").query("max_id", "a b"))
            .await
            .unwrap();

        let request = &mock.requests()[0];
        assert_eq!(request.method, reqwest::Method::GET);
        assert_eq!(
            request.url,
            "https://i.instagram.com/api/v1/feed/thing/?max_id=a+b"
        );
        assert!(request.header("User-Agent").unwrap().starts_with("Instagram "));
        assert_eq!(request.header("X-Ig-Www-Claim"), Some("0"));
        assert!(request.body.is_empty());
    }

    #[tokio::test]
    async fn test_post_goes_to_selected_host_as_form() {
        let mock = Arc::new(MockTransport::new());
        mock.on_json("launcher/sync/", r#"{"status":"ok"}"#);
        let insta = client(mock.clone());

        insta
            .send_request(
                ReqOptions::post("launcher/sync/")
                    .form(insta.sign("{}"))
                    .use_b(),
            )
            .await
            .unwrap();

        let request = &mock.requests()[0];
        assert!(request.url.starts_with("https://b.i.instagram.com/api/v1/"));
        assert_eq!(
            String::from_utf8(request.body.clone()).unwrap(),
            "signed_body=SIGNATURE.%7B%7D"
        );
        assert!(request
            .header("Content-Type")
            .unwrap()
            .starts_with("application/x-www-form-urlencoded"));
    }

    #[tokio::test]
    async fn test_error_statuses() {
        let mock = Arc::new(MockTransport::new());
        mock.on("limited/", HttpResponse::new(429, "{}"));
        mock.on(
            "bad/",
            HttpResponse::new(400, r#"{"status":"fail","message":"checkpoint_required"}"#),
        );
        let insta = client(mock);

        assert!(matches!(
            insta.send_simple_request("limited/").await,
            Err(Error::RateLimited)
        ));
        match insta.send_simple_request("bad/").await {
            Err(Error::Instagram { status, message }) => {
                assert_eq!(status, 400);
                assert_eq!(message, "checkpoint_required");
            }
            other => panic!("unexpected result: {:?}", other.map(|_| ())),
        }
    }

    #[tokio::test]
    async fn test_cookies_and_header_options_are_learned() {
        let mock = Arc::new(MockTransport::new());
        mock.on(
            "first/",
            HttpResponse::new(200, "{}")
                .with_header("set-cookie", "csrftoken=abc; Domain=.instagram.com; Path=/")
                .with_header("set-cookie", "mid=xyz; Domain=.instagram.com; Path=/")
                .with_header("ig-set-authorization", "Bearer IGT:2:t"),
        );
        mock.on_json("second/", "{}");
        let insta = client(mock.clone());

        insta.send_simple_request("first/").await.unwrap();
        insta.send_simple_request("second/").await.unwrap();

        let second = &mock.requests()[1];
        let cookie = second.header("Cookie").unwrap();
        assert!(cookie.contains("csrftoken=abc"));
        assert!(cookie.contains("mid=xyz"));
        assert_eq!(second.header("Authorization"), Some("Bearer IGT:2:t"));

        let mut pairs = insta.cookie_pairs().await.unwrap();
        pairs.sort();
        assert_eq!(
            pairs,
            vec![
                ("csrftoken".to_string(), "abc".to_string()),
                ("mid".to_string(), "xyz".to_string())
            ]
        );
    }

    #[tokio::test]
    async fn test_set_cookie_jar_carries_cookies() {
        let mock = Arc::new(MockTransport::new());
        let insta = client(mock);
        insta.add_cookie("sessionid", "s1").await.unwrap();

        let fresh = Arc::new(Jar::default());
        insta.set_cookie_jar(fresh.clone()).await.unwrap();

        let url = Url::parse(API_URL).unwrap();
        let header = fresh.cookies(&url).unwrap();
        assert_eq!(header.to_str().unwrap(), "sessionid=s1");
    }

    #[tokio::test]
    async fn test_prepare_data_adds_identity() {
        let mock = Arc::new(MockTransport::new());
        let insta = client(mock);
        insta.set_uuid("u-1").await;
        insta.set_device_id("android-1").await;

        let payload = insta
            .prepare_data(json!({"media_id": "1_2"}))
            .await
            .unwrap();
        let value: Value = serde_json::from_str(&payload).unwrap();
        assert_eq!(value["media_id"], "1_2");
        assert_eq!(value["_uuid"], "u-1");
        assert_eq!(value["device_id"], "android-1");
        assert!(value.get("_uid").is_none());

        insta
            .state
            .write()
            .await
            .set_account(Account::new(42, "alice"));
        let payload = insta.prepare_data(json!({})).await.unwrap();
        let value: Value = serde_json::from_str(&payload).unwrap();
        assert_eq!(value["_uid"], "42");
    }

    #[tokio::test]
    async fn test_custom_error_handler() {
        let mock = Arc::new(MockTransport::new());
        let mut insta = client(mock);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        insta.set_error_handler(move |context, err| {
            sink.lock().unwrap().push(format!("{}: {}", context, err));
        });

        insta.report("banyan", &Error::RateLimited);
        assert_eq!(seen.lock().unwrap().len(), 1);
        assert!(seen.lock().unwrap()[0].starts_with("banyan: "));
    }

    #[test]
    fn test_proxy_setters() {
        let mock = Arc::new(MockTransport::new());
        let mut insta = client(mock);
        assert!(insta.set_proxy("http://127.0.0.1:8888", true, false).is_ok());
        assert!(insta.set_proxy("not a url", false, false).is_err());
        assert!(insta.unset_proxy().is_ok());
    }
}
