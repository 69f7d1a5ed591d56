//! HTTP transport seam.
//!
//! The client builds fully formed [`HttpRequest`]s (headers, cookies, body) and
//! hands them to a [`Transport`]. The default transport is reqwest; tests and
//! proxies can swap in their own.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client, Method, Proxy};

use crate::error::{Error, Result};

/// Default request timeout.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// A fully prepared outgoing request.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl HttpRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: Method::GET,
            url: url.into(),
            headers: Vec::new(),
            body: Vec::new(),
        }
    }

    pub fn post(url: impl Into<String>, body: Vec<u8>) -> Self {
        Self {
            method: Method::POST,
            url: url.into(),
            headers: Vec::new(),
            body,
        }
    }

    /// First header with the given name (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// A buffered response.
#[derive(Debug, Clone, Default)]
pub struct HttpResponse {
    pub status: u16,
    /// Header names are stored lowercase.
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers
            .push((name.to_ascii_lowercase(), value.to_string()));
        self
    }

    /// First header with the given name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// All values of a repeated header, such as `set-cookie`.
    pub fn header_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.headers
            .iter()
            .filter(move |(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Executes prepared requests.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse>;
}

/// Proxy settings for [`ReqwestTransport`].
#[derive(Debug, Clone, Default)]
pub struct ProxySettings {
    pub url: String,
    /// Skip TLS certificate verification (intercepting proxies).
    pub insecure: bool,
    /// Allow HTTP/2; when false the client is pinned to HTTP/1.1.
    pub force_http2: bool,
}

/// Transport backed by a reqwest client.
///
/// Cookies are handled by the caller, so the client is built without a cookie
/// store and never follows redirects on its own.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Build a direct transport.
    pub fn new(timeout_secs: u64) -> Result<Self> {
        let client = Self::builder(timeout_secs)
            .build()
            .map_err(|e| Error::Api(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { client })
    }

    /// Build a transport that routes every request through a proxy.
    pub fn with_proxy(timeout_secs: u64, proxy: &ProxySettings) -> Result<Self> {
        let mut builder = Self::builder(timeout_secs)
            .no_proxy()
            .proxy(Proxy::all(&proxy.url)?)
            .danger_accept_invalid_certs(proxy.insecure);

        if !proxy.force_http2 {
            builder = builder.http1_only();
        }

        let client = builder
            .build()
            .map_err(|e| Error::Api(format!("Failed to create proxied HTTP client: {}", e)))?;
        Ok(Self { client })
    }

    fn builder(timeout_secs: u64) -> reqwest::ClientBuilder {
        Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .redirect(reqwest::redirect::Policy::none())
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
        let mut headers = header::HeaderMap::new();
        for (name, value) in &request.headers {
            let name = header::HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| Error::Api(format!("Invalid header name '{}': {}", name, e)))?;
            headers.append(name, header::HeaderValue::from_str(value)?);
        }

        let response = self
            .client
            .request(request.method, &request.url)
            .headers(headers)
            .body(request.body)
            .send()
            .await?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .map(|(k, v)| {
                (
                    k.as_str().to_ascii_lowercase(),
                    String::from_utf8_lossy(v.as_bytes()).into_owned(),
                )
            })
            .collect();
        let body = response.bytes().await?.to_vec();

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}


#[cfg(test)]
mod tests {
    use super::mock::MockTransport;
    use super::*;

    #[test]
    fn test_response_header_lookup() {
        let response = HttpResponse::new(200, "{}")
            .with_header("Set-Cookie", "a=1")
            .with_header("set-cookie", "b=2")
            .with_header("X-Thing", "yes");

        assert_eq!(response.header("x-thing"), Some("yes"));
        assert_eq!(
            response.header_all("set-cookie").collect::<Vec<_>>(),
            vec!["a=1", "b=2"]
        );
        assert!(response.is_success());
        assert!(!HttpResponse::new(404, "").is_success());
    }

    #[test]
    fn test_request_header_lookup() {
        let mut request = HttpRequest::get("https://example.com");
        request
            .headers
            .push(("User-Agent".to_string(), "test".to_string()));
        assert_eq!(request.header("user-agent"), Some("test"));
        assert_eq!(request.header("authorization"), None);
    }

    #[tokio::test]
    async fn test_mock_pops_then_repeats_last() {
        let mock = MockTransport::new();
        mock.on_json("feed/", r#"{"n":1}"#);
        mock.on_json("feed/", r#"{"n":2}"#);

        let first = mock.execute(HttpRequest::get("https://x/feed/")).await.unwrap();
        let second = mock.execute(HttpRequest::get("https://x/feed/")).await.unwrap();
        let third = mock.execute(HttpRequest::get("https://x/feed/")).await.unwrap();
        let missing = mock.execute(HttpRequest::get("https://x/other/")).await.unwrap();

        assert_eq!(first.text(), r#"{"n":1}"#);
        assert_eq!(second.text(), r#"{"n":2}"#);
        assert_eq!(third.text(), r#"{"n":2}"#);
        assert_eq!(missing.status, 404);
        assert_eq!(mock.request_count(), 4);
        assert_eq!(mock.count_matching("feed/"), 3);
    }

    #[test]
    fn test_reqwest_transport_builds() {
        assert!(ReqwestTransport::new(DEFAULT_TIMEOUT_SECS).is_ok());
        let proxy = ProxySettings {
            url: "http://127.0.0.1:8080".into(),
            insecure: true,
            force_http2: false,
        };
        assert!(ReqwestTransport::with_proxy(DEFAULT_TIMEOUT_SECS, &proxy).is_ok());
    }
}
