//! Media publishing.
//!
//! Every upload is two calls: the raw bytes go to a `rupload_*` endpoint under
//! a fresh upload id, then a signed `configure` call turns the upload into a
//! post. Readers are buffered whole. Any failure aborts; nothing is resumed.

pub mod album;
pub mod photo;
pub mod video;

use chrono::Local;
use serde::de::DeserializeOwned;
use serde_json::{json, Map, Value};
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::api::auth::unix_millis;
use crate::api::client::check_status;
use crate::api::constants::{BASE_URL, DEVICE};
use crate::api::types::{ConfigureResponse, SidecarResponse, UploadResponse};
use crate::api::{HttpRequest, Instagram, ReqOptions};
use crate::error::{Error, Result};

/// Raw upload capability flags, distinct from the API set.
const UPLOAD_CAPABILITIES: &str = "3Q4=";

/// EXIF style timestamp used in configure payloads.
const EXIF_DATE_FORMAT: &str = "%Y:%m:%d %H:%M:%S";

/// One raw upload to a `rupload_*` endpoint.
pub(crate) struct Rupload {
    pub endpoint: &'static str,
    pub name: String,
    pub content_type: &'static str,
    pub params: Value,
    pub bytes: Vec<u8>,
}

impl Rupload {
    fn into_request(self, user_agent: &str) -> Result<HttpRequest> {
        let url = format!("{}{}{}", BASE_URL, self.endpoint, self.name);
        let length = self.bytes.len().to_string();
        let params = serde_json::to_string(&self.params)?;

        let mut request = HttpRequest::post(url, self.bytes);
        request.headers = vec![
            ("X-IG-Capabilities".into(), UPLOAD_CAPABILITIES.into()),
            ("X-IG-Connection-Type".into(), "WIFI".into()),
            ("Cookie2".into(), "$Version=1".into()),
            ("Accept-Language".into(), "en-US".into()),
            ("Content-Type".into(), self.content_type.into()),
            ("Connection".into(), "close".into()),
            ("User-Agent".into(), user_agent.to_string()),
            ("X-Entity-Name".into(), self.name),
            ("X-Entity-Length".into(), length),
            ("Offset".into(), "0".into()),
            ("X-Instagram-Rupload-Params".into(), params),
        ];
        Ok(request)
    }
}

impl Instagram {
    /// Send raw bytes and require an `ok` status back.
    pub(crate) async fn rupload(&self, upload: Rupload) -> Result<UploadResponse> {
        let name = upload.name.clone();
        let request = upload.into_request(&self.settings().user_agent)?;
        tracing::debug!("Uploading {} ({} bytes)", name, request.body.len());

        let response = check_status(self.execute(request).await?)?;
        let result: UploadResponse = serde_json::from_slice(&response.body)?;
        if result.status != "ok" {
            return Err(Error::Upload(format!(
                "{} returned status '{}'",
                name, result.status
            )));
        }
        Ok(result)
    }

    /// Sign a configure payload, post it and require an `ok` status.
    pub(crate) async fn configure<T>(&self, endpoint: &str, config: Map<String, Value>) -> Result<T>
    where
        T: DeserializeOwned + ConfigureStatus,
    {
        let form = self.signed_data(Value::Object(config)).await?;
        let result: T = self
            .request_json(ReqOptions::post(endpoint).form(form))
            .await?;
        if result.status() != "ok" {
            return Err(Error::Upload(format!(
                "{} returned status '{}'",
                endpoint,
                result.status()
            )));
        }
        Ok(result)
    }
}

/// Responses that carry a top-level `status`.
pub(crate) trait ConfigureStatus {
    fn status(&self) -> &str;
}

impl ConfigureStatus for ConfigureResponse {
    fn status(&self) -> &str {
        &self.status
    }
}

impl ConfigureStatus for SidecarResponse {
    fn status(&self) -> &str {
        &self.status
    }
}

/// Millisecond upload id, strictly after `previous` when given.
pub(crate) fn next_upload_id(previous: Option<i64>) -> i64 {
    let now = unix_millis();
    match previous {
        Some(prev) if now <= prev => prev + 1,
        _ => now,
    }
}

pub(crate) fn exif_now() -> String {
    Local::now().format(EXIF_DATE_FORMAT).to_string()
}

pub(crate) fn device_map() -> Value {
    json!({
        "manufacturer": DEVICE.manufacturer,
        "model": DEVICE.model,
        "android_version": DEVICE.android_version,
        "android_release": DEVICE.android_release,
    })
}

/// Buffer a reader completely.
pub(crate) async fn read_all<R: AsyncRead + Unpin>(mut reader: R) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes).await?;
    if bytes.is_empty() {
        return Err(Error::Media("empty upload".into()));
    }
    Ok(bytes)
}
