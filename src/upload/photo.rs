//! Single photo posts.

use std::io::Cursor;

use image::ImageReader;
use serde_json::{json, Map, Value};
use tokio::io::AsyncRead;

use crate::api::auth::random_entity_number;
use crate::api::constants::{DEVICE, URL_CONFIGURE, URL_RUPLOAD_PHOTO};
use crate::api::types::ConfigureResponse;
use crate::api::Instagram;
use crate::error::Result;
use crate::media::Item;
use crate::upload::{device_map, exif_now, next_upload_id, read_all, Rupload};

/// Width and height of an encoded image.
pub fn image_dimensions(bytes: &[u8]) -> Result<(u32, u32)> {
    Ok(ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()?
        .into_dimensions()?)
}

/// Upload one photo and build its configure payload.
pub(crate) async fn post_photo(
    insta: &Instagram,
    bytes: Vec<u8>,
    upload_id: i64,
    caption: &str,
    quality: u8,
    filter_type: i32,
) -> Result<Map<String, Value>> {
    let (width, height) = image_dimensions(&bytes)?;
    let name = format!("{}_0_{}", upload_id, random_entity_number());
    let params = json!({
        "retry_context": "{\"num_step_auto_retry\": 0, \"num_reupload\": 0, \"num_step_manual_retry\": 0}",
        "media_type": "1",
        "upload_id": upload_id.to_string(),
        "xsharing_user_ids": "[]",
        "image_compression": format!(
            "{{\"lib_name\": \"moz\", \"lib_version\": \"3.1.m\", \"quality\": \"{}\"}}",
            quality
        ),
    });

    insta
        .rupload(Rupload {
            endpoint: URL_RUPLOAD_PHOTO,
            name,
            content_type: "application/octet-stream",
            params,
            bytes,
        })
        .await?;

    let now = exif_now();
    let config = json!({
        "media_folder": "Instagram",
        "source_type": 4,
        "caption": caption,
        "upload_id": upload_id.to_string(),
        "device_id": insta.device_id().await,
        "device": device_map(),
        "edits": {
            "crop_original_size": [width, height],
            "crop_center": [0.0, 0.0],
            "crop_zoom": 1.0,
            "filter_type": filter_type,
        },
        "extra": {
            "source_width": width,
            "source_height": height,
        },
        "height": height,
        "width": width,
        "camera_model": DEVICE.model,
        "scene_capture_type": "standard",
        "timezone_offset": "3600",
        "date_time_original": now,
        "date_time_digitalized": now,
        "software": "1",
    });

    Ok(serde_json::from_value(config)?)
}

impl Instagram {
    /// Publish a single photo and return the created post.
    ///
    /// `quality` is the JPEG quality reported to the server; `filter_type` is
    /// the app filter id (0 for none).
    pub async fn upload_photo<R>(
        &self,
        photo: R,
        caption: &str,
        quality: u8,
        filter_type: i32,
    ) -> Result<Item>
    where
        R: AsyncRead + Unpin + Send,
    {
        self.require_account().await?;
        let bytes = read_all(photo).await?;
        let upload_id = next_upload_id(None);

        let config = post_photo(self, bytes, upload_id, caption, quality, filter_type).await?;
        let response: ConfigureResponse = self.configure(URL_CONFIGURE, config).await?;
        tracing::info!("Posted photo {}", response.media.id);
        Ok(response.media)
    }
}
