//! Video posts.

use serde_json::{json, Map, Value};
use tokio::io::AsyncRead;

use crate::api::auth::random_entity_number;
use crate::api::constants::{URL_CONFIGURE, URL_RUPLOAD_PHOTO, URL_RUPLOAD_VIDEO};
use crate::api::types::ConfigureResponse;
use crate::api::Instagram;
use crate::error::Result;
use crate::media::Item;
use crate::upload::{exif_now, next_upload_id, read_all, Rupload};

impl Instagram {
    /// Publish a video with its cover thumbnail.
    ///
    /// The video and the JPEG thumbnail share one upload id and entity name.
    pub async fn upload_video<V, T>(
        &self,
        video: V,
        title: &str,
        caption: &str,
        thumbnail: T,
    ) -> Result<Item>
    where
        V: AsyncRead + Unpin + Send,
        T: AsyncRead + Unpin + Send,
    {
        self.require_account().await?;
        let video = read_all(video).await?;
        let thumbnail = read_all(thumbnail).await?;

        let upload_id = next_upload_id(None).to_string();
        let name = format!("igtv_{}", random_entity_number());

        self.rupload(Rupload {
            endpoint: URL_RUPLOAD_VIDEO,
            name: name.clone(),
            content_type: "video/mp4",
            params: json!({
                "media_type": "2",
                "video_format": "video/mp4",
                "upload_id": upload_id,
            }),
            bytes: video,
        })
        .await?;

        self.rupload(Rupload {
            endpoint: URL_RUPLOAD_PHOTO,
            name,
            content_type: "image/jpeg",
            params: json!({
                "media_type": "2",
                "upload_id": upload_id,
                "upload_media_height": "240",
                "upload_media_width": "320",
            }),
            bytes: thumbnail,
        })
        .await?;

        let mut config = Map::new();
        config.insert("caption".into(), Value::from(caption));
        config.insert("upload_id".into(), Value::from(upload_id));
        config.insert("device_id".into(), Value::from(self.device_id().await));
        config.insert("source_type".into(), Value::from(4));
        config.insert("date_time_original".into(), Value::from(exif_now()));
        if !title.is_empty() {
            config.insert("title".into(), Value::from(title));
        }

        let response: ConfigureResponse = self.configure(URL_CONFIGURE, config).await?;
        tracing::info!("Posted video {}", response.media.id);
        Ok(response.media)
    }
}
