//! Carousel (sidecar) posts.

use serde_json::{Map, Value};
use tokio::io::AsyncRead;

use crate::api::constants::URL_CONFIGURE_SIDECAR;
use crate::api::types::SidecarResponse;
use crate::api::Instagram;
use crate::error::{Error, Result};
use crate::media::Item;
use crate::upload::photo::post_photo;
use crate::upload::{next_upload_id, read_all};

impl Instagram {
    /// Publish several photos as one carousel post.
    ///
    /// Photos are uploaded one after another, each under its own upload id,
    /// then tied together by a single sidecar configure call.
    pub async fn upload_album<R>(
        &self,
        photos: Vec<R>,
        caption: &str,
        quality: u8,
        filter_type: i32,
    ) -> Result<Item>
    where
        R: AsyncRead + Unpin + Send,
    {
        if photos.len() < 2 {
            return Err(Error::Media(format!(
                "an album needs at least two photos, got {}",
                photos.len()
            )));
        }
        self.require_account().await?;

        let mut children = Vec::with_capacity(photos.len());
        let mut last_id = None;
        for photo in photos {
            let bytes = read_all(photo).await?;
            let upload_id = next_upload_id(last_id);
            last_id = Some(upload_id);

            let child = post_photo(self, bytes, upload_id, caption, quality, filter_type).await?;
            children.push(Value::Object(child));
        }

        let mut config = Map::new();
        config.insert("caption".into(), Value::from(caption));
        config.insert(
            "client_sidecar_id".into(),
            Value::from(next_upload_id(last_id)),
        );
        config.insert("children_metadata".into(), Value::Array(children));

        let response: SidecarResponse = self.configure(URL_CONFIGURE_SIDECAR, config).await?;
        tracing::info!(
            "Posted album {} ({} children)",
            response.media.id,
            response.media.carousel_media.len()
        );
        Ok(response.media)
    }
}
