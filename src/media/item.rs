//! Media item representation and per-item actions.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, TimeZone, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use serde_json::json;

use crate::api::auth::generate_uuid;
use crate::api::constants::{url_comment_add, url_media_action, URL_REPLY_STORY};
use crate::api::types::{lenient_i64, LikersResponse};
use crate::api::{Instagram, ReqOptions};
use crate::error::{Error, Result};
use crate::fs::{make_unique_filename, media_folder, sanitize_filename};
use crate::media::types::{
    best_rendition, Caption, Comment, Hashtag, Images, Location, PreviewComments, TopLikers,
    UserTags, Video,
};
use crate::models::User;

static HASHTAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"#\w+").expect("hashtag pattern is valid"));

/// Which kind of container an item was fetched through.
///
/// Comments on story items become direct replies, so the origin matters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MediaOrigin {
    #[default]
    Feed,
    Story,
    Saved,
}

/// Kind of file a download produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    /// Get the folder name for this media kind.
    pub fn folder_name(&self) -> &'static str {
        match self {
            MediaKind::Image => "images",
            MediaKind::Video => "videos",
        }
    }
}

/// Result of [`Item::download`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Downloaded {
    pub kind: MediaKind,
    pub path: PathBuf,
}

/// One post or story unit. Carousel children use the same type.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Item {
    pub id: String,
    #[serde(deserialize_with = "lenient_i64")]
    pub pk: i64,
    pub code: String,
    pub taken_at: i64,
    pub device_timestamp: i64,
    /// 1 photo, 2 video, 8 carousel.
    pub media_type: i32,
    pub product_type: String,
    pub filter_type: i32,
    pub client_cache_key: String,
    pub organic_tracking_token: String,

    pub user: User,
    pub caption: Option<Caption>,
    pub caption_is_edited: bool,

    pub carousel_parent_id: Option<String>,
    pub carousel_media: Vec<Item>,

    #[serde(rename = "like_count")]
    pub likes: i64,
    pub has_liked: bool,
    pub top_likers: Option<TopLikers>,
    pub likers: Vec<User>,

    pub comments_disabled: bool,
    pub comment_count: i64,
    pub has_more_comments: bool,
    pub preview_comments: Option<PreviewComments>,

    pub photo_of_you: bool,
    pub usertags: Option<UserTags>,
    pub can_viewer_save: bool,
    pub location: Option<Location>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,

    #[serde(rename = "image_versions2")]
    pub images: Option<Images>,
    pub original_width: u32,
    pub original_height: u32,

    #[serde(rename = "video_versions")]
    pub videos: Vec<Video>,
    pub has_audio: bool,
    pub video_duration: f64,
    pub view_count: f64,

    // Stories
    pub is_reel_media: bool,
    pub expiring_at: i64,
    pub audience: Option<String>,

    #[serde(skip)]
    pub origin: MediaOrigin,
}

impl Item {
    /// Record the container kind; carousel children also inherit the owner.
    pub(crate) fn attach(&mut self, origin: MediaOrigin) {
        self.origin = origin;
        for child in &mut self.carousel_media {
            child.user = self.user.clone();
            child.attach(origin);
        }
    }

    pub fn caption_text(&self) -> &str {
        self.caption.as_ref().map(|c| c.text.as_str()).unwrap_or("")
    }

    /// Usernames of top likers, whatever shape the server used.
    pub fn top_likers(&self) -> Vec<String> {
        self.top_likers
            .as_ref()
            .map(TopLikers::to_vec)
            .unwrap_or_default()
    }

    /// Preview comments as typed comments, in server order.
    pub fn preview_comments(&self) -> Vec<Comment> {
        self.preview_comments
            .as_ref()
            .map(PreviewComments::to_comments)
            .unwrap_or_default()
    }

    /// Hashtags from the caption, then from preview comments.
    pub fn hashtags(&self) -> Vec<Hashtag> {
        let mut tags: Vec<Hashtag> = HASHTAG
            .find_iter(self.caption_text())
            .map(|m| Hashtag {
                name: m.as_str()[1..].to_string(),
            })
            .collect();

        for comment in self.preview_comments() {
            tags.extend(HASHTAG.find_iter(&comment.text).map(|m| Hashtag {
                name: m.as_str()[1..].to_string(),
            }));
        }
        tags
    }

    /// URL of the largest image candidate.
    pub fn best_image(&self) -> Option<&str> {
        self.images
            .as_ref()
            .and_then(|images| best_rendition(&images.candidates))
    }

    /// URL of the largest video version.
    pub fn best_video(&self) -> Option<&str> {
        best_rendition(&self.videos)
    }

    pub fn media_type_name(&self) -> &'static str {
        match self.media_type {
            1 => "photo",
            2 => "video",
            8 => "carousel",
            _ => "",
        }
    }

    pub fn is_carousel(&self) -> bool {
        self.media_type == 8
    }

    /// True when a story was shared to close friends only.
    pub fn is_close_friends_story(&self) -> bool {
        self.audience.as_deref() == Some("besties")
    }

    pub fn taken_at_utc(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_opt(self.taken_at, 0).single()
    }

    pub fn url(&self) -> String {
        format!("https://www.instagram.com/p/{}/", self.code)
    }

    // Actions

    async fn media_action(&self, insta: &Instagram, action: &str) -> Result<()> {
        let form = insta.signed_data(json!({ "media_id": self.id })).await?;
        insta
            .send_request(ReqOptions::post(url_media_action(&self.id, action)).form(form))
            .await?;
        tracing::debug!("{} {}", action, self.id);
        Ok(())
    }

    pub async fn like(&self, insta: &Instagram) -> Result<()> {
        self.media_action(insta, "like").await
    }

    pub async fn unlike(&self, insta: &Instagram) -> Result<()> {
        self.media_action(insta, "unlike").await
    }

    pub async fn save(&self, insta: &Instagram) -> Result<()> {
        self.media_action(insta, "save").await
    }

    pub async fn unsave(&self, insta: &Instagram) -> Result<()> {
        self.media_action(insta, "unsave").await
    }

    /// Delete the item. Only works on the session's own media.
    pub async fn delete(&self, insta: &Instagram) -> Result<()> {
        self.media_action(insta, "delete").await
    }

    /// Comment on a post, or reply by direct message to a story item.
    pub async fn comment(&self, insta: &Instagram, text: &str) -> Result<()> {
        let opts = match self.origin {
            MediaOrigin::Story => {
                let mut fields = BTreeMap::new();
                fields.insert(
                    "recipient_users".to_string(),
                    format!("[[{}]]", self.user.id),
                );
                fields.insert("action".to_string(), "send_item".to_string());
                fields.insert("media_id".to_string(), self.id.clone());
                fields.insert("client_context".to_string(), generate_uuid());
                fields.insert("text".to_string(), text.to_string());
                fields.insert("entry".to_string(), "reel".to_string());
                fields.insert("reel_id".to_string(), self.user.id.to_string());

                ReqOptions::post(format!(
                    "{}?media_type={}",
                    URL_REPLY_STORY,
                    self.media_type_name()
                ))
                .form(insta.prepare_query(fields).await)
                .header("Connection", "keep-alive")
            }
            MediaOrigin::Feed | MediaOrigin::Saved => {
                let form = insta.signed_data(json!({ "comment_text": text })).await?;
                ReqOptions::post(url_comment_add(self.pk)).form(form)
            }
        };

        insta.send_request(opts).await?;
        Ok(())
    }

    /// Replace `likers` with the current list from the server.
    pub async fn sync_likers(&mut self, insta: &Instagram) -> Result<()> {
        let resp: LikersResponse = insta
            .request_json(ReqOptions::get(url_media_action(&self.id, "likers")))
            .await?;
        self.likers = resp.users;
        Ok(())
    }

    /// Download the best video, or failing that the best image.
    ///
    /// Files go to `folder/videos` or `folder/images`. Without a name the last
    /// URL segment is used; an existing file gets a numbered sibling.
    pub async fn download(
        &self,
        insta: &Instagram,
        folder: &Path,
        name: Option<&str>,
    ) -> Result<Downloaded> {
        let (kind, url) = match (self.best_video(), self.best_image()) {
            (Some(url), _) => (MediaKind::Video, url),
            (None, Some(url)) => (MediaKind::Image, url),
            (None, None) => {
                return Err(Error::Media(format!(
                    "item {} has no image or video",
                    self.id
                )))
            }
        };

        let dir = media_folder(folder, kind);
        tokio::fs::create_dir_all(&dir).await?;

        let filename = match name {
            Some(name) => sanitize_filename(name)?,
            None => sanitize_filename(&filename_from_url(url)?)?,
        };
        let path = make_unique_filename(&dir.join(filename));

        let bytes = insta.fetch_url(url).await?;
        tokio::fs::write(&path, &bytes).await?;
        tracing::info!("Downloaded {} ({} bytes)", path.display(), bytes.len());

        Ok(Downloaded { kind, path })
    }
}

fn filename_from_url(url: &str) -> Result<String> {
    let parsed = url::Url::parse(url)?;
    parsed
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .ok_or_else(|| Error::Media(format!("cannot derive a file name from {}", url)))
}
