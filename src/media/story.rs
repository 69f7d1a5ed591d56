//! A user's story reel.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use crate::api::constants::{url_media_action, url_user_stories, URL_REEL_MEDIA};
use crate::api::types::TrayResponse;
use crate::api::{Instagram, ReqOptions};
use crate::error::{Error, Result};
use crate::media::cursor::{PageState, Paginated};
use crate::media::item::{Item, MediaOrigin};
use crate::media::types::HasBestiesMedia;
use crate::models::User;

/// Reel id: numeric on user reels, a string such as `highlight:123` elsewhere.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ReelId {
    Int(i64),
    Str(String),
}

impl ReelId {
    pub fn as_string(&self) -> String {
        match self {
            ReelId::Int(n) => n.to_string(),
            ReelId::Str(s) => s.clone(),
        }
    }
}

/// Reel payload as the server sends it.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ReelPage {
    pub id: Option<ReelId>,
    pub media_count: i64,
    pub latest_reel_media: i64,
    pub expiring_at: f64,
    pub seen: f64,
    pub can_reply: bool,
    pub can_reshare: bool,
    pub reel_type: String,
    pub title: String,
    pub user: User,
    pub items: Vec<Item>,
    pub has_besties_media: Option<HasBestiesMedia>,
    pub has_video: bool,
    pub status: String,
}

/// Story items of one user. The server does not paginate reels, so one
/// successful `next` ends the list.
#[derive(Debug)]
pub struct StoryMedia {
    endpoint: String,
    user_id: i64,
    pub reel: ReelPage,
    page: PageState,
}

impl StoryMedia {
    pub fn for_user(user_id: i64) -> Self {
        Self {
            endpoint: url_user_stories(user_id),
            user_id,
            reel: ReelPage::default(),
            page: PageState::default(),
        }
    }

    pub fn user_id(&self) -> i64 {
        self.user_id
    }

    /// Reel id as a string, whichever shape the server used.
    pub fn id(&self) -> String {
        self.reel
            .id
            .as_ref()
            .map(ReelId::as_string)
            .unwrap_or_else(|| self.user_id.to_string())
    }

    pub fn items(&self) -> &[Item] {
        &self.reel.items
    }

    /// True when any item in the reel is close-friends only.
    pub fn has_besties_media(&self) -> bool {
        self.reel
            .has_besties_media
            .as_ref()
            .map(HasBestiesMedia::as_bool)
            .unwrap_or(false)
    }

    fn set_reel(&mut self, mut reel: ReelPage) {
        for item in &mut reel.items {
            item.attach(MediaOrigin::Story);
        }
        self.reel = reel;
    }

    /// Fetch the reel's items through the tray endpoint.
    pub async fn sync(&mut self, insta: &Instagram) -> Result<()> {
        let id = self.id();
        let capabilities = json!([
            {"name": "SUPPORTED_SDK_VERSIONS", "value": "100.0,101.0,102.0,103.0,104.0,105.0,106.0,107.0,108.0,109.0,110.0,111.0,112.0,113.0,114.0,115.0,116.0,117.0"},
            {"name": "FACE_TRACKER_VERSION", "value": "14"},
            {"name": "segmentation", "value": "segmentation_enabled"},
            {"name": "COMPRESSION", "value": "ETC2_COMPRESSION"},
            {"name": "world_tracker", "value": "world_tracker_enabled"},
            {"name": "gyroscope", "value": "gyroscope_enabled"}
        ]);
        let form = insta
            .signed_data(json!({
                "exclude_media_ids": "[]",
                "supported_capabilities_new": capabilities.to_string(),
                "source": "feed_timeline",
                "user_ids": [id],
            }))
            .await?;

        let mut tray: TrayResponse = insta
            .request_json(ReqOptions::post(URL_REEL_MEDIA).form(form))
            .await?;

        let reel = tray
            .reels
            .remove(&id)
            .ok_or_else(|| Error::Api(format!("cannot find reel {} in response", id)))?;
        let id_before = self.reel.id.clone();
        self.set_reel(reel);
        if self.reel.id.is_none() {
            self.reel.id = id_before;
        }
        Ok(())
    }

    /// Delete the reel by id.
    pub async fn delete(&self, insta: &Instagram) -> Result<()> {
        let id = self.id();
        let form = insta.signed_data(json!({ "media_id": id })).await?;
        insta
            .send_request(ReqOptions::post(url_media_action(&id, "delete")).form(form))
            .await?;
        Ok(())
    }
}

#[async_trait]
impl Paginated for StoryMedia {
    async fn next(&mut self, insta: &Instagram) -> bool {
        if self.page.is_halted() {
            return false;
        }

        match insta
            .request_json::<ReelPage>(ReqOptions::get(self.endpoint.clone()))
            .await
        {
            Ok(reel) => {
                self.set_reel(reel);
                self.page.error = Some(Error::NoMore);
                true
            }
            Err(e) => self.page.fail(e),
        }
    }

    fn error(&self) -> Option<&Error> {
        self.page.error.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::transport::mock::MockTransport;
    use crate::api::ClientSettings;
    use std::sync::Arc;

    fn client(mock: Arc<MockTransport>) -> Instagram {
        Instagram::with_transport("alice", "pw", ClientSettings::default(), mock)
    }

    #[tokio::test]
    async fn test_single_fetch_then_sentinel() {
        let mock = Arc::new(MockTransport::new());
        mock.on_json(
            "feed/user/42/reel_media/",
            r#"{"id":42,"media_count":2,"has_besties_media":1,
                "user":{"pk":42,"username":"owner"},
                "items":[{"id":"1_42","media_type":1},{"id":"2_42","media_type":2,"audience":"besties"}]}"#,
        );
        let insta = client(mock.clone());

        let mut stories = StoryMedia::for_user(42);
        assert!(stories.next(&insta).await);
        assert!(stories.is_exhausted());
        assert!(!stories.next(&insta).await);
        assert_eq!(mock.request_count(), 1);

        assert_eq!(stories.id(), "42");
        assert!(stories.has_besties_media());
        assert_eq!(stories.items().len(), 2);
        assert!(stories.items().iter().all(|i| i.origin == MediaOrigin::Story));
        assert!(stories.items()[1].is_close_friends_story());
    }

    #[tokio::test]
    async fn test_string_reel_id() {
        let mock = Arc::new(MockTransport::new());
        mock.on_json(
            "reel_media/",
            r#"{"id":"highlight:17","has_besties_media":false,"items":[]}"#,
        );
        let insta = client(mock);

        let mut stories = StoryMedia::for_user(5);
        stories.next(&insta).await;
        assert_eq!(stories.id(), "highlight:17");
        assert!(!stories.has_besties_media());
    }

    #[tokio::test]
    async fn test_sync_from_tray() {
        let mock = Arc::new(MockTransport::new());
        mock.on_json(
            "feed/reels_media/",
            r#"{"reels":{"42":{"id":42,"items":[{"id":"9_42"}]}},"status":"ok"}"#,
        );
        let insta = client(mock.clone());

        let mut stories = StoryMedia::for_user(42);
        stories.sync(&insta).await.unwrap();
        assert_eq!(stories.items()[0].id, "9_42");

        let body = String::from_utf8(mock.requests()[0].body.clone()).unwrap();
        assert!(body.starts_with("signed_body=SIGNATURE."));

        let mut missing = StoryMedia::for_user(7);
        assert!(matches!(missing.sync(&insta).await, Err(Error::Api(_))));
    }

    #[tokio::test]
    async fn test_failed_fetch_keeps_error() {
        let mock = Arc::new(MockTransport::new());
        let insta = client(mock);

        let mut stories = StoryMedia::for_user(42);
        assert!(!stories.next(&insta).await);
        assert!(matches!(stories.error(), Some(Error::Instagram { status: 404, .. })));
    }
}
