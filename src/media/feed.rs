//! Paginated list of posts: a user's feed or a single fetched media.

use async_trait::async_trait;
use serde::Deserialize;

use crate::api::constants::{url_media_info, url_user_feed};
use crate::api::{Instagram, ReqOptions};
use crate::error::{Error, Result};
use crate::media::cursor::{NextId, PageState, Paginated};
use crate::media::item::{Item, MediaOrigin};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FeedPage {
    items: Vec<Item>,
    num_results: usize,
    more_available: bool,
    auto_load_more_enabled: bool,
    status: String,
    next_max_id: Option<NextId>,
}

/// Accumulated posts plus the cursor to fetch more.
#[derive(Debug)]
pub struct FeedMedia {
    endpoint: String,
    /// Set when built by [`Instagram::get_media`].
    media_id: Option<String>,
    pub items: Vec<Item>,
    pub num_results: usize,
    pub more_available: bool,
    pub auto_load_more_enabled: bool,
    pub status: String,
    last_page_len: usize,
    page: PageState,
}

impl FeedMedia {
    fn with_endpoint(endpoint: String) -> Self {
        Self {
            endpoint,
            media_id: None,
            items: Vec::new(),
            num_results: 0,
            more_available: false,
            auto_load_more_enabled: false,
            status: String::new(),
            last_page_len: 0,
            page: PageState::default(),
        }
    }

    /// Posts of one user.
    pub fn for_user(user_id: i64) -> Self {
        Self::with_endpoint(url_user_feed(user_id))
    }

    /// A single media, filled by [`FeedMedia::sync`].
    pub fn for_media(id: impl Into<String>) -> Self {
        let id = id.into();
        let mut media = Self::with_endpoint(url_media_info(&id));
        media.media_id = Some(id);
        media
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// The media id for single-media lists, otherwise the current cursor.
    pub fn id(&self) -> String {
        match &self.media_id {
            Some(id) => id.clone(),
            None => self.next_id().map(NextId::as_param).unwrap_or_default(),
        }
    }

    pub fn next_id(&self) -> Option<&NextId> {
        self.page.next_id.as_ref()
    }

    /// Resume from a known cursor.
    pub fn set_next_id(&mut self, id: impl Into<NextId>) {
        self.page.next_id = Some(id.into());
    }

    /// Items added by the most recent page.
    pub fn latest(&self) -> &[Item] {
        &self.items[self.items.len() - self.last_page_len..]
    }

    /// Like [`Paginated::next`], with extra query pairs on the request.
    pub async fn next_with(&mut self, insta: &Instagram, extra: &[(&str, &str)]) -> bool {
        if self.page.is_halted() {
            return false;
        }

        let mut opts = ReqOptions::get(self.endpoint.clone())
            .query("exclude_comment", "true")
            .query("only_fetch_first_carousel_media", "false");
        for (key, value) in extra {
            opts = opts.query(*key, *value);
        }
        if let Some(max_id) = self.page.max_id() {
            opts = opts.query("max_id", max_id);
        }

        match insta.request_json::<FeedPage>(opts).await {
            Ok(page) => {
                self.absorb(page);
                true
            }
            Err(e) => self.page.fail(e),
        }
    }

    fn absorb(&mut self, page: FeedPage) {
        self.num_results = page.num_results;
        self.more_available = page.more_available;
        self.auto_load_more_enabled = page.auto_load_more_enabled;
        self.status = page.status;
        self.page.advance(page.next_max_id, page.more_available);

        self.last_page_len = page.items.len();
        self.items.extend(page.items.into_iter().map(|mut item| {
            item.attach(MediaOrigin::Feed);
            item
        }));
    }

    /// Refetch a single media by id, replacing the items.
    pub async fn sync(&mut self, insta: &Instagram) -> Result<()> {
        let id = self
            .media_id
            .clone()
            .ok_or_else(|| Error::Media("sync needs a media id".into()))?;

        let page: FeedPage = insta.request_json(ReqOptions::get(url_media_info(&id))).await?;

        self.items = page
            .items
            .into_iter()
            .map(|mut item| {
                item.attach(MediaOrigin::Feed);
                item
            })
            .collect();
        self.last_page_len = self.items.len();
        self.num_results = page.num_results;
        self.more_available = page.more_available;
        self.status = page.status;
        Ok(())
    }

    /// Delete every accumulated item. Individual failures are reported to the
    /// error handler and do not stop the loop.
    pub async fn delete_all(&self, insta: &Instagram) -> usize {
        let mut deleted = 0;
        for item in &self.items {
            match item.delete(insta).await {
                Ok(()) => deleted += 1,
                Err(e) => insta.report(&format!("Failed to delete media {}", item.id), &e),
            }
        }
        deleted
    }
}

#[async_trait]
impl Paginated for FeedMedia {
    async fn next(&mut self, insta: &Instagram) -> bool {
        self.next_with(insta, &[]).await
    }

    fn error(&self) -> Option<&Error> {
        self.page.error.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::transport::mock::MockTransport;
    use crate::api::{ClientSettings, HttpResponse};
    use std::sync::Arc;

    fn client(mock: Arc<MockTransport>) -> Instagram {
        Instagram::with_transport("alice", "pw", ClientSettings::default(), mock)
    }

    #[tokio::test]
    async fn test_pages_append_until_exhausted() {
        let mock = Arc::new(MockTransport::new());
        mock.on_json(
            "feed/user/42/",
            r#"{"items":[{"id":"1"},{"id":"2"}],"num_results":2,"more_available":true,"next_max_id":"c1"}"#,
        );
        mock.on_json(
            "feed/user/42/",
            r#"{"items":[{"id":"3"}],"num_results":1,"more_available":false,"next_max_id":0}"#,
        );
        let insta = client(mock.clone());

        let mut feed = FeedMedia::for_user(42);
        assert!(feed.next(&insta).await);
        assert!(feed.error().is_none());
        assert!(feed.next(&insta).await);
        assert!(feed.is_exhausted());

        assert_eq!(feed.items.len(), 3);
        assert_eq!(feed.latest().len(), 1);
        assert_eq!(feed.latest()[0].id, "3");

        // Halted: no further requests
        assert!(!feed.next(&insta).await);
        assert!(!feed.next(&insta).await);
        assert_eq!(mock.request_count(), 2);
        assert!(matches!(feed.error(), Some(Error::NoMore)));

        let requests = mock.requests();
        assert!(!requests[0].url.contains("max_id"));
        assert!(requests[1].url.contains("max_id=c1"));
    }

    #[tokio::test]
    async fn test_numeric_zero_cursor_ends_list() {
        let mock = Arc::new(MockTransport::new());
        mock.on_json(
            "feed/user/7/",
            r#"{"items":[{"id":"1"}],"more_available":true,"next_max_id":0}"#,
        );
        let insta = client(mock);

        let mut feed = FeedMedia::for_user(7);
        assert!(feed.next(&insta).await);
        assert!(feed.is_exhausted());
    }

    #[tokio::test]
    async fn test_failure_is_distinguishable() {
        let mock = Arc::new(MockTransport::new());
        mock.on("feed/user/7/", HttpResponse::new(500, "oops"));
        let insta = client(mock.clone());

        let mut feed = FeedMedia::for_user(7);
        assert!(!feed.next(&insta).await);
        assert!(!feed.is_exhausted());
        assert!(matches!(feed.error(), Some(Error::Instagram { status: 500, .. })));
        assert!(!feed.next(&insta).await);
        assert_eq!(mock.request_count(), 1);
    }

    #[tokio::test]
    async fn test_next_with_extra_query() {
        let mock = Arc::new(MockTransport::new());
        mock.on_json("feed/user/7/", r#"{"items":[],"more_available":false}"#);
        let insta = client(mock.clone());

        let mut feed = FeedMedia::for_user(7);
        feed.set_next_id(NextId::Int(99));
        assert!(feed.next_with(&insta, &[("min_timestamp", "1700000000")]).await);

        let url = &mock.requests()[0].url;
        assert!(url.contains("min_timestamp=1700000000"));
        assert!(url.contains("max_id=99"));
        assert!(url.contains("exclude_comment=true"));
    }

    #[tokio::test]
    async fn test_get_media_syncs_single_item() {
        let mock = Arc::new(MockTransport::new());
        mock.on_json(
            "media/123_4/info/",
            r#"{"items":[{"id":"123_4","media_type":1}],"num_results":1,"more_available":false}"#,
        );
        let insta = client(mock);

        let media = insta.get_media("123_4").await.unwrap();
        assert_eq!(media.id(), "123_4");
        assert_eq!(media.items.len(), 1);
        assert_eq!(media.items[0].media_type_name(), "photo");
    }

    #[tokio::test]
    async fn test_delete_all_reports_failures() {
        let mock = Arc::new(MockTransport::new());
        mock.on_json("feed/user/7/", r#"{"items":[{"id":"1"},{"id":"2"}],"more_available":false}"#);
        mock.on_json("media/1/delete/", r#"{"status":"ok"}"#);
        mock.on("media/2/delete/", HttpResponse::new(400, r#"{"message":"nope"}"#));

        let reported = Arc::new(std::sync::Mutex::new(0));
        let counter = reported.clone();
        let mut insta = client(mock);
        insta.set_error_handler(move |_, _| *counter.lock().unwrap() += 1);

        let mut feed = FeedMedia::for_user(7);
        feed.next(&insta).await;
        assert_eq!(feed.delete_all(&insta).await, 1);
        assert_eq!(*reported.lock().unwrap(), 1);
    }
}
