//! Posts saved by the logged-in account.

use async_trait::async_trait;
use serde::Deserialize;

use crate::api::constants::URL_SAVED;
use crate::api::{Instagram, ReqOptions};
use crate::error::Error;
use crate::media::cursor::{NextId, PageState, Paginated};
use crate::media::item::{Item, MediaOrigin};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SavedEntry {
    media: Item,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SavedPage {
    items: Vec<SavedEntry>,
    num_results: usize,
    more_available: bool,
    next_max_id: Option<NextId>,
}

/// Saved posts, accumulated page by page.
#[derive(Debug, Default)]
pub struct SavedMedia {
    pub items: Vec<Item>,
    pub num_results: usize,
    pub more_available: bool,
    page: PageState,
}

impl SavedMedia {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&self) -> Option<&NextId> {
        self.page.next_id.as_ref()
    }
}

#[async_trait]
impl Paginated for SavedMedia {
    async fn next(&mut self, insta: &Instagram) -> bool {
        if self.page.is_halted() {
            return false;
        }

        let mut opts = ReqOptions::get(URL_SAVED);
        if let Some(max_id) = self.page.max_id() {
            opts = opts.query("max_id", max_id);
        }

        match insta.request_json::<SavedPage>(opts).await {
            Ok(page) => {
                self.num_results = page.num_results;
                self.more_available = page.more_available;
                self.page.advance(page.next_max_id, page.more_available);
                self.items.extend(page.items.into_iter().map(|entry| {
                    let mut item = entry.media;
                    item.attach(MediaOrigin::Saved);
                    item
                }));
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

    #[tokio::test]
    async fn test_saved_unwraps_media_and_appends() {
        let mock = Arc::new(MockTransport::new());
        mock.on_json(
            "feed/saved/posts/",
            r#"{"items":[{"media":{"id":"1","carousel_media":[{"id":"1a"}],"user":{"pk":3,"username":"x"}}}],
                "more_available":true,"next_max_id":"n1"}"#,
        );
        mock.on_json(
            "feed/saved/posts/",
            r#"{"items":[{"media":{"id":"2"}}],"more_available":false}"#,
        );
        let insta = Instagram::with_transport("a", "b", ClientSettings::default(), mock.clone());

        let mut saved = SavedMedia::new();
        while saved.next(&insta).await {}

        assert!(saved.is_exhausted());
        assert_eq!(saved.items.len(), 2);
        assert_eq!(saved.items[0].origin, MediaOrigin::Saved);
        assert_eq!(saved.items[0].carousel_media[0].user.username, "x");
        assert!(mock.requests()[1].url.contains("max_id=n1"));
        assert_eq!(mock.request_count(), 2);
    }
}
