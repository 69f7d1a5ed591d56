//! Explore page.

use async_trait::async_trait;
use serde::Deserialize;

use crate::api::constants::URL_DISCOVER;
use crate::api::{Instagram, ReqOptions};
use crate::error::Error;
use crate::media::cursor::{NextId, PageState, Paginated};
use crate::media::item::{Item, MediaOrigin};

/// One layout block of the explore grid.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Section {
    pub layout_type: String,
    pub feed_type: String,
    /// Layout-specific payload; see [`Section::items`].
    pub layout_content: serde_json::Value,
}

impl Section {
    /// Media items found in the known layout shapes.
    pub fn items(&self) -> Vec<Item> {
        let content = &self.layout_content;
        let mut values = Vec::new();

        for key in ["medias", "fill_items"] {
            if let Some(list) = content.get(key).and_then(|v| v.as_array()) {
                values.extend(list.iter().filter_map(|entry| entry.get("media")));
            }
        }
        if let Some(list) = content
            .pointer("/one_by_two_item/clips/items")
            .and_then(|v| v.as_array())
        {
            values.extend(list.iter().filter_map(|entry| entry.get("media")));
        }

        values
            .into_iter()
            .filter_map(|v| serde_json::from_value::<Item>(v.clone()).ok())
            .map(|mut item| {
                item.attach(MediaOrigin::Feed);
                item
            })
            .collect()
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct DiscoverPage {
    sectional_items: Vec<Section>,
    more_available: bool,
    next_max_id: Option<NextId>,
    rank_token: String,
}

/// Explore sections, accumulated page by page.
#[derive(Debug, Default)]
pub struct Discover {
    pub sections: Vec<Section>,
    pub rank_token: String,
    pub more_available: bool,
    page: PageState,
}

impl Discover {
    pub fn new() -> Self {
        Self::default()
    }

    /// Items across every fetched section.
    pub fn items(&self) -> Vec<Item> {
        self.sections.iter().flat_map(Section::items).collect()
    }
}

#[async_trait]
impl Paginated for Discover {
    async fn next(&mut self, insta: &Instagram) -> bool {
        if self.page.is_halted() {
            return false;
        }

        let session_id = insta.state.read().await.pigeon_session_id.clone();
        let mut opts = ReqOptions::get(URL_DISCOVER)
            .query("is_prefetch", "false")
            .query("omit_cover_media", "true")
            .query("use_sectional_payload", "true")
            .query("timezone_offset", insta.settings().timezone_offset.to_string())
            .query("session_id", session_id)
            .query("include_fixed_destinations", "true")
            .query("cluster_id", "explore_all:0");
        if let Some(max_id) = self.page.max_id() {
            opts = opts.query("max_id", max_id);
        }

        match insta.request_json::<DiscoverPage>(opts).await {
            Ok(page) => {
                self.more_available = page.more_available;
                if !page.rank_token.is_empty() {
                    self.rank_token = page.rank_token;
                }
                self.sections.extend(page.sectional_items);
                self.page.advance(page.next_max_id, page.more_available);
                true
            }
            Err(e) => self.page.fail(e),
        }
    }

    fn error(&self) -> Option<&Error> {
        self.page.error.as_ref()
    }
}
