//! Home timeline.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::Deserialize;

use crate::api::auth::unix_seconds;
use crate::api::constants::URL_TIMELINE;
use crate::api::{Instagram, ReqOptions};
use crate::error::Error;
use crate::media::cursor::{NextId, PageState, Paginated};
use crate::media::item::{Item, MediaOrigin};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FeedEntry {
    media_or_ad: Option<Item>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct TimelinePage {
    feed_items: Vec<FeedEntry>,
    num_results: usize,
    more_available: bool,
    next_max_id: Option<NextId>,
}

/// Posts from followed accounts, newest first.
#[derive(Debug, Default)]
pub struct Timeline {
    pub items: Vec<Item>,
    pub num_results: usize,
    pub more_available: bool,
    pages: usize,
    page: PageState,
}

impl Timeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pages fetched so far.
    pub fn pages(&self) -> usize {
        self.pages
    }

    async fn form(&self, insta: &Instagram) -> BTreeMap<String, String> {
        let state = insta.state.read().await;
        let mut form = BTreeMap::new();
        form.insert("feed_view_info".into(), "[]".into());
        form.insert("phone_id".into(), state.phone_id.clone());
        form.insert("battery_level".into(), "100".into());
        form.insert("timezone_offset".into(), insta.settings().timezone_offset.to_string());
        form.insert("device_id".into(), state.uuid.clone());
        form.insert("_uuid".into(), state.uuid.clone());
        form.insert("is_charging".into(), "1".into());
        form.insert("will_sound_on".into(), "0".into());
        form.insert("is_on_screen".into(), "true".into());
        form.insert("is_async_ads_in_headload_enabled".into(), "false".into());
        form.insert("is_async_ads_double_request".into(), "false".into());
        form.insert("is_async_ads_rti".into(), "false".into());
        form.insert("latest_story_pk".into(), String::new());
        form.insert("client_session_id".into(), state.pigeon_session_id.clone());
        form.insert("rti_delivery_backend".into(), "0".into());
        form.insert("is_pull_to_refresh".into(), "0".into());

        match self.page.max_id() {
            Some(max_id) => {
                form.insert("reason".into(), "pagination".into());
                form.insert("max_id".into(), max_id);
            }
            None => {
                form.insert("reason".into(), "cold_start_fetch".into());
                form.insert("request_id".into(), unix_seconds().to_string());
            }
        }
        form
    }
}

#[async_trait]
impl Paginated for Timeline {
    async fn next(&mut self, insta: &Instagram) -> bool {
        if self.page.is_halted() {
            return false;
        }

        let opts = ReqOptions::post(URL_TIMELINE)
            .form(self.form(insta).await)
            .header("X-Ads-Opt-Out", "0")
            .header("X-Google-Ad-Id", insta.state.read().await.ad_id.clone());

        match insta.request_json::<TimelinePage>(opts).await {
            Ok(page) => {
                self.pages += 1;
                self.num_results = page.num_results;
                self.more_available = page.more_available;
                self.page.advance(page.next_max_id, page.more_available);
                self.items.extend(
                    page.feed_items
                        .into_iter()
                        .filter_map(|entry| entry.media_or_ad)
                        .map(|mut item| {
                            item.attach(MediaOrigin::Feed);
                            item
                        }),
                );
                true
            }
            Err(e) => self.page.fail(e),
        }
    }

    fn error(&self) -> Option<&Error> {
        self.page.error.as_ref()
    }
}
