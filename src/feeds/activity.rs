//! Recent activity (the notifications tab).

use async_trait::async_trait;
use serde::Deserialize;

use crate::api::constants::URL_ACTIVITY;
use crate::api::types::lenient_i64;
use crate::api::{Instagram, ReqOptions};
use crate::error::Error;
use crate::media::cursor::{NextId, PageState, Paginated};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ActivityMedia {
    pub id: String,
    pub image: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ActivityArgs {
    pub text: String,
    #[serde(deserialize_with = "lenient_i64")]
    pub profile_id: i64,
    pub profile_name: String,
    pub profile_image: String,
    pub timestamp: f64,
    pub media: Vec<ActivityMedia>,
}

/// One notification.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ActivityStory {
    pub story_type: i32,
    #[serde(rename = "type")]
    pub kind: i32,
    pub pk: String,
    pub args: ActivityArgs,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ActivityPage {
    new_stories: Vec<ActivityStory>,
    old_stories: Vec<ActivityStory>,
    auto_load_more_enabled: bool,
    next_max_id: Option<NextId>,
}

/// Notification feed. New stories are those not yet seen.
#[derive(Debug, Default)]
pub struct Activity {
    pub new_stories: Vec<ActivityStory>,
    pub old_stories: Vec<ActivityStory>,
    page: PageState,
}

impl Activity {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Paginated for Activity {
    async fn next(&mut self, insta: &Instagram) -> bool {
        if self.page.is_halted() {
            return false;
        }

        let mut opts = ReqOptions::get(URL_ACTIVITY).query("mark_as_seen", "false");
        opts = match self.page.max_id() {
            Some(max_id) => opts.query("max_id", max_id),
            None => opts.query("could_truncate_feed", "true"),
        };

        match insta.request_json::<ActivityPage>(opts).await {
            Ok(page) => {
                self.new_stories.extend(page.new_stories);
                self.old_stories.extend(page.old_stories);
                self.page
                    .advance(page.next_max_id, page.auto_load_more_enabled);
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
    async fn test_activity_collects_stories() {
        let mock = Arc::new(MockTransport::new());
        mock.on_json(
            "news/inbox/",
            r#"{"new_stories":[{"story_type":60,"pk":"a","args":{"text":"bob liked your photo","profile_id":5}}],
                "old_stories":[{"story_type":101,"pk":"b"}],
                "auto_load_more_enabled":true,"next_max_id":1699999999}"#,
        );
        mock.on_json("news/inbox/", r#"{"old_stories":[{"pk":"c"}]}"#);
        let insta = Instagram::with_transport("a", "b", ClientSettings::default(), mock.clone());

        let mut activity = Activity::new();
        assert!(activity.next(&insta).await);
        assert!(activity.next(&insta).await);
        assert!(activity.is_exhausted());

        assert_eq!(activity.new_stories[0].args.text, "bob liked your photo");
        assert_eq!(activity.old_stories.len(), 2);
        assert!(mock.requests()[1].url.contains("max_id=1699999999"));
    }
}
