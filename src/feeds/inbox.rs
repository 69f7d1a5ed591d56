//! Direct message inbox.

use async_trait::async_trait;
use serde::Deserialize;

use crate::api::constants::URL_INBOX;
use crate::api::types::lenient_i64;
use crate::api::{Instagram, ReqOptions};
use crate::error::Error;
use crate::media::cursor::{PageState, Paginated};
use crate::models::User;

/// One message in a thread.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DirectItem {
    pub item_id: String,
    #[serde(deserialize_with = "lenient_i64")]
    pub user_id: i64,
    pub timestamp: i64,
    pub item_type: String,
    pub text: Option<String>,
}

/// A direct thread.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Conversation {
    pub thread_id: String,
    pub thread_v2_id: String,
    pub thread_title: String,
    pub users: Vec<User>,
    pub items: Vec<DirectItem>,
    pub last_activity_at: i64,
    pub muted: bool,
    pub is_group: bool,
    pub pending: bool,
    pub named: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct InboxBody {
    threads: Vec<Conversation>,
    has_older: bool,
    unseen_count: i64,
    oldest_cursor: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct InboxPage {
    inbox: InboxBody,
    seq_id: i64,
    snapshot_at_ms: i64,
    pending_requests_total: i64,
}

/// Direct threads, newest first. Paging goes towards older threads.
#[derive(Debug, Default)]
pub struct Inbox {
    pub conversations: Vec<Conversation>,
    pub unseen_count: i64,
    pub pending_requests_total: i64,
    pub seq_id: i64,
    pub snapshot_at_ms: i64,
    cursor: Option<String>,
    page: PageState,
}

impl Inbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// First fetch, as the app does on open. Resets anything fetched before.
    pub async fn initial_snapshot(&mut self, insta: &Instagram) -> bool {
        *self = Self::default();
        let opts = ReqOptions::get(URL_INBOX)
            .query("visual_message_return_type", "unseen")
            .query("thread_message_limit", "10")
            .query("persistentBadging", "true")
            .query("limit", "20")
            .query("fetch_reason", "initial_snapshot");
        self.fetch(insta, opts).await
    }

    async fn fetch(&mut self, insta: &Instagram, opts: ReqOptions) -> bool {
        match insta.request_json::<InboxPage>(opts).await {
            Ok(page) => {
                self.seq_id = page.seq_id;
                self.snapshot_at_ms = page.snapshot_at_ms;
                self.pending_requests_total = page.pending_requests_total;
                self.unseen_count = page.inbox.unseen_count;
                self.conversations.extend(page.inbox.threads);
                self.cursor = page.inbox.oldest_cursor.filter(|c| !c.is_empty());
                if !page.inbox.has_older || self.cursor.is_none() {
                    self.page.error = Some(Error::NoMore);
                }
                true
            }
            Err(e) => self.page.fail(e),
        }
    }
}

#[async_trait]
impl Paginated for Inbox {
    async fn next(&mut self, insta: &Instagram) -> bool {
        if self.page.is_halted() {
            return false;
        }

        let mut opts = ReqOptions::get(URL_INBOX)
            .query("visual_message_return_type", "unseen")
            .query("thread_message_limit", "10")
            .query("persistentBadging", "true")
            .query("limit", "20");
        if let Some(cursor) = &self.cursor {
            opts = opts
                .query("cursor", cursor.clone())
                .query("direction", "older")
                .query("seq_id", self.seq_id.to_string());
        }
        self.fetch(insta, opts).await
    }

    fn error(&self) -> Option<&Error> {
        self.page.error.as_ref()
    }
}
