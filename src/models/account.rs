//! The logged-in account.

use serde::{Deserialize, Serialize};

use crate::api::types::lenient_i64;
use crate::api::Instagram;
use crate::error::Result;
use crate::media::{FeedMedia, SavedMedia, StoryMedia};

/// Profile of the account the session is logged in as.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Account {
    #[serde(rename = "pk", default, deserialize_with = "lenient_i64")]
    pub id: i64,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub biography: String,
    #[serde(default)]
    pub profile_pic_url: String,
    pub profile_pic_id: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub external_url: Option<String>,
    #[serde(default)]
    pub is_private: bool,
    #[serde(default)]
    pub is_verified: bool,
    #[serde(default)]
    pub is_business: bool,
    #[serde(default)]
    pub has_anonymous_profile_picture: bool,
    pub follower_count: Option<u64>,
    pub following_count: Option<u64>,
    pub media_count: Option<u64>,
    /// Gender code as reported by the edit endpoint.
    pub gender: Option<i32>,
}

impl Account {
    /// Bare account carrying only what a persisted session knows.
    pub fn new(id: i64, username: impl Into<String>) -> Self {
        Self {
            id,
            username: username.into(),
            ..Default::default()
        }
    }

    /// Refresh every profile field from the server.
    pub async fn sync(&mut self, insta: &Instagram) -> Result<()> {
        *self = insta.sync_account().await?;
        Ok(())
    }

    /// Cursor over the account's own posts.
    pub fn feed(&self) -> FeedMedia {
        FeedMedia::for_user(self.id)
    }

    /// The account's current story reel.
    pub fn stories(&self) -> StoryMedia {
        StoryMedia::for_user(self.id)
    }

    /// Cursor over saved posts.
    pub fn saved(&self) -> SavedMedia {
        SavedMedia::new()
    }
}
