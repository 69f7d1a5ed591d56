//! Public profile of another account.

use serde::{Deserialize, Serialize};

use crate::api::types::lenient_i64;
use crate::media::{FeedMedia, StoryMedia};

/// Relationship between the session account and a user.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Friendship {
    #[serde(default)]
    pub following: bool,
    #[serde(default)]
    pub followed_by: bool,
    #[serde(default)]
    pub blocking: bool,
    #[serde(default)]
    pub muting: bool,
    #[serde(default)]
    pub is_private: bool,
    #[serde(default)]
    pub incoming_request: bool,
    #[serde(default)]
    pub outgoing_request: bool,
    #[serde(default)]
    pub is_bestie: bool,
}

/// A user as it appears on items, likers and reels.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct User {
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
    #[serde(default)]
    pub is_private: bool,
    #[serde(default)]
    pub is_verified: bool,
    #[serde(default)]
    pub is_business: bool,
    pub follower_count: Option<u64>,
    pub following_count: Option<u64>,
    pub media_count: Option<u64>,
    pub external_url: Option<String>,
    #[serde(rename = "friendship_status")]
    pub friendship: Option<Friendship>,
}

impl User {
    /// Cursor over this user's posts.
    pub fn feed(&self) -> FeedMedia {
        FeedMedia::for_user(self.id)
    }

    /// This user's current story reel.
    pub fn stories(&self) -> StoryMedia {
        StoryMedia::for_user(self.id)
    }

    /// Profile URL on the web.
    pub fn profile_url(&self) -> String {
        format!("https://www.instagram.com/{}/", self.username)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_from_string_pk() {
        let user: User = serde_json::from_str(
            r#"{"pk":"1234","username":"bob","full_name":"Bob","is_private":true,
                "friendship_status":{"following":true}}"#,
        )
        .unwrap();
        assert_eq!(user.id, 1234);
        assert!(user.is_private);
        assert!(user.friendship.unwrap().following);
    }

    #[test]
    fn test_user_cursors_target_user() {
        let user = User {
            id: 77,
            username: "carol".into(),
            ..Default::default()
        };
        assert_eq!(user.feed().endpoint(), "feed/user/77/");
        assert_eq!(user.stories().user_id(), 77);
        assert_eq!(user.profile_url(), "https://www.instagram.com/carol/");
    }
}
