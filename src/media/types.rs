//! Pieces of media items: captions, image candidates, comments, tags.
//!
//! Fields the server sends in more than one shape are untagged enums with an
//! `Other` arm, each with an accessor that returns one canonical shape.

use serde::{Deserialize, Serialize};

use crate::api::types::lenient_i64;
use crate::models::User;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Caption {
    #[serde(deserialize_with = "lenient_i64")]
    pub pk: i64,
    #[serde(deserialize_with = "lenient_i64")]
    pub user_id: i64,
    pub text: String,
    pub created_at: i64,
    pub status: String,
}

/// One rendition of an image.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Candidate {
    pub width: u32,
    pub height: u32,
    pub url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Images {
    pub candidates: Vec<Candidate>,
}

/// One rendition of a video.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Video {
    #[serde(rename = "type")]
    pub kind: i32,
    pub width: u32,
    pub height: u32,
    pub url: String,
    pub id: String,
}

/// Anything with a size and a URL.
pub trait Rendition {
    fn size(&self) -> (u32, u32);
    fn url(&self) -> &str;
}

impl Rendition for Candidate {
    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn url(&self) -> &str {
        &self.url
    }
}

impl Rendition for Video {
    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn url(&self) -> &str {
        &self.url
    }
}

/// Pick the rendition that beats every earlier pick in both dimensions.
pub fn best_rendition<R: Rendition>(renditions: &[R]) -> Option<&str> {
    let mut best: Option<&R> = None;
    for rendition in renditions {
        if rendition.url().is_empty() {
            continue;
        }
        let (w, h) = rendition.size();
        let better = match best {
            Some(current) => {
                let (bw, bh) = current.size();
                w > bw && h > bh
            }
            None => w > 0 && h > 0,
        };
        if better {
            best = Some(rendition);
        }
    }
    best.map(Rendition::url)
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Comment {
    #[serde(deserialize_with = "lenient_i64")]
    pub pk: i64,
    pub text: String,
    #[serde(rename = "type")]
    pub kind: i32,
    #[serde(deserialize_with = "lenient_i64")]
    pub user_id: i64,
    pub user: Option<User>,
    pub created_at: i64,
    pub created_at_utc: i64,
    pub content_type: String,
    pub status: String,
    pub comment_like_count: i64,
    pub has_liked_comment: bool,
}

/// A tagged user with the tag position in the photo.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tag {
    pub user: User,
    pub position: Vec<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserTags {
    #[serde(rename = "in")]
    pub tagged: Vec<Tag>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Location {
    #[serde(deserialize_with = "lenient_i64")]
    pub pk: i64,
    pub name: String,
    pub address: String,
    pub city: String,
    pub short_name: String,
    pub lng: f64,
    pub lat: f64,
    pub external_source: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Hashtag {
    pub name: String,
}

/// `top_likers`: a single username or a list of them.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum TopLikers {
    One(String),
    Many(Vec<String>),
    Other(serde_json::Value),
}

impl TopLikers {
    pub fn to_vec(&self) -> Vec<String> {
        match self {
            TopLikers::One(name) => vec![name.clone()],
            TopLikers::Many(names) => names.clone(),
            TopLikers::Other(_) => Vec::new(),
        }
    }
}

/// `preview_comments`: a string, a list of strings or a list of comments.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum PreviewComments {
    Text(String),
    Texts(Vec<String>),
    Comments(Vec<Comment>),
    Other(serde_json::Value),
}

impl PreviewComments {
    /// Typed comments in server order. String forms only fill `text`.
    pub fn to_comments(&self) -> Vec<Comment> {
        let text_only = |text: &String| Comment {
            text: text.clone(),
            ..Default::default()
        };
        match self {
            PreviewComments::Text(text) => vec![text_only(text)],
            PreviewComments::Texts(texts) => texts.iter().map(text_only).collect(),
            PreviewComments::Comments(comments) => comments.clone(),
            PreviewComments::Other(_) => Vec::new(),
        }
    }
}

/// `has_besties_media`: sent as a bool or as 0/1.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum HasBestiesMedia {
    Bool(bool),
    Int(i64),
    Other(serde_json::Value),
}

impl HasBestiesMedia {
    pub fn as_bool(&self) -> bool {
        match self {
            HasBestiesMedia::Bool(b) => *b,
            HasBestiesMedia::Int(n) => *n != 0,
            HasBestiesMedia::Other(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_top_likers_shapes() {
        let one: TopLikers = serde_json::from_str(r#""bob""#).unwrap();
        let many: TopLikers = serde_json::from_str(r#"["bob","eve"]"#).unwrap();
        let odd: TopLikers = serde_json::from_str("12").unwrap();
        assert_eq!(one.to_vec(), vec!["bob"]);
        assert_eq!(many.to_vec(), vec!["bob", "eve"]);
        assert!(odd.to_vec().is_empty());
    }

    #[test]
    fn test_preview_comments_bare_string() {
        let pc: PreviewComments = serde_json::from_str(r#""nice""#).unwrap();
        let comments = pc.to_comments();
        assert_eq!(comments.len(), 1);
        assert_eq!(comments[0].text, "nice");
        assert_eq!(comments[0].pk, 0);
    }

    #[test]
    fn test_preview_comments_objects_keep_order() {
        let pc: PreviewComments = serde_json::from_str(
            r#"[{"pk":"1","text":"first","user_id":5,"user":{"pk":5,"username":"a"}},
                {"pk":2,"text":"second","user_id":"6"}]"#,
        )
        .unwrap();
        let comments = pc.to_comments();
        assert_eq!(comments.len(), 2);
        assert_eq!(comments[0].pk, 1);
        assert_eq!(comments[0].text, "first");
        assert_eq!(comments[0].user.as_ref().unwrap().username, "a");
        assert_eq!(comments[1].text, "second");
        assert_eq!(comments[1].user_id, 6);
    }

    #[test]
    fn test_preview_comments_string_list() {
        let pc: PreviewComments = serde_json::from_str(r#"["a","b"]"#).unwrap();
        let texts: Vec<_> = pc.to_comments().into_iter().map(|c| c.text).collect();
        assert_eq!(texts, vec!["a", "b"]);
    }

    #[test]
    fn test_has_besties_media() {
        let b: HasBestiesMedia = serde_json::from_str("true").unwrap();
        let i: HasBestiesMedia = serde_json::from_str("1").unwrap();
        let z: HasBestiesMedia = serde_json::from_str("0").unwrap();
        assert!(b.as_bool());
        assert!(i.as_bool());
        assert!(!z.as_bool());
    }

    #[test]
    fn test_best_rendition_needs_both_dimensions() {
        let candidates = vec![
            Candidate { width: 320, height: 320, url: "small".into() },
            Candidate { width: 1080, height: 300, url: "wide".into() },
            Candidate { width: 640, height: 640, url: "medium".into() },
            Candidate { width: 1080, height: 1080, url: String::new() },
        ];
        assert_eq!(best_rendition(&candidates), Some("medium"));
        assert_eq!(best_rendition::<Video>(&[]), None);
    }
}
