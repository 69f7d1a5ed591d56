//! Media items and the cursors that fetch them.

pub mod cursor;
pub mod feed;
pub mod item;
pub mod saved;
pub mod story;
pub mod types;

pub use cursor::{NextId, Paginated};
pub use feed::FeedMedia;
pub use item::{Downloaded, Item, MediaKind, MediaOrigin};
pub use saved::SavedMedia;
pub use story::{ReelId, StoryMedia};
pub use types::{Caption, Candidate, Comment, Hashtag, Location, Tag, Video};
