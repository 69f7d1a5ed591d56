//! Session-wide feeds primed during login: timeline, activity, inbox and explore.

pub mod activity;
pub mod discover;
pub mod inbox;
pub mod timeline;

pub use activity::{Activity, ActivityStory};
pub use discover::{Discover, Section};
pub use inbox::{Conversation, DirectItem, Inbox};
pub use timeline::Timeline;
