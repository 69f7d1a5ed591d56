//! Pagination contract shared by every cursor.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::api::Instagram;
use crate::error::Error;

/// Next-page marker. The server sends it as a number on some endpoints and as
/// a string on others.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NextId {
    Int(i64),
    Str(String),
}

impl NextId {
    /// Zero, empty and `"0"` all mean there is no next page.
    pub fn is_zero(&self) -> bool {
        match self {
            NextId::Int(n) => *n == 0,
            NextId::Str(s) => s.is_empty() || s == "0",
        }
    }

    /// Value to send as `max_id`.
    pub fn as_param(&self) -> String {
        match self {
            NextId::Int(n) => n.to_string(),
            NextId::Str(s) => s.clone(),
        }
    }
}

impl fmt::Display for NextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_param())
    }
}

impl From<i64> for NextId {
    fn from(n: i64) -> Self {
        NextId::Int(n)
    }
}

impl From<String> for NextId {
    fn from(s: String) -> Self {
        NextId::Str(s)
    }
}

impl From<&str> for NextId {
    fn from(s: &str) -> Self {
        NextId::Str(s.to_string())
    }
}

/// A server-side list fetched one page at a time.
#[async_trait]
pub trait Paginated: Send {
    /// Fetch the next page and append it.
    ///
    /// Returns false without touching the network once the error slot is set.
    /// After a false return, [`Paginated::error`] holds either
    /// [`Error::NoMore`] or the failure.
    async fn next(&mut self, insta: &Instagram) -> bool;

    fn error(&self) -> Option<&Error>;

    /// True once the list ended normally.
    fn is_exhausted(&self) -> bool {
        matches!(self.error(), Some(Error::NoMore))
    }
}

/// Cursor position plus error slot.
#[derive(Debug, Default)]
pub struct PageState {
    pub next_id: Option<NextId>,
    pub error: Option<Error>,
}

impl PageState {
    pub fn is_halted(&self) -> bool {
        self.error.is_some()
    }

    /// `max_id` for the next request, if any.
    pub fn max_id(&self) -> Option<String> {
        self.next_id
            .as_ref()
            .filter(|id| !id.is_zero())
            .map(NextId::as_param)
    }

    /// Record a page and end the list when the server says so.
    pub fn advance(&mut self, next_id: Option<NextId>, more_available: bool) {
        let ended = !more_available || next_id.as_ref().map_or(true, NextId::is_zero);
        self.next_id = next_id;
        if ended {
            self.error = Some(Error::NoMore);
        }
    }

    /// Store a failure; returns false for use as `next`'s result.
    pub fn fail(&mut self, err: Error) -> bool {
        tracing::debug!("Pagination stopped: {}", err);
        self.error = Some(err);
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_id_shapes() {
        let n: NextId = serde_json::from_str("123").unwrap();
        let s: NextId = serde_json::from_str(r#""QVFE""#).unwrap();
        assert_eq!(n, NextId::Int(123));
        assert_eq!(s.as_param(), "QVFE");
        assert!(NextId::Int(0).is_zero());
        assert!(NextId::from("0").is_zero());
        assert!(NextId::from("").is_zero());
        assert!(!n.is_zero());
    }

    #[test]
    fn test_advance_sets_sentinel() {
        let mut state = PageState::default();
        state.advance(Some(NextId::from("abc")), true);
        assert!(!state.is_halted());
        assert_eq!(state.max_id().as_deref(), Some("abc"));

        state.advance(Some(NextId::Int(0)), false);
        assert!(matches!(state.error, Some(Error::NoMore)));

        let mut state = PageState::default();
        state.advance(Some(NextId::from("abc")), false);
        assert!(matches!(state.error, Some(Error::NoMore)));

        let mut state = PageState::default();
        state.advance(None, true);
        assert!(matches!(state.error, Some(Error::NoMore)));
    }

    #[test]
    fn test_fail_keeps_error() {
        let mut state = PageState::default();
        assert!(!state.fail(Error::RateLimited));
        assert!(matches!(state.error, Some(Error::RateLimited)));
    }
}
