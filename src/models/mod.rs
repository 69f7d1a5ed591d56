//! Account and user profile mirrors.

pub mod account;
pub mod user;

pub use account::Account;
pub use user::{Friendship, User};
