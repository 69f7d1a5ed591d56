//! Filesystem helpers: safe file names, default locations and media folders.

pub mod naming;
pub mod paths;

pub use naming::{make_unique_filename, sanitize_filename, sanitize_path_component};
pub use paths::{
    default_config_path, default_session_path, ensure_parent, media_folder, user_folder,
};
