//! Output module for console output and progress.
//!
//! Provides:
//! - Colored console output
//! - Progress spinners and bars
//! - Run statistics

pub mod console;
pub mod progress;
pub mod stats;

pub use console::{
    print_account, print_banner, print_config_summary, print_error, print_info, print_item,
    print_success, print_warning,
};
pub use progress::{create_item_bar, create_spinner};
pub use stats::{print_summary, RunStats};
