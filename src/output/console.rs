//! Console output utilities.

use console::style;

use crate::media::Item;
use crate::models::Account;

/// Print an info message.
pub fn print_info(message: &str) {
    println!("{} {}", style("INFO").cyan().bold(), message);
}

/// Print a success message.
pub fn print_success(message: &str) {
    println!("{} {}", style("OK").green().bold(), message);
}

/// Print a warning message.
pub fn print_warning(message: &str) {
    println!("{} {}", style("WARN").yellow().bold(), message);
}

/// Print an error message.
pub fn print_error(message: &str) {
    eprintln!("{} {}", style("ERROR").red().bold(), message);
}

/// Print the application banner.
pub fn print_banner() {
    let banner = r#"
╔═══════════════════════════════════════════════════════╗
║     instagram-private                                 ║
║     Instagram private mobile API client               ║
╚═══════════════════════════════════════════════════════╝
"#;
    println!("{}", style(banner).cyan());
}

/// Print configuration summary.
pub fn print_config_summary(username: &str, session_path: &str, proxy: Option<&str>) {
    println!();
    println!("{}", style("Configuration:").bold());
    println!("  Account: {}", username);
    println!("  Session: {}", session_path);
    if let Some(proxy) = proxy {
        println!("  Proxy:   {}", proxy);
    }
    println!();
}

/// Print the logged-in account.
pub fn print_account(account: &Account) {
    let mut name = style(format!("@{}", account.username)).bold().to_string();
    if account.is_verified {
        name.push_str(" ✓");
    }
    println!("{} ({})", name, account.id);
    if !account.full_name.is_empty() {
        println!("  Name:      {}", account.full_name);
    }
    if let Some(count) = account.media_count {
        println!("  Posts:     {}", count);
    }
    if let (Some(followers), Some(following)) = (account.follower_count, account.following_count) {
        println!("  Followers: {}  Following: {}", followers, following);
    }
    if account.is_private {
        println!("  {}", style("private").dim());
    }
}

/// Print one line per media item.
pub fn print_item(item: &Item) {
    let when = item
        .taken_at_utc()
        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".to_string());
    let caption = one_line(item.caption_text(), 60);
    println!(
        "{} {:<8} {} @{} {}",
        style(when).dim(),
        item.media_type_name(),
        style(&item.code).cyan(),
        item.user.username,
        caption
    );
}

fn one_line(text: &str, max_chars: usize) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= max_chars {
        return flat;
    }
    let mut cut: String = flat.chars().take(max_chars).collect();
    cut.push('…');
    cut
}
