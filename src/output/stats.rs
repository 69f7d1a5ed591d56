//! Statistics reporting for listing and download runs.

use console::style;

use crate::media::MediaKind;

/// Counters for one command run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunStats {
    pub pages: usize,
    pub items: usize,
    pub images: usize,
    pub videos: usize,
    pub failed: usize,
}

impl RunStats {
    pub fn record_page(&mut self, items: usize) {
        self.pages += 1;
        self.items += items;
    }

    pub fn record_download(&mut self, kind: MediaKind) {
        match kind {
            MediaKind::Image => self.images += 1,
            MediaKind::Video => self.videos += 1,
        }
    }

    pub fn record_failure(&mut self) {
        self.failed += 1;
    }

    pub fn downloaded(&self) -> usize {
        self.images + self.videos
    }
}

/// Print the end-of-run summary.
pub fn print_summary(stats: &RunStats) {
    println!();
    println!("{}", style("═".repeat(50)).dim());
    println!(
        "Listed {} item(s) from {} page(s)",
        style(stats.items).green(),
        stats.pages
    );
    if stats.downloaded() > 0 || stats.failed > 0 {
        println!(
            "Downloaded: {} images, {} videos",
            style(stats.images).green(),
            style(stats.videos).green()
        );
    }
    if stats.failed > 0 {
        println!("  Failed:   {}", style(stats.failed).red());
    }
    println!("{}", style("═".repeat(50)).dim());
}
