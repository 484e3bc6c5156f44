pub mod macros;

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;
use termion::color;

pub use macros::*;

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

pub struct UI;

impl UI {
    pub fn spinner(category: &str, message: &str) -> ProgressBar {
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{prefix:.blue.bold} {spinner:.blue} {msg}") {
            pb.set_style(style.tick_strings(TICKS));
        }
        pb.set_prefix(format!("{:>12}", category));
        pb.set_message(message.to_string());
        pb.enable_steady_tick(Duration::from_millis(80));
        pb
    }

    pub fn finish_with_message(pb: ProgressBar, completed_category: &str, message: &str) {
        pb.finish_and_clear();
        blog_done!(completed_category, "{}", message);
    }

    pub fn format_file_size(bytes: usize) -> String {
        const KB: f64 = 1024.0;
        let bytes = bytes as f64;
        if bytes < KB {
            format!("{} B", bytes)
        } else if bytes < KB * KB {
            format!("{:.1} KB", bytes / KB)
        } else {
            format!("{:.1} MB", bytes / (KB * KB))
        }
    }

    pub fn style_ck(ck: &str) -> String {
        format!("{}{}{}", color::Fg(color::Blue), ck, color::Fg(color::Reset))
    }

    /// Renders tags as a comma-separated `#tag` list.
    pub fn style_tags<S: AsRef<str>>(tags: &[S]) -> String {
        tags.iter()
            .map(|tag| {
                format!(
                    "{}#{}{}",
                    color::Fg(color::Yellow),
                    tag.as_ref(),
                    color::Fg(color::Reset)
                )
            })
            .collect::<Vec<_>>()
            .join(", ")
    }
}

pub fn error_message(err: &str) {
    eprintln!(
        "{}{:>12}{} {}",
        color::Fg(color::Red),
        "Error",
        color::Fg(color::Reset),
        err
    );
}
