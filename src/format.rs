use crate::bibtex::latex::latex_to_unicode;
use crate::bibtex::BibEntry;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FormatError {
    #[error("Unknown format '{0}' (expected 'markdown' or 'text')")]
    UnknownFormat(String),
}

/// Output style for one-line citations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CiteStyle {
    Markdown,
    Text,
}

impl FromStr for CiteStyle {
    type Err = FormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "markdown" | "md" => Ok(CiteStyle::Markdown),
            "text" | "txt" => Ok(CiteStyle::Text),
            _ => Err(FormatError::UnknownFormat(s.to_string())),
        }
    }
}

/// `[key] Title, by Authors; in Venue; 2021; https://...` or its Markdown
/// footnote equivalent.
pub fn format_entry(entry: &BibEntry, style: CiteStyle) -> String {
    // '+' breaks Markdown footnote names
    let key = entry.key.replace('+', "plus");
    let title = entry.get("title").trim_matches(|c| c == '{' || c == '}');
    let authors = display_authors(entry.get("author"));

    let mut cite = match style {
        CiteStyle::Markdown => format!("[^{}]: **{}**, by {}", key, title, authors),
        CiteStyle::Text => format!("[{}] {}, by {}", key, title, authors),
    };

    if let Some(venue) = entry.venue() {
        match style {
            CiteStyle::Markdown => cite.push_str(&format!(", *in {}*", venue)),
            CiteStyle::Text => cite.push_str(&format!("; in {}", venue)),
        }
    }

    if let Some(year) = entry.field("year") {
        match style {
            CiteStyle::Markdown => cite.push_str(&format!(", {}", year)),
            CiteStyle::Text => cite.push_str(&format!("; {}", year)),
        }
    }

    if let Some(url) = entry.url() {
        match style {
            CiteStyle::Markdown => cite.push_str(&format!(", [[URL]]({})", url)),
            CiteStyle::Text => cite.push_str(&format!("; {}", url)),
        }
    }

    cite
}

/// Author list as it should read on screen: accents decoded, braces dropped,
/// all on one line.
pub fn display_authors(author_field: &str) -> String {
    latex_to_unicode(author_field)
        .replace(['{', '}'], "")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
