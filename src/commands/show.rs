use crate::bibtex::BibEntry;
use crate::format::{display_authors, format_entry, CiteStyle};
use crate::library::{Library, LibraryError};
use crate::ui::{blog_warning, error_message, UI};
use anyhow::{Context, Result};
use std::collections::BTreeSet;
use termion::{color, style};

/// Prints each paper's `.bib` the way `check` would store it.
pub fn bib(library: &Library, cks: &[String]) -> Result<()> {
    for ck in cks {
        let Some(mut entry) = read_or_skip(library, ck)? else {
            continue;
        };
        entry.canonicalize(ck);
        println!("{}\n", entry.to_bibtex());
    }
    Ok(())
}

pub fn cite(library: &Library, cks: &[String], format: &str) -> Result<()> {
    let style: CiteStyle = format.parse()?;
    for ck in cks {
        if let Some(entry) = read_or_skip(library, ck)? {
            println!("{}", format_entry(&entry, style));
        }
    }
    Ok(())
}

/// Which optional columns `list` prints.
#[derive(Debug, Clone, Copy, Default)]
pub struct ListColumns {
    pub venue: bool,
    pub url: bool,
}

/// One line per paper, optionally restricted to papers carrying (a sub-tag
/// of) any of `tags`. Unreadable `.bib` files are reported and skipped.
pub fn list(library: &Library, tags: &[String], columns: ListColumns) -> Result<()> {
    let cks = if tags.is_empty() {
        library.list_cks()?
    } else {
        cks_with_tags(library, tags)?
    };
    let tagged = library.tagged()?;

    for ck in &cks {
        let Some(entry) = read_or_skip(library, ck)? else {
            continue;
        };
        if entry.key != *ck {
            blog_warning!(
                "Mismatch",
                "{}.bib has citation key '{}' (run `ck check`)",
                ck,
                entry.key
            );
        }
        let tags = tagged.get(ck).map(Vec::as_slice).unwrap_or_default();
        println!("{}", list_line(ck, &entry, tags, columns));
    }
    Ok(())
}

/// Missing or unparsable `.bib` files are reported and skipped so the rest of
/// a batch still runs.
fn read_or_skip(library: &Library, ck: &str) -> Result<Option<BibEntry>> {
    match library.read_entry(ck) {
        Ok(entry) => Ok(Some(entry)),
        Err(e @ LibraryError::FileNotFound { .. }) | Err(e @ LibraryError::Parse { .. }) => {
            blog_warning!("Skipped", "{}", e);
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}

fn cks_with_tags(library: &Library, tags: &[String]) -> Result<Vec<String>> {
    let mut cks = BTreeSet::new();
    for tag in tags {
        match library.cks_tagged(tag, true) {
            Ok(tagged) => cks.extend(tagged),
            Err(e @ LibraryError::UnknownTag(_)) => error_message(&e.to_string()),
            Err(e) => return Err(e.into()),
        }
    }
    Ok(cks.into_iter().collect())
}

/// `KZG10, Title, 2010, Authors, (June 3, 2021), #tags`
fn list_line(ck: &str, entry: &BibEntry, tags: &[String], columns: ListColumns) -> String {
    let title = entry.get("title").trim_matches(|c| c == '{' || c == '}');
    let mut line = format!(
        "{}, {}{}{}, {}{}{}{}{}, {}",
        UI::style_ck(ck),
        color::Fg(color::Green),
        title,
        color::Fg(color::Reset),
        style::Bold,
        color::Fg(color::Red),
        entry.get("year"),
        color::Fg(color::Reset),
        style::Reset,
        display_authors(entry.get("author")),
    );

    if let Some(added) = entry.date_added() {
        line.push_str(&format!(
            ", ({}{}{})",
            color::Fg(color::Magenta),
            added.format("%B %-d, %Y"),
            color::Fg(color::Reset)
        ));
    }
    if !tags.is_empty() {
        line.push_str(&format!(", {}", UI::style_tags(tags)));
    }
    if columns.venue {
        if let Some(venue) = entry.venue() {
            line.push_str(&format!(
                ", {}{}{}",
                color::Fg(color::Cyan),
                venue,
                color::Fg(color::Reset)
            ));
        }
    }
    if columns.url {
        if let Some(url) = entry.url() {
            line.push_str(&format!(", {}", url));
        }
    }
    line
}

/// Opens the paper's PDF in the system viewer.
pub fn open(library: &Library, ck: &str) -> Result<()> {
    let path = library.pdf_path(ck);
    if !path.exists() {
        return Err(LibraryError::FileNotFound {
            ck: ck.to_string(),
            path,
        }
        .into());
    }
    open::that(&path).with_context(|| format!("Could not open {}", path.display()))?;
    Ok(())
}
