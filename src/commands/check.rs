use crate::citekey::validate_key;
use crate::library::{Library, LibraryError};
use crate::ui::{blog, blog_done, blog_warning, UI};
use anyhow::Result;
use tracing::debug;

/// Counts from one `check` pass over the library.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct CheckReport {
    pub checked: usize,
    pub rewritten: usize,
    pub skipped: usize,
}

/// Canonicalizes every `.bib` in the library, reporting broken or missing
/// files per key and carrying on.
pub fn check(library: &Library) -> Result<CheckReport> {
    let mut report = CheckReport::default();

    for ck in library.list_cks()? {
        report.checked += 1;
        match library.check(&ck) {
            Ok(true) => {
                report.rewritten += 1;
                blog_done!("Fixed", "{}", UI::style_ck(&ck));
            }
            Ok(false) => debug!(%ck, "already canonical"),
            Err(e @ LibraryError::FileNotFound { .. }) | Err(e @ LibraryError::Parse { .. }) => {
                report.skipped += 1;
                blog_warning!("Skipped", "{}", e);
            }
            Err(e) => return Err(e.into()),
        }
    }

    blog!(
        "Checked",
        "{} papers, {} rewritten, {} skipped",
        report.checked,
        report.rewritten,
        report.skipped
    );
    Ok(report)
}

pub fn rename(library: &Library, old: &str, new: &str) -> Result<()> {
    validate_key(new)?;
    library.rename(old, new)?;
    blog_done!("Renamed", "{} to {}", UI::style_ck(old), UI::style_ck(new));
    Ok(())
}
