mod error;
pub mod tags;
pub use error::LibraryError;

use crate::bibtex::BibEntry;
use crate::config::Config;
use std::collections::BTreeSet;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

/// The bibliography directory (flat `<ck>.pdf` / `<ck>.bib` pairs) and the
/// tag directory (a tree of symlinks into it).
#[derive(Debug, Clone)]
pub struct Library {
    bib_dir: PathBuf,
    tag_dir: PathBuf,
}

impl Library {
    pub fn new(bib_dir: impl Into<PathBuf>, tag_dir: impl Into<PathBuf>) -> Self {
        Library {
            bib_dir: bib_dir.into(),
            tag_dir: tag_dir.into(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.bib_dir(), config.tag_dir())
    }

    pub fn bib_dir(&self) -> &Path {
        &self.bib_dir
    }

    pub fn tag_dir(&self) -> &Path {
        &self.tag_dir
    }

    pub fn pdf_path(&self, ck: &str) -> PathBuf {
        self.bib_dir.join(format!("{}.pdf", ck))
    }

    pub fn bib_path(&self, ck: &str) -> PathBuf {
        self.bib_dir.join(format!("{}.bib", ck))
    }

    /// A key is taken as soon as either of its files exists.
    pub fn exists(&self, ck: &str) -> bool {
        self.pdf_path(ck).exists() || self.bib_path(ck).exists()
    }

    pub fn has_pdf(&self, ck: &str) -> bool {
        self.pdf_path(ck).exists()
    }

    /// Reads `<ck>.bib` as stored, without canonicalizing it.
    pub fn read_entry(&self, ck: &str) -> Result<BibEntry, LibraryError> {
        let path = self.bib_path(ck);
        let bibtex = fs::read_to_string(&path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => LibraryError::FileNotFound {
                ck: ck.to_string(),
                path: path.clone(),
            },
            _ => LibraryError::Io(e),
        })?;

        BibEntry::parse(&bibtex).map_err(|source| LibraryError::Parse {
            ck: ck.to_string(),
            source,
        })
    }

    /// Canonicalizes `entry` for `ck` and writes it to `<ck>.bib`, replacing
    /// the whole file.
    pub fn write_entry(&self, ck: &str, entry: &mut BibEntry) -> Result<(), LibraryError> {
        entry.canonicalize(ck);
        fs::create_dir_all(&self.bib_dir)?;
        fs::write(self.bib_path(ck), entry.to_bibtex())?;
        debug!(ck, "wrote .bib");
        Ok(())
    }

    pub fn write_pdf(&self, ck: &str, pdf: &[u8]) -> Result<PathBuf, LibraryError> {
        fs::create_dir_all(&self.bib_dir)?;
        let path = self.pdf_path(ck);
        fs::write(&path, pdf)?;
        Ok(path)
    }

    /// Brings `<ck>.bib` in line with its file name and field conventions.
    /// Returns whether the file had to be rewritten.
    pub fn check(&self, ck: &str) -> Result<bool, LibraryError> {
        let mut entry = self.read_entry(ck)?;
        if !entry.canonicalize(ck) {
            return Ok(false);
        }
        self.write_entry(ck, &mut entry)?;
        Ok(true)
    }

    /// Every citation key in the bibliography directory.
    pub fn list_cks(&self) -> Result<Vec<String>, LibraryError> {
        list_cks(&self.bib_dir, false)
    }

    /// Moves `old`'s files to `new`, rewrites the key inside the `.bib` and
    /// re-points every tag symlink.
    pub fn rename(&self, old: &str, new: &str) -> Result<(), LibraryError> {
        if !self.exists(old) {
            return Err(LibraryError::FileNotFound {
                ck: old.to_string(),
                path: self.bib_path(old),
            });
        }
        if self.exists(new) {
            return Err(LibraryError::AlreadyExists(new.to_string()));
        }

        // nothing changes on disk until the old `.bib` has parsed
        let entry = if self.bib_path(old).exists() {
            Some(self.read_entry(old)?)
        } else {
            None
        };
        let tags = self.tags_of(old)?;

        if let Some(mut entry) = entry {
            self.write_entry(new, &mut entry)?;
        }
        if self.pdf_path(old).exists() {
            fs::rename(self.pdf_path(old), self.pdf_path(new))?;
        }
        if self.bib_path(old).exists() {
            fs::remove_file(self.bib_path(old))?;
        }

        self.untag(old, None)?;
        for tag in tags {
            self.tag(new, &tag)?;
        }
        Ok(())
    }
}

/// Citation keys found in `dir`: stems of `.pdf`/`.bib` files. Stems with a
/// dot (`KZG10.slides.pdf`) are attachments, not keys.
pub fn list_cks(dir: &Path, recursive: bool) -> Result<Vec<String>, LibraryError> {
    let mut cks = BTreeSet::new();
    collect_cks(dir, recursive, &mut cks)?;
    Ok(cks.into_iter().collect())
}

fn collect_cks(dir: &Path, recursive: bool, cks: &mut BTreeSet<String>) -> Result<(), LibraryError> {
    for dir_entry in fs::read_dir(dir)? {
        let path = dir_entry?.path();

        if path.is_dir() {
            if recursive {
                collect_cks(&path, recursive, cks)?;
            }
            continue;
        }

        let (Some(stem), Some(ext)) = (
            path.file_stem().and_then(|s| s.to_str()),
            path.extension().and_then(|s| s.to_str()),
        ) else {
            continue;
        };

        if stem.contains('.') {
            continue;
        }
        if ext.eq_ignore_ascii_case("pdf") || ext.eq_ignore_ascii_case("bib") {
            cks.insert(stem.to_string());
        }
    }
    Ok(())
}
