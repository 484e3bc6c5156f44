use crate::bibtex::BibtexError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LibraryError {
    #[error("{ck}: missing file {}", .path.display())]
    FileNotFound { ck: String, path: PathBuf },

    #[error("{ck}: invalid BibTeX: {source}")]
    Parse {
        ck: String,
        #[source]
        source: BibtexError,
    },

    #[error("Citation key '{0}' already exists")]
    AlreadyExists(String),

    #[error("Tag '{0}' does not exist")]
    UnknownTag(String),

    #[error("'{0}' is not a valid tag name")]
    InvalidTag(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
