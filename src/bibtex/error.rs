use thiserror::Error;

#[derive(Error, Debug)]
pub enum BibtexError {
    #[error("Failed to parse BibTeX: {0}")]
    Parse(String),

    #[error("No entries found in BibTeX")]
    NoEntries,

    #[error("Expected a single BibTeX entry, found {0}")]
    MultipleEntries(usize),

    #[error("Missing required field '{field}' in BibTeX entry '{key}'")]
    MissingField { key: String, field: String },
}
