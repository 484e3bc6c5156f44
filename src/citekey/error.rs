use thiserror::Error;

#[derive(Error, Debug)]
pub enum CitekeyError {
    #[error("Unknown default citation key policy '{0}' (expected one of KeepBibtex, FirstAuthorYearTitle, InitialsShortYear, InitialsFullYear)")]
    UnknownPolicy(String),

    #[error("Derived an empty citation key; pass one explicitly")]
    EmptyKey,

    #[error("'{0}' is not a valid citation key (use letters, digits, '+', '-', '_' or ':')")]
    InvalidKey(String),
}
