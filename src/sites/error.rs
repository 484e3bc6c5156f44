use thiserror::Error;

#[derive(Error, Debug)]
pub enum SiteError {
    #[error("{site}: could not find the {what} link on the page")]
    MissingDownloadLink {
        site: &'static str,
        what: &'static str,
    },

    #[error("HTTP {code} {reason} for {url}")]
    HttpError {
        url: String,
        code: u16,
        reason: String,
    },

    #[error("Expected a PDF from {url}, got '{content_type}'")]
    WrongContentType { url: String, content_type: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}
