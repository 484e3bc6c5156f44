use super::SiteError;
use crate::ui::UI;
use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use tracing::{debug, trace};

pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

const PDF_CONTENT_TYPES: &[&str] = &["application/pdf", "application/x-pdf"];

/// A fetched HTTP response, whatever its status.
#[derive(Debug, Clone)]
pub struct Response {
    pub status: u16,
    pub reason: String,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl Response {
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// The HTTP capability the site handlers need.
pub trait Fetch {
    fn fetch(&self, url: &str) -> Result<Response, SiteError>;
}

/// Blocking client that keeps cookies across requests, since some sites set
/// a session cookie on the landing page before serving the PDF.
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    pub fn new(user_agent: Option<&str>) -> Result<Self, SiteError> {
        let client = Client::builder()
            .user_agent(user_agent.unwrap_or(DEFAULT_USER_AGENT))
            .cookie_store(true)
            .build()?;
        Ok(HttpClient { client })
    }
}

impl Fetch for HttpClient {
    fn fetch(&self, url: &str) -> Result<Response, SiteError> {
        debug!(url, "GET");
        let response = self.client.get(url).send()?;

        let status = response.status();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let body = response.bytes()?.to_vec();
        trace!(url, status = status.as_u16(), bytes = body.len(), "response");

        Ok(Response {
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or("").to_string(),
            content_type,
            body,
        })
    }
}

/// Fetches `url`, failing on anything but `200 OK`.
pub fn get_page(fetcher: &dyn Fetch, url: &str) -> Result<Response, SiteError> {
    let response = fetcher.fetch(url)?;
    if response.status != 200 {
        return Err(SiteError::HttpError {
            url: url.to_string(),
            code: response.status,
            reason: response.reason,
        });
    }
    Ok(response)
}

/// Fetches a PDF, rejecting responses that are not labelled as one (usually
/// a paywall or login page).
pub fn get_pdf(fetcher: &dyn Fetch, url: &str) -> Result<Vec<u8>, SiteError> {
    let spinner = UI::spinner("Downloading", url);
    let response = match get_page(fetcher, url) {
        Ok(response) => response,
        Err(e) => {
            spinner.finish_and_clear();
            return Err(e);
        }
    };

    let content_type = response.content_type.clone().unwrap_or_default();
    if !is_pdf_content_type(&content_type) {
        spinner.finish_and_clear();
        return Err(SiteError::WrongContentType {
            url: url.to_string(),
            content_type,
        });
    }

    UI::finish_with_message(
        spinner,
        "Downloaded",
        &UI::format_file_size(response.body.len()),
    );
    Ok(response.body)
}

fn is_pdf_content_type(content_type: &str) -> bool {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase();
    PDF_CONTENT_TYPES.contains(&essence.as_str())
}
