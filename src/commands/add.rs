use crate::bibtex::BibEntry;
use crate::citekey::{derive_key, validate_key};
use crate::config::Config;
use crate::format::{format_entry, CiteStyle};
use crate::library::{Library, LibraryError};
use crate::sites::{self, get_pdf, Download, Fetch, HttpClient, SiteError, Want};
use crate::ui::{blog, blog_done, UI};
use anyhow::{bail, Context, Result};
use chrono::Local;
use url::Url;

pub fn add(config: &Config, library: &Library, url: &str, ck: Option<&str>, no_pdf: bool) -> Result<()> {
    let client = HttpClient::new(config.user_agent())?;
    let key = add_with(&client, config, library, url, ck, no_pdf)?;

    let entry = library.read_entry(&key)?;
    blog_done!("Added", "{}", UI::style_ck(&key));
    println!("{}", format_entry(&entry, CiteStyle::Text));
    Ok(())
}

/// Imports the paper at `url` and returns the citation key it was stored
/// under.
pub fn add_with(
    fetcher: &dyn Fetch,
    config: &Config,
    library: &Library,
    url: &str,
    ck: Option<&str>,
    no_pdf: bool,
) -> Result<String> {
    let url = Url::parse(url.trim()).map_err(|_| SiteError::InvalidUrl(url.to_string()))?;

    if let Some(ck) = ck {
        validate_key(ck)?;
        ensure_new(library, ck)?;
    }

    let want = Want {
        pdf: !no_pdf,
        bibtex: true,
    };

    blog!("Fetching", "{}", url);
    match sites::handle(fetcher, &url, want)? {
        Some(download) => save_download(config, library, download, ck),
        None => save_unhandled_pdf(fetcher, library, &url, ck, no_pdf),
    }
}

fn ensure_new(library: &Library, ck: &str) -> Result<()> {
    if library.exists(ck) {
        bail!(LibraryError::AlreadyExists(ck.to_string()));
    }
    Ok(())
}

fn save_download(
    config: &Config,
    library: &Library,
    download: Download,
    ck: Option<&str>,
) -> Result<String> {
    let bibtex = download.bibtex.unwrap_or_default();
    let mut entry = BibEntry::parse(&String::from_utf8_lossy(&bibtex))
        .context("The downloaded BibTeX could not be parsed")?;
    entry.require(&["author", "title"])?;

    let key = match ck {
        Some(ck) => ck.to_string(),
        None => {
            let key = derive_key(config.policy()?, &entry)?;
            validate_key(&key)?;
            ensure_new(library, &key)?;
            key
        }
    };

    entry.set_date_added(Local::now().naive_local());
    library.write_entry(&key, &mut entry)?;

    if let Some(pdf) = download.pdf {
        let path = library.write_pdf(&key, &pdf)?;
        blog!("Saved", "{}", path.display());
    }
    Ok(key)
}

/// Direct links to a PDF on a site without a handler become `@misc`
/// records; there is no metadata to derive a key from, so one must be given.
fn save_unhandled_pdf(
    fetcher: &dyn Fetch,
    library: &Library,
    url: &Url,
    ck: Option<&str>,
    no_pdf: bool,
) -> Result<String> {
    let host = url.host_str().unwrap_or("");
    if !url.path().to_ascii_lowercase().ends_with(".pdf") {
        bail!("No handler for '{}'; only direct PDF links are supported there", host);
    }
    let Some(ck) = ck else {
        bail!("'{}' has no handler: give a citation key to save {} as a @misc entry", host, url);
    };

    let mut entry = BibEntry::new(ck, "misc");
    entry.set("howpublished", format!("\\url{{{}}}", url));
    entry.set_date_added(Local::now().naive_local());

    if !no_pdf {
        let pdf = get_pdf(fetcher, url.as_str())?;
        let path = library.write_pdf(ck, &pdf)?;
        blog!("Saved", "{}", path.display());
    }
    library.write_entry(ck, &mut entry)?;
    Ok(ck.to_string())
}
