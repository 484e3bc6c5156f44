use super::client::{get_page, get_pdf, Fetch};
use super::{Download, SiteError, Want};
use scraper::{Html, Selector};
use tracing::debug;
use url::Url;

const ACM: &str = "ACM DL";
const IACR: &str = "IACR ePrint";
const SPRINGER: &str = "SpringerLink";
const IEEE: &str = "IEEE Xplore";

fn origin(url: &Url) -> String {
    url.origin().ascii_serialization()
}

fn absolute(base: &Url, href: &str) -> Result<String, SiteError> {
    base.join(href)
        .map(String::from)
        .map_err(|_| SiteError::InvalidUrl(href.to_string()))
}

fn select_attr(html: &str, selector: &str, attr: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let selector = Selector::parse(selector).ok()?;
    let element = document.select(&selector).next()?;
    element.value().attr(attr).map(str::to_string)
}

fn select_text(html: &str, selector: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let selector = Selector::parse(selector).ok()?;
    let element = document.select(&selector).next()?;
    Some(element.text().collect::<String>().trim().to_string())
}

fn segments(url: &Url) -> Vec<&str> {
    url.path_segments()
        .map(|segments| segments.filter(|s| !s.is_empty()).collect())
        .unwrap_or_default()
}

fn invalid(url: &Url) -> SiteError {
    SiteError::InvalidUrl(url.to_string())
}

fn fetch_bibtex(fetcher: &dyn Fetch, url: &str) -> Result<Vec<u8>, SiteError> {
    Ok(get_page(fetcher, url)?.body)
}

/// `https://dl.acm.org/citation.cfm?doid=<parent>.<id>`
pub fn acm_dl(fetcher: &dyn Fetch, url: &Url, want: Want) -> Result<Download, SiteError> {
    let doid = url
        .query_pairs()
        .find(|(name, _)| name == "doid")
        .map(|(_, value)| value.into_owned())
        .ok_or_else(|| invalid(url))?;
    let paper_id = match doid.split_once('.') {
        Some((_, id)) => id.to_string(),
        None => doid,
    };
    debug!(%paper_id, "ACM DL paper");

    let page = get_page(fetcher, url.as_str())?.text();
    let mut download = Download::default();

    if want.pdf {
        let href = select_attr(&page, "a[name=FullTextPDF]", "href").ok_or(
            SiteError::MissingDownloadLink {
                site: ACM,
                what: "PDF",
            },
        )?;
        download.pdf = Some(get_pdf(fetcher, &absolute(url, &href)?)?);
    }

    if want.bibtex {
        let missing = || SiteError::MissingDownloadLink {
            site: ACM,
            what: "BibTeX",
        };
        let abstract_url = select_attr(&page, "meta[name=citation_abstract_html_url]", "content")
            .ok_or_else(missing)?;
        let abstract_url = Url::parse(&abstract_url).map_err(|_| missing())?;
        let parent_id = abstract_url
            .query_pairs()
            .find(|(name, _)| name == "id")
            .and_then(|(_, ids)| ids.split('.').next().map(str::to_string))
            .ok_or_else(missing)?;
        debug!(%parent_id, "ACM DL parent");

        let bib_url = format!(
            "{}/downformats.cfm?id={}&parent_id={}&expformat=bibtex",
            origin(url),
            paper_id,
            parent_id
        );
        download.bibtex = Some(fetch_bibtex(fetcher, &bib_url)?);
    }

    Ok(download)
}

/// `https://eprint.iacr.org/2015/525` or the same with `.pdf`.
pub fn iacr_eprint(fetcher: &dyn Fetch, url: &Url, want: Want) -> Result<Download, SiteError> {
    let path = url.path().trim_matches('/');
    let entry = path.strip_suffix(".pdf").unwrap_or(path);
    if entry.is_empty() {
        return Err(invalid(url));
    }

    let mut download = Download::default();

    if want.pdf {
        let pdf_url = format!("{}/{}.pdf", origin(url), entry);
        download.pdf = Some(get_pdf(fetcher, &pdf_url)?);
    }

    if want.bibtex {
        let cite_url = format!("{}/eprint-bin/cite.pl?entry={}", origin(url), entry);
        let page = get_page(fetcher, &cite_url)?.text();
        let bibtex = select_text(&page, "pre").ok_or(SiteError::MissingDownloadLink {
            site: IACR,
            what: "BibTeX",
        })?;
        download.bibtex = Some(bibtex.into_bytes());
    }

    Ok(download)
}

/// `https://link.springer.com/chapter/<doi>` (or `/article/<doi>`).
pub fn springer_link(fetcher: &dyn Fetch, url: &Url, want: Want) -> Result<Download, SiteError> {
    let doi = ["/chapter", "/article"]
        .iter()
        .find_map(|prefix| url.path().strip_prefix(prefix))
        .filter(|doi| doi.len() > 1)
        .ok_or_else(|| invalid(url))?;
    debug!(doi, "SpringerLink paper");

    let mut download = Download::default();

    if want.pdf {
        let page = get_page(fetcher, url.as_str())?.text();
        let href = select_attr(
            &page,
            "#cobranding-and-download-availability-text > div > a",
            "href",
        )
        .ok_or(SiteError::MissingDownloadLink {
            site: SPRINGER,
            what: "PDF",
        })?;
        download.pdf = Some(get_pdf(fetcher, &absolute(url, &href)?)?);
    }

    if want.bibtex {
        // doi keeps its leading '/'
        let bib_url = format!(
            "https://citation-needed.springer.com/v2/references{}?format=bibtex&flavour=citation",
            doi
        );
        download.bibtex = Some(fetch_bibtex(fetcher, &bib_url)?);
    }

    Ok(download)
}

/// `https://epubs.siam.org/doi/<prefix>/<suffix>`, optionally with `abs/`.
pub fn siam_epubs(fetcher: &dyn Fetch, url: &Url, want: Want) -> Result<Download, SiteError> {
    let doi: Vec<&str> = match segments(url).as_slice() {
        ["doi", "abs" | "full" | "pdf", rest @ ..] | ["doi", rest @ ..] => rest.to_vec(),
        _ => return Err(invalid(url)),
    };
    let [prefix, suffix] = doi.as_slice() else {
        return Err(invalid(url));
    };
    debug!(doi = %format!("{}/{}", prefix, suffix), "SIAM paper");

    let mut download = Download::default();

    if want.pdf {
        let pdf_url = format!("{}/doi/pdf/{}/{}", origin(url), prefix, suffix);
        download.pdf = Some(get_pdf(fetcher, &pdf_url)?);
    }

    if want.bibtex {
        let bib_url = format!(
            "{}/action/downloadCitation?doi={}%2F{}&format=bibtex&include=cit",
            origin(url),
            prefix,
            suffix
        );
        download.bibtex = Some(fetch_bibtex(fetcher, &bib_url)?);
    }

    Ok(download)
}

/// `https://ieeexplore.ieee.org/document/<arnumber>/`
pub fn ieee_xplore(fetcher: &dyn Fetch, url: &Url, want: Want) -> Result<Download, SiteError> {
    let arnumber = match segments(url).as_slice() {
        ["document", arnumber, ..] => arnumber.to_string(),
        _ => return Err(invalid(url)),
    };
    debug!(%arnumber, "IEEE Xplore paper");

    let mut download = Download::default();

    if want.pdf {
        // the PDF sits in an iframe on the stamp page
        let stamp_url = format!("{}/stamp/stamp.jsp?tp=&arnumber={}", origin(url), arnumber);
        let page = get_page(fetcher, &stamp_url)?.text();
        let src = select_attr(&page, "iframe", "src").ok_or(SiteError::MissingDownloadLink {
            site: IEEE,
            what: "PDF",
        })?;
        download.pdf = Some(get_pdf(fetcher, &absolute(url, &src)?)?);
    }

    if want.bibtex {
        let bib_url = format!(
            "{}/xpl/downloadCitations?recordIds={}&download-format=download-bibtex&citations-format=citation-abstract",
            origin(url),
            arnumber
        );
        let bibtex = get_page(fetcher, &bib_url)?.text().replace("<br>", "");
        download.bibtex = Some(bibtex.into_bytes());
    }

    Ok(download)
}

/// `https://arxiv.org/abs/<id>` or `https://arxiv.org/pdf/<id>[.pdf]`.
pub fn arxiv(fetcher: &dyn Fetch, url: &Url, want: Want) -> Result<Download, SiteError> {
    let id = match segments(url).as_slice() {
        ["abs" | "pdf", rest @ ..] if !rest.is_empty() => rest.join("/"),
        _ => return Err(invalid(url)),
    };
    let id = id.strip_suffix(".pdf").unwrap_or(&id);
    debug!(id, "arXiv paper");

    let mut download = Download::default();

    if want.pdf {
        download.pdf = Some(get_pdf(fetcher, &format!("https://arxiv.org/pdf/{}.pdf", id))?);
    }

    if want.bibtex {
        download.bibtex = Some(fetch_bibtex(
            fetcher,
            &format!("https://arxiv.org/bibtex/{}", id),
        )?);
    }

    Ok(download)
}
