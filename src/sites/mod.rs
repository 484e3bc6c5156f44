pub mod client;
mod error;
mod handlers;

pub use client::{get_pdf, Fetch, HttpClient};
pub use error::SiteError;

use std::fmt;
use tracing::info;
use url::Url;

/// Sites we know how to pull a PDF and a BibTeX record from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Site {
    AcmDl,
    IacrEprint,
    SpringerLink,
    SiamEpubs,
    IeeeXplore,
    Arxiv,
    Unhandled,
}

impl Site {
    pub fn from_domain(domain: &str) -> Self {
        match domain {
            "dl.acm.org" => Site::AcmDl,
            "eprint.iacr.org" => Site::IacrEprint,
            "link.springer.com" => Site::SpringerLink,
            "epubs.siam.org" => Site::SiamEpubs,
            "ieeexplore.ieee.org" => Site::IeeeXplore,
            "arxiv.org" | "www.arxiv.org" => Site::Arxiv,
            _ => Site::Unhandled,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Site::AcmDl => "ACM DL",
            Site::IacrEprint => "IACR ePrint",
            Site::SpringerLink => "SpringerLink",
            Site::SiamEpubs => "SIAM",
            Site::IeeeXplore => "IEEE Xplore",
            Site::Arxiv => "arXiv",
            Site::Unhandled => "unhandled",
        }
    }
}

impl fmt::Display for Site {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Which artifacts the caller wants downloaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Want {
    pub pdf: bool,
    pub bibtex: bool,
}

#[derive(Debug, Default)]
pub struct Download {
    pub bibtex: Option<Vec<u8>>,
    pub pdf: Option<Vec<u8>>,
}

/// Downloads what `want` asks for from a known site. `Ok(None)` means the
/// domain has no handler, which is not an error.
pub fn handle(fetcher: &dyn Fetch, url: &Url, want: Want) -> Result<Option<Download>, SiteError> {
    let site = Site::from_domain(url.host_str().unwrap_or(""));
    info!(%site, %url, "dispatching");

    let download = match site {
        Site::AcmDl => handlers::acm_dl(fetcher, url, want)?,
        Site::IacrEprint => handlers::iacr_eprint(fetcher, url, want)?,
        Site::SpringerLink => handlers::springer_link(fetcher, url, want)?,
        Site::SiamEpubs => handlers::siam_epubs(fetcher, url, want)?,
        Site::IeeeXplore => handlers::ieee_xplore(fetcher, url, want)?,
        Site::Arxiv => handlers::arxiv(fetcher, url, want)?,
        Site::Unhandled => return Ok(None),
    };
    Ok(Some(download))
}

#[cfg(test)]
mod tests {
    use super::*;
    use client::Response;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use std::cell::RefCell;
    use std::collections::HashMap;

    const PDF: &[u8] = b"%PDF-1.4 fake";
    const BOTH: Want = Want {
        pdf: true,
        bibtex: true,
    };

    #[derive(Default)]
    struct MockFetch {
        responses: HashMap<String, Response>,
        requested: RefCell<Vec<String>>,
    }

    impl MockFetch {
        fn page(mut self, url: &str, body: &str) -> Self {
            self.responses
                .insert(url.to_string(), response(200, "text/html; charset=utf-8", body.as_bytes()));
            self
        }

        fn pdf(mut self, url: &str) -> Self {
            self.responses
                .insert(url.to_string(), response(200, "application/pdf", PDF));
            self
        }

        fn with(mut self, url: &str, response: Response) -> Self {
            self.responses.insert(url.to_string(), response);
            self
        }

        fn requested(&self) -> Vec<String> {
            self.requested.borrow().clone()
        }
    }

    fn response(status: u16, content_type: &str, body: &[u8]) -> Response {
        Response {
            status,
            reason: if status == 200 { "OK" } else { "Not Found" }.to_string(),
            content_type: Some(content_type.to_string()),
            body: body.to_vec(),
        }
    }

    impl Fetch for MockFetch {
        fn fetch(&self, url: &str) -> Result<Response, SiteError> {
            self.requested.borrow_mut().push(url.to_string());
            Ok(self
                .responses
                .get(url)
                .cloned()
                .unwrap_or_else(|| response(404, "text/html", b"")))
        }
    }

    fn run(fetcher: &MockFetch, url: &str, want: Want) -> Result<Option<Download>, SiteError> {
        handle(fetcher, &Url::parse(url).unwrap(), want)
    }

    fn bibtex_of(download: &Download) -> String {
        String::from_utf8(download.bibtex.clone().unwrap()).unwrap()
    }

    #[rstest]
    #[case("dl.acm.org", Site::AcmDl)]
    #[case("eprint.iacr.org", Site::IacrEprint)]
    #[case("link.springer.com", Site::SpringerLink)]
    #[case("epubs.siam.org", Site::SiamEpubs)]
    #[case("ieeexplore.ieee.org", Site::IeeeXplore)]
    #[case("arxiv.org", Site::Arxiv)]
    #[case("www.dl.acm.org", Site::Unhandled)]
    #[case("example.com", Site::Unhandled)]
    fn domains_match_exactly(#[case] domain: &str, #[case] site: Site) {
        assert_eq!(Site::from_domain(domain), site);
    }

    #[test]
    fn unhandled_domain_is_not_an_error() {
        let fetcher = MockFetch::default();
        assert!(run(&fetcher, "https://example.com/paper.pdf", BOTH)
            .unwrap()
            .is_none());
        assert!(fetcher.requested().is_empty());
    }

    #[test]
    fn acm_dl_scrapes_pdf_and_parent_id() {
        let page = r#"<html><head>
            <meta name="citation_abstract_html_url" content="http://dl.acm.org/citation.cfm?id=28395.28420">
            </head><body><a name="FullTextPDF" href="ft_gateway.cfm?id=28420&amp;ftid=1">PDF</a></body></html>"#;
        let fetcher = MockFetch::default()
            .page("https://dl.acm.org/citation.cfm?doid=28395.28420", page)
            .pdf("https://dl.acm.org/ft_gateway.cfm?id=28420&ftid=1")
            .page(
                "https://dl.acm.org/downformats.cfm?id=28420&parent_id=28395&expformat=bibtex",
                "@inproceedings{GMW87, title = {How to Play ANY Mental Game}}",
            );

        let download = run(&fetcher, "https://dl.acm.org/citation.cfm?doid=28395.28420", BOTH)
            .unwrap()
            .unwrap();
        assert_eq!(download.pdf.as_deref(), Some(PDF));
        assert!(bibtex_of(&download).starts_with("@inproceedings{GMW87"));
    }

    #[rstest]
    #[case("https://eprint.iacr.org/2015/525")]
    #[case("https://eprint.iacr.org/2015/525.pdf")]
    fn iacr_eprint_reads_the_pre_block(#[case] url: &str) {
        let fetcher = MockFetch::default()
            .pdf("https://eprint.iacr.org/2015/525.pdf")
            .page(
                "https://eprint.iacr.org/eprint-bin/cite.pl?entry=2015/525",
                "<html><body><pre>\n@misc{eprint-2015-525,\n title = {T}\n}\n</pre></body></html>",
            );

        let download = run(&fetcher, url, BOTH).unwrap().unwrap();
        assert_eq!(download.pdf.as_deref(), Some(PDF));
        assert_eq!(bibtex_of(&download), "@misc{eprint-2015-525,\n title = {T}\n}");
    }

    #[test]
    fn springer_link_uses_the_citation_service() {
        let page = r#"<div id="cobranding-and-download-availability-text"><div>
            <a href="/content/pdf/10.1007%2F978-3-540-28628-8_20.pdf">Download</a></div></div>"#;
        let fetcher = MockFetch::default()
            .page("https://link.springer.com/chapter/10.1007/978-3-540-28628-8_20", page)
            .pdf("https://link.springer.com/content/pdf/10.1007%2F978-3-540-28628-8_20.pdf")
            .page(
                "https://citation-needed.springer.com/v2/references/10.1007/978-3-540-28628-8_20?format=bibtex&flavour=citation",
                "@inproceedings{BB04}",
            );

        let download = run(
            &fetcher,
            "https://link.springer.com/chapter/10.1007/978-3-540-28628-8_20",
            BOTH,
        )
        .unwrap()
        .unwrap();
        assert_eq!(download.pdf.as_deref(), Some(PDF));
        assert_eq!(bibtex_of(&download), "@inproceedings{BB04}");
    }

    #[test]
    fn springer_link_without_download_link() {
        let fetcher = MockFetch::default().page(
            "https://link.springer.com/chapter/10.1007/978-3-540-28628-8_20",
            "<html><body>Log in to access</body></html>",
        );
        let err = run(
            &fetcher,
            "https://link.springer.com/chapter/10.1007/978-3-540-28628-8_20",
            BOTH,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            SiteError::MissingDownloadLink { site: "SpringerLink", what: "PDF" }
        ));
    }

    #[test]
    fn siam_builds_links_from_the_doi() {
        let fetcher = MockFetch::default()
            .pdf("https://epubs.siam.org/doi/pdf/10.1137/S0097539790187084")
            .page(
                "https://epubs.siam.org/action/downloadCitation?doi=10.1137%2FS0097539790187084&format=bibtex&include=cit",
                "@article{S0097539790187084}",
            );

        let download = run(
            &fetcher,
            "https://epubs.siam.org/doi/10.1137/S0097539790187084",
            BOTH,
        )
        .unwrap()
        .unwrap();
        assert_eq!(download.pdf.as_deref(), Some(PDF));
        assert_eq!(bibtex_of(&download), "@article{S0097539790187084}");
        assert_eq!(fetcher.requested().len(), 2);
    }

    #[test]
    fn ieee_xplore_follows_the_iframe_and_strips_br() {
        let fetcher = MockFetch::default()
            .page(
                "https://ieeexplore.ieee.org/stamp/stamp.jsp?tp=&arnumber=7958589",
                r#"<html><body><iframe src="https://ieeexplore.ieee.org/ielx7/7957740/7958557/07958589.pdf"></iframe></body></html>"#,
            )
            .pdf("https://ieeexplore.ieee.org/ielx7/7957740/7958557/07958589.pdf")
            .page(
                "https://ieeexplore.ieee.org/xpl/downloadCitations?recordIds=7958589&download-format=download-bibtex&citations-format=citation-abstract",
                "@INPROCEEDINGS{7958589,<br>author={A. Author},<br>}",
            );

        let download = run(&fetcher, "https://ieeexplore.ieee.org/document/7958589/", BOTH)
            .unwrap()
            .unwrap();
        assert_eq!(download.pdf.as_deref(), Some(PDF));
        assert_eq!(bibtex_of(&download), "@INPROCEEDINGS{7958589,author={A. Author},}");
    }

    #[test]
    fn bibtex_only_skips_the_pdf() {
        let fetcher = MockFetch::default().page(
            "https://ieeexplore.ieee.org/xpl/downloadCitations?recordIds=7958589&download-format=download-bibtex&citations-format=citation-abstract",
            "@misc{x}",
        );
        let want = Want {
            pdf: false,
            bibtex: true,
        };

        let download = run(&fetcher, "https://ieeexplore.ieee.org/document/7958589", want)
            .unwrap()
            .unwrap();
        assert!(download.pdf.is_none());
        assert_eq!(fetcher.requested().len(), 1);
    }

    #[rstest]
    #[case("https://arxiv.org/abs/2101.00001v2")]
    #[case("https://arxiv.org/pdf/2101.00001v2")]
    #[case("https://arxiv.org/pdf/2101.00001v2.pdf")]
    fn arxiv_accepts_abs_and_pdf_links(#[case] url: &str) {
        let fetcher = MockFetch::default()
            .pdf("https://arxiv.org/pdf/2101.00001v2.pdf")
            .page("https://arxiv.org/bibtex/2101.00001v2", "@misc{arxiv}");

        let download = run(&fetcher, url, BOTH).unwrap().unwrap();
        assert_eq!(download.pdf.as_deref(), Some(PDF));
        assert_eq!(bibtex_of(&download), "@misc{arxiv}");
    }

    #[test]
    fn html_instead_of_pdf_is_rejected() {
        let fetcher = MockFetch::default().with(
            "https://eprint.iacr.org/2015/525.pdf",
            response(200, "text/html", b"<html>login</html>"),
        );
        let err = run(&fetcher, "https://eprint.iacr.org/2015/525", BOTH).unwrap_err();
        assert!(matches!(
            err,
            SiteError::WrongContentType { content_type, .. } if content_type == "text/html"
        ));
    }

    #[test]
    fn non_200_is_an_http_error() {
        let fetcher = MockFetch::default();
        let err = run(&fetcher, "https://arxiv.org/abs/2101.00001", BOTH).unwrap_err();
        assert!(matches!(err, SiteError::HttpError { code: 404, .. }));
    }

    #[test]
    fn malformed_site_urls_are_rejected() {
        let fetcher = MockFetch::default();
        assert!(matches!(
            run(&fetcher, "https://ieeexplore.ieee.org/search", BOTH),
            Err(SiteError::InvalidUrl(_))
        ));
        assert!(matches!(
            run(&fetcher, "https://dl.acm.org/citation.cfm", BOTH),
            Err(SiteError::InvalidUrl(_))
        ));
    }
}
