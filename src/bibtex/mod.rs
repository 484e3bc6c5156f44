mod error;
pub mod latex;
pub use error::BibtexError;

use biblatex::{RawBibliography, RawChunk, Spanned};
use chrono::NaiveDateTime;
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use tracing::debug;

/// Field recording when a paper entered the library.
pub const DATE_ADDED_FIELD: &str = "ckdateadded";
pub const DATE_ADDED_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const MONTHS: [(&str, &str); 12] = [
    ("jan", "January"),
    ("feb", "February"),
    ("mar", "March"),
    ("apr", "April"),
    ("may", "May"),
    ("jun", "June"),
    ("jul", "July"),
    ("aug", "August"),
    ("sep", "September"),
    ("oct", "October"),
    ("nov", "November"),
    ("dec", "December"),
];

static URL_MACRO: Lazy<Regex> = Lazy::new(|| Regex::new(r"\\url\{(.*)\}").unwrap());

/// One paper's metadata. Field values are kept exactly as written in the
/// `.bib` file, LaTeX included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BibEntry {
    pub key: String,
    pub entry_type: String,
    fields: IndexMap<String, String>,
}

impl BibEntry {
    pub fn new(key: impl Into<String>, entry_type: impl Into<String>) -> Self {
        BibEntry {
            key: key.into(),
            entry_type: entry_type.into().to_lowercase(),
            fields: IndexMap::new(),
        }
    }

    /// Parses text that must contain exactly one entry.
    pub fn parse(bibtex: &str) -> Result<Self, BibtexError> {
        let mut entries = parse_bibliography(bibtex)?;
        match entries.len() {
            0 => Err(BibtexError::NoEntries),
            1 => Ok(entries.remove(0)),
            n => Err(BibtexError::MultipleEntries(n)),
        }
    }

    /// Field value, or `""` when the field is absent.
    pub fn get(&self, name: &str) -> &str {
        self.field(name).unwrap_or_default()
    }

    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(&name.to_lowercase()).map(String::as_str)
    }

    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        self.fields.insert(name.to_lowercase(), value.into());
    }

    pub fn require(&self, names: &[&str]) -> Result<(), BibtexError> {
        match names.iter().find(|name| self.get(name).trim().is_empty()) {
            Some(name) => Err(BibtexError::MissingField {
                key: self.key.clone(),
                field: name.to_string(),
            }),
            None => Ok(()),
        }
    }

    /// Makes the entry match what is stored on disk under `expected_key`.
    ///
    /// * the citation key is replaced by `expected_key`;
    /// * `author` loses carriage returns and line breaks and is trimmed;
    /// * `title` is trimmed and wrapped in braces so BibTeX keeps its case.
    ///
    /// Absent `author`/`title` fields count as empty and stay absent.
    /// Returns whether anything changed.
    pub fn canonicalize(&mut self, expected_key: &str) -> bool {
        let mut updated = false;

        if self.key != expected_key {
            debug!(ck = expected_key, found = %self.key, "replacing citation key in .bib");
            self.key = expected_key.to_string();
            updated = true;
        }

        if let Some(author) = self.fields.get_mut("author") {
            let stripped = author.replace('\r', "").replace('\n', " ").trim().to_string();
            if *author != stripped {
                debug!(ck = expected_key, author = %stripped, "stripped author names");
                *author = stripped;
                updated = true;
            }
        }

        if let Some(title) = self.fields.get_mut("title") {
            let mut wrapped = title.trim().to_string();
            if !wrapped.is_empty() && !is_braced(&wrapped) {
                wrapped = format!("{{{}}}", wrapped);
            }
            if *title != wrapped {
                debug!(ck = expected_key, title = %wrapped, "added braces to title");
                *title = wrapped;
                updated = true;
            }
        }

        updated
    }

    /// Publication venue: `booktitle`, else `journal`, else a `howpublished`
    /// that is not just a link.
    pub fn venue(&self) -> Option<&str> {
        self.field("booktitle")
            .or_else(|| self.field("journal"))
            .or_else(|| self.field("howpublished").filter(|h| !h.contains("\\url")))
    }

    pub fn url(&self) -> Option<&str> {
        for name in ["note", "howpublished"] {
            if let Some(value) = self.field(name).filter(|v| v.contains("\\url")) {
                return URL_MACRO
                    .captures(value)
                    .and_then(|caps| caps.get(1))
                    .map(|m| m.as_str());
            }
        }

        if let Some(url) = self.field("url") {
            return Some(url);
        }

        // eprint is sometimes only an archive id
        self.field("eprint")
            .filter(|e| e.contains("http://") || e.contains("https://"))
    }

    pub fn date_added(&self) -> Option<NaiveDateTime> {
        self.field(DATE_ADDED_FIELD)
            .and_then(|s| NaiveDateTime::parse_from_str(s.trim(), DATE_ADDED_FORMAT).ok())
    }

    pub fn set_date_added(&mut self, at: NaiveDateTime) {
        self.set(DATE_ADDED_FIELD, at.format(DATE_ADDED_FORMAT).to_string());
    }

    pub fn to_bibtex(&self) -> String {
        let fields = self
            .fields
            .iter()
            .map(|(name, value)| format!(" {} = {{{}}}", name, value))
            .collect::<Vec<_>>();

        let mut bibtex = format!("@{}{{{}", self.entry_type, self.key);
        if fields.is_empty() {
            bibtex.push_str(",\n}");
        } else {
            bibtex.push_str(",\n");
            bibtex.push_str(&fields.join(",\n"));
            bibtex.push_str("\n}");
        }
        bibtex
    }
}

/// Parses every entry in `bibtex`. `@string` macros are substituted into the
/// fields that use them; `@preamble` and `@comment` blocks are skipped.
pub fn parse_bibliography(bibtex: &str) -> Result<Vec<BibEntry>, BibtexError> {
    let raw = RawBibliography::parse(bibtex).map_err(|e| BibtexError::Parse(e.to_string()))?;

    // later macros may refer to earlier ones
    let mut strings = HashMap::new();
    for pair in &raw.abbreviations {
        let value = field_text(&pair.value.v, &strings);
        strings.insert(pair.key.v.to_lowercase(), value);
    }

    Ok(raw
        .entries
        .iter()
        .map(|spanned| {
            let raw_entry = &spanned.v;
            let mut entry = BibEntry::new(raw_entry.key.v, raw_entry.kind.v);
            for pair in &raw_entry.fields {
                entry.set(pair.key.v, field_text(&pair.value.v, &strings));
            }
            entry
        })
        .collect())
}

fn field_text(chunks: &[Spanned<RawChunk<'_>>], strings: &HashMap<String, String>) -> String {
    chunks
        .iter()
        .map(|chunk| match &chunk.v {
            RawChunk::Normal(text) => text.to_string(),
            RawChunk::Abbreviation(name) => expand_abbreviation(name, strings),
        })
        .collect()
}

/// `@string` macros win, then bare month names (`month = jun`) become full
/// month names; anything else is kept by name.
fn expand_abbreviation(name: &str, strings: &HashMap<String, String>) -> String {
    let lower = name.to_lowercase();
    if let Some(value) = strings.get(&lower) {
        return value.clone();
    }
    MONTHS
        .iter()
        .find(|(abbrev, _)| *abbrev == lower)
        .map(|(_, month)| month.to_string())
        .unwrap_or_else(|| name.to_string())
}

/// A title counts as braced when it opens or closes with a brace, so partly
/// braced titles such as `{SNARKs}: A Survey` are left alone.
fn is_braced(title: &str) -> bool {
    title.starts_with('{') || title.ends_with('}')
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    const SAMPLE: &str = r#"
@InProceedings{KZG10,
  author    = {Aniket Kate and
               Gregory M. Zaverucha and Ian Goldberg},
  title     = {Constant-Size Commitments to Polynomials and Their Applications},
  booktitle = {ASIACRYPT 2010},
  year      = 2010,
  month     = dec,
  note      = {\url{https://doi.org/10.1007/978-3-642-17373-8_11}}
}
"#;

    #[test]
    fn parses_fields_verbatim() {
        let entry = BibEntry::parse(SAMPLE).unwrap();
        assert_eq!(entry.key, "KZG10");
        assert_eq!(entry.entry_type, "inproceedings");
        assert_eq!(entry.get("year"), "2010");
        assert_eq!(entry.get("booktitle"), "ASIACRYPT 2010");
        assert!(entry.get("author").contains('\n'));
    }

    #[test]
    fn bare_month_abbreviations_are_accepted() {
        let entry = BibEntry::parse(SAMPLE).unwrap();
        assert_eq!(entry.get("month"), "December");

        let sep = BibEntry::parse("@misc{x, title = {T}, month = sep}").unwrap();
        assert_eq!(sep.get("month"), "September");
    }

    #[test]
    fn string_macros_are_substituted() {
        let bibtex = r#"
@string{crypto = "CRYPTO 2019"}
@string{lncs = "LNCS, " # crypto}
@inproceedings{BBF19,
  title     = {Batching Techniques},
  booktitle = crypto,
  series    = lncs,
  month     = aug
}
"#;
        let entry = BibEntry::parse(bibtex).unwrap();
        assert_eq!(entry.get("booktitle"), "CRYPTO 2019");
        assert_eq!(entry.get("series"), "LNCS, CRYPTO 2019");
        assert_eq!(entry.get("month"), "August");
        assert!(entry.to_bibtex().contains("booktitle = {CRYPTO 2019}"));
    }

    #[test]
    fn latex_survives_a_round_trip() {
        let bibtex = r#"@article{Fra20, author = {Fran{\c{c}}ois M{\"u}ller}, title = {{SNARKs} in $\mathbb{F}_p$}}"#;
        let entry = BibEntry::parse(bibtex).unwrap();
        assert_eq!(entry.get("author"), r#"Fran{\c{c}}ois M{\"u}ller"#);

        let reparsed = BibEntry::parse(&entry.to_bibtex()).unwrap();
        assert_eq!(reparsed, entry);
    }

    #[test]
    fn absent_fields_default_to_empty() {
        let entry = BibEntry::new("abc", "misc");
        assert_eq!(entry.get("author"), "");
        assert_eq!(entry.field("author"), None);
    }

    #[test]
    fn malformed_or_empty_input_is_rejected() {
        assert!(matches!(BibEntry::parse(""), Err(BibtexError::NoEntries)));
        assert!(matches!(
            BibEntry::parse("@misc{a, title={A}}\n@misc{b, title={B}}"),
            Err(BibtexError::MultipleEntries(2))
        ));
        assert!(BibEntry::parse("@misc{a, title = {unclosed").is_err());
    }

    #[test]
    fn require_names_the_missing_field() {
        let mut entry = BibEntry::new("abc", "misc");
        entry.set("author", "Alice Smith");
        match entry.require(&["author", "title"]) {
            Err(BibtexError::MissingField { key, field }) => {
                assert_eq!(key, "abc");
                assert_eq!(field, "title");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn canonicalize_fixes_key_and_is_idempotent() {
        let mut entry = BibEntry::new("x", "misc");
        entry.set("author", "A. Author");
        entry.set("title", "{A Title}");

        assert!(entry.canonicalize("y"));
        assert_eq!(entry.key, "y");
        assert!(!entry.canonicalize("y"));
    }

    #[test]
    fn canonicalize_cleans_author_whitespace() {
        let mut entry = BibEntry::parse(SAMPLE).unwrap();
        assert!(entry.canonicalize("KZG10"));
        let author = entry.get("author");
        assert!(!author.contains('\n'));
        assert!(author.starts_with("Aniket Kate and "));
        assert!(author.ends_with("Ian Goldberg"));
    }

    #[rstest]
    #[case("A Title", "{A Title}")]
    #[case("{A Title}", "{A Title}")]
    #[case("  padded  ", "{padded}")]
    #[case("{A} and {B}", "{A} and {B}")]
    #[case("{SNARKs}: A Survey", "{SNARKs}: A Survey")]
    #[case("Proofs of {SNARKs}", "Proofs of {SNARKs}")]
    #[case("", "")]
    fn canonicalize_wraps_titles(#[case] title: &str, #[case] expected: &str) {
        let mut entry = BibEntry::new("k", "misc");
        entry.set("title", title);
        entry.canonicalize("k");
        assert_eq!(entry.get("title"), expected);
    }

    #[test]
    fn canonicalize_leaves_missing_author_and_title_absent() {
        let mut entry = BibEntry::new("k", "misc");
        assert!(!entry.canonicalize("k"));
        assert_eq!(entry.field("author"), None);
        assert_eq!(entry.field("title"), None);
    }

    #[rstest]
    #[case(&[("booktitle", "CRYPTO"), ("journal", "JoC")], Some("CRYPTO"))]
    #[case(&[("journal", "JoC")], Some("JoC"))]
    #[case(&[("howpublished", "Blog post")], Some("Blog post"))]
    #[case(&[("howpublished", "\\url{https://a.b}")], None)]
    #[case(&[], None)]
    fn venue_resolution_order(#[case] fields: &[(&str, &str)], #[case] expected: Option<&str>) {
        let mut entry = BibEntry::new("k", "misc");
        for (name, value) in fields {
            entry.set(name, *value);
        }
        assert_eq!(entry.venue(), expected);
    }

    #[rstest]
    #[case(&[("note", "Available at \\url{https://a.b/c}"), ("url", "https://other")], Some("https://a.b/c"))]
    #[case(&[("howpublished", "\\url{https://h.p}")], Some("https://h.p"))]
    #[case(&[("url", "https://u.rl")], Some("https://u.rl"))]
    #[case(&[("eprint", "https://eprint.iacr.org/2019/953")], Some("https://eprint.iacr.org/2019/953"))]
    #[case(&[("eprint", "1912.01234")], None)]
    fn url_resolution_order(#[case] fields: &[(&str, &str)], #[case] expected: Option<&str>) {
        let mut entry = BibEntry::new("k", "misc");
        for (name, value) in fields {
            entry.set(name, *value);
        }
        assert_eq!(entry.url(), expected);
    }

    #[test]
    fn date_added_round_trips() {
        let at = NaiveDate::from_ymd_opt(2021, 3, 4)
            .unwrap()
            .and_hms_opt(5, 6, 7)
            .unwrap();
        let mut entry = BibEntry::new("k", "misc");
        entry.set_date_added(at);
        assert_eq!(entry.get(DATE_ADDED_FIELD), "2021-03-04 05:06:07");
        assert_eq!(entry.date_added(), Some(at));
    }

    #[test]
    fn writes_one_field_per_line() {
        let mut entry = BibEntry::new("SJ21", "article");
        entry.set("author", "Alice Smith and Bob Jones");
        entry.set("title", "{On Things}");
        assert_eq!(
            entry.to_bibtex(),
            "@article{SJ21,\n author = {Alice Smith and Bob Jones},\n title = {{On Things}}\n}"
        );
    }
}
