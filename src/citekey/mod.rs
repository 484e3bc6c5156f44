mod error;
pub use error::CitekeyError;

use crate::bibtex::BibEntry;
use std::fmt;
use std::str::FromStr;
use tracing::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

/// Up to this many authors, every author contributes an initial.
const MAX_LISTED_AUTHORS: usize = 4;
/// With more authors than `MAX_LISTED_AUTHORS`, only this many are used, plus a `+`.
const OVERFLOW_LISTED_AUTHORS: usize = 3;
/// A single author contributes this many letters of their last name.
const SINGLE_AUTHOR_PREFIX: usize = 4;

/// How a citation key is derived from a new paper's BibTeX.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CkPolicy {
    /// Keep the key the BibTeX came with.
    KeepBibtex,
    /// Google-Scholar style, e.g. `jean2020zero`.
    FirstAuthorYearTitle,
    /// e.g. `SJ21`, `Kate10`, `ABC+19`.
    InitialsShortYear,
    /// e.g. `SJ2021`.
    InitialsFullYear,
}

impl CkPolicy {
    pub const ALL: [CkPolicy; 4] = [
        CkPolicy::KeepBibtex,
        CkPolicy::FirstAuthorYearTitle,
        CkPolicy::InitialsShortYear,
        CkPolicy::InitialsFullYear,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            CkPolicy::KeepBibtex => "KeepBibtex",
            CkPolicy::FirstAuthorYearTitle => "FirstAuthorYearTitle",
            CkPolicy::InitialsShortYear => "InitialsShortYear",
            CkPolicy::InitialsFullYear => "InitialsFullYear",
        }
    }
}

impl FromStr for CkPolicy {
    type Err = CitekeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|policy| policy.name() == s.trim())
            .ok_or_else(|| CitekeyError::UnknownPolicy(s.to_string()))
    }
}

impl fmt::Display for CkPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

static NONSPACING_MARK: Lazy<Regex> = Lazy::new(|| Regex::new(r"\p{Mn}").unwrap());

/// Removes diacritics: `"café"` becomes `"cafe"`. Letters with no canonical
/// decomposition (`ø`, `ł`) are returned as they are.
pub fn strip_accents(s: &str) -> String {
    let decomposed: String = s.nfd().collect();
    NONSPACING_MARK.replace_all(&decomposed, "").into_owned()
}

/// Splits an `author` field on `" and "`, treating line breaks and tabs as spaces.
pub fn split_authors(author_field: &str) -> Vec<String> {
    author_field
        .replace(['\n', '\r', '\t'], " ")
        .split(" and ")
        .map(str::to_string)
        .collect()
}

/// Heuristic last name of `"First Last"` or `"Last, First"`.
///
/// Everything but ASCII letters, spaces and commas is dropped first. Name
/// particles are not recognized, so `"van Damme"` yields `"Damme"`.
pub fn last_name_of(raw_name: &str) -> String {
    let name: String = raw_name
        .chars()
        .filter(|c| c.is_ascii_alphabetic() || *c == ' ' || *c == ',')
        .collect();
    let name = name.trim();

    let last_name = match name.split_once(',') {
        Some((last, _)) => last.trim(),
        None => name.split_whitespace().last().unwrap_or_default(),
    };
    debug!(name, last_name, "parsed last name");
    last_name.to_string()
}

/// Initials of the first few authors: the first four letters of the last
/// name for a single author, one uppercase letter per author otherwise, and a
/// trailing `+` when more than four authors were listed.
pub fn author_initials(author_field: &str) -> String {
    let all_authors = split_authors(author_field);
    let overflow = all_authors.len() > MAX_LISTED_AUTHORS;
    let keep = if overflow {
        OVERFLOW_LISTED_AUTHORS
    } else {
        MAX_LISTED_AUTHORS
    };
    let authors = &all_authors[..all_authors.len().min(keep)];
    debug!(?authors, overflow, "authors used for initials");

    let mut initials: String = match authors {
        [single] => last_name_of(single).chars().take(SINGLE_AUTHOR_PREFIX).collect(),
        _ => authors
            .iter()
            .filter_map(|author| last_name_of(author).chars().next())
            .map(|c| c.to_ascii_uppercase())
            .collect(),
    };

    if overflow {
        initials.push('+');
    }
    initials
}

fn first_author_year_title(entry: &BibEntry) -> String {
    let first_word = |s: &str| {
        s.split_whitespace()
            .next()
            .unwrap_or_default()
            .to_lowercase()
    };
    let key = format!(
        "{}{}{}",
        first_word(entry.get("author")),
        entry.get("year"),
        first_word(entry.get("title"))
    );

    strip_accents(&key)
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        .collect()
}

fn short_year(year: &str) -> &str {
    match year.char_indices().rev().nth(1) {
        Some((i, _)) => &year[i..],
        None => year,
    }
}

/// Derives the citation key for `entry` under `policy`. Never returns an
/// empty key.
pub fn derive_key(policy: CkPolicy, entry: &BibEntry) -> Result<String, CitekeyError> {
    let key = match policy {
        CkPolicy::KeepBibtex => entry.key.clone(),
        CkPolicy::FirstAuthorYearTitle => first_author_year_title(entry),
        CkPolicy::InitialsShortYear => {
            author_initials(entry.get("author")) + short_year(entry.get("year").trim())
        }
        CkPolicy::InitialsFullYear => author_initials(entry.get("author")) + entry.get("year").trim(),
    };

    if key.is_empty() {
        return Err(CitekeyError::EmptyKey);
    }
    debug!(%policy, key = %key, "derived citation key");
    Ok(key)
}

/// Citation keys double as file names, so only a small alphabet is allowed.
/// Dots are excluded because `<ck>.<suffix>.pdf` files are attachments.
pub fn is_valid_key(key: &str) -> bool {
    !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '_' | ':'))
}

pub fn validate_key(key: &str) -> Result<&str, CitekeyError> {
    if is_valid_key(key) {
        Ok(key)
    } else {
        Err(CitekeyError::InvalidKey(key.to_string()))
    }
}
