//! Turns LaTeX-encoded letters (`{\'e}`, `\"{o}`, `\c{c}`, `\ss`) into Unicode
//! for display. Stored `.bib` files are never rewritten with the result.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use unicode_normalization::UnicodeNormalization;

static SYMBOL_ACCENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"\\([`'^"~=.])\s*(?:\{\s*(\\[ij]|[A-Za-z])\s*\}|(\\[ij]|[A-Za-z]))"#).unwrap()
});
static LETTER_ACCENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\\([cvuHrkd])(?:\s*\{\s*(\\[ij]|[A-Za-z])\s*\}|\s+([A-Za-z]))").unwrap()
});
static SPECIAL_LETTER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\\(ss|ae|AE|oe|OE|aa|AA|o|O|l|L|i|j)\b(?:\{\}|\s)?").unwrap());
static ESCAPED: Lazy<Regex> = Lazy::new(|| Regex::new(r"\\([&%$#_])").unwrap());

pub fn latex_to_unicode(text: &str) -> String {
    let text = SYMBOL_ACCENT.replace_all(text, compose_accent);
    let text = LETTER_ACCENT.replace_all(&text, compose_accent);
    let text = SPECIAL_LETTER.replace_all(&text, |caps: &Captures| special_letter(&caps[1]));
    ESCAPED.replace_all(&text, "$1").into_owned()
}

fn compose_accent(caps: &Captures) -> String {
    let base = caps
        .get(2)
        .or_else(|| caps.get(3))
        .map(|m| m.as_str())
        .unwrap_or_default();
    // accented dotless i/j compose from the plain letter
    let base = base.trim_start_matches('\\');

    match combining_mark(&caps[1]) {
        Some(mark) => format!("{}{}", base, mark).nfc().collect(),
        None => caps[0].to_string(),
    }
}

fn combining_mark(accent: &str) -> Option<char> {
    let mark = match accent {
        "`" => '\u{0300}',
        "'" => '\u{0301}',
        "^" => '\u{0302}',
        "~" => '\u{0303}',
        "=" => '\u{0304}',
        "u" => '\u{0306}',
        "." => '\u{0307}',
        "\"" => '\u{0308}',
        "r" => '\u{030A}',
        "H" => '\u{030B}',
        "v" => '\u{030C}',
        "d" => '\u{0323}',
        "c" => '\u{0327}',
        "k" => '\u{0328}',
        _ => return None,
    };
    Some(mark)
}

fn special_letter(name: &str) -> &'static str {
    match name {
        "ss" => "ß",
        "ae" => "æ",
        "AE" => "Æ",
        "oe" => "œ",
        "OE" => "Œ",
        "aa" => "å",
        "AA" => "Å",
        "o" => "ø",
        "O" => "Ø",
        "l" => "ł",
        "L" => "Ł",
        "i" => "ı",
        _ => "ȷ",
    }
}
