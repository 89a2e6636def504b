//! Field normalization: raw cell -> canonical comparison value.
//!
//! Every function here is total. When a typed rule does not apply the value
//! degrades to its trimmed lowercase form instead of failing, and nothing is
//! logged: that fallback is part of the comparison policy.
//!
//! | Type      | Example input          | Canonical form |
//! |-----------|------------------------|----------------|
//! | `boolean` | `" Yes "`, `"1"`       | `true`         |
//! | `rate`    | `"8,1%"`, `"0.081"`    | `0.081000`     |
//! | `name`    | `"Café-Services (DE)"` | `cafe`         |
//! | `text`    | `"  Österreich "`      | `osterreich`   |

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use unicode_normalization::{char::is_combining_mark, UnicodeNormalization};

use crate::models::{DedupConfig, FieldType, DEFAULT_STOP_WORDS};

const TRUTHY: &[&str] = &["true", "1", "yes", "y", "wahr"];
const FALSY: &[&str] = &["false", "0", "no", "n", "falsch"];

static PARENTHESIZED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\([^)]*\)").expect("valid parenthesis pattern"));

static DASHES: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[-\x{2010}-\x{2015}\x{2212}\x{FE58}\x{FE63}\x{FF0D}]").expect("valid dash pattern")
});

static NAME_DISALLOWED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\p{L}\p{N}\s,.]").expect("valid character class"));

static DEFAULT_NORMALIZER: Lazy<FieldNormalizer> = Lazy::new(FieldNormalizer::default);

/// Normalize with the default stop-word set.
pub fn normalize(field_type: FieldType, raw: &str) -> String {
    DEFAULT_NORMALIZER.normalize(field_type, raw)
}

/// Normalizer carrying the stop words used for `name` fields.
#[derive(Debug, Clone)]
pub struct FieldNormalizer {
    stop_words: HashSet<String>,
}

impl FieldNormalizer {
    /// Stop words are folded the same way names are, so `Gebühr` matches `gebuhr`.
    pub fn new<S: AsRef<str>>(stop_words: &[S]) -> Self {
        let stop_words = stop_words
            .iter()
            .map(|w| fold(w.as_ref()).trim().to_string())
            .filter(|w| !w.is_empty())
            .collect();
        Self { stop_words }
    }

    pub fn from_config(config: &DedupConfig) -> Self {
        Self::new(config.stop_words.as_slice())
    }

    /// A normalizer that removes no words.
    pub fn without_stop_words() -> Self {
        Self { stop_words: HashSet::new() }
    }

    pub fn normalize(&self, field_type: FieldType, raw: &str) -> String {
        match field_type {
            FieldType::Boolean => normalize_boolean(raw),
            FieldType::Rate => normalize_rate(raw),
            FieldType::Name => self.normalize_name(raw),
            FieldType::Text => normalize_text(raw),
        }
    }

    /// Free-text name: fold, drop parentheses and punctuation, drop stop words.
    pub fn normalize_name(&self, raw: &str) -> String {
        let folded = fold(raw);
        let without_parens = PARENTHESIZED.replace_all(&folded, "");
        let without_dashes = DASHES.replace_all(&without_parens, " ");
        let cleaned = NAME_DISALLOWED.replace_all(&without_dashes, "");

        let kept: Vec<&str> = cleaned
            .split_whitespace()
            .filter(|token| !self.is_stop_word(token))
            .collect();

        decimal_commas_to_points(&kept.join(" ")).trim().to_string()
    }

    fn is_stop_word(&self, token: &str) -> bool {
        let bare = token.trim_matches(|c| c == ',' || c == '.');
        !bare.is_empty() && self.stop_words.contains(bare)
    }
}

impl Default for FieldNormalizer {
    fn default() -> Self {
        Self::new(DEFAULT_STOP_WORDS)
    }
}

/// `true` / `false` for recognized spellings, trimmed lowercase otherwise.
pub fn normalize_boolean(raw: &str) -> String {
    let value = raw.trim().to_lowercase();
    if TRUTHY.contains(&value.as_str()) {
        "true".to_string()
    } else if FALSY.contains(&value.as_str()) {
        "false".to_string()
    } else {
        value
    }
}

/// Rate as a 6-decimal fraction.
///
/// Magnitudes above 1 are read as percentages, so `8.1`, `8,1%` and `0.081`
/// all become `0.081000`. A fraction above 1 (e.g. `1.5` meaning 150%) is
/// read the same way and becomes `0.015000`; `1%` and `1` both stay
/// `1.000000`.
pub fn normalize_rate(raw: &str) -> String {
    let trimmed = raw.trim();
    let number = trimmed
        .strip_suffix('%')
        .unwrap_or(trimmed)
        .trim()
        .replace(',', ".");

    match number.parse::<f64>() {
        Ok(value) if value.is_finite() => {
            let fraction = if value.abs() > 1.0 { value / 100.0 } else { value };
            let formatted = format!("{:.6}", fraction);
            if formatted == "-0.000000" {
                "0.000000".to_string()
            } else {
                formatted
            }
        }
        _ => trimmed.to_ascii_lowercase(),
    }
}

/// Country/category-like text: fold and collapse whitespace.
pub fn normalize_text(raw: &str) -> String {
    collapse_whitespace(&fold(raw))
}

/// Lowercase, decompose and drop combining marks.
pub fn fold(raw: &str) -> String {
    raw.to_lowercase()
        .nfkd()
        .filter(|c| !is_combining_mark(*c))
        .collect()
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// `8,5` -> `8.5`; commas not between two digits are kept.
fn decimal_commas_to_points(s: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    chars
        .iter()
        .enumerate()
        .map(|(i, &c)| {
            let between_digits = c == ','
                && i > 0
                && chars[i - 1].is_ascii_digit()
                && chars.get(i + 1).is_some_and(|n| n.is_ascii_digit());
            if between_digits {
                '.'
            } else {
                c
            }
        })
        .collect()
}
