//! Text analyzers
//!
//! Turn a document into the list of n-gram features a vectorizer counts.
//! Documents are lowercased first.

use joinx_core::{Error, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

/// Inclusive n-gram length bounds
pub type NgramRange = (usize, usize);

/// Default n-gram bounds for textual keys
pub const DEFAULT_NGRAM_RANGE: NgramRange = (2, 4);

/// Word tokens: two or more Unicode word characters
static TOKEN_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?u)\b\w\w+\b").expect("Invalid token regex"));

static WHITESPACE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s\s+").expect("Invalid whitespace regex"));

/// How documents are split into features
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", try_from = "String")]
pub enum Analyzer {
    /// Word n-grams over tokens of two or more word characters
    Word,
    /// Character n-grams over the whole document
    Char,
    /// Character n-grams inside word boundaries, words padded with a space
    #[default]
    CharWb,
}

impl Analyzer {
    pub fn as_str(self) -> &'static str {
        match self {
            Analyzer::Word => "word",
            Analyzer::Char => "char",
            Analyzer::CharWb => "char_wb",
        }
    }

    /// Extract the n-gram features of one document
    pub fn analyze(self, doc: &str, (min_n, max_n): NgramRange) -> Vec<String> {
        let min_n = min_n.max(1);
        let doc = doc.to_lowercase();
        match self {
            Analyzer::Word => word_ngrams(&word_tokens(&doc), min_n, max_n),
            Analyzer::Char => char_ngrams(&collapse_whitespace(&doc), min_n, max_n),
            Analyzer::CharWb => char_wb_ngrams(&collapse_whitespace(&doc), min_n, max_n),
        }
    }
}

impl fmt::Display for Analyzer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Analyzer {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "word" => Ok(Analyzer::Word),
            "char" => Ok(Analyzer::Char),
            "char_wb" => Ok(Analyzer::CharWb),
            other => Err(Error::InvalidAnalyzer(other.to_string())),
        }
    }
}

impl TryFrom<String> for Analyzer {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

/// Check `1 <= min <= max`
pub fn validate_ngram_range((min, max): NgramRange) -> Result<()> {
    if min == 0 || min > max {
        return Err(Error::InvalidNgramRange { min, max });
    }
    Ok(())
}

fn word_tokens(doc: &str) -> Vec<&str> {
    TOKEN_PATTERN.find_iter(doc).map(|m| m.as_str()).collect()
}

fn word_ngrams(tokens: &[&str], min_n: usize, max_n: usize) -> Vec<String> {
    let mut out = Vec::new();
    for n in min_n..=max_n.min(tokens.len()) {
        out.extend(tokens.windows(n).map(|w| w.join(" ")));
    }
    out
}

/// Replace every run of two or more whitespace characters with one space
fn collapse_whitespace(doc: &str) -> String {
    WHITESPACE_RUN.replace_all(doc, " ").into_owned()
}

fn char_ngrams(doc: &str, min_n: usize, max_n: usize) -> Vec<String> {
    let chars: Vec<char> = doc.chars().collect();
    let mut out = Vec::new();
    for n in min_n..=max_n.min(chars.len()) {
        out.extend(chars.windows(n).map(|w| w.iter().collect::<String>()));
    }
    out
}

fn char_wb_ngrams(doc: &str, min_n: usize, max_n: usize) -> Vec<String> {
    let mut out = Vec::new();
    for word in doc.split_whitespace() {
        let padded: Vec<char> = std::iter::once(' ')
            .chain(word.chars())
            .chain(std::iter::once(' '))
            .collect();
        let len = padded.len();
        for n in min_n..=max_n {
            if n >= len {
                // a word no longer than n is emitted once, whole
                out.push(padded.iter().collect());
                break;
            }
            out.extend(padded.windows(n).map(|w| w.iter().collect::<String>()));
        }
    }
    out
}
