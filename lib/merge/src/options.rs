//! Join options
//!
//! [`JoinOptions`] is what a [`crate::FuzzyJoiner`] runs with. It can be built
//! in code or read from a [`JoinConfig`] document, the serde form used by
//! configuration files and the command line.

use joinx_core::{Error, Result};
use joinx_encode::{validate_ngram_range, Analyzer, EncoderKind, NgramRange, Vectorizer, DEFAULT_NGRAM_RANGE};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which input table drives the search
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum JoinHow {
    /// Every left row looks up its closest right row
    #[default]
    Left,
    /// Every right row looks up its closest left row
    Right,
}

impl JoinHow {
    pub fn as_str(self) -> &'static str {
        match self {
            JoinHow::Left => "left",
            JoinHow::Right => "right",
        }
    }
}

impl fmt::Display for JoinHow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JoinHow {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "left" => Ok(JoinHow::Left),
            "right" => Ok(JoinHow::Right),
            other => Err(Error::InvalidHow(other.to_string())),
        }
    }
}

impl TryFrom<String> for JoinHow {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

/// Key columns of both tables
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum KeySpec {
    /// Same column names in both tables
    On(Vec<String>),
    /// Positionally paired column names
    LeftRight {
        left_on: Vec<String>,
        right_on: Vec<String>,
    },
}

impl KeySpec {
    pub fn on<S: Into<String>>(columns: impl IntoIterator<Item = S>) -> Self {
        KeySpec::On(columns.into_iter().map(Into::into).collect())
    }

    pub fn left_right<L, R>(left_on: impl IntoIterator<Item = L>, right_on: impl IntoIterator<Item = R>) -> Self
    where
        L: Into<String>,
        R: Into<String>,
    {
        KeySpec::LeftRight {
            left_on: left_on.into_iter().map(Into::into).collect(),
            right_on: right_on.into_iter().map(Into::into).collect(),
        }
    }

    /// Left and right key lists
    pub fn columns(&self) -> (&[String], &[String]) {
        match self {
            KeySpec::On(on) => (on, on),
            KeySpec::LeftRight { left_on, right_on } => (left_on, right_on),
        }
    }
}

/// Everything a fuzzy join is configured with
#[derive(Debug, Clone, Deserialize)]
#[serde(from = "JoinConfig")]
pub struct JoinOptions {
    pub how: JoinHow,
    pub keys: Option<KeySpec>,
    /// Built-in vectorizer for textual keys, used unless `vectorizer` is set
    pub encoder: EncoderKind,
    /// Caller-supplied vectorizer for textual keys
    pub vectorizer: Option<Box<dyn Vectorizer>>,
    pub analyzer: Analyzer,
    pub ngram_range: NgramRange,
    /// Append a `matching_score` column
    pub return_score: bool,
    /// Minimum score for a match to be accepted
    pub match_score: f64,
    /// Remove rejected rows instead of nulling their matched columns
    pub drop_unmatched: bool,
    /// Sort output rows by the main table's key columns
    pub sort: bool,
    /// Appended to overlapping left and right column names
    pub suffixes: (String, String),
}

impl Default for JoinOptions {
    fn default() -> Self {
        Self {
            how: JoinHow::default(),
            keys: None,
            encoder: EncoderKind::default(),
            vectorizer: None,
            analyzer: Analyzer::default(),
            ngram_range: DEFAULT_NGRAM_RANGE,
            return_score: false,
            match_score: 0.0,
            drop_unmatched: false,
            sort: false,
            suffixes: ("_x".to_string(), "_y".to_string()),
        }
    }
}

impl JoinOptions {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn on<S: Into<String>>(mut self, columns: impl IntoIterator<Item = S>) -> Self {
        self.keys = Some(KeySpec::on(columns));
        self
    }

    #[must_use]
    pub fn left_right_on<L, R>(mut self, left_on: impl IntoIterator<Item = L>, right_on: impl IntoIterator<Item = R>) -> Self
    where
        L: Into<String>,
        R: Into<String>,
    {
        self.keys = Some(KeySpec::left_right(left_on, right_on));
        self
    }

    #[must_use]
    pub fn how(mut self, how: JoinHow) -> Self {
        self.how = how;
        self
    }

    #[must_use]
    pub fn encoder(mut self, encoder: EncoderKind) -> Self {
        self.encoder = encoder;
        self
    }

    #[must_use]
    pub fn vectorizer(mut self, vectorizer: Box<dyn Vectorizer>) -> Self {
        self.vectorizer = Some(vectorizer);
        self
    }

    #[must_use]
    pub fn analyzer(mut self, analyzer: Analyzer) -> Self {
        self.analyzer = analyzer;
        self
    }

    #[must_use]
    pub fn ngram_range(mut self, ngram_range: NgramRange) -> Self {
        self.ngram_range = ngram_range;
        self
    }

    #[must_use]
    pub fn return_score(mut self, return_score: bool) -> Self {
        self.return_score = return_score;
        self
    }

    #[must_use]
    pub fn match_score(mut self, match_score: f64) -> Self {
        self.match_score = match_score;
        self
    }

    #[must_use]
    pub fn drop_unmatched(mut self, drop_unmatched: bool) -> Self {
        self.drop_unmatched = drop_unmatched;
        self
    }

    #[must_use]
    pub fn sort(mut self, sort: bool) -> Self {
        self.sort = sort;
        self
    }

    #[must_use]
    pub fn suffixes(mut self, left: impl Into<String>, right: impl Into<String>) -> Self {
        self.suffixes = (left.into(), right.into());
        self
    }

    /// Check everything that can be checked without looking at the tables
    pub fn validate(&self) -> Result<()> {
        let (left, right) = self.keys.as_ref().ok_or(Error::MissingKeys)?.columns();
        if left.is_empty() || right.is_empty() {
            return Err(Error::MissingKeys);
        }
        if left.len() != right.len() {
            return Err(Error::KeyCountMismatch {
                left: left.len(),
                right: right.len(),
            });
        }
        validate_ngram_range(self.ngram_range)?;
        if !self.match_score.is_finite() {
            return Err(Error::InvalidMatchScore(self.match_score));
        }
        Ok(())
    }

    /// Textual vectorizer for one join: the caller's one if given, otherwise
    /// a fresh built-in one
    pub fn text_vectorizer(&self) -> Box<dyn Vectorizer> {
        match &self.vectorizer {
            Some(v) => v.clone(),
            None => self.encoder.build(self.analyzer, self.ngram_range),
        }
    }
}

/// One column name or a list of them
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Columns {
    One(String),
    Many(Vec<String>),
}

impl Columns {
    pub fn into_vec(self) -> Vec<String> {
        match self {
            Columns::One(name) => vec![name],
            Columns::Many(names) => names,
        }
    }
}

/// Serialisable join configuration
///
/// `on` takes precedence over `left_on`/`right_on`. Unset keys are reported
/// when the options are validated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct JoinConfig {
    pub how: JoinHow,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub on: Option<Columns>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub left_on: Option<Columns>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub right_on: Option<Columns>,
    pub encoder: EncoderKind,
    pub analyzer: Analyzer,
    pub ngram_range: NgramRange,
    pub return_score: bool,
    pub match_score: f64,
    pub drop_unmatched: bool,
    pub sort: bool,
    pub suffixes: (String, String),
}

impl Default for JoinConfig {
    fn default() -> Self {
        let options = JoinOptions::default();
        Self {
            how: options.how,
            on: None,
            left_on: None,
            right_on: None,
            encoder: options.encoder,
            analyzer: options.analyzer,
            ngram_range: options.ngram_range,
            return_score: options.return_score,
            match_score: options.match_score,
            drop_unmatched: options.drop_unmatched,
            sort: options.sort,
            suffixes: options.suffixes,
        }
    }
}

impl JoinConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

impl From<JoinConfig> for JoinOptions {
    fn from(config: JoinConfig) -> Self {
        let keys = match (config.on, config.left_on, config.right_on) {
            (Some(on), _, _) => Some(KeySpec::On(on.into_vec())),
            (None, Some(left_on), Some(right_on)) => Some(KeySpec::LeftRight {
                left_on: left_on.into_vec(),
                right_on: right_on.into_vec(),
            }),
            _ => None,
        };
        Self {
            how: config.how,
            keys,
            encoder: config.encoder,
            vectorizer: None,
            analyzer: config.analyzer,
            ngram_range: config.ngram_range,
            return_score: config.return_score,
            match_score: config.match_score,
            drop_unmatched: config.drop_unmatched,
            sort: config.sort,
            suffixes: config.suffixes,
        }
    }
}
