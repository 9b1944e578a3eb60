use core::fmt::{Debug, Formatter};
use regex::Regex;
use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer};

/// A regular expression compiled when the schema is loaded.
#[derive(Clone)]
pub struct Pattern(Regex);

impl Pattern {
    /// # Errors
    ///
    /// Returns an error if `source` is not a valid regular expression.
    pub fn new(source: &str) -> Result<Self, regex::Error> {
        Regex::new(source).map(Self)
    }

    #[must_use]
    pub const fn regex(&self) -> &Regex {
        &self.0
    }

    #[must_use]
    pub fn is_match(&self, text: &str) -> bool {
        self.0.is_match(text)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Debug for Pattern {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        write!(f, "/{}/", self.0.as_str())
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl<'de> Deserialize<'de> for Pattern {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let source = String::deserialize(deserializer)?;
        Self::new(&source).map_err(|e| D::Error::custom(format!("invalid pattern '{source}': {e}")))
    }
}

/// Matches a key either exactly or with a `/regex/` literal.
#[derive(Debug, Clone, PartialEq)]
pub enum KeyMatcher {
    Exact(String),
    Regex(Pattern),
}

impl KeyMatcher {
    /// Parse `/regex/` as a pattern and anything else as an exact key.
    ///
    /// # Errors
    ///
    /// Returns an error if a `/regex/` literal does not compile.
    pub fn parse(source: &str) -> Result<Self, regex::Error> {
        match source.strip_prefix('/').and_then(|s| s.strip_suffix('/')) {
            Some(pattern) if !pattern.is_empty() => Pattern::new(pattern).map(Self::Regex),
            _ => Ok(Self::Exact(source.to_string())),
        }
    }

    #[must_use]
    pub fn is_match(&self, key: &str) -> bool {
        match self {
            Self::Exact(exact) => exact == key,
            Self::Regex(pattern) => pattern.is_match(key),
        }
    }
}

impl<'de> Deserialize<'de> for KeyMatcher {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let source = String::deserialize(deserializer)?;
        Self::parse(&source).map_err(|e| D::Error::custom(format!("invalid pattern '{source}': {e}")))
    }
}
