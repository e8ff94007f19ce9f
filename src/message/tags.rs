//! Message tag block: parsing, escaping, and merge semantics.
//!
//! A tag block is the `@key=value;flag;key2=` prefix of a line. Keys map to
//! an optional value; a bare key (no `=`) is a boolean flag and maps to
//! `None`, while `key=` maps to an empty string.

use std::collections::BTreeMap;
use std::fmt::{self, Result as FmtResult, Write};

/// Ordered mapping from tag key to optional value.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Tags(BTreeMap<String, Option<String>>);

impl Tags {
    /// Create an empty tag mapping.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the body of a tag block (the text between `@` and the first space).
    ///
    /// Fields are split on `;` and then on the first `=`. Values are unescaped.
    /// Empty fields (e.g. a trailing `;`) are skipped.
    #[must_use]
    pub fn parse(block: &str) -> Self {
        let map = block
            .split(';')
            .filter(|field| !field.is_empty())
            .map(|field| match field.split_once('=') {
                Some((key, value)) => (key.to_string(), Some(unescape_tag_value(value))),
                None => (field.to_string(), None),
            })
            .collect();
        Self(map)
    }

    /// Look up a tag that carries a value. Flags and missing keys yield `None`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(|v| v.as_deref())
    }

    /// Look up a tag, returning `None` only when the key is absent.
    #[must_use]
    pub fn entry(&self, key: &str) -> Option<Option<&str>> {
        self.0.get(key).map(|v| v.as_deref())
    }

    /// Whether the key is present at all, with or without a value.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Parse a tag value as a number. Missing, flag-only or malformed values yield `None`.
    pub fn parse_value<T: std::str::FromStr>(&self, key: &str) -> Option<T> {
        self.get(key).and_then(|v| v.parse().ok())
    }

    /// Interpret `0`/`1` style values as a boolean.
    #[must_use]
    pub fn flag(&self, key: &str) -> Option<bool> {
        self.get(key).map(|v| v != "0" && !v.is_empty())
    }

    /// Insert or overwrite a single tag.
    pub fn insert(&mut self, key: impl Into<String>, value: Option<String>) {
        self.0.insert(key.into(), value);
    }

    /// Merge `other` into `self`: keys present in `other` overwrite,
    /// keys absent from `other` keep their prior value.
    pub fn merge(&mut self, other: &Tags) {
        for (key, value) in &other.0 {
            self.0.insert(key.clone(), value.clone());
        }
    }

    /// Number of tags.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no tags are present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over `(key, value)` pairs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_deref()))
    }
}

impl<K: Into<String>> FromIterator<(K, Option<String>)> for Tags {
    fn from_iter<I: IntoIterator<Item = (K, Option<String>)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

impl fmt::Display for Tags {
    /// Serializes the block body without the leading `@`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> FmtResult {
        for (i, (key, value)) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_char(';')?;
            }
            f.write_str(key)?;
            if let Some(value) = value {
                f.write_char('=')?;
                escape_tag_value(&mut *f, value)?;
            }
        }
        Ok(())
    }
}

/// Escape a tag value for serialization.
///
/// Escapes special characters according to the IRCv3 message-tags rules.
pub fn escape_tag_value(f: &mut dyn Write, value: &str) -> FmtResult {
    for c in value.chars() {
        match c {
            ';' => f.write_str("\\:")?,
            ' ' => f.write_str("\\s")?,
            '\\' => f.write_str("\\\\")?,
            '\r' => f.write_str("\\r")?,
            '\n' => f.write_str("\\n")?,
            c => f.write_char(c)?,
        }
    }
    Ok(())
}

/// Unescape a tag value from wire format.
///
/// Reverses the escaping applied by [`escape_tag_value`].
pub(crate) fn unescape_tag_value(value: &str) -> String {
    if !value.contains('\\') {
        return value.to_string();
    }
    let mut unescaped = String::with_capacity(value.len());
    let mut iter = value.chars();
    while let Some(c) = iter.next() {
        let r = if c == '\\' {
            match iter.next() {
                Some(':') => ';',
                Some('s') => ' ',
                Some('\\') => '\\',
                Some('r') => '\r',
                Some('n') => '\n',
                Some(c) => c,
                None => break,
            }
        } else {
            c
        };
        unescaped.push(r);
    }
    unescaped
}
