use std::collections::{BTreeMap, BTreeSet};

/// Prefix used for the numbered slots of unmatched tokens
pub const WILDCARD_PREFIX: &str = "wildcard";

/// Option schema supplied by a plugin when it asks for a command to be parsed.
///
/// Each key lists the tokens it accepts. Keys are kept in insertion order and
/// that order decides which key claims a token listed under several keys.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandSchema {
    options: Vec<(String, BTreeSet<String>)>,
}

impl CommandSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn option<I, S>(mut self, key: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let key = key.into();
        let values: BTreeSet<String> = values.into_iter().map(Into::into).collect();
        match self.options.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => existing.extend(values),
            None => self.options.push((key, values)),
        }
        self
    }

    pub fn options(&self) -> impl Iterator<Item = (&str, &BTreeSet<String>)> {
        self.options.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn is_key(&self, token: &str) -> bool {
        self.options.iter().any(|(k, _)| k == token)
    }

    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }
}

/// Result of parsing a token list against a [`CommandSchema`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedCommand {
    matched: BTreeMap<String, String>,
    wildcards: Vec<String>,
    /// Tokens that spelled a schema key and were dropped
    key_tokens: usize,
}

impl ParsedCommand {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, token: impl Into<String>) {
        self.matched.insert(key.into(), token.into());
    }

    pub fn push_wildcard(&mut self, token: impl Into<String>) {
        self.wildcards.push(token.into());
    }

    /// Account for a token that named a schema key
    pub fn skip_key_token(&mut self) {
        self.key_tokens += 1;
    }

    /// Token matched for a schema key
    pub fn get(&self, key: &str) -> Option<&str> {
        self.matched.get(key).map(String::as_str)
    }

    /// Leftover token in slot `index` (`wildcard{index}`)
    pub fn wildcard(&self, index: usize) -> Option<&str> {
        self.wildcards.get(index).map(String::as_str)
    }

    pub fn wildcards(&self) -> &[String] {
        &self.wildcards
    }

    pub fn matched(&self) -> &BTreeMap<String, String> {
        &self.matched
    }

    /// Number of input tokens the result accounts for: matched values,
    /// wildcards and dropped key names
    pub fn token_count(&self) -> usize {
        self.matched.len() + self.wildcards.len() + self.key_tokens
    }

    pub fn is_empty(&self) -> bool {
        self.matched.is_empty() && self.wildcards.is_empty()
    }

    /// Flat view with wildcard slots named `wildcard0`, `wildcard1`, ...
    pub fn to_map(&self) -> BTreeMap<String, String> {
        let mut map = self.matched.clone();
        for (i, token) in self.wildcards.iter().enumerate() {
            map.insert(format!("{}{}", WILDCARD_PREFIX, i), token.clone());
        }
        map
    }
}

/// One line of the help listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    /// Example usage, e.g. `restart <machine>`
    pub example: String,
    /// Description, already prefixed with the action character
    pub about: String,
}

impl CatalogEntry {
    pub fn new(example: impl Into<String>, about: impl Into<String>) -> Self {
        Self {
            example: example.into(),
            about: about.into(),
        }
    }
}
