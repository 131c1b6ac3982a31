//! Ordered regex pattern tables.

use indexmap::IndexMap;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{TerragruntError, TerragruntResult};

/// Ordered mapping of regex pattern to a human-readable message.
///
/// Lookups walk the entries in insertion order, so the first matching
/// pattern always wins. Patterns are unique; inserting an existing pattern
/// replaces its message in place.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PatternTable {
    entries: IndexMap<String, String>,
}

impl PatternTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the message for `pattern`.
    pub fn insert(&mut self, pattern: impl Into<String>, message: impl Into<String>) {
        self.entries.insert(pattern.into(), message.into());
    }

    /// Builder form of [`insert`](Self::insert).
    pub fn with(mut self, pattern: impl Into<String>, message: impl Into<String>) -> Self {
        self.insert(pattern, message);
        self
    }

    pub fn get(&self, pattern: &str) -> Option<&str> {
        self.entries.get(pattern).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(p, m)| (p.as_str(), m.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Compile every pattern, in order, after passing it through `wrap`.
    ///
    /// Fails on the first pattern that is not a valid regex.
    pub fn compile_with<F>(&self, wrap: F) -> TerragruntResult<Vec<(Regex, &str)>>
    where
        F: Fn(&str) -> String,
    {
        self.entries
            .iter()
            .map(|(pattern, message)| {
                Regex::new(&wrap(pattern))
                    .map(|re| (re, message.as_str()))
                    .map_err(|source| TerragruntError::InvalidPattern {
                        pattern: pattern.clone(),
                        source,
                    })
            })
            .collect()
    }

    /// Compile the patterns as-is.
    pub fn compile(&self) -> TerragruntResult<Vec<(Regex, &str)>> {
        self.compile_with(str::to_string)
    }
}

impl<P, M> FromIterator<(P, M)> for PatternTable
where
    P: Into<String>,
    M: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (P, M)>>(iter: I) -> Self {
        let mut table = Self::new();
        for (pattern, message) in iter {
            table.insert(pattern, message);
        }
        table
    }
}

impl<P, M, const N: usize> From<[(P, M); N]> for PatternTable
where
    P: Into<String>,
    M: Into<String>,
{
    fn from(entries: [(P, M); N]) -> Self {
        entries.into_iter().collect()
    }
}
