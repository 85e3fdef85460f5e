//! The loaded search table and its lookup.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::{LoadError, MalformedIndexError};
use super::parser::parse_search_script;
use crate::model::Entry;

/// How a query is compared against entry terms.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    /// Term starts with the query.
    #[default]
    Prefix,
    /// Term contains the query anywhere.
    Substring,
}

impl MatchMode {
    fn matches(self, term: &str, needle: &str) -> bool {
        match self {
            Self::Prefix => term.starts_with(needle),
            Self::Substring => term.contains(needle),
        }
    }
}

impl fmt::Display for MatchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Prefix => write!(f, "prefix"),
            Self::Substring => write!(f, "substring"),
        }
    }
}

impl FromStr for MatchMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "prefix" => Ok(Self::Prefix),
            "substring" | "contains" => Ok(Self::Substring),
            other => Err(format!("unknown match mode {other:?} (expected prefix or substring)")),
        }
    }
}

/// Immutable, ordered table of search entries.
///
/// Terms are not unique; entries keep the order the generator wrote them in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SearchIndexTable {
    entries: Vec<Entry>,
}

impl SearchIndexTable {
    /// Parse a Doxygen search script. Either the whole table loads or an
    /// error is returned.
    pub fn load(source: &str) -> Result<Self, MalformedIndexError> {
        let entries = parse_search_script(source)?;
        tracing::debug!(entries = entries.len(), "index_parsed");
        Ok(Self { entries })
    }

    /// Read and parse a search script, or a JSON export when the file ends
    /// in `.json`.
    pub fn load_path(path: &Path) -> Result<Self, LoadError> {
        let source = std::fs::read_to_string(path).map_err(|error| LoadError::Io {
            path: path.to_path_buf(),
            error,
        })?;

        let parsed = if path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("json")) {
            Self::load_json(&source)
        } else {
            Self::load(&source)
        };
        let table = parsed.map_err(|error| LoadError::Malformed {
            path: path.to_path_buf(),
            error,
        })?;

        tracing::info!(
            path = %path.display(),
            entries = table.len(),
            references = table.reference_count(),
            "index_loaded"
        );
        Ok(table)
    }

    /// Load a table previously written by [`SearchIndexTable::to_json`].
    ///
    /// A truncated or otherwise invalid document is reported like a broken
    /// script, at the position serde_json stopped.
    pub fn load_json(source: &str) -> Result<Self, MalformedIndexError> {
        let entries: Vec<Entry> = serde_json::from_str(source).map_err(|e| {
            let message = e.to_string();
            let reason = message
                .rsplit_once(" at line ")
                .map_or(message.as_str(), |(reason, _)| reason);
            MalformedIndexError::new(e.line(), e.column(), reason)
        })?;
        Self::from_entries(entries)
    }

    pub fn from_entries(entries: Vec<Entry>) -> Result<Self, MalformedIndexError> {
        if let Some(entry) = entries.iter().find(|e| e.references.is_empty()) {
            return Err(MalformedIndexError::new(
                1,
                1,
                format!("entry {:?} has no references", entry.key.encode()),
            ));
        }
        Ok(Self { entries })
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn reference_count(&self) -> usize {
        self.entries.iter().map(Entry::reference_count).sum()
    }

    /// Entries whose term starts with `query`, case-insensitively, in table order.
    pub fn lookup(&self, query: &str) -> Lookup<'_> {
        self.lookup_with(query, MatchMode::Prefix)
    }

    pub fn lookup_with(&self, query: &str, mode: MatchMode) -> Lookup<'_> {
        Lookup {
            entries: self.entries.iter(),
            needle: normalize_query(query),
            mode,
        }
    }

    /// Append another table's entries (used when a section spans several files).
    pub(crate) fn extend(&mut self, other: SearchIndexTable) {
        self.entries.extend(other.entries);
    }
}

impl<'a> IntoIterator for &'a SearchIndexTable {
    type Item = &'a Entry;
    type IntoIter = std::slice::Iter<'a, Entry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Lowercase the query the same way terms are lowercased at load. Spaces are
/// significant: Doxygen keeps them in terms as `_20`.
pub fn normalize_query(query: &str) -> String {
    query.to_lowercase()
}

/// Lazy filter over a table. Cloning gives an independent cursor.
#[derive(Debug, Clone)]
pub struct Lookup<'a> {
    entries: std::slice::Iter<'a, Entry>,
    needle: String,
    mode: MatchMode,
}

impl Lookup<'_> {
    /// The normalized query being matched.
    pub fn query(&self) -> &str {
        &self.needle
    }

    pub fn mode(&self) -> MatchMode {
        self.mode
    }
}

impl<'a> Iterator for Lookup<'a> {
    type Item = &'a Entry;

    fn next(&mut self) -> Option<Self::Item> {
        let needle = self.needle.as_str();
        let mode = self.mode;
        self.entries.find(|e| mode.matches(&e.key.term, needle))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, self.entries.size_hint().1)
    }
}

impl std::iter::FusedIterator for Lookup<'_> {}
