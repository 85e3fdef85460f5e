//! A whole Doxygen `search/` directory.
//!
//! Doxygen splits each index section across files named `<section>_<hex>.js`
//! (`all_0.js` … `all_a.js`, `classes_0.js`, `functions_3.js`, ...), one file
//! per leading character bucket. Files of a section are concatenated in hex
//! order so the merged table keeps the generator's ordering.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use super::error::LoadError;
use super::table::{Lookup, MatchMode, SearchIndexTable};

/// Section that holds every symbol.
pub const ALL_SECTION: &str = "all";

/// Tables grouped by section name.
#[derive(Debug, Clone, Default)]
pub struct SearchIndexSet {
    sections: BTreeMap<String, SearchIndexTable>,
}

/// `all_a.js` → (`all`, 10).
pub fn parse_index_file_name(file_name: &str) -> Option<(&str, u32)> {
    let stem = file_name.strip_suffix(".js")?;
    let (section, bucket) = stem.rsplit_once('_')?;
    if section.is_empty() || bucket.is_empty() || !section.chars().all(|c| c.is_ascii_lowercase() || c == '_') {
        return None;
    }
    let bucket = u32::from_str_radix(bucket, 16).ok()?;
    Some((section, bucket))
}

impl SearchIndexSet {
    /// Load every index file in `dir`. A malformed file fails the whole load.
    pub fn load_dir(dir: &Path) -> Result<Self, LoadError> {
        let read = std::fs::read_dir(dir).map_err(|error| LoadError::Io {
            path: dir.to_path_buf(),
            error,
        })?;

        let mut files: Vec<(String, u32, PathBuf)> = Vec::new();
        for item in read {
            let item = item.map_err(|error| LoadError::Io {
                path: dir.to_path_buf(),
                error,
            })?;
            let path = item.path();
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            match parse_index_file_name(name) {
                Some((section, bucket)) => files.push((section.to_string(), bucket, path.clone())),
                None => tracing::debug!(file = %path.display(), "skipping non-index file"),
            }
        }

        if files.is_empty() {
            return Err(LoadError::EmptyDirectory(dir.to_path_buf()));
        }
        files.sort_by(|a, b| a.0.cmp(&b.0).then(a.1.cmp(&b.1)));

        let mut sections: BTreeMap<String, SearchIndexTable> = BTreeMap::new();
        for (section, _, path) in files {
            let table = SearchIndexTable::load_path(&path)?;
            sections.entry(section).or_default().extend(table);
        }

        tracing::info!(
            dir = %dir.display(),
            sections = sections.len(),
            "index_dir_loaded"
        );
        Ok(Self { sections })
    }

    /// Wrap a single table as the `all` section.
    pub fn from_table(table: SearchIndexTable) -> Self {
        let mut sections = BTreeMap::new();
        sections.insert(ALL_SECTION.to_string(), table);
        Self { sections }
    }

    /// Load a directory, or a single file as the `all` section.
    pub fn load_path(path: &Path) -> Result<Self, LoadError> {
        if path.is_dir() {
            Self::load_dir(path)
        } else {
            SearchIndexTable::load_path(path).map(Self::from_table)
        }
    }

    pub fn section_names(&self) -> impl Iterator<Item = &str> {
        self.sections.keys().map(String::as_str)
    }

    pub fn section(&self, name: &str) -> Option<&SearchIndexTable> {
        self.sections.get(name)
    }

    /// The `all` section, or the first section when there is none.
    pub fn primary(&self) -> Option<&SearchIndexTable> {
        self.sections
            .get(ALL_SECTION)
            .or_else(|| self.sections.values().next())
    }

    pub fn lookup(&self, section: &str, query: &str, mode: MatchMode) -> Option<Lookup<'_>> {
        self.section(section).map(|t| t.lookup_with(query, mode))
    }
}
