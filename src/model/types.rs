//! Index entities as they come out of a Doxygen search script.

use serde::{Deserialize, Serialize};

/// Key of one search record, split into the searchable term and the
/// generation-order suffix Doxygen appends (`point2d_2` → `point2d`, `2`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchKey {
    /// Decoded, lowercased term that lookups match against.
    pub term: String,
    /// Disambiguating suffix; only guarantees uniqueness of the raw key.
    pub suffix_index: Option<u32>,
}

/// One documentation location an entry points at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    /// Relative page path plus optional `#fragment`, e.g. `../classPave3D.html#a5e93...`.
    pub anchor_path: String,
    /// Doxygen's link-target flag: true opens in the parent frame.
    #[serde(default = "default_target_parent")]
    pub target_parent: bool,
    /// Class or construct the reference belongs to, e.g. `Point3D` or
    /// `Pave3D::Pave3D(const Pave3D &other)`.
    pub owner_label: String,
    /// Overload signature when the generator emitted it as a separate field.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overload_signature: Option<String>,
}

fn default_target_parent() -> bool {
    true
}

impl Reference {
    pub fn new(anchor_path: impl Into<String>, owner_label: impl Into<String>) -> Self {
        Self {
            anchor_path: anchor_path.into(),
            target_parent: true,
            owner_label: owner_label.into(),
            overload_signature: None,
        }
    }

    pub fn with_signature(mut self, signature: impl Into<String>) -> Self {
        self.overload_signature = Some(signature.into());
        self
    }

    pub fn with_target_parent(mut self, target_parent: bool) -> Self {
        self.target_parent = target_parent;
        self
    }

    /// Page part of the anchor path (everything before `#`).
    pub fn page(&self) -> &str {
        self.anchor_path
            .split_once('#')
            .map_or(self.anchor_path.as_str(), |(page, _)| page)
    }

    /// In-page fragment, if the anchor has one.
    pub fn fragment(&self) -> Option<&str> {
        self.anchor_path
            .split_once('#')
            .map(|(_, frag)| frag)
            .filter(|frag| !frag.is_empty())
    }

    /// Signature of the referenced member: the explicit overload field when
    /// present, otherwise the parenthesised tail of the owner label.
    pub fn signature(&self) -> Option<&str> {
        if let Some(sig) = self.overload_signature.as_deref() {
            return Some(sig);
        }
        self.owner_label.find('(').map(|idx| &self.owner_label[idx..])
    }

    /// Owner label without any parameter list: `Pave3D::Pave3D(...)` → `Pave3D::Pave3D`.
    pub fn qualified_name(&self) -> &str {
        match self.owner_label.find('(') {
            Some(idx) => self.owner_label[..idx].trim_end(),
            None => &self.owner_label,
        }
    }
}

/// One row of the search index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub key: SearchKey,
    /// Label the search widget displays for this row.
    pub label: String,
    /// Never empty once loaded.
    pub references: Vec<Reference>,
}

impl Entry {
    pub fn term(&self) -> &str {
        &self.key.term
    }

    pub fn suffix_index(&self) -> Option<u32> {
        self.key.suffix_index
    }

    /// Number of documentation locations; the widget shows a single link
    /// when this is 1 and an expandable group otherwise.
    pub fn reference_count(&self) -> usize {
        self.references.len()
    }

    pub fn owners(&self) -> impl Iterator<Item = &str> {
        self.references.iter().map(|r| r.owner_label.as_str())
    }
}
