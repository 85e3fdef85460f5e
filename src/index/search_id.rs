//! Doxygen search-id codec.
//!
//! Doxygen keeps lowercase ASCII letters, digits and non-ASCII characters in a
//! search key as-is and writes every other character as `_` followed by its
//! two-digit lowercase hex code (`_5f` for `_`, `_3d` for `=`). The record key
//! then gets a `_<n>` generation suffix appended.

use crate::model::SearchKey;

impl SearchKey {
    pub fn new(term: impl Into<String>, suffix_index: Option<u32>) -> Self {
        Self {
            term: term.into(),
            suffix_index,
        }
    }

    /// Split a raw record key into decoded term and suffix.
    ///
    /// A trailing `_<digits>` is always taken as the suffix since Doxygen
    /// emits one on every record.
    pub fn parse(raw: &str) -> Self {
        let (id, suffix_index) = match raw.rsplit_once('_') {
            Some((id, tail))
                if !id.is_empty() && !tail.is_empty() && tail.bytes().all(|b| b.is_ascii_digit()) =>
            {
                (id, tail.parse().ok())
            }
            _ => (raw, None),
        };
        Self {
            term: decode_id(id).to_lowercase(),
            suffix_index,
        }
    }

    /// Raw key as Doxygen would write it.
    pub fn encode(&self) -> String {
        let mut out = encode_id(&self.term);
        if let Some(n) = self.suffix_index {
            out.push('_');
            out.push_str(&n.to_string());
        }
        out
    }
}

/// Escape a term the way Doxygen's `convertToId` does. The term is lowercased
/// first so that keys and queries share one alphabet.
pub fn encode_id(term: &str) -> String {
    let mut out = String::with_capacity(term.len());
    for c in term.chars().flat_map(char::to_lowercase) {
        if c.is_ascii_lowercase() || c.is_ascii_digit() || !c.is_ascii() {
            out.push(c);
        } else {
            out.push_str(&format!("_{:02x}", c as u32));
        }
    }
    out
}

/// Undo `_xx` escapes. Malformed escapes are kept verbatim.
pub fn decode_id(id: &str) -> String {
    let mut out = String::with_capacity(id.len());
    let mut chars = id.chars();

    while let Some(c) = chars.next() {
        if c != '_' {
            out.push(c);
            continue;
        }
        let mut lookahead = chars.clone();
        let hi = lookahead.next().and_then(|h| h.to_digit(16));
        let lo = lookahead.next().and_then(|l| l.to_digit(16));
        match (hi, lo) {
            (Some(hi), Some(lo)) if hi < 8 => {
                out.push(char::from((hi * 16 + lo) as u8));
                chars = lookahead;
            }
            _ => out.push('_'),
        }
    }

    out
}
