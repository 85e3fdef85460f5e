//! Turning lookup hits into terminal or JSON output.
//!
//! Text output mirrors the documentation search box: an entry with a single
//! reference is one line `label (owner)` followed by its link; an entry with
//! several references is a header line plus one indented line per reference.

use std::fmt::Write as _;

use colored::Colorize;
use serde::Serialize;

use crate::index::MatchMode;
use crate::model::Entry;

/// JSON document emitted for one lookup.
#[derive(Debug, Serialize)]
pub struct LookupReport<'a> {
    pub query: &'a str,
    pub mode: MatchMode,
    pub section: &'a str,
    /// Matches before any limit was applied.
    pub total: usize,
    pub count: usize,
    pub hits: &'a [&'a Entry],
}

impl<'a> LookupReport<'a> {
    pub fn new(query: &'a str, mode: MatchMode, section: &'a str, total: usize, hits: &'a [&'a Entry]) -> Self {
        Self {
            query,
            mode,
            section,
            total,
            count: hits.len(),
            hits,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Plain or colored text for a list of hits. `needle` is highlighted in labels
/// when `color` is on.
pub fn render_text(hits: &[&Entry], needle: &str, color: bool) -> String {
    let mut out = String::new();
    for entry in hits {
        let label = highlight(&entry.label, needle, color);
        match entry.references.as_slice() {
            [only] => {
                let owner = if only.owner_label.is_empty() || only.owner_label == entry.label {
                    String::new()
                } else {
                    format!(" ({})", only.owner_label)
                };
                let _ = writeln!(out, "{label}{owner}");
                let _ = writeln!(out, "    {}", paint_link(&only.anchor_path, color));
            }
            refs => {
                let _ = writeln!(out, "{label}");
                for r in refs {
                    let _ = writeln!(out, "  {}", r.owner_label);
                    let _ = writeln!(out, "    {}", paint_link(&r.anchor_path, color));
                }
            }
        }
    }
    out
}

/// One-line summary used by `check`.
pub fn render_summary(entries: usize, references: usize, sections: &[(&str, usize)]) -> String {
    let mut out = format!("ok: {entries} entries, {references} references");
    if sections.len() > 1 {
        let parts: Vec<String> = sections.iter().map(|(name, n)| format!("{name}={n}")).collect();
        let _ = write!(out, " ({})", parts.join(", "));
    }
    out
}

fn paint_link(anchor: &str, color: bool) -> String {
    if color {
        anchor.dimmed().to_string()
    } else {
        anchor.to_string()
    }
}

fn highlight(label: &str, needle: &str, color: bool) -> String {
    if !color {
        return label.to_string();
    }
    if needle.is_empty() {
        return label.bold().to_string();
    }
    // ASCII lowercasing keeps byte offsets aligned with `label`.
    match label.to_ascii_lowercase().find(needle) {
        Some(start) if label.is_char_boundary(start + needle.len()) => {
            let end = start + needle.len();
            format!(
                "{}{}{}",
                label[..start].bold(),
                label[start..end].bold().yellow(),
                label[end..].bold()
            )
        }
        _ => label.bold().to_string(),
    }
}
