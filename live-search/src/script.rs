//! Script detection and small text helpers for live search
//!
//! Detects Hebrew and Greek input from Unicode ranges and decodes the compact
//! Strong's annotation the server attaches to Hebrew words.

use crate::interface::Script;

/// Hebrew block, including points and cantillation marks
const HEBREW_RANGE: (char, char) = ('\u{0590}', '\u{05FF}');

/// Greek and Coptic, plus Greek Extended for polytonic text
const GREEK_RANGES: [(char, char); 2] = [('\u{0370}', '\u{03FF}'), ('\u{1F00}', '\u{1FFF}')];

/// Maximum Strong's entries shown before collapsing into "(+N more)"
pub const MAX_STRONGS_SHOWN: usize = 3;

pub fn has_hebrew(text: &str) -> bool {
    text.chars().any(|c| (HEBREW_RANGE.0..=HEBREW_RANGE.1).contains(&c))
}

pub fn has_greek(text: &str) -> bool {
    text.chars()
        .any(|c| GREEK_RANGES.iter().any(|(lo, hi)| (*lo..=*hi).contains(&c)))
}

/// Detect which script styling applies. Hebrew wins over Greek.
pub fn detect_script(text: &str) -> Script {
    if has_hebrew(text) {
        Script::Hebrew
    } else if has_greek(text) {
        Script::Greek
    } else {
        Script::Latin
    }
}

/// Trim the raw input the way the search box does before measuring it
pub fn normalize_query(text: &str) -> &str {
    text.trim()
}

/// One decoded entry from a Strong's annotation such as `H1961=הָיָה=to be`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StrongsEntry {
    Parsed { number: String, word: String, gloss: String },
    /// Anything that did not have the `number=word=gloss` shape
    Raw(String),
}

/// Split a `/`-separated Strong's annotation into entries.
///
/// Glosses may carry trailing markers (`_§…` or `@…`) which are dropped.
pub fn parse_strongs(annotation: &str) -> Vec<StrongsEntry> {
    if annotation.is_empty() {
        return Vec::new();
    }

    annotation
        .split('/')
        .map(|entry| {
            let parts: Vec<&str> = entry.split('=').collect();
            if parts.len() < 3 {
                return StrongsEntry::Raw(entry.to_string());
            }
            let gloss = parts[2..].join("=");
            let gloss = gloss
                .split("_§")
                .next()
                .unwrap_or_default()
                .split('@')
                .next()
                .unwrap_or_default()
                .to_string();
            StrongsEntry::Parsed {
                number: parts[0].to_string(),
                word: parts[1].to_string(),
                gloss,
            }
        })
        .collect()
}

/// Render a Strong's annotation as `H1961: to be + H9014: link (+2 more)`
pub fn format_strongs(annotation: &str) -> String {
    let entries = parse_strongs(annotation);
    let shown: Vec<String> = entries
        .iter()
        .take(MAX_STRONGS_SHOWN)
        .map(|entry| match entry {
            StrongsEntry::Parsed { number, gloss, .. } => format!("{}: {}", number, gloss),
            StrongsEntry::Raw(raw) => raw.clone(),
        })
        .collect();

    let mut out = shown.join(" + ");
    if entries.len() > MAX_STRONGS_SHOWN {
        out.push_str(&format!(" (+{} more)", entries.len() - MAX_STRONGS_SHOWN));
    }
    out
}
