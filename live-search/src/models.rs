//! Data models for the live-search endpoint
//!
//! Wire types mirror the JSON returned by `GET /api/live/`. The server is lax
//! about types (chapter and verse arrive as numbers or strings, most fields may
//! be null), so everything here deserializes leniently.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::interface::LiveSearchError;

/// Entries shown per category in the live dropdown
pub const DISPLAY_PER_CATEGORY: usize = 5;

// ─────────────────────────────────────────────────────────────────────────────
// WIRE TYPES
// ─────────────────────────────────────────────────────────────────────────────

/// Chapter or verse locator, displayed verbatim
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Loc {
    Number(i64),
    Text(String),
}

impl fmt::Display for Loc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Loc::Number(n) => write!(f, "{}", n),
            Loc::Text(s) => f.write_str(s),
        }
    }
}

/// A parsed verse reference match
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReferenceHit {
    pub book: Option<String>,
    pub chapter: Option<Loc>,
    pub verse: Option<Loc>,
    pub url: Option<String>,
    pub display: String,
}

/// An English verse match, OT or NT
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VerseHit {
    pub book: Option<String>,
    pub chapter: Option<Loc>,
    pub verse: Option<Loc>,
    /// Server-highlighted excerpt
    pub text: Option<String>,
    pub version: Option<String>,
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HebrewWordHit {
    pub book: Option<String>,
    pub chapter: Option<Loc>,
    pub verse: Option<Loc>,
    pub english: Option<String>,
    pub hebrew: Option<String>,
    pub hebrew_niqqud: Option<String>,
    pub morphology: Option<String>,
    /// Compact annotation, see [`crate::script::parse_strongs`]
    pub strongs: Option<String>,
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GreekWordHit {
    pub book: Option<String>,
    pub chapter: Option<Loc>,
    pub verse: Option<Loc>,
    pub english: Option<String>,
    pub lemma: Option<String>,
    pub greek: Option<String>,
    pub translit: Option<String>,
    pub strongs: Option<Loc>,
    pub morphology: Option<String>,
    pub morph_desc: Option<String>,
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FootnoteHit {
    pub book: Option<String>,
    pub chapter: Option<Loc>,
    pub verse: Option<Loc>,
    pub footnote_id: Option<String>,
    pub text: Option<String>,
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LiveResults {
    pub references: Vec<ReferenceHit>,
    pub ot_verses: Vec<VerseHit>,
    pub ot_hebrew: Vec<HebrewWordHit>,
    pub nt_verses: Vec<VerseHit>,
    pub nt_greek: Vec<GreekWordHit>,
    pub footnotes: Vec<FootnoteHit>,
}

/// True per-category counts. Missing entries fall back to the array length.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LiveCounts {
    pub references: Option<u64>,
    pub ot_verses: Option<u64>,
    pub ot_hebrew: Option<u64>,
    pub nt_verses: Option<u64>,
    pub nt_greek: Option<u64>,
    pub footnotes: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScriptDetected {
    pub hebrew: bool,
    pub greek: bool,
}

/// Body of a `/api/live/` response, success or `{error}`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LiveResponse {
    pub error: Option<String>,
    pub results: LiveResults,
    pub counts: LiveCounts,
    pub total: u64,
    pub query: String,
    pub scope: String,
    pub script_detected: ScriptDetected,
    pub has_more: bool,
}

// ─────────────────────────────────────────────────────────────────────────────
// RESULT SET (what the view renders)
// ─────────────────────────────────────────────────────────────────────────────

/// A displayed subset of one category plus its true size
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Category<T> {
    pub shown: Vec<T>,
    pub count: u64,
}

impl<T> Category<T> {
    fn from_hits(mut hits: Vec<T>, count: Option<u64>, per_category: usize) -> Self {
        let count = count.unwrap_or(hits.len() as u64);
        hits.truncate(per_category);
        Self { shown: hits, count }
    }

    pub fn is_empty(&self) -> bool {
        self.shown.is_empty()
    }
}

impl<T> Default for Category<T> {
    fn default() -> Self {
        Self {
            shown: Vec::new(),
            count: 0,
        }
    }
}

/// Categorized results built from one response
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct SearchResultSet {
    pub references: Category<ReferenceHit>,
    pub ot_verses: Category<VerseHit>,
    pub ot_hebrew: Category<HebrewWordHit>,
    pub nt_verses: Category<VerseHit>,
    pub nt_greek: Category<GreekWordHit>,
    pub footnotes: Category<FootnoteHit>,
    pub total: u64,
    /// Normalized query as echoed by the server
    pub query: String,
    pub scope: String,
    pub script_detected: ScriptDetected,
    pub has_more: bool,
}

impl SearchResultSet {
    /// Build from a decoded response, keeping `per_category` entries of each kind.
    /// An `{error}` body becomes [`LiveSearchError::Server`].
    pub fn from_response(response: LiveResponse, per_category: usize) -> Result<Self, LiveSearchError> {
        let LiveResponse { error, results, counts, total, query, scope, script_detected, has_more } = response;
        if let Some(message) = error {
            return Err(LiveSearchError::Server(message));
        }

        Ok(Self {
            references: Category::from_hits(results.references, counts.references, per_category),
            ot_verses: Category::from_hits(results.ot_verses, counts.ot_verses, per_category),
            ot_hebrew: Category::from_hits(results.ot_hebrew, counts.ot_hebrew, per_category),
            nt_verses: Category::from_hits(results.nt_verses, counts.nt_verses, per_category),
            nt_greek: Category::from_hits(results.nt_greek, counts.nt_greek, per_category),
            footnotes: Category::from_hits(results.footnotes, counts.footnotes, per_category),
            total,
            query,
            scope,
            script_detected,
            has_more,
        })
    }

    pub fn from_json(body: &str, per_category: usize) -> Result<Self, LiveSearchError> {
        let response: LiveResponse = serde_json::from_str(body)?;
        Self::from_response(response, per_category)
    }

    /// A zero total renders as "no results" rather than an empty list
    pub fn is_empty(&self) -> bool {
        self.total == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn verse(n: i64) -> serde_json::Value {
        json!({"book": "Genesis", "chapter": 1, "verse": n, "text": format!("verse {}", n)})
    }

    #[test]
    fn test_categories_truncate_but_keep_true_count() {
        let body = json!({
            "query": "light",
            "scope": "all",
            "total": 42,
            "results": {"ot_verses": (1..=12).map(verse).collect::<Vec<_>>()},
            "counts": {"ot_verses": 40}
        });
        let set = SearchResultSet::from_json(&body.to_string(), DISPLAY_PER_CATEGORY).unwrap();

        assert_eq!(set.ot_verses.shown.len(), 5);
        assert_eq!(set.ot_verses.count, 40);
        assert_eq!(set.ot_verses.shown[4].verse, Some(Loc::Number(5)));
        assert_eq!(set.total, 42);
        assert_eq!(set.query, "light");
        assert!(set.nt_verses.is_empty());
    }

    #[test]
    fn test_missing_count_falls_back_to_array_length() {
        let body = json!({
            "total": 2,
            "results": {"footnotes": [verse(1), verse(2)]},
            "counts": {}
        });
        let set = SearchResultSet::from_json(&body.to_string(), DISPLAY_PER_CATEGORY).unwrap();
        assert_eq!(set.footnotes.count, 2);
    }

    #[test]
    fn test_chapter_and_verse_accept_strings() {
        let body = json!({
            "total": 1,
            "results": {"ot_hebrew": [{
                "book": "Genesis", "chapter": "1", "verse": "3",
                "english": "light", "hebrew": "אור", "url": null
            }]},
            "counts": {"ot_hebrew": 1}
        });
        let set = SearchResultSet::from_json(&body.to_string(), DISPLAY_PER_CATEGORY).unwrap();
        let hit = &set.ot_hebrew.shown[0];
        assert_eq!(hit.chapter.as_ref().map(ToString::to_string).as_deref(), Some("1"));
        assert_eq!(hit.verse, Some(Loc::Text("3".into())));
        assert_eq!(hit.url, None);
    }

    #[test]
    fn test_error_body_becomes_server_error() {
        let body = r#"{"error": "Query must be at least 2 characters", "results": {}, "total": 0}"#;
        let err = SearchResultSet::from_json(body, DISPLAY_PER_CATEGORY).unwrap_err();
        assert!(matches!(err, LiveSearchError::Server(ref m) if m.contains("2 characters")));
    }

    #[test]
    fn test_malformed_body_is_decode_error() {
        let err = SearchResultSet::from_json("<html>502</html>", DISPLAY_PER_CATEGORY).unwrap_err();
        assert!(matches!(err, LiveSearchError::Decode(_)));
    }

    #[test]
    fn test_zero_total_is_empty() {
        let set = SearchResultSet::from_json(r#"{"total": 0, "query": "zzz"}"#, DISPLAY_PER_CATEGORY).unwrap();
        assert!(set.is_empty());
    }
}
