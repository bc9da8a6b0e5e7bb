//! Live Search Interface Definition
//!
//! Shared types for the dispatcher, the HTTP backend and whatever view renders
//! the results. This file is the source of truth for the seams between them.

use crate::models::SearchResultSet;
use crate::script::{detect_script, normalize_query};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

// ═══════════════════════════════════════════════════════════════════════════════
// ENUMS
// ═══════════════════════════════════════════════════════════════════════════════

/// Writing system detected in a query, used for input styling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Script {
    #[default]
    Latin,
    Hebrew,
    Greek,
}

impl Script {
    pub fn as_str(&self) -> &'static str {
        match self {
            Script::Latin => "latin",
            Script::Hebrew => "hebrew",
            Script::Greek => "greek",
        }
    }
}

/// Corpora a search covers. The server defines the set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Scope {
    #[default]
    All,
    OldTestament,
    NewTestament,
    Hebrew,
    Greek,
    Footnotes,
    English,
}

impl Scope {
    pub const ALL: [Scope; 7] = [
        Scope::All,
        Scope::OldTestament,
        Scope::NewTestament,
        Scope::Hebrew,
        Scope::Greek,
        Scope::Footnotes,
        Scope::English,
    ];

    /// Wire value for the `scope` query parameter
    pub fn as_str(&self) -> &'static str {
        match self {
            Scope::All => "all",
            Scope::OldTestament => "ot",
            Scope::NewTestament => "nt",
            Scope::Hebrew => "hebrew",
            Scope::Greek => "greek",
            Scope::Footnotes => "footnotes",
            Scope::English => "english",
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Scope {
    type Err = LiveSearchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        Scope::ALL
            .into_iter()
            .find(|scope| scope.as_str() == lower)
            .ok_or_else(|| LiveSearchError::InvalidInput(format!("unknown scope '{}'", s)))
    }
}

/// How the server should interpret the query text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchType {
    #[default]
    Keyword,
    Reference,
}

impl SearchType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchType::Keyword => "keyword",
            SearchType::Reference => "reference",
        }
    }
}

impl fmt::Display for SearchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SearchType {
    type Err = LiveSearchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "keyword" => Ok(SearchType::Keyword),
            "reference" => Ok(SearchType::Reference),
            other => Err(LiveSearchError::InvalidInput(format!("unknown search type '{}'", other))),
        }
    }
}

/// Where a dispatcher currently sits in its request lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Debouncing,
    Fetching,
    Rendered,
    Errored,
    Disposed,
}

/// What a single `search` call ended up doing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchOutcome {
    /// Categorized results were shown
    Rendered,
    /// The server answered with zero hits
    NoResults,
    /// An error placeholder was shown
    Failed,
    /// Superseded or disposed before it could render; the view was not touched
    Cancelled,
    /// Query was too short, no request was issued
    Skipped,
}

// ═══════════════════════════════════════════════════════════════════════════════
// RECORDS (Structs)
// ═══════════════════════════════════════════════════════════════════════════════

/// One live-search query. Rebuilt on every keystroke.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    /// Trimmed query text
    pub text: String,
    pub script: Script,
    pub scope: Scope,
    pub search_type: SearchType,
}

impl SearchQuery {
    pub fn new(text: &str, scope: Scope, search_type: SearchType) -> Self {
        let text = normalize_query(text).to_string();
        let script = detect_script(&text);
        Self {
            text,
            script,
            scope,
            search_type,
        }
    }

    /// Length in characters, not bytes, so two Hebrew letters count as two
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// Content handed to a [`ResultsView`]
#[derive(Debug, Clone, PartialEq)]
pub enum LiveView {
    Results(SearchResultSet),
    NoResults { query: String },
    Error { message: String },
}

/// Generic message for transport and parse failures
pub const GENERIC_ERROR_MESSAGE: &str = "Search error. Please try again.";

/// Error type for live-search operations
#[derive(Debug, Error)]
pub enum LiveSearchError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Transport error: {0}")]
    Transport(String),
    #[error("Unexpected HTTP status {0}")]
    Status(u16),
    #[error("Malformed response: {0}")]
    Decode(String),
    #[error("Server error: {0}")]
    Server(String),
    #[error("Operation cancelled")]
    Cancelled,
}

impl LiveSearchError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, LiveSearchError::Cancelled)
    }

    /// Text shown to the user. Only server-provided messages are surfaced verbatim.
    pub fn user_message(&self) -> String {
        match self {
            LiveSearchError::Server(message) => message.clone(),
            _ => GENERIC_ERROR_MESSAGE.to_string(),
        }
    }
}

impl From<reqwest::Error> for LiveSearchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            LiveSearchError::Decode(e.to_string())
        } else if let Some(status) = e.status() {
            LiveSearchError::Status(status.as_u16())
        } else {
            LiveSearchError::Transport(e.to_string())
        }
    }
}

impl From<url::ParseError> for LiveSearchError {
    fn from(e: url::ParseError) -> Self {
        LiveSearchError::InvalidInput(e.to_string())
    }
}

impl From<serde_json::Error> for LiveSearchError {
    fn from(e: serde_json::Error) -> Self {
        LiveSearchError::Decode(e.to_string())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// SERVICE INTERFACES
// ═══════════════════════════════════════════════════════════════════════════════

/// Something that can answer a live-search query.
///
/// Dropping the returned future must abandon the request; the dispatcher relies
/// on that to cancel superseded searches.
#[async_trait::async_trait]
pub trait SearchBackend: Send + Sync + 'static {
    async fn live_search(&self, query: &SearchQuery) -> Result<SearchResultSet, LiveSearchError>;
}

/// The surface results are rendered onto.
///
/// The dispatcher calls these while holding its state lock, so implementations
/// must not call back into the dispatcher.
pub trait ResultsView: Send + Sync + 'static {
    /// Replace the results panel content and make it visible
    fn show(&self, view: &LiveView);

    /// Empty the results panel and hide it
    fn clear(&self);

    /// Hide the results panel, keeping its content
    fn hide(&self);

    /// Make previously rendered content visible again
    fn reveal(&self) {}

    fn set_loading(&self, _loading: bool) {}

    fn set_script_hint(&self, _script: Script) {}

    fn set_keyboard(&self, _keyboard: Option<crate::events::Keyboard>) {}

    fn set_placeholder(&self, _placeholder: &str) {}

    /// Called when a virtual key edits the input text
    fn set_input_text(&self, _text: &str) {}
}
