//! Real Bible Search - live search client
//!
//! Debounced, cancelling as-you-type search against the `/api/live/` endpoint,
//! with categorized results rendered through a pluggable view.
//!
//! The dispatcher owns all mutable state; backends and views are trait objects
//! so the same pipeline drives a terminal, a GUI or a test double.

pub mod client;
pub mod config;
pub mod dispatcher;
pub mod events;
pub mod interface;
pub mod models;
pub mod render;
pub mod script;

pub use client::LiveSearchClient;
pub use config::LiveSearchConfig;
pub use dispatcher::SearchDispatcher;
pub use interface::*;
pub use models::SearchResultSet;
