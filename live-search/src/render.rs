//! Plain-text rendering of live results
//!
//! Produces the same sections as the search page dropdown: a summary line,
//! one block per non-empty category (true count in the heading, at most the
//! displayed subset listed), and a link to the full results page.

use std::fmt::Write as _;
use std::io::Write;

use once_cell::sync::Lazy;
use parking_lot::Mutex;
use regex::Regex;

use crate::events::Keyboard;
use crate::interface::{LiveView, ResultsView};
use crate::models::{Loc, SearchResultSet};
use crate::script::format_strongs;

pub const RESULTS_PAGE: &str = "/search/results/";

/// Link to the paginated results page for a query
pub fn view_all_url(query: &str, scope: &str) -> String {
    let params = url::form_urlencoded::Serializer::new(String::new())
        .append_pair("q", query)
        .append_pair("scope", scope)
        .append_pair("page", "1")
        .finish();
    format!("{}?{}", RESULTS_PAGE, params)
}

pub fn render_text(view: &LiveView) -> String {
    match view {
        LiveView::Results(set) => render_results(set),
        LiveView::NoResults { query } => format!("No results found for \"{}\"\n", query),
        LiveView::Error { message } => format!("! {}\n", message),
    }
}

fn render_results(set: &SearchResultSet) -> String {
    let mut out = String::new();

    let _ = write!(out, "{} results found", group_thousands(set.total));
    if set.script_detected.hebrew {
        out.push_str("  [Hebrew]");
    }
    if set.script_detected.greek {
        out.push_str("  [Greek]");
    }
    out.push('\n');

    if !set.references.is_empty() {
        heading(&mut out, "Reference Match", None);
        for r in &set.references.shown {
            let _ = write!(out, "  {}", r.display);
            if let Some(url) = &r.url {
                let _ = write!(out, "  <{}>", url);
            }
            out.push('\n');
        }
    }

    if !set.ot_verses.is_empty() {
        heading(&mut out, "Old Testament", Some(set.ot_verses.count));
        for v in &set.ot_verses.shown {
            verse_line(&mut out, &v.book, &v.chapter, &v.verse, "OT", v.text.as_deref());
        }
    }

    if !set.ot_hebrew.is_empty() {
        heading(&mut out, "Hebrew Words", Some(set.ot_hebrew.count));
        for w in &set.ot_hebrew.shown {
            let word = w.hebrew_niqqud.as_deref().or(w.hebrew.as_deref()).unwrap_or_default();
            let _ = writeln!(out, "  {}  [{}]", word, location(&w.book, &w.chapter, &w.verse));
            let _ = writeln!(out, "    English: {}", w.english.as_deref().unwrap_or_default());
            if let Some(strongs) = w.strongs.as_deref().filter(|s| !s.is_empty()) {
                let _ = writeln!(out, "    {}", format_strongs(strongs));
            }
            if let Some(morph) = w.morphology.as_deref().filter(|s| !s.is_empty()) {
                let _ = writeln!(out, "    Morph: {}", morph);
            }
        }
    }

    if !set.nt_verses.is_empty() {
        heading(&mut out, "New Testament", Some(set.nt_verses.count));
        for v in &set.nt_verses.shown {
            verse_line(&mut out, &v.book, &v.chapter, &v.verse, "NT", v.text.as_deref());
        }
    }

    if !set.nt_greek.is_empty() {
        heading(&mut out, "Greek Words", Some(set.nt_greek.count));
        for w in &set.nt_greek.shown {
            let word = w.lemma.as_deref().or(w.greek.as_deref()).unwrap_or_default();
            let _ = write!(out, "  {}", word);
            if let Some(translit) = w.translit.as_deref().filter(|s| !s.is_empty()) {
                let _ = write!(out, " ({})", translit);
            }
            let _ = writeln!(out, "  [{}]", location(&w.book, &w.chapter, &w.verse));
            let _ = writeln!(out, "    English: {}", w.english.as_deref().unwrap_or_default());
            if let Some(strongs) = &w.strongs {
                let _ = writeln!(out, "    Strong's: G{}", strongs);
            }
            if let Some(morph) = w.morph_desc.as_deref().or(w.morphology.as_deref()).filter(|s| !s.is_empty()) {
                let _ = writeln!(out, "    {}", morph);
            }
        }
    }

    if !set.footnotes.is_empty() {
        heading(&mut out, "Footnotes", Some(set.footnotes.count));
        for n in &set.footnotes.shown {
            verse_line(&mut out, &n.book, &n.chapter, &n.verse, "footnote", n.text.as_deref());
        }
    }

    let _ = writeln!(
        out,
        "\nView all {} results: {}",
        group_thousands(set.total),
        view_all_url(&set.query, &set.scope)
    );
    out
}

fn heading(out: &mut String, title: &str, count: Option<u64>) {
    match count {
        Some(count) => {
            let _ = writeln!(out, "\n── {} ({})", title, count);
        }
        None => {
            let _ = writeln!(out, "\n── {}", title);
        }
    }
}

fn verse_line(out: &mut String, book: &Option<String>, chapter: &Option<Loc>, verse: &Option<Loc>, badge: &str, text: Option<&str>) {
    let _ = writeln!(out, "  {} [{}]", location(book, chapter, verse), badge);
    let preview = plain_text(text.unwrap_or_default());
    if !preview.is_empty() {
        let _ = writeln!(out, "    {}", preview);
    }
}

/// `Genesis 1:3`, tolerating missing parts
fn location(book: &Option<String>, chapter: &Option<Loc>, verse: &Option<Loc>) -> String {
    let chapter = chapter.as_ref().map(ToString::to_string).unwrap_or_default();
    let verse = verse.as_ref().map(ToString::to_string).unwrap_or_default();
    format!("{} {}:{}", book.as_deref().unwrap_or_default(), chapter, verse)
        .trim()
        .to_string()
}

/// Highlight markup from the server (`<mark>`, `<b>`, ...)
static TAG_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").unwrap());

/// Drop the markup the server uses for highlights and collapse whitespace
pub fn plain_text(html: &str) -> String {
    let text = TAG_REGEX.replace_all(html, "");
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// `12345` → `12,345`
pub fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

// ─────────────────────────────────────────────────────────────────────────────
// TEXT VIEW
// ─────────────────────────────────────────────────────────────────────────────

/// [`ResultsView`] that writes rendered text to any writer (stdout in the CLI)
pub struct TextView<W: Write + Send + 'static> {
    out: Mutex<W>,
}

impl TextView<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write + Send + 'static> TextView<W> {
    pub fn new(out: W) -> Self {
        Self { out: Mutex::new(out) }
    }

    pub fn into_inner(self) -> W {
        self.out.into_inner()
    }

    fn emit(&self, text: &str) {
        let mut out = self.out.lock();
        if let Err(e) = out.write_all(text.as_bytes()).and_then(|_| out.flush()) {
            log::warn!("failed to write results: {}", e);
        }
    }
}

impl<W: Write + Send + 'static> ResultsView for TextView<W> {
    fn show(&self, view: &LiveView) {
        self.emit(&render_text(view));
    }

    fn clear(&self) {}

    fn hide(&self) {}

    fn set_loading(&self, loading: bool) {
        if loading {
            self.emit("searching…\n");
        }
    }

    fn set_keyboard(&self, keyboard: Option<Keyboard>) {
        match keyboard {
            Some(Keyboard::Hebrew) => self.emit("[hebrew keyboard]\n"),
            Some(Keyboard::Greek) => self.emit("[greek keyboard]\n"),
            None => {}
        }
    }
}
