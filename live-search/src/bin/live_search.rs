//! Terminal front end for the live search pipeline
//!
//! One-shot:     live-search --scope ot "let there be light"
//! Interactive:  live-search --interactive
//!
//! In interactive mode every stdin line is treated as the full input text, so
//! typing or pasting lines quickly exercises the debounce. Lines starting with
//! `:` are commands: `:scope <scope>`, `:tab <keyword|reference|hebrew|greek>`,
//! `:kbd <hebrew|greek>`, `:key <text|backspace|clear>`, `:escape`, `:quit`.
//!
//! Logging goes through env_logger; set RUST_LOG=debug to see request traffic.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use rbt_live_search::events::{Keyboard, SearchTab, UiEvent, VirtualKey};
use rbt_live_search::render::TextView;
use rbt_live_search::{
    LiveSearchClient, LiveSearchConfig, Scope, SearchBackend, SearchDispatcher, SearchOutcome,
    SearchQuery, SearchType,
};
use tokio::io::{AsyncBufReadExt, BufReader};

/// How long to wait for the last search once stdin closes
const DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Parser, Debug)]
#[command(name = "live-search", version, about = "Live search against a Real Bible Search server", long_about = None)]
struct Args {
    /// Query text (omit with --interactive)
    query: Vec<String>,

    /// Server root URL (defaults to RBT_SEARCH_BASE_URL or http://127.0.0.1:8000)
    #[arg(short, long)]
    base_url: Option<String>,

    /// Search scope: all, ot, nt, hebrew, greek, footnotes, english
    #[arg(short, long, default_value = "all")]
    scope: Scope,

    /// Search type: keyword or reference
    #[arg(short = 't', long = "type", default_value = "keyword")]
    search_type: SearchType,

    /// Read input lines from stdin and search as you type
    #[arg(short, long)]
    interactive: bool,

    /// Debounce window in milliseconds (interactive mode)
    #[arg(long)]
    debounce_ms: Option<u64>,

    /// Print the categorized result set as JSON instead of text
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut config = LiveSearchConfig::from_env().context("Invalid RBT_SEARCH_* environment")?;
    if let Some(base_url) = &args.base_url {
        config = config
            .with_base_url(base_url)
            .with_context(|| format!("Invalid --base-url '{}'", base_url))?;
    }
    if let Some(ms) = args.debounce_ms {
        config = config.with_debounce(Duration::from_millis(ms));
    }

    let client = LiveSearchClient::new(&config).context("Failed to build HTTP client")?;

    if args.interactive {
        return interactive(client, config).await;
    }

    let text = args.query.join(" ");
    if text.trim().chars().count() < config.min_query_chars {
        bail!("Query must be at least {} characters", config.min_query_chars);
    }

    if args.json {
        let query = SearchQuery::new(&text, args.scope, args.search_type);
        let results = client.live_search(&query).await?;
        println!("{}", serde_json::to_string_pretty(&results)?);
        return Ok(());
    }

    let dispatcher = SearchDispatcher::new(Arc::new(client), Arc::new(TextView::stdout()), config);
    match dispatcher.search(&text, args.scope, args.search_type).await {
        SearchOutcome::Failed => bail!("Search failed"),
        _ => Ok(()),
    }
}

async fn interactive(client: LiveSearchClient, config: LiveSearchConfig) -> Result<()> {
    let dispatcher = SearchDispatcher::new(Arc::new(client), Arc::new(TextView::stdout()), config);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await.context("Failed to read stdin")? {
        match parse_line(&line) {
            Ok(Some(event)) => dispatcher.handle(event),
            Ok(None) => break,
            Err(e) => eprintln!("{}", e),
        }
    }

    // Let the last debounced search land before leaving
    if !dispatcher.settle(DRAIN_TIMEOUT).await {
        log::warn!("gave up waiting for the last search after {:?}", DRAIN_TIMEOUT);
    }
    dispatcher.handle(UiEvent::Navigate);
    Ok(())
}

/// Map one stdin line to a UI event. `Ok(None)` means quit.
fn parse_line(line: &str) -> Result<Option<UiEvent>> {
    let Some(command) = line.strip_prefix(':') else {
        return Ok(Some(UiEvent::Input(line.to_string())));
    };

    let (name, arg) = command.split_once(' ').unwrap_or((command, ""));
    let event = match (name, arg.trim()) {
        ("quit" | "q", _) => return Ok(None),
        ("scope", scope) => UiEvent::ScopeSelected(scope.parse()?),
        ("tab", "keyword") => UiEvent::TabSelected(SearchTab::Keyword),
        ("tab", "reference") => UiEvent::TabSelected(SearchTab::Reference),
        ("tab", "hebrew") => UiEvent::TabSelected(SearchTab::Hebrew),
        ("tab", "greek") => UiEvent::TabSelected(SearchTab::Greek),
        ("kbd", "hebrew") => UiEvent::KeyboardToggled(Keyboard::Hebrew),
        ("kbd", "greek") => UiEvent::KeyboardToggled(Keyboard::Greek),
        ("key", "backspace") => UiEvent::VirtualKey(VirtualKey::Backspace),
        ("key", "clear") => UiEvent::VirtualKey(VirtualKey::Clear),
        ("key", text) if !text.is_empty() => UiEvent::VirtualKey(VirtualKey::Insert(text.to_string())),
        ("escape", _) => UiEvent::Escape,
        _ => bail!("Unknown command ':{}'", command),
    };
    Ok(Some(event))
}
