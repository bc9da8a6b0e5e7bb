//! SearchDispatcher - turns input events into fresh, rendered live searches
//!
//! Keystrokes restart a debounce timer; only the timer that survives the quiet
//! period issues a request. Issuing a request cancels the previous one.
//!
//! Cancellation Architecture:
//! Each request owns a CancellationToken and a generation number. A newer
//! request cancels the older token, which drops the backend future through
//! `tokio::select!` (advisory, at the network layer). Before rendering, a
//! request re-checks under the state lock that its token is live and its
//! generation is still current (authoritative, at the render layer). The check
//! and the render share one critical section, so a newer request cannot slip in
//! between them.

use std::sync::Arc;
use std::time::Duration;

use log::{debug, warn};
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::LiveSearchConfig;
use crate::events::{actions_for, Action, Keyboard, SearchTab, UiEvent};
use crate::interface::{
    LiveSearchError, LiveView, Phase, ResultsView, Scope, SearchBackend, SearchOutcome, SearchQuery,
    SearchType,
};

const SETTLE_POLL: Duration = Duration::from_millis(25);

/// Fallback runtime for dispatchers created outside any tokio context.
static FALLBACK_RUNTIME: Lazy<tokio::runtime::Runtime> = Lazy::new(|| {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .thread_name("live-search")
        .enable_all()
        .build()
        .expect("Failed to create fallback tokio runtime")
});

/// RAII guard that cancels a token when dropped.
/// If the future running a search is dropped mid-flight, its token is
/// cancelled so the render check can never pass afterwards.
struct DropGuard {
    token: CancellationToken,
}

impl DropGuard {
    fn new(token: CancellationToken) -> Self {
        Self { token }
    }
}

impl Drop for DropGuard {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

/// The one outstanding request
struct InFlight {
    generation: u64,
    token: CancellationToken,
}

/// A registered request, not yet sent
struct Issued {
    generation: u64,
    token: CancellationToken,
    query: SearchQuery,
}

#[derive(Default)]
struct DispatchState {
    text: String,
    scope: Scope,
    tab: SearchTab,
    keyboard: Option<Keyboard>,
    phase: Phase,
    /// Last issued request number
    generation: u64,
    current: Option<InFlight>,
    /// Bumped on every keystroke; a timer only fires if its number still matches
    debounce_seq: u64,
    debounce: Option<JoinHandle<()>>,
    /// Whether the results panel holds something worth revealing on focus
    has_content: bool,
}

impl DispatchState {
    fn query(&self) -> SearchQuery {
        SearchQuery::new(&self.text, self.scope, self.tab.search_type())
    }

    fn cancel_debounce(&mut self) {
        self.debounce_seq = self.debounce_seq.wrapping_add(1);
        if let Some(handle) = self.debounce.take() {
            handle.abort();
        }
    }

    /// Phase after a request finishes; a pending timer keeps it debouncing
    fn settled(&self, phase: Phase) -> Phase {
        if self.debounce.is_some() {
            Phase::Debouncing
        } else {
            phase
        }
    }

    fn cancel_current(&mut self) -> bool {
        match self.current.take() {
            Some(prev) => {
                prev.token.cancel();
                debug!("cancelled live search #{}", prev.generation);
                true
            }
            None => false,
        }
    }
}

struct Inner {
    backend: Arc<dyn SearchBackend>,
    view: Arc<dyn ResultsView>,
    config: LiveSearchConfig,
    runtime: tokio::runtime::Handle,
    state: Mutex<DispatchState>,
}

/// Debounced, cancelling live-search dispatcher.
///
/// One per search page. Dropping it (or sending [`UiEvent::Navigate`]) disposes
/// it: pending timers and requests are cancelled and later events are ignored.
pub struct SearchDispatcher {
    inner: Arc<Inner>,
}

impl SearchDispatcher {
    pub fn new(
        backend: Arc<dyn SearchBackend>,
        view: Arc<dyn ResultsView>,
        config: LiveSearchConfig,
    ) -> Self {
        let runtime = tokio::runtime::Handle::try_current()
            .unwrap_or_else(|_| FALLBACK_RUNTIME.handle().clone());

        Self {
            inner: Arc::new(Inner {
                backend,
                view,
                config,
                runtime,
                state: Mutex::new(DispatchState::default()),
            }),
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Queries
    // ─────────────────────────────────────────────────────────────────────────

    pub fn phase(&self) -> Phase {
        self.inner.state.lock().phase
    }

    pub fn text(&self) -> String {
        self.inner.state.lock().text.clone()
    }

    pub fn scope(&self) -> Scope {
        self.inner.state.lock().scope
    }

    pub fn tab(&self) -> SearchTab {
        self.inner.state.lock().tab
    }

    pub fn keyboard(&self) -> Option<Keyboard> {
        self.inner.state.lock().keyboard
    }

    pub fn config(&self) -> &LiveSearchConfig {
        &self.inner.config
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// New input text. Restyles immediately; short queries clear the results,
    /// longer ones (re)start the debounce timer.
    pub fn on_input(&self, text: &str) {
        self.handle(UiEvent::Input(text.to_string()));
    }

    /// Apply a UI event through the event table
    pub fn handle(&self, event: UiEvent) {
        let mut state = self.inner.state.lock();
        if state.phase == Phase::Disposed {
            return;
        }
        for action in actions_for(event.kind()) {
            self.inner.apply(&mut state, *action, &event);
        }
    }

    /// Cancel any outstanding request and search now, bypassing the debounce.
    pub async fn search(&self, query: &str, scope: Scope, search_type: SearchType) -> SearchOutcome {
        let query = SearchQuery::new(query, scope, search_type);
        Inner::run_search(&self.inner, query).await
    }

    /// Resume from a page query string such as `q=light&scope=ot`.
    ///
    /// Fills the input and scope from the parameters and searches immediately.
    /// Without a `q` parameter nothing happens.
    pub async fn restore(&self, query_string: &str) -> SearchOutcome {
        let params = url::form_urlencoded::parse(query_string.trim_start_matches('?').as_bytes());
        let mut text = None;
        let mut scope = None;
        for (key, value) in params {
            match key.as_ref() {
                "q" => text = Some(value.into_owned()),
                "scope" => match value.parse::<Scope>() {
                    Ok(parsed) => scope = Some(parsed),
                    Err(e) => warn!("ignoring scope in query string: {}", e),
                },
                _ => {}
            }
        }

        let Some(text) = text.filter(|t| !t.is_empty()) else {
            return SearchOutcome::Skipped;
        };

        let query = {
            let mut state = self.inner.state.lock();
            if state.phase == Phase::Disposed {
                return SearchOutcome::Cancelled;
            }
            state.text = text;
            if let Some(scope) = scope {
                state.scope = scope;
            }
            self.inner.view.set_input_text(&state.text);
            state.query()
        };
        self.inner.view.set_script_hint(query.script);
        Inner::run_search(&self.inner, query).await
    }

    /// Wait for a pending or in-flight search to finish, giving up after
    /// `limit`. Returns `false` on timeout.
    pub async fn settle(&self, limit: Duration) -> bool {
        let wait = async {
            while matches!(self.phase(), Phase::Debouncing | Phase::Fetching) {
                tokio::time::sleep(SETTLE_POLL).await;
            }
        };
        tokio::time::timeout(limit, wait).await.is_ok()
    }

    /// Cancel the timer and any request. Later events are ignored.
    pub fn dispose(&self) {
        let mut state = self.inner.state.lock();
        if state.phase == Phase::Disposed {
            return;
        }
        state.cancel_debounce();
        state.cancel_current();
        state.phase = Phase::Disposed;
        debug!("live search dispatcher disposed");
    }
}

impl Drop for SearchDispatcher {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl Inner {
    fn apply(self: &Arc<Self>, state: &mut DispatchState, action: Action, event: &UiEvent) {
        match (action, event) {
            (Action::SetText, UiEvent::Input(text)) => {
                state.text = text.clone();
            }
            (Action::EditText, UiEvent::VirtualKey(key)) => {
                state.text = key.apply(&state.text);
                self.view.set_input_text(&state.text);
            }
            (Action::SetScope, UiEvent::ScopeSelected(scope)) => {
                state.scope = *scope;
            }
            (Action::SetTab, UiEvent::TabSelected(tab)) => {
                state.tab = *tab;
                state.keyboard = tab.keyboard();
                self.view.set_keyboard(state.keyboard);
                self.view.set_placeholder(tab.placeholder());
            }
            (Action::ToggleKeyboard, UiEvent::KeyboardToggled(keyboard)) => {
                state.keyboard = if state.keyboard == Some(*keyboard) {
                    None
                } else {
                    Some(*keyboard)
                };
                self.view.set_keyboard(state.keyboard);
            }
            (Action::CloseKeyboards, _) => {
                if state.keyboard.take().is_some() {
                    self.view.set_keyboard(None);
                }
            }
            (Action::InputChanged, _) => self.input_changed(state),
            (Action::Reveal, _) => {
                if state.has_content && state.query().char_len() >= self.config.min_query_chars {
                    self.view.reveal();
                }
            }
            (Action::Hide, _) => self.view.hide(),
            (Action::Dispose, _) => {
                state.cancel_debounce();
                state.cancel_current();
                state.phase = Phase::Disposed;
                debug!("live search dispatcher disposed");
            }
            (action, event) => {
                warn!("action {:?} does not apply to {:?}", action, event);
            }
        }
    }

    fn input_changed(self: &Arc<Self>, state: &mut DispatchState) {
        let query = state.query();
        self.view.set_script_hint(query.script);
        state.cancel_debounce();

        if query.char_len() < self.config.min_query_chars {
            if state.cancel_current() {
                self.view.set_loading(false);
            }
            self.view.clear();
            state.has_content = false;
            state.phase = Phase::Idle;
            return;
        }

        let seq = state.debounce_seq;
        let delay = self.config.debounce;
        let inner = Arc::clone(self);
        state.phase = Phase::Debouncing;
        state.debounce = Some(self.runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(issued) = inner.fire_debounce(seq) {
                inner.complete(issued).await;
            }
        }));
    }

    /// Timer expiry. The sequence check and the request registration share one
    /// critical section, so a short query arriving afterwards always finds the
    /// request to cancel.
    fn fire_debounce(&self, seq: u64) -> Option<Issued> {
        let mut state = self.state.lock();
        if state.debounce_seq != seq || state.phase == Phase::Disposed {
            return None;
        }
        state.debounce = None;
        let query = state.query();
        if query.char_len() < self.config.min_query_chars {
            state.phase = Phase::Idle;
            return None;
        }
        self.issue(&mut state, query)
    }

    /// Register a new request, cancelling the previous one. `None` once disposed.
    fn issue(&self, state: &mut DispatchState, query: SearchQuery) -> Option<Issued> {
        if state.phase == Phase::Disposed {
            return None;
        }
        state.cancel_current();
        state.generation += 1;
        let token = CancellationToken::new();
        state.current = Some(InFlight {
            generation: state.generation,
            token: token.clone(),
        });
        state.phase = Phase::Fetching;
        self.view.set_loading(true);
        Some(Issued {
            generation: state.generation,
            token,
            query,
        })
    }

    async fn run_search(inner: &Arc<Self>, query: SearchQuery) -> SearchOutcome {
        if query.char_len() < inner.config.min_query_chars {
            return SearchOutcome::Skipped;
        }

        let issued = {
            let mut state = inner.state.lock();
            inner.issue(&mut state, query)
        };
        match issued {
            Some(issued) => inner.complete(issued).await,
            None => SearchOutcome::Cancelled,
        }
    }

    /// Run an issued request and render its outcome if it is still current
    async fn complete(&self, issued: Issued) -> SearchOutcome {
        let Issued { generation, token, query } = issued;
        let _guard = DropGuard::new(token.clone());

        debug!(
            "live search #{}: q={:?} scope={} type={}",
            generation, query.text, query.scope, query.search_type
        );

        let result = tokio::select! {
            biased;
            _ = token.cancelled() => Err(LiveSearchError::Cancelled),
            result = self.backend.live_search(&query) => result,
        };

        let mut state = self.state.lock();
        let is_current = !token.is_cancelled()
            && state
                .current
                .as_ref()
                .is_some_and(|current| current.generation == generation);
        if !is_current {
            debug!("dropping response for superseded live search #{}", generation);
            return SearchOutcome::Cancelled;
        }

        state.current = None;
        self.view.set_loading(false);

        let (view, outcome, phase) = match result {
            Ok(set) if set.is_empty() => {
                let echoed = if set.query.is_empty() { query.text } else { set.query };
                (LiveView::NoResults { query: echoed }, SearchOutcome::NoResults, Phase::Rendered)
            }
            Ok(set) => (LiveView::Results(set), SearchOutcome::Rendered, Phase::Rendered),
            Err(e) if e.is_cancelled() => {
                state.phase = state.settled(Phase::Idle);
                return SearchOutcome::Cancelled;
            }
            Err(e) => {
                warn!("live search #{} failed: {}", generation, e);
                (LiveView::Error { message: e.user_message() }, SearchOutcome::Failed, Phase::Errored)
            }
        };

        self.view.show(&view);
        state.has_content = true;
        state.phase = state.settled(phase);
        outcome
    }
}
