use std::sync::Arc;

use tokio::{
    sync::mpsc::{self, UnboundedReceiver, UnboundedSender},
    task::JoinHandle,
};
use tracing::{debug, warn};

use super::session::{Key, QueryChange, SuggestionSession, SuggestionSessionState};
use crate::{
    config::SuggestionSettings, error::SearchError, model::Suggestion, provider::WeatherProvider,
};

/// Visible change produced by [`SuggestionController::next_update`].
#[derive(Debug, Clone, PartialEq)]
pub enum SuggestionUpdate {
    /// The debounce elapsed and request `sequence` went out.
    Loading { sequence: u64 },
    /// Fresh suggestions were installed.
    Suggestions(Vec<Suggestion>),
    /// The latest request failed; the dropdown is closed.
    Failed(SearchError),
}

#[derive(Debug)]
enum Message {
    DebounceElapsed { generation: u64 },
    Fetched { sequence: u64, result: Result<Vec<Suggestion>, SearchError> },
}

/// Drives a [`SuggestionSession`] with a debounce timer and suggestion fetches.
///
/// Timer and fetch tasks report back over a channel; their results only
/// touch the session inside [`next_update`](Self::next_update). Methods that
/// arm the timer must run inside a Tokio runtime.
pub struct SuggestionController {
    session: SuggestionSession,
    provider: Arc<dyn WeatherProvider>,
    settings: SuggestionSettings,
    timer: Option<JoinHandle<()>>,
    timer_generation: u64,
    tx: UnboundedSender<Message>,
    rx: UnboundedReceiver<Message>,
}

impl std::fmt::Debug for SuggestionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SuggestionController")
            .field("state", self.session.state())
            .field("timer_armed", &self.timer.is_some())
            .finish()
    }
}

impl SuggestionController {
    pub fn new(provider: Arc<dyn WeatherProvider>, settings: SuggestionSettings) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            session: SuggestionSession::new(settings),
            provider,
            settings,
            timer: None,
            timer_generation: 0,
            tx,
            rx,
        }
    }

    pub fn state(&self) -> &SuggestionSessionState {
        self.session.state()
    }

    /// A timer is armed or a request is awaiting its response.
    pub fn is_pending(&self) -> bool {
        self.timer.is_some() || self.session.state().is_loading
    }

    pub fn on_query_changed(&mut self, text: impl Into<String>) {
        self.cancel_timer();

        match self.session.set_query(text) {
            QueryChange::Cleared => debug!("query too short, suggestions cleared"),
            QueryChange::Debounce => self.arm_timer(),
        }
    }

    /// Returns the location to forward to the search when the key submits.
    pub fn on_key(&mut self, key: Key) -> Option<String> {
        let was_open = self.session.state().is_open;
        let submitted = self.session.on_key(key);
        if submitted.is_some() || (was_open && key == Key::Escape) {
            self.cancel_timer();
        }
        submitted
    }

    pub fn select_suggestion(&mut self, item: &Suggestion) -> String {
        self.cancel_timer();
        self.session.select(item)
    }

    pub fn submit(&mut self) -> Result<String, SearchError> {
        let location = self.session.submit()?;
        self.cancel_timer();
        Ok(location)
    }

    pub fn on_blur_outside(&mut self) {
        self.cancel_timer();
        self.session.blur();
    }

    /// Process timer and fetch completions until something visible changes.
    ///
    /// Stale responses are dropped silently. Only await this while
    /// [`is_pending`](Self::is_pending) is true; otherwise it waits forever.
    pub async fn next_update(&mut self) -> Option<SuggestionUpdate> {
        loop {
            match self.rx.recv().await? {
                Message::DebounceElapsed { generation } if generation == self.timer_generation => {
                    self.timer = None;
                    let sequence = self.issue_fetch();
                    return Some(SuggestionUpdate::Loading { sequence });
                }
                Message::DebounceElapsed { generation } => {
                    debug!(generation, "ignoring superseded debounce tick");
                }
                Message::Fetched { sequence, result: Ok(items) } => {
                    if self.session.accept(sequence, items) {
                        return Some(SuggestionUpdate::Suggestions(
                            self.session.state().items.clone(),
                        ));
                    }
                }
                Message::Fetched { sequence, result: Err(err) } => {
                    if self.session.fail(sequence) {
                        warn!(sequence, error = %err, "suggestion fetch failed");
                        return Some(SuggestionUpdate::Failed(err));
                    }
                }
            }
        }
    }

    fn arm_timer(&mut self) {
        self.timer_generation += 1;
        let generation = self.timer_generation;
        let delay = self.settings.debounce;
        let tx = self.tx.clone();

        self.timer = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(Message::DebounceElapsed { generation });
        }));
    }

    fn cancel_timer(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
            // A tick already queued by this timer must not fire a fetch.
            self.timer_generation += 1;
        }
    }

    fn issue_fetch(&mut self) -> u64 {
        let sequence = self.session.issue();
        let query = self.session.state().query.trim().to_string();
        let provider = Arc::clone(&self.provider);
        let tx = self.tx.clone();

        debug!(sequence, %query, "fetching suggestions");
        tokio::spawn(async move {
            let result = provider.suggestions(&query).await;
            let _ = tx.send(Message::Fetched { sequence, result });
        });

        sequence
    }
}

impl Drop for SuggestionController {
    fn drop(&mut self) {
        self.cancel_timer();
    }
}
