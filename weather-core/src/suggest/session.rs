use tracing::debug;

use crate::{config::SuggestionSettings, error::SearchError, model::Suggestion};

/// Abstract key input, independent of any UI toolkit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    ArrowDown,
    ArrowUp,
    Enter,
    Escape,
}

/// Observable state of one search box.
///
/// `highlighted` is `None` or a valid index into `items`. `items` is only
/// ever replaced wholesale.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SuggestionSessionState {
    pub query: String,
    /// Latest issued request sequence; 0 before the first request.
    pub sequence: u64,
    pub items: Vec<Suggestion>,
    pub highlighted: Option<usize>,
    pub is_open: bool,
    pub is_loading: bool,
}

/// What the caller should do after a query change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryChange {
    /// Too short: suggestions were cleared, nothing to fetch.
    Cleared,
    /// Long enough: (re)arm the debounce timer.
    Debounce,
}

#[derive(Debug, Clone, Default)]
pub struct SuggestionSession {
    state: SuggestionSessionState,
    settings: SuggestionSettings,
}

impl SuggestionSession {
    pub fn new(settings: SuggestionSettings) -> Self {
        Self { state: SuggestionSessionState::default(), settings }
    }

    pub fn state(&self) -> &SuggestionSessionState {
        &self.state
    }

    pub fn highlighted_item(&self) -> Option<&Suggestion> {
        self.state.highlighted.and_then(|idx| self.state.items.get(idx))
    }

    pub fn set_query(&mut self, text: impl Into<String>) -> QueryChange {
        self.state.query = text.into();

        if self.state.query.trim().chars().count() < self.settings.min_query_len {
            self.teardown();
            QueryChange::Cleared
        } else {
            QueryChange::Debounce
        }
    }

    /// Start a new request for the current query and return its sequence.
    pub fn issue(&mut self) -> u64 {
        self.state.sequence += 1;
        self.state.is_loading = true;
        self.state.sequence
    }

    fn is_current(&self, sequence: u64) -> bool {
        self.state.is_loading && sequence == self.state.sequence
    }

    /// Install the response to request `sequence`.
    ///
    /// Returns `false` and leaves the state untouched when the response is
    /// stale: an older sequence, or a request abandoned by a teardown.
    pub fn accept(&mut self, sequence: u64, mut items: Vec<Suggestion>) -> bool {
        if !self.is_current(sequence) {
            debug!(sequence, latest = self.state.sequence, "discarding stale suggestions");
            return false;
        }

        items.truncate(self.settings.max_suggestions);
        self.state.is_open = !items.is_empty();
        self.state.items = items;
        self.state.highlighted = None;
        self.state.is_loading = false;
        true
    }

    /// Record a failed fetch for `sequence`. Same staleness rule as [`accept`].
    ///
    /// [`accept`]: SuggestionSession::accept
    pub fn fail(&mut self, sequence: u64) -> bool {
        if !self.is_current(sequence) {
            return false;
        }
        self.teardown();
        true
    }

    /// Returns the location to search for when the key submits.
    pub fn on_key(&mut self, key: Key) -> Option<String> {
        if !self.state.is_open || self.state.items.is_empty() {
            return None;
        }

        let last = self.state.items.len() - 1;
        match key {
            Key::ArrowDown => {
                self.state.highlighted = Some(match self.state.highlighted {
                    None => 0,
                    Some(idx) => (idx + 1).min(last),
                });
                None
            }
            Key::ArrowUp => {
                self.state.highlighted = self.state.highlighted.and_then(|idx| idx.checked_sub(1));
                None
            }
            Key::Enter => match self.highlighted_item().cloned() {
                Some(item) => Some(self.select(&item)),
                None => self.submit().ok(),
            },
            Key::Escape => {
                self.teardown();
                None
            }
        }
    }

    /// Pick a suggestion: the query becomes `"name, country"` and the dropdown closes.
    pub fn select(&mut self, item: &Suggestion) -> String {
        let location = item.location_string();
        self.state.query = location.clone();
        self.teardown();
        location
    }

    /// Submit the raw text as typed.
    pub fn submit(&mut self) -> Result<String, SearchError> {
        let location = self.state.query.trim().to_string();
        if location.is_empty() {
            return Err(SearchError::validation("Please enter a location"));
        }
        self.teardown();
        Ok(location)
    }

    /// Focus or pointer left the control; the text stays.
    pub fn blur(&mut self) {
        self.teardown();
    }

    fn teardown(&mut self) {
        self.state.items = Vec::new();
        self.state.highlighted = None;
        self.state.is_open = false;
        self.state.is_loading = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn suggestion(name: &str) -> Suggestion {
        Suggestion { name: name.into(), region: String::new(), country: "Canada".into() }
    }

    fn items(n: usize) -> Vec<Suggestion> {
        (0..n).map(|i| suggestion(&format!("City{i}"))).collect()
    }

    fn open_session(n: usize) -> SuggestionSession {
        let mut s = SuggestionSession::default();
        assert_eq!(s.set_query("Tor"), QueryChange::Debounce);
        let seq = s.issue();
        assert!(s.accept(seq, items(n)));
        s
    }

    #[test]
    fn short_query_clears_without_fetch() {
        let mut s = open_session(3);
        assert_eq!(s.set_query(" T "), QueryChange::Cleared);
        assert!(!s.state().is_open);
        assert!(s.state().items.is_empty());
        assert_eq!(s.state().query, " T ");
    }

    #[test]
    fn out_of_order_responses_keep_the_latest() {
        let mut s = SuggestionSession::default();
        s.set_query("To");
        let one = s.issue();
        s.set_query("Tor");
        let two = s.issue();
        s.set_query("Toro");
        let three = s.issue();

        assert!(!s.accept(one, vec![suggestion("Tokyo")]));
        assert!(s.state().is_loading);

        s.state.highlighted = Some(0);
        assert!(s.accept(three, vec![suggestion("Toronto")]));
        assert_eq!(s.state().highlighted, None);
        s.on_key(Key::ArrowDown);

        assert!(!s.accept(two, vec![suggestion("Torino")]));
        assert_eq!(s.state().items, vec![suggestion("Toronto")]);
        // The discarded response did not reset the highlight.
        assert_eq!(s.state().highlighted, Some(0));
        assert!(!s.state().is_loading);
    }

    #[test]
    fn accept_truncates_to_five_and_opens() {
        let s = open_session(8);
        assert_eq!(s.state().items.len(), 5);
        assert!(s.state().is_open);
        assert!(!s.state().is_loading);
    }

    #[test]
    fn empty_response_stays_closed() {
        let s = open_session(0);
        assert!(!s.state().is_open);
    }

    #[test]
    fn arrow_down_clamps_at_last_item() {
        let mut s = open_session(3);
        for _ in 0..(3 + 5) {
            assert_eq!(s.on_key(Key::ArrowDown), None);
        }
        assert_eq!(s.state().highlighted, Some(2));
    }

    #[test]
    fn arrow_up_stops_at_none() {
        let mut s = open_session(3);
        s.on_key(Key::ArrowDown);
        s.on_key(Key::ArrowDown);
        s.on_key(Key::ArrowUp);
        assert_eq!(s.state().highlighted, Some(0));
        s.on_key(Key::ArrowUp);
        s.on_key(Key::ArrowUp);
        assert_eq!(s.state().highlighted, None);
    }

    #[test]
    fn keys_are_ignored_when_closed() {
        let mut s = SuggestionSession::default();
        s.set_query("Tor");
        assert_eq!(s.on_key(Key::ArrowDown), None);
        assert_eq!(s.on_key(Key::Enter), None);
        assert_eq!(s.state().highlighted, None);
    }

    #[test]
    fn enter_on_highlight_selects() {
        let mut s = open_session(3);
        s.on_key(Key::ArrowDown);
        s.on_key(Key::ArrowDown);

        assert_eq!(s.on_key(Key::Enter).as_deref(), Some("City1, Canada"));
        assert_eq!(s.state().query, "City1, Canada");
        assert!(!s.state().is_open);
        assert!(s.state().items.is_empty());
    }

    #[test]
    fn enter_without_highlight_submits_raw_text() {
        let mut s = open_session(3);
        s.set_query("  Toronto ");
        assert_eq!(s.on_key(Key::Enter).as_deref(), Some("Toronto"));
        assert!(!s.state().is_open);
    }

    #[test]
    fn escape_closes_and_keeps_text() {
        let mut s = open_session(3);
        s.on_key(Key::ArrowDown);
        s.on_key(Key::Escape);
        assert!(!s.state().is_open);
        assert_eq!(s.state().highlighted, None);
        assert_eq!(s.state().query, "Tor");
    }

    #[test]
    fn teardown_makes_in_flight_response_stale() {
        let mut s = SuggestionSession::default();
        s.set_query("Tor");
        let seq = s.issue();
        s.blur();
        assert!(!s.accept(seq, items(2)));
        assert!(!s.state().is_open);
        assert_eq!(s.state().query, "Tor");
    }

    #[test]
    fn submit_rejects_blank_text() {
        let mut s = SuggestionSession::default();
        s.set_query("   ");
        assert_eq!(s.submit(), Err(SearchError::validation("Please enter a location")));
    }

    #[test]
    fn failure_of_latest_request_closes() {
        let mut s = open_session(2);
        let seq = s.issue();
        assert!(s.fail(seq));
        assert!(!s.state().is_loading);
        assert!(!s.state().is_open);
        assert!(!s.fail(seq - 1));
    }
}
