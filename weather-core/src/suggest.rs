//! Location search box: debounced suggestion fetching and keyboard navigation.
//!
//! [`SuggestionSession`] is the synchronous state machine; it knows nothing
//! about time or I/O. [`SuggestionController`] wraps it with the debounce
//! timer and the sequence-tagged fetch tasks.

pub mod controller;
pub mod session;

pub use controller::{SuggestionController, SuggestionUpdate};
pub use session::{Key, QueryChange, SuggestionSession, SuggestionSessionState};
