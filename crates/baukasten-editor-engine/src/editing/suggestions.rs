//! Suggestion list state while a trigger is active.

use std::ops::Range;

use super::triggers::{Suggestion, TriggerDefinition};

/// An open trigger context, with its span in flat offsets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveTrigger {
    pub trigger_index: usize,
    pub trigger: char,
    pub query: String,
    /// Flat range of trigger + query, replaced when a suggestion is committed.
    pub span: Range<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum MenuState {
    #[default]
    Closed,
    Open(ActiveTrigger),
}

/// The suggestion dropdown: closed, or open on an active trigger with a
/// highlighted entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SuggestionMenu {
    state: MenuState,
    highlighted: usize,
}

impl SuggestionMenu {
    pub fn state(&self) -> &MenuState {
        &self.state
    }

    pub fn is_open(&self) -> bool {
        matches!(self.state, MenuState::Open(_))
    }

    pub fn active(&self) -> Option<&ActiveTrigger> {
        match &self.state {
            MenuState::Open(active) => Some(active),
            MenuState::Closed => None,
        }
    }

    pub fn highlighted(&self) -> usize {
        self.highlighted
    }

    /// Opens, updates or closes the menu from the latest detection result.
    ///
    /// The highlight resets to the first entry whenever the trigger or the
    /// query changes.
    pub fn sync(&mut self, detected: Option<ActiveTrigger>) {
        match detected {
            Some(next) => {
                let same_context = self.active().is_some_and(|current| {
                    current.trigger_index == next.trigger_index && current.query == next.query
                });
                if !same_context {
                    self.highlighted = 0;
                }
                self.state = MenuState::Open(next);
            }
            None => self.close(),
        }
    }

    pub fn close(&mut self) {
        self.state = MenuState::Closed;
        self.highlighted = 0;
    }

    /// Moves the highlight down, stopping at the last of `count` entries.
    pub fn move_down(&mut self, count: usize) {
        if count > 0 {
            self.highlighted = (self.highlighted + 1).min(count - 1);
        }
    }

    /// Moves the highlight up, stopping at the first entry.
    pub fn move_up(&mut self) {
        self.highlighted = self.highlighted.saturating_sub(1);
    }

    /// Suggestions of the active trigger matching the current query.
    pub fn filtered<'a>(&self, triggers: &'a [TriggerDefinition]) -> Vec<&'a Suggestion> {
        self.active()
            .and_then(|active| {
                let def = triggers.get(active.trigger_index)?;
                Some(filter(&def.suggestions, &active.query))
            })
            .unwrap_or_default()
    }

    /// The highlighted suggestion, if the menu is open and non-empty.
    pub fn highlighted_suggestion<'a>(
        &self,
        triggers: &'a [TriggerDefinition],
    ) -> Option<&'a Suggestion> {
        let filtered = self.filtered(triggers);
        let index = self.highlighted.min(filtered.len().checked_sub(1)?);
        filtered.get(index).copied()
    }
}

/// Case-insensitive substring filter. An empty query keeps everything.
pub fn filter<'a>(suggestions: &'a [Suggestion], query: &str) -> Vec<&'a Suggestion> {
    if query.is_empty() {
        return suggestions.iter().collect();
    }
    let needle = query.to_lowercase();
    suggestions
        .iter()
        .filter(|s| s.label.to_lowercase().contains(&needle))
        .collect()
}
