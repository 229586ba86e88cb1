use serde::Serialize;

use crate::model::Segment;

/// Plain text plus the segment projection of the content.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContentChange {
    pub text: String,
    pub segments: Vec<Segment>,
}

/// Outbound notification for the host.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum EditorEvent {
    /// Emitted after every content mutation.
    Change(ContentChange),
    /// Emitted once for a submit gesture.
    Submit(ContentChange),
}

/// Selection in flat offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FlatSelection {
    pub anchor: usize,
    pub focus: usize,
}

impl FlatSelection {
    pub fn caret(at: usize) -> Self {
        Self {
            anchor: at,
            focus: at,
        }
    }

    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.focus
    }

    pub fn range(&self) -> std::ops::Range<usize> {
        self.anchor.min(self.focus)..self.anchor.max(self.focus)
    }
}

/// Result of applying a command or key.
#[derive(Debug, Clone, PartialEq)]
pub struct Patch {
    pub events: Vec<EditorEvent>,
    pub selection: Option<FlatSelection>,
    pub version: u64,
    /// False when the editor left the input to the host.
    pub handled: bool,
}

impl Patch {
    pub fn change(&self) -> Option<&ContentChange> {
        self.events.iter().find_map(|e| match e {
            EditorEvent::Change(c) => Some(c),
            EditorEvent::Submit(_) => None,
        })
    }

    pub fn submit(&self) -> Option<&ContentChange> {
        self.events.iter().find_map(|e| match e {
            EditorEvent::Submit(c) => Some(c),
            EditorEvent::Change(_) => None,
        })
    }
}
