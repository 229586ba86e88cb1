use serde_json::Value;

/// The kind of a node in the content [`Tree`](super::Tree).
///
/// Only `Root`, `Block` and `Decorator` nodes carry children. Every other kind
/// is a leaf.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// The single top-level container.
    Root,
    /// A block-level container. Every block that is not the first child of
    /// its parent starts a new line.
    Block,
    /// A run of editable text.
    Text(String),
    /// An explicit line break.
    LineBreak,
    /// An atomic, non-editable mention token.
    Mention(Mention),
    /// A presentational wrapper added by the decorator engine.
    Decorator(DecoratorMark),
}

impl NodeKind {
    pub fn is_container(&self) -> bool {
        matches!(
            self,
            NodeKind::Root | NodeKind::Block | NodeKind::Decorator(_)
        )
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            NodeKind::Text(s) => Some(s),
            _ => None,
        }
    }
}

/// A mention committed from a suggestion.
///
/// The caret treats a mention as a single unit whose width is the length of
/// `rendered`. Its serialized value is `serialized` when a custom serializer
/// produced one, otherwise `rendered`.
#[derive(Debug, Clone, PartialEq)]
pub struct Mention {
    /// Trigger character that produced the mention (`@`, `#`, `/`, ...).
    pub trigger: char,
    /// Label of the chosen suggestion.
    pub label: String,
    /// Opaque payload copied from the suggestion.
    pub data: Option<Value>,
    /// Text shown on screen.
    pub rendered: String,
    /// Precomputed serialized value, if the trigger defines a serializer.
    pub serialized: Option<String>,
}

impl Mention {
    /// Width of the mention in flat caret offsets.
    pub fn len(&self) -> usize {
        self.rendered.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.rendered.is_empty()
    }

    /// The value this mention contributes to serialized content.
    pub fn value(&self) -> &str {
        self.serialized.as_deref().unwrap_or(&self.rendered)
    }
}

/// Marks a decorator wrapper with the rule that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecoratorMark {
    /// Index of the rule in the decorator list.
    pub rule: usize,
    pub class: String,
    pub style: Option<String>,
}
