//! Trigger definitions and detection of an active trigger before the caret.

use std::{fmt, ops::Range, sync::Arc};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::offsets::Selection;
use crate::{
    error::EngineError,
    model::{Mention, NodeId, NodeKind, Tree},
};

/// Hook turning a suggestion into display or serialized text.
pub type SuggestionFn = Arc<dyn Fn(&Suggestion) -> String + Send + Sync>;

/// A candidate offered while a trigger is active.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default)]
    pub disabled: bool,
}

impl Suggestion {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            data: None,
            disabled: false,
        }
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn disabled(mut self) -> Self {
        self.disabled = true;
        self
    }
}

/// Optional rendering and serialization hooks of a trigger.
#[derive(Clone, Default)]
pub struct TriggerHooks {
    /// Text shown for a suggestion in the list. Defaults to its label.
    pub render_suggestion: Option<SuggestionFn>,
    /// On-screen text of a committed mention. Defaults to trigger + label.
    pub render_mention: Option<SuggestionFn>,
    /// Serialized value of a committed mention. Defaults to its rendered text.
    pub serialize: Option<SuggestionFn>,
}

impl fmt::Debug for TriggerHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TriggerHooks")
            .field("render_suggestion", &self.render_suggestion.is_some())
            .field("render_mention", &self.render_mention.is_some())
            .field("serialize", &self.serialize.is_some())
            .finish()
    }
}

/// Static configuration of one trigger character.
#[derive(Debug, Clone)]
pub struct TriggerDefinition {
    pub trigger: char,
    pub suggestions: Vec<Suggestion>,
    pub hooks: TriggerHooks,
}

impl TriggerDefinition {
    pub fn new(trigger: char, suggestions: Vec<Suggestion>) -> Self {
        Self {
            trigger,
            suggestions,
            hooks: TriggerHooks::default(),
        }
    }

    /// Parses a trigger from a configuration string, which must hold exactly
    /// one character.
    pub fn parse_trigger(s: &str) -> Result<char, EngineError> {
        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Ok(c),
            _ => Err(EngineError::InvalidTrigger(s.to_string())),
        }
    }

    pub fn with_render_suggestion(
        mut self,
        f: impl Fn(&Suggestion) -> String + Send + Sync + 'static,
    ) -> Self {
        self.hooks.render_suggestion = Some(Arc::new(f));
        self
    }

    pub fn with_render_mention(
        mut self,
        f: impl Fn(&Suggestion) -> String + Send + Sync + 'static,
    ) -> Self {
        self.hooks.render_mention = Some(Arc::new(f));
        self
    }

    pub fn with_serialize(
        mut self,
        f: impl Fn(&Suggestion) -> String + Send + Sync + 'static,
    ) -> Self {
        self.hooks.serialize = Some(Arc::new(f));
        self
    }

    /// Text to show for `suggestion` in the suggestion list.
    pub fn suggestion_text(&self, suggestion: &Suggestion) -> String {
        match &self.hooks.render_suggestion {
            Some(render) => render(suggestion),
            None => suggestion.label.clone(),
        }
    }

    /// Builds the mention committed for `suggestion`.
    ///
    /// A mention always renders at least one character: an empty result from
    /// the render hook falls back to the trigger and label.
    pub fn mention_for(&self, suggestion: &Suggestion) -> Mention {
        let rendered = self
            .hooks
            .render_mention
            .as_ref()
            .map(|render| render(suggestion))
            .filter(|text| !text.is_empty())
            .unwrap_or_else(|| format!("{}{}", self.trigger, suggestion.label));
        Mention {
            trigger: self.trigger,
            label: suggestion.label.clone(),
            data: suggestion.data.clone(),
            rendered,
            serialized: self.hooks.serialize.as_ref().map(|f| f(suggestion)),
        }
    }
}

/// A trigger found before the caret.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerMatch {
    /// Index into the trigger list.
    pub trigger_index: usize,
    pub trigger: char,
    /// Text typed after the trigger character.
    pub query: String,
    /// Text node holding the trigger and the caret.
    pub node: NodeId,
    /// Character range of trigger + query inside `node`.
    pub range: Range<usize>,
}

/// Characters allowed directly before a trigger.
fn opens_trigger(c: char) -> bool {
    matches!(c, ' ' | '\n' | '\u{00A0}')
}

/// Finds the active trigger context at the caret.
///
/// Only a collapsed selection inside a text node is considered, and only the
/// text of that node before the caret is scanned. Triggers are tried in
/// declaration order; for each the last occurrence is taken and rejected
/// unless it starts the node or follows whitespace, and unless the query
/// after it is free of spaces. The first surviving trigger wins.
pub fn detect(
    tree: &Tree,
    selection: Option<&Selection>,
    triggers: &[TriggerDefinition],
) -> Option<TriggerMatch> {
    let selection = selection?;
    if !selection.is_collapsed() || !tree.contains(selection.focus.node) {
        return None;
    }
    let caret = selection.focus;
    let NodeKind::Text(text) = tree.kind(caret.node)? else {
        return None;
    };
    let before: Vec<char> = text.chars().take(caret.offset).collect();

    triggers.iter().enumerate().find_map(|(index, def)| {
        let at = before.iter().rposition(|&c| c == def.trigger)?;
        if at > 0 && !opens_trigger(before[at - 1]) {
            return None;
        }
        let query: String = before[at + 1..].iter().collect();
        if query.contains(' ') {
            return None;
        }
        Some(TriggerMatch {
            trigger_index: index,
            trigger: def.trigger,
            query,
            node: caret.node,
            range: at..before.len(),
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editing::offsets::{Position, restore_offset};
    use crate::model::tree::char_len;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn triggers() -> Vec<TriggerDefinition> {
        vec![
            TriggerDefinition::new('@', vec![Suggestion::new("Alice")]),
            TriggerDefinition::new('#', vec![Suggestion::new("rust")]),
        ]
    }

    fn caret_at_end(tree: &Tree, text: &str) -> Selection {
        Selection::collapsed(restore_offset(tree, char_len(text)))
    }

    fn detect_in(text: &str) -> Option<TriggerMatch> {
        let tree = Tree::from_text(text);
        let selection = caret_at_end(&tree, text);
        detect(&tree, Some(&selection), &triggers())
    }

    #[rstest]
    #[case("hello @world", Some(('@', "world")))]
    #[case("hello@world", None)]
    #[case("@", Some(('@', "")))]
    #[case("@Al", Some(('@', "Al")))]
    #[case("Hi @Al", Some(('@', "Al")))]
    #[case("Hi @Al ice", None)]
    #[case("see #ru", Some(('#', "ru")))]
    #[case("a\u{00A0}@b", Some(('@', "b")))]
    #[case("plain text", None)]
    fn detection_cases(#[case] text: &str, #[case] expected: Option<(char, &str)>) {
        let found = detect_in(text).map(|m| (m.trigger, m.query));
        assert_eq!(found, expected.map(|(t, q)| (t, q.to_string())));
    }

    #[test]
    fn last_occurrence_is_the_only_candidate() {
        // The second '@' is glued to a word, so the earlier valid '@' is not
        // used as a fallback.
        assert_eq!(detect_in("x @a@b"), None);
    }

    #[test]
    fn declaration_order_breaks_ties() {
        // Both are valid; '#' is closer to the caret but '@' is declared first.
        let found = detect_in("@al\u{00A0}#r").map(|m| (m.trigger, m.query));
        assert_eq!(found, Some(('@', "al\u{00A0}#r".to_string())));

        // A space in the '@' query rejects it, leaving '#'.
        let found = detect_in("@al #r").map(|m| m.trigger);
        assert_eq!(found, Some('#'));
    }

    #[test]
    fn reports_span_within_the_leaf() {
        let found = detect_in("Hi @Al").unwrap();
        assert_eq!(found.range, 3..6);
        assert_eq!(found.trigger_index, 0);
    }

    #[test]
    fn range_selection_detects_nothing() {
        let tree = Tree::from_text("@Al");
        let text = tree.children(tree.root())[0];
        let selection = Selection {
            anchor: Position::new(text, 1),
            focus: Position::new(text, 3),
        };
        assert_eq!(detect(&tree, Some(&selection), &triggers()), None);
        assert_eq!(detect(&tree, None, &triggers()), None);
    }

    #[test]
    fn trigger_split_across_leaves_is_not_detected() {
        let mut tree = Tree::new();
        let root = tree.root();
        tree.append(root, NodeKind::Text("hi @".into()));
        let tail = tree.append(root, NodeKind::Text("Al".into()));
        let selection = Selection::collapsed(Position::new(tail, 2));
        assert_eq!(detect(&tree, Some(&selection), &triggers()), None);
    }

    #[test]
    fn caret_mid_text_only_scans_before_it() {
        let tree = Tree::from_text("@Alice rest");
        let text = tree.children(tree.root())[0];
        let selection = Selection::collapsed(Position::new(text, 3));
        let found = detect(&tree, Some(&selection), &triggers()).unwrap();
        assert_eq!(found.query, "Al");
    }

    #[test]
    fn mention_uses_hooks() {
        let def = TriggerDefinition::new('@', vec![])
            .with_serialize(|s| s.label.to_lowercase() + "@co")
            .with_render_suggestion(|s| format!("{} (user)", s.label));
        let alice = Suggestion::new("Alice").with_data(serde_json::json!({ "id": 1 }));

        let mention = def.mention_for(&alice);
        assert_eq!(mention.rendered, "@Alice");
        assert_eq!(mention.value(), "alice@co");
        assert_eq!(mention.data, Some(serde_json::json!({ "id": 1 })));
        assert_eq!(def.suggestion_text(&alice), "Alice (user)");
    }

    #[test]
    fn empty_render_falls_back_to_trigger_and_label() {
        let def = TriggerDefinition::new('@', vec![]).with_render_mention(|_| String::new());
        let mention = def.mention_for(&Suggestion::new("Alice"));
        assert_eq!(mention.rendered, "@Alice");
        assert_eq!(mention.len(), 6);
        assert!(!mention.is_empty());
    }

    #[rstest]
    #[case("@", Some('@'))]
    #[case("", None)]
    #[case("@@", None)]
    fn parse_trigger_requires_one_char(#[case] input: &str, #[case] expected: Option<char>) {
        assert_eq!(TriggerDefinition::parse_trigger(input).ok(), expected);
    }
}
