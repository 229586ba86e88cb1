use crate::{
    editing::{
        Cmd, Key, KeyInput, Snapshot,
        decorators::{self, DecoratorRule},
        mutate::{delete_range, insert_nodes, insert_text},
        offsets::{
            Position, Selection, content_len, get_offset, next_boundary, offset_of,
            prev_boundary, restore_offset, snap_range,
        },
        patch::{ContentChange, EditorEvent, FlatSelection, Patch},
        suggestions::{ActiveTrigger, SuggestionMenu, filter},
        triggers::{self, Suggestion, TriggerDefinition},
    },
    model::{Mention, NodeKind, Segment, Tree, plain_text, serialize},
};

/// Text inserted after every committed mention, so the caret always has a
/// text position to land on. This is a plain U+0020 space, not a
/// non-breaking space (U+00A0), so serialized text segments carry `' '`.
pub const MENTION_SPACER: &str = " ";

/// Construction-time configuration of an [`Editor`].
#[derive(Debug, Clone, Default)]
pub struct EditorOptions {
    pub triggers: Vec<TriggerDefinition>,
    pub decorators: Vec<DecoratorRule>,
    /// Ignore all input.
    pub disabled: bool,
    /// Allow selection and caret movement but no edits.
    pub read_only: bool,
    pub placeholder: Option<String>,
    pub initial_value: Option<String>,
}

/// The editor core: owns the content tree, the selection and the suggestion
/// menu, and runs every input through the mutation pipeline.
///
/// Each mutation strips decorators, edits the canonical tree, serializes and
/// emits the change, re-runs trigger detection and finally reapplies
/// decorators. The selection is stored as flat offsets, so it survives the
/// tree being rebuilt.
#[derive(Debug, Clone)]
pub struct Editor {
    tree: Tree,
    selection: Option<FlatSelection>,
    options: EditorOptions,
    menu: SuggestionMenu,
    focused: bool,
    version: u64,
}

enum Choice {
    Commit(Mention),
    Blocked,
    Missing,
}

impl Editor {
    pub fn new(options: EditorOptions) -> Self {
        let tree = options
            .initial_value
            .as_deref()
            .map(Tree::from_text)
            .unwrap_or_default();
        let tree = decorators::apply(&tree, &options.decorators);
        Self {
            tree,
            selection: None,
            options,
            menu: SuggestionMenu::default(),
            focused: false,
            version: 0,
        }
    }

    pub fn options(&self) -> &EditorOptions {
        &self.options
    }

    /// The current (decorated) content tree.
    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    pub fn menu(&self) -> &SuggestionMenu {
        &self.menu
    }

    pub fn selection(&self) -> Option<FlatSelection> {
        self.selection
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }

    pub fn segments(&self) -> Vec<Segment> {
        serialize(&self.tree)
    }

    pub fn text(&self) -> String {
        plain_text(&self.segments())
    }

    /// Content length in flat offsets.
    pub fn len(&self) -> usize {
        content_len(&self.tree)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn content(&self) -> ContentChange {
        let segments = self.segments();
        ContentChange {
            text: plain_text(&segments),
            segments,
        }
    }

    /// Suggestions offered for the active trigger, filtered by its query.
    pub fn suggestions(&self) -> Vec<&Suggestion> {
        self.menu.filtered(&self.options.triggers)
    }

    /// The selection expressed as positions in the current tree.
    pub fn tree_selection(&self) -> Option<Selection> {
        let sel = self.selection?;
        Some(Selection {
            anchor: restore_offset(&self.tree, sel.anchor),
            focus: restore_offset(&self.tree, sel.focus),
        })
    }

    /// Takes a selection reported by the host in tree positions.
    ///
    /// A selection that does not map onto the tree is ignored for this
    /// cycle and the previous selection is kept.
    pub fn set_tree_selection(&mut self, selection: Option<&Selection>) -> Patch {
        let Some(focus) = get_offset(&self.tree, selection) else {
            return self.patch(Vec::new(), false);
        };
        let anchor = selection
            .and_then(|s| offset_of(&self.tree, s.anchor))
            .unwrap_or(focus);
        self.select(FlatSelection { anchor, focus })
    }

    pub fn snapshot(&self) -> Snapshot {
        crate::editing::snapshot::create_snapshot(self)
    }

    pub fn focus(&mut self) -> Patch {
        if self.options.disabled {
            return self.patch(Vec::new(), false);
        }
        self.focused = true;
        if self.selection.is_none() {
            self.selection = Some(FlatSelection::caret(self.len()));
        }
        self.refresh_trigger();
        self.patch(Vec::new(), true)
    }

    /// Loses focus. The menu stays open only when focus moves into the
    /// suggestion list itself.
    pub fn blur(&mut self, into_suggestions: bool) -> Patch {
        self.focused = false;
        if !into_suggestions && self.menu.is_open() {
            log::debug!("suggestions closed on blur");
            self.menu.close();
        }
        self.patch(Vec::new(), true)
    }

    /// Applies a command and returns what happened.
    pub fn apply(&mut self, cmd: Cmd) -> Patch {
        if self.options.disabled {
            return self.patch(Vec::new(), false);
        }
        match cmd {
            Cmd::Select { anchor, focus } => self.select(FlatSelection { anchor, focus }),
            Cmd::MoveLeft { extend } => {
                let target = match self.selection {
                    Some(sel) if !extend && !sel.is_collapsed() => sel.range().start,
                    _ => prev_boundary(&self.tree, self.focus_offset()),
                };
                self.move_to(target, extend)
            }
            Cmd::MoveRight { extend } => {
                let target = match self.selection {
                    Some(sel) if !extend && !sel.is_collapsed() => sel.range().end,
                    _ => next_boundary(&self.tree, self.focus_offset()),
                };
                self.move_to(target, extend)
            }
            Cmd::MoveHome { extend } => self.move_to(0, extend),
            Cmd::MoveEnd { extend } => self.move_to(self.len(), extend),
            Cmd::SetValue { text } => self.set_value(&text),
            _ if self.options.read_only => self.patch(Vec::new(), true),
            Cmd::InsertText { text } => self.replace_selection(&text),
            Cmd::Paste { text } => self.replace_selection(&text.replace("\r\n", "\n").replace('\r', "\n")),
            Cmd::InsertLineBreak => self.replace_selection("\n"),
            Cmd::DeleteBackward => self.delete(true),
            Cmd::DeleteForward => self.delete(false),
        }
    }

    /// Routes a key press through the suggestion menu first, then to editing.
    pub fn handle_key(&mut self, input: KeyInput) -> Patch {
        if self.options.disabled {
            return self.patch(Vec::new(), false);
        }
        let KeyInput { key, modifiers } = input;
        let count = self.suggestions().len();
        let listing = self.menu.is_open() && count > 0;

        match key {
            Key::Down if listing => {
                self.menu.move_down(count);
                self.patch(Vec::new(), true)
            }
            Key::Up if listing => {
                self.menu.move_up();
                self.patch(Vec::new(), true)
            }
            Key::Enter | Key::Tab if listing => {
                let index = self.menu.highlighted().min(count - 1);
                self.commit_suggestion(index)
            }
            Key::Escape if self.menu.is_open() => {
                log::debug!("suggestions dismissed");
                self.menu.close();
                self.patch(Vec::new(), true)
            }
            Key::Enter if modifiers.shift && !modifiers.has_command() => {
                self.apply(Cmd::InsertLineBreak)
            }
            Key::Enter if modifiers.is_empty() => self.submit(),
            Key::Char(c) if !modifiers.has_command() => self.apply(Cmd::InsertText {
                text: c.to_string(),
            }),
            Key::Backspace => self.apply(Cmd::DeleteBackward),
            Key::Delete => self.apply(Cmd::DeleteForward),
            Key::Left => self.apply(Cmd::MoveLeft {
                extend: modifiers.shift,
            }),
            Key::Right => self.apply(Cmd::MoveRight {
                extend: modifiers.shift,
            }),
            Key::Home => self.apply(Cmd::MoveHome {
                extend: modifiers.shift,
            }),
            Key::End => self.apply(Cmd::MoveEnd {
                extend: modifiers.shift,
            }),
            _ => self.patch(Vec::new(), false),
        }
    }

    /// Commits the `index`th filtered suggestion of the active trigger.
    ///
    /// Replaces trigger and query with one mention followed by
    /// [`MENTION_SPACER`], puts the caret after the spacer and closes the
    /// menu. A disabled suggestion is a no-op.
    pub fn commit_suggestion(&mut self, index: usize) -> Patch {
        if self.options.disabled || self.options.read_only {
            return self.patch(Vec::new(), false);
        }
        let Some(active) = self.menu.active().cloned() else {
            return self.patch(Vec::new(), false);
        };
        let mention = match self.choose(&active, index) {
            Choice::Commit(mention) => mention,
            Choice::Blocked => return self.patch(Vec::new(), true),
            Choice::Missing => return self.patch(Vec::new(), false),
        };
        log::debug!(
            "committing mention {:?} for trigger {:?}",
            mention.label,
            active.trigger
        );

        let span = active.span;
        let width = mention.len();
        let patch = self.mutate(move |tree| {
            delete_range(tree, span.clone());
            insert_nodes(
                tree,
                span.start,
                vec![
                    NodeKind::Mention(mention),
                    NodeKind::Text(MENTION_SPACER.to_string()),
                ],
            );
            span.start + width + MENTION_SPACER.chars().count()
        });
        self.menu.close();
        patch
    }

    fn choose(&self, active: &ActiveTrigger, index: usize) -> Choice {
        let Some(def) = self.options.triggers.get(active.trigger_index) else {
            return Choice::Missing;
        };
        match filter(&def.suggestions, &active.query).get(index) {
            Some(s) if s.disabled => {
                log::debug!("suggestion {:?} is disabled", s.label);
                Choice::Blocked
            }
            Some(s) => Choice::Commit(def.mention_for(s)),
            None => Choice::Missing,
        }
    }

    fn submit(&mut self) -> Patch {
        if self.options.read_only {
            return self.patch(Vec::new(), false);
        }
        log::debug!("submit");
        let content = self.content();
        self.patch(vec![EditorEvent::Submit(content)], true)
    }

    fn set_value(&mut self, text: &str) -> Patch {
        if text == self.text() {
            return self.patch(Vec::new(), true);
        }
        self.tree = decorators::apply(&Tree::from_text(text), &self.options.decorators);
        let len = self.len();
        self.selection = self.selection.map(|s| FlatSelection {
            anchor: s.anchor.min(len),
            focus: s.focus.min(len),
        });
        self.menu.close();
        self.version += 1;
        self.patch(Vec::new(), true)
    }

    fn replace_selection(&mut self, text: &str) -> Patch {
        let range = self.editing_range();
        if text.is_empty() && range.is_empty() {
            return self.patch(Vec::new(), true);
        }
        let text = text.to_string();
        self.mutate(move |tree| {
            let range = snap_range(tree, range);
            delete_range(tree, range.clone());
            insert_text(tree, range.start, &text)
        })
    }

    fn delete(&mut self, backward: bool) -> Patch {
        let range = self.editing_range();
        let range = if !range.is_empty() {
            range
        } else if backward {
            prev_boundary(&self.tree, range.start)..range.start
        } else {
            range.start..next_boundary(&self.tree, range.start)
        };
        if range.is_empty() {
            return self.patch(Vec::new(), true);
        }
        self.mutate(move |tree| {
            let range = snap_range(tree, range);
            delete_range(tree, range.clone());
            range.start
        })
    }

    /// Runs one content mutation through the pipeline:
    /// strip → edit → serialize/emit → detect → reapply decorators.
    fn mutate(&mut self, edit: impl FnOnce(&mut Tree) -> usize) -> Patch {
        let mut tree = decorators::strip(&self.tree);
        let caret = edit(&mut tree);
        self.tree = decorators::strip(&tree);

        let caret = caret.min(self.len());
        self.selection = Some(FlatSelection::caret(caret));
        self.version += 1;
        let change = self.content();
        log::trace!("content changed to {:?}", change.text);

        self.refresh_trigger();
        self.tree = decorators::apply(&self.tree, &self.options.decorators);
        self.patch(vec![EditorEvent::Change(change)], true)
    }

    fn select(&mut self, selection: FlatSelection) -> Patch {
        let anchor = self.snap_caret(selection.anchor);
        let focus = self.snap_caret(selection.focus);
        self.selection = Some(FlatSelection { anchor, focus });
        self.refresh_trigger();
        self.patch(Vec::new(), true)
    }

    fn move_to(&mut self, target: usize, extend: bool) -> Patch {
        let anchor = match self.selection {
            Some(sel) if extend => sel.anchor,
            _ => target,
        };
        self.select(FlatSelection {
            anchor,
            focus: target,
        })
    }

    /// Clamps an offset to the content and pushes it out of any mention.
    fn snap_caret(&self, offset: usize) -> usize {
        offset_of(&self.tree, restore_offset(&self.tree, offset)).unwrap_or(0)
    }

    fn focus_offset(&self) -> usize {
        self.selection.map(|s| s.focus).unwrap_or_else(|| self.len())
    }

    /// The selected range, or the caret (end of content without a selection).
    fn editing_range(&self) -> std::ops::Range<usize> {
        match self.selection {
            Some(sel) => sel.range(),
            None => {
                let len = self.len();
                len..len
            }
        }
    }

    fn refresh_trigger(&mut self) {
        let detected = self.detect_active();
        match (&detected, self.menu.is_open()) {
            (Some(active), false) => {
                log::debug!("trigger {:?} opened", active.trigger)
            }
            (None, true) => log::debug!("suggestions closed"),
            _ => {}
        }
        self.menu.sync(detected);
    }

    /// Detects a trigger on the canonical (decorator-free) tree.
    fn detect_active(&self) -> Option<ActiveTrigger> {
        if self.options.read_only || self.options.triggers.is_empty() {
            return None;
        }
        let sel = self.selection?;
        let tree = decorators::strip(&self.tree);
        let selection = Selection {
            anchor: restore_offset(&tree, sel.anchor),
            focus: restore_offset(&tree, sel.focus),
        };
        let found = triggers::detect(&tree, Some(&selection), &self.options.triggers)?;
        let start = offset_of(&tree, Position::new(found.node, found.range.start))?;
        Some(ActiveTrigger {
            trigger_index: found.trigger_index,
            trigger: found.trigger,
            query: found.query,
            span: start..start + found.range.len(),
        })
    }

    fn patch(&self, events: Vec<EditorEvent>, handled: bool) -> Patch {
        Patch {
            events,
            selection: self.selection,
            version: self.version,
            handled,
        }
    }
}
