//! Flat caret offsets and their mapping onto tree positions.
//!
//! A flat offset counts logical characters from the start of the content.
//! Text contributes its character count, a mention contributes the length of
//! its rendered text as one indivisible step, and every line break or
//! non-first block boundary contributes one. Decorator wrappers are
//! transparent.

use std::ops::Range;

use crate::model::{NodeId, NodeKind, Tree, tree::char_len};

/// A caret position inside the tree.
///
/// In a `Text` node `offset` is a character index into the text. In a
/// container (`Root`, `Block`, `Decorator`) it is a child index, so
/// `Position { node: parent, offset: i }` sits just before the `i`th child.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub node: NodeId,
    pub offset: usize,
}

impl Position {
    pub fn new(node: NodeId, offset: usize) -> Self {
        Self { node, offset }
    }
}

/// A tree selection. Collapsed when anchor and focus coincide.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub anchor: Position,
    pub focus: Position,
}

impl Selection {
    pub fn collapsed(at: Position) -> Self {
        Self {
            anchor: at,
            focus: at,
        }
    }

    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.focus
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum UnitKind {
    Text,
    Mention,
    LineBreak,
    BlockBoundary,
}

/// One leaf-level contribution to the flat offset space.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Unit {
    pub node: NodeId,
    pub kind: UnitKind,
    pub start: usize,
    pub len: usize,
}

impl Unit {
    pub fn end(&self) -> usize {
        self.start + self.len
    }
}

/// Flat-offset layout of every reachable node.
pub(crate) struct Layout {
    spans: Vec<Option<Range<usize>>>,
    pub units: Vec<Unit>,
    pub len: usize,
}

impl Layout {
    pub fn of(tree: &Tree) -> Self {
        let mut layout = Self {
            spans: vec![None; tree.capacity()],
            units: Vec::new(),
            len: 0,
        };
        layout.visit(tree, tree.root(), true);
        layout
    }

    pub fn span(&self, id: NodeId) -> Option<Range<usize>> {
        self.spans.get(id.index()).cloned().flatten()
    }

    fn push(&mut self, node: NodeId, kind: UnitKind, len: usize) {
        self.units.push(Unit {
            node,
            kind,
            start: self.len,
            len,
        });
        self.len += len;
    }

    fn visit(&mut self, tree: &Tree, id: NodeId, first_child: bool) {
        let start = self.len;
        match tree.kind(id) {
            Some(NodeKind::Text(s)) => self.push(id, UnitKind::Text, char_len(s)),
            Some(NodeKind::Mention(m)) => self.push(id, UnitKind::Mention, m.len()),
            Some(NodeKind::LineBreak) => self.push(id, UnitKind::LineBreak, 1),
            Some(NodeKind::Block) => {
                if !first_child {
                    self.push(id, UnitKind::BlockBoundary, 1);
                }
                self.visit_children(tree, id);
            }
            Some(NodeKind::Root | NodeKind::Decorator(_)) => self.visit_children(tree, id),
            None => return,
        }
        self.spans[id.index()] = Some(start..self.len);
    }

    fn visit_children(&mut self, tree: &Tree, id: NodeId) {
        for (i, &child) in tree.children(id).iter().enumerate() {
            self.visit(tree, child, i == 0);
        }
    }
}

/// Total content length in flat offsets.
pub fn content_len(tree: &Tree) -> usize {
    Layout::of(tree).len
}

/// Flat offset of the selection focus, or `None` when there is no selection
/// or its focus is not part of the tree.
pub fn get_offset(tree: &Tree, selection: Option<&Selection>) -> Option<usize> {
    offset_of(tree, selection?.focus)
}

/// Flat offset of a single tree position.
pub fn offset_of(tree: &Tree, position: Position) -> Option<usize> {
    offset_in(&Layout::of(tree), tree, position)
}

/// Flat range covered by a selection, ordered start to end.
pub fn selection_range(tree: &Tree, selection: &Selection) -> Option<Range<usize>> {
    let layout = Layout::of(tree);
    let a = offset_in(&layout, tree, selection.anchor)?;
    let b = offset_in(&layout, tree, selection.focus)?;
    Some(a.min(b)..a.max(b))
}

fn offset_in(layout: &Layout, tree: &Tree, position: Position) -> Option<usize> {
    let span = layout.span(position.node)?;
    let offset = match tree.kind(position.node)? {
        NodeKind::Text(s) => span.start + position.offset.min(char_len(s)),
        NodeKind::Mention(_) | NodeKind::LineBreak => {
            if position.offset == 0 {
                span.start
            } else {
                span.end
            }
        }
        NodeKind::Root | NodeKind::Block | NodeKind::Decorator(_) => {
            match tree.children(position.node).get(position.offset) {
                Some(&child) => layout.span(child)?.start,
                None => span.end,
            }
        }
    };
    Some(offset)
}

/// Places a caret at flat `offset`.
///
/// Text positions land inside the text node, preferring the end of an
/// earlier node on ties. Mentions and line breaks are never entered: the
/// caret goes before or after them. Offsets past the end land at the absolute
/// end of the content.
pub fn restore_offset(tree: &Tree, offset: usize) -> Position {
    let layout = Layout::of(tree);
    let mut remaining = offset;
    for unit in &layout.units {
        match unit.kind {
            UnitKind::Text => {
                if remaining <= unit.len {
                    return Position::new(unit.node, remaining);
                }
            }
            UnitKind::Mention | UnitKind::LineBreak => {
                if remaining == 0 {
                    return before(tree, unit.node);
                }
                if remaining <= unit.len {
                    return after(tree, unit.node);
                }
            }
            UnitKind::BlockBoundary => {
                if remaining == 0 {
                    return before(tree, unit.node);
                }
                if remaining == 1 && tree.children(unit.node).is_empty() {
                    return Position::new(unit.node, 0);
                }
            }
        }
        remaining -= unit.len;
    }
    let root = tree.root();
    Position::new(root, tree.children(root).len())
}

fn before(tree: &Tree, id: NodeId) -> Position {
    match (tree.parent(id), tree.index_in_parent(id)) {
        (Some(parent), Some(index)) => Position::new(parent, index),
        _ => Position::new(tree.root(), 0),
    }
}

fn after(tree: &Tree, id: NodeId) -> Position {
    let p = before(tree, id);
    Position::new(p.node, p.offset + 1)
}

/// The nearest valid caret stop strictly before `offset` (or 0).
///
/// Offsets inside a mention are never valid stops, so stepping back from
/// just after a mention lands just before it.
pub fn prev_boundary(tree: &Tree, offset: usize) -> usize {
    let layout = Layout::of(tree);
    let mut candidate = offset.min(layout.len).saturating_sub(1);
    for unit in mentions(&layout) {
        if unit.start < candidate && candidate < unit.end() {
            candidate = unit.start;
        }
    }
    candidate
}

/// The nearest valid caret stop strictly after `offset` (or the end).
pub fn next_boundary(tree: &Tree, offset: usize) -> usize {
    let layout = Layout::of(tree);
    let mut candidate = (offset + 1).min(layout.len);
    for unit in mentions(&layout) {
        if unit.start < candidate && candidate < unit.end() {
            candidate = unit.end();
        }
    }
    candidate
}

/// Widens `range` so it never cuts through a mention.
pub fn snap_range(tree: &Tree, range: Range<usize>) -> Range<usize> {
    let layout = Layout::of(tree);
    let mut start = range.start.min(layout.len);
    let mut end = range.end.min(layout.len).max(start);
    for unit in mentions(&layout) {
        if unit.start < start && start < unit.end() {
            start = unit.start;
        }
        if unit.start < end && end < unit.end() {
            end = unit.end();
        }
    }
    start..end
}

fn mentions(layout: &Layout) -> impl Iterator<Item = &Unit> {
    layout
        .units
        .iter()
        .filter(|u| u.kind == UnitKind::Mention)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DecoratorMark, Mention};
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn mention(label: &str) -> NodeKind {
        NodeKind::Mention(Mention {
            trigger: '@',
            label: label.to_string(),
            data: None,
            rendered: format!("@{label}"),
            serialized: None,
        })
    }

    /// "Hi " + @Alice + " and " [deco "#x"] + "\n" + block("two")
    fn mixed_tree() -> Tree {
        let mut tree = Tree::new();
        let root = tree.root();
        let first = tree.append(root, NodeKind::Block);
        tree.append(first, NodeKind::Text("Hi ".into()));
        tree.append(first, mention("Alice"));
        tree.append(first, NodeKind::Text(" and ".into()));
        let deco = tree.append(
            first,
            NodeKind::Decorator(DecoratorMark {
                rule: 0,
                class: "tag".into(),
                style: None,
            }),
        );
        tree.append(deco, NodeKind::Text("#x".into()));
        tree.append(first, NodeKind::LineBreak);
        let second = tree.append(root, NodeKind::Block);
        tree.append(second, NodeKind::Text("two".into()));
        tree.append(root, NodeKind::Block);
        tree
    }

    #[test]
    fn content_len_counts_mentions_breaks_and_blocks() {
        // 3 + 6 + 5 + 2 + 1 (br) + 1 (block) + 3 + 1 (empty block)
        assert_eq!(content_len(&mixed_tree()), 22);
    }

    #[test]
    fn offset_round_trips_for_every_caret_stop() {
        let tree = mixed_tree();
        let len = content_len(&tree);
        // 4..=8 sit inside @Alice and are not caret stops.
        for o in (0..=len).filter(|o| !(4..=8).contains(o)) {
            let pos = restore_offset(&tree, o);
            assert_eq!(offset_of(&tree, pos), Some(o), "offset {o} -> {pos:?}");
        }
    }

    #[test]
    fn caret_never_lands_inside_a_mention() {
        let tree = mixed_tree();
        for o in 4..9 {
            let pos = restore_offset(&tree, o);
            assert!(
                !matches!(tree.kind(pos.node), Some(NodeKind::Mention(_))),
                "offset {o} landed in a mention"
            );
        }
        // Anywhere within the mention's width lands right after it.
        let first = tree.children(tree.root())[0];
        assert_eq!(restore_offset(&tree, 5), Position::new(first, 2));
    }

    #[test]
    fn offset_past_end_lands_at_end() {
        let tree = mixed_tree();
        let root = tree.root();
        assert_eq!(restore_offset(&tree, 500), Position::new(root, 3));
    }

    #[test]
    fn missing_selection_yields_none() {
        let tree = mixed_tree();
        assert_eq!(get_offset(&tree, None), None);
    }

    #[test]
    fn detached_focus_yields_none() {
        let mut tree = Tree::from_text("hello");
        let text = tree.children(tree.root())[0];
        tree.detach(text);
        let selection = Selection::collapsed(Position::new(text, 2));
        assert_eq!(get_offset(&tree, Some(&selection)), None);
    }

    #[rstest]
    #[case(9, 3)]
    #[case(3, 2)]
    #[case(0, 0)]
    #[case(10, 9)]
    fn prev_boundary_skips_mention_interior(#[case] from: usize, #[case] expected: usize) {
        assert_eq!(prev_boundary(&mixed_tree(), from), expected);
    }

    #[rstest]
    #[case(3, 9)]
    #[case(2, 3)]
    #[case(9, 10)]
    #[case(22, 22)]
    fn next_boundary_skips_mention_interior(#[case] from: usize, #[case] expected: usize) {
        assert_eq!(next_boundary(&mixed_tree(), from), expected);
    }

    #[test]
    fn snap_range_widens_to_whole_mentions() {
        let tree = mixed_tree();
        assert_eq!(snap_range(&tree, 5..7), 3..9);
        assert_eq!(snap_range(&tree, 1..4), 1..9);
        assert_eq!(snap_range(&tree, 10..12), 10..12);
    }

    #[test]
    fn selection_range_orders_backwards_selections() {
        let tree = Tree::from_text("hello");
        let text = tree.children(tree.root())[0];
        let selection = Selection {
            anchor: Position::new(text, 4),
            focus: Position::new(text, 1),
        };
        assert_eq!(selection_range(&tree, &selection), Some(1..4));
        assert!(!selection.is_collapsed());
    }
}
