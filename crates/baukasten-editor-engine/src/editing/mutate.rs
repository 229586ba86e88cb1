//! In-place tree mutations addressed by flat offsets.
//!
//! These run on a stripped tree inside the editor's mutation pipeline. They
//! may leave adjacent or empty text nodes behind; the pipeline normalizes
//! with [`strip`](super::decorators::strip) afterwards.

use std::ops::Range;

use super::offsets::{Layout, Position, UnitKind, restore_offset};
use crate::model::{
    NodeId, NodeKind, Tree,
    tree::{byte_index, char_len, inline_kinds},
};

/// Deletes everything overlapping `range`.
///
/// Mentions and line breaks touched by the range are removed whole. A block
/// boundary inside the range merges the block into the content before it.
pub fn delete_range(tree: &mut Tree, range: Range<usize>) {
    if range.is_empty() {
        return;
    }
    let layout = Layout::of(tree);
    for unit in layout.units.iter().rev() {
        if unit.len == 0 || unit.start >= range.end || unit.end() <= range.start {
            continue;
        }
        match unit.kind {
            UnitKind::Text => {
                let from = range.start.max(unit.start) - unit.start;
                let to = range.end.min(unit.end()) - unit.start;
                if let Some(text) = tree.text_mut(unit.node) {
                    let a = byte_index(text, from);
                    let b = byte_index(text, to);
                    text.replace_range(a..b, "");
                }
            }
            UnitKind::Mention | UnitKind::LineBreak => tree.detach(unit.node),
            UnitKind::BlockBoundary => merge_into_previous(tree, unit.node),
        }
    }
}

/// Moves the children of `block` into its previous sibling (if that is a
/// block) or into its parent in place of `block`, then removes `block`.
fn merge_into_previous(tree: &mut Tree, block: NodeId) {
    let (Some(parent), Some(index)) = (tree.parent(block), tree.index_in_parent(block)) else {
        return;
    };
    let children = tree.children(block).to_vec();
    let previous = index
        .checked_sub(1)
        .map(|i| tree.children(parent)[i])
        .filter(|&p| matches!(tree.kind(p), Some(NodeKind::Block)));

    match previous {
        Some(target) => {
            for child in children {
                let end = tree.children(target).len();
                tree.reattach(child, target, end);
            }
        }
        None => {
            for (i, child) in children.into_iter().enumerate() {
                tree.reattach(child, parent, index + 1 + i);
            }
        }
    }
    tree.detach(block);
}

/// Inserts `kinds` at flat `offset`, splitting a text node if the offset
/// falls inside one.
pub fn insert_nodes(tree: &mut Tree, offset: usize, kinds: Vec<NodeKind>) {
    if kinds.is_empty() {
        return;
    }
    let position = restore_offset(tree, offset);
    let (parent, index) = split_at(tree, position);
    for (i, kind) in kinds.into_iter().enumerate() {
        tree.insert(parent, index + i, kind);
    }
}

/// Inserts text, turning each `\n` into a line break. Returns the caret
/// offset just after the inserted text.
pub fn insert_text(tree: &mut Tree, offset: usize, text: &str) -> usize {
    insert_nodes(tree, offset, inline_kinds(text));
    offset + char_len(text)
}

/// Resolves a position to a `(container, child index)` insertion point,
/// splitting a text node in two when the position is inside it.
fn split_at(tree: &mut Tree, position: Position) -> (NodeId, usize) {
    let is_text = matches!(tree.kind(position.node), Some(NodeKind::Text(_)));
    let is_container = tree
        .kind(position.node)
        .is_some_and(NodeKind::is_container);

    if is_container {
        return (position.node, position.offset);
    }
    let (Some(parent), Some(index)) = (
        tree.parent(position.node),
        tree.index_in_parent(position.node),
    ) else {
        return (tree.root(), 0);
    };
    if !is_text {
        // Atomic leaf: insert before or after it, never inside.
        return (parent, index + usize::from(position.offset > 0));
    }
    if let Some(text) = tree.text_mut(position.node) {
        let at = byte_index(text, position.offset);
        let right = text.split_off(at);
        if !right.is_empty() {
            tree.insert(parent, index + 1, NodeKind::Text(right));
        }
    }
    (parent, index + 1)
}
