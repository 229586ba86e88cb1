use super::node::NodeKind;

/// Stable handle to a node inside one [`Tree`].
///
/// Ids are arena indices. They are never reused within a tree, but a tree
/// rebuilt by [`strip`](crate::editing::decorators::strip) or
/// [`apply`](crate::editing::decorators::apply) hands out fresh ids, so callers
/// carry caret positions across rebuilds as flat offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Node {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// Arena of content nodes rooted at a single [`NodeKind::Root`].
///
/// Detached nodes stay in the arena but are unreachable from the root; every
/// traversal starts at the root, so they are invisible to the algorithms.
#[derive(Debug, Clone, PartialEq)]
pub struct Tree {
    nodes: Vec<Node>,
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}

impl Tree {
    /// Creates an empty tree containing only the root.
    pub fn new() -> Self {
        Self {
            nodes: vec![Node {
                kind: NodeKind::Root,
                parent: None,
                children: Vec::new(),
            }],
        }
    }

    /// Builds a tree from a plain string. Each `\n` becomes a line break node.
    pub fn from_text(text: &str) -> Self {
        let mut tree = Self::new();
        let root = tree.root();
        for kind in inline_kinds(text) {
            tree.append(root, kind);
        }
        tree
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn kind(&self, id: NodeId) -> Option<&NodeKind> {
        self.nodes.get(id.0).map(|n| &n.kind)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id.0).and_then(|n| n.parent)
    }

    /// Children of `id` in document order. Empty for leaves and unknown ids.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes
            .get(id.0)
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
    }

    /// Position of `id` within its parent's child list.
    pub fn index_in_parent(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.children(parent).iter().position(|&c| c == id)
    }

    /// True if `id` is reachable from the root.
    pub fn contains(&self, id: NodeId) -> bool {
        if id.0 >= self.nodes.len() {
            return false;
        }
        let mut current = id;
        while let Some(parent) = self.parent(current) {
            if !self.children(parent).contains(&current) {
                return false;
            }
            current = parent;
        }
        current == self.root()
    }

    /// Appends a new node as the last child of `parent`.
    pub fn append(&mut self, parent: NodeId, kind: NodeKind) -> NodeId {
        let index = self.children(parent).len();
        self.insert(parent, index, kind)
    }

    /// Inserts a new node at `index` in `parent`'s children (clamped to the end).
    pub fn insert(&mut self, parent: NodeId, index: usize, kind: NodeKind) -> NodeId {
        debug_assert!(
            self.kind(parent).is_some_and(NodeKind::is_container),
            "only containers take children"
        );
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            kind,
            parent: Some(parent),
            children: Vec::new(),
        });
        let children = &mut self.nodes[parent.0].children;
        let index = index.min(children.len());
        children.insert(index, id);
        id
    }

    /// Moves an existing node under `parent` at `index`.
    pub(crate) fn reattach(&mut self, id: NodeId, parent: NodeId, index: usize) {
        self.detach(id);
        self.nodes[id.0].parent = Some(parent);
        let children = &mut self.nodes[parent.0].children;
        let index = index.min(children.len());
        children.insert(index, id);
    }

    /// Unlinks `id` from its parent. The subtree stays in the arena.
    pub fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.parent(id) {
            self.nodes[parent.0].children.retain(|&c| c != id);
            self.nodes[id.0].parent = None;
        }
    }

    pub(crate) fn text_mut(&mut self, id: NodeId) -> Option<&mut String> {
        match self.nodes.get_mut(id.0).map(|n| &mut n.kind) {
            Some(NodeKind::Text(s)) => Some(s),
            _ => None,
        }
    }

    /// Total number of arena slots, reachable or not.
    pub(crate) fn capacity(&self) -> usize {
        self.nodes.len()
    }
}

/// Splits a string into text and line break node kinds.
pub(crate) fn inline_kinds(text: &str) -> Vec<NodeKind> {
    let mut out = Vec::new();
    for (i, line) in text.split('\n').enumerate() {
        if i > 0 {
            out.push(NodeKind::LineBreak);
        }
        if !line.is_empty() {
            out.push(NodeKind::Text(line.to_string()));
        }
    }
    out
}

/// Number of characters (caret units) in `s`.
pub(crate) fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Byte index of the `n`th character, or `s.len()` if `n` is past the end.
pub(crate) fn byte_index(s: &str, n: usize) -> usize {
    s.char_indices().nth(n).map(|(i, _)| i).unwrap_or(s.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn new_tree_has_only_root() {
        let tree = Tree::new();
        assert_eq!(tree.kind(tree.root()), Some(&NodeKind::Root));
        assert!(tree.children(tree.root()).is_empty());
    }

    #[test]
    fn from_text_splits_line_breaks() {
        let tree = Tree::from_text("one\n\ntwo");
        let kinds: Vec<_> = tree
            .children(tree.root())
            .iter()
            .map(|&id| tree.kind(id).cloned())
            .collect();
        assert_eq!(
            kinds,
            vec![
                Some(NodeKind::Text("one".into())),
                Some(NodeKind::LineBreak),
                Some(NodeKind::LineBreak),
                Some(NodeKind::Text("two".into())),
            ]
        );
    }

    #[test]
    fn detached_nodes_are_not_contained() {
        let mut tree = Tree::new();
        let root = tree.root();
        let block = tree.append(root, NodeKind::Block);
        let text = tree.append(block, NodeKind::Text("hi".into()));
        assert!(tree.contains(text));

        tree.detach(block);
        assert!(!tree.contains(text));
        assert!(!tree.contains(block));
        assert_eq!(tree.kind(text), Some(&NodeKind::Text("hi".into())));
    }

    #[test]
    fn insert_clamps_index() {
        let mut tree = Tree::new();
        let root = tree.root();
        let a = tree.append(root, NodeKind::Text("a".into()));
        let b = tree.insert(root, 99, NodeKind::Text("b".into()));
        assert_eq!(tree.children(root), &[a, b]);
        assert_eq!(tree.index_in_parent(b), Some(1));
    }

    #[test]
    fn byte_index_handles_multibyte() {
        let s = "h€llo";
        assert_eq!(byte_index(s, 0), 0);
        assert_eq!(byte_index(s, 2), 4);
        assert_eq!(byte_index(s, 10), s.len());
        assert_eq!(char_len(s), 5);
    }
}
