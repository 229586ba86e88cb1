use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{NodeId, NodeKind, Tree};

/// One unit of serialized editor content.
///
/// Segments are a derived, read-only projection of the [`Tree`]; they are
/// produced fresh by [`serialize`] on every pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Segment {
    Text {
        value: String,
    },
    Mention {
        value: String,
        trigger: char,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        data: Option<Value>,
    },
}

impl Segment {
    pub fn text(value: impl Into<String>) -> Self {
        Segment::Text {
            value: value.into(),
        }
    }

    pub fn newline() -> Self {
        Self::text("\n")
    }

    pub fn value(&self) -> &str {
        match self {
            Segment::Text { value } | Segment::Mention { value, .. } => value,
        }
    }

    pub fn is_mention(&self) -> bool {
        matches!(self, Segment::Mention { .. })
    }
}

/// Serializes the tree into segments in document order.
///
/// Text leaves become text segments, adjacent ones merged. Line breaks and
/// every block that is not the first child of its parent emit a standalone
/// `"\n"` segment. Mentions emit exactly one mention segment and are never
/// descended into. Decorator wrappers are transparent.
pub fn serialize(tree: &Tree) -> Vec<Segment> {
    let mut out = Vec::new();
    walk(tree, tree.root(), &mut out);
    out
}

/// Concatenates segment values into the plain text of the content.
pub fn plain_text(segments: &[Segment]) -> String {
    segments.iter().map(Segment::value).collect()
}

fn walk(tree: &Tree, id: NodeId, out: &mut Vec<Segment>) {
    for (index, &child) in tree.children(id).iter().enumerate() {
        let Some(kind) = tree.kind(child) else {
            continue;
        };
        match kind {
            NodeKind::Text(s) => push_text(out, s),
            NodeKind::LineBreak => out.push(Segment::newline()),
            NodeKind::Mention(m) => out.push(Segment::Mention {
                value: m.value().to_string(),
                trigger: m.trigger,
                data: m.data.clone(),
            }),
            NodeKind::Block => {
                if index > 0 {
                    out.push(Segment::newline());
                }
                walk(tree, child, out);
            }
            NodeKind::Root | NodeKind::Decorator(_) => walk(tree, child, out),
        }
    }
}

fn push_text(out: &mut Vec<Segment>, s: &str) {
    if s.is_empty() {
        return;
    }
    if let Some(Segment::Text { value }) = out.last_mut()
        && value != "\n"
    {
        value.push_str(s);
        return;
    }
    out.push(Segment::text(s));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DecoratorMark, Mention};
    use pretty_assertions::assert_eq;

    fn mention(label: &str, serialized: Option<&str>) -> NodeKind {
        NodeKind::Mention(Mention {
            trigger: '@',
            label: label.to_string(),
            data: Some(serde_json::json!({ "id": 7 })),
            rendered: format!("@{label}"),
            serialized: serialized.map(str::to_string),
        })
    }

    #[test]
    fn text_only_round_trips() {
        let input = "first line\nsecond\n\nfourth";
        let segments = serialize(&Tree::from_text(input));
        assert_eq!(plain_text(&segments), input);
    }

    #[test]
    fn newlines_are_standalone_segments() {
        let segments = serialize(&Tree::from_text("a\nb"));
        assert_eq!(
            segments,
            vec![Segment::text("a"), Segment::newline(), Segment::text("b")]
        );
    }

    #[test]
    fn mention_is_one_segment_using_custom_value() {
        let mut tree = Tree::new();
        let root = tree.root();
        tree.append(root, NodeKind::Text("Hi ".into()));
        tree.append(root, mention("Alice", Some("alice@co")));
        tree.append(root, NodeKind::Text(" ".into()));

        let segments = serialize(&tree);
        assert_eq!(
            segments,
            vec![
                Segment::text("Hi "),
                Segment::Mention {
                    value: "alice@co".into(),
                    trigger: '@',
                    data: Some(serde_json::json!({ "id": 7 })),
                },
                Segment::text(" "),
            ]
        );
        assert_eq!(plain_text(&segments), "Hi alice@co ");
    }

    #[test]
    fn decorators_are_transparent() {
        let mut tree = Tree::new();
        let root = tree.root();
        tree.append(root, NodeKind::Text("see ".into()));
        let deco = tree.append(
            root,
            NodeKind::Decorator(DecoratorMark {
                rule: 0,
                class: "tag".into(),
                style: None,
            }),
        );
        tree.append(deco, NodeKind::Text("#rust".into()));
        tree.append(root, NodeKind::Text(" now".into()));

        assert_eq!(serialize(&tree), vec![Segment::text("see #rust now")]);
    }

    #[test]
    fn blocks_after_the_first_start_new_lines() {
        let mut tree = Tree::new();
        let root = tree.root();
        for line in ["one", "two", "three"] {
            let block = tree.append(root, NodeKind::Block);
            tree.append(block, NodeKind::Text(line.into()));
        }
        assert_eq!(plain_text(&serialize(&tree)), "one\ntwo\nthree");
    }

    #[test]
    fn empty_tree_serializes_to_nothing() {
        assert!(serialize(&Tree::new()).is_empty());
    }

    #[test]
    fn segments_serialize_with_type_tag() {
        let segments = vec![
            Segment::text("Hi "),
            Segment::Mention {
                value: "@Alice".into(),
                trigger: '@',
                data: None,
            },
        ];
        let json = serde_json::to_value(&segments).unwrap();
        assert_eq!(
            json,
            serde_json::json!([
                { "type": "text", "value": "Hi " },
                { "type": "mention", "value": "@Alice", "trigger": "@" },
            ])
        );
    }
}
