//! A host-facing view of the editor, flattened into styled lines.

use serde::Serialize;

use super::Editor;
use crate::model::{DecoratorMark, NodeId, NodeKind, Tree};

/// Everything a host needs to paint the editor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub lines: Vec<RenderLine>,
    pub caret: Option<CaretPoint>,
    /// Shown only while the content is empty.
    pub placeholder: Option<String>,
    pub menu: Option<MenuView>,
    pub focused: bool,
    pub read_only: bool,
    pub disabled: bool,
    pub version: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RenderLine {
    pub runs: Vec<RenderRun>,
}

impl RenderLine {
    pub fn text(&self) -> String {
        self.runs.iter().map(|r| r.text.as_str()).collect()
    }

    /// Width in flat offsets.
    pub fn width(&self) -> usize {
        self.runs.iter().map(|r| r.text.chars().count()).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderRun {
    pub text: String,
    pub kind: RunKind,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum RunKind {
    Plain,
    Mention {
        trigger: char,
    },
    Decorated {
        class: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        style: Option<String>,
    },
}

/// Caret as (line, column), column counted in flat offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CaretPoint {
    pub line: usize,
    pub column: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MenuView {
    pub trigger: char,
    pub query: String,
    pub items: Vec<MenuItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MenuItem {
    pub text: String,
    pub disabled: bool,
    pub highlighted: bool,
}

pub(crate) fn create_snapshot(editor: &Editor) -> Snapshot {
    let tree = editor.tree();
    let mut lines = vec![RenderLine::default()];
    collect(tree, tree.root(), None, &mut lines);

    let options = editor.options();
    let placeholder = if editor.is_empty() {
        options.placeholder.clone()
    } else {
        None
    };

    Snapshot {
        caret: editor.selection().map(|s| caret_point(&lines, s.focus)),
        lines,
        placeholder,
        menu: menu_view(editor),
        focused: editor.is_focused(),
        read_only: options.read_only,
        disabled: options.disabled,
        version: editor.version(),
    }
}

fn collect(tree: &Tree, id: NodeId, mark: Option<&DecoratorMark>, lines: &mut Vec<RenderLine>) {
    for (i, &child) in tree.children(id).iter().enumerate() {
        match tree.kind(child) {
            Some(NodeKind::Text(s)) if !s.is_empty() => {
                let kind = match mark {
                    Some(m) => RunKind::Decorated {
                        class: m.class.clone(),
                        style: m.style.clone(),
                    },
                    None => RunKind::Plain,
                };
                push_run(lines, s, kind);
            }
            Some(NodeKind::Mention(m)) => push_run(
                lines,
                &m.rendered,
                RunKind::Mention { trigger: m.trigger },
            ),
            Some(NodeKind::LineBreak) => lines.push(RenderLine::default()),
            Some(NodeKind::Block) => {
                if i > 0 {
                    lines.push(RenderLine::default());
                }
                collect(tree, child, mark, lines);
            }
            Some(NodeKind::Decorator(d)) => collect(tree, child, Some(d), lines),
            Some(NodeKind::Root) => collect(tree, child, mark, lines),
            Some(NodeKind::Text(_)) | None => {}
        }
    }
}

fn push_run(lines: &mut [RenderLine], text: &str, kind: RunKind) {
    let Some(line) = lines.last_mut() else {
        return;
    };
    if let Some(last) = line.runs.last_mut()
        && last.kind == kind
        && !matches!(kind, RunKind::Mention { .. })
    {
        last.text.push_str(text);
        return;
    }
    line.runs.push(RenderRun {
        text: text.to_string(),
        kind,
    });
}

fn caret_point(lines: &[RenderLine], offset: usize) -> CaretPoint {
    let mut remaining = offset;
    for (line, l) in lines.iter().enumerate() {
        let width = l.width();
        if remaining <= width {
            return CaretPoint {
                line,
                column: remaining,
            };
        }
        remaining -= width + 1;
    }
    let line = lines.len().saturating_sub(1);
    CaretPoint {
        line,
        column: lines.last().map(RenderLine::width).unwrap_or(0),
    }
}

fn menu_view(editor: &Editor) -> Option<MenuView> {
    let active = editor.menu().active()?;
    let def = editor.options().triggers.get(active.trigger_index)?;
    let filtered = editor.suggestions();
    if filtered.is_empty() {
        return None;
    }
    let highlighted = editor.menu().highlighted().min(filtered.len() - 1);
    Some(MenuView {
        trigger: active.trigger,
        query: active.query.clone(),
        items: filtered
            .iter()
            .enumerate()
            .map(|(i, s)| MenuItem {
                text: def.suggestion_text(s),
                disabled: s.disabled,
                highlighted: i == highlighted,
            })
            .collect(),
    })
}
