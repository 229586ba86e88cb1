//! Presentational decorators over the plain-text projection of the tree.
//!
//! [`apply`] and [`strip`] are pure: they return a new tree and leave the
//! input untouched. Decorators never change the logical content, so
//! `serialize(&strip(&apply(&t, rules)))` always equals `serialize(&t)`.

use std::{fmt, sync::Arc};

use regex::Regex;

use crate::{
    error::EngineError,
    model::{
        DecoratorMark, NodeId, NodeKind, Tree,
        tree::{byte_index, char_len},
    },
};

/// A character range `[start, end)` in the plain-text projection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct MatchRange {
    pub start: usize,
    pub end: usize,
}

impl MatchRange {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }
}

/// Custom matcher mapping plain text to character ranges.
pub type MatchFn = Arc<dyn Fn(&str) -> Vec<MatchRange> + Send + Sync>;

#[derive(Clone)]
pub enum Matcher {
    /// Every non-empty match of the pattern, scanned globally.
    Pattern(Regex),
    Function(MatchFn),
}

impl fmt::Debug for Matcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Matcher::Pattern(re) => f.debug_tuple("Pattern").field(&re.as_str()).finish(),
            Matcher::Function(_) => f.write_str("Function(..)"),
        }
    }
}

/// A match specification plus the class and style to wrap matches in.
#[derive(Debug, Clone)]
pub struct DecoratorRule {
    pub matcher: Matcher,
    pub class: String,
    pub style: Option<String>,
}

impl DecoratorRule {
    pub fn pattern(pattern: &str, class: impl Into<String>) -> Result<Self, EngineError> {
        let re = Regex::new(pattern).map_err(|source| EngineError::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        })?;
        Ok(Self {
            matcher: Matcher::Pattern(re),
            class: class.into(),
            style: None,
        })
    }

    pub fn function(
        f: impl Fn(&str) -> Vec<MatchRange> + Send + Sync + 'static,
        class: impl Into<String>,
    ) -> Self {
        Self {
            matcher: Matcher::Function(Arc::new(f)),
            class: class.into(),
            style: None,
        }
    }

    pub fn with_style(mut self, style: impl Into<String>) -> Self {
        self.style = Some(style.into());
        self
    }

    /// Non-empty match ranges of this rule in `text`, in characters.
    pub fn matches(&self, text: &str) -> Vec<MatchRange> {
        let len = char_len(text);
        match &self.matcher {
            Matcher::Pattern(re) => {
                let chars = CharIndex::new(text);
                re.find_iter(text)
                    .filter(|m| !m.is_empty())
                    .map(|m| MatchRange::new(chars.at(m.start()), chars.at(m.end())))
                    .collect()
            }
            Matcher::Function(f) => f(text)
                .into_iter()
                .map(|r| MatchRange::new(r.start.min(len), r.end.min(len)))
                .filter(|r| r.start < r.end)
                .collect(),
        }
    }
}

/// Maps byte offsets at char boundaries to char offsets.
struct CharIndex(Vec<usize>);

impl CharIndex {
    fn new(text: &str) -> Self {
        let mut map = vec![0; text.len() + 1];
        let mut count = 0;
        for (byte, c) in text.char_indices() {
            map[byte] = count;
            count += 1;
            map[byte + c.len_utf8()] = count;
        }
        Self(map)
    }

    fn at(&self, byte: usize) -> usize {
        self.0[byte]
    }
}

/// An accepted range tagged with the rule that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecoratedRange {
    pub start: usize,
    pub end: usize,
    pub rule: usize,
}

/// A text node's place in the plain-text projection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextRun {
    pub node: NodeId,
    pub start: usize,
    pub len: usize,
}

/// Concatenates all text outside mentions, recording where each text node
/// starts in the result. Line breaks and block boundaries contribute nothing.
pub fn plain_text_runs(tree: &Tree) -> (String, Vec<TextRun>) {
    fn walk(tree: &Tree, id: NodeId, text: &mut String, runs: &mut Vec<TextRun>, pos: &mut usize) {
        for &child in tree.children(id) {
            match tree.kind(child) {
                Some(NodeKind::Text(s)) => {
                    let len = char_len(s);
                    runs.push(TextRun {
                        node: child,
                        start: *pos,
                        len,
                    });
                    text.push_str(s);
                    *pos += len;
                }
                Some(k) if k.is_container() => walk(tree, child, text, runs, pos),
                _ => {}
            }
        }
    }

    let mut text = String::new();
    let mut runs = Vec::new();
    let mut pos = 0;
    walk(tree, tree.root(), &mut text, &mut runs, &mut pos);
    (text, runs)
}

/// Resolves all rules' matches into non-overlapping ranges.
///
/// Candidates are sorted by `(start, rule)` and accepted greedily: a range
/// is kept only if it starts at or after the end of the last kept range, so
/// earlier-starting ranges win and declaration order breaks ties.
pub fn compute_ranges(text: &str, rules: &[DecoratorRule]) -> Vec<DecoratedRange> {
    let mut candidates: Vec<DecoratedRange> = rules
        .iter()
        .enumerate()
        .flat_map(|(rule, r)| {
            r.matches(text).into_iter().map(move |m| DecoratedRange {
                start: m.start,
                end: m.end,
                rule,
            })
        })
        .collect();
    candidates.sort_by_key(|c| (c.start, c.rule));

    let mut accepted: Vec<DecoratedRange> = Vec::new();
    for candidate in candidates {
        if accepted.last().is_none_or(|last| candidate.start >= last.end) {
            accepted.push(candidate);
        }
    }
    accepted
}

/// Removes every decorator wrapper, merges adjacent text and drops empty
/// text nodes. Idempotent.
pub fn strip(tree: &Tree) -> Tree {
    let mut out = Tree::new();
    let root = out.root();
    copy_children(tree, tree.root(), &mut out, root);
    out
}

fn copy_children(src: &Tree, from: NodeId, dst: &mut Tree, into: NodeId) {
    for &child in src.children(from) {
        let Some(kind) = src.kind(child) else {
            continue;
        };
        match kind {
            NodeKind::Decorator(_) => copy_children(src, child, dst, into),
            NodeKind::Text(s) => {
                if s.is_empty() {
                    continue;
                }
                let last = dst.children(into).last().copied();
                match last.and_then(|id| dst.text_mut(id)) {
                    Some(existing) => existing.push_str(s),
                    None => {
                        dst.append(into, kind.clone());
                    }
                }
            }
            _ => {
                let id = dst.append(into, kind.clone());
                if kind.is_container() {
                    copy_children(src, child, dst, id);
                }
            }
        }
    }
}

/// Strips `tree` and wraps every accepted range in a decorator node.
///
/// Ranges are applied from the highest offset down so that splitting a text
/// node never moves the offsets of ranges still to be applied. A range that
/// spans several text nodes wraps each covered piece separately.
pub fn apply(tree: &Tree, rules: &[DecoratorRule]) -> Tree {
    let mut out = strip(tree);
    if rules.is_empty() {
        return out;
    }
    let (text, runs) = plain_text_runs(&out);
    let ranges = compute_ranges(&text, rules);
    log::trace!("applying {} decorator ranges", ranges.len());

    for range in ranges.iter().rev() {
        let rule = &rules[range.rule];
        let mark = DecoratorMark {
            rule: range.rule,
            class: rule.class.clone(),
            style: rule.style.clone(),
        };
        for run in runs.iter().rev() {
            let run_end = run.start + run.len;
            if run.start >= range.end || run_end <= range.start {
                continue;
            }
            let from = range.start.max(run.start) - run.start;
            let to = range.end.min(run_end) - run.start;
            wrap_slice(&mut out, run.node, from, to, &mark);
        }
    }
    out
}

/// Splits text node `node` at `from` and `to` and wraps the middle slice.
fn wrap_slice(tree: &mut Tree, node: NodeId, from: usize, to: usize, mark: &DecoratorMark) {
    let (Some(parent), Some(index)) = (tree.parent(node), tree.index_in_parent(node)) else {
        return;
    };
    let Some(text) = tree.text_mut(node) else {
        return;
    };
    let a = byte_index(text, from);
    let b = byte_index(text, to);
    let right = text[b..].to_string();
    let middle = text[a..b].to_string();
    text.truncate(a);
    let left_empty = text.is_empty();

    let wrapper = tree.insert(parent, index + 1, NodeKind::Decorator(mark.clone()));
    tree.append(wrapper, NodeKind::Text(middle));
    if !right.is_empty() {
        tree.insert(parent, index + 2, NodeKind::Text(right));
    }
    if left_empty {
        tree.detach(node);
    }
}
