// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Hierarchical command completion.
//!
//! A [`PrefixCompleter`] is a tree of words. Each level of the tree completes one token
//! of the line, and once a token is fully typed the matcher descends into that node's
//! children for the next token:
//!
//! ```text
//! mode
//! ├── vi
//! ├── emacs
//! login
//! say
//! ├── <dynamic: file names>
//! ```
//!
//! | line           | candidates         | offset |
//! |----------------|--------------------|--------|
//! | `"mo"`         | `["de "]`            | 2      |
//! | `"mode "`      | `["vi ", "emacs "]`  | 0      |
//! | `"mode e"`     | `["macs "]`          | 1      |
//!
//! Names get a trailing space so that accepting a candidate also types the separator
//! for the next token. Nodes are immutable once the tree is built, and a single tree
//! can be shared by many engines.

use crate::{AutoComplete, Completion, Runes, has_prefix, to_runes, trim_space_left};
use std::{fmt::{Debug, Formatter},
          sync::Arc};

/// Produces `(names, comments)` for a dynamic node. Gets the whole line, not just the
/// current token.
pub type DynamicCompleteFn = Arc<dyn Fn(&str) -> (Vec<String>, Vec<String>) + Send + Sync>;

#[derive(Clone)]
pub enum NodeName {
    Static { name: Runes, comment: Runes },
    Dynamic(DynamicCompleteFn),
}

impl Debug for NodeName {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            NodeName::Static { name, comment } => f
                .debug_struct("Static")
                .field("name", &name.iter().collect::<String>())
                .field("comment", &comment.iter().collect::<String>())
                .finish(),
            NodeName::Dynamic(_) => f.write_str("Dynamic(..)"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PrefixCompleter {
    pub node_name: NodeName,
    children: Vec<PrefixCompleter>,
}

/// A static node. A space is appended to `name`.
#[must_use]
pub fn pc_item(name: &str, comment: &str, children: Vec<PrefixCompleter>) -> PrefixCompleter {
    PrefixCompleter {
        node_name: NodeName::Static {
            name: to_runes(&format!("{name} ")),
            comment: to_runes(comment),
        },
        children,
    }
}

/// A node whose names are computed from the line every time completion runs.
pub fn pc_item_dynamic(
    callback: impl Fn(&str) -> (Vec<String>, Vec<String>) + Send + Sync + 'static,
    children: Vec<PrefixCompleter>,
) -> PrefixCompleter {
    PrefixCompleter {
        node_name: NodeName::Dynamic(Arc::new(callback)),
        children,
    }
}

impl PrefixCompleter {
    /// The root of a tree. It has no name of its own.
    #[must_use]
    pub fn new(children: Vec<PrefixCompleter>) -> Self { pc_item("", "", children) }

    #[must_use]
    pub fn children(&self) -> &[PrefixCompleter] { &self.children }

    pub fn set_children(&mut self, children: Vec<PrefixCompleter>) { self.children = children; }

    #[must_use]
    pub fn is_dynamic(&self) -> bool { matches!(self.node_name, NodeName::Dynamic(_)) }

    /// Static name (with its trailing space). Empty for dynamic nodes.
    #[must_use]
    pub fn name(&self) -> Runes {
        match &self.node_name {
            NodeName::Static { name, .. } => name.clone(),
            NodeName::Dynamic(_) => Runes::new(),
        }
    }

    #[must_use]
    pub fn comment(&self) -> Runes {
        match &self.node_name {
            NodeName::Static { comment, .. } => comment.clone(),
            NodeName::Dynamic(_) => Runes::new(),
        }
    }

    /// Names (each with a trailing space) and comments this node matches against.
    /// The two lists may differ in length for dynamic nodes.
    #[must_use]
    pub fn resolve_names(&self, orig_line: &[char]) -> (Vec<Runes>, Vec<Runes>) {
        match &self.node_name {
            NodeName::Static { name, comment } => (vec![name.clone()], vec![comment.clone()]),
            NodeName::Dynamic(callback) => {
                let (names, comments) = callback(&orig_line.iter().collect::<String>());
                (
                    names
                        .iter()
                        .map(|name| to_runes(&format!("{name} ")))
                        .collect(),
                    comments.iter().map(|it| to_runes(it)).collect(),
                )
            }
        }
    }

    /// The tree as an indented listing, one named node per line.
    #[must_use]
    pub fn tree(&self, prefix: &str) -> String {
        let mut acc = String::new();
        self.print(prefix, 0, &mut acc);
        acc
    }

    /// Nodes without a name (the root, dynamic nodes) are not printed, and their
    /// children are printed at the same level.
    pub fn print(&self, prefix: &str, level: usize, acc: &mut String) {
        let name = self.name().iter().collect::<String>();
        let mut level = level;
        if !name.trim().is_empty() {
            acc.push_str(prefix);
            if level > 0 {
                acc.push('├');
                acc.push_str(&"─".repeat(level * 4 - 2));
                acc.push(' ');
            }
            acc.push_str(&name);
            acc.push('\n');
            level += 1;
        }
        for child in &self.children {
            child.print(prefix, level, acc);
        }
    }
}

impl AutoComplete for PrefixCompleter {
    fn complete(&self, line: &[char], pos: usize) -> Completion {
        complete_at_node(self, line, pos, line)
    }
}

/// Match the children of `node` against the token at the start of `line[..pos]`, and
/// descend into the matching child while the match is unambiguous.
fn complete_at_node(
    node: &PrefixCompleter,
    line: &[char],
    pos: usize,
    orig_line: &[char],
) -> Completion {
    let line = trim_space_left(&line[..pos.min(line.len())]);
    let mut completion = Completion::default();
    let mut descend_into: Option<&PrefixCompleter> = None;
    let mut is_full_match = false;

    for child in &node.children {
        let (names, comments) = child.resolve_names(orig_line);
        for (index, name) in names.iter().enumerate() {
            if line.len() >= name.len() {
                if has_prefix(line, name) {
                    if line.len() == name.len() {
                        completion.candidates.push(vec![' ']);
                    } else {
                        completion.candidates.push(name.clone());
                    }
                    completion.comments.push(Runes::new());
                    completion.offset = name.len();
                    descend_into = Some(child);
                    is_full_match = true;
                }
            } else if has_prefix(name, line) {
                completion.candidates.push(name[line.len()..].to_vec());
                completion
                    .comments
                    .push(comments.get(index).cloned().unwrap_or_default());
                completion.offset = line.len();
                descend_into = Some(child);
            }
        }
    }

    if completion.candidates.len() != 1 {
        return completion;
    }
    let Some(descend_into) = descend_into else {
        return completion;
    };

    let leftover = line
        .get(completion.offset..)
        .and_then(|rest| rest.iter().position(|it| *it != ' ').map(|start| &rest[start..]));
    if let Some(leftover) = leftover {
        return complete_at_node(descend_into, leftover, leftover.len(), orig_line);
    }

    if is_full_match {
        return complete_at_node(descend_into, &[], 0, orig_line);
    }

    completion
}
