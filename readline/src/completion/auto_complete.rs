// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use crate::{InlineVec, Runes};
use smallvec::smallvec;
use std::sync::Arc;

/// The result of asking an [`AutoComplete`] provider for candidates.
///
/// Each candidate is the text that would be inserted at the cursor (a suffix of what the
/// user means, not the whole word). `offset` is how many runes before the cursor the
/// candidates share with the line, e.g. for the words `[go, git, git-shell, grep]`:
///
/// | line    | candidates                     | offset |
/// |---------|--------------------------------|--------|
/// | `"g"`   | `["o", "it", "it-shell", "rep"]` | 1      |
/// | `"gi"`  | `["t", "t-shell"]`               | 2      |
/// | `"git"` | `["", "-shell"]`                 | 3      |
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Completion {
    pub candidates: InlineVec<Runes>,
    pub comments: InlineVec<Runes>,
    pub offset: usize,
}

impl Completion {
    /// Pad (with empty comments) or truncate `comments` so that there is exactly one per
    /// candidate.
    pub fn normalize_comments(&mut self) {
        self.comments.resize(self.candidates.len(), Runes::new());
    }
}

/// A source of completion candidates. Gets the whole line and the cursor position.
pub trait AutoComplete: Send + Sync {
    fn complete(&self, line: &[char], pos: usize) -> Completion;
}

pub type SafeAutoComplete = Arc<dyn AutoComplete>;

/// Fallback provider: the completion key just inserts a literal tab.
#[derive(Debug, Clone, Copy, Default)]
pub struct TabCompleter;

impl AutoComplete for TabCompleter {
    fn complete(&self, _line: &[char], _pos: usize) -> Completion {
        Completion {
            candidates: smallvec![vec!['\t']],
            comments: smallvec![],
            offset: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::to_runes;

    #[test]
    fn test_tab_completer_inserts_tab() {
        let completion = TabCompleter.complete(&to_runes("anything"), 3);
        assert_eq!(completion.candidates.as_slice(), &[vec!['\t']]);
        assert_eq!(completion.offset, 0);
    }

    #[test]
    fn test_normalize_comments() {
        let mut completion = Completion {
            candidates: smallvec![to_runes("a"), to_runes("b")],
            comments: smallvec![],
            offset: 0,
        };
        completion.normalize_comments();
        assert_eq!(completion.comments.len(), 2);

        completion.comments = smallvec![to_runes("x"), to_runes("y"), to_runes("z")];
        completion.normalize_comments();
        assert_eq!(completion.comments.as_slice(), &[to_runes("x"), to_runes("y")]);
    }
}
