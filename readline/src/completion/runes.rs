// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Helpers for [`Runes`]. Widths are terminal display columns (a CJK rune is 2 wide, a
//! combining mark is 0 wide), and lengths are rune counts.

use crate::Runes;
use unicode_width::UnicodeWidthChar;

#[must_use]
pub fn to_runes(text: &str) -> Runes { text.chars().collect() }

#[must_use]
pub fn rune_width(ch: char) -> usize { UnicodeWidthChar::width(ch).unwrap_or(0) }

#[must_use]
pub fn runes_width(runes: &[char]) -> usize { runes.iter().copied().map(rune_width).sum() }

#[must_use]
pub fn has_prefix(runes: &[char], prefix: &[char]) -> bool { runes.starts_with(prefix) }

#[must_use]
pub fn equal(lhs: &[char], rhs: &[char]) -> bool { lhs == rhs }

#[must_use]
pub fn trim_space_left(runes: &[char]) -> &[char] {
    let first_non_space = runes
        .iter()
        .position(|it| !it.is_whitespace())
        .unwrap_or(runes.len());
    &runes[first_non_space..]
}

/// Longest common prefix of all `candidates`. Empty if there are none.
#[must_use]
pub fn aggregate(candidates: &[Runes]) -> Runes {
    let Some((first, rest)) = candidates.split_first() else {
        return Runes::new();
    };
    let len = rest.iter().fold(first.len(), |len, other| {
        first
            .iter()
            .zip(other.iter())
            .take(len)
            .take_while(|(lhs, rhs)| lhs == rhs)
            .count()
    });
    first[..len].to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_width_counts_columns_not_runes() {
        assert_eq!(runes_width(&to_runes("git")), 3);
        assert_eq!(runes_width(&to_runes("中文")), 4);
        assert_eq!(runes_width(&to_runes("e\u{301}")), 1);
    }

    #[test]
    fn test_trim_space_left() {
        assert_eq!(trim_space_left(&to_runes("  \tshow ")), to_runes("show ").as_slice());
        assert!(trim_space_left(&to_runes("   ")).is_empty());
    }

    #[test]
    fn test_aggregate() {
        let candidates = vec![to_runes("t"), to_runes("t-shell")];
        assert_eq!(aggregate(&candidates), to_runes("t"));

        let candidates = vec![to_runes("o"), to_runes("it"), to_runes("rep")];
        assert!(aggregate(&candidates).is_empty());

        let candidates = vec![to_runes("status"), to_runes("stash"), to_runes("stat")];
        assert_eq!(aggregate(&candidates), to_runes("sta"));

        assert!(aggregate(&[]).is_empty());
        assert_eq!(aggregate(&[to_runes("only")]), to_runes("only"));
    }

    #[test]
    fn test_has_prefix_and_equal() {
        assert!(has_prefix(&to_runes("git-shell"), &to_runes("git")));
        assert!(!has_prefix(&to_runes("gi"), &to_runes("git")));
        assert!(equal(&to_runes("a"), &to_runes("a")));
    }
}
