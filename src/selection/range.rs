//! Playlist index selection ("1-10, 15, all")

use crate::utils::error::TubeQueueError;
use std::collections::BTreeSet;

/// Parse a selection into 1-based indices within `[1, total]`.
///
/// Tokens are comma separated: a number, an inclusive `start-end` range in
/// either order, or `all`. Tokens that are not numbers, and ranges with an end
/// outside the playlist, are dropped without error.
pub fn parse_selection(text: &str, total: usize) -> BTreeSet<usize> {
    let mut selected = BTreeSet::new();
    let in_bounds = |n: usize| (1..=total).contains(&n);

    for token in text.split(',').map(str::trim) {
        if token.eq_ignore_ascii_case("all") {
            return (1..=total).collect();
        }

        if let Some((start, end)) = token.split_once('-') {
            let (Ok(start), Ok(end)) = (start.trim().parse::<usize>(), end.trim().parse::<usize>())
            else {
                continue;
            };
            if in_bounds(start) && in_bounds(end) {
                selected.extend(start.min(end)..=start.max(end));
            }
        } else if let Ok(index) = token.parse::<usize>() {
            if in_bounds(index) {
                selected.insert(index);
            }
        }
    }

    selected
}

/// [`parse_selection`], rejecting a selection that names nothing
pub fn require_selection(text: &str, total: usize) -> Result<BTreeSet<usize>, TubeQueueError> {
    if text.trim().is_empty() {
        return Err(TubeQueueError::Input("Please enter video selection".to_string()));
    }
    let selected = parse_selection(text, total);
    if selected.is_empty() {
        return Err(TubeQueueError::Input("No valid videos selected".to_string()));
    }
    Ok(selected)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(values: &[usize]) -> BTreeSet<usize> {
        values.iter().copied().collect()
    }

    #[test]
    fn test_mixed_tokens_with_reversed_range() {
        assert_eq!(parse_selection("1-3,5,10-8", 10), set(&[1, 2, 3, 5, 8, 9, 10]));
    }

    #[test]
    fn test_all_is_case_insensitive() {
        assert_eq!(parse_selection("all", 5), set(&[1, 2, 3, 4, 5]));
        assert_eq!(parse_selection("ALL", 3), set(&[1, 2, 3]));
        assert_eq!(parse_selection("2, All", 3), set(&[1, 2, 3]));
    }

    #[test]
    fn test_empty_input() {
        assert!(parse_selection("", 5).is_empty());
    }

    #[test]
    fn test_duplicates_collapse() {
        assert_eq!(parse_selection("2, 2, 1-3, 3-2", 5), set(&[1, 2, 3]));
    }

    #[test]
    fn test_out_of_range_and_garbage_dropped() {
        assert_eq!(parse_selection("0, 6, 4-9, abc, 2", 5), set(&[2]));
        assert_eq!(parse_selection("1-2-3, -4, 3-", 5), BTreeSet::new());
    }

    #[test]
    fn test_whitespace_tolerated() {
        assert_eq!(parse_selection(" 1 - 2 ,  4 ", 5), set(&[1, 2, 4]));
    }

    #[test]
    fn test_empty_playlist() {
        assert!(parse_selection("all", 0).is_empty());
        assert!(parse_selection("1", 0).is_empty());
    }

    #[test]
    fn test_require_selection_rejects_empty() {
        assert!(matches!(require_selection("", 5), Err(TubeQueueError::Input(_))));
        assert!(matches!(require_selection("9", 5), Err(TubeQueueError::Input(_))));
        assert_eq!(require_selection("1,3", 5).unwrap(), set(&[1, 3]));
    }
}
