//! Bounded edit distance.
//!
//! Classic Levenshtein: single-character insert, delete, and substitute,
//! each costing 1. No transpositions. Works on `char`s so multi-byte
//! letters count once.
//!
//! The cost is `O(len(a) · len(b))`; callers scanning a catalog must drop
//! candidates outside [`within_length_window`] before calling [`distance`].

/// Levenshtein distance between `a` and `b`.
pub fn distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    // Two rolling rows over the shorter string.
    let (long, short) = if a.len() >= b.len() { (&a, &b) } else { (&b, &a) };
    let mut prev: Vec<usize> = (0..=short.len()).collect();
    let mut curr = vec![0usize; short.len() + 1];

    for (i, lc) in long.iter().enumerate() {
        curr[0] = i + 1;
        for (j, sc) in short.iter().enumerate() {
            let substitute = prev[j] + usize::from(lc != sc);
            let delete = prev[j + 1] + 1;
            let insert = curr[j] + 1;
            curr[j + 1] = substitute.min(delete).min(insert);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[short.len()]
}

/// Length pre-filter: can `candidate` plausibly be within `threshold` of `query`?
///
/// Candidates whose length differs by more than `threshold + 2` are skipped.
pub fn within_length_window(query: &str, candidate: &str, threshold: usize) -> bool {
    let q = query.chars().count();
    let c = candidate.chars().count();
    q.abs_diff(c) <= threshold + 2
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn known_distances() {
        assert_eq!(distance("kitten", "sitting"), 3);
        assert_eq!(distance("sugar", "sugr"), 1);
        assert_eq!(distance("", "abc"), 3);
        assert_eq!(distance("abc", ""), 3);
        assert_eq!(distance("same", "same"), 0);
    }

    #[test]
    fn transposition_costs_two() {
        assert_eq!(distance("ab", "ba"), 2);
    }

    #[test]
    fn counts_chars_not_bytes() {
        assert_eq!(distance("crème", "creme"), 1);
    }

    #[test]
    fn length_window_uses_threshold_plus_two() {
        assert!(within_length_window("salt", "saltpeter", 3));
        assert!(!within_length_window("salt", "saltpeterx", 2));
    }

    proptest! {
        #[test]
        fn distance_is_symmetric(a in "[a-z ]{0,12}", b in "[a-z ]{0,12}") {
            prop_assert_eq!(distance(&a, &b), distance(&b, &a));
        }

        #[test]
        fn distance_is_bounded_by_lengths(a in "[a-z]{0,12}", b in "[a-z]{0,12}") {
            let d = distance(&a, &b);
            prop_assert!(d >= a.len().abs_diff(b.len()));
            prop_assert!(d <= a.len().max(b.len()));
        }

        #[test]
        fn triangle_inequality(a in "[a-c]{0,8}", b in "[a-c]{0,8}", c in "[a-c]{0,8}") {
            prop_assert!(distance(&a, &c) <= distance(&a, &b) + distance(&b, &c));
        }
    }
}
