// Natural (numeric-aware) string ordering for item ids

use std::cmp::Ordering;

/// Compare two strings so that embedded digit runs compare by value
///
/// `"2" < "10"`, `"item2" < "item10"`, and non-numeric text falls back to
/// case-insensitive ordering with a final byte-wise tiebreak.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut a_chars = a.chars().peekable();
    let mut b_chars = b.chars().peekable();

    loop {
        match (a_chars.peek().copied(), b_chars.peek().copied()) {
            (None, None) => return a.cmp(b),
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(ca), Some(cb)) if ca.is_ascii_digit() && cb.is_ascii_digit() => {
                let mut run_a = String::new();
                while let Some(c) = a_chars.peek().copied().filter(|c| c.is_ascii_digit()) {
                    run_a.push(c);
                    a_chars.next();
                }
                let mut run_b = String::new();
                while let Some(c) = b_chars.peek().copied().filter(|c| c.is_ascii_digit()) {
                    run_b.push(c);
                    b_chars.next();
                }
                let trimmed_a = run_a.trim_start_matches('0');
                let trimmed_b = run_b.trim_start_matches('0');
                let ordering = trimmed_a
                    .len()
                    .cmp(&trimmed_b.len())
                    .then_with(|| trimmed_a.cmp(trimmed_b));
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
            (Some(ca), Some(cb)) => {
                let ordering = ca.to_lowercase().cmp(cb.to_lowercase());
                if ordering != Ordering::Equal {
                    return ordering;
                }
                a_chars.next();
                b_chars.next();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_ids() {
        assert_eq!(natural_cmp("2", "10"), Ordering::Less);
        assert_eq!(natural_cmp("10", "2"), Ordering::Greater);
        assert_eq!(natural_cmp("7", "7"), Ordering::Equal);
    }

    #[test]
    fn test_mixed_ids() {
        assert_eq!(natural_cmp("item2", "item10"), Ordering::Less);
        assert_eq!(natural_cmp("a", "B"), Ordering::Less);
        assert_eq!(natural_cmp("9", "a"), Ordering::Less);
        assert_eq!(natural_cmp("abc", "abcd"), Ordering::Less);
    }

    #[test]
    fn test_leading_zeros_tiebreak() {
        assert_eq!(natural_cmp("01", "1"), "01".cmp("1"));
        assert_ne!(natural_cmp("01", "1"), Ordering::Equal);
    }

    #[test]
    fn test_sort_with_natural_order() {
        let mut ids = vec!["10", "2", "milk", "1", "bread"];
        ids.sort_by(|a, b| natural_cmp(a, b));
        assert_eq!(ids, vec!["1", "2", "10", "bread", "milk"]);
    }
}
