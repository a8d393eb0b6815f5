//! Loose containment match: `a` matches `b` when either contains the other,
//! ignoring case and surrounding whitespace. First match in collection order wins.

pub fn loose_match(a: &str, b: &str) -> bool {
    let a = a.trim().to_lowercase();
    let b = b.trim().to_lowercase();
    if a.is_empty() || b.is_empty() {
        return false;
    }
    a.contains(&b) || b.contains(&a)
}

pub fn find_first<'a, T, F>(items: &'a [T], needle: &str, name_of: F) -> Option<&'a T>
where
    F: Fn(&T) -> &str,
{
    items.iter().find(|item| loose_match(name_of(item), needle))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_in_both_directions() {
        assert!(loose_match("Milk", "milk, 2%"));
        assert!(loose_match("milk, 2%", "MILK"));
        assert!(loose_match("  eggs ", "Eggs"));
        assert!(!loose_match("butter", "bread"));
    }

    #[test]
    fn empty_never_matches() {
        assert!(!loose_match("", "milk"));
        assert!(!loose_match("milk", "   "));
    }

    #[test]
    fn first_in_order_wins() {
        let names = ["green onion", "onion", "red onion"];
        assert_eq!(find_first(&names, "onion", |s| *s), Some(&"green onion"));
        assert_eq!(find_first(&names, "red onions", |s| *s), Some(&"onion"));
        assert_eq!(find_first(&names, "garlic", |s| *s), None);
    }
}
