/// Linear scan for `target` in an unordered slice.
///
/// Used for ignore lists, which are short and unsorted, so no set is built.
pub fn contains<T, Q>(list: &[T], target: &Q) -> bool
where
    T: PartialEq<Q>,
    Q: ?Sized,
{
    for item in list {
        if item == target {
            return true;
        }
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_list_contains_nothing() {
        let list: [String; 0] = [];
        assert!(!contains(&list, "anything"));
        assert!(!contains(&list, ""));
    }

    #[test]
    fn test_finds_present_value() {
        let list = vec!["Alpha".to_string(), "Beta".to_string()];
        assert!(contains(&list, "Beta"));
        assert!(!contains(&list, "Gamma"));
    }

    #[test]
    fn test_match_is_case_sensitive() {
        let list = vec!["Alpha".to_string()];
        assert!(!contains(&list, "alpha"));
    }

    #[test]
    fn test_duplicates_are_harmless() {
        let list = [3, 3, 5];
        assert!(contains(&list, &3));
        assert!(!contains(&list, &4));
    }
}
