/// A helper method to check that a string contains at least one character
/// that is not whitespace.
pub fn is_not_whitespace(value: &str) -> bool {
    value.chars().any(|c| !c.is_whitespace())
}

/// A helper method to check that `name` occurs exactly once in `names`.
///
/// Duplicate detection is textual, so two empty names count as a collision
/// just like two identical non-empty ones.
pub fn is_unique_name<'a, I>(names: I, name: &str) -> bool
where
    I: IntoIterator<Item = &'a str>,
{
    names.into_iter().filter(|n| *n == name).count() == 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whitespace_only_strings() {
        assert!(!is_not_whitespace(""));
        assert!(!is_not_whitespace(" \t\r\n"));
        assert!(is_not_whitespace("  x  "));
    }

    #[test]
    fn unique_names() {
        let names = ["a", "b", "a", ""];
        assert!(!is_unique_name(names, "a"));
        assert!(is_unique_name(names, "b"));
        assert!(is_unique_name(names, ""));
        assert!(!is_unique_name(names, "c"));
    }
}
