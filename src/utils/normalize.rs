/// Reduces an answer to its comparable form: ASCII letters and digits only,
/// lowercased. A missing answer normalizes to the empty string.
///
/// `normalize("Paris!") == normalize("paris")`
pub fn normalize<'a>(text: impl Into<Option<&'a str>>) -> String {
    text.into()
        .unwrap_or_default()
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Normalized equality between a user's choice and the correct answer.
/// An answer that normalizes to nothing never counts as correct.
pub fn answers_match(user_answer: Option<&str>, correct_answer: &str) -> bool {
    let user = normalize(user_answer);
    !user.is_empty() && user == normalize(correct_answer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_ignores_case_and_punctuation() {
        assert_eq!(normalize("Paris!"), normalize("paris"));
        assert_eq!(normalize("O(n log n)"), "onlogn");
        assert_eq!(normalize("  New-York, NY "), "newyorkny");
    }

    #[test]
    fn test_normalize_none_is_empty() {
        assert_eq!(normalize(None), "");
    }

    #[test]
    fn test_normalize_drops_non_ascii() {
        assert_eq!(normalize("Café 42"), "caf42");
    }

    #[test]
    fn test_answers_match() {
        assert!(answers_match(Some("4"), "4"));
        assert!(answers_match(Some("the Mitochondria."), "The mitochondria"));
        assert!(!answers_match(Some("5"), "4"));
        assert!(!answers_match(None, "4"));
        assert!(!answers_match(Some("?!"), "..."));
    }
}
