use crate::KeywordSet;

/// True iff some non-empty keyword is a substring of the case-folded text.
pub fn should_hide(text: &str, keywords: &KeywordSet) -> bool {
    first_match(text, keywords).is_some()
}

/// The first keyword that hides `text`, for diagnostics.
pub fn first_match<'k>(text: &str, keywords: &'k KeywordSet) -> Option<&'k str> {
    if keywords.is_empty() || text.is_empty() {
        return None;
    }
    let folded = text.to_lowercase();
    keywords
        .iter()
        .filter(|k| !k.is_empty())
        .find(|k| folded.contains(*k))
}
