use regex::{Regex, RegexBuilder};
use std::collections::HashSet;

/// Build one case-insensitive regex matching any word of the search query,
/// for emphasizing hits in the list pane. The remote decides what actually
/// matched; this only approximates it visually. Longer words go first so
/// overlapping alternatives prefer the longest match.
pub fn build_highlight_regex(query: &str) -> Option<Regex> {
    let mut words = Vec::new();
    let mut seen = HashSet::new();
    for word in query.split_whitespace() {
        if seen.insert(word.to_lowercase()) {
            words.push(word);
        }
    }
    if words.is_empty() {
        return None;
    }
    words.sort_by(|a, b| b.len().cmp(&a.len()));
    let pattern = words
        .into_iter()
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join("|");
    RegexBuilder::new(&pattern)
        .case_insensitive(true)
        .build()
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_query_builds_nothing() {
        assert!(build_highlight_regex("").is_none());
        assert!(build_highlight_regex("   ").is_none());
    }

    #[test]
    fn prefers_longer_words_first() {
        let regex = build_highlight_regex("not note").expect("regex");
        let matches: Vec<_> = regex.find_iter("notebook").map(|m| m.as_str()).collect();
        assert_eq!(matches, vec!["note"]);
    }

    #[test]
    fn deduplicates_case_insensitive_words() {
        let regex = build_highlight_regex("Note note NOTE").expect("regex");
        let matches: Vec<_> = regex.find_iter("note").map(|m| m.as_str()).collect();
        assert_eq!(matches, vec!["note"]);
    }

    #[test]
    fn escapes_regex_metacharacters() {
        let regex = build_highlight_regex("c++ (draft)").expect("regex");
        assert!(regex.is_match("learning c++ basics"));
        assert!(regex.is_match("(draft) pending"));
    }
}
