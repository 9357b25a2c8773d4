use feed_filter_core::{should_hide, KeywordSet};
use proptest::prelude::*;

#[test]
fn matching_title_is_hidden() {
    assert!(should_hide(
        "Learning React Hooks",
        &KeywordSet::from_raw(["react"])
    ));
}

#[test]
fn unrelated_title_is_kept() {
    assert!(!should_hide("Vue Basics", &KeywordSet::from_raw(["react"])));
}

#[test]
fn empty_set_hides_nothing() {
    for text in ["", "a", "Learning React Hooks", "     "] {
        assert!(!should_hide(text, &KeywordSet::empty()));
    }
}

proptest! {
    #[test]
    fn hides_iff_some_keyword_is_a_substring(
        text in "[a-zA-Z ]{0,40}",
        raw in proptest::collection::vec("[a-zA-Z ]{0,6}", 0..5),
    ) {
        let keywords = KeywordSet::from_raw(&raw);
        let folded = text.to_lowercase();
        let expected = keywords.iter().any(|k| !k.is_empty() && folded.contains(k));
        prop_assert_eq!(should_hide(&text, &keywords), expected);
    }

    #[test]
    fn adding_keywords_never_unhides(
        text in "[a-z ]{0,30}",
        base in proptest::collection::vec("[a-z]{1,4}", 0..4),
        extra in "[a-z]{1,4}",
    ) {
        let small = KeywordSet::from_raw(&base);
        let mut grown = base.clone();
        grown.push(extra);
        let big = KeywordSet::from_raw(&grown);
        if should_hide(&text, &small) {
            prop_assert!(should_hide(&text, &big));
        }
    }
}
