use super::*;

#[test]
fn literal_pattern_matches_exactly() {
    let p = TopicPattern::parse("hello/1").unwrap();
    assert!(p.matches("hello/1"));
    assert!(!p.matches("hello/2"));
    assert!(!p.matches("hello"));
    assert!(!p.matches("hello/1/x"));
}

#[test]
fn matching_is_case_sensitive() {
    let p = TopicPattern::parse("Hello/World").unwrap();
    assert!(p.matches("Hello/World"));
    assert!(!p.matches("hello/world"));
}

#[test]
fn plus_matches_exactly_one_level() {
    let p = TopicPattern::parse("sensors/+/temp").unwrap();
    assert!(p.matches("sensors/kitchen/temp"));
    assert!(p.matches("sensors//temp")); // empty level is a level
    assert!(!p.matches("sensors/temp"));
    assert!(!p.matches("sensors/a/b/temp"));
}

#[test]
fn hash_matches_one_or_more_remaining_levels() {
    let p = TopicPattern::parse("sensors/#").unwrap();
    assert!(p.matches("sensors/kitchen"));
    assert!(p.matches("sensors/kitchen/temp"));
    assert!(!p.matches("sensors"));
    assert!(!p.matches("doors/front"));
}

#[test]
fn bare_hash_matches_everything_with_a_level() {
    let p = TopicPattern::parse("#").unwrap();
    assert!(p.matches("a"));
    assert!(p.matches("a/b/c"));
    assert!(p.matches(""));
}

#[test]
fn empty_levels_must_match_empty_levels() {
    let p = TopicPattern::parse("a//b").unwrap();
    assert!(p.matches("a//b"));
    assert!(!p.matches("a/b"));

    let p = TopicPattern::parse("/a").unwrap();
    assert!(p.matches("/a"));
    assert!(!p.matches("a"));
}

#[test]
fn hash_only_final() {
    assert_eq!(
        TopicPattern::parse("a/#/b"),
        Err(PatternError::HashNotFinal("a/#/b".into()))
    );
}

#[test]
fn wildcard_must_be_whole_level() {
    assert!(matches!(
        TopicPattern::parse("a/b+/c"),
        Err(PatternError::PartialWildcard(_))
    ));
    assert!(matches!(
        TopicPattern::parse("a/b#"),
        Err(PatternError::PartialWildcard(_))
    ));
}

#[test]
fn empty_pattern_rejected() {
    assert_eq!(TopicPattern::parse(""), Err(PatternError::Empty));
}

#[test]
fn captures_plus_levels() {
    let p = TopicPattern::parse("sensors/+/+").unwrap();
    assert_eq!(
        p.captures("sensors/kitchen/temp").unwrap(),
        vec!["kitchen", "temp"]
    );
}

#[test]
fn captures_hash_remainder_joined() {
    let p = TopicPattern::parse("sensors/+/#").unwrap();
    assert_eq!(
        p.captures("sensors/kitchen/temp/raw").unwrap(),
        vec!["kitchen", "temp/raw"]
    );
}

#[test]
fn captures_none_on_mismatch() {
    let p = TopicPattern::parse("a/+").unwrap();
    assert!(p.captures("b/c").is_none());
}

#[test]
fn matching_is_pure() {
    let p = TopicPattern::parse("a/+").unwrap();
    assert_eq!(p.captures("a/x"), p.captures("a/x"));
}
