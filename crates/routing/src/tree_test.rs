use super::*;

fn tree(patterns: &[&str]) -> TopicTree<usize> {
    let mut tree = TopicTree::new();
    for (i, p) in patterns.iter().enumerate() {
        tree.insert(TopicPattern::parse(p).unwrap(), i);
    }
    tree
}

#[test]
fn exact_match() {
    let tree = tree(&["hello/1", "hello/2"]);
    assert_eq!(tree.matches("hello/1"), vec![&0]);
    assert_eq!(tree.matches("hello/2"), vec![&1]);
    assert!(tree.matches("hello/3").is_empty());
}

#[test]
fn wildcard_overlap_preserves_insertion_order() {
    let tree = tree(&["sensors/#", "sensors/+/temp", "sensors/kitchen/temp"]);
    assert_eq!(tree.matches("sensors/kitchen/temp"), vec![&0, &1, &2]);
}

#[test]
fn insertion_order_beats_specificity() {
    // Declaration order is the contract, not "most specific first".
    let tree1 = tree(&["a/b", "a/+", "#"]);
    assert_eq!(tree1.matches("a/b"), vec![&0, &1, &2]);

    let tree2 = tree(&["#", "a/+", "a/b"]);
    assert_eq!(tree2.matches("a/b"), vec![&0, &1, &2]);
}

#[test]
fn hash_requires_one_remaining_level() {
    let tree = tree(&["sensors/#"]);
    assert!(tree.matches("sensors").is_empty());
    assert_eq!(tree.matches("sensors/x"), vec![&0]);
    assert_eq!(tree.matches("sensors/x/y"), vec![&0]);
}

#[test]
fn plus_does_not_span_levels() {
    let tree = tree(&["a/+"]);
    assert_eq!(tree.matches("a/b"), vec![&0]);
    assert!(tree.matches("a/b/c").is_empty());
    assert!(tree.matches("a").is_empty());
}

#[test]
fn empty_levels_are_distinct() {
    let tree = tree(&["a//b", "a/b"]);
    assert_eq!(tree.matches("a//b"), vec![&0]);
    assert_eq!(tree.matches("a/b"), vec![&1]);
}

#[test]
fn repeated_lookup_is_stable() {
    let tree = tree(&["x/#", "x/+", "x/y"]);
    let first: Vec<usize> = tree.matches("x/y").into_iter().copied().collect();
    let second: Vec<usize> = tree.matches("x/y").into_iter().copied().collect();
    assert_eq!(first, second);
    assert_eq!(first, vec![0, 1, 2]);
}

#[test]
fn same_pattern_twice_keeps_both_values() {
    let tree = tree(&["dup/t", "dup/t"]);
    assert_eq!(tree.matches("dup/t"), vec![&0, &1]);
}

#[test]
fn empty_tree_matches_nothing() {
    let tree: TopicTree<usize> = TopicTree::new();
    assert!(tree.is_empty());
    assert!(tree.matches("anything").is_empty());
}
