//! Tests for union_find module

use traceprofile::UnionFind;

#[test]
fn test_basic_operations() {
    let mut uf: UnionFind<i32> = UnionFind::new();

    uf.make_set(1);
    uf.make_set(2);
    uf.make_set(3);

    assert!(!uf.connected(&1, &2));

    uf.union(&1, &2);
    assert!(uf.connected(&1, &2));
    assert!(!uf.connected(&1, &3));
}

#[test]
fn test_chain_has_single_root() {
    let mut uf: UnionFind<i32> = UnionFind::new();

    // Chain: 1 - 2 - 3 - 4
    for i in 1..=4 {
        uf.make_set(i);
    }
    uf.union(&1, &2);
    uf.union(&2, &3);
    uf.union(&3, &4);

    let root = uf.find(&1);
    assert_eq!(uf.find(&2), root);
    assert_eq!(uf.find(&3), root);
    assert_eq!(uf.find(&4), root);
}

#[test]
fn test_groups() {
    let mut uf: UnionFind<String> = UnionFind::new();

    for id in ["a", "b", "c", "d"] {
        uf.make_set(id.to_string());
    }
    uf.union(&"a".to_string(), &"b".to_string());
    uf.union(&"c".to_string(), &"d".to_string());

    let groups = uf.groups();
    assert_eq!(groups.len(), 2);
    assert_eq!(groups["a"], vec!["a".to_string(), "b".to_string()]);
    assert_eq!(groups["c"], vec!["c".to_string(), "d".to_string()]);
}

#[test]
fn test_groups_deterministic() {
    // Run multiple times - results should be identical
    let results: Vec<_> = (0..5)
        .map(|_| {
            let mut uf: UnionFind<String> = UnionFind::new();

            // Add in non-sorted order (HashMap iteration is random)
            for id in ["d", "a", "c", "b"] {
                uf.make_set(id.to_string());
            }
            uf.union(&"a".to_string(), &"b".to_string());
            uf.union(&"c".to_string(), &"d".to_string());

            uf.groups()
        })
        .collect();

    for i in 1..results.len() {
        assert_eq!(
            results[0].len(),
            results[i].len(),
            "Different group counts on run {i}"
        );
        for (key, members) in &results[0] {
            assert_eq!(
                Some(members),
                results[i].get(key),
                "Different members for group {key} on run {i}"
            );
        }
    }
}

#[test]
fn test_groups_members_sorted() {
    let mut uf: UnionFind<String> = UnionFind::new();

    // Add in reverse alphabetical order
    for id in ["z", "m", "a"] {
        uf.make_set(id.to_string());
    }
    uf.union(&"z".to_string(), &"a".to_string());
    uf.union(&"z".to_string(), &"m".to_string());

    let groups = uf.groups();
    assert_eq!(groups.len(), 1);

    let members = groups.values().next().unwrap();
    let mut sorted = members.clone();
    sorted.sort();
    assert_eq!(members, &sorted, "Members should be sorted, got {:?}", members);
}

#[test]
fn test_usize_indices() {
    let mut uf: UnionFind<usize> = UnionFind::with_capacity(10);
    for i in 0..10 {
        uf.make_set(i);
    }
    uf.union(&0, &5);
    uf.union(&5, &9);

    assert!(uf.connected(&0, &9));
    assert_eq!(uf.len(), 10);
    assert_eq!(uf.groups().len(), 8);
}

#[test]
fn test_make_set_idempotent() {
    let mut uf: UnionFind<i32> = UnionFind::new();
    uf.make_set(1);
    uf.make_set(2);
    uf.union(&1, &2);
    // Re-registering must not detach the element from its set
    uf.make_set(1);
    assert!(uf.connected(&1, &2));
}
