use super::*;

use proptest::prelude::*;
use std::collections::HashSet;

const TOLERANCE: f64 = 1e-12;

fn config(depth: usize) -> TreeConfig {
    TreeConfig::new(depth).with_capacity(1 << 12).with_invariant_checks(true)
}

/// Structural and probabilistic invariants of every node, checked from the
/// outside through the public node accessors.
fn validate_tree(tree: &ContextTree) {
    let nodes = tree.nodes();
    let count = |id: Option<NodeId>| id.map_or((0, 0), |id| (nodes[id.index()].count0(), nodes[id.index()].count1()));
    let pw = |id: Option<NodeId>| id.map_or(1.0, |id| nodes[id.index()].pw());

    for (index, node) in nodes.iter().enumerate() {
        assert!(node.pe() > 0.0 && node.pe() <= 1.0, "pe out of bounds at #{index}");
        assert!(node.pw() > 0.0 && node.pw() <= 1.0, "pw out of bounds at #{index}");

        if node.is_leaf() {
            assert!(node.total() > 0 || (index == 0 && tree.observations() == 0), "unvisited leaf #{index}");
            assert_eq!(node.pw(), node.pe(), "leaf #{index} must have pw == pe");
            continue;
        }

        let (a0, b0) = count(node.child0());
        let (a1, b1) = count(node.child1());
        assert_eq!(node.count0(), a0 + a1, "count0 not conserved at #{index}");
        assert_eq!(node.count1(), b0 + b1, "count1 not conserved at #{index}");

        let expected = 0.5 * node.pe() + 0.5 * pw(node.child0()) * pw(node.child1());
        assert!((node.pw() - expected).abs() <= TOLERANCE * expected, "weighting formula at #{index}");
        for child in [node.child0(), node.child1()].into_iter().flatten() {
            assert!(child.index() > index, "child numbered before its parent at #{index}");
        }
    }
}

fn bits_key(tree: &ContextTree) -> Vec<(u32, u32, u64, u64)> {
    tree.nodes()
        .iter()
        .map(|n| (n.count0(), n.count1(), n.pe().to_bits(), n.pw().to_bits()))
        .collect()
}

fn updates_strategy() -> impl Strategy<Value = (usize, Vec<(Vec<u8>, u8)>)> {
    (0usize..=6).prop_flat_map(|depth| {
        let update = (prop::collection::vec(0u8..=1, depth), 0u8..=1);
        (Just(depth), prop::collection::vec(update, 0..=200))
    })
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 128,
        .. ProptestConfig::default()
    })]

    #[test]
    fn prop_invariants_hold_after_every_update((depth, updates) in updates_strategy()) {
        let mut tree = ContextTree::with_config(config(depth)).unwrap();
        let mut prev_len = tree.len();

        for (n, (context, bit)) in updates.iter().enumerate() {
            tree.update(context, *bit).unwrap();
            validate_tree(&tree);

            prop_assert!(tree.len() >= prev_len);
            prop_assert!(tree.len() <= (depth + 1) * (n + 1));
            prop_assert_eq!(tree.observations() as usize, n + 1);
            prev_len = tree.len();
        }
        prop_assert!(tree.check_all().is_ok());
    }

    #[test]
    fn prop_deterministic((depth, updates) in updates_strategy()) {
        let mut a = ContextTree::with_config(config(depth)).unwrap();
        let mut b = ContextTree::with_config(config(depth)).unwrap();
        for (context, bit) in &updates {
            a.update(context, *bit).unwrap();
            b.update(context, *bit).unwrap();
        }
        prop_assert_eq!(bits_key(&a), bits_key(&b));
    }

    #[test]
    fn prop_rejected_updates_change_nothing(
        (depth, updates) in updates_strategy(),
        extra in 1usize..4,
        bit in 0u8..=1,
    ) {
        let mut tree = ContextTree::with_config(config(depth)).unwrap();
        for (context, bit) in &updates {
            tree.update(context, *bit).unwrap();
        }
        let before = bits_key(&tree);

        let long = vec![0; depth + extra];
        let is_depth_mismatch = matches!(tree.update(&long, bit), Err(CtwError::DepthMismatch { .. }));
        prop_assert!(is_depth_mismatch);
        if depth > 0 {
            let short = vec![1; depth - 1];
            prop_assert!(tree.update(&short, bit).is_err());
        }
        prop_assert!(tree.update(&vec![0; depth], 2).is_err());
        prop_assert_eq!(bits_key(&tree), before);
    }

    #[test]
    fn prop_predict_is_the_root_ratio(
        (depth, updates) in updates_strategy(),
        query in prop::collection::vec(0u8..=1, 6),
    ) {
        let mut tree = ContextTree::with_config(config(depth)).unwrap();
        for (context, bit) in &updates {
            tree.update(context, *bit).unwrap();
        }
        let context = &query[..depth];
        let p1 = tree.predict(context).unwrap();
        prop_assert!(p1 > 0.0 && p1 < 1.0);

        let ln_before = tree.node(tree.root()).unwrap().ln_pw();
        let mut one = tree.clone();
        one.update(context, 1).unwrap();
        let mut zero = tree.clone();
        zero.update(context, 0).unwrap();
        let p_one = (one.node(one.root()).unwrap().ln_pw() - ln_before).exp();
        let p_zero = (zero.node(zero.root()).unwrap().ln_pw() - ln_before).exp();

        prop_assert!((p1 - p_one).abs() < 1e-9);
        prop_assert!((p_one + p_zero - 1.0).abs() < 1e-9);
    }

    #[test]
    fn prop_snapshot_roundtrip((depth, updates) in updates_strategy()) {
        let mut tree = ContextTree::with_config(config(depth)).unwrap();
        for (context, bit) in &updates {
            tree.update(context, *bit).unwrap();
        }
        let json = serde_json::to_string(&tree.snapshot()).unwrap();
        let snapshot: TreeSnapshot = serde_json::from_str(&json).unwrap();
        let restored = ContextTree::from_snapshot(snapshot).unwrap();
        prop_assert_eq!(bits_key(&restored), bits_key(&tree));
    }

    #[test]
    fn prop_lines_visit_every_node_once((depth, updates) in updates_strategy()) {
        let mut tree = ContextTree::with_config(config(depth)).unwrap();
        for (context, bit) in &updates {
            tree.update(context, *bit).unwrap();
        }

        let lines: Vec<NodeLine> = tree.lines().collect();
        prop_assert_eq!(lines.len(), tree.len());
        let ids: HashSet<NodeId> = lines.iter().map(|l| l.id).collect();
        prop_assert_eq!(ids.len(), tree.len());

        let last = lines.last().unwrap();
        prop_assert_eq!(last.id, tree.root());
        prop_assert!(last.label.is_empty());
        for line in &lines {
            let node = tree.node(line.id).unwrap();
            prop_assert!(line.label.len() <= depth);
            prop_assert_eq!((line.count0, line.count1), (node.count0(), node.count1()));
            if node.is_leaf() && tree.observations() > 0 {
                prop_assert_eq!(line.label.len(), depth);
            }
        }
    }
}
