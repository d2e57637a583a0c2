use approx::relative_eq;
use nalgebra::{Matrix4, Vector3};
use rand::{rngs::StdRng, Rng, SeedableRng};

use transform_tree::{ErrorKind, NodeId, Propagation, TransformTree};

const NODES: usize = 24;
const STEPS: usize = 400;

/// Global matrix recomputed from scratch by walking the parent chain.
fn brute_force(tree: &TransformTree, id: NodeId) -> Matrix4<f32> {
    let mut matrix = Matrix4::identity();
    let mut current = Some(id);
    while let Some(node) = current {
        matrix = tree.local_transform(node).unwrap().to_matrix() * matrix;
        current = tree.parent(node).unwrap();
    }
    matrix
}

fn build(propagation: Propagation, rng: &mut StdRng) -> (TransformTree, Vec<NodeId>) {
    let mut tree: TransformTree = TransformTree::with_propagation(propagation);
    let mut ids = vec![tree.create_root()];
    while ids.len() < NODES {
        let id = if rng.gen_bool(0.1) {
            tree.create_root()
        } else {
            let parent = ids[rng.gen_range(0..ids.len())];
            tree.create_child(parent).unwrap()
        };
        ids.push(id);
    }
    (tree, ids)
}

fn mutate(tree: &mut TransformTree, ids: &[NodeId], rng: &mut StdRng) {
    let id = ids[rng.gen_range(0..ids.len())];
    let axis = rng.gen_range(0..3);
    match rng.gen_range(0..5) {
        0 => tree
            .set_position_axis(id, axis, rng.gen_range(-2.0..2.0))
            .unwrap(),
        1 => tree
            .set_scale_axis(id, axis, rng.gen_range(0.8..1.25))
            .unwrap(),
        2 => tree
            .set_rotation_axis(id, axis, rng.gen_range(-7.0..7.0))
            .unwrap(),
        3 => {
            let parent = ids[rng.gen_range(0..ids.len())];
            if let Err(err) = tree.reparent(id, parent) {
                assert_eq!(err.kind(), ErrorKind::InvalidOperation);
            }
        }
        _ => {
            if let Some(parent) = tree.parent(id).unwrap() {
                tree.remove_and_orphan(parent, id).unwrap();
            }
        }
    }
}

fn assert_matches(tree: &TransformTree, id: NodeId) {
    let cached = tree.global_matrix(id).unwrap();
    let expected = brute_force(tree, id);
    assert!(
        relative_eq!(cached, expected, epsilon = 1e-3, max_relative = 1e-3),
        "node {}: cached {} expected {}",
        id,
        cached,
        expected
    );
}

#[test]
fn random_reads_see_every_ancestor_change() {
    for propagation in [Propagation::Eager, Propagation::Generational].iter().copied() {
        let mut rng = StdRng::seed_from_u64(0x5eed);
        let (mut tree, ids) = build(propagation, &mut rng);

        for _ in 0..STEPS {
            for _ in 0..rng.gen_range(1..4) {
                mutate(&mut tree, &ids, &mut rng);
            }
            let id = ids[rng.gen_range(0..ids.len())];
            assert_matches(&tree, id);
        }
    }
}

#[test]
fn top_down_reads_keep_one_hop_fresh() {
    let mut rng = StdRng::seed_from_u64(42);
    let (mut tree, ids) = build(Propagation::OneHop, &mut rng);

    for _ in 0..STEPS / 4 {
        for _ in 0..rng.gen_range(1..6) {
            mutate(&mut tree, &ids, &mut rng);
        }
        for root in tree.hierarchy().roots() {
            for id in tree.hierarchy().descendants(root).unwrap() {
                assert_matches(&tree, id);
            }
        }
    }
}

#[test]
fn global_positions_follow_global_matrices() {
    let mut rng = StdRng::seed_from_u64(7);
    let (mut tree, ids) = build(Propagation::Generational, &mut rng);
    for _ in 0..STEPS / 4 {
        mutate(&mut tree, &ids, &mut rng);
    }
    for id in &ids {
        let matrix = brute_force(&tree, *id);
        let expected = Vector3::new(matrix[(0, 3)], matrix[(1, 3)], matrix[(2, 3)]);
        let position = tree.global_position(*id).unwrap();
        assert!(
            relative_eq!(position, expected, epsilon = 1e-3, max_relative = 1e-3),
            "node {}: {} vs {}",
            id,
            position,
            expected
        );
    }
}
