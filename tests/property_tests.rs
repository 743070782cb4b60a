//! Property tests for permutation algebra and elimination structure

use apex_inference::core::{Conditional, Factor, FactorGraph, Key, Permutation, VariableIndex};
use apex_inference::factors::SymbolicFactor;
use apex_inference::inference::{
    EliminationConfig, MinimumDegreeOrdering, eliminate_one, eliminate_with_oracle,
};
use proptest::prelude::*;
use std::collections::BTreeSet;

fn permutation() -> impl Strategy<Value = Vec<usize>> {
    (1usize..40).prop_flat_map(|n| Just((0..n).collect::<Vec<usize>>()).prop_shuffle())
}

/// `n` variables, each with a unary factor, plus random factors of up to 4 distinct keys.
fn symbolic_graph() -> impl Strategy<Value = (usize, Vec<Vec<Key>>)> {
    (2usize..12).prop_flat_map(|n| {
        let scopes = prop::collection::vec(
            prop::collection::btree_set(0..n, 1..=n.min(4))
                .prop_map(|keys: BTreeSet<Key>| keys.into_iter().collect::<Vec<Key>>()),
            0..16,
        );
        (Just(n), scopes)
    })
}

fn build((n, scopes): &(usize, Vec<Vec<Key>>)) -> FactorGraph<SymbolicFactor> {
    (0..*n)
        .map(|k| vec![k])
        .chain(scopes.iter().cloned())
        .map(SymbolicFactor::new)
        .collect()
}

proptest! {
    #[test]
    fn identity_is_neutral_for_compose(values in permutation()) {
        let p = Permutation::from_vec(values).unwrap();
        let identity = Permutation::identity(p.len());
        prop_assert_eq!(p.compose(&identity).unwrap(), p.clone());
        prop_assert_eq!(identity.compose(&p).unwrap(), p);
    }

    #[test]
    fn compose_with_inverse_is_identity(values in permutation()) {
        let p = Permutation::from_vec(values).unwrap();
        prop_assert!(p.compose(&p.inverse().unwrap()).unwrap().is_identity());
        prop_assert!(p.inverse().unwrap().compose(&p).unwrap().is_identity());
    }

    #[test]
    fn inverse_is_an_involution(values in permutation()) {
        let p = Permutation::from_vec(values).unwrap();
        prop_assert_eq!(p.inverse().unwrap().inverse().unwrap(), p);
    }

    #[test]
    fn push_to_back_places_targets_last(values in permutation(), k in 0usize..8) {
        let n = values.len();
        let targets: Vec<usize> = values.into_iter().take(k.min(n)).collect();
        let p = Permutation::push_to_back(&targets, n).unwrap();

        let split = n - targets.len();
        prop_assert_eq!(&p.as_slice()[split..], targets.as_slice());
        prop_assert!(p.as_slice()[..split].windows(2).all(|w| w[0] < w[1]));

        let q = Permutation::pull_to_front(&targets, n).unwrap();
        prop_assert_eq!(&q.as_slice()[..targets.len()], targets.as_slice());
    }

    #[test]
    fn index_stays_consistent_during_elimination(spec in symbolic_graph()) {
        let mut graph = build(&spec);
        let mut index = VariableIndex::new(&graph);
        let config = EliminationConfig::default();

        for variable in 0..spec.0 {
            let conditional = eliminate_one(&mut graph, &mut index, variable, &config).unwrap();
            let conditional = conditional.unwrap();
            prop_assert!(conditional.parents().iter().all(|&p| p > variable));
            prop_assert!(index.validate(&graph).is_ok());
        }
        prop_assert!(graph.is_empty());
    }

    #[test]
    fn oracle_elimination_is_topological(spec in symbolic_graph()) {
        let graph = build(&spec);
        let (ordering, bayes_net) =
            eliminate_with_oracle(&graph, &MinimumDegreeOrdering, &[], &EliminationConfig::default())
                .unwrap();

        prop_assert_eq!(bayes_net.len(), spec.0);
        let position = ordering.inverse().unwrap();
        for (i, conditional) in bayes_net.iter().enumerate() {
            prop_assert_eq!(conditional.frontal(), ordering[i]);
            prop_assert!(conditional.parents().iter().all(|&p| position[p] > i));
        }

        // Every original factor's scope ends up inside one conditional's clique.
        for factor in graph.factors() {
            let first = factor.keys().iter().map(|&k| position[k]).min().unwrap();
            let clique = &bayes_net[first];
            prop_assert!(factor.keys().iter().all(|k| *k == clique.frontal() || clique.parents().contains(k)));
        }
    }
}
