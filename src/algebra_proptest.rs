//! Property-based tests for set diffs, statistics and resolution.

#[cfg(test)]
mod proptest_tests {
    use std::collections::BTreeSet;

    use proptest::prelude::*;

    use crate::activity::Statistic;
    use crate::config::{RepoPolicies, RepoPolicy};
    use crate::reconcile::Diff;
    use crate::resolve::resolve;

    fn names() -> impl Strategy<Value = BTreeSet<String>> {
        prop::collection::btree_set("[a-e]{1,3}", 0..12)
    }

    fn statistic() -> impl Strategy<Value = Statistic> {
        (0u64..1000, 0u64..1000, 0u64..1000, 0u64..1000).prop_map(|(a, b, c, d)| Statistic {
            prs_opened: a,
            prs_closed: b,
            issues_opened: c,
            issues_closed: d,
        })
    }

    proptest! {
        /// Applying a diff to the existing set yields the desired set.
        #[test]
        fn diff_converges(existing in names(), desired in names()) {
            let diff = Diff::compute(&existing, &desired);
            let mut result: BTreeSet<String> =
                existing.difference(&diff.to_remove).cloned().collect();
            result.extend(diff.to_add.iter().cloned());
            prop_assert_eq!(result, desired);
        }

        /// Additions and removals never overlap.
        #[test]
        fn diff_sides_are_disjoint(existing in names(), desired in names()) {
            let diff = Diff::compute(&existing, &desired);
            prop_assert!(diff.to_add.is_disjoint(&diff.to_remove));
            prop_assert!(diff.to_add.is_disjoint(&existing));
            prop_assert!(diff.to_remove.is_subset(&existing));
        }

        /// A second diff after convergence is empty.
        #[test]
        fn diff_is_idempotent(desired in names()) {
            prop_assert!(Diff::compute(&desired, &desired).is_empty());
        }

        #[test]
        fn statistic_sum_is_commutative(a in statistic(), b in statistic()) {
            let forward: Statistic = [a, b].iter().sum();
            let backward: Statistic = [b, a].iter().sum();
            prop_assert_eq!(forward, backward);
        }

        #[test]
        fn statistic_sum_is_associative(a in statistic(), b in statistic(), c in statistic()) {
            prop_assert_eq!((a + b) + c, a + (b + c));
        }

        #[test]
        fn blank_statistic_is_identity(a in statistic()) {
            prop_assert_eq!(a + Statistic::default(), a);
        }

        /// The winning pattern is always one of the longest matching patterns.
        #[test]
        fn resolution_picks_a_longest_match(
            patterns in prop::collection::btree_set("[a-c]{0,2}\\*", 1..6),
            repo in "[a-c]{1,4}",
        ) {
            let policies: RepoPolicies = patterns
                .iter()
                .map(|p| (p.clone(), RepoPolicy::default()))
                .collect();
            let resolution = resolve(&policies, std::slice::from_ref(&repo)).unwrap();

            let longest = patterns
                .iter()
                .filter(|p| crate::pattern::glob_match(p, &repo).unwrap())
                .map(|p| p.len())
                .max();
            match (resolution.repos.get(&repo), longest) {
                (Some(resolved), Some(len)) => prop_assert_eq!(resolved.source_pattern.len(), len),
                (None, None) => {}
                (got, want) => prop_assert!(false, "resolved {:?}, longest match {:?}", got, want),
            }
        }
    }
}
