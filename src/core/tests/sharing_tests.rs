use std::collections::BTreeSet;

use rand::SeedableRng;
use rand_hc::Hc128Rng;

use crate::{
    core::{
        bilinear_map::{bls12_381::Bls12_381, BilinearMap},
        policy::AccessPolicy,
        secret_sharing::{SecretSharing, SharingStrategy, SpanProgram, ThresholdTree},
    },
    error::FormatErr,
};

// (policy, attributes, satisfied)
const CASES: &[(&str, &[&str], bool)] = &[
    ("A", &["A"], true),
    ("A", &["B"], false),
    ("A", &[], false),
    ("(A) and (B)", &["B"], false),
    ("(A) and (B)", &["A", "B"], true),
    ("A or B", &["B"], true),
    ("A and (B or C)", &["A", "C"], true),
    ("A and (B or C)", &["B", "C"], false),
    ("(A and B) or (C and D)", &["C", "D"], true),
    ("(A and B) or (C and D)", &["A", "C"], false),
    ("2 of (A, B, C)", &["A", "C"], true),
    ("2 of (A, B, C)", &["A", "B", "C"], true),
    ("2 of (A, B, C)", &["B"], false),
    ("3 of (A, B)", &["A", "B"], false),
    ("2 of (A and B, C, D or E)", &["A", "B", "E"], true),
    ("2 of (A and B, C, D or E)", &["A", "C"], false),
    ("A and (A or B)", &["A"], true),
    ("(A or B) and (A or C)", &["A"], true),
    ("(A or B) and (A or C)", &["B", "C"], true),
    ("(A or B) and (A or C)", &["B"], false),
];

// Share a random secret and try to rebuild it from the leaves of `attributes`
fn reconstruct<S: SecretSharing<Bls12_381>>(
    sharing: &S,
    policy: &str,
    attributes: &[&str],
) -> Result<bool, FormatErr> {
    let group = Bls12_381;
    let mut rng = Hc128Rng::from_entropy();
    let policy = AccessPolicy::parse(policy)?;
    let secret = group.gen_random_scalar(&mut rng)?;
    let shares = sharing.share(&group, &policy, &secret, &mut rng)?;
    // one share per leaf occurrence
    assert_eq!(
        shares.keys().cloned().collect::<BTreeSet<_>>(),
        policy.leaves().into_iter().collect::<BTreeSet<_>>()
    );

    let attributes = attributes
        .iter()
        .map(|a| (*a).to_string())
        .collect::<BTreeSet<_>>();
    match sharing.coefficients(&group, &policy, &attributes)? {
        Some(coefficients) => {
            assert!(coefficients
                .keys()
                .all(|leaf| attributes.contains(leaf.attribute())));
            let rebuilt = coefficients
                .iter()
                .fold(Bls12_381::ZERO, |acc, (leaf, coef)| {
                    acc + &(coef.clone() * &shares[leaf])
                });
            assert_eq!(rebuilt, secret);
            Ok(true)
        }
        None => Ok(false),
    }
}

fn check_cases<S: SecretSharing<Bls12_381>>(sharing: &S) -> Result<(), FormatErr> {
    for (policy, attributes, satisfied) in CASES {
        assert_eq!(
            reconstruct(sharing, policy, attributes)?,
            *satisfied,
            "{} with {policy} and {attributes:?}",
            sharing.description()
        );
    }
    Ok(())
}

#[test]
fn threshold_tree_reconstruction() -> Result<(), FormatErr> {
    check_cases(&ThresholdTree)
}

#[test]
fn span_program_reconstruction() -> Result<(), FormatErr> {
    check_cases(&SpanProgram)
}

#[test]
fn strategy_dispatch() -> Result<(), FormatErr> {
    check_cases(&SharingStrategy::ThresholdTree)?;
    check_cases(&SharingStrategy::SpanProgram)
}

#[test]
fn pruning_keeps_smallest_children() -> Result<(), FormatErr> {
    let group = Bls12_381;
    let policy = AccessPolicy::parse("(A and B and C) or D")?;
    let attributes = ["A", "B", "C", "D"]
        .iter()
        .map(|a| (*a).to_string())
        .collect::<BTreeSet<_>>();
    let coefficients = ThresholdTree
        .coefficients(&group, &policy, &attributes)?
        .expect("policy is satisfied");
    assert_eq!(coefficients.len(), 1);
    assert!(coefficients.keys().all(|leaf| leaf.attribute() == "D"));
    Ok(())
}
