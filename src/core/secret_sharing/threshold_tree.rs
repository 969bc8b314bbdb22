use std::{collections::BTreeSet, convert::TryFrom};

use rand::{CryptoRng, RngCore};
use tracing::{debug, trace};

use super::{SecretSharing, Shares};
use crate::{
    core::{
        bilinear_map::BilinearMap,
        policy::{AccessPolicy, LabelledNode, LeafId},
    },
    error::FormatErr,
};

/// Shamir sharing along the policy tree.
///
/// Each gate holds a random polynomial `q` of degree `k-1` with `q(0)` the
/// value handed down by its parent; its `i`-th child (1-based) receives
/// `q(i)`. Reconstruction multiplies Lagrange coefficients at 0 from the root
/// down to the leaves.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ThresholdTree;

impl<G: BilinearMap> SecretSharing<G> for ThresholdTree {
    fn description(&self) -> String {
        format!("threshold tree over {}", G::description())
    }

    fn share<R: CryptoRng + RngCore>(
        &self,
        group: &G,
        policy: &AccessPolicy,
        secret: &G::Scalar,
        rng: &mut R,
    ) -> Result<Shares<G::Scalar>, FormatErr> {
        let mut shares = Shares::new();
        share_node(group, &policy.labelled(), secret.clone(), rng, &mut shares)?;
        debug!("threshold tree: {} leaf shares", shares.len());
        Ok(shares)
    }

    fn coefficients(
        &self,
        group: &G,
        policy: &AccessPolicy,
        attributes: &BTreeSet<String>,
    ) -> Result<Option<Shares<G::Scalar>>, FormatErr> {
        let pruned = prune(group, &policy.labelled(), attributes)?;
        match &pruned {
            Some(coefs) => debug!("threshold tree: policy satisfied by {} leaves", coefs.len()),
            None => debug!("threshold tree: policy not satisfied"),
        }
        Ok(pruned.map(|coefs| coefs.into_iter().collect()))
    }
}

fn share_node<G: BilinearMap, R: CryptoRng + RngCore>(
    group: &G,
    node: &LabelledNode,
    secret: G::Scalar,
    rng: &mut R,
    shares: &mut Shares<G::Scalar>,
) -> Result<(), FormatErr> {
    match node {
        LabelledNode::Leaf(id) => {
            shares.insert(id.clone(), secret);
        }
        LabelledNode::Gate {
            threshold,
            children,
        } => {
            if *threshold == 0 {
                return Err(FormatErr::InvalidAccessPolicy(
                    "gate with a threshold of 0".to_string(),
                ));
            }
            // q(x) = secret + a_1⋅x + ⋯ + a_(k-1)⋅x^(k-1)
            let mut poly = Vec::with_capacity(*threshold);
            poly.push(secret);
            poly.extend(group.gen_random_scalar_vector(threshold - 1, rng)?);
            for (i, child) in children.iter().enumerate() {
                let x = G::Scalar::from(i32::try_from(i + 1)?);
                share_node(group, child, eval_poly::<G>(&poly, &x), rng, shares)?;
            }
        }
    }
    Ok(())
}

// Horner evaluation of Σ poly[i]⋅x^i
fn eval_poly<G: BilinearMap>(poly: &[G::Scalar], x: &G::Scalar) -> G::Scalar {
    poly.iter()
        .rev()
        .fold(G::ZERO, |acc, coef| acc * x + coef)
}

// Lagrange coefficient at 0 of index `i` for the interpolation set `indices`:
// Δ_i(0) = Π_{j≠i} j / (j - i)
fn lagrange_at_zero<G: BilinearMap>(
    group: &G,
    i: usize,
    indices: &[usize],
) -> Result<G::Scalar, FormatErr> {
    let i = i32::try_from(i)?;
    let mut num = G::ONE;
    let mut den = G::ONE;
    for j in indices {
        let j = i32::try_from(*j)?;
        if j != i {
            num = num * &G::Scalar::from(j);
            den = den * &G::Scalar::from(j - i);
        }
    }
    Ok(num * &group.scalar_invert(&den)?)
}

// Walk the tree against the available attributes. A satisfied node returns
// the leaves it needs with their reconstruction coefficients relative to the
// node value; an unsatisfied node returns `None`.
fn prune<G: BilinearMap>(
    group: &G,
    node: &LabelledNode,
    attributes: &BTreeSet<String>,
) -> Result<Option<Vec<(LeafId, G::Scalar)>>, FormatErr> {
    match node {
        LabelledNode::Leaf(id) => {
            if attributes.contains(id.attribute()) {
                Ok(Some(vec![(id.clone(), G::ONE)]))
            } else {
                trace!("leaf {id} not held");
                Ok(None)
            }
        }
        LabelledNode::Gate {
            threshold,
            children,
        } => {
            if *threshold == 0 {
                return Err(FormatErr::InvalidAccessPolicy(
                    "gate with a threshold of 0".to_string(),
                ));
            }
            let mut satisfied = Vec::with_capacity(children.len());
            for (i, child) in children.iter().enumerate() {
                if let Some(coefs) = prune(group, child, attributes)? {
                    satisfied.push((i + 1, coefs));
                }
            }
            if satisfied.len() < *threshold {
                return Ok(None);
            }
            // keep the k satisfied children requiring the fewest leaves
            satisfied.sort_by_key(|(i, coefs)| (coefs.len(), *i));
            satisfied.truncate(*threshold);
            let indices = satisfied.iter().map(|(i, _)| *i).collect::<Vec<_>>();
            let mut res = Vec::new();
            for (i, coefs) in satisfied {
                let delta = lagrange_at_zero(group, i, &indices)?;
                res.extend(
                    coefs
                        .into_iter()
                        .map(|(id, coef)| (id, coef * &delta)),
                );
            }
            Ok(Some(res))
        }
    }
}
