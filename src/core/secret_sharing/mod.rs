use std::collections::{BTreeMap, BTreeSet};

use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};

use crate::{
    core::{
        bilinear_map::BilinearMap,
        policy::{AccessPolicy, LeafId},
    },
    error::FormatErr,
};

mod span_program;
mod threshold_tree;

pub use span_program::SpanProgram;
pub use threshold_tree::ThresholdTree;

/// One scalar per policy leaf occurrence
pub type Shares<S> = BTreeMap<LeafId, S>;

/// A linear secret sharing scheme driven by an access policy.
///
/// For every attribute set satisfying the policy, `coefficients` returns
/// scalars `c_l` over a subset of the leaves such that `Σ c_l⋅λ_l = s` where
/// `λ_l` are the shares of `s` returned by `share`. For a non satisfying set
/// it returns `None`.
pub trait SecretSharing<G: BilinearMap> {
    fn description(&self) -> String;

    fn share<R: CryptoRng + RngCore>(
        &self,
        group: &G,
        policy: &AccessPolicy,
        secret: &G::Scalar,
        rng: &mut R,
    ) -> Result<Shares<G::Scalar>, FormatErr>;

    fn coefficients(
        &self,
        group: &G,
        policy: &AccessPolicy,
        attributes: &BTreeSet<String>,
    ) -> Result<Option<Shares<G::Scalar>>, FormatErr>;
}

/// Secret sharing scheme selected at run time
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SharingStrategy {
    ThresholdTree,
    SpanProgram,
}

impl Default for SharingStrategy {
    fn default() -> Self {
        SharingStrategy::ThresholdTree
    }
}

impl<G: BilinearMap> SecretSharing<G> for SharingStrategy {
    fn description(&self) -> String {
        match self {
            SharingStrategy::ThresholdTree => SecretSharing::<G>::description(&ThresholdTree),
            SharingStrategy::SpanProgram => SecretSharing::<G>::description(&SpanProgram),
        }
    }

    fn share<R: CryptoRng + RngCore>(
        &self,
        group: &G,
        policy: &AccessPolicy,
        secret: &G::Scalar,
        rng: &mut R,
    ) -> Result<Shares<G::Scalar>, FormatErr> {
        match self {
            SharingStrategy::ThresholdTree => ThresholdTree.share(group, policy, secret, rng),
            SharingStrategy::SpanProgram => SpanProgram.share(group, policy, secret, rng),
        }
    }

    fn coefficients(
        &self,
        group: &G,
        policy: &AccessPolicy,
        attributes: &BTreeSet<String>,
    ) -> Result<Option<Shares<G::Scalar>>, FormatErr> {
        match self {
            SharingStrategy::ThresholdTree => ThresholdTree.coefficients(group, policy, attributes),
            SharingStrategy::SpanProgram => SpanProgram.coefficients(group, policy, attributes),
        }
    }
}
