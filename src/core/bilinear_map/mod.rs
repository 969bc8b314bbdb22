use core::ops::{Add, Mul, Neg, Sub};

use rand::{CryptoRng, RngCore};

use crate::{core::yllc::AsBytes, error::FormatErr};

pub mod bls12_381;

// bilinear map: G1 x G2 -> Gt
// G1, G2 and Gt are used with multiplicative notation
// G1 carries the key material and the hashed attributes
// G2 carries the ciphertext components paired against the keys
// Gt carries the messages and the decryption terms
pub trait BilinearMap: Default {
    // underlying prime field element
    type Scalar: From<i32>
        + for<'a> Add<&'a Self::Scalar, Output = Self::Scalar>
        + for<'a> Sub<&'a Self::Scalar, Output = Self::Scalar>
        + Neg<Output = Self::Scalar>
        + for<'a> Mul<&'a Self::Scalar, Output = Self::Scalar>
        + Clone
        + PartialEq
        + std::fmt::Debug
        + AsBytes;

    // element of the group G1
    type G1: AsBytes + PartialEq + Clone + std::fmt::Debug;

    // element of the group G2
    type G2: AsBytes + PartialEq + Clone + std::fmt::Debug;

    // element of the group Gt
    type Gt: AsBytes + PartialEq + Clone + std::fmt::Debug;

    const ZERO: Self::Scalar;
    const ONE: Self::Scalar;

    fn description() -> String;

    //
    // Functions that must be implemented
    //
    // Scalar
    // generate a random scalar on the primary field
    fn gen_random_scalar<R: CryptoRng + RngCore>(
        &self,
        rng: &mut R,
    ) -> Result<Self::Scalar, FormatErr>;

    // generate a random element of Gt, used as a key-encapsulation payload
    fn gen_random_gt<R: CryptoRng + RngCore>(&self, rng: &mut R) -> Result<Self::Gt, FormatErr>;

    // compute 1/x, fails on zero
    fn scalar_invert(&self, x: &Self::Scalar) -> Result<Self::Scalar, FormatErr>;

    // Group
    // compute g1^x
    fn g1_gen_exp(&self, x: &Self::Scalar) -> Self::G1;

    // compute a^x where a \in G1
    fn g1_exp(&self, a: &Self::G1, x: &Self::Scalar) -> Self::G1;

    // compute a x b where a and b \in G1
    fn g1_mul(&self, a: &Self::G1, b: &Self::G1) -> Self::G1;

    // compute g2^x
    fn g2_gen_exp(&self, x: &Self::Scalar) -> Self::G2;

    // compute a^x where a \in G2
    fn g2_exp(&self, a: &Self::G2, x: &Self::Scalar) -> Self::G2;

    // hash arbitrary bytes to an element of G1 with unknown discrete log
    fn hash_to_g1(&self, msg: &[u8]) -> Result<Self::G1, FormatErr>;

    // compute e(a, b)
    fn pair(&self, a: &Self::G1, b: &Self::G2) -> Self::Gt;

    // compute Π e(a_i,b_i)^x_i where e is the pairing G1 x G2 -> Gt
    fn prod_gt_exp(&self, a_i: &[&Self::G1], b_i: &[&Self::G2], x_i: &[&Self::Scalar]) -> Self::Gt;

    // compute a^x where a \in Gt
    fn gt_exp(&self, a: &Self::Gt, x: &Self::Scalar) -> Self::Gt;

    // compute a x b where a and b \in Gt
    fn gt_mul(&self, a: &Self::Gt, b: &Self::Gt) -> Self::Gt;

    // compute a / b where a and b \in Gt
    fn gt_div(&self, a: &Self::Gt, b: &Self::Gt) -> Self::Gt;

    //
    // Derived functions
    //
    fn gen_random_scalar_vector<R: CryptoRng + RngCore>(
        &self,
        size: usize,
        rng: &mut R,
    ) -> Result<Vec<Self::Scalar>, FormatErr> {
        std::iter::repeat_with(|| self.gen_random_scalar(rng))
            .take(size)
            .collect()
    }

    // sample a scalar that is guaranteed to be invertible
    fn gen_random_invertible_scalar<R: CryptoRng + RngCore>(
        &self,
        rng: &mut R,
    ) -> Result<Self::Scalar, FormatErr> {
        loop {
            let x = self.gen_random_scalar(rng)?;
            if x != Self::ZERO {
                return Ok(x);
            }
        }
    }
}
