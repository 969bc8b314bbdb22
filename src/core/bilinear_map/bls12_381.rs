use core::ops::{Add, Deref, Mul, Neg, Sub};
use std::convert::TryInto;

use cosmian_bls12_381::{
    multi_miller_loop, pairing, G1Affine, G1Projective, G2Affine, G2Prepared, G2Projective, Gt,
};
use ff::Field;
use group::Group;
use rand::{CryptoRng, RngCore};
use bls12_381_plus::elliptic_curve::hash2curve::ExpandMsgXmd;

use super::BilinearMap;
use crate::{core::yllc::AsBytes, error::FormatErr};

// domain separation tag of the attribute hash
const HASH_TO_G1_DST: &[u8] = b"COSMIAN_PROXY_ABE_BLS12381G1_XMD:SHA3-256_SSWU_RO_";

const SCALAR_LEN: usize = 32;
const G1_LEN: usize = 48;
const G2_LEN: usize = 96;
// A serialized element on Gt is 576 bytes long (because p has 381 bits, so an
// element in Fp12 has 381*12 bits). The compressed element is 288 bytes long.
const GT_LEN: usize = 288;

#[derive(Default, Debug, PartialEq, Clone)]
pub struct Bls12_381;

#[derive(Clone, Debug)]
pub struct Scalar(cosmian_bls12_381::Scalar);

impl Deref for Scalar {
    type Target = cosmian_bls12_381::Scalar;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<'a> Add<&'a Scalar> for Scalar {
    type Output = Self;

    fn add(self, rhs: &'a Scalar) -> Self {
        Scalar(self.0 + rhs.0)
    }
}

impl<'a> Sub<&'a Scalar> for Scalar {
    type Output = Self;

    fn sub(self, rhs: &'a Scalar) -> Self {
        Scalar(self.0 - rhs.0)
    }
}

impl<'a> Mul<&'a Scalar> for Scalar {
    type Output = Self;

    fn mul(self, rhs: &'a Scalar) -> Self {
        Scalar(self.0 * rhs.0)
    }
}

impl Neg for Scalar {
    type Output = Self;

    fn neg(self) -> Self {
        Scalar(-self.0)
    }
}

impl From<i32> for Scalar {
    fn from(int: i32) -> Self {
        let scalar = cosmian_bls12_381::Scalar::from(u64::from(int.unsigned_abs()));
        if int < 0 {
            Scalar(-scalar)
        } else {
            Scalar(scalar)
        }
    }
}

impl PartialEq for Scalar {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

// Check the input is long enough and return the fixed size prefix
fn fixed_prefix<const N: usize>(bytes: &[u8], what: &str) -> Result<[u8; N], FormatErr> {
    if bytes.len() < N {
        return Err(FormatErr::InvalidSize(format!(
            "Invalid {what} element (size {}, expected size at least: {N} bytes long), unable \
             to deserialize this {what} element.",
            bytes.len(),
        )));
    }
    Ok(bytes[0..N].try_into()?)
}

impl AsBytes for Scalar {
    fn try_into_bytes(&self) -> Result<Vec<u8>, FormatErr> {
        Ok(self.to_bytes().to_vec())
    }

    fn try_from_bytes(bytes: &[u8]) -> Result<Self, FormatErr> {
        let inner =
            cosmian_bls12_381::Scalar::from_bytes(&fixed_prefix::<SCALAR_LEN>(bytes, "scalar")?);
        if inner.is_some().into() {
            Ok(Scalar(inner.unwrap()))
        } else {
            Err(FormatErr::Deserialization(
                "Failed deserializing scalar".to_string(),
            ))
        }
    }

    fn len_bytes(&self) -> usize {
        SCALAR_LEN
    }
}

impl AsBytes for G1Affine {
    fn try_into_bytes(&self) -> Result<Vec<u8>, FormatErr> {
        Ok(self.to_compressed().to_vec())
    }

    fn try_from_bytes(bytes: &[u8]) -> Result<Self, FormatErr> {
        let res = G1Affine::from_compressed(&fixed_prefix::<G1_LEN>(bytes, "G1")?);
        if res.is_none().into() {
            Err(FormatErr::Deserialization(
                "Error deserializing G1Affine".to_string(),
            ))
        } else {
            Ok(res.unwrap())
        }
    }

    fn len_bytes(&self) -> usize {
        G1_LEN
    }
}

impl AsBytes for G2Affine {
    fn try_into_bytes(&self) -> Result<Vec<u8>, FormatErr> {
        Ok(self.to_compressed().to_vec())
    }

    fn try_from_bytes(bytes: &[u8]) -> Result<Self, FormatErr> {
        let res = G2Affine::from_compressed(&fixed_prefix::<G2_LEN>(bytes, "G2")?);
        if res.is_none().into() {
            Err(FormatErr::Deserialization(
                "Error deserializing G2Affine".to_string(),
            ))
        } else {
            Ok(res.unwrap())
        }
    }

    fn len_bytes(&self) -> usize {
        G2_LEN
    }
}

impl AsBytes for Gt {
    // Gt serialization comes from the cosmian fork of bls12_381; the
    // deserialization checks the element belongs to the target group
    fn try_into_bytes(&self) -> Result<Vec<u8>, FormatErr> {
        Ok(self.to_compressed().to_vec())
    }

    fn try_from_bytes(bytes: &[u8]) -> Result<Self, FormatErr> {
        let res = Gt::from_compressed(&fixed_prefix::<GT_LEN>(bytes, "Gt")?);
        if res.is_none().into() {
            Err(FormatErr::Deserialization(
                "Error deserializing Gt".to_string(),
            ))
        } else {
            Ok(res.unwrap())
        }
    }

    fn len_bytes(&self) -> usize {
        GT_LEN
    }
}

// bilinear map: G1 x G2 -> Gt
// note that BilinearMap trait uses multiplicative notation whereas
// cosmian_bls12_381 groups are additive
impl BilinearMap for Bls12_381 {
    type G1 = G1Affine;
    type G2 = G2Affine;
    type Gt = Gt;
    type Scalar = Scalar;

    const ONE: Scalar = Scalar(cosmian_bls12_381::Scalar::one());
    const ZERO: Scalar = Scalar(cosmian_bls12_381::Scalar::zero());

    fn description() -> String {
        "BLS12-381".to_string()
    }

    fn gen_random_scalar<R: CryptoRng + RngCore>(&self, rng: &mut R) -> Result<Scalar, FormatErr> {
        Ok(Scalar(<cosmian_bls12_381::Scalar as Field>::random(rng)))
    }

    fn gen_random_gt<R: CryptoRng + RngCore>(&self, rng: &mut R) -> Result<Gt, FormatErr> {
        Ok(<cosmian_bls12_381::Gt as Group>::random(rng))
    }

    fn scalar_invert(&self, x: &Scalar) -> Result<Scalar, FormatErr> {
        let inv = x.0.invert();
        if inv.is_some().into() {
            Ok(Scalar(inv.unwrap()))
        } else {
            Err(FormatErr::NonInvertibleScalar)
        }
    }

    // compute g1^x
    fn g1_gen_exp(&self, x: &Scalar) -> G1Affine {
        G1Affine::from(G1Projective::generator() * x.0)
    }

    fn g1_exp(&self, a: &G1Affine, x: &Scalar) -> G1Affine {
        G1Affine::from(a * x.0)
    }

    fn g1_mul(&self, a: &G1Affine, b: &G1Affine) -> G1Affine {
        G1Affine::from(G1Projective::from(a) + b)
    }

    // compute g2^x
    fn g2_gen_exp(&self, x: &Scalar) -> G2Affine {
        G2Affine::from(G2Projective::generator() * x.0)
    }

    fn g2_exp(&self, a: &G2Affine, x: &Scalar) -> G2Affine {
        G2Affine::from(a * x.0)
    }

    // RFC 9380 hash to curve, moved to the backend curve through its
    // compressed encoding (both crates use the same format)
    fn hash_to_g1(&self, msg: &[u8]) -> Result<G1Affine, FormatErr> {
        let point = bls12_381_plus::G1Projective::hash::<ExpandMsgXmd<sha3::Sha3_256>>(
            msg,
            HASH_TO_G1_DST,
        );
        let bytes = bls12_381_plus::G1Affine::from(point).to_compressed();
        let res = G1Affine::from_compressed(&bytes);
        if res.is_some().into() {
            Ok(res.unwrap())
        } else {
            Err(FormatErr::InternalOperation(
                "hash to G1 gave an invalid point".to_string(),
            ))
        }
    }

    fn pair(&self, a: &G1Affine, b: &G2Affine) -> Gt {
        pairing(a, b)
    }

    // compute Π e(a_i,b_i)^x_i where e is the pairing G1 x G2 -> Gt
    // In bls12-381 this computation can be sped up using a multi Miller loop
    // and a single final exponentiation
    fn prod_gt_exp(&self, a_i: &[&G1Affine], b_i: &[&G2Affine], x_i: &[&Scalar]) -> Gt {
        // compute a_i^x_i
        let a_i_x_i = a_i
            .iter()
            .zip(x_i.iter())
            .map(|(ai, xi)| G1Affine::from(*ai * xi.0))
            .collect::<Vec<_>>();
        let b_i = b_i
            .iter()
            .map(|bi| G2Prepared::from(**bi))
            .collect::<Vec<_>>();
        // compute Π e(a_i^x_i, b_i) = Π e(a_i,b_i)^x_i
        let terms = a_i_x_i.iter().zip(b_i.iter()).collect::<Vec<_>>();
        multi_miller_loop(&terms).final_exponentiation()
    }

    // compute a^x where a \in Gt
    fn gt_exp(&self, a: &Gt, x: &Scalar) -> Gt {
        a * x.0
    }

    // compute a x b where a and b \in Gt
    fn gt_mul(&self, a: &Gt, b: &Gt) -> Gt {
        a + b
    }

    // compute a / b where a and b \in Gt
    fn gt_div(&self, a: &Gt, b: &Gt) -> Gt {
        a - b
    }
}

#[cfg(test)]
mod tests {
    use cosmian_bls12_381::{G1Affine, G2Affine, Gt};
    use rand_hc::Hc128Rng;
    use rand::SeedableRng;

    use crate::{
        core::{
            bilinear_map::bls12_381::{BilinearMap, Bls12_381, Scalar},
            yllc::AsBytes,
        },
        error::FormatErr,
    };

    #[test]
    fn scalar_as_bytes() -> Result<(), FormatErr> {
        let mut rng = Hc128Rng::from_entropy();
        let grp = Bls12_381;
        let scl = grp.gen_random_scalar(&mut rng)?;
        let scl_2 = Scalar::try_from_bytes(&scl.try_into_bytes()?)?;
        assert_eq!(scl, scl_2);
        Ok(())
    }

    #[test]
    fn group_elements_as_bytes() -> Result<(), FormatErr> {
        let mut rng = Hc128Rng::from_entropy();
        let grp = Bls12_381;
        let g1 = grp.g1_gen_exp(&grp.gen_random_scalar(&mut rng)?);
        assert_eq!(g1, G1Affine::try_from_bytes(&g1.try_into_bytes()?)?);
        let g2 = grp.g2_gen_exp(&grp.gen_random_scalar(&mut rng)?);
        assert_eq!(g2, G2Affine::try_from_bytes(&g2.try_into_bytes()?)?);
        let gt = grp.gen_random_gt(&mut rng)?;
        assert_eq!(gt, Gt::try_from_bytes(&gt.try_into_bytes()?)?);
        assert!(G1Affine::try_from_bytes(&[0_u8; 12]).is_err());
        Ok(())
    }

    #[test]
    fn negative_scalars() {
        assert_eq!(Scalar::from(-3) + &Scalar::from(3), Bls12_381::ZERO);
        assert_eq!(Scalar::from(-1) * &Scalar::from(-1), Bls12_381::ONE);
    }

    #[test]
    fn inversion() -> Result<(), FormatErr> {
        let mut rng = Hc128Rng::from_entropy();
        let grp = Bls12_381;
        let x = grp.gen_random_invertible_scalar(&mut rng)?;
        assert_eq!(x.clone() * &grp.scalar_invert(&x)?, Bls12_381::ONE);
        assert_eq!(
            grp.scalar_invert(&Bls12_381::ZERO),
            Err(FormatErr::NonInvertibleScalar)
        );
        Ok(())
    }

    #[test]
    fn hash_to_g1_is_deterministic_and_in_subgroup() -> Result<(), FormatErr> {
        let grp = Bls12_381;
        let a1 = grp.hash_to_g1(b"DOCTOR")?;
        let a2 = grp.hash_to_g1(b"DOCTOR")?;
        let b = grp.hash_to_g1(b"NURSE")?;
        assert_eq!(a1, a2);
        assert_ne!(a1, b);
        assert!(bool::from(a1.is_torsion_free()));
        assert!(!bool::from(a1.is_identity()));
        // the compressed form is accepted by the checked decoder
        assert_eq!(a1, G1Affine::try_from_bytes(&a1.try_into_bytes()?)?);
        Ok(())
    }

    #[test]
    fn bilinearity() -> Result<(), FormatErr> {
        let mut rng = Hc128Rng::from_entropy();
        let grp = Bls12_381;
        let a = grp.gen_random_scalar(&mut rng)?;
        let b = grp.gen_random_scalar(&mut rng)?;
        let lhs = grp.pair(&grp.g1_gen_exp(&a), &grp.g2_gen_exp(&b));
        let rhs = grp.gt_exp(
            &grp.pair(&grp.g1_gen_exp(&Bls12_381::ONE), &grp.g2_gen_exp(&Bls12_381::ONE)),
            &(a.clone() * &b),
        );
        assert_eq!(lhs, rhs);

        // Π e(a_i,b_i)^x_i matches the naive product
        let p = grp.g1_gen_exp(&a);
        let q = grp.g2_gen_exp(&b);
        let x = grp.gen_random_scalar(&mut rng)?;
        let y = grp.gen_random_scalar(&mut rng)?;
        let naive = grp.gt_mul(
            &grp.gt_exp(&grp.pair(&p, &q), &x),
            &grp.gt_exp(&grp.pair(&p, &q), &y),
        );
        assert_eq!(naive, grp.prod_gt_exp(&[&p, &p], &[&q, &q], &[&x, &y]));
        Ok(())
    }
}
