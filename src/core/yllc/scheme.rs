use std::{
    collections::{BTreeMap, BTreeSet},
    convert::TryFrom,
    fmt::Display,
};

use rand::{CryptoRng, RngCore};
use tracing::{debug, trace};

use crate::{
    core::{
        bilinear_map::BilinearMap,
        policy::{AccessPolicy, LeafId},
        secret_sharing::SecretSharing,
        yllc::{concat_bytes, AsBytes, BytesReader},
    },
    error::FormatErr,
};

// Public Parameters
// g, f = g^(1/β) in G1; g2, h = g2^β in G2; e(g, g2)^α in Gt
#[derive(Debug, Clone, PartialEq)]
pub struct PublicParameters<G: BilinearMap> {
    pub(crate) g: G::G1,
    pub(crate) g2: G::G2,
    pub(crate) h: G::G2,
    pub(crate) f: G::G1,
    pub(crate) e_gg_alpha: G::Gt,
}

// Master Secret, only known to the authority
#[derive(Debug, Clone, PartialEq)]
pub struct MasterSecret<G: BilinearMap> {
    pub(crate) alpha: G::Scalar,
    pub(crate) beta: G::Scalar,
}

/// `g^x` for the secret scalar `x` of a user or of the proxy
#[derive(Debug, Clone, PartialEq)]
pub struct UserPublicKey<G: BilinearMap>(pub(crate) G::G1);

#[derive(Debug, Clone, PartialEq)]
pub struct UserSecretKey<G: BilinearMap>(pub(crate) G::Scalar);

/// Key pair of an end user. The proxy holds a pair of the same kind.
#[derive(Debug, Clone, PartialEq)]
pub struct UserKeyPair<G: BilinearMap> {
    pub(crate) public_key: UserPublicKey<G>,
    pub(crate) secret_key: UserSecretKey<G>,
}

impl<G: BilinearMap> UserKeyPair<G> {
    #[must_use]
    pub fn public_key(&self) -> &UserPublicKey<G> {
        &self.public_key
    }

    #[must_use]
    pub fn secret_key(&self) -> &UserSecretKey<G> {
        &self.secret_key
    }
}

// Per attribute part of a transformation key:
// k_1 = g^r2 * H(attr)^r_attr, k_2 = g2^r_attr
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeKey<G: BilinearMap> {
    pub(crate) k_1: G::G1,
    pub(crate) k_2: G::G2,
}

/// Key handed to the proxy for one user and one attribute set.
///
/// `k = (pk_proxy^r1 * pk_user^α * g^r2)^(1/β)` and `k' = g^r1`. It is
/// useless without the proxy secret, and its output is useless without the
/// user secret: withdrawing it revokes the user.
#[derive(Debug, Clone, PartialEq)]
pub struct ProxyTransformationKey<G: BilinearMap> {
    pub(crate) k: G::G1,
    pub(crate) k_prime: G::G1,
    pub(crate) attributes: BTreeMap<String, AttributeKey<G>>,
}

impl<G: BilinearMap> ProxyTransformationKey<G> {
    /// Attributes this key was issued for
    #[must_use]
    pub fn attributes(&self) -> BTreeSet<String> {
        self.attributes.keys().cloned().collect()
    }
}

// Per leaf part of a cipher text:
// c_1 = g2^λ, c_2 = H(attr)^λ where λ is the share of the leaf
#[derive(Debug, Clone, PartialEq)]
pub struct CiphertextComponent<G: BilinearMap> {
    pub(crate) c_1: G::G2,
    pub(crate) c_2: G::G1,
}

// Cipher text
// c = m * e(g, g2)^(αs), c' = h^s, c'' = g2^s
#[derive(Debug, Clone, PartialEq)]
pub struct Ciphertext<G: BilinearMap> {
    pub(crate) policy: AccessPolicy,
    pub(crate) c: G::Gt,
    pub(crate) c_prime: G::G2,
    pub(crate) c_prime_prime: G::G2,
    pub(crate) components: BTreeMap<LeafId, CiphertextComponent<G>>,
}

impl<G: BilinearMap> Ciphertext<G> {
    #[must_use]
    pub fn policy(&self) -> &AccessPolicy {
        &self.policy
    }
}

/// Output of the proxy: the masked message and `e(g, g2)^(x α s)` where `x`
/// is the user secret.
#[derive(Debug, Clone, PartialEq)]
pub struct IntermediateValue<G: BilinearMap> {
    pub(crate) c: G::Gt,
    pub(crate) e_term: G::Gt,
}

macro_rules! impl_hex_display {
    ($($name:ident),+) => {
        $(
            impl<G: BilinearMap> Display for $name<G> {
                fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                    if let Ok(bytes) = self.try_into_bytes() {
                        write!(f, "{}", hex::encode(bytes))
                    } else {
                        write!(f, "Invalid input")
                    }
                }
            }
        )+
    };
}

impl_hex_display!(
    PublicParameters,
    MasterSecret,
    UserPublicKey,
    UserKeyPair,
    ProxyTransformationKey,
    Ciphertext,
    IntermediateValue
);

impl<G: BilinearMap> AsBytes for PublicParameters<G> {
    fn try_into_bytes(&self) -> Result<Vec<u8>, FormatErr> {
        concat_bytes(&[&self.g, &self.g2, &self.h, &self.f, &self.e_gg_alpha])
    }

    fn try_from_bytes(bytes: &[u8]) -> Result<Self, FormatErr> {
        let mut reader = BytesReader::new(bytes);
        let res = Self {
            g: reader.read()?,
            g2: reader.read()?,
            h: reader.read()?,
            f: reader.read()?,
            e_gg_alpha: reader.read()?,
        };
        reader.finish()?;
        Ok(res)
    }

    fn len_bytes(&self) -> usize {
        self.g.len_bytes()
            + self.g2.len_bytes()
            + self.h.len_bytes()
            + self.f.len_bytes()
            + self.e_gg_alpha.len_bytes()
    }
}

impl<G: BilinearMap> AsBytes for MasterSecret<G> {
    fn try_into_bytes(&self) -> Result<Vec<u8>, FormatErr> {
        concat_bytes(&[&self.alpha, &self.beta])
    }

    fn try_from_bytes(bytes: &[u8]) -> Result<Self, FormatErr> {
        let mut reader = BytesReader::new(bytes);
        let res = Self {
            alpha: reader.read()?,
            beta: reader.read()?,
        };
        reader.finish()?;
        Ok(res)
    }

    fn len_bytes(&self) -> usize {
        self.alpha.len_bytes() + self.beta.len_bytes()
    }
}

impl<G: BilinearMap> AsBytes for UserPublicKey<G> {
    fn try_into_bytes(&self) -> Result<Vec<u8>, FormatErr> {
        self.0.try_into_bytes()
    }

    fn try_from_bytes(bytes: &[u8]) -> Result<Self, FormatErr> {
        let mut reader = BytesReader::new(bytes);
        let res = Self(reader.read()?);
        reader.finish()?;
        Ok(res)
    }

    fn len_bytes(&self) -> usize {
        self.0.len_bytes()
    }
}

impl<G: BilinearMap> AsBytes for UserSecretKey<G> {
    fn try_into_bytes(&self) -> Result<Vec<u8>, FormatErr> {
        self.0.try_into_bytes()
    }

    fn try_from_bytes(bytes: &[u8]) -> Result<Self, FormatErr> {
        let mut reader = BytesReader::new(bytes);
        let res = Self(reader.read()?);
        reader.finish()?;
        Ok(res)
    }

    fn len_bytes(&self) -> usize {
        self.0.len_bytes()
    }
}

impl<G: BilinearMap> AsBytes for UserKeyPair<G> {
    fn try_into_bytes(&self) -> Result<Vec<u8>, FormatErr> {
        concat_bytes(&[&self.public_key, &self.secret_key])
    }

    fn try_from_bytes(bytes: &[u8]) -> Result<Self, FormatErr> {
        let mut reader = BytesReader::new(bytes);
        let res = Self {
            public_key: UserPublicKey(reader.read()?),
            secret_key: UserSecretKey(reader.read()?),
        };
        reader.finish()?;
        Ok(res)
    }

    fn len_bytes(&self) -> usize {
        self.public_key.len_bytes() + self.secret_key.len_bytes()
    }
}

impl<G: BilinearMap> AsBytes for ProxyTransformationKey<G> {
    fn try_into_bytes(&self) -> Result<Vec<u8>, FormatErr> {
        let mut res = concat_bytes(&[
            &self.k,
            &self.k_prime,
            &u32::try_from(self.attributes.len())?,
        ])?;
        for (attribute, key) in &self.attributes {
            res.append(&mut concat_bytes(&[attribute, &key.k_1, &key.k_2])?);
        }
        Ok(res)
    }

    fn try_from_bytes(bytes: &[u8]) -> Result<Self, FormatErr> {
        let mut reader = BytesReader::new(bytes);
        let k = reader.read()?;
        let k_prime = reader.read()?;
        let nb_attributes = reader.read::<u32>()?;
        let mut attributes = BTreeMap::new();
        for _ in 0..nb_attributes {
            let attribute = reader.read::<String>()?;
            let key = AttributeKey {
                k_1: reader.read()?,
                k_2: reader.read()?,
            };
            if attributes.insert(attribute.clone(), key).is_some() {
                return Err(FormatErr::Deserialization(format!(
                    "attribute {attribute} appears twice in the transformation key"
                )));
            }
        }
        reader.finish()?;
        Ok(Self {
            k,
            k_prime,
            attributes,
        })
    }

    fn len_bytes(&self) -> usize {
        self.k.len_bytes()
            + self.k_prime.len_bytes()
            + 4
            + self
                .attributes
                .iter()
                .map(|(attribute, key)| {
                    attribute.len_bytes() + key.k_1.len_bytes() + key.k_2.len_bytes()
                })
                .sum::<usize>()
    }
}

impl<G: BilinearMap> AsBytes for Ciphertext<G> {
    fn try_into_bytes(&self) -> Result<Vec<u8>, FormatErr> {
        let mut res = concat_bytes(&[
            &self.policy.to_string(),
            &self.c,
            &self.c_prime,
            &self.c_prime_prime,
            &u32::try_from(self.components.len())?,
        ])?;
        for (leaf, component) in &self.components {
            res.append(&mut concat_bytes(&[
                &leaf.attribute().to_string(),
                &leaf.occurrence(),
                &component.c_1,
                &component.c_2,
            ])?);
        }
        Ok(res)
    }

    fn try_from_bytes(bytes: &[u8]) -> Result<Self, FormatErr> {
        let mut reader = BytesReader::new(bytes);
        let policy = AccessPolicy::parse(&reader.read::<String>()?)?;
        let c = reader.read()?;
        let c_prime = reader.read()?;
        let c_prime_prime = reader.read()?;
        let nb_components = reader.read::<u32>()?;
        let mut components = BTreeMap::new();
        for _ in 0..nb_components {
            let attribute = reader.read::<String>()?;
            let occurrence = reader.read::<u32>()?;
            let component = CiphertextComponent {
                c_1: reader.read()?,
                c_2: reader.read()?,
            };
            components.insert(LeafId::new(&attribute, occurrence), component);
        }
        reader.finish()?;
        // one component per leaf of the policy, no more
        let leaves = policy.leaves().into_iter().collect::<BTreeSet<_>>();
        if leaves.len() != components.len() || !leaves.iter().all(|l| components.contains_key(l))
        {
            return Err(FormatErr::InvalidEncryptedData(format!(
                "the cipher text components do not match the leaves of {policy}"
            )));
        }
        Ok(Self {
            policy,
            c,
            c_prime,
            c_prime_prime,
            components,
        })
    }

    fn len_bytes(&self) -> usize {
        self.policy.to_string().len_bytes()
            + self.c.len_bytes()
            + self.c_prime.len_bytes()
            + self.c_prime_prime.len_bytes()
            + 4
            + self
                .components
                .iter()
                .map(|(leaf, component)| {
                    4 + leaf.attribute().len()
                        + 4
                        + component.c_1.len_bytes()
                        + component.c_2.len_bytes()
                })
                .sum::<usize>()
    }
}

impl<G: BilinearMap> AsBytes for IntermediateValue<G> {
    fn try_into_bytes(&self) -> Result<Vec<u8>, FormatErr> {
        concat_bytes(&[&self.c, &self.e_term])
    }

    fn try_from_bytes(bytes: &[u8]) -> Result<Self, FormatErr> {
        let mut reader = BytesReader::new(bytes);
        let res = Self {
            c: reader.read()?,
            e_term: reader.read()?,
        };
        reader.finish()?;
        Ok(res)
    }

    fn len_bytes(&self) -> usize {
        self.c.len_bytes() + self.e_term.len_bytes()
    }
}

/// Ciphertext-policy ABE with proxy assisted decryption
/// (Yang, Lai, Liu, Chen - 2015) on an asymmetric pairing.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Yllc<G: BilinearMap> {
    pub(crate) group: G,
}

impl<G: BilinearMap> Yllc<G> {
    #[must_use]
    pub fn new(group: G) -> Self {
        Self { group }
    }

    #[must_use]
    pub fn description() -> String {
        format!("YLLC15 proxy CP-ABE on {}", G::description())
    }

    /// Generate a random message, a point of Gt
    pub fn generate_random_plaintext<R: CryptoRng + RngCore>(
        &self,
        rng: &mut R,
    ) -> Result<G::Gt, FormatErr> {
        self.group.gen_random_gt(rng)
    }

    /// Generate the public parameters and the master secret of the authority
    pub fn setup<R: CryptoRng + RngCore>(
        &self,
        rng: &mut R,
    ) -> Result<(PublicParameters<G>, MasterSecret<G>), FormatErr> {
        let alpha = self.group.gen_random_scalar(rng)?;
        let beta = self.group.gen_random_invertible_scalar(rng)?;
        // random generators of G1 and G2
        let g = self
            .group
            .g1_gen_exp(&self.group.gen_random_invertible_scalar(rng)?);
        let g2 = self
            .group
            .g2_gen_exp(&self.group.gen_random_invertible_scalar(rng)?);
        let h = self.group.g2_exp(&g2, &beta);
        let f = self.group.g1_exp(&g, &self.group.scalar_invert(&beta)?);
        let e_gg_alpha = self.group.gt_exp(&self.group.pair(&g, &g2), &alpha);
        debug!("setup on {}", G::description());
        Ok((
            PublicParameters {
                g,
                g2,
                h,
                f,
                e_gg_alpha,
            },
            MasterSecret { alpha, beta },
        ))
    }

    /// Generate the pair `(g^x, x)` of a user or of the proxy
    pub fn user_key_gen<R: CryptoRng + RngCore>(
        &self,
        params: &PublicParameters<G>,
        rng: &mut R,
    ) -> Result<UserKeyPair<G>, FormatErr> {
        let x = self.group.gen_random_invertible_scalar(rng)?;
        Ok(UserKeyPair {
            public_key: UserPublicKey(self.group.g1_exp(&params.g, &x)),
            secret_key: UserSecretKey(x),
        })
    }

    /// Issue the transformation key binding `user_pk` and the given
    /// attributes to the proxy owning `proxy_pk`. An empty attribute set is
    /// valid and yields a key satisfying no policy.
    pub fn proxy_key_gen<R, I>(
        &self,
        params: &PublicParameters<G>,
        msk: &MasterSecret<G>,
        proxy_pk: &UserPublicKey<G>,
        user_pk: &UserPublicKey<G>,
        attributes: I,
        rng: &mut R,
    ) -> Result<ProxyTransformationKey<G>, FormatErr>
    where
        R: CryptoRng + RngCore,
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let r1 = self.group.gen_random_scalar(rng)?;
        let r2 = self.group.gen_random_scalar(rng)?;
        let inv_beta = self.group.scalar_invert(&msk.beta)?;
        // k = (pk_proxy^r1 * pk_user^α * g^r2)^(1/β)
        let k = self.group.g1_exp(
            &self.group.g1_mul(
                &self.group.g1_mul(
                    &self.group.g1_exp(&proxy_pk.0, &r1),
                    &self.group.g1_exp(&user_pk.0, &msk.alpha),
                ),
                &self.group.g1_exp(&params.g, &r2),
            ),
            &inv_beta,
        );
        let k_prime = self.group.g1_exp(&params.g, &r1);
        let g_r2 = self.group.g1_exp(&params.g, &r2);

        let mut attribute_keys = BTreeMap::new();
        for attribute in attributes {
            let attribute = attribute.as_ref();
            if attribute_keys.contains_key(attribute) {
                continue;
            }
            let r_attr = self.group.gen_random_scalar(rng)?;
            let hash = self.group.hash_to_g1(attribute.as_bytes())?;
            attribute_keys.insert(
                attribute.to_string(),
                AttributeKey {
                    k_1: self.group.g1_mul(&g_r2, &self.group.g1_exp(&hash, &r_attr)),
                    k_2: self.group.g2_exp(&params.g2, &r_attr),
                },
            );
        }
        debug!(
            "transformation key issued for {} attributes",
            attribute_keys.len()
        );
        Ok(ProxyTransformationKey {
            k,
            k_prime,
            attributes: attribute_keys,
        })
    }

    /// Encrypt the message `msg` (a point of Gt) under the access `policy`
    pub fn encrypt<S, R>(
        &self,
        sharing: &S,
        params: &PublicParameters<G>,
        msg: &G::Gt,
        policy: &AccessPolicy,
        rng: &mut R,
    ) -> Result<Ciphertext<G>, FormatErr>
    where
        S: SecretSharing<G>,
        R: CryptoRng + RngCore,
    {
        let s = self.group.gen_random_scalar(rng)?;
        let shares = sharing.share(&self.group, policy, &s, rng)?;

        let c = self
            .group
            .gt_mul(msg, &self.group.gt_exp(&params.e_gg_alpha, &s));
        let c_prime = self.group.g2_exp(&params.h, &s);
        let c_prime_prime = self.group.g2_exp(&params.g2, &s);

        // hash each attribute once, however many times it appears
        let mut hashes = BTreeMap::new();
        for attribute in policy.attributes() {
            let hash = self.group.hash_to_g1(attribute.as_bytes())?;
            hashes.insert(attribute, hash);
        }
        let mut components = BTreeMap::new();
        for (leaf, lambda) in shares {
            let hash = hashes.get(leaf.attribute()).ok_or_else(|| {
                FormatErr::AttributeNotFound(format!("{leaf} is not a leaf of {policy}"))
            })?;
            components.insert(
                leaf,
                CiphertextComponent {
                    c_1: self.group.g2_exp(&params.g2, &lambda),
                    c_2: self.group.g1_exp(hash, &lambda),
                },
            );
        }
        debug!(
            "encrypted under '{policy}' with {} leaf components using {}",
            components.len(),
            sharing.description()
        );
        Ok(Ciphertext {
            policy: policy.clone(),
            c,
            c_prime,
            c_prime_prime,
            components,
        })
    }

    /// Transform a cipher text into an intermediate value only the user
    /// bound to `key` can open. Returns `None` when the key attributes do not
    /// satisfy the cipher text policy.
    pub fn proxy_decrypt<S: SecretSharing<G>>(
        &self,
        sharing: &S,
        _params: &PublicParameters<G>,
        proxy_sk: &UserSecretKey<G>,
        key: &ProxyTransformationKey<G>,
        ct: &Ciphertext<G>,
    ) -> Result<Option<IntermediateValue<G>>, FormatErr> {
        let coefficients =
            match sharing.coefficients(&self.group, &ct.policy, &key.attributes())? {
                Some(coefficients) => coefficients,
                None => {
                    debug!("proxy decryption: policy '{}' not satisfied", ct.policy);
                    return Ok(None);
                }
            };

        let mut k_1 = Vec::with_capacity(coefficients.len());
        let mut k_2 = Vec::with_capacity(coefficients.len());
        let mut c_1 = Vec::with_capacity(coefficients.len());
        let mut c_2 = Vec::with_capacity(coefficients.len());
        let mut coefs = Vec::with_capacity(coefficients.len());
        for (leaf, coef) in &coefficients {
            let attribute_key = match key.attributes.get(leaf.attribute()) {
                Some(attribute_key) => attribute_key,
                None => {
                    debug!("proxy decryption: no key for {leaf}");
                    return Ok(None);
                }
            };
            let component = ct.components.get(leaf).ok_or_else(|| {
                FormatErr::InvalidEncryptedData(format!("missing component for leaf {leaf}"))
            })?;
            trace!("proxy decryption: using leaf {leaf}");
            k_1.push(&attribute_key.k_1);
            k_2.push(&attribute_key.k_2);
            c_1.push(&component.c_1);
            c_2.push(&component.c_2);
            coefs.push(coef);
        }

        // A = Π (e(k_1, c_1) / e(c_2, k_2))^coef = e(g, g2)^(r2 s)
        let a = self.group.gt_div(
            &self.group.prod_gt_exp(&k_1, &c_1, &coefs),
            &self.group.prod_gt_exp(&c_2, &k_2, &coefs),
        );
        // e(k, c') / (e(k', c'')^x_proxy * A) = e(g, g2)^(x_user α s)
        let denominator = self.group.gt_mul(
            &self.group.gt_exp(
                &self.group.pair(&key.k_prime, &ct.c_prime_prime),
                &proxy_sk.0,
            ),
            &a,
        );
        let e_term = self
            .group
            .gt_div(&self.group.pair(&key.k, &ct.c_prime), &denominator);
        debug!(
            "proxy decryption: policy '{}' satisfied with {} leaves",
            ct.policy,
            coefs.len()
        );
        Ok(Some(IntermediateValue {
            c: ct.c.clone(),
            e_term,
        }))
    }

    /// Recover the message from the proxy output: `c / e_term^(1/x)`
    pub fn decrypt(
        &self,
        _params: &PublicParameters<G>,
        user_sk: &UserSecretKey<G>,
        iv: &IntermediateValue<G>,
    ) -> Result<G::Gt, FormatErr> {
        let inv_x = self.group.scalar_invert(&user_sk.0)?;
        Ok(self
            .group
            .gt_div(&iv.c, &self.group.gt_exp(&iv.e_term, &inv_x)))
    }
}
