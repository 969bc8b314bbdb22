use std::convert::TryFrom;

use rand::SeedableRng;
use rand_hc::Hc128Rng;
use sha3::{
    digest::{ExtendableOutput, Update, XofReader},
    Shake256,
};
use tracing::debug;

use crate::{
    core::{
        bilinear_map::BilinearMap,
        config::EngineConfig,
        policy::AccessPolicy,
        secret_sharing::{SecretSharing, SharingStrategy},
        yllc::{
            AsBytes, Ciphertext, IntermediateValue, MasterSecret, ProxyTransformationKey,
            PublicParameters, UserKeyPair, UserPublicKey, UserSecretKey, Yllc,
        },
    },
    error::FormatErr,
};

/// The engine is the main entry point for the core ABE functionalities.
/// It supplies a simple API that lets the authority generate keys, the data
/// owner encrypt under string policies, the proxy transform cipher texts and
/// the user finish the decryption.
///
/// In addition, two methods are supplied to generate random symmetric keys and
/// their corresponding cipher texts which are suitable for use in a hybrid
/// encryption scheme.
#[derive(Debug, Clone)]
pub struct Engine<G: BilinearMap, S: SecretSharing<G> = SharingStrategy> {
    sch: Yllc<G>,
    sharing: S,
}

impl<G: BilinearMap> Default for Engine<G, SharingStrategy> {
    fn default() -> Self {
        Self::new(&EngineConfig::default())
    }
}

impl<G: BilinearMap> TryFrom<&[u8]> for Engine<G, SharingStrategy> {
    type Error = FormatErr;

    fn try_from(config: &[u8]) -> Result<Self, Self::Error> {
        Ok(Self::new(&EngineConfig::try_from(config)?))
    }
}

impl<G: BilinearMap> Engine<G, SharingStrategy> {
    /// Instantiate a new engine using the configured secret sharing
    #[must_use]
    pub fn new(config: &EngineConfig) -> Self {
        Self::with_sharing(config.strategy)
    }
}

impl<G: BilinearMap, S: SecretSharing<G>> Engine<G, S> {
    #[must_use]
    pub fn with_sharing(sharing: S) -> Self {
        Self {
            sch: Yllc::default(),
            sharing,
        }
    }

    #[must_use]
    pub fn description(&self) -> String {
        format!(
            "{} with {}",
            Yllc::<G>::description(),
            self.sharing.description()
        )
    }

    /// Generate the public parameters and the master secret
    pub fn setup(&self) -> Result<(PublicParameters<G>, MasterSecret<G>), FormatErr> {
        self.sch.setup(&mut Hc128Rng::from_entropy())
    }

    /// Generate a key pair for a user or for the proxy
    pub fn user_key_gen(&self, params: &PublicParameters<G>) -> Result<UserKeyPair<G>, FormatErr> {
        self.sch.user_key_gen(params, &mut Hc128Rng::from_entropy())
    }

    /// Issue the transformation key of `user_pk` for the given attributes
    pub fn proxy_key_gen(
        &self,
        params: &PublicParameters<G>,
        msk: &MasterSecret<G>,
        proxy_pk: &UserPublicKey<G>,
        user_pk: &UserPublicKey<G>,
        attributes: &[&str],
    ) -> Result<ProxyTransformationKey<G>, FormatErr> {
        self.sch.proxy_key_gen(
            params,
            msk,
            proxy_pk,
            user_pk,
            attributes,
            &mut Hc128Rng::from_entropy(),
        )
    }

    /// Generate a random point on Gt
    pub fn random_message(&self) -> Result<G::Gt, FormatErr> {
        self.sch
            .generate_random_plaintext(&mut Hc128Rng::from_entropy())
    }

    /// Encrypt a plain text (a point on Gt) under the boolean expression
    /// `policy`, e.g. `"(DOCTOR and CARDIOLOGY) or ADMIN"`
    pub fn encrypt(
        &self,
        params: &PublicParameters<G>,
        plain_text: &G::Gt,
        policy: &str,
    ) -> Result<Ciphertext<G>, FormatErr> {
        let policy = AccessPolicy::parse(policy)?;
        self.sch.encrypt(
            &self.sharing,
            params,
            plain_text,
            &policy,
            &mut Hc128Rng::from_entropy(),
        )
    }

    /// Proxy side of the decryption, `None` when the key does not satisfy
    /// the policy
    pub fn proxy_decrypt(
        &self,
        params: &PublicParameters<G>,
        proxy_sk: &UserSecretKey<G>,
        key: &ProxyTransformationKey<G>,
        ct: &Ciphertext<G>,
    ) -> Result<Option<IntermediateValue<G>>, FormatErr> {
        self.sch
            .proxy_decrypt(&self.sharing, params, proxy_sk, key, ct)
    }

    /// User side of the decryption, returning the point on Gt
    pub fn decrypt(
        &self,
        params: &PublicParameters<G>,
        user_sk: &UserSecretKey<G>,
        iv: &IntermediateValue<G>,
    ) -> Result<G::Gt, FormatErr> {
        self.sch.decrypt(params, user_sk, iv)
    }

    /// Generate a random symmetric key of `symmetric_key_len` bytes to be
    /// used in a hybrid encryption scheme and its ABE encrypted version
    /// under `policy`
    pub fn generate_symmetric_key(
        &self,
        params: &PublicParameters<G>,
        policy: &str,
        symmetric_key_len: usize,
    ) -> Result<(Vec<u8>, Vec<u8>), FormatErr> {
        let random = self.random_message()?;
        let sym_key = derive_symmetric_key(&random.try_into_bytes()?, symmetric_key_len);
        let enc_sym_key = self.encrypt(params, &random, policy)?.try_into_bytes()?;
        debug!(
            "symmetric key of {symmetric_key_len} bytes encapsulated in {} bytes",
            enc_sym_key.len()
        );
        Ok((sym_key, enc_sym_key))
    }

    /// Decrypt a symmetric key generated with `generate_symmetric_key()`,
    /// running both the proxy and the user decryption. Returns `None` when
    /// the transformation key does not satisfy the policy.
    pub fn decrypt_symmetric_key(
        &self,
        params: &PublicParameters<G>,
        proxy_sk: &UserSecretKey<G>,
        key: &ProxyTransformationKey<G>,
        user_sk: &UserSecretKey<G>,
        encrypted_symmetric_key: &[u8],
        symmetric_key_len: usize,
    ) -> Result<Option<Vec<u8>>, FormatErr> {
        let ct = Ciphertext::try_from_bytes(encrypted_symmetric_key)?;
        let iv = match self.proxy_decrypt(params, proxy_sk, key, &ct)? {
            Some(iv) => iv,
            None => return Ok(None),
        };
        let random = self.decrypt(params, user_sk, &iv)?;
        Ok(Some(derive_symmetric_key(
            &random.try_into_bytes()?,
            symmetric_key_len,
        )))
    }
}

// Use a hash of the plaintext bytes as the symmetric key
fn derive_symmetric_key(plaintext: &[u8], symmetric_key_len: usize) -> Vec<u8> {
    Shake256::default()
        .chain(plaintext)
        .finalize_xof()
        .read_boxed(symmetric_key_len)
        .into_vec()
}
