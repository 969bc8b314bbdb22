use std::convert::TryFrom;

use crate::{
    core::{
        bilinear_map::bls12_381::Bls12_381, config::EngineConfig,
        secret_sharing::SharingStrategy, Engine,
    },
    error::FormatErr,
};

#[test]
pub fn symmetric_key_test() -> Result<(), FormatErr> {
    for strategy in &[SharingStrategy::ThresholdTree, SharingStrategy::SpanProgram] {
        let engine = Engine::<Bls12_381>::new(&EngineConfig::new(*strategy));
        let (params, msk) = engine.setup()?;
        let proxy = engine.user_key_gen(&params)?;
        let user = engine.user_key_gen(&params)?;
        let key = engine.proxy_key_gen(
            &params,
            &msk,
            proxy.public_key(),
            user.public_key(),
            &["Department::FIN", "Security_Level::Confidential"],
        )?;

        let (symmetric_key, encrypted_symmetric_key) = engine.generate_symmetric_key(
            &params,
            "Department::FIN and (Security_Level::Confidential or Security_Level::Secret)",
            32,
        )?;
        assert_eq!(32, symmetric_key.len());

        let symmetric_key_ = engine
            .decrypt_symmetric_key(
                &params,
                proxy.secret_key(),
                &key,
                user.secret_key(),
                &encrypted_symmetric_key,
                32,
            )?
            .expect("the key satisfies the policy");
        assert_eq!(&symmetric_key, &symmetric_key_);

        // not enough attributes
        let (_, encrypted_symmetric_key) =
            engine.generate_symmetric_key(&params, "Department::FIN and Department::HR", 32)?;
        assert_eq!(
            engine.decrypt_symmetric_key(
                &params,
                proxy.secret_key(),
                &key,
                user.secret_key(),
                &encrypted_symmetric_key,
                32,
            )?,
            None
        );
    }
    Ok(())
}

#[test]
pub fn engine_from_json() -> Result<(), FormatErr> {
    let engine = Engine::<Bls12_381>::try_from(&br#"{"strategy": "span_program"}"#[..])?;
    assert!(engine.description().contains("monotone span program"));
    let engine = Engine::<Bls12_381>::default();
    assert!(engine.description().contains("threshold tree"));
    assert!(Engine::<Bls12_381>::try_from(&b"not json"[..]).is_err());
    Ok(())
}

#[test]
pub fn invalid_policy_is_rejected() -> Result<(), FormatErr> {
    let engine = Engine::<Bls12_381>::default();
    let (params, _) = engine.setup()?;
    let msg = engine.random_message()?;
    assert!(engine.encrypt(&params, &msg, "A and (B or").is_err());
    assert!(engine.encrypt(&params, &msg, "").is_err());
    assert!(engine.encrypt(&params, &msg, "0 of (A)").is_err());
    Ok(())
}
