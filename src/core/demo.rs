use std::collections::HashMap;

use crate::{
    core::{
        bilinear_map::bls12_381::Bls12_381, config::EngineConfig, engine::Engine,
        secret_sharing::SharingStrategy, yllc::AsBytes,
    },
    error::FormatErr,
};

/// # Encryption using an Access Policy, decryption through a proxy
/// This test demonstrates how data can be encrypted under a boolean policy
/// over attributes, how a semi trusted proxy performs the heavy part of the
/// decryption and how a user is revoked without re-encrypting anything.
#[test]
fn proxy_abe() -> Result<(), FormatErr> {
    // ## Authority
    // The authority generates the public parameters, shared with everyone,
    // and the master secret used to issue transformation keys.
    let engine = Engine::<Bls12_381>::new(&EngineConfig::new(SharingStrategy::SpanProgram));
    println!("Using {}", engine.description());
    let (params, msk) = engine.setup()?;
    println!("public parameters: {params}");

    // ## Proxy and users
    // The proxy and each user generate their own key pair and only publish
    // the public part. The secret of a user never leaves the user.
    let proxy = engine.user_key_gen(&params)?;
    let alice = engine.user_key_gen(&params)?;
    let bob = engine.user_key_gen(&params)?;

    // ## Transformation keys
    // For each user the authority issues a transformation key bound to the
    // user public key, the proxy public key and the user attributes. This
    // key is handed to the proxy, not to the user.
    let alice_key = engine.proxy_key_gen(
        &params,
        &msk,
        proxy.public_key(),
        alice.public_key(),
        &["DOCTOR", "CARDIOLOGY"],
    )?;
    let bob_key = engine.proxy_key_gen(
        &params,
        &msk,
        proxy.public_key(),
        bob.public_key(),
        &["NURSE", "CARDIOLOGY"],
    )?;
    println!("alice transformation key: {} bytes", alice_key.len_bytes());
    let mut proxy_store = HashMap::new();
    proxy_store.insert("alice", alice_key);
    proxy_store.insert("bob", bob_key);

    // ## Encryption
    // Anyone can encrypt with the public parameters. The message is a point
    // of Gt, usually used to derive a symmetric key (see
    // `Engine::generate_symmetric_key`).
    let msg = engine.random_message()?;
    let ct = engine.encrypt(&params, &msg, "CARDIOLOGY and (DOCTOR or NURSE)")?;
    println!("cipher text: {} bytes", ct.try_into_bytes()?.len());

    // ## Decryption
    // The proxy checks the policy and transforms the cipher text for Alice,
    // who finishes the decryption with her secret.
    let iv = engine
        .proxy_decrypt(&params, proxy.secret_key(), &proxy_store["alice"], &ct)?
        .expect("Alice is a cardiology doctor");
    assert_eq!(engine.decrypt(&params, alice.secret_key(), &iv)?, msg);
    // Eavesdropping Alice's intermediate value does not help Bob.
    assert_ne!(engine.decrypt(&params, bob.secret_key(), &iv)?, msg);

    // Only doctors may read this one: the proxy refuses for Bob.
    let doctors_only = engine.encrypt(&params, &msg, "DOCTOR and CARDIOLOGY")?;
    assert!(engine
        .proxy_decrypt(&params, proxy.secret_key(), &proxy_store["bob"], &doctors_only)?
        .is_none());

    // ## Revocation
    // Alice leaves: the proxy deletes her transformation key. Her secret
    // alone opens nothing and the existing cipher texts are left untouched.
    proxy_store.remove("alice");
    assert!(!proxy_store.contains_key("alice"));
    // Bob still decrypts the same cipher text
    let iv = engine
        .proxy_decrypt(&params, proxy.secret_key(), &proxy_store["bob"], &ct)?
        .expect("Bob is a cardiology nurse");
    assert_eq!(engine.decrypt(&params, bob.secret_key(), &iv)?, msg);
    Ok(())
}
