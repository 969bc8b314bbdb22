#![allow(clippy::type_complexity)]

pub mod core;
pub mod error;

pub use crate::core::{
    bilinear_map::bls12_381::Bls12_381,
    config::EngineConfig,
    policy::{ap, AccessPolicy},
    secret_sharing::SharingStrategy,
    Engine,
};
