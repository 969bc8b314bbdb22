pub mod bilinear_map;
pub mod config;
pub mod msp;
pub mod policy;
pub mod secret_sharing;
pub mod yllc;

/// The engine is the main entry point of the core module
/// See the demo for details
mod engine;
pub use engine::Engine;

// Check this code for a review of the use of the proxy ABE engine
#[cfg(test)]
mod demo;

#[cfg(test)]
mod tests;
