// src/lib.rs

//! Verification of "Sign in with Apple" identity tokens.
//!
//! An [`IdentityToken`](token::IdentityToken) is parsed from its compact
//! `header.payload.signature` form, its signing key is resolved from the
//! provider's published key set (through a shared [`KeyCache`](key::KeyCache)),
//! and its RS256 signature, expiry and audience are checked.

pub mod client;
pub mod codec;
pub mod config;
pub mod error;
pub mod key;
pub(crate) mod model;
pub mod token;
pub mod verifier;

#[cfg(test)]
mod testutil;

/// The public prelude for the `siwa` crate.
///
/// This module re-exports the most commonly used types for convenience.
pub mod prelude {
    pub use crate::client::KeySetClient;
    pub use crate::config::{Config, ConfigBuilder, APPLE_KEY_SET_URL};
    pub use crate::error::SiwaError;
    pub use crate::key::{KeyCache, PinnedPublicKey, PublicKey, RemotePublicKey};
    pub use crate::token::{Header, IdentityToken, Payload, RealPerson, Verification};
    pub use crate::verifier::Verifier;
}
