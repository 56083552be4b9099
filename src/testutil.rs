// src/testutil.rs

//! Fixtures shared by the unit tests: a fixed RSA key and a token signer.

use crate::codec;
use crate::key::PinnedPublicKey;
use rsa::pkcs8::DecodePrivateKey;
use rsa::{Pkcs1v15Sign, RsaPrivateKey};
use sha2::{Digest, Sha256};

const TEST_PRIVATE_KEY_PEM: &str = include_str!("../tests/fixtures/test_private_key.pem");

pub(crate) fn private_key() -> RsaPrivateKey {
    RsaPrivateKey::from_pkcs8_pem(TEST_PRIVATE_KEY_PEM).expect("fixture key parses")
}

pub(crate) fn pinned_key(kid: &str) -> PinnedPublicKey {
    PinnedPublicKey::new(kid, private_key().to_public_key())
}

/// Builds `header.payload.signature` with an RS256 signature from the fixture key.
pub(crate) fn sign_token(header: &serde_json::Value, payload: &serde_json::Value) -> String {
    let signed = format!(
        "{}.{}",
        codec::encode(header.to_string()),
        codec::encode(payload.to_string())
    );
    let digest = Sha256::digest(signed.as_bytes());
    let signature = private_key()
        .sign(Pkcs1v15Sign::new::<Sha256>(), &digest)
        .expect("signing with fixture key");
    format!("{}.{}", signed, codec::encode(signature))
}

/// The claim set used throughout the token tests.
pub(crate) fn k1_claims() -> serde_json::Value {
    serde_json::json!({
        "iss": "https://provider.example",
        "sub": "user-123",
        "aud": "com.example.app",
        "iat": 1000,
        "exp": 2000,
        "nonce_supported": true
    })
}

pub(crate) fn k1_header() -> serde_json::Value {
    serde_json::json!({ "kid": "K1", "alg": "RS256" })
}
