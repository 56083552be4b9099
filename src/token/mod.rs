// src/token/mod.rs

//! Identity token parsing and verification.

mod header;
mod payload;

pub use header::Header;
pub use payload::{Payload, RealPerson};

use crate::client::KeySetClient;
use crate::codec;
use crate::error::{Result, SiwaError};
use crate::key::{KeyCache, PublicKey};
use rsa::{Pkcs1v15Sign, RsaPublicKey};
use sha2::{Digest, Sha256};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{info, instrument};

/// The only signing algorithm the provider uses.
pub const RS256: &str = "RS256";

/// The outcome of checking a parsed token against a resolved key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verification {
    Valid,
    /// The header names an algorithm other than RS256.
    UnsupportedAlgorithm(String),
    InvalidSignature,
    Expired { expiration_time: i64, now: i64 },
    AudienceMismatch { expected: String, actual: String },
}

impl Verification {
    pub fn is_valid(&self) -> bool {
        matches!(self, Verification::Valid)
    }
}

impl fmt::Display for Verification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verification::Valid => write!(f, "valid"),
            Verification::UnsupportedAlgorithm(alg) => write!(f, "unsupported algorithm {}", alg),
            Verification::InvalidSignature => write!(f, "signature does not match"),
            Verification::Expired {
                expiration_time,
                now,
            } => write!(f, "expired at {} (now {})", expiration_time, now),
            Verification::AudienceMismatch { expected, actual } => {
                write!(f, "audience mismatch, expected: {}, actual: {}", expected, actual)
            }
        }
    }
}

/// A parsed identity token.
///
/// The signed bytes are the header and payload segments exactly as they
/// appeared on the wire; the signature is checked against those, never
/// against re-encoded claims.
#[derive(Debug, Clone)]
pub struct IdentityToken {
    header: Header,
    payload: Payload,
    signed_bytes: Vec<u8>,
    signature: Vec<u8>,
    raw_token: Vec<u8>,
}

impl IdentityToken {
    /// Parses a `header.payload.signature` token.
    ///
    /// # Errors
    ///
    /// * [`SiwaError::MalformedToken`] unless there are exactly three non-empty
    ///   segments whose header and payload hold the expected JSON claims.
    /// * [`SiwaError::Decode`] if a segment is not base64url.
    pub fn parse(raw_token: impl AsRef<[u8]>) -> Result<Self> {
        let raw_token = raw_token.as_ref();
        let segments: Vec<&[u8]> = raw_token.split(|b| *b == b'.').collect();
        let [header_segment, payload_segment, signature_segment] = segments.as_slice() else {
            return Err(SiwaError::MalformedToken(format!(
                "expected 3 segments, found {}",
                segments.len()
            )));
        };
        if segments.iter().any(|segment| segment.is_empty()) {
            return Err(SiwaError::MalformedToken("empty token segment".to_string()));
        }

        let header = Header::decode(&decode_json(header_segment, "header")?)?;
        let payload = Payload::decode(&decode_json(payload_segment, "payload")?)?;
        let signature = codec::decode(signature_segment)?;
        let signed_len = header_segment.len() + 1 + payload_segment.len();

        Ok(Self {
            header,
            payload,
            signed_bytes: raw_token[..signed_len].to_vec(),
            signature,
            raw_token: raw_token.to_vec(),
        })
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    /// `header-segment '.' payload-segment`, as received.
    pub fn signed_bytes(&self) -> &[u8] {
        &self.signed_bytes
    }

    pub fn signature(&self) -> &[u8] {
        &self.signature
    }

    pub fn raw_token(&self) -> &[u8] {
        &self.raw_token
    }

    /// Resolves the signing key and checks signature, expiry and audience.
    ///
    /// A rejected token is an `Ok` carrying the reason. `Err` is reserved for
    /// failures to resolve or reconstruct the key, such as
    /// [`SiwaError::KeyNotFound`] or [`SiwaError::Network`].
    #[instrument(skip_all, fields(kid = %self.header.identifier()), err)]
    pub async fn verify(
        &self,
        client: &KeySetClient,
        audience: &str,
        cache: Option<&KeyCache>,
        ignore_expiry: bool,
    ) -> Result<Verification> {
        let key = self.header.resolve_public_key(client, cache).await?;
        let verification = self.verify_with_key(key.as_ref(), audience, ignore_expiry)?;
        if !verification.is_valid() {
            info!("Identity token rejected: {}", verification);
        }
        Ok(verification)
    }

    /// Like [`IdentityToken::verify`], collapsing every rejection into `false`.
    pub async fn is_validly_signed(
        &self,
        client: &KeySetClient,
        audience: &str,
        cache: Option<&KeyCache>,
        ignore_expiry: bool,
    ) -> Result<bool> {
        Ok(self.verify(client, audience, cache, ignore_expiry).await?.is_valid())
    }

    /// Checks the token against an already resolved key, without network access.
    pub fn verify_with_key(
        &self,
        key: &dyn PublicKey,
        audience: &str,
        ignore_expiry: bool,
    ) -> Result<Verification> {
        let now = (!ignore_expiry).then(unix_now);
        Ok(self.evaluate(key.rsa_public_key()?, audience, now))
    }

    // `now` is `None` when expiry is not checked. The first failing check wins.
    fn evaluate(&self, rsa_key: &RsaPublicKey, audience: &str, now: Option<i64>) -> Verification {
        if self.header.algorithm() != RS256 {
            return Verification::UnsupportedAlgorithm(self.header.algorithm().to_string());
        }

        let digest = Sha256::digest(&self.signed_bytes);
        if rsa_key
            .verify(Pkcs1v15Sign::new::<Sha256>(), &digest, &self.signature)
            .is_err()
        {
            return Verification::InvalidSignature;
        }

        if let Some(now) = now {
            if now >= self.payload.expiration_time() {
                return Verification::Expired {
                    expiration_time: self.payload.expiration_time(),
                    now,
                };
            }
        }

        if self.payload.audience() != audience {
            return Verification::AudienceMismatch {
                expected: audience.to_string(),
                actual: self.payload.audience().to_string(),
            };
        }

        Verification::Valid
    }
}

fn decode_json(segment: &[u8], name: &str) -> Result<serde_json::Value> {
    let bytes = codec::decode(segment)?;
    serde_json::from_slice(&bytes)
        .map_err(|e| SiwaError::MalformedToken(format!("{} is not valid JSON: {}", name, e)))
}

fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs() as i64)
        .unwrap_or_default()
}
