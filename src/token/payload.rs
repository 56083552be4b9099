// src/token/payload.rs

use crate::error::{Result, SiwaError};
use crate::model::RawPayload;
use serde::Deserialize;
use std::fmt;

/// The provider's confidence that the user is a real person (`real_user_status`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RealPerson {
    /// Only supported on recent platform versions; no signal available.
    Unsupported,
    /// The provider could not determine whether the user is real.
    Unknown,
    /// The user is likely a real person.
    LikelyReal,
}

impl TryFrom<i64> for RealPerson {
    type Error = SiwaError;

    fn try_from(value: i64) -> Result<Self> {
        match value {
            0 => Ok(RealPerson::Unsupported),
            1 => Ok(RealPerson::Unknown),
            2 => Ok(RealPerson::LikelyReal),
            other => Err(SiwaError::MalformedToken(format!(
                "unknown real_user_status: {}",
                other
            ))),
        }
    }
}

impl fmt::Display for RealPerson {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RealPerson::Unsupported => "unsupported",
            RealPerson::Unknown => "unknown",
            RealPerson::LikelyReal => "likely_real",
        };
        f.write_str(name)
    }
}

/// The claims carried by an identity token.
///
/// Decoding checks presence and types only. Expiry and audience are checked
/// by verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payload {
    issuer: String,
    subject: String,
    audience: String,
    issued_at: i64,
    expiration_time: i64,
    nonce: Option<String>,
    nonce_supported: bool,
    email: Option<String>,
    email_verified: bool,
    is_private_email: Option<bool>,
    real_person: Option<RealPerson>,
}

impl Payload {
    /// Decodes the claim set.
    ///
    /// # Errors
    ///
    /// Returns [`SiwaError::MalformedToken`] if `iss`, `sub`, `aud`, `iat`, `exp` or
    /// `nonce_supported` is missing, or if any claim has the wrong type.
    pub fn decode(data: &serde_json::Value) -> Result<Self> {
        let raw = RawPayload::deserialize(data)
            .map_err(|e| SiwaError::MalformedToken(format!("invalid payload: {}", e)))?;
        let real_person = raw.real_user_status.map(RealPerson::try_from).transpose()?;

        Ok(Self {
            issuer: raw.iss,
            subject: raw.sub,
            audience: raw.aud,
            issued_at: raw.iat,
            expiration_time: raw.exp,
            nonce: raw.nonce,
            nonce_supported: raw.nonce_supported,
            email: raw.email,
            email_verified: raw.email_verified.unwrap_or(false),
            is_private_email: raw.is_private_email,
            real_person,
        })
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    /// The stable, unique identifier of the user.
    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn audience(&self) -> &str {
        &self.audience
    }

    /// Seconds since the Unix epoch.
    pub fn issued_at(&self) -> i64 {
        self.issued_at
    }

    /// Seconds since the Unix epoch.
    pub fn expiration_time(&self) -> i64 {
        self.expiration_time
    }

    pub fn nonce(&self) -> Option<&str> {
        self.nonce.as_deref()
    }

    pub fn nonce_supported(&self) -> bool {
        self.nonce_supported
    }

    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    pub fn email_verified(&self) -> bool {
        self.email_verified
    }

    /// Whether `email` is a private relay address.
    pub fn is_private_email(&self) -> Option<bool> {
        self.is_private_email
    }

    pub fn real_person(&self) -> Option<RealPerson> {
        self.real_person
    }
}
