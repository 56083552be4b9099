// src/key/remote.rs

use super::PublicKey;
use crate::codec;
use crate::error::{Result, SiwaError};
use crate::model::KeyRecord;
use once_cell::sync::OnceCell;
use rsa::{BigUint, RsaPublicKey};
use serde::Deserialize;

/// A signing key published in the provider's JSON Web Key Set.
#[derive(Debug)]
pub struct RemotePublicKey {
    algorithm: String,
    identifier: String,
    family: String,
    use_purpose: String,
    modulus: String,
    exponent: String,
    // Derived from `modulus` and `exponent` on first use.
    rsa_key: OnceCell<RsaPublicKey>,
}

impl RemotePublicKey {
    /// Decodes one record of the key set (`alg`, `kid`, `kty`, `use`, `n`, `e`).
    pub fn decode(record: &serde_json::Value) -> Result<Self> {
        let record = KeyRecord::deserialize(record)
            .map_err(|e| SiwaError::MalformedKey(e.to_string()))?;
        Ok(Self::from(record))
    }

    /// Decodes every record of a key set, failing on the first malformed one.
    pub fn decode_many(records: &[serde_json::Value]) -> Result<Vec<Self>> {
        records.iter().map(Self::decode).collect()
    }

    pub fn algorithm(&self) -> &str {
        &self.algorithm
    }

    /// The key type (`kty`), `RSA` for every key the provider publishes.
    pub fn family(&self) -> &str {
        &self.family
    }

    /// The intended use (`use`), normally `sig`.
    pub fn use_purpose(&self) -> &str {
        &self.use_purpose
    }

    pub fn modulus(&self) -> &str {
        &self.modulus
    }

    pub fn exponent(&self) -> &str {
        &self.exponent
    }

    fn reconstruct(&self) -> Result<RsaPublicKey> {
        let n = BigUint::from_bytes_be(&codec::decode(&self.modulus)?);
        let e = BigUint::from_bytes_be(&codec::decode(&self.exponent)?);
        RsaPublicKey::new(n, e).map_err(|e| {
            SiwaError::MalformedKey(format!("key '{}' is not a usable RSA key: {}", self.identifier, e))
        })
    }
}

impl From<KeyRecord> for RemotePublicKey {
    fn from(record: KeyRecord) -> Self {
        Self {
            algorithm: record.alg,
            identifier: record.kid,
            family: record.kty,
            use_purpose: record.use_purpose,
            modulus: record.n,
            exponent: record.e,
            rsa_key: OnceCell::new(),
        }
    }
}

impl PublicKey for RemotePublicKey {
    fn identifier(&self) -> &str {
        &self.identifier
    }

    fn rsa_public_key(&self) -> Result<&RsaPublicKey> {
        self.rsa_key.get_or_try_init(|| self.reconstruct())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rsa::traits::PublicKeyParts;
    use serde_json::json;

    // 2048-bit modulus with the top bit set, so the key passes the size checks.
    fn modulus() -> String {
        let mut bytes = vec![0xd5u8; 256];
        bytes[255] = 0x01;
        codec::encode(bytes)
    }

    fn record() -> serde_json::Value {
        json!({
            "kty": "RSA",
            "kid": "W6WcOKB",
            "use": "sig",
            "alg": "RS256",
            "n": modulus(),
            "e": "AQAB"
        })
    }

    #[test]
    fn maps_provider_fields() {
        let key = RemotePublicKey::decode(&record()).unwrap();
        assert_eq!(key.identifier(), "W6WcOKB");
        assert_eq!(key.algorithm(), "RS256");
        assert_eq!(key.family(), "RSA");
        assert_eq!(key.use_purpose(), "sig");
        assert_eq!(key.exponent(), "AQAB");
    }

    #[test]
    fn reconstructs_big_endian_components() {
        let key = RemotePublicKey::decode(&record()).unwrap();
        let rsa_key = key.rsa_public_key().unwrap();
        assert_eq!(rsa_key.e(), &BigUint::from(65537u32));
        assert_eq!(rsa_key.n().to_bytes_be(), codec::decode(modulus()).unwrap());
    }

    #[test]
    fn memoizes_reconstructed_key() {
        let key = RemotePublicKey::decode(&record()).unwrap();
        let first = key.rsa_public_key().unwrap() as *const RsaPublicKey;
        let second = key.rsa_public_key().unwrap() as *const RsaPublicKey;
        assert_eq!(first, second);
    }

    #[test]
    fn missing_field_is_malformed_key() {
        for field in ["alg", "kid", "kty", "use", "n", "e"] {
            let mut record = record();
            record.as_object_mut().unwrap().remove(field);
            let err = RemotePublicKey::decode(&record).unwrap_err();
            assert!(matches!(err, SiwaError::MalformedKey(_)), "{field}: {err:?}");
        }
    }

    #[test]
    fn non_string_field_is_malformed_key() {
        let mut record = record();
        record["kid"] = json!(42);
        assert!(matches!(
            RemotePublicKey::decode(&record),
            Err(SiwaError::MalformedKey(_))
        ));
    }

    #[test]
    fn bad_modulus_surfaces_on_reconstruction() {
        let mut record = record();
        record["n"] = json!("not*base64");
        let key = RemotePublicKey::decode(&record).unwrap();
        assert!(matches!(key.rsa_public_key(), Err(SiwaError::Decode(_))));
    }

    #[test]
    fn unusable_components_are_malformed_key() {
        let oversized = codec::encode(vec![0xd5u8; 520]);
        for (field, value) in [("e", "AQ".to_string()), ("n", oversized)] {
            let mut record = record();
            record[field] = json!(value);
            let key = RemotePublicKey::decode(&record).unwrap();

            for _ in 0..2 {
                let err = key.rsa_public_key().unwrap_err();
                assert!(matches!(err, SiwaError::MalformedKey(_)), "{field}: {err:?}");
            }
            assert!(key.rsa_key.get().is_none());
        }
    }
}
