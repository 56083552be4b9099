// src/model.rs

use serde::Deserialize;

/// A single entry of the provider's JSON Web Key Set, as published.
///
/// Every field is required; the provider always publishes RSA signing keys.
#[derive(Debug, Clone, Deserialize)]
pub struct KeyRecord {
    pub alg: String,
    pub kid: String,
    pub kty: String,
    #[serde(rename = "use")]
    pub use_purpose: String,
    pub n: String,
    pub e: String,
}

/// The key set response body. Records are kept as raw JSON so that a bad
/// record is reported as a key error rather than a response error.
#[derive(Debug, Deserialize)]
pub struct JsonWebKeySet {
    pub keys: Vec<serde_json::Value>,
}

/// The JOSE header of an identity token.
#[derive(Debug, Deserialize)]
pub(crate) struct RawHeader {
    pub kid: String,
    pub alg: String,
}

/// The claim set of an identity token, before typed post-processing.
#[derive(Debug, Deserialize)]
pub(crate) struct RawPayload {
    pub iss: String,
    pub sub: String,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
    pub nonce_supported: bool,
    #[serde(default)]
    pub nonce: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "lenient_bool::optional")]
    pub email_verified: Option<bool>,
    #[serde(default, deserialize_with = "lenient_bool::optional")]
    pub is_private_email: Option<bool>,
    #[serde(default)]
    pub real_user_status: Option<i64>,
}

/// Apple has sent boolean claims both as JSON booleans and as the strings
/// `"true"` / `"false"`.
mod lenient_bool {
    use serde::de::{self, Deserializer};
    use serde::Deserialize;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum BoolOrString {
        Bool(bool),
        String(String),
    }

    pub fn optional<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<BoolOrString>::deserialize(deserializer)? {
            None => Ok(None),
            Some(BoolOrString::Bool(b)) => Ok(Some(b)),
            Some(BoolOrString::String(s)) => match s.as_str() {
                "true" => Ok(Some(true)),
                "false" => Ok(Some(false)),
                other => Err(de::Error::invalid_value(
                    de::Unexpected::Str(other),
                    &"a boolean or \"true\"/\"false\"",
                )),
            },
        }
    }
}
