use std::fmt;
use std::fs;
use std::path::Path;

use base64::{Engine as _, engine::general_purpose};
use ecdsa_lib::{KeyError, PrivateKey, SignError};
use once_cell::unsync::OnceCell;
use serde::Deserialize;
use serde_json::Value;

use crate::error::{Error, Result};

/// Access key as issued by the API: armor-free PKCS#8 key material plus the
/// two identifiers sent with every request.
///
/// Field names in the file (`Key`, `PublicKey`, `Name`) match case-insensitively.
#[derive(Deserialize)]
pub struct Credential {
    #[serde(rename = "key")]
    key: String,
    #[serde(rename = "publickey")]
    public_key: String,
    #[serde(rename = "name")]
    name: String,

    /// Resolved on first use. Only successful resolutions are cached.
    #[serde(skip)]
    resolved: OnceCell<PrivateKey>,
}

impl Credential {
    pub fn new(key: impl Into<String>, public_key: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            public_key: public_key.into(),
            name: name.into(),
            resolved: OnceCell::new(),
        }
    }

    /// Read and decode a credential file. The key material is not inspected
    /// until the first signature.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let value: Value = serde_json::from_slice(&data)?;
        Ok(serde_json::from_value(fold_field_names(value))?)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(text)?;
        Ok(serde_json::from_value(fold_field_names(value))?)
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn public_key(&self) -> &str {
        &self.public_key
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn private_key(&self) -> Result<&PrivateKey, KeyError> {
        self.resolved
            .get_or_try_init(|| PrivateKey::from_armored(&self.key))
    }

    /// Sign `message` and return the base64 encoded DER signature.
    pub fn sign(&self, message: &str) -> Result<String, SignError> {
        let signature = self.private_key()?.sign(message.as_bytes())?;
        Ok(general_purpose::STANDARD.encode(signature))
    }
}

/// Lowercases the top-level keys of a JSON object. When two keys fold to the
/// same name the later one wins.
fn fold_field_names(value: Value) -> Value {
    match value {
        Value::Object(fields) => Value::Object(
            fields
                .into_iter()
                .map(|(name, value)| (name.to_lowercase(), value))
                .collect(),
        ),
        other => other,
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("key", &"<redacted>")
            .field("public_key", &self.public_key)
            .field("name", &self.name)
            .finish()
    }
}
