//! Access-key signing for the bitsCrunch API.
//!
//! Access keys are handed out as the base64 body of a PKCS#8 document with
//! the PEM armor stripped. This crate puts the armor back, resolves the
//! document into an elliptic-curve signing key and signs SHA-256 digests of
//! request messages with ECDSA, producing ASN.1 DER signatures.
//!

use ecdsa::signature::hazmat::{PrehashVerifier, RandomizedPrehashSigner};
use pkcs8::{DecodePrivateKey, EncodePrivateKey, ObjectIdentifier, PrivateKeyInfo};
use rand_core::OsRng;
use sha2::{Digest, Sha256};
use std::fmt;

/// `id-ecPublicKey` from RFC 5480
pub const EC_PUBLIC_KEY_OID: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.10045.2.1");

/// NIST P-256 (`prime256v1`)
pub const P256_OID: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.10045.3.1.7");

/// `secp256k1`
pub const SECP256K1_OID: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.132.0.10");

/// Label placed around the raw key material before PEM decoding.
pub const PEM_LABEL: &str = "PRIVATE KEY";

const PEM_LINE_WIDTH: usize = 64;

/// Errors raised while turning raw key material into a signing key.
#[derive(Debug, thiserror::Error)]
pub enum KeyError {
    #[error("failed to parse PEM block containing the key: {0}")]
    Format(pem_rfc7468::Error),
    #[error("failed to parse PKCS#8 private key: {0}")]
    Parse(pkcs8::Error),
    #[error("key is not an elliptic-curve key (algorithm {0})")]
    Type(ObjectIdentifier),
    #[error("unsupported elliptic curve {0:?}")]
    UnsupportedCurve(Option<ObjectIdentifier>),
}

/// Errors raised while signing.
#[derive(Debug, thiserror::Error)]
pub enum SignError {
    #[error(transparent)]
    Key(#[from] KeyError),
    #[error("ECDSA signing failed: {0}")]
    Primitive(#[from] ecdsa::Error),
}

/// Curves a key may live on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Curve {
    P256,
    Secp256k1,
}

impl Curve {
    pub fn oid(self) -> ObjectIdentifier {
        match self {
            Curve::P256 => P256_OID,
            Curve::Secp256k1 => SECP256K1_OID,
        }
    }
}

impl fmt::Display for Curve {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Curve::P256 => f.write_str("P-256"),
            Curve::Secp256k1 => f.write_str("secp256k1"),
        }
    }
}

/// A resolved ECDSA private key
pub enum PrivateKey {
    P256(p256::ecdsa::SigningKey),
    Secp256k1(k256::ecdsa::SigningKey),
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrivateKey")
            .field("curve", &self.curve())
            .finish_non_exhaustive()
    }
}

/// Wraps armor-free key material in PEM armor.
///
/// Whitespace in `raw` is dropped and the body is re-wrapped at 64 columns,
/// so single-line material from a JSON file decodes the same as wrapped text.
pub fn armor(raw: &str) -> String {
    let body: String = raw.chars().filter(|c| !c.is_ascii_whitespace()).collect();

    let mut pem = String::with_capacity(body.len() + body.len() / PEM_LINE_WIDTH + 64);
    pem.push_str("-----BEGIN ");
    pem.push_str(PEM_LABEL);
    pem.push_str("-----\n");
    for line in body.as_bytes().chunks(PEM_LINE_WIDTH) {
        pem.push_str(&String::from_utf8_lossy(line));
        pem.push('\n');
    }
    pem.push_str("-----END ");
    pem.push_str(PEM_LABEL);
    pem.push_str("-----\n");
    pem
}

impl PrivateKey {
    /// Generate a new random key on `curve`
    pub fn generate(curve: Curve) -> Self {
        match curve {
            Curve::P256 => Self::P256(p256::ecdsa::SigningKey::random(&mut OsRng)),
            Curve::Secp256k1 => Self::Secp256k1(k256::ecdsa::SigningKey::random(&mut OsRng)),
        }
    }

    /// Resolve armor-free key material: armor it, PEM-decode it and parse the
    /// DER as PKCS#8.
    pub fn from_armored(raw: &str) -> Result<Self, KeyError> {
        let pem = armor(raw);
        let (_label, der) = pem_rfc7468::decode_vec(pem.as_bytes()).map_err(KeyError::Format)?;
        Self::from_pkcs8_der(&der)
    }

    /// Parse a PKCS#8 `PrivateKeyInfo`, accepting only EC keys on a supported curve.
    pub fn from_pkcs8_der(der: &[u8]) -> Result<Self, KeyError> {
        let info = PrivateKeyInfo::try_from(der).map_err(KeyError::Parse)?;
        if info.algorithm.oid != EC_PUBLIC_KEY_OID {
            return Err(KeyError::Type(info.algorithm.oid));
        }

        let curve = info.algorithm.parameters_oid().ok();
        match curve {
            Some(oid) if oid == Curve::P256.oid() => p256::ecdsa::SigningKey::from_pkcs8_der(der)
                .map(Self::P256)
                .map_err(KeyError::Parse),
            Some(oid) if oid == Curve::Secp256k1.oid() => k256::ecdsa::SigningKey::from_pkcs8_der(der)
                .map(Self::Secp256k1)
                .map_err(KeyError::Parse),
            other => Err(KeyError::UnsupportedCurve(other)),
        }
    }

    /// Encode the key as a PKCS#8 DER document
    pub fn to_pkcs8_der(&self) -> Result<Vec<u8>, KeyError> {
        let doc = match self {
            Self::P256(key) => key.to_pkcs8_der(),
            Self::Secp256k1(key) => key.to_pkcs8_der(),
        }
        .map_err(KeyError::Parse)?;
        Ok(doc.as_bytes().to_vec())
    }

    pub fn curve(&self) -> Curve {
        match self {
            Self::P256(_) => Curve::P256,
            Self::Secp256k1(_) => Curve::Secp256k1,
        }
    }

    /// Compressed SEC1 encoding of the public key
    pub fn public_key(&self) -> Vec<u8> {
        match self {
            Self::P256(key) => key
                .verifying_key()
                .to_encoded_point(true)
                .as_bytes()
                .to_vec(),
            Self::Secp256k1(key) => key
                .verifying_key()
                .to_encoded_point(true)
                .as_bytes()
                .to_vec(),
        }
    }

    /// Sign a 32-byte digest. The nonce mixes fresh randomness from the OS,
    /// so two signatures over the same digest differ.
    pub fn sign_digest(&self, digest: &[u8]) -> Result<Vec<u8>, SignError> {
        let der = match self {
            Self::P256(key) => {
                let signature: p256::ecdsa::Signature = key.sign_prehash_with_rng(&mut OsRng, digest)?;
                signature.to_der().as_bytes().to_vec()
            }
            Self::Secp256k1(key) => {
                let signature: k256::ecdsa::Signature = key.sign_prehash_with_rng(&mut OsRng, digest)?;
                signature.to_der().as_bytes().to_vec()
            }
        };
        Ok(der)
    }

    /// Hash `message` with SHA-256 and sign the digest. Returns a DER signature.
    pub fn sign(&self, message: &[u8]) -> Result<Vec<u8>, SignError> {
        self.sign_digest(&Sha256::digest(message))
    }

    /// Verify a DER signature produced by [`PrivateKey::sign`]
    pub fn verify(&self, message: &[u8], signature: &[u8]) -> bool {
        verify(self.curve(), &self.public_key(), message, signature)
    }
}

/// Verify a DER signature over SHA-256(`message`) with a SEC1-encoded public key.
pub fn verify(curve: Curve, public_key: &[u8], message: &[u8], signature: &[u8]) -> bool {
    let digest = Sha256::digest(message);
    match curve {
        Curve::P256 => p256::ecdsa::VerifyingKey::from_sec1_bytes(public_key)
            .and_then(|vk| {
                let sig = p256::ecdsa::Signature::from_der(signature)?;
                vk.verify_prehash(&digest, &sig)
            })
            .is_ok(),
        Curve::Secp256k1 => k256::ecdsa::VerifyingKey::from_sec1_bytes(public_key)
            .and_then(|vk| {
                let sig = k256::ecdsa::Signature::from_der(signature)?;
                vk.verify_prehash(&digest, &sig)
            })
            .is_ok(),
    }
}

// ----------------------------------------------
//
// Unit tests
//
