//! Client for the bitsCrunch market metrics API.
//!
//! Every request carries a fresh time-based request id, a canonical message
//! binding that id to the method and path, and an ECDSA signature over the
//! message made with the caller's access key:
//! - [`credential`] loads the access key file
//! - [`request`] builds and signs the per-request context
//! - [`client`] sends the requests one after another and prints the bodies

pub mod cli;
pub mod client;
pub mod config;
pub mod credential;
pub mod error;
pub mod request;

pub use client::Dispatcher;
pub use config::{Endpoint, Settings};
pub use credential::Credential;
pub use error::{Error, Result};
pub use request::{RequestIds, SignedRequest};

use base64::{Engine as _, engine::general_purpose};
use ecdsa_lib::Curve;

/// Checks a `Sign` header value against the `meesage` header it was sent
/// with, the way the API does: base64 DER ECDSA over SHA-256 of the message.
///
/// # Example
/// ```
/// # use bitscrunch_metrics::verify_signature;
/// # use ecdsa_lib::{Curve, PrivateKey};
/// # use base64::{Engine as _, engine::general_purpose};
/// let key = PrivateKey::generate(Curve::P256);
/// let der = key.sign(b"id:GET:/path::").unwrap();
/// let sign = general_purpose::STANDARD.encode(der);
/// assert!(verify_signature(Curve::P256, &key.public_key(), "id:GET:/path::", &sign));
/// ```
pub fn verify_signature(curve: Curve, public_key: &[u8], message: &str, signature: &str) -> bool {
    let sig_bytes = match general_purpose::STANDARD.decode(signature) {
        Ok(b) => b,
        Err(_) => return false,
    };
    ecdsa_lib::verify(curve, public_key, message.as_bytes(), &sig_bytes)
}
