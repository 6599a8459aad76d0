use ecdsa_lib::SignError;
use rand_core::{OsRng, RngCore};
use uuid::Uuid;

use crate::credential::Credential;

pub const METHOD: &str = "GET";

/// Time-based (version 1) request ids.
///
/// The node id is random rather than a MAC address, with the multicast bit
/// set as RFC 4122 requires for that case.
#[derive(Debug, Clone)]
pub struct RequestIds {
    node_id: [u8; 6],
}

impl RequestIds {
    pub fn new() -> Self {
        let mut node_id = [0u8; 6];
        OsRng.fill_bytes(&mut node_id);
        node_id[0] |= 0x01;
        Self { node_id }
    }

    pub fn next_id(&self) -> Uuid {
        Uuid::now_v1(&self.node_id)
    }
}

impl Default for RequestIds {
    fn default() -> Self {
        Self::new()
    }
}

/// The string the API expects to be signed: `{id}:{method}:{path}::`
pub fn canonical_message(id: &Uuid, method: &str, path: &str) -> String {
    format!("{}:{}:{}::", id.hyphenated(), method, path)
}

/// One iteration's signed context. Dropped once the request completes.
#[derive(Debug, Clone)]
pub struct SignedRequest {
    pub id: Uuid,
    pub message: String,
    pub signature: String,
}

impl SignedRequest {
    pub fn new(id: Uuid, path: &str, credential: &Credential) -> Result<Self, SignError> {
        let message = canonical_message(&id, METHOD, path);
        let signature = credential.sign(&message)?;
        Ok(Self {
            id,
            message,
            signature,
        })
    }
}
