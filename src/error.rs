use std::path::PathBuf;

use ecdsa_lib::SignError;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Every failure is fatal; the variant names the stage that failed.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to read key file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to unmarshal key data: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("failed to load config {}: {message}", path.display())]
    Config { path: PathBuf, message: String },
    #[error("failed to sign message: {0}")]
    Signing(#[from] SignError),
    #[error("invalid endpoint {url}: {message}")]
    Endpoint { url: String, message: String },
    #[error("invalid value for header {name}: {message}")]
    Header { name: &'static str, message: String },
    #[error("failed to send request: {0}")]
    Transport(reqwest::Error),
    #[error("failed to read response body: {0}")]
    ResponseRead(reqwest::Error),
    #[error("failed to write response body: {0}")]
    Output(std::io::Error),
}
