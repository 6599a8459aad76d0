use std::io::Write;
use std::time::Duration;

use reqwest::Url;
use reqwest::blocking::Client;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use tracing::{debug, info};

use crate::config::Endpoint;
use crate::credential::Credential;
use crate::error::{Error, Result};
use crate::request::{RequestIds, SignedRequest};

pub const NAME_HEADER: HeaderName = HeaderName::from_static("name");
pub const PUBKEY_HEADER: HeaderName = HeaderName::from_static("pubkey");
pub const REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("rid");
pub const SIGN_HEADER: HeaderName = HeaderName::from_static("sign");
/// Carries the signed message in clear. The API reads it under this spelling.
pub const MESSAGE_HEADER: HeaderName = HeaderName::from_static("meesage");

fn header_value(name: &'static str, value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value).map_err(|e| Error::Header {
        name,
        message: e.to_string(),
    })
}

/// Issues signed GET requests one after another against a single endpoint.
pub struct Dispatcher<'a> {
    client: Client,
    url: Url,
    path: String,
    headers: HeaderMap,
    credential: &'a Credential,
    ids: RequestIds,
}

impl<'a> Dispatcher<'a> {
    /// Builds the client and the headers shared by every request.
    /// No timeout is set: a hung request blocks the run.
    pub fn new(endpoint: &Endpoint, credential: &'a Credential) -> Result<Self> {
        let url = Url::parse(&endpoint.url()).map_err(|e| Error::Endpoint {
            url: endpoint.url(),
            message: e.to_string(),
        })?;

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(NAME_HEADER, header_value("name", credential.name())?);
        headers.insert(PUBKEY_HEADER, header_value("pubkey", credential.public_key())?);

        let client = Client::builder()
            .timeout(None::<Duration>)
            .build()
            .map_err(Error::Transport)?;

        Ok(Self {
            client,
            url,
            path: endpoint.path.clone(),
            headers,
            credential,
            ids: RequestIds::new(),
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Sign a fresh request context for this endpoint
    pub fn sign_next(&self) -> Result<SignedRequest> {
        let id = self.ids.next_id();
        Ok(SignedRequest::new(id, &self.path, self.credential)?)
    }

    /// Send one signed request and drain its body.
    pub fn send(&self, signed: &SignedRequest) -> Result<Vec<u8>> {
        let mut headers = self.headers.clone();
        headers.insert(REQUEST_ID_HEADER, header_value("rId", &signed.id.to_string())?);
        headers.insert(SIGN_HEADER, header_value("Sign", &signed.signature)?);
        headers.insert(MESSAGE_HEADER, header_value("meesage", &signed.message)?);

        let response = self
            .client
            .get(self.url.clone())
            .headers(headers)
            .send()
            .map_err(Error::Transport)?;

        let status = response.status();
        let body = response.bytes().map_err(Error::ResponseRead)?;
        info!(
            "Request {}: GET {} -> {} ({} bytes)",
            signed.id,
            self.path,
            status,
            body.len()
        );
        Ok(body.to_vec())
    }

    /// Run `count` iterations, writing each body followed by a newline to
    /// `out`. Stops at the first error.
    pub fn run<W: Write>(&self, count: u32, out: &mut W) -> Result<u32> {
        for _ in 0..count {
            let signed = self.sign_next()?;
            debug!("Signed message '{}'", signed.message);

            let body = self.send(&signed)?;
            out.write_all(&body)
                .and_then(|()| out.write_all(b"\n"))
                .and_then(|()| out.flush())
                .map_err(Error::Output)?;
        }
        Ok(count)
    }
}
