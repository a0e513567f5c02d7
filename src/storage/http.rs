//! Site document stored as an object behind an HTTP URL.
//!
//! Works with any object store that accepts `GET` / `PUT` on an object URL
//! (S3-compatible presigned URLs, GCS/Azure blob endpoints, a WebDAV share).

use super::{Backend, StorageError};
use reqwest::{
    StatusCode,
    blocking::{Client, RequestBuilder},
    header::CONTENT_TYPE,
};
use std::time::Duration;

/// Upper bound on a single object transfer.
const TRANSFER_TIMEOUT: Duration = Duration::from_secs(30);

pub struct HttpStorage {
    url: String,
    token: Option<String>,
    client: Client,
}

impl HttpStorage {
    pub fn new(url: impl Into<String>, token: Option<String>) -> Result<Self, StorageError> {
        let url = url.into();
        let client = Client::builder()
            .timeout(TRANSFER_TIMEOUT)
            .build()
            .map_err(|err| StorageError::Http(url.clone(), err))?;
        Ok(Self { url, token, client })
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    fn check(&self, status: StatusCode) -> Result<(), StorageError> {
        if status.is_success() {
            Ok(())
        } else {
            Err(StorageError::Status(self.url.clone(), status.as_u16()))
        }
    }
}

impl Backend for HttpStorage {
    fn load(&self) -> Result<Vec<u8>, StorageError> {
        let response = self
            .authorize(self.client.get(&self.url))
            .send()
            .map_err(|err| StorageError::Http(self.url.clone(), err))?;
        self.check(response.status())?;

        let bytes = response
            .bytes()
            .map_err(|err| StorageError::Http(self.url.clone(), err))?;
        Ok(bytes.to_vec())
    }

    fn save(&self, bytes: &[u8]) -> Result<(), StorageError> {
        let response = self
            .authorize(self.client.put(&self.url))
            .header(CONTENT_TYPE, "application/json")
            .body(bytes.to_vec())
            .send()
            .map_err(|err| StorageError::Http(self.url.clone(), err))?;
        self.check(response.status())
    }
}
