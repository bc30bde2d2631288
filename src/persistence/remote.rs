//! Client for an optional REST save store.
//!
//! The store is a plain key-value service: `PUT {base}/saves/{key}` stores a JSON
//! record and `GET {base}/saves/{key}` returns it, or 404 when there is none.

use crate::errors::PersistenceError;
use crate::persistence::record::SaveRecord;
use reqwest::{Client, StatusCode, Url};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct RemoteSaveStore {
    client: Client,
    base_url: String,
    token: String,
    timeout: Duration,
}

impl RemoteSaveStore {
    pub fn new(base_url: &str, token: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.into(),
            timeout,
        }
    }

    /// `{base}/saves/{key}` with the key percent-encoded as a single path segment.
    fn save_url(&self, key: &str) -> Result<Url, PersistenceError> {
        let invalid = || PersistenceError::InvalidUrl(self.base_url.clone());
        let mut url = Url::parse(&self.base_url).map_err(|_| invalid())?;
        url.path_segments_mut()
            .map_err(|_| invalid())?
            .pop_if_empty()
            .push("saves")
            .push(key);
        Ok(url)
    }

    pub async fn put(&self, key: &str, record: &SaveRecord) -> Result<(), PersistenceError> {
        let response = self
            .client
            .put(self.save_url(key)?)
            .bearer_auth(&self.token)
            .timeout(self.timeout)
            .json(record)
            .send()
            .await
            .map_err(request_error)?;

        if !response.status().is_success() {
            return Err(PersistenceError::RemoteStatus(response.status().as_u16()));
        }
        tracing::info!(key, "saved game remotely");
        Ok(())
    }

    pub async fn get(&self, key: &str) -> Result<Option<SaveRecord>, PersistenceError> {
        let response = self
            .client
            .get(self.save_url(key)?)
            .bearer_auth(&self.token)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(request_error)?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(PersistenceError::RemoteStatus(response.status().as_u16()));
        }

        let record: SaveRecord = response.json().await.map_err(request_error)?;
        tracing::info!(key, "loaded remote save");
        Ok(Some(record))
    }
}

fn request_error(err: reqwest::Error) -> PersistenceError {
    if err.is_timeout() {
        PersistenceError::Timeout
    } else {
        PersistenceError::Http(err)
    }
}
