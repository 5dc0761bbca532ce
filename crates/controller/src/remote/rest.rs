//! Firebase-style REST backend: every path is a JSON document at
//! `{base}/{path}.json`, read with GET and replaced with PUT.

use std::time::Duration;

use anyhow::{Context, Result};
use serde_json::Value;

use super::RemoteStore;
use crate::error::RemoteError;

pub struct RestStore {
    client: reqwest::Client,
    base: String,
    auth: Option<String>,
}

impl RestStore {
    /// `auth` is an already-issued token passed through as the `auth` query
    /// parameter; obtaining it is someone else's job.
    pub fn new(base_url: &str, auth: Option<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build http client")?;

        Ok(Self {
            client,
            base: base_url.trim_end_matches('/').to_string(),
            auth,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}.json", self.base, path.trim_matches('/'))
    }

    fn authed(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.auth {
            Some(token) => req.query(&[("auth", token)]),
            None => req,
        }
    }
}

/// Transport errors carry the request URL, which carries the token.
fn unavailable(e: reqwest::Error) -> RemoteError {
    RemoteError::Unavailable(e.without_url().to_string())
}

impl RemoteStore for RestStore {
    fn is_ready(&self) -> bool {
        // No session to lose: each request stands alone.
        true
    }

    async fn get(&mut self, path: &str) -> Result<Value, RemoteError> {
        let resp = self
            .authed(self.client.get(self.url(path)))
            .send()
            .await
            .map_err(unavailable)?
            .error_for_status()
            .map_err(unavailable)?;

        let value: Value = resp.json().await.map_err(unavailable)?;
        if value.is_null() {
            return Err(RemoteError::Missing(path.to_string()));
        }
        Ok(value)
    }

    async fn set(&mut self, path: &str, value: Value) -> Result<(), RemoteError> {
        self.authed(self.client.put(self.url(path)))
            .json(&value)
            .send()
            .await
            .map_err(unavailable)?
            .error_for_status()
            .map_err(unavailable)?;
        Ok(())
    }
}
