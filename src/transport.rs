use reqwest::Client;
use serde::Serialize;

use crate::config::NotifierConfig;
use crate::error::TransportError;

/// JSON POST client shared by the email and push channels.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(config: &NotifierConfig) -> reqwest::Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
        })
    }

    /// Posts `body` as JSON and returns the decoded response body.
    /// An empty success body decodes as `null`.
    pub async fn post_json<B>(&self, url: &str, body: &B) -> Result<serde_json::Value, TransportError>
    where
        B: Serialize + ?Sized,
    {
        tracing::debug!(url, "POST");

        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|source| TransportError::Request {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        let text = response.text().await.map_err(|source| TransportError::Request {
            url: url.to_string(),
            source,
        })?;

        if !status.is_success() {
            return Err(TransportError::Status {
                url: url.to_string(),
                status,
                body: text,
            });
        }

        if text.trim().is_empty() {
            return Ok(serde_json::Value::Null);
        }

        serde_json::from_str(&text).map_err(|source| TransportError::Decode {
            url: url.to_string(),
            source,
        })
    }
}

pub fn endpoint_url(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}
