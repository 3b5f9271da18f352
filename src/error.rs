use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} responded with {status}: {body}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("could not decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Failure of the primary (email) channel. Push failures never end up here.
#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("failed to deliver {endpoint} notification")]
    Delivery {
        endpoint: &'static str,
        #[source]
        source: TransportError,
    },
}
