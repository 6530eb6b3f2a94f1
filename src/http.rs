use crate::error::TransportError;
use crate::transport::{PushRequest, Transport};
use async_trait::async_trait;
use reqwest::{redirect, Client};

/// [`Transport`] backed by a pooled `reqwest` client.
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Client that does not follow redirects: a 3xx answer is a failed
    /// attempt, so the push body is never replayed against another host.
    pub fn new() -> Result<Self, reqwest::Error> {
        let client = Client::builder().redirect(redirect::Policy::none()).build()?;
        Ok(Self::with_client(client))
    }

    /// Reuse an existing client, e.g. one with custom TLS settings.
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn post(&self, url: &str, request: &PushRequest) -> Result<(), TransportError> {
        let mut builder = self
            .client
            .post(url)
            .timeout(request.timeout)
            .body(request.body.clone());
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let resp = builder.send().await?;
        if resp.status().is_success() {
            Ok(())
        } else {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_else(|_| "<no body>".to_string());
            Err(TransportError::Status { status, body })
        }
    }
}
