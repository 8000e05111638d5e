//! HTTP transport for the async client

use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};

use crate::{Result, client::ReceiverOptions, client::TpiTransport, error::TpiError};

/// [`TpiTransport`] over a shared `reqwest` client
///
/// The Basic authorization header, when configured, is attached once
/// to every request.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Builds the transport; no request is issued
    pub fn new(options: &ReceiverOptions) -> Result<Self> {
        let mut headers = HeaderMap::new();
        if let Some(auth) = options.authorization() {
            let mut value = HeaderValue::from_str(&auth)
                .map_err(|_| TpiError::Configuration("Invalid receiver credentials"))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .map_err(TpiError::transport)?;
        Ok(HttpTransport { client })
    }
}

impl TpiTransport for HttpTransport {
    async fn get(&self, uri: &str) -> Result<String> {
        let response = self
            .client
            .get(uri)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(TpiError::transport)?;
        response.text().await.map_err(TpiError::transport)
    }
}
