use futures::FutureExt;
use futures::future::LocalBoxFuture;
use serde::de::DeserializeOwned;

use crate::{AbortSignal, FetchError, RequestConfig};

/// A settled response, with the body decoded as JSON.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub data: serde_json::Value,
}

impl Response {
    /// A 200 response carrying `data`.
    pub fn ok(data: serde_json::Value) -> Self {
        Self {
            status: 200,
            headers: Vec::new(),
            data,
        }
    }

    /// Decode the body into the caller's type.
    pub fn decode<T: DeserializeOwned>(self) -> Result<T, FetchError> {
        Ok(serde_json::from_value(self.data)?)
    }
}

/// Performs HTTP requests on behalf of a fetch hook.
///
/// Implementations must honour `signal`: once it is aborted the returned
/// future settles with [`FetchError::Aborted`]. A transport that ignores the
/// signal is still safe to use, its late result is discarded by the hook.
pub trait Transport {
    fn perform(
        &self,
        url: &str,
        config: &RequestConfig,
        signal: AbortSignal,
    ) -> LocalBoxFuture<'static, Result<Response, FetchError>>;
}

/// A reqwest-backed transport.
#[derive(Debug, Clone, Default)]
pub struct HttpClient {
    /// Prefix for relative urls, e.g. `https://example.com`.
    pub base_url: Option<String>,
    pub inner_client: reqwest::Client,
}

impl HttpClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: Some(base_url.into()),
            inner_client: reqwest::Client::new(),
        }
    }

    fn format_url(&self, url: &str) -> String {
        match &self.base_url {
            Some(base) if !is_absolute(url) => format!(
                "{}/{}",
                base.trim_end_matches('/'),
                url.trim_start_matches('/')
            ),
            _ => url.to_string(),
        }
    }

    fn build(
        &self,
        url: &str,
        config: &RequestConfig,
    ) -> reqwest::RequestBuilder {
        let mut request = self
            .inner_client
            .request(config.method.into(), self.format_url(url));

        for (name, value) in &config.headers {
            request = request.header(name, value);
        }
        if !config.params.is_empty() {
            request = request.query(&config.params);
        }
        if let Some(body) = &config.body {
            request = request.json(body);
        }

        #[cfg(not(target_arch = "wasm32"))]
        if let Some(timeout) = config.timeout {
            request = request.timeout(timeout);
        }

        #[cfg(target_arch = "wasm32")]
        if config.with_credentials {
            request = request.fetch_credentials_include();
        }

        request
    }
}

impl Transport for HttpClient {
    fn perform(
        &self,
        url: &str,
        config: &RequestConfig,
        signal: AbortSignal,
    ) -> LocalBoxFuture<'static, Result<Response, FetchError>> {
        let request = self.build(url, config);
        async move {
            signal
                .guard(async move {
                    let response = request.send().await?;
                    ok_json(response).await
                })
                .await
        }
        .boxed_local()
    }
}

/// Convert a reqwest response into a [`Response`], or return an
/// appropriate error for non-2xx statuses.
pub async fn ok_json(
    response: reqwest::Response,
) -> Result<Response, FetchError> {
    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Status {
            status: status.as_u16(),
            message: response.text().await?,
        });
    }

    let headers = response
        .headers()
        .iter()
        .filter_map(|(name, value)| {
            Some((name.to_string(), value.to_str().ok()?.to_string()))
        })
        .collect();

    let body = response.bytes().await?;
    let data = if body.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&body)?
    };

    Ok(Response {
        status: status.as_u16(),
        headers,
        data,
    })
}

fn is_absolute(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}
