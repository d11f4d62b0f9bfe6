use serde::{Deserialize, Serialize};
use std::time::Duration;

/// HTTP method of a request.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    derive_more::Display,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    #[default]
    #[display("GET")]
    Get,
    #[display("POST")]
    Post,
    #[display("PUT")]
    Put,
    #[display("PATCH")]
    Patch,
    #[display("DELETE")]
    Delete,
    #[display("HEAD")]
    Head,
    #[display("OPTIONS")]
    Options,
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Patch => reqwest::Method::PATCH,
            Method::Delete => reqwest::Method::DELETE,
            Method::Head => reqwest::Method::HEAD,
            Method::Options => reqwest::Method::OPTIONS,
        }
    }
}

/// Options for a single request, passed through to the transport as-is.
///
/// The abort signal is not part of the config; the hook injects its own
/// signal for every cycle. Equality is structural, so a config can be used
/// as part of a hook's dependency key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestConfig {
    pub method: Method,
    pub headers: Vec<(String, String)>,
    /// Query parameters appended to the url.
    pub params: Vec<(String, String)>,
    /// JSON body, sent with a `Content-Type: application/json` header.
    pub body: Option<serde_json::Value>,
    pub timeout: Option<Duration>,
    /// Include cookies on cross-origin requests (browser only).
    pub with_credentials: bool,
}

impl RequestConfig {
    pub fn new(method: Method) -> Self {
        Self {
            method,
            ..Default::default()
        }
    }

    pub fn get() -> Self {
        Self::new(Method::Get)
    }

    pub fn post() -> Self {
        Self::new(Method::Post)
    }

    pub fn put() -> Self {
        Self::new(Method::Put)
    }

    pub fn patch() -> Self {
        Self::new(Method::Patch)
    }

    pub fn delete() -> Self {
        Self::new(Method::Delete)
    }

    pub fn header(
        mut self,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn query(
        mut self,
        name: impl Into<String>,
        value: impl ToString,
    ) -> Self {
        self.params.push((name.into(), value.to_string()));
        self
    }

    /// Serialize `body` as the JSON request body.
    pub fn json(
        mut self,
        body: &impl Serialize,
    ) -> Result<Self, serde_json::Error> {
        self.body = Some(serde_json::to_value(body)?);
        Ok(self)
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_credentials(mut self) -> Self {
        self.with_credentials = true;
        self
    }
}
