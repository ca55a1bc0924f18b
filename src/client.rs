//! EmailYak async client implementation.

use std::path::PathBuf;
use std::time::Duration;

use reqwest::Method;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;

use crate::tls::{TlsConfig, TlsOptions};
use crate::{Error, Result, error};

const API_BASE: &str = "https://api.emailyak.com/v1";
const CA_BUNDLE_PATH: &str = "data/ca-certificates.crt";

const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(80);

/// Request parameters, keyed by field name.
///
/// Attached as the query string for GET/HEAD/DELETE requests and sent as the
/// JSON body for everything else.
pub type Params = serde_json::Map<String, serde_json::Value>;

/// A decoded API response together with the API key that made the call.
///
/// The key is surfaced so callers relying on the client's default key can
/// observe which one was actually used.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub data: serde_json::Map<String, serde_json::Value>,
    pub api_key: String,
}

impl ApiResponse {
    /// Deserialize the response payload into a caller-defined type.
    pub fn deserialize<T: DeserializeOwned>(&self) -> serde_json::Result<T> {
        serde_json::from_value(serde_json::Value::Object(self.data.clone()))
    }
}

/// Async client for the EmailYak email API.
///
/// Use [`Client::new`] for defaults or [`Client::builder`] to set the API
/// key, base URL, and TLS behavior. Construction performs no I/O; nothing is
/// validated until a request is made.
#[derive(Debug)]
pub struct Client {
    api_key: Option<String>,
    api_base: String,
    tls: TlsConfig,
}

impl Client {
    /// Create a builder for configuring the client.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Create a client with default settings and no API key.
    ///
    /// Requests made through such a client must pass an explicit key.
    pub fn new() -> Self {
        ClientBuilder::new().build()
    }

    /// The configured default API key, if any.
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    /// The API base URL.
    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    /// Whether server certificates are verified.
    pub fn verify_ssl_certs(&self) -> bool {
        self.tls.verify_ssl_certs
    }

    /// Path to the CA bundle used as the trust anchor.
    pub fn ca_bundle_path(&self) -> &std::path::Path {
        &self.tls.ca_bundle_path
    }

    /// List all emails visible to the API key, optionally filtered.
    ///
    /// # Examples
    /// ```no_run
    /// # #[tokio::main]
    /// # async fn main() -> Result<(), emailyak::Error> {
    /// let client = emailyak::Client::builder().api_key("my-key").build();
    /// let response = client.get_all_emails(emailyak::Params::new()).await?;
    /// println!("{:?}", response.data);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn get_all_emails(&self, params: Params) -> Result<ApiResponse> {
        self.request(Method::GET, "get/all/email/", None, Some(params), None)
            .await
    }

    /// Issue a raw API request.
    ///
    /// Escape hatch for endpoints the crate does not wrap. `api_key` falls
    /// back to the client default; `params` become the query string or JSON
    /// body depending on the method; `headers` are merged into the defaults.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        api_key: Option<&str>,
        params: Option<Params>,
        headers: Option<HeaderMap>,
    ) -> Result<ApiResponse> {
        let api_key = api_key
            .or(self.api_key.as_deref())
            .filter(|key| !key.is_empty())
            .ok_or_else(|| {
                Error::Configuration(
                    "No API key provided. (HINT: set your API key with \
                     ClientBuilder::api_key(<API-KEY>).)"
                        .to_string(),
                )
            })?;

        let options = self.build_request(method, path, api_key, params, headers);
        let (code, body) = self.execute(options).await?;

        if !(200..300).contains(&code) {
            return Err(error::response_code_error(code, body));
        }

        decode_response(code, &body, api_key)
    }

    /// Assemble per-call request options: URL, auth, parameter placement,
    /// timeouts, and the resolved TLS policy.
    fn build_request(
        &self,
        method: Method,
        path: &str,
        api_key: &str,
        params: Option<Params>,
        extra_headers: Option<HeaderMap>,
    ) -> RequestOptions {
        let url = format!(
            "{}/{}/json/{}",
            self.api_base.trim_end_matches('/'),
            api_key,
            path.trim_start_matches('/'),
        );

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        if let Some(extra) = extra_headers {
            headers.extend(extra);
        }

        // GET-style methods carry parameters in the query string; everything
        // else sends them as the JSON payload.
        let (query, payload) = if matches!(method, Method::GET | Method::HEAD | Method::DELETE) {
            (params, None)
        } else {
            (None, params)
        };

        RequestOptions {
            method,
            url,
            api_key: api_key.to_string(),
            headers,
            query,
            payload,
            connect_timeout: CONNECT_TIMEOUT,
            timeout: REQUEST_TIMEOUT,
            tls: self.tls.resolve(),
        }
    }

    /// Perform the HTTP call. The only place real I/O happens; transport
    /// failures are translated here and nothing is retried.
    async fn execute(&self, options: RequestOptions) -> Result<(u16, String)> {
        let mut builder = reqwest::Client::builder()
            .connect_timeout(options.connect_timeout)
            .timeout(options.timeout);

        if options.tls.verify {
            if let Some(path) = &options.tls.ca_bundle {
                let pem = std::fs::read(path).map_err(|e| {
                    Error::Connection(format!(
                        "Could not read the CA bundle at {}.\n\n(Network error: {e})",
                        path.display()
                    ))
                })?;
                let certs = reqwest::Certificate::from_pem_bundle(&pem)
                    .map_err(|e| error::connection_error(&self.api_base, &e))?;
                builder = builder.tls_built_in_root_certs(false);
                for cert in certs {
                    builder = builder.add_root_certificate(cert);
                }
            }
        } else {
            builder = builder.danger_accept_invalid_certs(true);
        }

        let http = builder
            .build()
            .map_err(|e| error::connection_error(&self.api_base, &e))?;

        let mut request = http
            .request(options.method, &options.url)
            .basic_auth(&options.api_key, None::<&str>)
            .headers(options.headers);
        if let Some(query) = &options.query {
            request = request.query(query);
        }
        if let Some(payload) = &options.payload {
            request = request.json(payload);
        }

        let response = request
            .send()
            .await
            .map_err(|e| error::connection_error(&self.api_base, &e))?;

        let code = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| error::connection_error(&self.api_base, &e))?;

        Ok((code, body))
    }
}

/// Everything needed to perform one HTTP call. Built per request and
/// discarded after execution.
#[derive(Debug)]
struct RequestOptions {
    method: Method,
    url: String,
    api_key: String,
    headers: HeaderMap,
    query: Option<Params>,
    payload: Option<Params>,
    connect_timeout: Duration,
    timeout: Duration,
    tls: TlsOptions,
}

/// Parse a nominally successful response body as a JSON object.
fn decode_response(code: u16, body: &str, api_key: &str) -> Result<ApiResponse> {
    let malformed = || Error::MalformedResponse {
        code,
        body: body.to_string(),
    };

    let value: serde_json::Value = serde_json::from_str(body).map_err(|_| malformed())?;
    match value {
        serde_json::Value::Object(data) => Ok(ApiResponse {
            data,
            api_key: api_key.to_string(),
        }),
        _ => Err(malformed()),
    }
}

/// Builder for configuring an EmailYak client.
///
/// Start with [`Client::builder`] to override defaults.
#[derive(Debug, Clone)]
pub struct ClientBuilder {
    api_key: Option<String>,
    api_base: String,
    verify_ssl_certs: bool,
    ca_bundle_path: PathBuf,
}

impl ClientBuilder {
    /// Create a new builder with default settings.
    ///
    /// Defaults:
    /// - No API key
    /// - Production API base URL
    /// - `verify_ssl_certs = true`
    /// - CA bundle at `data/ca-certificates.crt`
    pub fn new() -> Self {
        Self {
            api_key: None,
            api_base: API_BASE.to_string(),
            verify_ssl_certs: true,
            ca_bundle_path: PathBuf::from(CA_BUNDLE_PATH),
        }
    }

    /// Set the default API key used when a request passes none.
    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Override the API base URL.
    ///
    /// Useful for testing against a local mock server.
    pub fn api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    /// Control whether server certificates are verified (default: true).
    ///
    /// Disabling this logs a one-time warning on the first request.
    pub fn verify_ssl_certs(mut self, verify: bool) -> Self {
        self.verify_ssl_certs = verify;
        self
    }

    /// Override the CA bundle used as the TLS trust anchor.
    ///
    /// If the file is unreadable at request time, verification is skipped
    /// with a one-time warning rather than failing the call.
    pub fn ca_bundle_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.ca_bundle_path = path.into();
        self
    }

    /// Build the client. Performs no network I/O.
    pub fn build(self) -> Client {
        Client {
            api_key: self.api_key,
            api_base: self.api_base,
            tls: TlsConfig::new(self.verify_ssl_certs, self.ca_bundle_path),
        }
    }
}
