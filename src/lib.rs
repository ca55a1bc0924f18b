//! # EmailYak Client
//! Asynchronous client for the EmailYak email HTTP API, which sends and receives email through hosted domains. Configure an API key with [`ClientBuilder`], then list or manage emails through [`Client`].
//!
//! ## Authentication
//! Every request embeds the API key in the URL path (`<base>/<key>/json/<endpoint>`). The key can be set once on the client or passed per call; a request without any key fails before touching the network.
//!
//! ## Runtime requirements
//! Async-only; run inside a Tokio (v1) runtime. HTTP calls use `reqwest`, so ensure the chosen Tokio features (`rt-multi-thread` or `current_thread`) are available in your application.
//!
//! ## TLS
//! Server certificates are verified against a configurable CA bundle. If verification is disabled, or the bundle is unreadable, requests still go out but a warning is logged once per client via `tracing`.
//!
//! ## Errors
//! All failures surface as [`Error`]: configuration problems before any I/O, transport failures as [`Error::Connection`], non-success API statuses as [`Error::ResponseCode`] (with the EmailYak status table applied), and unparseable bodies as [`Error::MalformedResponse`]. The crate-wide [`Result`] alias wraps these errors.
//!
//! ## Example
//! ```no_run
//! use emailyak::{Client, Params};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), emailyak::Error> {
//!     let client = Client::builder().api_key("my-api-key").build();
//!
//!     let response = client.get_all_emails(Params::new()).await?;
//!     println!("emails: {:?}", response.data);
//!     Ok(())
//! }
//! ```

mod client;
mod error;
mod tls;

pub use client::{ApiResponse, Client, ClientBuilder, Params};
pub use error::Error;

/// Crate version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Result type alias for EmailYak operations.
///
/// This is equivalent to `std::result::Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
