//! Error taxonomy and translation of transport and API failures.

use std::error::Error as StdError;

/// Errors surfaced by EmailYak API calls.
///
/// Every failure is terminal for the call that produced it; the crate never
/// retries on the caller's behalf.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The client was misconfigured; raised before any network I/O.
    #[error("{0}")]
    Configuration(String),

    /// A transport-level failure: the request never reached EmailYak or got
    /// no usable response.
    #[error("{0}")]
    Connection(String),

    /// EmailYak answered with a non-success status code.
    #[error("{message}")]
    ResponseCode {
        message: String,
        code: u16,
        body: String,
    },

    /// The status implied success but the body was not a valid JSON object.
    #[error("Invalid response object from API: {body:?} (HTTP response code was {code})")]
    MalformedResponse { code: u16, body: String },
}

/// Fixed status-code to message table from the EmailYak API reference.
const STATUS_MESSAGES: &[(u16, &str)] = &[
    (402, "Invalid JSON/XML. Malformed JSON/XML syntax."),
    (403, "Permission denied."),
    (420, "Internal Error. There was an error in the system."),
    (421, "Input Parameter Error."),
    (423, "API key does not exist."),
    (424, "Account disabled."),
    (426, "Domain has been disabled."),
    (427, "The domain is not registered with the service."),
    (428, "The requested record is not found."),
    (430, "Account not allowed access to requested API version."),
    (431, "Invalid Response Format. Specify json or xml in the URL."),
    (432, "Invalid Request Format. Needs to be JSON or XML."),
    (503, "Service temporarily down."),
];

/// Map a non-success API status code and raw body to a [`Error::ResponseCode`].
pub(crate) fn response_code_error(code: u16, body: String) -> Error {
    let message = STATUS_MESSAGES
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, m)| (*m).to_string())
        .unwrap_or_else(|| format!("Unrecognized return code {code}"));

    Error::ResponseCode {
        message,
        code,
        body,
    }
}

/// Broad classification of a transport-level failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TransportKind {
    Connect,
    CertVerification,
    Dns,
    Other,
}

/// Map an opaque transport failure to a [`Error::Connection`] with a
/// human-readable message.
pub(crate) fn connection_error(api_base: &str, err: &reqwest::Error) -> Error {
    Error::Connection(connection_message(
        transport_kind(err),
        api_base,
        &err.to_string(),
    ))
}

/// Classify a `reqwest` error by inspecting its flags and source chain.
///
/// reqwest does not expose TLS or DNS failures as variants, so certificate
/// and resolver problems are recognized from the underlying error text.
fn transport_kind(err: &reqwest::Error) -> TransportKind {
    let chain = source_chain(err).to_lowercase();
    if chain.contains("certificate") {
        TransportKind::CertVerification
    } else if chain.contains("dns error") || chain.contains("failed to lookup address") {
        TransportKind::Dns
    } else if err.is_timeout() || err.is_connect() {
        TransportKind::Connect
    } else {
        TransportKind::Other
    }
}

/// Concatenated messages of an error and all its sources.
fn source_chain(err: &(dyn StdError + 'static)) -> String {
    let mut parts = vec![err.to_string()];
    let mut source = err.source();
    while let Some(inner) = source {
        parts.push(inner.to_string());
        source = inner.source();
    }
    parts.join(": ")
}

fn connection_message(kind: TransportKind, api_base: &str, detail: &str) -> String {
    let message = match kind {
        TransportKind::Connect => format!(
            "Could not connect to EmailYak ({api_base}). \
             Please check your internet connection and try again."
        ),
        TransportKind::CertVerification => "Could not verify EmailYak's SSL certificate. \
             Please make sure that your network is not intercepting certificates."
            .to_string(),
        TransportKind::Dns => "Unexpected error communicating when trying to connect to EmailYak. \
             HINT: You may be seeing this message because your DNS is not working. \
             To check, try running 'host emailyak.com' from the command line."
            .to_string(),
        TransportKind::Other => "Unexpected error communicating with EmailYak.".to_string(),
    };
    format!("{message}\n\n(Network error: {detail})")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_table_code_maps_to_its_message() {
        for (code, expected) in STATUS_MESSAGES {
            let err = response_code_error(*code, "raw body".to_string());
            match err {
                Error::ResponseCode {
                    message,
                    code: stored_code,
                    body,
                } => {
                    assert_eq!(message, *expected);
                    assert_eq!(stored_code, *code);
                    assert_eq!(body, "raw body");
                }
                other => panic!("expected ResponseCode, got {other:?}"),
            }
        }
    }

    #[test]
    fn unrecognized_code_message_contains_the_code() {
        let err = response_code_error(599, "{}".to_string());
        match err {
            Error::ResponseCode { message, code, .. } => {
                assert_eq!(code, 599);
                assert!(message.contains("599"), "message was {message:?}");
                assert!(message.starts_with("Unrecognized return code"));
            }
            other => panic!("expected ResponseCode, got {other:?}"),
        }
    }

    #[test]
    fn connection_messages_carry_the_network_detail_suffix() {
        for kind in [
            TransportKind::Connect,
            TransportKind::CertVerification,
            TransportKind::Dns,
            TransportKind::Other,
        ] {
            let message = connection_message(kind, "https://api.emailyak.com/v1", "broken pipe");
            assert!(message.ends_with("(Network error: broken pipe)"));
        }
    }

    #[test]
    fn connect_message_names_the_api_base() {
        let message = connection_message(
            TransportKind::Connect,
            "https://api.emailyak.com/v1",
            "timed out",
        );
        assert!(message.contains("https://api.emailyak.com/v1"));
        assert!(message.contains("check your internet connection"));
    }

    #[test]
    fn cert_and_dns_messages_are_distinct() {
        let cert = connection_message(TransportKind::CertVerification, "base", "x");
        let dns = connection_message(TransportKind::Dns, "base", "x");
        assert!(cert.contains("SSL certificate"));
        assert!(dns.contains("DNS"));
        assert_ne!(cert, dns);
    }

    #[test]
    fn malformed_response_display_includes_body_and_code() {
        let err = Error::MalformedResponse {
            code: 200,
            body: "not json".to_string(),
        };
        let rendered = err.to_string();
        assert!(rendered.contains("not json"));
        assert!(rendered.contains("200"));
    }
}
