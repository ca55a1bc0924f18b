//! TLS verification policy, resolved once per request.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::warn;

/// TLS settings for a single request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct TlsOptions {
    pub(crate) verify: bool,
    /// Trust anchor for certificate validation; only set when `verify` is on.
    pub(crate) ca_bundle: Option<PathBuf>,
}

impl TlsOptions {
    fn insecure() -> Self {
        Self {
            verify: false,
            ca_bundle: None,
        }
    }
}

/// Warning emitted the first time a request runs without verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum TlsWarning {
    VerificationDisabled,
    BundleUnreadable(PathBuf),
}

/// Per-client TLS configuration plus one-shot warning suppression flags.
///
/// The flags are plain atomics; a race between concurrent callers can at
/// worst duplicate a warning, which is accepted.
#[derive(Debug)]
pub(crate) struct TlsConfig {
    pub(crate) verify_ssl_certs: bool,
    pub(crate) ca_bundle_path: PathBuf,
    warned_no_verify: AtomicBool,
    warned_no_bundle: AtomicBool,
}

impl TlsConfig {
    pub(crate) fn new(verify_ssl_certs: bool, ca_bundle_path: PathBuf) -> Self {
        Self {
            verify_ssl_certs,
            ca_bundle_path,
            warned_no_verify: AtomicBool::new(false),
            warned_no_bundle: AtomicBool::new(false),
        }
    }

    /// Decide the TLS options for the next request, logging any one-time
    /// warning.
    pub(crate) fn resolve(&self) -> TlsOptions {
        let (options, warning) = self.resolve_inner();
        match warning {
            Some(TlsWarning::VerificationDisabled) => warn!(
                "running without SSL certificate verification; \
                 call ClientBuilder::verify_ssl_certs(true) to re-enable it"
            ),
            Some(TlsWarning::BundleUnreadable(path)) => warn!(
                path = %path.display(),
                "running without SSL certificate verification because the CA bundle is not readable"
            ),
            None => {}
        }
        options
    }

    /// Resolution without the logging side effect, so tests can assert on
    /// which warning fires and how often.
    fn resolve_inner(&self) -> (TlsOptions, Option<TlsWarning>) {
        if !self.verify_ssl_certs {
            let warning = (!self.warned_no_verify.swap(true, Ordering::Relaxed))
                .then_some(TlsWarning::VerificationDisabled);
            (TlsOptions::insecure(), warning)
        } else if !file_readable(&self.ca_bundle_path) {
            let warning = (!self.warned_no_bundle.swap(true, Ordering::Relaxed))
                .then(|| TlsWarning::BundleUnreadable(self.ca_bundle_path.clone()));
            (TlsOptions::insecure(), warning)
        } else {
            let options = TlsOptions {
                verify: true,
                ca_bundle: Some(self.ca_bundle_path.clone()),
            };
            (options, None)
        }
    }
}

/// Whether `path` can currently be opened for reading. Never errors; any
/// failure (missing file, permissions) counts as unreadable.
fn file_readable(path: &Path) -> bool {
    File::open(path).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    fn scratch_bundle(name: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("emailyak-test-{}-{name}", std::process::id()));
        let mut file = File::create(&path).unwrap();
        file.write_all(b"opaque bundle bytes").unwrap();
        path
    }

    #[test]
    fn disabled_verification_warns_exactly_once() {
        let config = TlsConfig::new(false, PathBuf::from("/nonexistent/bundle.crt"));

        let (options, warning) = config.resolve_inner();
        assert_eq!(options, TlsOptions::insecure());
        assert_eq!(warning, Some(TlsWarning::VerificationDisabled));

        let (options, warning) = config.resolve_inner();
        assert_eq!(options, TlsOptions::insecure());
        assert_eq!(warning, None);
    }

    #[test]
    fn unreadable_bundle_falls_back_with_a_distinct_one_time_warning() {
        let missing = PathBuf::from("/nonexistent/emailyak-ca-bundle.crt");
        let config = TlsConfig::new(true, missing.clone());

        let (options, warning) = config.resolve_inner();
        assert_eq!(options, TlsOptions::insecure());
        assert_eq!(warning, Some(TlsWarning::BundleUnreadable(missing)));

        let (_, warning) = config.resolve_inner();
        assert_eq!(warning, None);
    }

    #[test]
    fn readable_bundle_enables_verification_with_the_path_as_trust_anchor() {
        let bundle = scratch_bundle("readable");
        let config = TlsConfig::new(true, bundle.clone());

        let (options, warning) = config.resolve_inner();
        assert!(options.verify);
        assert_eq!(options.ca_bundle.as_deref(), Some(bundle.as_path()));
        assert_eq!(warning, None);

        std::fs::remove_file(&bundle).unwrap();
    }

    #[test]
    fn bundle_vanishing_between_requests_still_warns_only_once() {
        let bundle = scratch_bundle("vanishing");
        let config = TlsConfig::new(true, bundle.clone());

        let (options, _) = config.resolve_inner();
        assert!(options.verify);

        std::fs::remove_file(&bundle).unwrap();

        let (options, warning) = config.resolve_inner();
        assert!(!options.verify);
        assert_eq!(warning, Some(TlsWarning::BundleUnreadable(bundle)));

        let (_, warning) = config.resolve_inner();
        assert_eq!(warning, None);
    }

    #[test]
    fn file_readable_never_errors() {
        assert!(!file_readable(Path::new("/definitely/not/a/real/path")));
    }
}
