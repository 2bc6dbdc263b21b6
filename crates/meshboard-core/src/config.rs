// ── Controller connection configuration ──

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use url::Url;

use crate::routes::DEFAULT_SITE;

/// How to verify the controller's TLS certificate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// Use the system trust store.
    SystemDefaults,
    /// Trust only the given CA bundle.
    CustomCa(PathBuf),
    /// Accept any certificate. Controllers ship with self-signed
    /// certificates, so this is the out-of-the-box mode.
    #[default]
    DangerAcceptInvalid,
}

/// Everything needed to talk to one controller.
///
/// Built via [`new`](Self::new) plus the `with_*` setters; there is no
/// ambient global configuration and no environment lookup here.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Base URL of the controller, e.g. `https://192.168.1.1:8443`.
    pub url: Url,
    /// API key, redacted in Debug output.
    pub api_key: SecretString,
    /// Site batches are addressed to by default.
    pub site: String,
    pub tls: TlsVerification,
    /// HTTP client-level timeout (connection plus body).
    pub timeout: Duration,
    /// Scheduler-level cap on a single per-target request.
    pub request_timeout: Duration,
    /// Background refresh period; `0` disables polling.
    pub poll_interval_secs: u64,
}

impl ControllerConfig {
    pub fn new(url: Url, api_key: impl Into<SecretString>) -> Self {
        Self {
            url,
            api_key: api_key.into(),
            site: DEFAULT_SITE.to_owned(),
            tls: TlsVerification::default(),
            timeout: Duration::from_secs(30),
            request_timeout: Duration::from_secs(30),
            poll_interval_secs: 0,
        }
    }

    pub fn with_site(mut self, site: impl Into<String>) -> Self {
        self.site = site.into();
        self
    }

    pub fn with_tls(mut self, tls: TlsVerification) -> Self {
        self.tls = tls;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Enable background polling every `secs` seconds.
    pub fn with_poll_interval_secs(mut self, secs: u64) -> Self {
        self.poll_interval_secs = secs;
        self
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn defaults_target_the_default_site() {
        let config = ControllerConfig::new(
            Url::parse("https://10.0.0.1:8443").unwrap(),
            "secret-key",
        );
        assert_eq!(config.site, "default");
        assert_eq!(config.tls, TlsVerification::DangerAcceptInvalid);
        assert_eq!(config.poll_interval_secs, 0);
    }

    #[test]
    fn api_key_is_redacted_in_debug_output() {
        let config = ControllerConfig::new(
            Url::parse("https://10.0.0.1:8443").unwrap(),
            "secret-key",
        );
        let debug = format!("{config:?}");
        assert!(!debug.contains("secret-key"));
    }
}
