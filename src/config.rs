//! Client configuration: defaults, transport settings and ordered options.
//!
//! A [`crate::Client`] is configured by a sequence of [`ClientOption`] steps
//! applied, in the order given, to a [`ClientConfig`] that starts from the
//! defaults below. Each step can reject the configuration on its own, and the
//! first rejection aborts construction. [`ClientBuilder`] is the fluent front
//! end for the same sequence.
//!
//! # Example
//! ```rust
//! use std::time::Duration;
//! use typst_pdf_client::Client;
//!
//! let client = Client::builder("secret", "https://gateway.example.com/function/typst")
//!     .timeout(Duration::from_secs(30))
//!     .build()
//!     .unwrap();
//! assert_eq!(client.timeout(), Duration::from_secs(30));
//! ```

use crate::client::Client;
use crate::error::TypstPdfError;
use std::fmt;
use std::time::Duration;

/// Overall per-call timeout. Default: 120 s.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);
/// Idle connections kept per host. Default: 10.
pub const DEFAULT_MAX_IDLE_CONNECTIONS: usize = 10;
/// How long an idle pooled connection survives. Default: 30 s.
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(30);
/// Connection establishment limit, TLS handshake included. Default: 10 s.
pub const DEFAULT_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

/// Environment variable holding the gateway credential.
pub const AUTH_KEY_ENV: &str = "PDF_GENERATOR_AUTH_KEY";
/// Environment variable holding the gateway URL.
pub const GATEWAY_ENV: &str = "PDF_GENERATOR_ENDPOINT";

/// Settings for the transport the client builds and owns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportSettings {
    pub max_idle_per_host: usize,
    pub idle_timeout: Duration,
    pub connect_timeout: Duration,
    /// Skip TLS certificate verification. Only for test gateways.
    pub accept_invalid_certs: bool,
}

impl Default for TransportSettings {
    fn default() -> Self {
        Self {
            max_idle_per_host: DEFAULT_MAX_IDLE_CONNECTIONS,
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
            connect_timeout: DEFAULT_HANDSHAKE_TIMEOUT,
            accept_invalid_certs: false,
        }
    }
}

impl TransportSettings {
    fn build(&self) -> Result<reqwest::Client, TypstPdfError> {
        reqwest::Client::builder()
            .pool_max_idle_per_host(self.max_idle_per_host)
            .pool_idle_timeout(self.idle_timeout)
            .connect_timeout(self.connect_timeout)
            .danger_accept_invalid_certs(self.accept_invalid_certs)
            .build()
            .map_err(|e| TypstPdfError::connection("failed to build HTTP transport", e))
    }
}

/// The HTTP transport a client sends through.
#[derive(Clone)]
pub enum Transport {
    /// Built by the client from these settings; TLS options can be adjusted.
    Managed(TransportSettings),
    /// Supplied ready-made by the caller; opaque to the client.
    Custom(reqwest::Client),
}

impl fmt::Debug for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Transport::Managed(settings) => f.debug_tuple("Managed").field(settings).finish(),
            Transport::Custom(_) => f.write_str("Custom(<reqwest::Client>)"),
        }
    }
}

impl Transport {
    pub(crate) fn into_http_client(self) -> Result<reqwest::Client, TypstPdfError> {
        match self {
            Transport::Managed(settings) => settings.build(),
            Transport::Custom(client) => Ok(client),
        }
    }
}

/// Mutable configuration the [`ClientOption`] steps operate on.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub timeout: Duration,
    pub transport: Transport,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            transport: Transport::Managed(TransportSettings::default()),
        }
    }
}

/// One construction-time override.
#[derive(Debug, Clone)]
pub enum ClientOption {
    /// Replace the overall per-call timeout.
    Timeout(Duration),
    /// Install a caller-built transport. `None` is rejected.
    ///
    /// The client's own timeout is not consulted: every request carries the
    /// configured [`ClientOption::Timeout`] (default 120s), which takes
    /// precedence over any timeout set on the supplied `reqwest::Client`.
    HttpClient(Option<reqwest::Client>),
    /// Disable TLS certificate verification on the managed transport.
    /// Rejected when a caller-built transport is installed.
    InsecureSkipVerify,
}

impl ClientOption {
    /// Apply this step to `config`.
    pub fn apply(self, config: &mut ClientConfig) -> Result<(), TypstPdfError> {
        match self {
            ClientOption::Timeout(timeout) => {
                config.timeout = timeout;
                Ok(())
            }
            ClientOption::HttpClient(Some(client)) => {
                config.transport = Transport::Custom(client);
                Ok(())
            }
            ClientOption::HttpClient(None) => Err(TypstPdfError::InvalidConfiguration(
                "http client cannot be None".into(),
            )),
            ClientOption::InsecureSkipVerify => match &mut config.transport {
                Transport::Managed(settings) => {
                    settings.accept_invalid_certs = true;
                    Ok(())
                }
                Transport::Custom(_) => Err(TypstPdfError::InvalidConfiguration(
                    "cannot enable insecure TLS verification skip on a caller-supplied http client"
                        .into(),
                )),
            },
        }
    }
}

/// Builder for [`Client`]. Options are recorded in call order and applied by
/// [`ClientBuilder::build`].
#[derive(Debug)]
pub struct ClientBuilder {
    auth_key: String,
    gateway: String,
    options: Vec<ClientOption>,
}

impl ClientBuilder {
    pub fn new(auth_key: impl Into<String>, gateway: impl Into<String>) -> Self {
        Self {
            auth_key: auth_key.into(),
            gateway: gateway.into(),
            options: Vec::new(),
        }
    }

    pub fn timeout(self, timeout: Duration) -> Self {
        self.option(ClientOption::Timeout(timeout))
    }

    pub fn http_client(self, client: reqwest::Client) -> Self {
        self.option(ClientOption::HttpClient(Some(client)))
    }

    pub fn insecure_skip_verify(self) -> Self {
        self.option(ClientOption::InsecureSkipVerify)
    }

    pub fn option(mut self, option: ClientOption) -> Self {
        self.options.push(option);
        self
    }

    /// Validate the credential and gateway, then apply the recorded options.
    pub fn build(self) -> Result<Client, TypstPdfError> {
        Client::new(self.auth_key, self.gateway, self.options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = ClientConfig::default();
        assert_eq!(config.timeout, Duration::from_secs(120));
        match config.transport {
            Transport::Managed(settings) => {
                assert_eq!(settings.max_idle_per_host, 10);
                assert_eq!(settings.idle_timeout, Duration::from_secs(30));
                assert_eq!(settings.connect_timeout, Duration::from_secs(10));
                assert!(!settings.accept_invalid_certs);
            }
            Transport::Custom(_) => panic!("default transport must be managed"),
        }
    }

    #[test]
    fn timeout_option_overrides_default() {
        let mut config = ClientConfig::default();
        ClientOption::Timeout(Duration::from_secs(5))
            .apply(&mut config)
            .unwrap();
        assert_eq!(config.timeout, Duration::from_secs(5));
    }

    #[test]
    fn none_http_client_is_rejected() {
        let mut config = ClientConfig::default();
        let err = ClientOption::HttpClient(None).apply(&mut config).unwrap_err();
        assert!(matches!(err, TypstPdfError::InvalidConfiguration(_)));
    }

    #[test]
    fn insecure_on_managed_transport_sets_flag() {
        let mut config = ClientConfig::default();
        ClientOption::InsecureSkipVerify.apply(&mut config).unwrap();
        match config.transport {
            Transport::Managed(settings) => assert!(settings.accept_invalid_certs),
            Transport::Custom(_) => panic!("transport should stay managed"),
        }
    }

    #[test]
    fn insecure_on_custom_transport_is_rejected() {
        let mut config = ClientConfig::default();
        ClientOption::HttpClient(Some(reqwest::Client::new()))
            .apply(&mut config)
            .unwrap();
        let err = ClientOption::InsecureSkipVerify
            .apply(&mut config)
            .unwrap_err();
        assert!(matches!(err, TypstPdfError::InvalidConfiguration(_)));
    }

    #[test]
    fn builder_records_options_in_order() {
        let builder = ClientBuilder::new("key", "https://example.com")
            .timeout(Duration::from_secs(1))
            .insecure_skip_verify();
        assert_eq!(builder.options.len(), 2);
        assert!(matches!(builder.options[0], ClientOption::Timeout(_)));
        assert!(matches!(builder.options[1], ClientOption::InsecureSkipVerify));
    }
}
