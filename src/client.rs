//! The gateway client.
//!
//! A [`Client`] is cheap to clone and safe to share across tasks: it holds the
//! credential, the parsed gateway URL, the per-call timeout and a pooled
//! `reqwest::Client`. Nothing in it changes after construction.

use crate::config::{ClientBuilder, ClientConfig, ClientOption, AUTH_KEY_ENV, GATEWAY_ENV};
use crate::error::TypstPdfError;
use reqwest::Url;
use std::fmt;
use std::time::Duration;
use tracing::debug;

#[derive(Clone)]
pub struct Client {
    pub(crate) auth_key: String,
    pub(crate) gateway: Url,
    pub(crate) http: reqwest::Client,
    pub(crate) timeout: Duration,
}

impl Client {
    /// Create a client for `gateway`, authenticating with `auth_key`.
    ///
    /// `options` are applied in order after the defaults; the first one that
    /// fails aborts construction.
    ///
    /// # Errors
    /// - [`TypstPdfError::InvalidConfiguration`] for an empty credential, an
    ///   empty gateway, a gateway that is not a URL, or a rejected option.
    /// - [`TypstPdfError::Connection`] for a gateway scheme other than
    ///   `http`/`https`.
    pub fn new(
        auth_key: impl Into<String>,
        gateway: impl AsRef<str>,
        options: impl IntoIterator<Item = ClientOption>,
    ) -> Result<Self, TypstPdfError> {
        let auth_key = auth_key.into();
        let gateway = gateway.as_ref();

        if auth_key.is_empty() {
            return Err(TypstPdfError::InvalidConfiguration(
                "auth key cannot be empty".into(),
            ));
        }
        if gateway.is_empty() {
            return Err(TypstPdfError::InvalidConfiguration(
                "FaaS gateway cannot be empty".into(),
            ));
        }

        let gateway = Url::parse(gateway).map_err(|e| {
            TypstPdfError::InvalidConfiguration(format!("invalid gateway URL '{gateway}': {e}"))
        })?;

        if gateway.scheme() != "http" && gateway.scheme() != "https" {
            return Err(TypstPdfError::connection_msg(
                "invalid endpoint scheme: expected http or https",
            ));
        }

        let mut config = ClientConfig::default();
        for option in options {
            option.apply(&mut config)?;
        }
        debug!(
            "Client configured for {} (timeout {:?}, transport {:?})",
            gateway, config.timeout, config.transport
        );

        Ok(Self {
            auth_key,
            gateway,
            http: config.transport.into_http_client()?,
            timeout: config.timeout,
        })
    }

    /// Start a [`ClientBuilder`].
    pub fn builder(auth_key: impl Into<String>, gateway: impl Into<String>) -> ClientBuilder {
        ClientBuilder::new(auth_key, gateway)
    }

    /// Create a client from `PDF_GENERATOR_AUTH_KEY` and
    /// `PDF_GENERATOR_ENDPOINT`. Unset variables count as empty.
    pub fn from_env() -> Result<Self, TypstPdfError> {
        let auth_key = std::env::var(AUTH_KEY_ENV).unwrap_or_default();
        let gateway = std::env::var(GATEWAY_ENV).unwrap_or_default();
        Self::new(auth_key, gateway, [])
    }

    pub fn gateway(&self) -> &Url {
        &self.gateway
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("auth_key", &"<redacted>")
            .field("gateway", &self.gateway.as_str())
            .field("timeout", &self.timeout)
            .finish()
    }
}
