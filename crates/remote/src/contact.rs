use std::time::Duration;

use anyhow::{bail, Context, Result};
use reqwest::blocking::Client;
use reqwest::Url;
use serde::Serialize;
use tracing::{debug, info, warn};

/// The three visitor-entered fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactMessage {
    pub name: String,
    pub email: String,
    pub message: String,
}

/// Why a submission did not go through. Callers treat both the same way.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("form endpoint answered with status {status}")]
    Status { status: u16 },
    #[error("could not reach form endpoint: {0}")]
    Transport(String),
}

/// Sends one contact form. No retries.
pub trait ContactTransport {
    fn submit(&self, message: &ContactMessage) -> Result<(), TransportError>;
}

#[derive(Serialize)]
struct FormFields<'a> {
    access_key: &'a str,
    subject: &'a str,
    name: &'a str,
    email: &'a str,
    message: &'a str,
}

/// Form-encoded POST to a forms relay such as web3forms.
#[derive(Debug, Clone)]
pub struct HttpContactTransport {
    http: Client,
    endpoint: Url,
    access_key: String,
    subject: String,
}

impl HttpContactTransport {
    pub fn new(
        endpoint: &str,
        access_key: impl Into<String>,
        subject: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let endpoint =
            Url::parse(endpoint).with_context(|| format!("invalid form endpoint '{endpoint}'"))?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            bail!("form endpoint must be http(s), got '{endpoint}'");
        }
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            http,
            endpoint,
            access_key: access_key.into(),
            subject: subject.into(),
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

impl ContactTransport for HttpContactTransport {
    fn submit(&self, message: &ContactMessage) -> Result<(), TransportError> {
        let fields = FormFields {
            access_key: &self.access_key,
            subject: &self.subject,
            name: &message.name,
            email: &message.email,
            message: &message.message,
        };
        debug!(endpoint = %self.endpoint, "submitting contact form");
        let response = self
            .http
            .post(self.endpoint.clone())
            .form(&fields)
            .send()
            .map_err(|err| {
                warn!(error = %err, "contact form transport failed");
                TransportError::Transport(err.to_string())
            })?;
        let status = response.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), "contact form rejected");
            return Err(TransportError::Status {
                status: status.as_u16(),
            });
        }
        info!(status = status.as_u16(), "contact form delivered");
        Ok(())
    }
}
