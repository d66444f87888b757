//! Webhook notifier adapter.
//!
//! Implements [`Notifier`] by POSTing a one-field JSON body to a
//! maker-style webhook, which relays it to the owner's inbox:
//!
//! ```json
//! {"value1": "🚨 Voltage DROP lasted over 10 minutes. Cutting power..."}
//! ```
//!
//! HTTP 200 and 302 (the relay answers some requests with a redirect)
//! count as delivered.  There is no retry: the caller decides whether a
//! failed send matters.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: `EspHttpConnection` over the STA link.
//! - **all other targets**: in-memory transport that records payloads
//!   and can be switched offline for tests.

use log::{info, warn};
use serde::Serialize;

use crate::app::ports::Notifier;
use crate::error::{self, CommsError, Error};

/// Wire body for the webhook.
#[derive(Debug, Serialize)]
struct WebhookPayload<'a> {
    value1: &'a str,
}

/// Serialise `message` into the webhook body.
pub fn encode_payload(message: &str) -> Result<Vec<u8>, CommsError> {
    serde_json::to_vec(&WebhookPayload { value1: message }).map_err(|_| CommsError::PayloadEncoding)
}

/// Whether an HTTP status means the relay took the message.
pub fn is_delivered(status: u16) -> bool {
    matches!(status, 200 | 302)
}

// ───────────────────────────────────────────────────────────────
// WebhookNotifier
// ───────────────────────────────────────────────────────────────

pub struct WebhookNotifier {
    url: String,
    #[cfg(not(target_os = "espidf"))]
    sim: SimTransport,
}

#[cfg(not(target_os = "espidf"))]
#[derive(Debug)]
struct SimTransport {
    offline: bool,
    status: u16,
    payloads: Vec<Vec<u8>>,
}

impl WebhookNotifier {
    pub fn new(url: &str) -> Self {
        Self {
            url: url.to_string(),
            #[cfg(not(target_os = "espidf"))]
            sim: SimTransport {
                offline: false,
                status: 200,
                payloads: Vec::new(),
            },
        }
    }

    /// Send `message` once.  `Ok` only for a delivered status.
    pub fn post(&mut self, message: &str) -> error::Result<()> {
        let body = encode_payload(message)?;
        let status = self.transport(&body)?;
        if is_delivered(status) {
            Ok(())
        } else {
            Err(Error::Comms(CommsError::HttpStatus(status)))
        }
    }

    // ── Platform-specific ─────────────────────────────────────

    #[cfg(target_os = "espidf")]
    fn transport(&mut self, body: &[u8]) -> Result<u16, CommsError> {
        use esp_idf_svc::http::Method;
        use esp_idf_svc::http::client::{Configuration, EspHttpConnection};

        let mut conn = EspHttpConnection::new(&Configuration {
            crt_bundle_attach: Some(esp_idf_svc::sys::esp_crt_bundle_attach),
            ..Default::default()
        })
        .map_err(|_| CommsError::HttpRequestFailed)?;

        let content_length = body.len().to_string();
        let headers = [
            ("Content-Type", "application/json"),
            ("Content-Length", content_length.as_str()),
        ];
        conn.initiate_request(Method::Post, &self.url, &headers)
            .map_err(|_| CommsError::HttpRequestFailed)?;

        let mut written = 0;
        while written < body.len() {
            match conn.write(&body[written..]) {
                Ok(0) | Err(_) => return Err(CommsError::HttpRequestFailed),
                Ok(n) => written += n,
            }
        }

        conn.initiate_response()
            .map_err(|_| CommsError::HttpRequestFailed)?;
        Ok(conn.status())
    }

    #[cfg(not(target_os = "espidf"))]
    fn transport(&mut self, body: &[u8]) -> Result<u16, CommsError> {
        if self.sim.offline {
            return Err(CommsError::HttpRequestFailed);
        }
        self.sim.payloads.push(body.to_vec());
        Ok(self.sim.status)
    }

    // ── Simulation controls ───────────────────────────────────

    /// Make every subsequent send fail at the transport.
    #[cfg(not(target_os = "espidf"))]
    pub fn sim_set_offline(&mut self, offline: bool) {
        self.sim.offline = offline;
    }

    /// Status the simulated relay answers with.
    #[cfg(not(target_os = "espidf"))]
    pub fn sim_set_status(&mut self, status: u16) {
        self.sim.status = status;
    }

    /// Bodies that reached the simulated relay, oldest first.
    #[cfg(not(target_os = "espidf"))]
    pub fn sim_payloads(&self) -> &[Vec<u8>] {
        &self.sim.payloads
    }
}

impl Notifier for WebhookNotifier {
    fn send(&mut self, message: &str) -> bool {
        match self.post(message) {
            Ok(()) => {
                info!("Webhook: delivered to {} ({} bytes)", self.url, message.len());
                true
            }
            Err(e) => {
                warn!("Webhook {}: {}", self.url, e);
                false
            }
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Tests
// ───────────────────────────────────────────────────────────────
