//! HTTP transport adapter.
//!
//! Implements [`HttpTransport`] for the protocol client.
//!
//! - **`target_os = "espidf"`**: `EspHttpConnection` with the ESP-IDF
//!   certificate bundle attached, so `https://` endpoints verify against the
//!   built-in root store.  One connection per request.
//! - **all other targets**: a blocking `ureq` agent.  The per-request
//!   timeout is one deadline for the whole exchange, body included.  Plain
//!   `http://` only; used against local test servers.

use crate::error::TransportError;
use crate::protocol::transport::{HttpResponse, HttpTransport, MAX_RESPONSE_BYTES};

#[cfg(not(target_os = "espidf"))]
use log::debug;
#[cfg(not(target_os = "espidf"))]
use std::io::{ErrorKind, Read};
#[cfg(not(target_os = "espidf"))]
use std::time::Duration;

#[cfg(target_os = "espidf")]
use esp_idf_svc::http::Method;
#[cfg(target_os = "espidf")]
use esp_idf_svc::http::client::{Configuration as HttpConfiguration, EspHttpConnection};

pub struct HttpClientTransport {
    #[cfg(not(target_os = "espidf"))]
    agent: ureq::Agent,
}

impl HttpClientTransport {
    pub fn new() -> Self {
        Self {
            #[cfg(not(target_os = "espidf"))]
            agent: ureq::AgentBuilder::new().build(),
        }
    }
}

impl Default for HttpClientTransport {
    fn default() -> Self {
        Self::new()
    }
}

// ───────────────────────────────────────────────────────────────
// ESP-IDF backend
// ───────────────────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
fn map_esp_err(e: esp_idf_svc::sys::EspError) -> TransportError {
    if e.code() == esp_idf_svc::sys::ESP_ERR_TIMEOUT {
        TransportError::Timeout
    } else {
        TransportError::Io
    }
}

#[cfg(target_os = "espidf")]
impl HttpTransport for HttpClientTransport {
    fn post_json(&mut self, url: &str, body: &[u8], timeout_ms: u32) -> Result<HttpResponse, TransportError> {
        let mut conn = EspHttpConnection::new(&HttpConfiguration {
            timeout: Some(core::time::Duration::from_millis(timeout_ms as u64)),
            crt_bundle_attach: Some(esp_idf_svc::sys::esp_crt_bundle_attach),
            ..Default::default()
        })
        .map_err(map_esp_err)?;

        let content_length = body.len().to_string();
        let headers = [
            ("Content-Type", "application/json"),
            ("Content-Length", content_length.as_str()),
        ];
        conn.initiate_request(Method::Post, url, &headers)
            .map_err(map_esp_err)?;

        let mut written = 0;
        while written < body.len() {
            let n = conn.write(&body[written..]).map_err(map_esp_err)?;
            if n == 0 {
                return Err(TransportError::Io);
            }
            written += n;
        }

        conn.initiate_response().map_err(map_esp_err)?;
        let status = conn.status();

        let mut out = Vec::new();
        let mut chunk = [0u8; 256];
        loop {
            let n = conn.read(&mut chunk).map_err(map_esp_err)?;
            if n == 0 {
                break;
            }
            if out.len() + n > MAX_RESPONSE_BYTES {
                return Err(TransportError::BadResponse);
            }
            out.extend_from_slice(&chunk[..n]);
        }
        Ok(HttpResponse { status, body: out })
    }
}

// ───────────────────────────────────────────────────────────────
// Host backend
// ───────────────────────────────────────────────────────────────

#[cfg(not(target_os = "espidf"))]
fn map_io(e: &std::io::Error) -> TransportError {
    match e.kind() {
        ErrorKind::TimedOut | ErrorKind::WouldBlock => TransportError::Timeout,
        _ => TransportError::Io,
    }
}

#[cfg(not(target_os = "espidf"))]
fn map_ureq(t: &ureq::Transport) -> TransportError {
    use std::error::Error as _;

    if let Some(io) = t.source().and_then(|e| e.downcast_ref::<std::io::Error>()) {
        return map_io(io);
    }
    match t.kind() {
        ureq::ErrorKind::InvalidUrl => TransportError::InvalidUrl,
        ureq::ErrorKind::UnknownScheme => TransportError::Unsupported,
        ureq::ErrorKind::BadStatus | ureq::ErrorKind::BadHeader => TransportError::BadResponse,
        _ => TransportError::Io,
    }
}

/// Read at most [`MAX_RESPONSE_BYTES`]; the agent deadline still applies.
#[cfg(not(target_os = "espidf"))]
fn read_body(resp: ureq::Response) -> Result<HttpResponse, TransportError> {
    let status = resp.status();
    let mut body = Vec::new();
    resp.into_reader()
        .take(MAX_RESPONSE_BYTES as u64 + 1)
        .read_to_end(&mut body)
        .map_err(|e| map_io(&e))?;
    if body.len() > MAX_RESPONSE_BYTES {
        return Err(TransportError::BadResponse);
    }
    Ok(HttpResponse { status, body })
}

#[cfg(not(target_os = "espidf"))]
impl HttpTransport for HttpClientTransport {
    fn post_json(&mut self, url: &str, body: &[u8], timeout_ms: u32) -> Result<HttpResponse, TransportError> {
        // No TLS backend is compiled in for the host.
        if url.starts_with("https://") {
            return Err(TransportError::Unsupported);
        }
        let result = self
            .agent
            .post(url)
            .timeout(Duration::from_millis(u64::from(timeout_ms.max(1))))
            .set("Content-Type", "application/json")
            .send_bytes(body);

        match result {
            Ok(resp) | Err(ureq::Error::Status(_, resp)) => read_body(resp),
            Err(ureq::Error::Transport(t)) => {
                let err = map_ureq(&t);
                debug!("HTTP: POST {} failed: {} ({})", url, err, t);
                Err(err)
            }
        }
    }
}
