//! Transport abstraction: decouples the protocol client from HTTP stacks.
//!
//! The client builds JSON bodies and interprets replies; the transport only
//! moves bytes.  Adapters: ESP-IDF `EspHttpConnection` on target, a `ureq`
//! agent on the host, scripted mocks in tests.

use crate::error::TransportError;

/// Upper bound on accepted response bodies.  Replies are a few hundred bytes.
pub const MAX_RESPONSE_BYTES: usize = 4096;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

pub trait HttpTransport {
    /// POST `body` as `application/json` and return the status and body.
    ///
    /// Must return within roughly `timeout_ms`; a timeout is an error,
    /// never a hang.
    fn post_json(
        &mut self,
        url: &str,
        body: &[u8],
        timeout_ms: u32,
    ) -> Result<HttpResponse, TransportError>;
}

impl<T: HttpTransport + ?Sized> HttpTransport for &mut T {
    fn post_json(
        &mut self,
        url: &str,
        body: &[u8],
        timeout_ms: u32,
    ) -> Result<HttpResponse, TransportError> {
        (**self).post_json(url, body, timeout_ms)
    }
}
