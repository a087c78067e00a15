//! Source encoding: raw bytes → base64 text for the JSON request body.
//!
//! The workflow expects RFC 4648 standard base64 with padding, the same
//! alphabet a browser's `btoa` produces.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use tracing::debug;

/// Encode source bytes for submission.
pub fn encode_source(bytes: &[u8]) -> String {
    let b64 = STANDARD.encode(bytes);
    debug!("Encoded source {} bytes → {} bytes base64", bytes.len(), b64.len());
    b64
}
