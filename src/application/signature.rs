//! Webhook signature gate

use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::sync::Arc;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the hex HMAC-SHA256 of the raw request body
pub const SIGNATURE_HEADER: &str = "x-retell-signature";

/// Checks provider signatures against the shared API key
#[derive(Clone)]
pub struct SignatureVerifier {
    key: Arc<[u8]>,
}

impl SignatureVerifier {
    pub fn new(api_key: &str) -> Self {
        Self {
            key: Arc::from(api_key.as_bytes()),
        }
    }

    /// Constant-time comparison of `signature` (hex) with the body's HMAC
    pub fn verify(&self, body: &[u8], signature: &str) -> bool {
        let Ok(expected) = hex::decode(signature.trim()) else {
            return false;
        };
        let Ok(mut mac) = HmacSha256::new_from_slice(&self.key) else {
            return false;
        };
        mac.update(body);
        mac.verify_slice(&expected).is_ok()
    }
}
