//! # SHA-256 Digest Computation
//!
//! Two digest inputs exist in the system:
//!
//! - **URL strings.** The certificate extension and the attestation
//!   payload's `hash` field carry `sha256(url_bytes)` over the normalized
//!   URL string, exactly as written.
//! - **`CanonicalBytes`.** Signed JSON documents are fingerprinted over
//!   their canonical form.

use fwdlink_core::{CanonicalBytes, ContentDigest};
use sha2::{Digest, Sha256};

/// SHA-256 of the UTF-8 bytes of a URL string.
pub fn url_digest(url: &str) -> ContentDigest {
    digest_bytes(url.as_bytes())
}

/// SHA-256 of canonical bytes.
pub fn sha256_digest(data: &CanonicalBytes) -> ContentDigest {
    digest_bytes(data.as_bytes())
}

fn digest_bytes(bytes: &[u8]) -> ContentDigest {
    let hash = Sha256::digest(bytes);
    let mut out = [0u8; 32];
    out.copy_from_slice(&hash);
    ContentDigest::from_bytes(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_url_vector() {
        // printf '%s' 'https://example.org' | sha256sum
        assert_eq!(
            url_digest("https://example.org").to_hex(),
            "50d7a905e3046b88638362cc34a31a1ae534766ca55e3aa397951efe653b062b"
        );
    }

    #[test]
    fn test_empty_string_vector() {
        assert_eq!(
            url_digest("").to_hex(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_canonical_empty_object_vector() {
        let cb = CanonicalBytes::new(&serde_json::json!({})).unwrap();
        assert_eq!(
            sha256_digest(&cb).to_hex(),
            "44136fa355b3678a1146ad16f7e8649e94fb4fc21fe77e8310c060f61caaff8a"
        );
    }

    #[test]
    fn test_different_urls_different_digests() {
        assert_ne!(
            url_digest("https://a.example/x"),
            url_digest("https://b.example/y")
        );
    }
}
