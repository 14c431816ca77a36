//! Blob display policy.
//!
//! Every blob gets a SHA-256 content digest (display identity and dedup).
//! Small payloads render as lowercase hex; past the size cutoff the display
//! switches to a binary descriptor, because kilobytes of hex help nobody.

use serde_json::{Value, json};
use sha2::{Digest, Sha256};

/// Largest payload still rendered as a hex string.
pub const BLOB_HEX_MAX_BYTES: usize = 128;

/// Hex length of the content digest (SHA-256).
pub const DIGEST_HEX_LEN: usize = 64;

pub fn digest_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BlobRepr {
    /// Small payload, shown as lowercase hex text.
    Hex { text: String },
    /// Oversized payload, shown as a descriptor; the bytes stay in `raw`.
    Binary { len: usize },
}

/// Digest + representation + display value for a byte payload.
pub fn blob_display(bytes: &[u8]) -> (String, BlobRepr, Value) {
    let digest = digest_hex(bytes);
    if bytes.len() <= BLOB_HEX_MAX_BYTES {
        let text = hex::encode(bytes);
        let display = Value::String(text.clone());
        (digest, BlobRepr::Hex { text }, display)
    } else {
        let display = json!({
            "kind": "binary",
            "length": bytes.len(),
            "digest": digest,
        });
        (digest, BlobRepr::Binary { len: bytes.len() }, display)
    }
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_blobs_render_as_hex() {
        let (digest, repr, display) = blob_display(&[0x12, 0x34, 0xab, 0xcd]);
        assert_eq!(digest.len(), DIGEST_HEX_LEN);
        assert_eq!(repr, BlobRepr::Hex { text: "1234abcd".into() });
        assert_eq!(display, Value::String("1234abcd".into()));
    }

    #[test]
    fn oversized_blobs_switch_to_binary() {
        let bytes = vec![0u8; BLOB_HEX_MAX_BYTES + 1];
        let (digest, repr, display) = blob_display(&bytes);
        assert_eq!(digest.len(), DIGEST_HEX_LEN);
        assert_eq!(repr, BlobRepr::Binary { len: bytes.len() });
        assert_eq!(display["kind"], "binary");
        assert_eq!(display["length"], serde_json::json!(bytes.len()));
    }

    #[test]
    fn digest_is_content_addressed() {
        let (a, _, _) = blob_display(&[1, 2, 3]);
        let (b, _, _) = blob_display(&[1, 2, 3]);
        let (c, _, _) = blob_display(&[1, 2, 4]);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
