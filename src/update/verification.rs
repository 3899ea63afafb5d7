//! Checksum verification for downloaded artifacts.

use anyhow::Result;
use tracing::debug;

use crate::core::UpdateError;

/// Length of a SHA-256 digest in bytes.
const SHA256_LEN: usize = 32;

/// SHA-256 helpers shared by the downloader.
///
/// The package server publishes `<artifact>.sha256` sidecars containing a
/// bare hex digest, optionally followed by whitespace.
pub struct ChecksumVerifier;

impl ChecksumVerifier {
    /// Decodes a sidecar body into raw digest bytes.
    ///
    /// # Errors
    ///
    /// [`UpdateError::Network`] when the body is not hex or is not 32 bytes
    /// long once decoded.
    pub fn parse_sidecar(url: &str, body: &[u8]) -> Result<Vec<u8>> {
        let operation = format!("GET {url}");
        let text = std::str::from_utf8(body)
            .map_err(|_| UpdateError::network(&operation, "checksum is not valid text"))?;
        let digest = hex::decode(text.trim())
            .map_err(|e| UpdateError::network(&operation, format!("malformed checksum: {e}")))?;
        if digest.len() != SHA256_LEN {
            return Err(UpdateError::network(
                &operation,
                format!("checksum has {} bytes, want {}", digest.len(), SHA256_LEN),
            )
            .into());
        }
        Ok(digest)
    }

    /// Compares a computed digest with the expected one.
    ///
    /// # Errors
    ///
    /// [`UpdateError::Integrity`] on mismatch.
    pub fn verify_digest(what: &str, actual: &[u8], expected: &[u8]) -> Result<()> {
        if actual != expected {
            return Err(UpdateError::Integrity {
                reason: format!(
                    "SHA-256 of downloaded {what} didn't match expected value (got {}, want {})",
                    hex::encode(actual),
                    hex::encode(expected)
                ),
            }
            .into());
        }
        debug!(target: "download", "hash matched");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HELLO_SHA256: &str = "dffd6021bb2bd5b0af676290809ec3a53191dd81c7f70a4b28688a362182986f";

    #[test]
    fn test_parse_sidecar_trims_whitespace() {
        let body = format!("{HELLO_SHA256}  \n");
        let digest = ChecksumVerifier::parse_sidecar("https://x/a.msi.sha256", body.as_bytes()).unwrap();
        assert_eq!(hex::encode(digest), HELLO_SHA256);

        let upper = HELLO_SHA256.to_uppercase();
        assert!(ChecksumVerifier::parse_sidecar("u", upper.as_bytes()).is_ok());
    }

    #[test]
    fn test_parse_sidecar_rejects_garbage() {
        let err = ChecksumVerifier::parse_sidecar("u", b"not-a-hash").unwrap_err();
        assert!(matches!(err.downcast_ref::<UpdateError>(), Some(UpdateError::Network { .. })));
        assert!(ChecksumVerifier::parse_sidecar("u", b"abcd").is_err());
    }

    #[test]
    fn test_verify_digest_mismatch() {
        let err = ChecksumVerifier::verify_digest("MSI", &[0u8; 32], &[1u8; 32]).unwrap_err();
        assert!(matches!(err.downcast_ref::<UpdateError>(), Some(UpdateError::Integrity { .. })));
        assert!(err.to_string().contains("SHA-256 of downloaded MSI didn't match"));
        ChecksumVerifier::verify_digest("MSI", &[7u8; 32], &[7u8; 32]).unwrap();
    }
}
