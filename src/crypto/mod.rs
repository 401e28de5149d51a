//! Cryptography contract: session key material, AES encryption and content
//! hashing.
//!
//! [`KsefCryptography`] (feature `http`) wraps keys with the gateway's RSA
//! certificates. Hashing is the same for every implementation and lives in
//! [`file_metadata`].

#[cfg(feature = "http")]
mod ksef;

use std::fmt;

use base64ct::{Base64, Encoding};
use sha2::{Digest, Sha256};

use crate::core::KsefError;
use crate::gateway::EncryptionInfo;

#[cfg(feature = "http")]
pub use ksef::KsefCryptography;

/// SHA-256 hash (base64) and byte size of a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileMetadata {
    pub hash_sha: String,
    pub file_size: u64,
}

/// Symmetric key material for one session.
///
/// The raw key never leaves the process; only [`EncryptionInfo`] is sent.
#[derive(Clone)]
pub struct EncryptionData {
    cipher_key: Vec<u8>,
    cipher_iv: Vec<u8>,
    encryption_info: EncryptionInfo,
}

impl EncryptionData {
    pub fn new(cipher_key: Vec<u8>, cipher_iv: Vec<u8>, encryption_info: EncryptionInfo) -> Self {
        Self {
            cipher_key,
            cipher_iv,
            encryption_info,
        }
    }

    /// AES-256 key.
    pub fn cipher_key(&self) -> &[u8] {
        &self.cipher_key
    }

    /// AES-CBC initialization vector.
    pub fn cipher_iv(&self) -> &[u8] {
        &self.cipher_iv
    }

    pub fn encryption_info(&self) -> &EncryptionInfo {
        &self.encryption_info
    }
}

impl fmt::Debug for EncryptionData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncryptionData")
            .field("cipher_key", &"<redacted>")
            .field("cipher_iv", &"<redacted>")
            .field("encryption_info", &self.encryption_info)
            .finish()
    }
}

/// Cryptographic operations needed to submit an invoice.
pub trait CryptographyService {
    /// Generate a fresh AES key + IV and wrap the key for the gateway.
    fn encryption_data(&self) -> Result<EncryptionData, KsefError>;

    /// AES-256-CBC with PKCS#7 padding.
    fn encrypt_aes256(&self, content: &[u8], key: &[u8], iv: &[u8]) -> Result<Vec<u8>, KsefError>;

    /// Hash and size of `content`.
    fn metadata(&self, content: &[u8]) -> FileMetadata {
        file_metadata(content)
    }
}

/// SHA-256 (base64) and length of `content`.
pub fn file_metadata(content: &[u8]) -> FileMetadata {
    FileMetadata {
        hash_sha: sha256_base64(content),
        file_size: content.len() as u64,
    }
}

/// Standard base64 of the SHA-256 digest of `content`.
pub fn sha256_base64(content: &[u8]) -> String {
    Base64::encode_string(&Sha256::digest(content))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metadata_of_empty_input() {
        let meta = file_metadata(b"");
        assert_eq!(meta.file_size, 0);
        assert_eq!(meta.hash_sha, "47DEQpj8HBSa+/TImW+5JCeuQeRkm5NMpJWZG3hSuFU=");
    }

    #[test]
    fn metadata_counts_bytes_not_chars() {
        let meta = file_metadata("Płock".as_bytes());
        assert_eq!(meta.file_size, 6);
    }

    #[test]
    fn debug_redacts_key_material() {
        let data = EncryptionData::new(
            vec![7; 32],
            vec![9; 16],
            EncryptionInfo {
                encrypted_symmetric_key: "wrapped".into(),
                initialization_vector: "iv".into(),
            },
        );
        let dbg = format!("{data:?}");
        assert!(dbg.contains("<redacted>"));
        assert!(!dbg.contains("[7, 7"));
    }
}
