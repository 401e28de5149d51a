use aes::cipher::{BlockEncryptMut, KeyIvInit, block_padding::Pkcs7};
use base64ct::{Base64, Encoding};
use chrono::{DateTime, FixedOffset, Utc};
use rand::RngCore;
use rand::rngs::OsRng;
use rsa::pkcs8::DecodePublicKey;
use rsa::{Oaep, RsaPublicKey};
use sha2::Sha256;
use tracing::debug;
use x509_cert::Certificate;
use x509_cert::der::{Decode, Encode};

use super::{CryptographyService, EncryptionData};
use crate::core::KsefError;
use crate::gateway::{EncryptionInfo, KsefClient, PublicKeyCertificate, PublicKeyUsage};

type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;

const KEY_LEN: usize = 32;
const IV_LEN: usize = 16;

/// Cryptography backed by the gateway's published RSA keys.
///
/// Session keys are wrapped with the `SymmetricKeyEncryption` key, KSeF
/// tokens with the `KsefTokenEncryption` key, both RSA-OAEP with SHA-256.
#[derive(Debug, Clone)]
pub struct KsefCryptography {
    symmetric_key_encryption: RsaPublicKey,
    ksef_token_encryption: RsaPublicKey,
}

impl KsefCryptography {
    pub fn from_public_keys(
        symmetric_key_encryption: RsaPublicKey,
        ksef_token_encryption: RsaPublicKey,
    ) -> Self {
        Self {
            symmetric_key_encryption,
            ksef_token_encryption,
        }
    }

    /// Pick the currently valid key for each usage from the gateway's list.
    ///
    /// # Errors
    /// Returns [`KsefError::Crypto`] if a usage has no valid certificate or a
    /// certificate cannot be parsed.
    pub fn from_certificates(certificates: &[PublicKeyCertificate]) -> Result<Self, KsefError> {
        let now = Utc::now();
        let pick = |usage: PublicKeyUsage| -> Result<RsaPublicKey, KsefError> {
            let cert = certificates
                .iter()
                .filter(|c| c.usage.contains(&usage))
                .find(|c| c.valid_to.is_none_or(|to| to > now))
                .ok_or_else(|| {
                    KsefError::Crypto(format!("no valid {usage:?} certificate published"))
                })?;
            public_key_from_certificate(&cert.certificate)
        };
        Ok(Self {
            symmetric_key_encryption: pick(PublicKeyUsage::SymmetricKeyEncryption)?,
            ksef_token_encryption: pick(PublicKeyUsage::KsefTokenEncryption)?,
        })
    }

    /// Download the gateway certificates and build the service from them.
    pub async fn fetch(client: &KsefClient) -> Result<Self, KsefError> {
        let certificates = client.public_key_certificates().await?;
        debug!(count = certificates.len(), "fetched public key certificates");
        Self::from_certificates(&certificates)
    }

    /// Encrypt `"{token}|{timestampMs}"` for `POST /auth/ksef-token`.
    pub fn encrypt_ksef_token(
        &self,
        token: &str,
        challenge_timestamp: DateTime<FixedOffset>,
    ) -> Result<String, KsefError> {
        let plain = format!("{token}|{}", challenge_timestamp.timestamp_millis());
        let encrypted = rsa_oaep(&self.ksef_token_encryption, plain.as_bytes())?;
        Ok(Base64::encode_string(&encrypted))
    }
}

impl CryptographyService for KsefCryptography {
    fn encryption_data(&self) -> Result<EncryptionData, KsefError> {
        let mut key = vec![0u8; KEY_LEN];
        let mut iv = vec![0u8; IV_LEN];
        OsRng.fill_bytes(&mut key);
        OsRng.fill_bytes(&mut iv);

        let wrapped = rsa_oaep(&self.symmetric_key_encryption, &key)?;
        let info = EncryptionInfo {
            encrypted_symmetric_key: Base64::encode_string(&wrapped),
            initialization_vector: Base64::encode_string(&iv),
        };
        Ok(EncryptionData::new(key, iv, info))
    }

    fn encrypt_aes256(&self, content: &[u8], key: &[u8], iv: &[u8]) -> Result<Vec<u8>, KsefError> {
        let encryptor = Aes256CbcEnc::new_from_slices(key, iv)
            .map_err(|e| KsefError::Crypto(format!("invalid AES key or IV length: {e}")))?;
        Ok(encryptor.encrypt_padded_vec_mut::<Pkcs7>(content))
    }
}

fn rsa_oaep(key: &RsaPublicKey, data: &[u8]) -> Result<Vec<u8>, KsefError> {
    key.encrypt(&mut OsRng, Oaep::new::<Sha256>(), data)
        .map_err(|e| KsefError::Crypto(format!("RSA-OAEP encryption failed: {e}")))
}

fn public_key_from_certificate(certificate_b64: &str) -> Result<RsaPublicKey, KsefError> {
    let der = Base64::decode_vec(certificate_b64.trim())
        .map_err(|e| KsefError::Crypto(format!("certificate is not base64: {e}")))?;
    let cert = Certificate::from_der(&der)
        .map_err(|e| KsefError::Crypto(format!("invalid X.509 certificate: {e}")))?;
    let spki = cert
        .tbs_certificate
        .subject_public_key_info
        .to_der()
        .map_err(|e| KsefError::Crypto(format!("cannot encode public key: {e}")))?;
    RsaPublicKey::from_public_key_der(&spki)
        .map_err(|e| KsefError::Crypto(format!("certificate key is not RSA: {e}")))
}
