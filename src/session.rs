//! Online session lifecycle: open, send an encrypted invoice, close.
use base64ct::{Base64, Encoding};
use chrono::{DateTime, FixedOffset};
use tracing::{debug, info};

use crate::core::KsefError;
use crate::crypto::{CryptographyService, EncryptionData};
use crate::gateway::{KsefGateway, OpenOnlineSessionRequest, SendInvoiceRequest, SystemCode};

/// An open interactive session.
///
/// Holds the reference the gateway assigned; every invoice sent through it is
/// encrypted with the [`EncryptionData`] it was opened with. Closing consumes
/// the handle, so a closed session cannot be used again.
#[derive(Debug)]
#[must_use = "an online session should be closed"]
pub struct OnlineSession {
    reference_number: String,
    valid_until: Option<DateTime<FixedOffset>>,
}

impl OnlineSession {
    pub fn reference_number(&self) -> &str {
        &self.reference_number
    }

    pub fn valid_until(&self) -> Option<DateTime<FixedOffset>> {
        self.valid_until
    }

    /// Ask the gateway to close the session.
    pub async fn close<G: KsefGateway>(self, gateway: &G, access_token: &str) -> Result<(), KsefError> {
        gateway
            .close_online_session(&self.reference_number, access_token)
            .await?;
        info!(session = %self.reference_number, "session closed");
        Ok(())
    }
}

/// An invoice accepted for processing within a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentInvoice {
    /// Invoice reference assigned by the gateway.
    pub reference_number: String,
    /// Base64 SHA-256 of the plaintext invoice.
    pub invoice_hash: String,
    /// Plaintext size in bytes.
    pub invoice_size: u64,
}

/// Open an online session for `system_code` invoices.
pub async fn open_session<G: KsefGateway>(
    gateway: &G,
    encryption: &EncryptionData,
    access_token: &str,
    system_code: SystemCode,
) -> Result<OnlineSession, KsefError> {
    let request = OpenOnlineSessionRequest::new(system_code, encryption.encryption_info().clone());
    let response = gateway.open_online_session(&request, access_token).await?;
    info!(session = %response.reference_number, "session opened");
    Ok(OnlineSession {
        reference_number: response.reference_number,
        valid_until: response.valid_until,
    })
}

/// Encrypt `invoice_xml` with the session key and send it.
///
/// The request carries hash and size of both the plaintext and the
/// ciphertext, and is never flagged as offline.
pub async fn send_invoice<G, C>(
    gateway: &G,
    crypto: &C,
    session: &OnlineSession,
    access_token: &str,
    encryption: &EncryptionData,
    invoice_xml: &str,
) -> Result<SentInvoice, KsefError>
where
    G: KsefGateway,
    C: CryptographyService,
{
    let plain = invoice_xml.as_bytes();
    let plain_meta = crypto.metadata(plain);
    let encrypted = crypto.encrypt_aes256(plain, encryption.cipher_key(), encryption.cipher_iv())?;
    let encrypted_meta = crypto.metadata(&encrypted);
    debug!(
        invoice_size = plain_meta.file_size,
        encrypted_size = encrypted_meta.file_size,
        "invoice encrypted"
    );

    let request = SendInvoiceRequest {
        invoice_hash: plain_meta.hash_sha.clone(),
        invoice_size: plain_meta.file_size,
        encrypted_invoice_hash: encrypted_meta.hash_sha,
        encrypted_invoice_size: encrypted_meta.file_size,
        encrypted_invoice_content: Base64::encode_string(&encrypted),
        offline_mode: false,
    };
    let response = gateway
        .send_online_session_invoice(&session.reference_number, &request, access_token)
        .await?;
    info!(
        session = %session.reference_number,
        invoice = %response.reference_number,
        "invoice sent"
    );
    Ok(SentInvoice {
        reference_number: response.reference_number,
        invoice_hash: plain_meta.hash_sha,
        invoice_size: plain_meta.file_size,
    })
}
