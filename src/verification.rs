//! Public verification links for issued invoices.
//!
//! The link encodes the seller's tax id, the issue date and the invoice hash:
//! `{base}/invoice/{nip}/{DD-MM-YYYY}/{hash}` where `hash` is the SHA-256 of
//! the invoice XML in URL-safe base64 without padding.
use base64ct::{Base64, Base64UrlUnpadded, Encoding};
use chrono::NaiveDate;

use crate::config::Settings;
use crate::core::KsefError;

/// Builds verification links against one base URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationLinkService {
    base_url: String,
}

impl VerificationLinkService {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.verification_base_url())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Link for the invoice issued by `nip` on `issue_date` with the given
    /// base64 SHA-256 hash.
    pub fn invoice_verification_url(
        &self,
        nip: &str,
        issue_date: NaiveDate,
        invoice_hash: &str,
    ) -> Result<String, KsefError> {
        build_invoice_verification_url(&self.base_url, nip, issue_date, invoice_hash)
    }
}

/// Build a verification link. Pure; no gateway call is made.
///
/// `invoice_hash` may be standard or URL-safe base64.
///
/// ```
/// use chrono::NaiveDate;
/// use ksef_minimal::verification::build_invoice_verification_url;
///
/// let url = build_invoice_verification_url(
///     "https://qr-test.ksef.mf.gov.pl",
///     "1234567890",
///     NaiveDate::from_ymd_opt(2025, 10, 17).unwrap(),
///     "47DEQpj8HBSa+/TImW+5JCeuQeRkm5NMpJWZG3hSuFU=",
/// )
/// .unwrap();
/// assert_eq!(
///     url,
///     "https://qr-test.ksef.mf.gov.pl/invoice/1234567890/17-10-2025/47DEQpj8HBSa-_TImW-5JCeuQeRkm5NMpJWZG3hSuFU"
/// );
/// ```
pub fn build_invoice_verification_url(
    base_url: &str,
    nip: &str,
    issue_date: NaiveDate,
    invoice_hash: &str,
) -> Result<String, KsefError> {
    let digest = decode_hash(invoice_hash)?;
    Ok(format!(
        "{}/invoice/{}/{}/{}",
        base_url.trim_end_matches('/'),
        nip.trim(),
        issue_date.format("%d-%m-%Y"),
        Base64UrlUnpadded::encode_string(&digest)
    ))
}

fn decode_hash(invoice_hash: &str) -> Result<Vec<u8>, KsefError> {
    let hash = invoice_hash.trim();
    Base64::decode_vec(hash)
        .or_else(|_| Base64UrlUnpadded::decode_vec(hash))
        .map_err(|_| KsefError::Crypto(format!("invoice hash is not base64: {hash:?}")))
}
