//! KSeF 2.0 request and response bodies.
//!
//! Field names follow the gateway's camelCase JSON.
use std::fmt;

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Invoice status code meaning "still processing".
pub const INVOICE_PROCESSING_CODE: i32 = 150;

/// Invoice status code meaning "accepted and registered".
pub const INVOICE_ACCEPTED_CODE: i32 = 200;

/// Authentication status code meaning "in progress".
pub const AUTH_IN_PROGRESS_CODE: i32 = 100;

/// Authentication status code meaning "succeeded".
pub const AUTH_SUCCEEDED_CODE: i32 = 200;

// ---------------------------------------------------------------------------
// Sessions
// ---------------------------------------------------------------------------

/// Structured invoice schema a session accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SystemCode {
    Fa2,
    #[default]
    Fa3,
}

impl SystemCode {
    pub fn form_code(&self) -> FormCode {
        let system_code = match self {
            Self::Fa2 => "FA (2)",
            Self::Fa3 => "FA (3)",
        };
        FormCode {
            system_code: system_code.into(),
            schema_version: "1-0E".into(),
            value: "FA".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormCode {
    pub system_code: String,
    pub schema_version: String,
    pub value: String,
}

/// Wire form of the session key material: the RSA-encrypted AES key and the IV,
/// both base64.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncryptionInfo {
    pub encrypted_symmetric_key: String,
    pub initialization_vector: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenOnlineSessionRequest {
    pub form_code: FormCode,
    pub encryption: EncryptionInfo,
}

impl OpenOnlineSessionRequest {
    pub fn new(system_code: SystemCode, encryption: EncryptionInfo) -> Self {
        Self {
            form_code: system_code.form_code(),
            encryption,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenOnlineSessionResponse {
    pub reference_number: String,
    #[serde(default)]
    pub valid_until: Option<DateTime<FixedOffset>>,
}

/// Encrypted invoice submission within an online session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendInvoiceRequest {
    pub invoice_hash: String,
    pub invoice_size: u64,
    pub encrypted_invoice_hash: String,
    pub encrypted_invoice_size: u64,
    pub encrypted_invoice_content: String,
    #[serde(default)]
    pub offline_mode: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendInvoiceResponse {
    pub reference_number: String,
}

/// Status code with its description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusInfo {
    pub code: i32,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub details: Vec<String>,
}

/// Processing state of one invoice sent in a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionInvoiceStatus {
    #[serde(default)]
    pub ordinal_number: Option<u32>,
    #[serde(default)]
    pub invoice_number: Option<String>,
    /// Registry number, present once the invoice is accepted.
    #[serde(default)]
    pub ksef_number: Option<String>,
    pub reference_number: String,
    #[serde(default)]
    pub invoice_hash: Option<String>,
    #[serde(default)]
    pub invoicing_date: Option<DateTime<FixedOffset>>,
    pub status: StatusInfo,
}

impl SessionInvoiceStatus {
    /// Whether the gateway is still working on the invoice.
    pub fn is_processing(&self) -> bool {
        self.status.code == INVOICE_PROCESSING_CODE
    }

    pub fn is_accepted(&self) -> bool {
        self.status.code == INVOICE_ACCEPTED_CODE
    }
}

// ---------------------------------------------------------------------------
// Invoice metadata query
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubjectType {
    /// Invoices issued by the authenticated subject.
    Subject1,
    /// Invoices received by the authenticated subject.
    Subject2,
    Subject3,
    SubjectAuthorized,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DateType {
    Issue,
    Invoicing,
    PermanentStorage,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRange {
    pub date_type: DateType,
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceQueryFilters {
    pub subject_type: SubjectType,
    pub date_range: DateRange,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ksef_number: Option<String>,
}

/// Metadata of a registered invoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceSummary {
    pub ksef_number: String,
    #[serde(default)]
    pub invoice_number: Option<String>,
    #[serde(default)]
    pub issue_date: Option<NaiveDate>,
    #[serde(default)]
    pub invoicing_date: Option<DateTime<FixedOffset>>,
    #[serde(default)]
    pub net_amount: Option<Decimal>,
    #[serde(default)]
    pub gross_amount: Option<Decimal>,
    #[serde(default)]
    pub vat_amount: Option<Decimal>,
    #[serde(default)]
    pub currency: Option<String>,
    /// SHA-256 of the invoice XML, base64.
    pub invoice_hash: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryInvoiceMetadataResponse {
    #[serde(default)]
    pub has_more: bool,
    #[serde(default)]
    pub is_truncated: bool,
    #[serde(default)]
    pub invoices: Vec<InvoiceSummary>,
}

// ---------------------------------------------------------------------------
// Authentication
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthChallengeResponse {
    pub challenge: String,
    pub timestamp: DateTime<FixedOffset>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextIdentifier {
    #[serde(rename = "type")]
    pub identifier_type: String,
    pub value: String,
}

impl ContextIdentifier {
    pub fn nip(nip: impl Into<String>) -> Self {
        Self {
            identifier_type: "Nip".into(),
            value: nip.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KsefTokenAuthRequest {
    pub challenge: String,
    pub context_identifier: ContextIdentifier,
    /// RSA-OAEP encrypted `"{token}|{timestampMs}"`, base64.
    pub encrypted_token: String,
}

/// A bearer token with its expiry.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenInfo {
    pub token: String,
    #[serde(default)]
    pub valid_until: Option<DateTime<FixedOffset>>,
}

impl fmt::Debug for TokenInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenInfo")
            .field("token", &"<redacted>")
            .field("valid_until", &self.valid_until)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthInitResponse {
    pub reference_number: String,
    pub authentication_token: TokenInfo,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthStatusResponse {
    pub status: StatusInfo,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthTokensResponse {
    pub access_token: TokenInfo,
    #[serde(default)]
    pub refresh_token: Option<TokenInfo>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PublicKeyUsage {
    KsefTokenEncryption,
    SymmetricKeyEncryption,
    #[serde(other)]
    Other,
}

/// Gateway public key certificate (DER, base64).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicKeyCertificate {
    pub certificate: String,
    #[serde(default)]
    pub valid_from: Option<DateTime<FixedOffset>>,
    #[serde(default)]
    pub valid_to: Option<DateTime<FixedOffset>>,
    #[serde(default)]
    pub usage: Vec<PublicKeyUsage>,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Error body returned by the gateway for rejected requests.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExceptionResponse {
    #[serde(default)]
    pub exception: ExceptionInfo,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExceptionInfo {
    #[serde(default)]
    pub exception_detail_list: Vec<ExceptionDetail>,
    #[serde(default)]
    pub reference_number: Option<String>,
    #[serde(default)]
    pub service_code: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExceptionDetail {
    pub exception_code: i32,
    #[serde(default)]
    pub exception_description: String,
    #[serde(default)]
    pub details: Vec<String>,
}

impl fmt::Display for ExceptionResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let list = &self.exception.exception_detail_list;
        if list.is_empty() {
            return f.write_str("no exception details");
        }
        for (i, detail) in list.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}: {}", detail.exception_code, detail.exception_description)?;
            if !detail.details.is_empty() {
                write!(f, " ({})", detail.details.join(", "))?;
            }
        }
        Ok(())
    }
}
