//! In-memory collaborators shared by the integration tests.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::{DateTime, TimeZone, Utc};
use ksef_minimal::auth::{AccessToken, Authenticator};
use ksef_minimal::config::{Environment, Settings};
use ksef_minimal::core::*;
use ksef_minimal::crypto::{CryptographyService, EncryptionData};
use ksef_minimal::gateway::*;
use ksef_minimal::template::InvoiceTemplate;

pub const SELLER_NIP: &str = "1234567890";
pub const ACCESS_TOKEN: &str = "access-token";
pub const SESSION_REF: &str = "20251017-SO-0000000001-AB-01";
pub const INVOICE_REF: &str = "20251017-EE-0000000002-CD-02";
pub const METADATA_PAGE_SIZE: usize = 10;

pub fn template_path() -> String {
    concat!(env!("CARGO_MANIFEST_DIR"), "/templates/TestFaktura.xml").to_string()
}

pub fn template() -> InvoiceTemplate {
    InvoiceTemplate::from_path(template_path()).unwrap()
}

pub fn invoice_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 10, 17, 12, 30, 15).unwrap()
}

pub fn seller() -> CompanyInfo {
    CompanyInfoBuilder::new(SELLER_NIP, "Firma Testowa Sp. z o.o.")
        .address("ul. Testowa 1", "00-001 Warszawa")
        .build()
        .unwrap()
}

pub fn settings() -> Settings {
    Settings::new(Environment::Test, "ksef-token", seller())
}

pub fn status(code: i32, ksef_number: Option<&str>) -> SessionInvoiceStatus {
    SessionInvoiceStatus {
        ordinal_number: Some(1),
        invoice_number: None,
        ksef_number: ksef_number.map(str::to_string),
        reference_number: INVOICE_REF.into(),
        invoice_hash: None,
        invoicing_date: None,
        status: StatusInfo {
            code,
            description: match code {
                INVOICE_PROCESSING_CODE => "Trwa przetwarzanie".into(),
                INVOICE_ACCEPTED_CODE => "Sukces".into(),
                _ => "Błąd weryfikacji".into(),
            },
            details: Vec::new(),
        },
    }
}

pub fn processing() -> SessionInvoiceStatus {
    status(INVOICE_PROCESSING_CODE, None)
}

pub fn accepted(ksef_number: &str) -> SessionInvoiceStatus {
    status(INVOICE_ACCEPTED_CODE, Some(ksef_number))
}

/// Gateway that replays queued statuses and records every call.
///
/// The last queued status repeats once the queue is down to one entry.
#[derive(Default)]
pub struct MockGateway {
    statuses: Mutex<VecDeque<SessionInvoiceStatus>>,
    registered: Mutex<Vec<String>>,
    pub status_queries: AtomicUsize,
    pub opened: Mutex<Vec<OpenOnlineSessionRequest>>,
    pub sent: Mutex<Vec<SendInvoiceRequest>>,
    pub closed: Mutex<Vec<String>>,
    pub metadata_queries: Mutex<Vec<InvoiceQueryFilters>>,
}

impl MockGateway {
    pub fn with_statuses(statuses: impl IntoIterator<Item = SessionInvoiceStatus>) -> Self {
        Self {
            statuses: Mutex::new(statuses.into_iter().collect()),
            ..Self::default()
        }
    }

    /// KSeF numbers known to the metadata query, which honours the
    /// `ksefNumber` filter and pages like the gateway. Each record carries
    /// the hash of the last invoice sent.
    pub fn with_registered(self, ksef_numbers: &[&str]) -> Self {
        *self.registered.lock().unwrap() = ksef_numbers.iter().map(|n| n.to_string()).collect();
        self
    }

    pub fn status_queries(&self) -> usize {
        self.status_queries.load(Ordering::SeqCst)
    }

    pub fn last_sent(&self) -> SendInvoiceRequest {
        self.sent.lock().unwrap().last().cloned().unwrap()
    }
}

impl KsefGateway for MockGateway {
    async fn open_online_session(
        &self,
        request: &OpenOnlineSessionRequest,
        access_token: &str,
    ) -> Result<OpenOnlineSessionResponse, GatewayError> {
        assert_eq!(access_token, ACCESS_TOKEN);
        self.opened.lock().unwrap().push(request.clone());
        Ok(OpenOnlineSessionResponse {
            reference_number: SESSION_REF.into(),
            valid_until: None,
        })
    }

    async fn send_online_session_invoice(
        &self,
        session_reference: &str,
        request: &SendInvoiceRequest,
        _access_token: &str,
    ) -> Result<SendInvoiceResponse, GatewayError> {
        assert_eq!(session_reference, SESSION_REF);
        self.sent.lock().unwrap().push(request.clone());
        Ok(SendInvoiceResponse {
            reference_number: INVOICE_REF.into(),
        })
    }

    async fn session_invoice_status(
        &self,
        session_reference: &str,
        invoice_reference: &str,
        _access_token: &str,
    ) -> Result<SessionInvoiceStatus, GatewayError> {
        assert_eq!(session_reference, SESSION_REF);
        assert_eq!(invoice_reference, INVOICE_REF);
        self.status_queries.fetch_add(1, Ordering::SeqCst);
        let mut statuses = self.statuses.lock().unwrap();
        let next = if statuses.len() > 1 {
            statuses.pop_front()
        } else {
            statuses.front().cloned()
        };
        next.ok_or_else(|| GatewayError::InvalidResponse("no status queued".into()))
    }

    async fn close_online_session(
        &self,
        session_reference: &str,
        _access_token: &str,
    ) -> Result<(), GatewayError> {
        self.closed.lock().unwrap().push(session_reference.to_string());
        Ok(())
    }

    async fn query_invoice_metadata(
        &self,
        filters: &InvoiceQueryFilters,
        _access_token: &str,
    ) -> Result<QueryInvoiceMetadataResponse, GatewayError> {
        self.metadata_queries.lock().unwrap().push(filters.clone());
        let hash = self
            .sent
            .lock()
            .unwrap()
            .last()
            .map(|r| r.invoice_hash.clone())
            .unwrap_or_default();
        let registered = self.registered.lock().unwrap();
        let matching: Vec<&String> = registered
            .iter()
            .filter(|n| filters.ksef_number.as_ref().is_none_or(|wanted| *n == wanted))
            .collect();
        let has_more = matching.len() > METADATA_PAGE_SIZE;
        let invoices = matching
            .into_iter()
            .take(METADATA_PAGE_SIZE)
            .map(|ksef_number| InvoiceSummary {
                ksef_number: ksef_number.clone(),
                invoice_number: None,
                issue_date: Some(filters.date_range.from.date_naive()),
                invoicing_date: None,
                net_amount: None,
                gross_amount: None,
                vat_amount: None,
                currency: Some("PLN".into()),
                invoice_hash: hash.clone(),
            })
            .collect();
        Ok(QueryInvoiceMetadataResponse {
            has_more,
            is_truncated: false,
            invoices,
        })
    }
}

/// "Encrypts" by prefixing a marker, so the ciphertext differs from the input.
pub struct MockCrypto;

impl CryptographyService for MockCrypto {
    fn encryption_data(&self) -> Result<EncryptionData, KsefError> {
        Ok(EncryptionData::new(
            vec![1; 32],
            vec![2; 16],
            EncryptionInfo {
                encrypted_symmetric_key: "d3JhcHBlZA==".into(),
                initialization_vector: "AgICAgICAgICAgICAgICAg==".into(),
            },
        ))
    }

    fn encrypt_aes256(&self, content: &[u8], key: &[u8], iv: &[u8]) -> Result<Vec<u8>, KsefError> {
        assert_eq!(key.len(), 32);
        assert_eq!(iv.len(), 16);
        let mut out = b"enc:".to_vec();
        out.extend_from_slice(content);
        Ok(out)
    }
}

/// Hands out a fixed access token, or refuses every attempt.
#[derive(Default)]
pub struct MockAuth {
    pub refuse: bool,
    pub calls: AtomicUsize,
}

impl MockAuth {
    pub fn refusing() -> Self {
        Self {
            refuse: true,
            ..Self::default()
        }
    }
}

impl Authenticator for MockAuth {
    async fn authenticate(&self, nip: &str, ksef_token: &str) -> Result<AccessToken, KsefError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        assert_eq!(nip, SELLER_NIP);
        assert_eq!(ksef_token, "ksef-token");
        if self.refuse {
            return Err(KsefError::Auth("21115: Nieprawidłowy token".into()));
        }
        Ok(AccessToken::new(ACCESS_TOKEN))
    }
}
