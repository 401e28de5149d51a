//! The end-to-end submission flow.
//!
//! [`KsefContext::submit_invoice`] authenticates, fills the template, sends
//! the invoice through a fresh online session, waits for the gateway to
//! process it, looks up its metadata and returns everything the caller needs
//! to show the result, including the public verification link.
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::auth::Authenticator;
use crate::config::Settings;
use crate::core::{KsefError, invoice_number};
use crate::crypto::CryptographyService;
use crate::gateway::{InvoiceSummary, KsefGateway, SessionInvoiceStatus, SystemCode};
use crate::metadata::{DEFAULT_METADATA_WINDOW, find_invoice_metadata};
use crate::session::{open_session, send_invoice};
use crate::status::{PollPolicy, poll_invoice_status};
use crate::template::{InvoiceFields, InvoiceTemplate};
use crate::verification::VerificationLinkService;

/// Tunables for one submission run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineOptions {
    /// Status polling.
    pub poll: PollPolicy,
    /// Pause between acceptance and the metadata query; the registry needs a
    /// moment before a fresh invoice is searchable.
    pub metadata_delay: Duration,
    /// Half-width of the issue-date search window.
    pub metadata_window: TimeDelta,
    /// Upper bound for the whole run.
    pub run_timeout: Duration,
    /// Invoice schema the session is opened for.
    pub system_code: SystemCode,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            poll: PollPolicy::default(),
            metadata_delay: Duration::from_secs(10),
            metadata_window: DEFAULT_METADATA_WINDOW,
            run_timeout: Duration::from_secs(300),
            system_code: SystemCode::default(),
        }
    }
}

/// What a submission run produced.
#[derive(Debug, Clone, Serialize)]
pub struct SubmissionOutcome {
    pub invoice_number: String,
    pub session_reference: String,
    pub invoice_reference: String,
    /// Base64 SHA-256 of the submitted XML.
    pub invoice_hash: String,
    pub status: SessionInvoiceStatus,
    /// Registry number, once the gateway has assigned one.
    pub ksef_number: Option<String>,
    pub summary: Option<InvoiceSummary>,
    pub verification_url: String,
}

impl SubmissionOutcome {
    /// The gateway was still processing when polling gave up.
    pub fn is_processing(&self) -> bool {
        self.status.is_processing()
    }

    pub fn is_accepted(&self) -> bool {
        self.status.is_accepted()
    }
}

/// Collaborators and settings for a submission run.
#[derive(Debug)]
pub struct KsefContext<G, C, A> {
    pub gateway: G,
    pub crypto: C,
    pub auth: A,
    pub settings: Settings,
}

impl<G, C, A> KsefContext<G, C, A>
where
    G: KsefGateway + Sync,
    C: CryptographyService + Sync,
    A: Authenticator + Sync,
{
    pub fn new(gateway: G, crypto: C, auth: A, settings: Settings) -> Self {
        Self {
            gateway,
            crypto,
            auth,
            settings,
        }
    }

    /// Fill `template` for an invoice issued at `invoice_time`.
    ///
    /// Returns the invoice number and the XML to send.
    pub fn build_invoice_xml(
        &self,
        template: &InvoiceTemplate,
        invoice_time: DateTime<Utc>,
    ) -> Result<(String, String), KsefError> {
        let number = invoice_number(invoice_time.naive_utc());
        let fields = InvoiceFields::new(
            invoice_time,
            number.clone(),
            self.settings.seller().clone(),
            self.settings.buyer(),
            self.settings.product_line(),
        )?;
        let mut document = template.clone();
        document.fill(&fields)?;
        Ok((number, document.to_xml()?))
    }

    /// Run the whole flow once, bounded by `options.run_timeout`.
    ///
    /// # Errors
    /// The first failing step's error, or [`KsefError::Timeout`].
    pub async fn submit_invoice(
        &self,
        template: &InvoiceTemplate,
        invoice_time: DateTime<Utc>,
        options: &PipelineOptions,
    ) -> Result<SubmissionOutcome, KsefError> {
        tokio::time::timeout(options.run_timeout, self.run(template, invoice_time, options))
            .await
            .map_err(|_| KsefError::Timeout(options.run_timeout))?
    }

    async fn run(
        &self,
        template: &InvoiceTemplate,
        invoice_time: DateTime<Utc>,
        options: &PipelineOptions,
    ) -> Result<SubmissionOutcome, KsefError> {
        let seller_nip = self.settings.seller().vat_id();

        info!(nip = %seller_nip, "authenticating");
        let token = self
            .auth
            .authenticate(seller_nip, self.settings.token())
            .await?;
        let access_token = token.as_str();

        let (number, xml) = self.build_invoice_xml(template, invoice_time)?;
        info!(invoice_number = %number, bytes = xml.len(), "invoice prepared");

        let encryption = self.crypto.encryption_data()?;
        let session = open_session(&self.gateway, &encryption, access_token, options.system_code).await?;
        let sent = send_invoice(
            &self.gateway,
            &self.crypto,
            &session,
            access_token,
            &encryption,
            &xml,
        )
        .await?;

        info!(invoice = %sent.reference_number, "waiting for processing");
        let status = poll_invoice_status(
            &self.gateway,
            session.reference_number(),
            &sent.reference_number,
            access_token,
            options.poll,
        )
        .await?;

        let ksef_number = status.ksef_number.clone();
        let summary = match &ksef_number {
            Some(ksef_number) if !status.is_processing() => {
                info!(%ksef_number, "invoice registered");
                tokio::time::sleep(options.metadata_delay).await;
                let summary = find_invoice_metadata(
                    &self.gateway,
                    access_token,
                    ksef_number,
                    invoice_time,
                    options.metadata_window,
                )
                .await?;
                if summary.invoice_hash != sent.invoice_hash {
                    warn!(%ksef_number, "registered hash differs from the submitted one");
                }
                Some(summary)
            }
            _ => {
                if status.is_processing() {
                    warn!(invoice = %sent.reference_number, "invoice still processing; skipping metadata");
                } else {
                    warn!(
                        code = status.status.code,
                        description = %status.status.description,
                        "invoice not registered"
                    );
                }
                None
            }
        };

        let verification_url = VerificationLinkService::from_settings(&self.settings)
            .invoice_verification_url(seller_nip, invoice_time.date_naive(), &sent.invoice_hash)?;
        info!(url = %verification_url, "verification link built");

        let session_reference = session.reference_number().to_string();
        session.close(&self.gateway, access_token).await?;

        Ok(SubmissionOutcome {
            invoice_number: number,
            session_reference,
            invoice_reference: sent.reference_number,
            invoice_hash: sent.invoice_hash,
            status,
            ksef_number,
            summary,
            verification_url,
        })
    }
}
