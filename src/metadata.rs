//! Look up the metadata record of a registered invoice.
use chrono::{DateTime, TimeDelta, Utc};
use tracing::debug;

use crate::core::KsefError;
use crate::gateway::{
    DateRange, DateType, InvoiceQueryFilters, InvoiceSummary, KsefGateway,
    QueryInvoiceMetadataResponse, SubjectType,
};

/// Half-width of the issue-date window searched around the invoice time.
pub const DEFAULT_METADATA_WINDOW: TimeDelta = TimeDelta::minutes(10);

/// Seller-side filters for the invoice `ksef_number`, issued within `window`
/// of `invoice_time`.
pub fn metadata_filters(
    ksef_number: &str,
    invoice_time: DateTime<Utc>,
    window: TimeDelta,
) -> InvoiceQueryFilters {
    InvoiceQueryFilters {
        subject_type: SubjectType::Subject1,
        date_range: DateRange {
            date_type: DateType::Issue,
            from: invoice_time - window,
            to: invoice_time + window,
        },
        ksef_number: Some(ksef_number.to_string()),
    }
}

/// Query the gateway by registry number and return the single matching record.
///
/// # Errors
/// [`KsefError::NotFound`] when zero or several records match.
pub async fn find_invoice_metadata<G: KsefGateway>(
    gateway: &G,
    access_token: &str,
    ksef_number: &str,
    invoice_time: DateTime<Utc>,
    window: TimeDelta,
) -> Result<InvoiceSummary, KsefError> {
    let filters = metadata_filters(ksef_number, invoice_time, window);
    let response = gateway.query_invoice_metadata(&filters, access_token).await?;
    debug!(
        returned = response.invoices.len(),
        has_more = response.has_more,
        "metadata page received"
    );
    single_match(response, ksef_number)
}

/// Pick the only invoice whose KSeF number equals `ksef_number`.
pub fn single_match(
    response: QueryInvoiceMetadataResponse,
    ksef_number: &str,
) -> Result<InvoiceSummary, KsefError> {
    let mut matches: Vec<InvoiceSummary> = response
        .invoices
        .into_iter()
        .filter(|invoice| invoice.ksef_number == ksef_number)
        .collect();
    match matches.len() {
        1 => Ok(matches.remove(0)),
        n => Err(KsefError::NotFound {
            ksef_number: ksef_number.to_string(),
            matches: n,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(ksef_number: &str) -> InvoiceSummary {
        serde_json::from_value(serde_json::json!({
            "ksefNumber": ksef_number,
            "invoiceHash": "abc="
        }))
        .unwrap()
    }

    fn page(numbers: &[&str]) -> QueryInvoiceMetadataResponse {
        QueryInvoiceMetadataResponse {
            has_more: false,
            is_truncated: false,
            invoices: numbers.iter().map(|n| summary(n)).collect(),
        }
    }

    #[test]
    fn window_is_centered_on_invoice_time() {
        let at = DateTime::parse_from_rfc3339("2025-10-17T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let filters = metadata_filters("X", at, DEFAULT_METADATA_WINDOW);
        assert_eq!(filters.date_range.from.to_rfc3339(), "2025-10-17T11:50:00+00:00");
        assert_eq!(filters.date_range.to.to_rfc3339(), "2025-10-17T12:10:00+00:00");
        assert_eq!(filters.subject_type, SubjectType::Subject1);
        assert_eq!(filters.ksef_number.as_deref(), Some("X"));
    }

    #[test]
    fn picks_matching_record_among_others() {
        let found = single_match(page(&["A", "X", "B"]), "X").unwrap();
        assert_eq!(found.ksef_number, "X");
    }

    #[test]
    fn no_match_is_not_found() {
        let err = single_match(page(&["A"]), "X").unwrap_err();
        assert!(matches!(err, KsefError::NotFound { matches: 0, .. }));
    }

    #[test]
    fn duplicate_match_is_not_found() {
        let err = single_match(page(&["X", "X"]), "X").unwrap_err();
        assert!(matches!(err, KsefError::NotFound { matches: 2, .. }));
    }
}
