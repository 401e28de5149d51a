mod common;

use ksef_minimal::config::demo_buyer;
use ksef_minimal::core::*;
use ksef_minimal::template::*;
use rust_decimal_macros::dec;

use common::{invoice_time, seller, template, template_path};

fn fields() -> InvoiceFields {
    let line = ProductLineBuilder::new("Licencja roczna", dec!(49.99))
        .quantity(dec!(3))
        .build()
        .unwrap();
    InvoiceFields::new(
        invoice_time(),
        invoice_number(invoice_time().naive_utc()),
        seller(),
        demo_buyer(),
        line,
    )
    .unwrap()
}

// --- Filling ---

#[test]
fn every_field_reads_back_what_was_written() {
    let mut template = template();
    let fields = fields();
    template.fill(&fields).unwrap();
    for (field, value) in fields.entries() {
        assert_eq!(template.text(field).unwrap(), value, "field {field}");
    }
}

#[test]
fn filled_values_use_template_formats() {
    let mut template = template();
    template.fill(&fields()).unwrap();

    assert_eq!(template.text(InvoiceField::CreatedAt).unwrap(), "2025-10-17T12:30:15Z");
    assert_eq!(template.text(InvoiceField::IssueDate).unwrap(), "2025-10-17");
    assert_eq!(template.text(InvoiceField::PaymentDate).unwrap(), "2025-10-17");
    assert_eq!(
        template.text(InvoiceField::InvoiceNumber).unwrap(),
        "FV 2025/10/17/450150000000"
    );
    assert_eq!(template.text(InvoiceField::NetUnitPrice).unwrap(), "49.99");
    assert_eq!(template.text(InvoiceField::Quantity).unwrap(), "3");
    assert_eq!(template.text(InvoiceField::NetValue).unwrap(), "149.97");
    assert_eq!(template.text(InvoiceField::VatRate).unwrap(), "23");
}

#[test]
fn parties_are_written_to_their_own_subtree() {
    let mut template = template();
    template.fill(&fields()).unwrap();

    let seller_nip = InvoiceField::Party(Party::Seller, PartyField::Nip);
    let buyer_nip = InvoiceField::Party(Party::Buyer, PartyField::Nip);
    let buyer_city = InvoiceField::Party(Party::Buyer, PartyField::AddressLine2);
    assert_eq!(template.text(seller_nip).unwrap(), "1234567890");
    assert_eq!(template.text(buyer_nip).unwrap(), "7740001454");
    assert_eq!(template.text(buyer_city).unwrap(), "09-411 Płock");
}

#[test]
fn elements_outside_the_field_set_are_left_alone() {
    let mut template = template();
    template.fill(&fields()).unwrap();
    let xml = template.to_xml().unwrap();

    // Totals are not recomputed.
    assert!(xml.contains("<P_13_1>100</P_13_1>"));
    assert!(xml.contains("<P_15>123</P_15>"));
    assert!(xml.contains(r#"<KodFormularza kodSystemowy="FA (3)" wersjaSchemy="1-0E">FA</KodFormularza>"#));
    assert!(xml.starts_with(r#"<?xml version="1.0" encoding="UTF-8"?>"#));
}

#[test]
fn loaded_template_serializes_unchanged() {
    let original = std::fs::read_to_string(template_path()).unwrap();
    assert_eq!(template().to_xml().unwrap(), original);
}

#[test]
fn filled_document_parses_again() {
    let mut template = template();
    template.fill(&fields()).unwrap();
    let reparsed = InvoiceTemplate::parse(&template.to_xml().unwrap()).unwrap();
    assert_eq!(
        reparsed.text(InvoiceField::ProductName).unwrap(),
        "Licencja roczna"
    );
}

// --- Failures ---

#[test]
fn unknown_local_name_is_field_not_found() {
    let mut template = template();
    let err = template.set_local(None, "P_106E_3", "1").unwrap_err();
    assert!(matches!(err, TemplateError::FieldNotFound { ref field } if field == "P_106E_3"));
}

#[test]
fn template_missing_payment_date_is_rejected() {
    let original = std::fs::read_to_string(template_path()).unwrap();
    let broken = original.replace("<DataZaplaty>2025-01-01</DataZaplaty>", "");
    let err = InvoiceTemplate::parse(&broken).unwrap_err();
    assert!(matches!(err, TemplateError::FieldNotFound { ref field } if field == "DataZaplaty"));
}

#[test]
fn missing_template_file_is_reported() {
    let err = InvoiceTemplate::from_path("templates/DoesNotExist.xml").unwrap_err();
    assert!(matches!(err, TemplateError::MissingFile(_)));
    assert!(err.to_string().contains("DoesNotExist.xml"));
}
