use chrono::{TimeZone, Utc};
use criterion::{Criterion, black_box, criterion_group, criterion_main};
use rust_decimal_macros::dec;

use ksef_minimal::config::demo_buyer;
use ksef_minimal::core::*;
use ksef_minimal::crypto::file_metadata;
use ksef_minimal::template::{InvoiceFields, InvoiceTemplate};

const TEMPLATE: &str = include_str!("../templates/TestFaktura.xml");

fn fields() -> InvoiceFields {
    let at = Utc.with_ymd_and_hms(2025, 10, 17, 12, 30, 15).unwrap();
    InvoiceFields::new(
        at,
        invoice_number(at.naive_utc()),
        CompanyInfoBuilder::new("1234567890", "Benchmark Sp. z o.o.")
            .address("ul. Testowa 1", "00-001 Warszawa")
            .build()
            .unwrap(),
        demo_buyer(),
        ProductLineBuilder::new("Złote konto w systemie SaaS - roczne", dec!(100))
            .build()
            .unwrap(),
    )
    .unwrap()
}

fn bench_parse(c: &mut Criterion) {
    c.bench_function("template_parse", |b| {
        b.iter(|| InvoiceTemplate::parse(black_box(TEMPLATE)).unwrap())
    });
}

fn bench_fill_and_serialize(c: &mut Criterion) {
    let template = InvoiceTemplate::parse(TEMPLATE).unwrap();
    let fields = fields();
    c.bench_function("template_fill_to_xml", |b| {
        b.iter(|| {
            let mut doc = template.clone();
            doc.fill(black_box(&fields)).unwrap();
            doc.to_xml().unwrap()
        })
    });
}

fn bench_hash(c: &mut Criterion) {
    let mut doc = InvoiceTemplate::parse(TEMPLATE).unwrap();
    doc.fill(&fields()).unwrap();
    let xml = doc.to_xml().unwrap();
    c.bench_function("invoice_sha256", |b| {
        b.iter(|| file_metadata(black_box(xml.as_bytes())))
    });
}

criterion_group!(benches, bench_parse, bench_fill_and_serialize, bench_hash);
criterion_main!(benches);
