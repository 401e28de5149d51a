#![no_main]

use ksef_minimal::template::{InvoiceField, InvoiceTemplate};
use libfuzzer_sys::fuzz_target;

const TEMPLATE: &str = include_str!("../../templates/TestFaktura.xml");

fuzz_target!(|data: &[u8]| {
    if let Ok(value) = std::str::from_utf8(data) {
        // Whatever is written must read back and survive a reparse.
        let Ok(mut template) = InvoiceTemplate::parse(TEMPLATE) else {
            return;
        };
        for field in InvoiceField::ALL {
            template.set(field, value).unwrap();
        }
        assert_eq!(template.text(InvoiceField::ProductName).unwrap(), value);
        let xml = template.to_xml().unwrap();
        let _ = InvoiceTemplate::parse(&xml);
    }
});
