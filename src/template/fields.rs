use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;

use crate::core::{CompanyInfo, KsefError, ProductLineInfo};

/// Invoice party, mapped to its `Podmiot` subtree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Party {
    /// `Podmiot1`.
    Seller,
    /// `Podmiot2`.
    Buyer,
}

impl Party {
    pub fn element(&self) -> &'static str {
        match self {
            Self::Seller => "Podmiot1",
            Self::Buyer => "Podmiot2",
        }
    }
}

/// Field of a party block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PartyField {
    Nip,
    Name,
    CountryCode,
    AddressLine1,
    AddressLine2,
}

impl PartyField {
    pub fn element(&self) -> &'static str {
        match self {
            Self::Nip => "NIP",
            Self::Name => "Nazwa",
            Self::CountryCode => "KodKraju",
            Self::AddressLine1 => "AdresL1",
            Self::AddressLine2 => "AdresL2",
        }
    }
}

/// A template element the submission flow writes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InvoiceField {
    /// `DataWytworzeniaFa`: document creation timestamp.
    CreatedAt,
    /// `P_1`: issue date.
    IssueDate,
    /// `P_2`: invoice number.
    InvoiceNumber,
    /// `P_6`: date of sale.
    SaleDate,
    /// `P_7`: product or service name.
    ProductName,
    /// `P_8A`: unit of measure.
    Unit,
    /// `P_8B`: quantity.
    Quantity,
    /// `P_9A`: net unit price.
    NetUnitPrice,
    /// `P_11`: net line value.
    NetValue,
    /// `P_12`: VAT rate.
    VatRate,
    /// `DataZaplaty`: payment date.
    PaymentDate,
    Party(Party, PartyField),
}

const PARTY_FIELDS: [PartyField; 5] = [
    PartyField::Nip,
    PartyField::Name,
    PartyField::CountryCode,
    PartyField::AddressLine1,
    PartyField::AddressLine2,
];

impl InvoiceField {
    /// Every field a template must contain.
    pub const ALL: [InvoiceField; 21] = [
        Self::CreatedAt,
        Self::IssueDate,
        Self::InvoiceNumber,
        Self::SaleDate,
        Self::ProductName,
        Self::Unit,
        Self::Quantity,
        Self::NetUnitPrice,
        Self::NetValue,
        Self::VatRate,
        Self::PaymentDate,
        Self::Party(Party::Seller, PARTY_FIELDS[0]),
        Self::Party(Party::Seller, PARTY_FIELDS[1]),
        Self::Party(Party::Seller, PARTY_FIELDS[2]),
        Self::Party(Party::Seller, PARTY_FIELDS[3]),
        Self::Party(Party::Seller, PARTY_FIELDS[4]),
        Self::Party(Party::Buyer, PARTY_FIELDS[0]),
        Self::Party(Party::Buyer, PARTY_FIELDS[1]),
        Self::Party(Party::Buyer, PARTY_FIELDS[2]),
        Self::Party(Party::Buyer, PARTY_FIELDS[3]),
        Self::Party(Party::Buyer, PARTY_FIELDS[4]),
    ];

    /// Unqualified element name.
    pub fn local_name(&self) -> &'static str {
        match self {
            Self::CreatedAt => "DataWytworzeniaFa",
            Self::IssueDate => "P_1",
            Self::InvoiceNumber => "P_2",
            Self::SaleDate => "P_6",
            Self::ProductName => "P_7",
            Self::Unit => "P_8A",
            Self::Quantity => "P_8B",
            Self::NetUnitPrice => "P_9A",
            Self::NetValue => "P_11",
            Self::VatRate => "P_12",
            Self::PaymentDate => "DataZaplaty",
            Self::Party(_, field) => field.element(),
        }
    }

    /// Ancestor element the lookup is restricted to, if any.
    pub fn scope(&self) -> Option<&'static str> {
        match self {
            Self::Party(party, _) => Some(party.element()),
            _ => None,
        }
    }
}

impl fmt::Display for InvoiceField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.scope() {
            Some(scope) => write!(f, "{scope}/{}", self.local_name()),
            None => f.write_str(self.local_name()),
        }
    }
}

/// Values for one invoice, one per [`InvoiceField`].
#[derive(Debug, Clone)]
pub struct InvoiceFields {
    pub created_at: DateTime<Utc>,
    pub issue_date: NaiveDate,
    pub sale_date: NaiveDate,
    pub payment_date: NaiveDate,
    pub invoice_number: String,
    pub seller: CompanyInfo,
    pub buyer: CompanyInfo,
    line: ProductLineInfo,
    net_value: Decimal,
}

impl InvoiceFields {
    /// Fields for an invoice issued, sold and payable on the day of `invoice_time`.
    ///
    /// # Errors
    /// [`KsefError::Arithmetic`] if the line value overflows.
    pub fn new(
        invoice_time: DateTime<Utc>,
        invoice_number: impl Into<String>,
        seller: CompanyInfo,
        buyer: CompanyInfo,
        line: ProductLineInfo,
    ) -> Result<Self, KsefError> {
        let day = invoice_time.date_naive();
        let net_value = line.gross_line_value()?;
        Ok(Self {
            created_at: invoice_time,
            issue_date: day,
            sale_date: day,
            payment_date: day,
            invoice_number: invoice_number.into(),
            seller,
            buyer,
            line,
            net_value,
        })
    }

    pub fn line(&self) -> &ProductLineInfo {
        &self.line
    }

    /// Text written to `field`.
    pub fn value(&self, field: InvoiceField) -> String {
        match field {
            InvoiceField::CreatedAt => self.created_at.format("%Y-%m-%dT%H:%M:%SZ").to_string(),
            InvoiceField::IssueDate => format_date(self.issue_date),
            InvoiceField::InvoiceNumber => self.invoice_number.clone(),
            InvoiceField::SaleDate => format_date(self.sale_date),
            InvoiceField::ProductName => self.line.product_name().to_string(),
            InvoiceField::Unit => self.line.unit().to_string(),
            InvoiceField::Quantity => format_amount(self.line.quantity()),
            InvoiceField::NetUnitPrice => format_amount(self.line.net_price()),
            InvoiceField::NetValue => format_amount(self.net_value),
            InvoiceField::VatRate => format_amount(self.line.vat_rate()),
            InvoiceField::PaymentDate => format_date(self.payment_date),
            InvoiceField::Party(party, field) => {
                let company = match party {
                    Party::Seller => &self.seller,
                    Party::Buyer => &self.buyer,
                };
                match field {
                    PartyField::Nip => company.vat_id(),
                    PartyField::Name => company.name(),
                    PartyField::CountryCode => company.country_code(),
                    PartyField::AddressLine1 => company.address_line1(),
                    PartyField::AddressLine2 => company.address_line2(),
                }
                .to_string()
            }
        }
    }

    /// All `(field, text)` pairs in template order.
    pub fn entries(&self) -> Vec<(InvoiceField, String)> {
        InvoiceField::ALL
            .iter()
            .map(|field| (*field, self.value(*field)))
            .collect()
    }
}

fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Format a decimal for the template: plain notation, no trailing zeros.
pub fn format_amount(d: Decimal) -> String {
    d.normalize().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn format_amount_cases() {
        assert_eq!(format_amount(dec!(100)), "100");
        assert_eq!(format_amount(dec!(100.00)), "100");
        assert_eq!(format_amount(dec!(149.970)), "149.97");
        assert_eq!(format_amount(dec!(0.5)), "0.5");
    }

    #[test]
    fn field_display_includes_scope() {
        assert_eq!(InvoiceField::IssueDate.to_string(), "P_1");
        assert_eq!(
            InvoiceField::Party(Party::Buyer, PartyField::Name).to_string(),
            "Podmiot2/Nazwa"
        );
    }

    #[test]
    fn all_fields_are_distinct() {
        let mut seen = std::collections::HashSet::new();
        for field in InvoiceField::ALL {
            assert!(seen.insert(field), "duplicate field {field}");
        }
    }

    #[test]
    fn overflowing_line_is_rejected_before_filling() {
        let line: ProductLineInfo = serde_json::from_str(
            r#"{"ProductName": "Licencja", "NetPrice": "10000000000000000000", "Qty": "100000000000"}"#,
        )
        .unwrap();
        let buyer = crate::config::demo_buyer();
        let err = InvoiceFields::new(Utc::now(), "FV 1", buyer.clone(), buyer, line).unwrap_err();
        assert!(matches!(err, KsefError::Arithmetic(_)));
    }
}
