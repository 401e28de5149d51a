use rust_decimal::Decimal;

use super::error::KsefError;
use super::types::*;

/// Builder for [`CompanyInfo`].
///
/// ```
/// use ksef_minimal::core::*;
///
/// let seller = CompanyInfoBuilder::new("1234567890", "Firma Testowa Sp. z o.o.")
///     .address("ul. Testowa 1", "00-001 Warszawa")
///     .build()
///     .unwrap();
/// assert_eq!(seller.country_code(), "PL");
/// ```
pub struct CompanyInfoBuilder {
    vat_id: String,
    name: String,
    address_line1: String,
    address_line2: String,
    country_code: String,
}

impl CompanyInfoBuilder {
    pub fn new(vat_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            vat_id: vat_id.into(),
            name: name.into(),
            address_line1: String::new(),
            address_line2: String::new(),
            country_code: DEFAULT_COUNTRY_CODE.to_string(),
        }
    }

    pub fn address(mut self, line1: impl Into<String>, line2: impl Into<String>) -> Self {
        self.address_line1 = line1.into();
        self.address_line2 = line2.into();
        self
    }

    pub fn country_code(mut self, code: impl Into<String>) -> Self {
        self.country_code = code.into();
        self
    }

    pub fn build(self) -> Result<CompanyInfo, KsefError> {
        let company = CompanyInfo {
            vat_id: self.vat_id,
            name: self.name,
            address_line1: self.address_line1,
            address_line2: self.address_line2,
            country_code: self.country_code,
        };
        company.check().map_err(KsefError::Builder)?;
        Ok(company)
    }
}

/// Builder for [`ProductLineInfo`]. Defaults: VAT 23%, quantity 1, unit "szt".
///
/// ```
/// use ksef_minimal::core::*;
/// use rust_decimal_macros::dec;
///
/// let line = ProductLineBuilder::new("Konto SaaS - roczne", dec!(49.99))
///     .quantity(dec!(3))
///     .build()
///     .unwrap();
/// assert_eq!(line.gross_line_value().unwrap(), dec!(149.97));
/// ```
pub struct ProductLineBuilder {
    product_name: String,
    net_price: Decimal,
    vat_rate: Decimal,
    quantity: Decimal,
    unit: String,
}

impl ProductLineBuilder {
    pub fn new(product_name: impl Into<String>, net_price: Decimal) -> Self {
        Self {
            product_name: product_name.into(),
            net_price,
            vat_rate: DEFAULT_VAT_RATE,
            quantity: Decimal::ONE,
            unit: DEFAULT_UNIT.to_string(),
        }
    }

    pub fn vat_rate(mut self, rate: Decimal) -> Self {
        self.vat_rate = rate;
        self
    }

    pub fn quantity(mut self, quantity: Decimal) -> Self {
        self.quantity = quantity;
        self
    }

    pub fn unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = unit.into();
        self
    }

    pub fn build(self) -> Result<ProductLineInfo, KsefError> {
        let line = ProductLineInfo {
            product_name: self.product_name,
            net_price: self.net_price,
            vat_rate: self.vat_rate,
            quantity: self.quantity,
            unit: self.unit,
        };
        line.check().map_err(KsefError::Builder)?;
        Ok(line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn company_requires_tax_id() {
        assert!(CompanyInfoBuilder::new("  ", "Firma").build().is_err());
    }

    #[test]
    fn company_rejects_long_country_code() {
        let err = CompanyInfoBuilder::new("1234567890", "Firma")
            .country_code("POL")
            .build()
            .unwrap_err();
        assert!(matches!(err, KsefError::Builder(_)));
    }

    #[test]
    fn product_line_rejects_zero_quantity() {
        assert!(
            ProductLineBuilder::new("Usługa", dec!(10))
                .quantity(Decimal::ZERO)
                .build()
                .is_err()
        );
    }

    #[test]
    fn product_line_defaults() {
        let line = ProductLineBuilder::new("Usługa", dec!(100)).build().unwrap();
        assert_eq!(line.vat_rate(), dec!(23));
        assert_eq!(line.quantity(), dec!(1));
        assert_eq!(line.unit(), "szt");
    }

    #[test]
    fn product_line_rejects_overflowing_value() {
        let err = ProductLineBuilder::new("Usługa", dec!(10000000000000000000))
            .quantity(dec!(100000000000))
            .build()
            .unwrap_err();
        assert!(matches!(err, KsefError::Builder(ref m) if m.contains("overflows")));
    }
}
