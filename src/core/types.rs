use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::error::KsefError;

/// Default VAT rate in percent (Polish standard rate).
pub const DEFAULT_VAT_RATE: Decimal = dec!(23);

/// Default unit of measure ("szt", Polish for piece).
pub const DEFAULT_UNIT: &str = "szt";

/// Default country code for parties.
pub const DEFAULT_COUNTRY_CODE: &str = "PL";

/// Seller or buyer ("Podmiot") on an invoice.
///
/// Field names deserialize from the PascalCase keys used in
/// `appsettings.json` (`VatId`, `Name`, `AdresLine1`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyInfo {
    #[serde(rename = "VatId", default)]
    pub(crate) vat_id: String,
    #[serde(rename = "Name", default)]
    pub(crate) name: String,
    #[serde(rename = "AdresLine1", alias = "AddressLine1", default)]
    pub(crate) address_line1: String,
    #[serde(rename = "AdresLine2", alias = "AddressLine2", default)]
    pub(crate) address_line2: String,
    #[serde(rename = "CountryCode", default = "default_country_code")]
    pub(crate) country_code: String,
}

fn default_country_code() -> String {
    DEFAULT_COUNTRY_CODE.to_string()
}

impl CompanyInfo {
    /// Tax identifier (NIP).
    pub fn vat_id(&self) -> &str {
        &self.vat_id
    }

    /// Legal name.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn address_line1(&self) -> &str {
        &self.address_line1
    }

    pub fn address_line2(&self) -> &str {
        &self.address_line2
    }

    /// ISO 3166-1 alpha-2 country code.
    pub fn country_code(&self) -> &str {
        &self.country_code
    }

    /// Reason this party cannot appear on an invoice, if any.
    pub(crate) fn check(&self) -> Result<(), String> {
        if self.vat_id.trim().is_empty() {
            return Err("tax id is required".into());
        }
        if self.name.trim().is_empty() {
            return Err("company name is required".into());
        }
        if self.country_code.len() != 2 {
            return Err(format!(
                "country code must have 2 letters, got {:?}",
                self.country_code
            ));
        }
        Ok(())
    }
}

/// A single invoiced product line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductLineInfo {
    #[serde(rename = "ProductName")]
    pub(crate) product_name: String,
    #[serde(rename = "NetPrice")]
    pub(crate) net_price: Decimal,
    #[serde(rename = "VatRate", default = "default_vat_rate")]
    pub(crate) vat_rate: Decimal,
    #[serde(rename = "Qty", alias = "Quantity", default = "default_quantity")]
    pub(crate) quantity: Decimal,
    #[serde(rename = "Meassure", alias = "Unit", default = "default_unit")]
    pub(crate) unit: String,
}

fn default_vat_rate() -> Decimal {
    DEFAULT_VAT_RATE
}

fn default_quantity() -> Decimal {
    Decimal::ONE
}

fn default_unit() -> String {
    DEFAULT_UNIT.to_string()
}

impl ProductLineInfo {
    pub fn product_name(&self) -> &str {
        &self.product_name
    }

    /// Net price per unit.
    pub fn net_price(&self) -> Decimal {
        self.net_price
    }

    /// VAT rate in percent.
    pub fn vat_rate(&self) -> Decimal {
        self.vat_rate
    }

    pub fn quantity(&self) -> Decimal {
        self.quantity
    }

    /// Unit of measure.
    pub fn unit(&self) -> &str {
        &self.unit
    }

    /// Line value written to `P_11`: net unit price times quantity.
    ///
    /// VAT is not applied here; the template carries the rate in `P_12`.
    ///
    /// # Errors
    /// [`KsefError::Arithmetic`] if the product does not fit a `Decimal`.
    pub fn gross_line_value(&self) -> Result<Decimal, KsefError> {
        self.net_price.checked_mul(self.quantity).ok_or_else(|| {
            KsefError::Arithmetic(format!(
                "line value {} x {} overflows",
                self.net_price, self.quantity
            ))
        })
    }

    /// Reason this line cannot be invoiced, if any.
    pub(crate) fn check(&self) -> Result<(), String> {
        if self.product_name.trim().is_empty() {
            return Err("product name is required".into());
        }
        if self.net_price.is_sign_negative() {
            return Err(format!(
                "net price must not be negative, got {}",
                self.net_price
            ));
        }
        if self.quantity <= Decimal::ZERO {
            return Err(format!("quantity must be positive, got {}", self.quantity));
        }
        if self.unit.trim().is_empty() {
            return Err("unit of measure is required".into());
        }
        self.gross_line_value().map_err(|e| e.to_string())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn company_info_from_settings_json() {
        let json = r#"{
            "VatId": "5260250274",
            "Name": "Test Sp. z o.o.",
            "AdresLine1": "ul. Prosta 1",
            "AdresLine2": "00-001 Warszawa"
        }"#;
        let company: CompanyInfo = serde_json::from_str(json).unwrap();
        assert_eq!(company.vat_id(), "5260250274");
        assert_eq!(company.address_line2(), "00-001 Warszawa");
        assert_eq!(company.country_code(), "PL");
    }

    #[test]
    fn product_line_defaults() {
        let json = r#"{"ProductName": "Abonament", "NetPrice": "100"}"#;
        let line: ProductLineInfo = serde_json::from_str(json).unwrap();
        assert_eq!(line.vat_rate(), dec!(23));
        assert_eq!(line.quantity(), dec!(1));
        assert_eq!(line.unit(), "szt");
        assert_eq!(line.gross_line_value().unwrap(), dec!(100));
    }

    #[test]
    fn gross_line_value_is_net_times_quantity() {
        let line = ProductLineInfo {
            product_name: "Licencja".into(),
            net_price: dec!(49.99),
            vat_rate: dec!(23),
            quantity: dec!(3),
            unit: "szt".into(),
        };
        assert_eq!(line.gross_line_value().unwrap(), dec!(149.97));
    }

    #[test]
    fn overflowing_line_value_is_an_error() {
        let line = ProductLineInfo {
            product_name: "Licencja".into(),
            net_price: dec!(10000000000000000000),
            vat_rate: dec!(23),
            quantity: dec!(100000000000),
            unit: "szt".into(),
        };
        assert!(matches!(line.gross_line_value(), Err(KsefError::Arithmetic(_))));
        assert!(line.check().is_err());
    }

    #[test]
    fn party_without_name_fails_check() {
        let json = r#"{"VatId": "7740001454", "Name": " "}"#;
        let company: CompanyInfo = serde_json::from_str(json).unwrap();
        assert_eq!(company.check().unwrap_err(), "company name is required");
    }
}
