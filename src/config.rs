//! Settings loading and environment selection.
//!
//! Settings come from an `appsettings.json` file with PascalCase sections:
//!
//! ```json
//! {
//!   "KsefSettings": { "Environment": "test", "Token": "..." },
//!   "SellerSettings": { "VatId": "1234567890", "Name": "Firma", "AdresLine1": "...", "AdresLine2": "..." }
//! }
//! ```
//!
//! `KSEF_BASE_URL`, `KSEF_TOKEN` and `KSEF_NIP` override the file.
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::{CompanyInfo, ProductLineInfo};

/// Errors raised while loading settings.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("cannot read settings file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid settings: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("missing required setting: {0}")]
    Missing(&'static str),
    #[error("invalid {section}: {reason}")]
    Invalid {
        section: &'static str,
        reason: String,
    },
    #[error("invalid environment type: {input}")]
    InvalidEnvironment { input: String },
}

/// KSeF environment. Selects the default API and verification base URLs.
///
/// ```rust
/// use std::str::FromStr;
/// use ksef_minimal::config::Environment;
///
/// assert_eq!(Environment::from_str("Demo").unwrap(), Environment::Demo);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Test,
    Demo,
    Production,
}

impl FromStr for Environment {
    type Err = ConfigError;

    fn from_str(env: &str) -> Result<Self, ConfigError> {
        match env.to_ascii_lowercase().as_str() {
            "test" => Ok(Self::Test),
            "demo" => Ok(Self::Demo),
            "production" | "prod" => Ok(Self::Production),
            _ => Err(ConfigError::InvalidEnvironment {
                input: env.to_string(),
            }),
        }
    }
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Test => "test",
            Self::Demo => "demo",
            Self::Production => "production",
        }
    }

    /// Base URL of the KSeF 2.0 REST API.
    pub fn api_url(&self) -> &'static str {
        match self {
            Self::Test => "https://ksef-test.mf.gov.pl/api/v2",
            Self::Demo => "https://ksef-demo.mf.gov.pl/api/v2",
            Self::Production => "https://ksef.mf.gov.pl/api/v2",
        }
    }

    /// Base URL for public invoice verification links.
    pub fn verification_url(&self) -> &'static str {
        match self {
            Self::Test => "https://qr-test.ksef.mf.gov.pl",
            Self::Demo => "https://qr-demo.ksef.mf.gov.pl",
            Self::Production => "https://qr.ksef.mf.gov.pl",
        }
    }
}

/// Gateway connection settings (`KsefSettings` section).
#[derive(Clone, Default, Deserialize)]
pub struct KsefSettings {
    #[serde(rename = "BaseUrl", default)]
    base_url: Option<String>,
    #[serde(rename = "Token", default)]
    token: String,
    #[serde(rename = "Environment", default)]
    environment: Environment,
    #[serde(rename = "VerificationBaseUrl", default)]
    verification_base_url: Option<String>,
}

impl fmt::Debug for KsefSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KsefSettings")
            .field("base_url", &self.base_url)
            .field("token", &"<redacted>")
            .field("environment", &self.environment)
            .field("verification_base_url", &self.verification_base_url)
            .finish()
    }
}

/// Everything a submission run needs to know up front.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(rename = "KsefSettings", default)]
    ksef: KsefSettings,
    #[serde(rename = "SellerSettings")]
    seller: CompanyInfo,
    #[serde(rename = "BuyerSettings", default)]
    buyer: Option<CompanyInfo>,
    #[serde(rename = "ProductLine", default)]
    product_line: Option<ProductLineInfo>,
}

impl Settings {
    /// Load settings from a JSON file, apply environment overrides and validate.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read or parsed, a
    /// required setting (token, seller tax id, seller name) is absent, or a
    /// configured party or product line is invalid.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut settings = Self::parse(&raw)?;
        settings.apply_overrides(|key| std::env::var(key).ok());
        settings.validate()?;
        Ok(settings)
    }

    /// Parse settings without overrides or validation.
    pub fn parse(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Build settings in code.
    pub fn new(environment: Environment, token: impl Into<String>, seller: CompanyInfo) -> Self {
        Self {
            ksef: KsefSettings {
                base_url: None,
                token: token.into(),
                environment,
                verification_base_url: None,
            },
            seller,
            buyer: None,
            product_line: None,
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.ksef.base_url = Some(url.into());
        self
    }

    pub fn with_verification_base_url(mut self, url: impl Into<String>) -> Self {
        self.ksef.verification_base_url = Some(url.into());
        self
    }

    pub fn with_buyer(mut self, buyer: CompanyInfo) -> Self {
        self.buyer = Some(buyer);
        self
    }

    pub fn with_product_line(mut self, line: ProductLineInfo) -> Self {
        self.product_line = Some(line);
        self
    }

    /// Apply `KSEF_BASE_URL`, `KSEF_TOKEN` and `KSEF_NIP` from `lookup`.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup("KSEF_BASE_URL").filter(|v| !v.is_empty()) {
            self.ksef.base_url = Some(url);
        }
        if let Some(token) = lookup("KSEF_TOKEN").filter(|v| !v.is_empty()) {
            self.ksef.token = token;
        }
        if let Some(nip) = lookup("KSEF_NIP").filter(|v| !v.is_empty()) {
            self.seller.vat_id = nip;
        }
    }

    /// Check that the required settings are present and that the seller,
    /// buyer and product line satisfy the same rules as their builders.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ksef.token.trim().is_empty() {
            return Err(ConfigError::Missing("KsefSettings.Token"));
        }
        if self.seller.vat_id().trim().is_empty() {
            return Err(ConfigError::Missing("SellerSettings.VatId"));
        }
        if self.seller.name().trim().is_empty() {
            return Err(ConfigError::Missing("SellerSettings.Name"));
        }
        self.seller.check().map_err(|reason| ConfigError::Invalid {
            section: "SellerSettings",
            reason,
        })?;
        if let Some(buyer) = &self.buyer {
            buyer.check().map_err(|reason| ConfigError::Invalid {
                section: "BuyerSettings",
                reason,
            })?;
        }
        if let Some(line) = &self.product_line {
            line.check().map_err(|reason| ConfigError::Invalid {
                section: "ProductLine",
                reason,
            })?;
        }
        Ok(())
    }

    pub fn environment(&self) -> Environment {
        self.ksef.environment
    }

    /// API base URL without a trailing slash.
    pub fn api_base_url(&self) -> &str {
        self.ksef
            .base_url
            .as_deref()
            .unwrap_or_else(|| self.ksef.environment.api_url())
            .trim_end_matches('/')
    }

    /// Verification link base URL without a trailing slash.
    pub fn verification_base_url(&self) -> &str {
        self.ksef
            .verification_base_url
            .as_deref()
            .unwrap_or_else(|| self.ksef.environment.verification_url())
            .trim_end_matches('/')
    }

    /// Long-lived KSeF token used to authenticate.
    pub fn token(&self) -> &str {
        &self.ksef.token
    }

    pub fn seller(&self) -> &CompanyInfo {
        &self.seller
    }

    /// Configured buyer, or the demo buyer when the section is absent.
    pub fn buyer(&self) -> CompanyInfo {
        self.buyer.clone().unwrap_or_else(demo_buyer)
    }

    /// Configured product line, or the demo line when the section is absent.
    pub fn product_line(&self) -> ProductLineInfo {
        self.product_line.clone().unwrap_or_else(demo_product_line)
    }
}

/// Buyer used when `BuyerSettings` is not configured.
pub fn demo_buyer() -> CompanyInfo {
    CompanyInfo {
        vat_id: "7740001454".into(),
        name: "ORLEN SPÓŁKA AKCYJNA".into(),
        address_line1: "ul. Chemików 7".into(),
        address_line2: "09-411 Płock".into(),
        country_code: "PL".into(),
    }
}

/// Product line used when `ProductLine` is not configured.
pub fn demo_product_line() -> ProductLineInfo {
    ProductLineInfo {
        product_name: "Złote konto w systemie SaaS - roczne".into(),
        net_price: dec!(100),
        vat_rate: dec!(23),
        quantity: dec!(1),
        unit: "szt".into(),
    }
}
