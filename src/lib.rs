//! # ksef-minimal
//!
//! Minimal client for KSeF, the Polish national e-invoicing system: fill an
//! FA(3) invoice template, submit it through an interactive (online) session,
//! poll until the gateway has processed it, look up its metadata and build the
//! public verification link.
//!
//! All monetary values use [`rust_decimal::Decimal`], never floating point.
//!
//! ## Quick Start
//!
//! ```rust
//! use chrono::{TimeZone, Utc};
//! use ksef_minimal::core::*;
//! use ksef_minimal::template::{InvoiceField, InvoiceFields};
//! use rust_decimal_macros::dec;
//!
//! let seller = CompanyInfoBuilder::new("1234567890", "Firma Testowa Sp. z o.o.")
//!     .address("ul. Testowa 1", "00-001 Warszawa")
//!     .build()
//!     .unwrap();
//! let buyer = CompanyInfoBuilder::new("7740001454", "ORLEN SPÓŁKA AKCYJNA")
//!     .address("ul. Chemików 7", "09-411 Płock")
//!     .build()
//!     .unwrap();
//! let line = ProductLineBuilder::new("Złote konto w systemie SaaS - roczne", dec!(100))
//!     .build()
//!     .unwrap();
//!
//! let at = Utc.with_ymd_and_hms(2025, 10, 17, 9, 0, 0).unwrap();
//! let fields = InvoiceFields::new(at, invoice_number(at.naive_utc()), seller, buyer, line).unwrap();
//! assert_eq!(fields.value(InvoiceField::InvoiceNumber), "FV 2025/10/17/324000000000");
//! assert_eq!(fields.value(InvoiceField::NetValue), "100");
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `http` (default) | reqwest gateway client, RSA/AES cryptography, token authentication |
//! | `cli` (default) | `ksef-minimal` binary |
//!
//! Without `http` the crate still provides the template filler, the
//! submission pipeline and the collaborator traits, so the flow can run
//! against any [`gateway::KsefGateway`] implementation.

pub mod auth;
pub mod config;
pub mod core;
pub mod crypto;
pub mod gateway;
pub mod metadata;
pub mod pipeline;
pub mod session;
pub mod status;
pub mod template;
pub mod verification;

// Re-export core types at crate root for convenience
pub use crate::core::*;
