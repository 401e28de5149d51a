//! FA(3) invoice template filling.
//!
//! A template is a complete, schema-valid invoice document whose variable
//! elements are overwritten before each submission. Elements are located by
//! unqualified local name (namespace prefixes are ignored); party fields are
//! looked up inside their `Podmiot1` / `Podmiot2` subtree.
//!
//! Every field in [`InvoiceField::ALL`] is checked when the template is
//! loaded, so a template lacking one is rejected up front instead of halfway
//! through a submission.
//!
//! # Example
//!
//! ```no_run
//! use ksef_minimal::template::*;
//!
//! let mut template = InvoiceTemplate::from_path("templates/TestFaktura.xml")?;
//! template.set(InvoiceField::InvoiceNumber, "FV 2025/10/17/1")?;
//! let xml = template.to_xml()?;
//! # Ok::<(), TemplateError>(())
//! ```

mod document;
mod fields;

use std::path::PathBuf;

use thiserror::Error;

pub use document::InvoiceTemplate;
pub use fields::{InvoiceField, InvoiceFields, Party, PartyField, format_amount};

/// Errors raised while loading or filling a template.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TemplateError {
    /// The template file does not exist.
    #[error("template file not found: {0}")]
    MissingFile(PathBuf),

    #[error("cannot read template {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The template is not well-formed XML.
    #[error("malformed template XML: {0}")]
    Xml(String),

    /// A required element is missing from the template.
    #[error("element '{field}' not found in template")]
    FieldNotFound { field: String },
}
