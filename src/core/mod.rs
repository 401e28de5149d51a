//! Core domain types, numbering, and the crate-wide error type.
//!
//! These are plain single-run values: nothing here is cached or persisted.

mod builder;
mod error;
mod nip;
mod numbering;
mod types;

pub use builder::*;
pub use error::*;
pub use nip::is_valid_nip;
pub use numbering::*;
pub use types::*;
