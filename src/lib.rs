//! # table-ir
//!
//! Bidirectional conversion between HTML `<table>` markup and OTSL
//! (Optimized Table Structure Language), through a shared intermediate
//! representation.
//!
//! ## Quick Start
//!
//! ```rust
//! use table_ir::{Converter, ConversionOptions};
//!
//! let converter = Converter::new(ConversionOptions::default());
//! let html = "<table><tr><td>A</td><td>B</td></tr></table>";
//! let otsl = converter.html_to_otsl(html).unwrap();
//! assert!(otsl.starts_with("<otsl>"));
//! ```

#![warn(missing_docs, missing_debug_implementations, rust_2024_compatibility)]
#![deny(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod convert;
pub mod error;
pub mod html;
pub mod latex;
pub mod otsl;
pub mod recovery;
pub mod types;

pub use convert::{ConversionReport, Converter};
pub use error::{Result, TableIrError};
pub use types::*;

/// Current version of the table-ir library.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
