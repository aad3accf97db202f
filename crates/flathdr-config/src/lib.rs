//! Configuration for the flathdr header converter.
//!
//! Every field has a default reproducing the historical converter, so an
//! empty file (or no file at all) is a valid configuration.
//!
//! # Example
//!
//! ```toml
//! # flathdr.toml
//! [layout]
//! input_dir = "input_files"
//! output_dir = "output_files"
//!
//! [conversion]
//! unindent_width = 4
//! suppressed_declarations = "drop"
//!
//! [[rewrite]]
//! macro = "GDIP_WMF_RECORD_TO_EMFPLUS"
//! search = "(EmfPlusRecordType)"
//! replace = "(enum _EmfPlusRecordType)"
//! ```

mod config;
mod error;

pub use config::{
    ConversionConfig, ConverterConfig, LayoutConfig, MacroRewrite, SuppressMode, TokenOverflow,
    MAX_UNINDENT_WIDTH,
};
pub use error::{ConfigError, Result};
