//! Line-oriented conversion of C++ headers into flat C headers.
//!
//! Each input line is tokenized and handed to a fixed chain of
//! classification stages. Classes become `typedef struct` blocks holding
//! their data members, with nested enums and suppressed member functions
//! written after the struct. `virtual` methods of plain structs become
//! function-pointer fields and `const` members become `#define`s.
//!
//! ```
//! use flathdr_config::ConverterConfig;
//!
//! let config = ConverterConfig::default();
//! let (out, _) = flathdr_core::convert_str("const int kMax = 10;\n", &config).unwrap();
//! assert_eq!(out, "#define kMax (10)\n");
//! ```

mod context;
mod convert;
mod error;
pub mod pattern;
mod rules;
pub mod strmanip;
pub mod tokenize;

pub use context::{
    ClassRecord, ClassState, ConversionContext, ConvertReport, FunctionRecord, FunctionState,
    LexicalMode, TypeBody,
};
pub use convert::{convert_file, convert_reader, convert_str};
pub use error::{ConvertError, Result};
pub use pattern::Patterns;
pub use rules::is_identifier;
pub use strmanip::{str_replace, substr_replace, trim, StrError};
pub use tokenize::{tokenize, LineBuf, TooManyTokens};
