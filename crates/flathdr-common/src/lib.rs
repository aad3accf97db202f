mod diagnostic;
mod strlist;

pub use diagnostic::{Diagnostic, DiagnosticLevel};
pub use strlist::StrList;
