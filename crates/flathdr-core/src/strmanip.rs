//! Substring replacement and trimming helpers.
//!
//! The optional `capacity` arguments model a fixed-size destination: when
//! the result would be longer than `capacity` bytes the operation fails
//! instead of truncating. Pass `None` for an unbounded result.

use std::borrow::Cow;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StrError {
    #[error("Result needs {needed} bytes but the buffer holds {capacity}")]
    CapacityExceeded { needed: usize, capacity: usize },

    #[error("Range {start}+{length} is outside a string of {len} bytes")]
    OutOfRange {
        start: usize,
        length: usize,
        len: usize,
    },
}

fn check_capacity(needed: usize, capacity: Option<usize>) -> Result<(), StrError> {
    match capacity {
        Some(capacity) if needed > capacity => Err(StrError::CapacityExceeded { needed, capacity }),
        _ => Ok(()),
    }
}

/// Replace every non-overlapping occurrence of `search` in `subject`.
///
/// Returns the subject borrowed when there is nothing to replace (empty
/// `search` or no occurrence), regardless of `capacity`.
pub fn str_replace<'a>(
    subject: &'a str,
    search: &str,
    replace: &str,
    capacity: Option<usize>,
) -> Result<Cow<'a, str>, StrError> {
    if search.is_empty() {
        return Ok(Cow::Borrowed(subject));
    }

    let count = subject.matches(search).count();
    if count == 0 {
        return Ok(Cow::Borrowed(subject));
    }

    let needed = subject.len() - count * search.len() + count * replace.len();
    check_capacity(needed, capacity)?;

    Ok(Cow::Owned(subject.replace(search, replace)))
}

/// Splice `replacement` in place of `string[start..start + length]`.
pub fn substr_replace(
    string: &str,
    replacement: &str,
    start: usize,
    length: usize,
    capacity: Option<usize>,
) -> Result<String, StrError> {
    let end = start.checked_add(length);
    let in_range = matches!(end, Some(end) if end <= string.len()
        && string.is_char_boundary(start)
        && string.is_char_boundary(end));
    if !in_range {
        return Err(StrError::OutOfRange {
            start,
            length,
            len: string.len(),
        });
    }

    let needed = string.len() - length + replacement.len();
    check_capacity(needed, capacity)?;

    let mut out = String::with_capacity(needed);
    out.push_str(&string[..start]);
    out.push_str(replacement);
    out.push_str(&string[start + length..]);
    Ok(out)
}

/// Strip leading and trailing spaces, tabs, carriage returns and newlines.
pub fn trim(s: &str) -> &str {
    s.trim_matches(|c| matches!(c, ' ' | '\t' | '\r' | '\n'))
}
