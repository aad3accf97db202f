//! Regex substitution with `$N` backreference templates, and the fixed set
//! of patterns the line pipeline classifies lines with.

use crate::error::{ConvertError, Result};
use regex::{Captures, Regex};

/// `virtual RET [CALLCONV ]NAME(PARAMS)[ = 0];`
const VIRTUAL_METHOD: &str = r"virtual (\w+) (\w+ )?(\w+)\(([^)]*)\)( = 0)?;";
/// `const TYPE NAME = VALUE;`
const CONST_MEMBER: &str = r"const \w+ (\w+) = ([^;]+);";
/// `TYPE NAME;` (the `return` exclusion is applied in code).
const DECLARATION: &str = r"([\w*]+) (\w+);";
/// A blank line or one holding only a `//` comment.
const BLANK_OR_COMMENT: &str = r"^\s*(//|$)";

/// Expand `template` against one match, appending to `out`.
///
/// `$$` yields a literal `$`. `$N` yields group N when `N <= groups`
/// (an unmatched optional group yields nothing); any other `$` is copied
/// literally, so `$7` stays `$7` for a pattern with fewer groups.
pub fn expand_template(template: &str, caps: &Captures<'_>, groups: usize, out: &mut String) {
    let bytes = template.as_bytes();
    let mut literal_start = 0;
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'$' && i + 1 < bytes.len() {
            let next = bytes[i + 1];
            if next == b'$' {
                out.push_str(&template[literal_start..i]);
                out.push('$');
                i += 2;
                literal_start = i;
                continue;
            }
            if next.is_ascii_digit() {
                let group = usize::from(next - b'0');
                if group <= groups {
                    out.push_str(&template[literal_start..i]);
                    out.push_str(caps.get(group).map_or("", |m| m.as_str()));
                    i += 2;
                    literal_start = i;
                    continue;
                }
            }
        }
        i += 1;
    }

    out.push_str(&template[literal_start..]);
}

/// Replace every non-overlapping match of `pattern` in `subject`.
///
/// Returns `None` when nothing matched, so "unchanged" can be told apart
/// from "rewritten to the same text". Empty matches are allowed; the search
/// always moves forward past them.
pub fn replace_all(pattern: &Regex, template: &str, subject: &str) -> Option<String> {
    let groups = pattern.captures_len() - 1;
    let mut out = String::with_capacity(subject.len());
    let mut last = 0;
    let mut matched = false;

    for caps in pattern.captures_iter(subject) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        out.push_str(&subject[last..whole.start()]);
        expand_template(template, &caps, groups, &mut out);
        last = whole.end();
        matched = true;
    }

    if !matched {
        return None;
    }
    out.push_str(&subject[last..]);
    Some(out)
}

/// The compiled patterns for one conversion run.
#[derive(Debug, Clone)]
pub struct Patterns {
    pub virtual_method: Regex,
    pub const_member: Regex,
    pub declaration: Regex,
    pub blank_or_comment: Regex,
}

impl Patterns {
    pub fn compile() -> Result<Self> {
        Ok(Self {
            virtual_method: compile("virtual method", VIRTUAL_METHOD)?,
            const_member: compile("const member", CONST_MEMBER)?,
            declaration: compile("declaration", DECLARATION)?,
            blank_or_comment: compile("blank or comment", BLANK_OR_COMMENT)?,
        })
    }

    /// Name declared by the first `TYPE NAME;` in `line` whose type token
    /// does not end in `return`.
    pub fn declared_name<'l>(&self, line: &'l str) -> Option<&'l str> {
        self.declaration
            .captures_iter(line)
            .filter(|caps| !caps[1].ends_with("return"))
            .find_map(|caps| caps.get(2).map(|m| m.as_str()))
    }

    pub fn is_declaration(&self, line: &str) -> bool {
        self.declared_name(line).is_some()
    }

    pub fn is_blank_or_comment(&self, line: &str) -> bool {
        self.blank_or_comment.is_match(line)
    }
}

fn compile(name: &'static str, pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|source| ConvertError::PatternCompile { name, source })
}
