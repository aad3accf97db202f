//! The line-classification stages.
//!
//! Each `process_*` stage returns `Ok(true)` when it claimed the line, in
//! which case no later stage sees it. Some stages rewrite the line and
//! return `Ok(false)` so later stages classify the rewritten text.

use crate::context::{ClassState, ConversionContext, FunctionRecord, FunctionState, TypeBody};
use crate::error::Result;
use crate::pattern::replace_all;
use crate::strmanip::{str_replace, substr_replace};
use crate::tokenize::LineBuf;
use flathdr_common::Diagnostic;
use flathdr_config::SuppressMode;
use smol_str::SmolStr;
use std::borrow::Cow;
use std::io::Write;

const CONST_MEMBER_TEMPLATE: &str = "#define $1 ($2)";

/// Letters, digits, `_` and `~` (destructor names).
pub fn is_identifier(s: &str) -> bool {
    !s.is_empty()
        && s
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '~')
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BracePlacement {
    /// `{` follows the name on the same line.
    SameLine,
    /// The body opens on a later line.
    Deferred,
    /// `;` follows the name: no body at all.
    Forward,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct TypeDecl {
    name: SmolStr,
    brace: BracePlacement,
}

/// Parse `KEYWORD [__declspec ( X )] [NAME] [{ | ;]` at the start of a line.
fn type_declaration(line: &LineBuf, keyword: &str) -> Option<TypeDecl> {
    if line.token(0) != Some(keyword) {
        return None;
    }

    let mut next = 1;
    if line.token(1) == Some("__declspec")
        && line.token(2) == Some("(")
        && line.token(3).is_some()
        && line.token(4) == Some(")")
    {
        next = 5;
    }

    let name = match line.token(next) {
        Some(tok) if tok != "{" => {
            next += 1;
            SmolStr::new(tok)
        }
        _ => SmolStr::default(),
    };

    let brace = match line.token(next) {
        Some("{") => BracePlacement::SameLine,
        Some(";") => BracePlacement::Forward,
        _ => BracePlacement::Deferred,
    };

    Some(TypeDecl { name, brace })
}

/// `}` `;` or `}` NAME `;`.
fn is_type_closer(line: &LineBuf) -> bool {
    line.token(0) == Some("}")
        && (line.token(1) == Some(";")
            || (line.token(1).is_some_and(is_identifier) && line.token(2) == Some(";")))
}

fn closer_text(name: &str) -> String {
    if name.is_empty() {
        "};\n".to_string()
    } else {
        format!("}} {};\n", name)
    }
}

impl<'c, W: Write> ConversionContext<'c, W> {
    /// `//` lines and `/* ... */` blocks are copied as they are.
    pub(crate) fn process_comments(&mut self) -> Result<bool> {
        let first = self.line.token(0).unwrap_or_default();
        if first.starts_with("//") {
            self.emit_line()?;
            return Ok(true);
        }

        if first.starts_with("/*") {
            self.mode.in_comment_block = true;
        }
        if self.mode.in_comment_block {
            if self.line.last_token().is_some_and(|tok| tok.ends_with("*/")) {
                self.mode.in_comment_block = false;
            }
            self.emit_line()?;
            return Ok(true);
        }

        Ok(false)
    }

    /// Literal rewrites registered for specific `#define` names.
    pub(crate) fn process_special_cases(&mut self) -> Result<bool> {
        if self.line.token(0) != Some("#define") {
            return Ok(false);
        }
        let config = self.config;
        let Some(rewrite) = self.line.token(1).and_then(|name| config.find_rewrite(name)) else {
            return Ok(false);
        };

        let rewritten = str_replace(self.line.text(), &rewrite.search, &rewrite.replace, None)?;
        if let Cow::Owned(text) = rewritten {
            log::debug!("rewrite macro {}", rewrite.macro_name);
            self.replace_line(text)?;
            self.report.diagnostics.push(
                Diagnostic::info(format!("rewrote macro {}", rewrite.macro_name))
                    .with_line(self.line_no),
            );
        }
        Ok(false)
    }

    /// `extern "C"` blocks, `enum`/`struct`/`class` openers and their closers.
    pub(crate) fn process_type_names(&mut self) -> Result<bool> {
        if self.line.starts_with(&["extern", "\"C\"", "{"]) {
            self.mode.in_extern_c = true;
            return Ok(true);
        }

        if let Some(decl) = type_declaration(&self.line, "enum") {
            if decl.brace == BracePlacement::Forward {
                self.emit_line()?;
                return Ok(true);
            }
            if decl.brace == BracePlacement::SameLine {
                if let Some(text) = self.single_line_enum(&decl.name) {
                    if self.mode.class.is_open() {
                        self.take_enum_comments();
                    }
                    self.mode.enum_body = Some(TypeBody {
                        name: decl.name,
                        flat: true,
                    });
                    self.emit(&text)?;
                    self.mode.enum_body = None;
                    return Ok(true);
                }
            }
            self.mode.enum_body = Some(TypeBody {
                name: decl.name.clone(),
                flat: false,
            });
            if self.mode.class.is_open() {
                self.take_enum_comments();
            }

            if decl.name.is_empty() {
                self.emit("enum\n")?;
            } else {
                self.emit(&format!("typedef enum _{}\n", decl.name))?;
            }
            if decl.brace == BracePlacement::SameLine {
                self.emit("{\n")?;
            }
            return Ok(true);
        }

        if let Some(decl) = type_declaration(&self.line, "struct") {
            if decl.brace == BracePlacement::Forward {
                self.emit_line()?;
                return Ok(true);
            }
            if decl.name.is_empty() {
                self.emit("struct\n")?;
            } else {
                self.emit(&format!("typedef struct _{}\n", decl.name))?;
            }
            if decl.brace == BracePlacement::SameLine {
                self.emit("{\n")?;
            }
            self.mode.struct_body = Some(TypeBody {
                name: decl.name,
                flat: false,
            });
            return Ok(true);
        }

        if let Some(decl) = type_declaration(&self.line, "class") {
            match decl.brace {
                BracePlacement::Forward => {
                    self.emit(&format!("struct _{};\n", decl.name))?;
                }
                BracePlacement::SameLine => {
                    self.emit(&format!("typedef struct _{}\n{{\n", decl.name))?;
                    self.open_class(ClassState::BraceOpen(decl.name));
                }
                BracePlacement::Deferred => {
                    self.emit(&format!("typedef struct _{}\n", decl.name))?;
                    self.open_class(ClassState::BracePending(decl.name));
                }
            }
            return Ok(true);
        }

        if self.open_flat_type()? {
            return Ok(true);
        }

        if is_type_closer(&self.line) {
            return self.close_type();
        }

        if self.line.len() == 1 && self.line.token(0) == Some("}") && self.mode.in_extern_c {
            self.mode.in_extern_c = false;
            return Ok(true);
        }

        Ok(false)
    }

    /// `enum [NAME] { A, B = 2 } [ALIAS];` on a single line. Records the
    /// values (class-prefixed inside a class) and returns the whole
    /// declaration rewritten, or `None` when the body spans several lines.
    fn single_line_enum(&mut self, name: &str) -> Option<String> {
        let len = self.line.len();
        let open = self.line.tokens().position(|tok| tok == "{")?;
        let close = self.line.tokens().position(|tok| tok == "}")?;
        if close < open || self.line.last_token() != Some(";") || close + 3 < len {
            return None;
        }
        if close + 3 == len && !self.line.token(close + 1).is_some_and(is_identifier) {
            return None;
        }

        let class = self.mode.class.name().cloned();
        let text = self.line.text();
        let mut last = self.line.span(open)?.end;
        let mut body = String::new();
        for i in open + 1..close {
            let after_separator = matches!(self.line.token(i - 1), Some("{" | ","));
            let Some(value) = self.line.token(i).filter(|tok| after_separator && is_identifier(tok))
            else {
                continue;
            };
            let span = self.line.span(i)?;
            let value = match &class {
                Some(class) => format!("{}_{}", class, value),
                None => value.to_string(),
            };
            body.push_str(&text[last..span.start]);
            body.push_str(&value);
            last = span.end;
            if self.enum_values.insert(&value) {
                log::trace!("add enum value {}", value);
            }
        }
        body.push_str(&text[last..self.line.span(close)?.start]);

        Some(if name.is_empty() {
            format!("enum {{{}}};\n", body)
        } else {
            format!("typedef enum _{} {{{}}} {};\n", name, body, name)
        })
    }

    fn open_class(&mut self, state: ClassState) {
        log::debug!("enter class {}", state.name().map_or("", |n| n.as_str()));
        self.mode.class = state;
        self.class_member_names.clear();
    }

    /// `typedef struct NAME` / `typedef enum NAME` without a `;` on the
    /// line: the type is already in flat form and is copied through.
    fn open_flat_type(&mut self) -> Result<bool> {
        if self.line.token(0) != Some("typedef") || self.line.tokens().any(|tok| tok == ";") {
            return Ok(false);
        }
        let name = match self.line.token(2) {
            Some(tok) if tok != "{" => SmolStr::new(tok),
            _ => SmolStr::default(),
        };
        let body = Some(TypeBody { name, flat: true });

        match self.line.token(1) {
            Some("enum") => {
                self.mode.enum_body = body;
                if self.mode.class.is_open() {
                    self.take_enum_comments();
                }
            }
            Some("struct") => self.mode.struct_body = body,
            _ => return Ok(false),
        }

        self.emit_line()?;
        Ok(true)
    }

    /// Close the innermost of enum, struct, class.
    fn close_type(&mut self) -> Result<bool> {
        if let Some(body) = self.mode.enum_body.clone() {
            if body.flat {
                self.emit_line()?;
            } else {
                self.emit(&closer_text(&body.name))?;
            }
            self.mode.enum_body = None;
            return Ok(true);
        }

        if let Some(body) = self.mode.struct_body.take() {
            if body.flat {
                self.emit_line()?;
            } else {
                self.emit(&closer_text(&body.name))?;
            }
            return Ok(true);
        }

        if self.mode.class.is_active() {
            self.close_class()?;
            return Ok(true);
        }

        Ok(false)
    }

    /// Track function signatures and bodies; suppress everything belonging
    /// to a member function, and prototypes that are not plain declarations.
    pub(crate) fn process_function_names(&mut self) -> Result<bool> {
        if self.mode.enum_body.is_some() || self.mode.struct_body.is_some() {
            return Ok(false);
        }

        let mut suppress = self.mode.function != FunctionState::Outside;

        if let FunctionState::Body { depth } = self.mode.function {
            let mut delta = 0;
            let mut has_braces = false;
            for tok in self.line.tokens() {
                match tok {
                    "{" => delta += 1,
                    "}" => delta -= 1,
                    _ => continue,
                }
                has_braces = true;
            }

            if has_braces {
                let depth = depth + delta;
                if depth <= 0 {
                    log::debug!("exit function {}", self.scan.name);
                    self.mode.function = FunctionState::Outside;
                } else {
                    self.mode.function = FunctionState::Body { depth };
                }
            }
        } else {
            suppress |= self.scan_signature();
        }

        if suppress {
            self.emit_suppressed()?;
        }
        Ok(suppress)
    }

    /// Scan the tokens of a line outside any function body. Returns whether
    /// the line has to be suppressed.
    fn scan_signature(&mut self) -> bool {
        let line = &self.line;
        let scan = &mut self.scan;
        let mode = &mut self.mode;
        let starts_inline = line.token(0) == Some("inline");
        let mut suppress = false;

        for (i, tok) in line.tokens().enumerate() {
            if tok == "#define" || tok == "typedef" {
                break;
            }

            let outside = mode.function == FunctionState::Outside;
            if outside && starts_inline {
                suppress = true;
            } else if outside && tok == "(" {
                let prev = scan.prev_token.as_str();
                let callable = is_identifier(prev)
                    || prev.starts_with("operator")
                    || (i >= 2 && line.token(i - 2) == Some("operator"));
                if callable {
                    mode.function = FunctionState::Signature;
                    suppress = true;
                    scan.name = SmolStr::new(prev);
                    scan.params.clear();
                }
            } else if mode.function == FunctionState::Signature && tok == "," {
                if is_identifier(&scan.prev_token) {
                    scan.params.insert(&scan.prev_token);
                }
            } else if mode.function == FunctionState::Signature && tok == ")" {
                if is_identifier(&scan.prev_token) {
                    scan.params.insert(&scan.prev_token);
                }
                log::debug!("enter function {}({})", scan.name, scan.params.join(","));
                self.report.functions.push(FunctionRecord {
                    name: scan.name.clone(),
                    params: scan.params.to_vec(),
                });
                mode.function = FunctionState::Body { depth: 0 };
            } else if mode.function == (FunctionState::Body { depth: 0 }) && tok == ";" {
                log::debug!("skip function declaration {}", scan.name);
                mode.function = FunctionState::Outside;
                if !self.patterns.is_declaration(line.text()) {
                    suppress = true;
                }
            }

            scan.prev_token.clear();
            scan.prev_token.push_str(tok);
        }

        suppress
    }

    fn emit_suppressed(&mut self) -> Result<()> {
        let text = match self.config.conversion.suppressed_declarations {
            SuppressMode::Annotate => {
                format!("//({}) {}", self.mode.function.level(), self.line.text())
            }
            SuppressMode::Comment => format!("// {}", self.line.text()),
            SuppressMode::Drop => return Ok(()),
        };
        self.emit(&text)
    }

    /// `const TYPE NAME = VALUE;` becomes `#define NAME (VALUE)`.
    pub(crate) fn process_variables(&mut self) -> Result<bool> {
        match replace_all(&self.patterns.const_member, CONST_MEMBER_TEMPLATE, self.line.text()) {
            Some(text) => {
                self.emit(&text)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Record enum values; inside a class, prefix them with the class name.
    /// Never claims the line.
    pub(crate) fn process_enum_members(&mut self) -> Result<bool> {
        if self.mode.enum_body.is_none() {
            return Ok(false);
        }
        let Some(first) = self.line.token(0).filter(|tok| is_identifier(tok)) else {
            return Ok(false);
        };

        if let Some(class) = self.mode.class.name() {
            let hoisted = format!("{}_{}", class, first);
            if let Some(span) = self.line.span(0) {
                let text = substr_replace(self.line.text(), &hoisted, span.start, span.len(), None)?;
                self.replace_line(text)?;
            }
        }

        if let Some(value) = self.line.token(0) {
            if self.enum_values.insert(value) {
                log::trace!("add enum value {}", value);
            }
        }
        Ok(false)
    }

    /// Inside a struct, `virtual` methods become function-pointer fields.
    pub(crate) fn process_struct_members(&mut self) -> Result<bool> {
        if self.mode.struct_body.is_none() {
            return Ok(false);
        }
        let template = &self.config.conversion.virtual_method_template;
        match replace_all(&self.patterns.virtual_method, template, self.line.text()) {
            Some(text) => {
                self.emit(&text)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// The class `{`, access specifiers, and data members, which go straight
    /// into the struct body with their indentation restored.
    pub(crate) fn process_class_members(&mut self) -> Result<bool> {
        if !self.mode.class.is_active() || self.line.is_empty() {
            return Ok(false);
        }

        if self.line.len() == 1 {
            match self.line.token(0) {
                Some("{") => {
                    if let ClassState::BracePending(name) = &self.mode.class {
                        self.mode.class = ClassState::BraceOpen(name.clone());
                        self.emit_line_direct()?;
                        return Ok(true);
                    }
                }
                Some("public:" | "private:" | "protected:") => return Ok(true),
                _ => {}
            }
        }

        let Some(member) = self.patterns.declared_name(self.line.text()) else {
            return Ok(false);
        };
        if self.class_member_names.insert(member) {
            log::trace!("add class member {}", member);
        }
        let text = format!("{}{}", self.indent, self.line.text());
        self.emit_direct(&text)?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(text: &str) -> LineBuf {
        let mut line = LineBuf::new();
        line.set_text(text);
        line.retokenize(64).unwrap();
        line
    }

    #[test]
    fn test_is_identifier() {
        assert!(is_identifier("GetValue"));
        assert!(is_identifier("~Color"));
        assert!(is_identifier("_x1"));
        assert!(!is_identifier(""));
        assert!(!is_identifier("operator+"));
        assert!(!is_identifier("SizeF&"));
    }

    #[test]
    fn test_type_declaration_shapes() {
        let decl = type_declaration(&line("class Color"), "class").unwrap();
        assert_eq!(decl.name.as_str(), "Color");
        assert_eq!(decl.brace, BracePlacement::Deferred);

        let decl = type_declaration(&line("class Color;"), "class").unwrap();
        assert_eq!(decl.brace, BracePlacement::Forward);

        let decl = type_declaration(&line("enum {"), "enum").unwrap();
        assert_eq!(decl.name.as_str(), "");
        assert_eq!(decl.brace, BracePlacement::SameLine);

        let decl =
            type_declaration(&line("class __declspec(novtable) GdiplusAbort {"), "class").unwrap();
        assert_eq!(decl.name.as_str(), "GdiplusAbort");
        assert_eq!(decl.brace, BracePlacement::SameLine);

        assert!(type_declaration(&line("typedef enum _X"), "enum").is_none());
    }

    #[test]
    fn test_type_closer() {
        assert!(is_type_closer(&line("};")));
        assert!(is_type_closer(&line("} Color;")));
        assert!(!is_type_closer(&line("}")));
        assert!(!is_type_closer(&line("} else {")));
    }
}
