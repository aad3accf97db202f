//! Per-run conversion state.

use crate::error::{ConvertError, Result};
use crate::pattern::Patterns;
use crate::tokenize::LineBuf;
use flathdr_common::{Diagnostic, StrList};
use flathdr_config::ConverterConfig;
use smol_str::SmolStr;
use std::io::Write;

/// An open `enum` or `struct` body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeBody {
    /// Declared name, empty for anonymous types.
    pub name: SmolStr,
    /// Opened by an already-flat `typedef enum`/`typedef struct` line, in
    /// which case the closing line is copied verbatim.
    pub flat: bool,
}

/// Where the pipeline is relative to a `class` declaration.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ClassState {
    #[default]
    None,
    /// `class NAME` seen, its `{` not yet.
    BracePending(SmolStr),
    /// Inside the class body; emitted text is deferred.
    BraceOpen(SmolStr),
}

impl ClassState {
    pub fn name(&self) -> Option<&SmolStr> {
        match self {
            ClassState::None => None,
            ClassState::BracePending(name) | ClassState::BraceOpen(name) => Some(name),
        }
    }

    pub fn is_active(&self) -> bool {
        !matches!(self, ClassState::None)
    }

    pub fn is_open(&self) -> bool {
        matches!(self, ClassState::BraceOpen(_))
    }
}

/// Where the pipeline is relative to a function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FunctionState {
    #[default]
    Outside,
    /// Between the opening `(` of a signature and its closing `)`.
    Signature,
    /// After the signature; `depth` counts unmatched `{` seen since.
    Body { depth: i32 },
}

impl FunctionState {
    /// Single-integer encoding used in annotated output:
    /// 0 outside, -1 in a signature, 1 + depth in a body.
    pub fn level(self) -> i32 {
        match self {
            FunctionState::Outside => 0,
            FunctionState::Signature => -1,
            FunctionState::Body { depth } => 1 + depth,
        }
    }
}

/// Nesting flags; the dimensions are independent of each other.
#[derive(Debug, Clone, Default)]
pub struct LexicalMode {
    pub in_comment_block: bool,
    pub in_extern_c: bool,
    pub enum_body: Option<TypeBody>,
    pub struct_body: Option<TypeBody>,
    pub class: ClassState,
    pub function: FunctionState,
}

/// Function name and parameter candidates of the signature being scanned.
#[derive(Debug, Default)]
pub(crate) struct FunctionScan {
    pub name: SmolStr,
    pub params: StrList,
    /// Last token seen by the scanner; carries over between lines.
    pub prev_token: String,
}

/// A function whose signature was scanned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionRecord {
    pub name: SmolStr,
    pub params: Vec<SmolStr>,
}

/// A closed class and the data members lifted into its struct.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassRecord {
    pub name: SmolStr,
    pub members: Vec<SmolStr>,
}

/// Summary of a finished run.
#[derive(Debug, Clone, Default)]
pub struct ConvertReport {
    pub lines: usize,
    /// Enum value names in first-seen order, class enums already prefixed.
    pub enum_values: Vec<SmolStr>,
    pub functions: Vec<FunctionRecord>,
    pub classes: Vec<ClassRecord>,
    pub diagnostics: Vec<Diagnostic>,
}

/// State threaded through every line of one conversion run.
pub struct ConversionContext<'c, W: Write> {
    pub(crate) config: &'c ConverterConfig,
    pub(crate) patterns: Patterns,
    pub(crate) out: W,
    pub(crate) line_no: usize,
    pub(crate) line: LineBuf,
    /// Leading spaces stripped from the current line inside a class.
    pub(crate) indent: String,
    pub(crate) mode: LexicalMode,
    pub(crate) class_enums: Vec<String>,
    pub(crate) class_members: Vec<String>,
    pub(crate) class_member_names: StrList,
    pub(crate) scan: FunctionScan,
    pub(crate) enum_values: StrList,
    pub(crate) report: ConvertReport,
}

impl<'c, W: Write> ConversionContext<'c, W> {
    pub fn new(out: W, config: &'c ConverterConfig) -> Result<Self> {
        Ok(Self::with_patterns(out, config, Patterns::compile()?))
    }

    pub fn with_patterns(out: W, config: &'c ConverterConfig, patterns: Patterns) -> Self {
        Self {
            config,
            patterns,
            out,
            line_no: 0,
            line: LineBuf::new(),
            indent: String::new(),
            mode: LexicalMode::default(),
            class_enums: Vec::new(),
            class_members: Vec::new(),
            class_member_names: StrList::new(),
            scan: FunctionScan::default(),
            enum_values: StrList::new(),
            report: ConvertReport::default(),
        }
    }

    pub fn mode(&self) -> &LexicalMode {
        &self.mode
    }

    pub fn line_number(&self) -> usize {
        self.line_no
    }

    pub fn enum_values(&self) -> &StrList {
        &self.enum_values
    }

    /// Enum text of the open class, not yet written.
    pub fn pending_enum_text(&self) -> &[String] {
        &self.class_enums
    }

    /// Member text of the open class, not yet written.
    pub fn pending_member_text(&self) -> &[String] {
        &self.class_members
    }

    /// Write `text` to the current sink: the class buffers while a class
    /// body is open, the output otherwise.
    pub(crate) fn emit(&mut self, text: &str) -> Result<()> {
        if !self.mode.class.is_open() {
            return self.emit_direct(text);
        }
        let buffer = if self.mode.enum_body.is_some() {
            &mut self.class_enums
        } else {
            &mut self.class_members
        };
        buffer.push(text.to_owned());
        Ok(())
    }

    pub(crate) fn emit_direct(&mut self, text: &str) -> Result<()> {
        self.out.write_all(text.as_bytes())?;
        Ok(())
    }

    pub(crate) fn emit_line(&mut self) -> Result<()> {
        let text = self.line.text().to_owned();
        self.emit(&text)
    }

    pub(crate) fn emit_line_direct(&mut self) -> Result<()> {
        let text = self.line.text().to_owned();
        self.emit_direct(&text)
    }

    /// Replace the current line text and tokenize it again.
    pub(crate) fn replace_line(&mut self, text: String) -> Result<()> {
        self.line.set_text(text);
        self.retokenize()
    }

    pub(crate) fn retokenize(&mut self) -> Result<()> {
        let limit = self.config.conversion.max_tokens;
        self.line
            .retokenize(limit)
            .map_err(|err| ConvertError::TooManyTokens {
                line: self.line_no,
                limit: err.limit,
            })
    }

    /// Move the trailing blank and comment-only member lines to the enum
    /// buffer, so a comment stays in front of the enum it documents.
    pub(crate) fn take_enum_comments(&mut self) {
        let keep = self
            .class_members
            .iter()
            .rposition(|chunk| !self.patterns.is_blank_or_comment(chunk))
            .map_or(0, |i| i + 1);
        let comments = self.class_members.split_off(keep);
        self.class_enums.extend(comments);
    }

    /// Emit the struct closer for the open class, then its deferred enums
    /// and members, leaving both buffers empty.
    pub(crate) fn close_class(&mut self) -> Result<()> {
        let name = std::mem::take(&mut self.mode.class)
            .name()
            .cloned()
            .unwrap_or_default();
        self.emit_direct(&format!("}} {};\n", name))?;
        self.flush_class_buffers()?;

        log::trace!("close class {} ({})", name, self.class_member_names.join(","));
        self.report.classes.push(ClassRecord {
            name,
            members: self.class_member_names.to_vec(),
        });
        self.class_member_names.clear();
        Ok(())
    }

    pub(crate) fn flush_class_buffers(&mut self) -> Result<()> {
        for chunk in self.class_enums.drain(..).chain(self.class_members.drain(..)) {
            self.out.write_all(chunk.as_bytes())?;
        }
        Ok(())
    }
}
