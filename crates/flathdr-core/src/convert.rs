//! Conversion driver: feeds lines through the pipeline and manages the
//! input and output files.

use crate::context::{ConversionContext, ConvertReport};
use crate::error::{ConvertError, Result};
use crate::pattern::Patterns;
use crate::tokenize::TooManyTokens;
use flathdr_common::Diagnostic;
use flathdr_config::{ConverterConfig, TokenOverflow};
use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

impl<'c, W: Write> ConversionContext<'c, W> {
    /// Classify one input line (including its line terminator, if any) and
    /// emit whatever it turns into.
    pub fn process_line(&mut self, raw: &str) -> Result<()> {
        self.line_no += 1;
        self.report.lines += 1;
        self.indent.clear();
        self.line.set_text(raw);
        if self.mode.class.is_active() {
            self.unindent();
        }

        let limit = self.config.conversion.max_tokens;
        let result = match self.line.retokenize(limit) {
            Ok(()) => self.classify(),
            Err(TooManyTokens { limit }) => Err(ConvertError::TooManyTokens {
                line: self.line_no,
                limit,
            }),
        };

        // A rewrite inside a stage can also push the line over the limit.
        match result {
            Err(ConvertError::TooManyTokens { limit, .. })
                if self.config.conversion.token_overflow == TokenOverflow::Skip =>
            {
                self.skip_line(raw, limit)
            }
            other => other,
        }
    }

    fn classify(&mut self) -> Result<()> {
        if !self.line.is_empty() {
            if self.process_comments()?
                || self.process_special_cases()?
                || self.process_type_names()?
                || self.process_function_names()?
                || self.process_variables()?
                || self.process_enum_members()?
                || self.process_struct_members()?
            {
                return Ok(());
            }
        }

        if self.process_class_members()? {
            return Ok(());
        }
        self.emit_line()
    }

    /// Strip up to `unindent_width` leading spaces, remembering them so a
    /// lifted data member keeps its indentation.
    fn unindent(&mut self) {
        let width = self.config.conversion.unindent_width;
        let stripped = self
            .line
            .text()
            .bytes()
            .take(width)
            .take_while(|&b| b == b' ')
            .count();
        if stripped == 0 {
            return;
        }
        self.indent.push_str(&self.line.text()[..stripped]);
        let rest = self.line.text()[stripped..].to_owned();
        self.line.set_text(rest);
    }

    /// Copy `raw` to the current sink unclassified and record why.
    fn skip_line(&mut self, raw: &str, limit: usize) -> Result<()> {
        log::warn!("line {}: more than {} tokens, copied unchanged", self.line_no, limit);
        self.report.diagnostics.push(
            Diagnostic::warning(format!("more than {} tokens, line copied unchanged", limit))
                .with_line(self.line_no)
                .with_help("raise `conversion.max_tokens` to classify this line"),
        );
        self.line.set_text(raw);
        self.emit_line()
    }

    /// Flush a class left open at end of input and hand back the sink.
    pub fn finish(mut self) -> Result<(W, ConvertReport)> {
        if let Some(name) = self.mode.class.name().cloned() {
            log::warn!("class {} is not closed at end of input", name);
            self.report.diagnostics.push(
                Diagnostic::warning(format!("class {} is not closed at end of input", name))
                    .with_line(self.line_no)
                    .with_help("its deferred enums and members were written after the last line"),
            );
            self.flush_class_buffers()?;
        }

        self.out.flush()?;
        self.report.enum_values = self.enum_values.to_vec();
        Ok((self.out, self.report))
    }
}

/// Convert every line of `input` into `output`.
pub fn convert_reader<R: BufRead, W: Write>(
    input: R,
    output: W,
    config: &ConverterConfig,
) -> Result<(W, ConvertReport)> {
    let ctx = ConversionContext::new(output, config)?;
    run(input, ctx)
}

fn run<R: BufRead, W: Write>(
    mut input: R,
    mut ctx: ConversionContext<'_, W>,
) -> Result<(W, ConvertReport)> {
    let mut buf = String::new();
    loop {
        buf.clear();
        if input.read_line(&mut buf)? == 0 {
            break;
        }
        ctx.process_line(&buf)?;
    }
    ctx.finish()
}

/// Convert a header held in memory.
pub fn convert_str(input: &str, config: &ConverterConfig) -> Result<(String, ConvertReport)> {
    let (bytes, report) = convert_reader(input.as_bytes(), Vec::new(), config)?;
    let text = String::from_utf8(bytes)
        .map_err(|e| ConvertError::Io(io::Error::new(io::ErrorKind::InvalidData, e)))?;
    Ok((text, report))
}

/// Convert the header at `input` into `output`.
///
/// The output is written to a sibling `.partial` file that replaces
/// `output` only once the whole input converted, so a failed run leaves no
/// output file behind.
pub fn convert_file(input: &Path, output: &Path, config: &ConverterConfig) -> Result<ConvertReport> {
    let patterns = Patterns::compile()?;

    let file = File::open(input).map_err(|source| ConvertError::InputNotFound {
        path: input.to_path_buf(),
        source,
    })?;

    let partial = partial_path(output);
    let out = File::create(&partial).map_err(|source| ConvertError::OutputNotWritable {
        path: output.to_path_buf(),
        source,
    })?;

    let ctx = ConversionContext::with_patterns(BufWriter::new(out), config, patterns);
    let result = run(BufReader::new(file), ctx).and_then(|(writer, report)| {
        writer.into_inner().map_err(|e| e.into_error())?;
        Ok(report)
    });

    match result {
        Ok(report) => {
            fs::rename(&partial, output).map_err(|source| ConvertError::OutputNotWritable {
                path: output.to_path_buf(),
                source,
            })?;
            Ok(report)
        }
        Err(err) => {
            if let Err(cleanup) = fs::remove_file(&partial) {
                log::warn!("failed to remove {}: {}", partial.display(), cleanup);
            }
            Err(err)
        }
    }
}

fn partial_path(output: &Path) -> PathBuf {
    let mut name = output.as_os_str().to_owned();
    name.push(".partial");
    PathBuf::from(name)
}
