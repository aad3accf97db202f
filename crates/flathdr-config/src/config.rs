//! Converter configuration types (flathdr.toml format).

use crate::error::{ConfigError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Upper bound for `unindent_width`.
pub const MAX_UNINDENT_WIDTH: usize = 16;

/// Root converter configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConverterConfig {
    /// Where input headers are found and converted headers are written.
    pub layout: LayoutConfig,

    /// Line-pipeline settings.
    pub conversion: ConversionConfig,

    /// Literal rewrites applied to specific `#define` lines.
    #[serde(rename = "rewrite")]
    pub rewrites: Vec<MacroRewrite>,
}

/// Folder layout, relative to the directory holding the executable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Folder holding the headers to convert.
    pub input_dir: PathBuf,

    /// Folder receiving converted headers (created on demand).
    pub output_dir: PathBuf,
}

/// Settings for the line-classification pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversionConfig {
    /// Leading spaces stripped from each line inside a class body.
    pub unindent_width: usize,

    /// Maximum number of tokens a single line may produce.
    pub max_tokens: usize,

    /// What happens to member-function lines removed from the output.
    pub suppressed_declarations: SuppressMode,

    /// What happens to a line producing more than `max_tokens` tokens.
    pub token_overflow: TokenOverflow,

    /// Replacement template for `virtual` methods inside struct bodies.
    ///
    /// Groups: `$1` return type, `$2` calling convention (with trailing
    /// space, possibly empty), `$3` method name, `$4` parameter list.
    pub virtual_method_template: String,
}

/// Rendering of a suppressed declaration line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuppressMode {
    /// `//(LEVEL) line`, LEVEL being the function nesting level.
    Annotate,
    /// `// line`.
    Comment,
    /// Nothing is written.
    Drop,
}

/// Policy for lines exceeding the tokenizer bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenOverflow {
    /// Fail the whole run.
    Abort,
    /// Copy the line unchanged and record a warning.
    Skip,
}

/// A literal substitution applied to `#define MACRO ...` lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MacroRewrite {
    /// Exact macro name, compared against the token after `#define`.
    #[serde(rename = "macro")]
    pub macro_name: String,

    /// Text to look for in the line.
    pub search: String,

    /// Replacement text.
    pub replace: String,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            layout: LayoutConfig::default(),
            conversion: ConversionConfig::default(),
            rewrites: vec![MacroRewrite::new(
                "GDIP_WMF_RECORD_TO_EMFPLUS",
                "(EmfPlusRecordType)",
                "(enum _EmfPlusRecordType)",
            )],
        }
    }
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("input_files"),
            output_dir: PathBuf::from("output_files"),
        }
    }
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            unindent_width: 4,
            max_tokens: 1023,
            suppressed_declarations: SuppressMode::Annotate,
            token_overflow: TokenOverflow::Abort,
            virtual_method_template: "$1 (*$3)($4);".to_string(),
        }
    }
}

impl MacroRewrite {
    pub fn new(macro_name: &str, search: &str, replace: &str) -> Self {
        Self {
            macro_name: macro_name.to_string(),
            search: search.to_string(),
            replace: replace.to_string(),
        }
    }
}

impl ConverterConfig {
    /// Load and validate configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse and validate configuration from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: ConverterConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize back to TOML.
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<()> {
        let conv = &self.conversion;
        if conv.unindent_width > MAX_UNINDENT_WIDTH {
            return Err(ConfigError::Validation(format!(
                "unindent_width must be at most {}, got {}",
                MAX_UNINDENT_WIDTH, conv.unindent_width
            )));
        }
        if conv.max_tokens == 0 {
            return Err(ConfigError::Validation(
                "max_tokens must be at least 1".to_string(),
            ));
        }
        if conv.virtual_method_template.is_empty() {
            return Err(ConfigError::Validation(
                "virtual_method_template must not be empty".to_string(),
            ));
        }
        for rewrite in &self.rewrites {
            if rewrite.macro_name.is_empty() || rewrite.search.is_empty() {
                return Err(ConfigError::Validation(format!(
                    "rewrite entries need a macro name and a search string: {:?}",
                    rewrite
                )));
            }
        }
        Ok(())
    }

    /// Find the rewrite registered for a macro name.
    pub fn find_rewrite(&self, macro_name: &str) -> Option<&MacroRewrite> {
        self.rewrites.iter().find(|r| r.macro_name == macro_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config() {
        let toml = r#"
[layout]
input_dir = "headers"

[conversion]
unindent_width = 2
suppressed_declarations = "drop"
token_overflow = "skip"

[[rewrite]]
macro = "MY_MACRO"
search = "(Foo)"
replace = "(enum _Foo)"
        "#;

        let config = ConverterConfig::from_toml(toml).unwrap();

        assert_eq!(config.layout.input_dir, PathBuf::from("headers"));
        assert_eq!(config.layout.output_dir, PathBuf::from("output_files"));
        assert_eq!(config.conversion.unindent_width, 2);
        assert_eq!(config.conversion.max_tokens, 1023);
        assert_eq!(config.conversion.suppressed_declarations, SuppressMode::Drop);
        assert_eq!(config.conversion.token_overflow, TokenOverflow::Skip);
        assert_eq!(config.rewrites.len(), 1);

        let rewrite = config.find_rewrite("MY_MACRO").unwrap();
        assert_eq!(rewrite.replace, "(enum _Foo)");
        assert!(config.find_rewrite("GDIP_WMF_RECORD_TO_EMFPLUS").is_none());
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = ConverterConfig::from_toml("").unwrap();
        assert_eq!(config, ConverterConfig::default());
        assert!(config.find_rewrite("GDIP_WMF_RECORD_TO_EMFPLUS").is_some());
    }

    #[test]
    fn test_validation() {
        let err = ConverterConfig::from_toml("[conversion]\nmax_tokens = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));

        let err = ConverterConfig::from_toml("[conversion]\nunindent_width = 40\n").unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));

        let toml = "[[rewrite]]\nmacro = \"\"\nsearch = \"x\"\nreplace = \"y\"\n";
        let err = ConverterConfig::from_toml(toml).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn test_toml_round_trip() {
        let config = ConverterConfig::default();
        let text = config.to_toml().unwrap();
        assert!(text.contains("virtual_method_template"));
        assert_eq!(ConverterConfig::from_toml(&text).unwrap(), config);
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("flathdr.toml");
        std::fs::write(&path, "[conversion]\nsuppressed_declarations = \"comment\"\n").unwrap();

        let config = ConverterConfig::from_file(&path).unwrap();
        assert_eq!(config.conversion.suppressed_declarations, SuppressMode::Comment);

        let missing = ConverterConfig::from_file(&dir.path().join("missing.toml"));
        assert!(matches!(missing, Err(ConfigError::Read(_))));
    }
}
